use glam::{uvec2, uvec3, UVec2, UVec3, Vec3};

use crate::F32Ext;

/// Regular 3D grid of probes.
///
/// Probes are indexed `x + y * counts.x + z * counts.x * counts.y`; when laid
/// out in 2D (offsets texture, atlases) the grid is flattened into columns of
/// `counts.x * counts.y` probes and rows of `counts.z` probes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeGrid {
    pub origin: Vec3,
    pub spacing: Vec3,
    pub counts: UVec3,
}

impl ProbeGrid {
    pub fn len(&self) -> u32 {
        self.counts.x * self.counts.y * self.counts.z
    }

    /// Same as [`Self::len()`], but returns `None` instead of overflowing.
    pub fn checked_len(&self) -> Option<u32> {
        self.counts
            .x
            .checked_mul(self.counts.y)?
            .checked_mul(self.counts.z)
    }

    pub fn probe_coord(&self, index: u32) -> UVec3 {
        uvec3(
            index % self.counts.x,
            (index / self.counts.x) % self.counts.y,
            index / (self.counts.x * self.counts.y),
        )
    }

    pub fn probe_index(&self, coord: UVec3) -> u32 {
        coord.x
            + coord.y * self.counts.x
            + coord.z * self.counts.x * self.counts.y
    }

    /// Returns probe's position on the grid, i.e. excluding its offset.
    pub fn probe_position(&self, coord: UVec3) -> Vec3 {
        self.origin + coord.as_vec3() * self.spacing
    }

    /// Returns position of given probe within the flattened 2D layout.
    pub fn probe_texel(&self, coord: UVec3) -> UVec2 {
        uvec2(coord.x + coord.y * self.counts.x, coord.z)
    }

    /// See: [`Self::probe_texel()`].
    pub fn texel_probe(&self, texel: UVec2) -> UVec3 {
        uvec3(texel.x % self.counts.x, texel.x / self.counts.x, texel.y)
    }

    pub fn extent(&self) -> Vec3 {
        (self.counts - UVec3::ONE).as_vec3() * self.spacing
    }

    /// Returns whether given point lays inside the grid, extended by half of
    /// the spacing on each side.
    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.origin - 0.5 * self.spacing;
        let max = self.origin + self.extent() + 0.5 * self.spacing;

        point.cmpge(min).all() && point.cmple(max).all()
    }

    /// Returns the cell of eight probes enclosing given point.
    pub fn cell(&self, point: Vec3) -> ProbeCell {
        let max = (self.counts - UVec3::ONE).as_vec3();
        let rel = (point - self.origin) / self.spacing;
        let base = rel.floor().clamp(Vec3::ZERO, max);

        let alpha = rel - base;
        let alpha = Vec3::new(
            alpha.x.saturate(),
            alpha.y.saturate(),
            alpha.z.saturate(),
        );

        ProbeCell {
            base: base.as_uvec3(),
            alpha,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeCell {
    pub base: UVec3,

    /// Position of the point within the cell, `0.0 ..= 1.0` on each axis
    pub alpha: Vec3,
}

impl ProbeCell {
    /// Returns the offset of `nth` corner (`0..8`) relative to the base probe.
    pub fn corner(nth: u32) -> UVec3 {
        uvec3(nth & 1, (nth >> 1) & 1, (nth >> 2) & 1)
    }

    /// Returns coordinates of the `nth` corner probe, clamped to the grid.
    pub fn probe(&self, grid: &ProbeGrid, nth: u32) -> UVec3 {
        (self.base + Self::corner(nth)).min(grid.counts - UVec3::ONE)
    }

    pub fn trilinear(&self, nth: u32) -> f32 {
        let corner = Self::corner(nth).as_vec3();
        let w = (Vec3::ONE - self.alpha) * (Vec3::ONE - corner)
            + self.alpha * corner;

        w.x * w.y * w.z
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    fn grid() -> ProbeGrid {
        ProbeGrid {
            origin: vec3(-1.0, 0.0, 2.0),
            spacing: vec3(1.0, 2.0, 0.5),
            counts: uvec3(4, 3, 2),
        }
    }

    #[test]
    fn len() {
        assert_eq!(24, grid().len());
        assert_eq!(Some(24), grid().checked_len());
    }

    #[test]
    fn checked_len_of_huge_grid() {
        let grid = ProbeGrid {
            counts: uvec3(65536, 65536, 2),
            ..grid()
        };

        assert_eq!(None, grid.checked_len());
    }

    #[test]
    fn index_coord_round_trip() {
        let grid = grid();

        for index in 0..grid.len() {
            assert_eq!(index, grid.probe_index(grid.probe_coord(index)));
        }

        assert_eq!(uvec3(1, 2, 1), grid.probe_coord(1 + 2 * 4 + 12));
    }

    #[test]
    fn texel_probe_round_trip() {
        let grid = grid();

        for index in 0..grid.len() {
            let coord = grid.probe_coord(index);
            let texel = grid.probe_texel(coord);

            assert!(texel.x < 4 * 3);
            assert!(texel.y < 2);
            assert_eq!(coord, grid.texel_probe(texel));
        }
    }

    #[test]
    fn probe_position() {
        assert_eq!(
            vec3(1.0, 2.0, 2.5),
            grid().probe_position(uvec3(2, 1, 1)),
        );
    }

    #[test]
    fn contains() {
        let grid = grid();

        assert!(grid.contains(vec3(-1.0, 0.0, 2.0)));
        assert!(grid.contains(vec3(2.4, 4.9, 2.7)));
        assert!(!grid.contains(vec3(-1.6, 0.0, 2.0)));
        assert!(!grid.contains(vec3(0.0, 5.1, 2.0)));
    }

    #[test]
    fn cell() {
        let grid = grid();
        let cell = grid.cell(vec3(-0.75, 1.0, 2.25));

        assert_eq!(UVec3::ZERO, cell.base);
        assert_relative_eq!(0.25, cell.alpha.x);
        assert_relative_eq!(0.5, cell.alpha.y);
        assert_relative_eq!(0.5, cell.alpha.z);

        let total: f32 = (0..8).map(|nth| cell.trilinear(nth)).sum();

        assert_relative_eq!(1.0, total, epsilon = 0.0001);
        assert_relative_eq!(0.75 * 0.5 * 0.5, cell.trilinear(0));
        assert_relative_eq!(0.25 * 0.5 * 0.5, cell.trilinear(1));
    }

    #[test]
    fn cell_corners_are_clamped_to_the_grid() {
        let grid = grid();
        let cell = grid.cell(vec3(100.0, 100.0, 100.0));

        assert_eq!(uvec3(3, 2, 1), cell.base);

        for nth in 0..8 {
            assert_eq!(uvec3(3, 2, 1), cell.probe(&grid, nth));
        }
    }
}
