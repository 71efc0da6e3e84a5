use glam::{uvec2, UVec2, UVec3, Vec2, Vec3};

use crate::Octahedral;

/// Layout of an octahedral atlas (irradiance or visibility).
///
/// Each probe owns a square tile of `probe_size + 2` texels: `probe_size`
/// interior texels surrounded by a one-texel border that mirrors the tile's
/// own edges, so that bilinear sampling never bleeds into the neighbouring
/// probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    pub probe_size: u32,
    pub tiles: UVec2,
}

impl AtlasLayout {
    pub fn new(probe_size: u32, probe_counts: UVec3) -> Self {
        Self {
            probe_size,
            tiles: uvec2(probe_counts.x * probe_counts.y, probe_counts.z),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.probe_size + 2
    }

    pub fn size(&self) -> UVec2 {
        self.tiles * self.tile_size()
    }

    pub fn tile_origin(&self, tile: UVec2) -> UVec2 {
        tile * self.tile_size()
    }

    /// Splits atlas texel into `(tile, texel-within-tile)`.
    pub fn locate(&self, texel: UVec2) -> (UVec2, UVec2) {
        let tile_size = self.tile_size();

        (texel / tile_size, texel % tile_size)
    }

    pub fn classify(&self, local: UVec2) -> BorderTexel {
        let last = self.probe_size + 1;
        let on_col = local.x == 0 || local.x == last;
        let on_row = local.y == 0 || local.y == last;

        match (on_col, on_row) {
            (false, false) => BorderTexel::Interior,
            (true, true) => BorderTexel::Corner,
            (false, true) => BorderTexel::Row,
            (true, false) => BorderTexel::Column,
        }
    }

    /// Returns the interior texel (tile-local) whose value given border texel
    /// copies; interior texels map onto themselves.
    ///
    /// Corners take the diagonally opposite interior corner, rows and columns
    /// are mirrored along the edge they lay on.
    pub fn border_source(&self, local: UVec2) -> UVec2 {
        let n = self.probe_size;
        let last = n + 1;

        match self.classify(local) {
            BorderTexel::Interior => local,

            BorderTexel::Corner => uvec2(
                if local.x == 0 { n } else { 1 },
                if local.y == 0 { n } else { 1 },
            ),

            BorderTexel::Row => uvec2(
                last - local.x,
                if local.y == 0 { 1 } else { n },
            ),

            BorderTexel::Column => uvec2(
                if local.x == 0 { 1 } else { n },
                last - local.y,
            ),
        }
    }

    /// Returns direction represented by given interior texel's center.
    pub fn texel_direction(&self, local: UVec2) -> Vec3 {
        let uv = ((local.as_vec2() - 1.0) + 0.5) / (self.probe_size as f32);

        Octahedral::decode(uv * 2.0 - 1.0)
    }

    /// Returns atlas position (in texels) at which given tile should be
    /// sampled for given direction.
    pub fn sample_position(&self, tile: UVec2, dir: Vec3) -> Vec2 {
        let uv = Octahedral::encode(dir) * 0.5 + 0.5;

        self.tile_origin(tile).as_vec2()
            + Vec2::ONE
            + uv * (self.probe_size as f32)
    }

    /// Same as [`Self::sample_position()`], but normalized to `0.0..=1.0`.
    pub fn sample_uv(&self, tile: UVec2, dir: Vec3) -> Vec2 {
        self.sample_position(tile, dir) / self.size().as_vec2()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderTexel {
    Interior,
    Corner,
    Row,
    Column,
}

impl BorderTexel {
    pub fn is_border(self) -> bool {
        self != Self::Interior
    }

    /// Color used by the border-type debug overlay.
    pub fn debug_color(self) -> Vec3 {
        match self {
            BorderTexel::Interior => Vec3::ZERO,
            BorderTexel::Corner => Vec3::X,
            BorderTexel::Row => Vec3::Y,
            BorderTexel::Column => Vec3::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::uvec3;

    use super::*;

    fn layout() -> AtlasLayout {
        AtlasLayout::new(6, uvec3(24, 20, 16))
    }

    #[test]
    fn size() {
        let layout = layout();

        assert_eq!(8, layout.tile_size());
        assert_eq!(uvec2(480, 16), layout.tiles);
        assert_eq!(uvec2(3840, 128), layout.size());
    }

    #[test]
    fn locate() {
        let layout = layout();

        assert_eq!((uvec2(0, 0), uvec2(0, 0)), layout.locate(uvec2(0, 0)));
        assert_eq!((uvec2(2, 1), uvec2(3, 7)), layout.locate(uvec2(19, 15)));
    }

    #[test]
    fn classify() {
        let layout = layout();

        assert_eq!(BorderTexel::Corner, layout.classify(uvec2(0, 0)));
        assert_eq!(BorderTexel::Corner, layout.classify(uvec2(7, 0)));
        assert_eq!(BorderTexel::Corner, layout.classify(uvec2(0, 7)));
        assert_eq!(BorderTexel::Corner, layout.classify(uvec2(7, 7)));
        assert_eq!(BorderTexel::Row, layout.classify(uvec2(3, 0)));
        assert_eq!(BorderTexel::Row, layout.classify(uvec2(3, 7)));
        assert_eq!(BorderTexel::Column, layout.classify(uvec2(0, 3)));
        assert_eq!(BorderTexel::Column, layout.classify(uvec2(7, 3)));
        assert_eq!(BorderTexel::Interior, layout.classify(uvec2(1, 1)));
        assert_eq!(BorderTexel::Interior, layout.classify(uvec2(6, 6)));
    }

    #[test]
    fn border_source() {
        let layout = layout();

        let cases = [
            // corners
            (uvec2(0, 0), uvec2(6, 6)),
            (uvec2(7, 0), uvec2(1, 6)),
            (uvec2(0, 7), uvec2(6, 1)),
            (uvec2(7, 7), uvec2(1, 1)),
            // rows
            (uvec2(2, 0), uvec2(5, 1)),
            (uvec2(2, 7), uvec2(5, 6)),
            // columns
            (uvec2(0, 2), uvec2(1, 5)),
            (uvec2(7, 2), uvec2(6, 5)),
            // interior
            (uvec2(3, 4), uvec2(3, 4)),
        ];

        for (border, expected) in cases {
            assert_eq!(expected, layout.border_source(border), "{border}");
        }
    }

    #[test]
    fn border_sources_are_interior() {
        let layout = layout();

        for y in 0..layout.tile_size() {
            for x in 0..layout.tile_size() {
                let source = layout.border_source(uvec2(x, y));

                assert_eq!(
                    BorderTexel::Interior,
                    layout.classify(source),
                    "{x}x{y}"
                );
            }
        }
    }

    #[test]
    fn sample_position_hits_texel_center() {
        let layout = layout();
        let tile = uvec2(5, 3);

        for y in 1..=layout.probe_size {
            for x in 1..=layout.probe_size {
                let local = uvec2(x, y);
                let dir = layout.texel_direction(local);
                let actual = layout.sample_position(tile, dir);
                let expected =
                    (layout.tile_origin(tile) + local).as_vec2() + 0.5;

                assert_relative_eq!(expected.x, actual.x, epsilon = 0.001);
                assert_relative_eq!(expected.y, actual.y, epsilon = 0.001);
            }
        }
    }

    #[test]
    fn texel_directions_are_normalized() {
        let layout = layout();

        for y in 1..=layout.probe_size {
            for x in 1..=layout.probe_size {
                let dir = layout.texel_direction(uvec2(x, y));

                assert_relative_eq!(1.0, dir.length(), epsilon = 0.0001);
            }
        }
    }
}
