use glam::{vec2, UVec2, Vec2, Vec3, Vec4};

use crate::{
    AtlasLayout, BorderTexel, FeatureFlags, ProbeGrid, RadianceSample,
    UpdateRange, PROBEGI_EPSILON,
};

/// Exponent of the perceptual curve applied to irradiance stored in the
/// atlas.
pub const PERCEPTUAL_EXPONENT: f32 = 5.0;

/// Sharpness of the visibility filter's lobe.
pub const VISIBILITY_SHARPNESS: f32 = 50.0;

/// Largest distance stored in the visibility atlas, as a multiple of the
/// spacing's length.
pub const MAX_VISIBILITY_DISTANCE: f32 = 1.5;

pub fn perceptual_encode(irradiance: Vec3) -> Vec3 {
    irradiance.max(Vec3::ZERO).powf(1.0 / PERCEPTUAL_EXPONENT)
}

/// See: [`perceptual_encode()`].
pub fn perceptual_decode(irradiance: Vec3) -> Vec3 {
    irradiance.max(Vec3::ZERO).powf(PERCEPTUAL_EXPONENT)
}

/// Blends freshly computed value into the history; `hysteresis` close to one
/// keeps the history, close to zero takes the new value.
///
/// Both extremes are exact: one returns `previous` and zero returns
/// `computed`, bit for bit.
pub fn hysteresis_blend(
    previous: Vec4,
    computed: Vec4,
    hysteresis: f32,
) -> Vec4 {
    let hysteresis = hysteresis.clamp(0.0, 1.0);

    previous * hysteresis + computed * (1.0 - hysteresis)
}

/// Accumulates probe's rays into a single irradiance texel.
#[derive(Clone, Copy, Debug, Default)]
pub struct IrradianceGather {
    sum: Vec3,
    weight: f32,
}

impl IrradianceGather {
    pub fn add(
        &mut self,
        texel_dir: Vec3,
        ray_dir: Vec3,
        sample: RadianceSample,
    ) {
        if sample.is_backface() {
            return;
        }

        let weight = texel_dir.dot(ray_dir).max(0.0);

        self.sum += sample.radiance * weight;
        self.weight += weight;
    }

    pub fn finish(self, perceptual: bool) -> Vec3 {
        if self.weight <= PROBEGI_EPSILON {
            return Vec3::ZERO;
        }

        let irradiance = self.sum / self.weight;

        if perceptual {
            perceptual_encode(irradiance)
        } else {
            irradiance
        }
    }
}

/// Accumulates probe's rays into a single visibility texel, i.e. mean
/// distance and mean squared distance.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityGather {
    sum: Vec2,
    weight: f32,
    max_distance: f32,
}

impl VisibilityGather {
    pub fn new(spacing: Vec3) -> Self {
        Self {
            sum: Vec2::ZERO,
            weight: 0.0,
            max_distance: MAX_VISIBILITY_DISTANCE * spacing.length(),
        }
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn add(
        &mut self,
        texel_dir: Vec3,
        ray_dir: Vec3,
        sample: RadianceSample,
    ) {
        let weight =
            texel_dir.dot(ray_dir).max(0.0).powf(VISIBILITY_SHARPNESS);

        if weight <= 0.0 {
            return;
        }

        let distance = if sample.is_miss() {
            self.max_distance
        } else {
            sample.hit_distance().abs().min(self.max_distance)
        };

        self.sum += vec2(distance, distance * distance) * weight;
        self.weight += weight;
    }

    pub fn finish(self) -> Vec2 {
        if self.weight <= PROBEGI_EPSILON {
            return Vec2::ZERO;
        }

        self.sum / self.weight
    }
}

/// What a single atlas texel does during a blending dispatch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendTexel {
    /// Flattened index of the probe owning this texel
    pub probe: u32,

    /// Interior texel (in atlas coordinates) whose value this texel holds;
    /// for interior texels that's the texel itself
    pub source: UVec2,

    /// Direction represented by [`Self::source`]
    pub direction: Vec3,

    pub border: BorderTexel,

    /// Whether the owning probe is refreshed this frame; texels of other
    /// probes rewrite their previous value
    pub active: bool,
}

/// Drives the irradiance and visibility filters: maps atlas texels to probes
/// and directions, and blends new values into the history.
#[derive(Clone, Copy, Debug)]
pub struct ProbeBlending {
    pub layout: AtlasLayout,
    pub grid: ProbeGrid,
    pub range: UpdateRange,
    pub hysteresis: f32,
    pub first_frame: bool,
}

impl ProbeBlending {
    pub fn texel(&self, texel: UVec2) -> BlendTexel {
        let (tile, local) = self.layout.locate(texel);
        let probe = self.grid.probe_index(self.grid.texel_probe(tile));
        let source_local = self.layout.border_source(local);

        BlendTexel {
            probe,
            source: self.layout.tile_origin(tile) + source_local,
            direction: self.layout.texel_direction(source_local),
            border: self.layout.classify(local),
            active: self.range.contains(probe),
        }
    }

    /// Hysteresis used this frame; the first frame after (re)settling drops
    /// the history altogether.
    pub fn hysteresis(&self) -> f32 {
        if self.first_frame {
            0.0
        } else {
            self.hysteresis
        }
    }

    pub fn blend(&self, previous: Vec4, computed: Vec4) -> Vec4 {
        hysteresis_blend(previous, computed, self.hysteresis())
    }

    /// Returns color used instead of the blended value when one of the
    /// border-debugging flags is enabled.
    pub fn debug_color(
        &self,
        flags: FeatureFlags,
        texel: &BlendTexel,
    ) -> Option<Vec3> {
        if !texel.border.is_border() {
            return None;
        }

        if flags.has(FeatureFlags::DEBUG_BORDER_SOURCE) {
            let (_, local) = self.layout.locate(texel.source);
            let uv = local.as_vec2() / (self.layout.probe_size as f32);

            return Some(uv.extend(0.0));
        }

        if flags.has(FeatureFlags::DEBUG_BORDER_TYPE) {
            return Some(texel.border.debug_color());
        }

        if flags.has(FeatureFlags::DEBUG_BORDER) {
            return Some(Vec3::X);
        }

        None
    }

    /// Runs the blending over an entire atlas held in memory.
    ///
    /// `compute` gets `(probe, direction)` and returns the freshly gathered
    /// value for that probe's texel.
    pub fn blend_atlas(
        &self,
        previous: &[Vec4],
        mut compute: impl FnMut(u32, Vec3) -> Vec4,
    ) -> Vec<Vec4> {
        let size = self.layout.size();

        (0..size.y)
            .flat_map(|y| (0..size.x).map(move |x| UVec2::new(x, y)))
            .map(|texel| {
                let at = |texel: UVec2| (texel.y * size.x + texel.x) as usize;
                let plan = self.texel(texel);

                if plan.active {
                    let computed = compute(plan.probe, plan.direction);

                    self.blend(previous[at(plan.source)], computed)
                } else {
                    previous[at(texel)]
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{uvec2, uvec3, vec3, vec4, Mat4};

    use super::*;
    use crate::ProbeRays;

    fn blending(range: UpdateRange) -> ProbeBlending {
        let grid = ProbeGrid {
            origin: Vec3::ZERO,
            spacing: Vec3::ONE,
            counts: uvec3(2, 2, 2),
        };

        ProbeBlending {
            layout: AtlasLayout::new(4, grid.counts),
            grid,
            range,
            hysteresis: 0.65,
            first_frame: false,
        }
    }

    fn atlas(blending: &ProbeBlending, value: Vec4) -> Vec<Vec4> {
        let size = blending.layout.size();

        vec![value; (size.x * size.y) as usize]
    }

    #[test]
    fn hysteresis_blend_extremes() {
        let previous = vec4(1.0, 1.0, 1.0, 1.0);
        let computed = vec4(3.0, 3.0, 3.0, 3.0);

        assert_eq!(previous, hysteresis_blend(previous, computed, 1.0));
        assert_eq!(computed, hysteresis_blend(previous, computed, 0.0));

        let actual = hysteresis_blend(previous, computed, 0.65);

        assert_relative_eq!(1.7, actual.x, epsilon = 0.0001);
    }

    #[test]
    fn hysteresis_blend_keeps_history_of_different_magnitude() {
        let previous = vec4(0.001, 0.37, 1.0, 0.1);
        let computed = vec4(1000.0, 12345.0, 0.0, 9000.0);

        assert_eq!(previous, hysteresis_blend(previous, computed, 1.0));
        assert_eq!(computed, hysteresis_blend(previous, computed, 0.0));
    }

    #[test]
    fn full_hysteresis_ignores_new_traces() {
        let mut blending = blending(UpdateRange::full(8));

        blending.hysteresis = 1.0;

        let previous = atlas(&blending, Vec4::splat(0.001));
        let actual =
            blending.blend_atlas(&previous, |_, _| Vec4::splat(500.0));

        assert_eq!(previous, actual);
    }

    #[test]
    fn perceptual_encoding() {
        let value = vec3(0.0, 0.5, 32.0);
        let encoded = perceptual_encode(value);

        assert_relative_eq!(2.0, encoded.z, epsilon = 0.0001);

        let decoded = perceptual_decode(encoded);

        assert_relative_eq!(value.y, decoded.y, epsilon = 0.0001);
        assert_relative_eq!(value.z, decoded.z, epsilon = 0.001);
    }

    #[test]
    fn irradiance_gather_of_uniform_lighting() {
        let rays = ProbeRays::new(128, Mat4::IDENTITY);
        let mut gather = IrradianceGather::default();

        for dir in rays.iter() {
            gather.add(Vec3::Y, dir, RadianceSample::miss(vec3(0.5, 1.0, 2.0)));
        }

        let actual = gather.finish(false);

        assert_relative_eq!(0.5, actual.x, epsilon = 0.0001);
        assert_relative_eq!(1.0, actual.y, epsilon = 0.0001);
        assert_relative_eq!(2.0, actual.z, epsilon = 0.0001);
    }

    #[test]
    fn irradiance_gather_skips_backfaces() {
        let mut gather = IrradianceGather::default();

        gather.add(Vec3::Y, Vec3::Y, RadianceSample::backface(1.0));

        assert_eq!(Vec3::ZERO, gather.finish(true));

        gather.add(Vec3::Y, Vec3::Y, RadianceSample::hit(Vec3::ONE, 1.0));

        assert_eq!(Vec3::ONE, gather.finish(false));
    }

    #[test]
    fn visibility_gather_clamps_distances() {
        let spacing = vec3(2.0, 1.0, 2.0);
        let mut gather = VisibilityGather::new(spacing);

        assert_relative_eq!(4.5, gather.max_distance());

        gather.add(Vec3::Y, Vec3::Y, RadianceSample::miss(Vec3::ZERO));

        assert_relative_eq!(4.5, gather.finish().x);
        assert_relative_eq!(4.5 * 4.5, gather.finish().y, epsilon = 0.001);

        let mut gather = VisibilityGather::new(spacing);

        gather.add(Vec3::Y, Vec3::Y, RadianceSample::backface(2.0));

        assert_relative_eq!(2.0, gather.finish().x, epsilon = 0.0001);

        // Rays pointing away don't contribute at all
        gather.add(Vec3::Y, Vec3::NEG_Y, RadianceSample::hit(Vec3::ZERO, 0.1));

        assert_relative_eq!(2.0, gather.finish().x, epsilon = 0.0001);
    }

    #[test]
    fn border_texels_mirror_their_source() {
        let blending = blending(UpdateRange::full(8));
        // tile (1, 1), local (0, 2)
        let texel = blending.texel(uvec2(6, 8));

        assert_eq!(BorderTexel::Column, texel.border);
        assert_eq!(uvec2(7, 9), texel.source);
        assert_eq!(blending.grid.probe_index(uvec3(1, 0, 1)), texel.probe);
        assert!(texel.active);
    }

    #[test]
    fn first_frame_drops_history() {
        let mut blending = blending(UpdateRange::full(8));

        blending.first_frame = true;

        let previous = atlas(&blending, Vec4::splat(7.0));
        let actual = blending.blend_atlas(&previous, |_, _| Vec4::ONE);

        assert!(actual.iter().all(|texel| *texel == Vec4::ONE));
    }

    #[test]
    fn blending_is_idempotent_for_converged_history() {
        let blending = blending(UpdateRange::full(8));
        let previous = atlas(&blending, vec4(0.25, 0.5, 0.75, 1.0));

        let actual = blending
            .blend_atlas(&previous, |_, _| vec4(0.25, 0.5, 0.75, 1.0));

        for (expected, actual) in previous.iter().zip(actual.iter()) {
            assert_relative_eq!(expected.x, actual.x, epsilon = 0.0001);
            assert_relative_eq!(expected.w, actual.w, epsilon = 0.0001);
        }
    }

    #[test]
    fn blending_converges() {
        let blending = blending(UpdateRange::full(8));
        let mut atlas = atlas(&blending, Vec4::ZERO);

        for _ in 0..40 {
            atlas = blending.blend_atlas(&atlas, |_, _| Vec4::ONE);
        }

        for texel in atlas {
            assert_relative_eq!(1.0, texel.x, epsilon = 0.0001);
        }
    }

    #[test]
    fn inactive_probes_keep_their_texels() {
        let blending = blending(UpdateRange::rolling(6, 3, 8));
        let previous = atlas(&blending, Vec4::splat(7.0));
        let actual = blending.blend_atlas(&previous, |_, _| Vec4::ONE);
        let size = blending.layout.size();

        for y in 0..size.y {
            for x in 0..size.x {
                let texel = uvec2(x, y);
                let plan = blending.texel(texel);
                let actual = actual[(y * size.x + x) as usize];

                if [6, 7, 0].contains(&plan.probe) {
                    assert!(actual.x < 7.0, "{texel}");
                } else {
                    assert_eq!(Vec4::splat(7.0), actual, "{texel}");
                }
            }
        }
    }

    #[test]
    fn debug_colors() {
        let blending = blending(UpdateRange::full(8));
        let border = blending.texel(uvec2(0, 0));
        let interior = blending.texel(uvec2(1, 1));

        let flags = FeatureFlags::default()
            .with(FeatureFlags::DEBUG_BORDER_TYPE, true);

        assert_eq!(None, blending.debug_color(flags, &interior));
        assert_eq!(Some(Vec3::X), blending.debug_color(flags, &border));
        assert_eq!(
            None,
            blending.debug_color(FeatureFlags::default(), &border)
        );
    }
}
