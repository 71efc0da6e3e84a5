use glam::{Vec2, Vec3};

use crate::{
    perceptual_decode, F32Ext, FeatureFlags, ProbeCell, ProbeGrid, ProbeStatus,
    PROBEGI_EPSILON,
};

/// Point being shaded, as reconstructed from the G-buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,

    /// Direction from the point towards the camera
    pub view: Vec3,
}

impl SurfacePoint {
    pub fn new(position: Vec3, normal: Vec3, camera_origin: Vec3) -> Self {
        Self {
            position,
            normal: normal.normalize_or_zero(),
            view: (camera_origin - position).normalize_or_zero(),
        }
    }
}

/// Data the sampler reads per probe; implemented on top of the atlases by the
/// kernel and on top of plain memory by the tests.
pub trait ProbeAtlases {
    fn probe_offset(&self, probe: u32) -> Vec3;
    fn probe_status(&self, probe: u32) -> ProbeStatus;
    fn irradiance(&self, probe: u32, dir: Vec3) -> Vec3;

    /// Returns `(mean distance, mean squared distance)`.
    fn visibility(&self, probe: u32, dir: Vec3) -> Vec2;
}

/// Returns the probability that a point at `distance` is visible from a probe
/// whose visibility texel says `moments`.
pub fn chebyshev(moments: Vec2, distance: f32) -> f32 {
    let mean = moments.x;

    if distance <= mean {
        return 1.0;
    }

    let variance = (moments.y - mean * mean).abs();
    let cheb = variance / (variance + (distance - mean).sqr());

    cheb.max(0.0).cube()
}

/// Weights below this get crushed, pushing light leaks towards black.
const CRUSH_THRESHOLD: f32 = 0.2;

/// Shades a surface point with irradiance interpolated out of the eight
/// probes surrounding it.
#[derive(Clone, Copy, Debug)]
pub struct IrradianceSampler {
    pub grid: ProbeGrid,
    pub flags: FeatureFlags,
    pub self_shadow_bias: f32,
}

impl IrradianceSampler {
    pub fn surface_bias(&self, point: &SurfacePoint) -> Vec3 {
        (point.normal * 0.2 + point.view * 0.8)
            * (0.75 * self.grid.spacing.min_element())
            * self.self_shadow_bias
    }

    pub fn probe_position(
        &self,
        atlases: &impl ProbeAtlases,
        cell: &ProbeCell,
        nth: u32,
    ) -> (u32, Vec3) {
        let coord = cell.probe(&self.grid, nth);
        let probe = self.grid.probe_index(coord);
        let mut position = self.grid.probe_position(coord);

        if self.flags.has(FeatureFlags::PROBE_OFFSETTING) {
            position += atlases.probe_offset(probe);
        }

        (probe, position)
    }

    /// Returns probe's weight (excluding the trilinear factor).
    pub fn probe_weight(
        &self,
        atlases: &impl ProbeAtlases,
        point: &SurfacePoint,
        biased_position: Vec3,
        probe: u32,
        probe_position: Vec3,
    ) -> f32 {
        let dir_to_probe =
            (probe_position - point.position).normalize_or_zero();
        let cos = dir_to_probe.dot(point.normal);
        let mut weight: f32 = 1.0;

        if self.flags.has(FeatureFlags::WRAP_SHADING) {
            weight *= ((cos + 1.0) * 0.5).sqr() + 0.2;
        }

        if self.flags.has(FeatureFlags::BACKFACE_BLENDING) && cos < 0.0 {
            weight *= (1.0 + cos).sqr().max(0.05);
        }

        if self.flags.has(FeatureFlags::VISIBILITY) {
            let probe_to_point = biased_position - probe_position;
            let distance = probe_to_point.length();
            let dir = probe_to_point.normalize_or_zero();

            weight *= chebyshev(atlases.visibility(probe, dir), distance);
        }

        let mut weight = weight.max(1.0e-6);

        if weight < CRUSH_THRESHOLD {
            weight *= weight.sqr() / CRUSH_THRESHOLD.sqr();
        }

        weight
    }

    pub fn sample(
        &self,
        atlases: &impl ProbeAtlases,
        point: &SurfacePoint,
    ) -> Vec3 {
        if !self.grid.contains(point.position) {
            return Vec3::ZERO;
        }

        let biased_position = point.position + self.surface_bias(point);
        let cell = self.grid.cell(biased_position);
        let mut irradiance = Vec3::ZERO;
        let mut total_weight = 0.0;

        for nth in 0..8 {
            let (probe, probe_position) =
                self.probe_position(atlases, &cell, nth);

            if self.flags.has(FeatureFlags::PROBE_STATUS)
                && !atlases.probe_status(probe).is_active()
            {
                continue;
            }

            let trilinear = cell.trilinear(nth);

            if trilinear <= 0.0 {
                continue;
            }

            let weight = trilinear
                * self.probe_weight(
                    atlases,
                    point,
                    biased_position,
                    probe,
                    probe_position,
                );

            let mut probe_irradiance = atlases.irradiance(probe, point.normal);

            if self.flags.has(FeatureFlags::PERCEPTUAL_ENCODING) {
                probe_irradiance = perceptual_decode(probe_irradiance);
            }

            irradiance += probe_irradiance * weight;
            total_weight += weight;
        }

        if total_weight < PROBEGI_EPSILON {
            return Vec3::ZERO;
        }

        irradiance / total_weight
    }
}
