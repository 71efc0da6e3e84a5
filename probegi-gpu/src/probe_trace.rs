use core::f32::consts::PI;

use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::{BACKFACE_DISTANCE_SCALE, MISS_DISTANCE};

/// Single texel of the radiance texture: what a probe's ray has seen.
///
/// Packed as `(radiance.rgb, distance)`, where distance is:
///
/// - `MISS_DISTANCE` for rays that escaped the scene,
/// - `-BACKFACE_DISTANCE_SCALE * t` for rays that hit a backface,
/// - `t` otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RadianceSample {
    pub radiance: Vec3,
    pub distance: f32,
}

impl RadianceSample {
    pub fn miss(sky: Vec3) -> Self {
        Self {
            radiance: sky,
            distance: MISS_DISTANCE,
        }
    }

    pub fn hit(radiance: Vec3, distance: f32) -> Self {
        Self { radiance, distance }
    }

    /// Backfaces don't carry any radiance, only the information that the
    /// probe might be stuck inside geometry.
    pub fn backface(distance: f32) -> Self {
        Self {
            radiance: Vec3::ZERO,
            distance: -BACKFACE_DISTANCE_SCALE * distance,
        }
    }

    pub fn pack(self) -> Vec4 {
        self.radiance.extend(self.distance)
    }

    pub fn unpack(d0: Vec4) -> Self {
        Self {
            radiance: d0.xyz(),
            distance: d0.w,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.distance >= MISS_DISTANCE
    }

    pub fn is_backface(&self) -> bool {
        self.distance < 0.0
    }

    /// Returns the actual distance travelled by the ray, undoing the
    /// backface scaling.
    pub fn hit_distance(&self) -> f32 {
        if self.is_backface() {
            -self.distance / BACKFACE_DISTANCE_SCALE
        } else {
            self.distance
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceLightKind {
    Point,
    Directional,
}

impl TraceLightKind {
    pub fn serialize(self) -> u32 {
        match self {
            TraceLightKind::Point => 0,
            TraceLightKind::Directional => 1,
        }
    }

    pub fn deserialize(kind: u32) -> Self {
        if kind == 1 {
            TraceLightKind::Directional
        } else {
            TraceLightKind::Point
        }
    }
}

/// Light used to shade probe rays' hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceLight {
    /// Position for point lights, direction towards the light for
    /// directional ones
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: TraceLightKind,
}

impl TraceLight {
    /// Returns `(direction towards the light, distance to the light)`.
    pub fn ray(&self, point: Vec3) -> (Vec3, f32) {
        match self.kind {
            TraceLightKind::Point => {
                let delta = self.position - point;

                (delta.normalize_or_zero(), delta.length())
            }

            TraceLightKind::Directional => {
                (self.position.normalize_or_zero(), f32::MAX)
            }
        }
    }

    /// Returns the light's contribution at given point, excluding albedo and
    /// shadowing.
    pub fn irradiance(&self, point: Vec3, normal: Vec3) -> Vec3 {
        let (dir, distance) = self.ray(point);

        let intensity = match self.kind {
            TraceLightKind::Point => {
                self.intensity / distance.max(1.0e-3).powi(2)
            }
            TraceLightKind::Directional => self.intensity,
        };

        self.color * intensity * normal.dot(dir).max(0.0)
    }
}

/// Shades a frontface hit.
///
/// `direct` is the light's irradiance at the hit point (already including
/// shadowing), `bounce` is irradiance sampled out of the previous frame's
/// atlas when infinite bounces are enabled.
pub fn shade_hit(
    albedo: Vec3,
    direct: Vec3,
    bounce: Option<Vec3>,
    bounce_multiplier: f32,
) -> Vec3 {
    let mut radiance = albedo / PI * direct;

    if let Some(bounce) = bounce {
        radiance += albedo * bounce * bounce_multiplier;
    }

    radiance
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn miss() {
        let sample = RadianceSample::miss(vec3(0.1, 0.2, 0.3));

        assert!(sample.is_miss());
        assert!(!sample.is_backface());
        assert_eq!(MISS_DISTANCE, sample.hit_distance());
    }

    #[test]
    fn backface() {
        let sample = RadianceSample::backface(5.0);

        assert!(sample.is_backface());
        assert!(!sample.is_miss());
        assert_relative_eq!(-1.0, sample.distance);
        assert_relative_eq!(5.0, sample.hit_distance());
        assert_eq!(Vec3::ZERO, sample.radiance);
    }

    #[test]
    fn pack() {
        let sample = RadianceSample::hit(vec3(1.0, 2.0, 3.0), 4.0);

        assert_eq!(Vec4::new(1.0, 2.0, 3.0, 4.0), sample.pack());
        assert_eq!(sample, RadianceSample::unpack(sample.pack()));
    }

    #[test]
    fn point_light_falls_off_with_distance() {
        let light = TraceLight {
            position: vec3(0.0, 2.0, 0.0),
            color: Vec3::ONE,
            intensity: 8.0,
            kind: TraceLightKind::Point,
        };

        let near = light.irradiance(Vec3::ZERO, Vec3::Y);
        let far = light.irradiance(vec3(0.0, -2.0, 0.0), Vec3::Y);
        let behind = light.irradiance(Vec3::ZERO, Vec3::NEG_Y);

        assert_relative_eq!(2.0, near.x);
        assert_relative_eq!(0.5, far.x);
        assert_eq!(Vec3::ZERO, behind);
    }

    #[test]
    fn directional_light() {
        let light = TraceLight {
            position: vec3(1.0, 1.0, 0.0),
            color: vec3(1.0, 0.5, 0.25),
            intensity: 2.0,
            kind: TraceLightKind::Directional,
        };

        let actual = light.irradiance(vec3(100.0, -40.0, 3.0), Vec3::Y);

        assert_relative_eq!(2.0 * 0.5f32.sqrt(), actual.x, epsilon = 0.0001);
        assert_relative_eq!(0.5f32.sqrt(), actual.y, epsilon = 0.0001);
    }

    #[test]
    fn light_kind_serialization() {
        for kind in [TraceLightKind::Point, TraceLightKind::Directional] {
            assert_eq!(kind, TraceLightKind::deserialize(kind.serialize()));
        }
    }

    #[test]
    fn shade_hit_with_bounce() {
        let albedo = vec3(0.5, 0.5, 0.5);
        let direct = Vec3::splat(PI);

        let without = shade_hit(albedo, direct, None, 0.75);
        let with = shade_hit(albedo, direct, Some(Vec3::ONE), 0.75);

        assert_relative_eq!(0.5, without.x, epsilon = 0.0001);
        assert_relative_eq!(0.5 + 0.375, with.x, epsilon = 0.0001);
    }
}
