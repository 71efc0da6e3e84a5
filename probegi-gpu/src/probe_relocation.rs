use glam::Vec3;

use crate::{RadianceSample, BACKFACE_THRESHOLD};

/// Relaxes probe's position so that it doesn't end up inside or too close to
/// geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeRelocation {
    pub spacing: Vec3,

    /// Largest offset allowed, as a fraction of the spacing on each axis
    pub max_offset: f32,

    /// Whether this is the first frame after the grid's been moved, in which
    /// case offsets start over from zero
    pub first_frame: bool,
}

impl ProbeRelocation {
    /// Frontfaces closer than this push the probe away.
    pub fn min_frontface_distance(&self) -> f32 {
        0.25 * self.spacing.min_element()
    }

    /// Returns probe's new offset, given its previous offset and the rays it
    /// has traced this frame.
    pub fn relocate(
        &self,
        offset: Vec3,
        samples: impl IntoIterator<Item = (Vec3, RadianceSample)>,
    ) -> Vec3 {
        let offset = if self.first_frame { Vec3::ZERO } else { offset };
        let min_frontface_distance = self.min_frontface_distance();

        let mut rays = 0;
        let mut backfaces = 0;
        let mut closest_backface: Option<(Vec3, f32)> = None;
        let mut closest_frontface: Option<(Vec3, f32)> = None;
        let mut farthest_frontface: Option<(Vec3, f32)> = None;

        for (dir, sample) in samples {
            rays += 1;

            let distance = sample.hit_distance();

            if sample.is_backface() {
                backfaces += 1;

                if closest_backface.map_or(true, |(_, d)| distance < d) {
                    closest_backface = Some((dir, distance));
                }
            } else {
                if closest_frontface.map_or(true, |(_, d)| distance < d) {
                    closest_frontface = Some((dir, distance));
                }

                if farthest_frontface.map_or(true, |(_, d)| distance > d) {
                    farthest_frontface = Some((dir, distance));
                }
            }
        }

        if rays == 0 {
            return self.clamp(offset);
        }

        let backface_ratio = backfaces as f32 / rays as f32;

        let new_offset = if let Some((dir, distance)) = closest_backface
            .filter(|_| backface_ratio > BACKFACE_THRESHOLD)
        {
            // Probe is most likely inside geometry - move it through the
            // closest wall
            offset + dir * (distance + 0.5 * min_frontface_distance)
        } else if let Some((closest_dir, closest_distance)) =
            closest_frontface
        {
            if closest_distance < min_frontface_distance {
                match farthest_frontface {
                    Some((farthest_dir, farthest_distance))
                        if closest_dir.dot(farthest_dir) <= 0.0 =>
                    {
                        let step = farthest_distance
                            .min(0.5 * self.spacing.min_element());

                        offset + farthest_dir * step
                    }
                    _ => offset,
                }
            } else {
                let margin = (closest_distance - min_frontface_distance)
                    .min(offset.length());

                offset - offset.normalize_or_zero() * margin
            }
        } else {
            offset
        };

        self.clamp(new_offset)
    }

    pub fn clamp(&self, offset: Vec3) -> Vec3 {
        let max = self.max_offset * self.spacing.abs();

        offset.clamp(-max, max)
    }
}

#[cfg(test)]
mod tests {
    use core::iter;

    use approx::assert_relative_eq;
    use glam::{vec3, Mat4};

    use super::*;
    use crate::ProbeRays;

    fn relocation() -> ProbeRelocation {
        ProbeRelocation {
            spacing: vec3(2.0, 2.0, 2.0),
            max_offset: 0.5,
            first_frame: false,
        }
    }

    fn rays() -> ProbeRays {
        ProbeRays::new(64, Mat4::IDENTITY)
    }

    #[test]
    fn open_space_drifts_back_to_the_grid() {
        let rays = rays();
        let samples = rays
            .iter()
            .map(|dir| (dir, RadianceSample::miss(Vec3::ONE)));

        let actual = relocation().relocate(vec3(0.3, 0.0, 0.0), samples);

        assert_relative_eq!(0.0, actual.length(), epsilon = 0.0001);
    }

    #[test]
    fn stays_put_when_nothing_was_hit_and_offset_is_zero() {
        let rays = rays();
        let samples = rays
            .iter()
            .map(|dir| (dir, RadianceSample::miss(Vec3::ONE)));

        assert_eq!(Vec3::ZERO, relocation().relocate(Vec3::ZERO, samples));
    }

    #[test]
    fn keeps_offset_when_nothing_was_traced() {
        let actual =
            relocation().relocate(vec3(0.3, -0.2, 0.1), iter::empty());

        assert_eq!(vec3(0.3, -0.2, 0.1), actual);
    }

    #[test]
    fn first_frame_starts_over_from_zero() {
        let relocation = ProbeRelocation {
            first_frame: true,
            ..relocation()
        };

        assert_eq!(
            Vec3::ZERO,
            relocation.relocate(vec3(0.3, -0.2, 0.1), iter::empty())
        );

        let rays = rays();
        let samples = rays
            .iter()
            .map(|dir| (dir, RadianceSample::miss(Vec3::ONE)));

        assert_eq!(
            Vec3::ZERO,
            relocation.relocate(vec3(0.9, 0.7, -0.4), samples)
        );
    }

    #[test]
    fn moves_through_closest_backface() {
        let rays = rays();

        // Everything below the probe is the inside of a mesh
        let samples = rays.iter().map(|dir| {
            let sample = if dir.y < 0.2 {
                RadianceSample::backface(0.3)
            } else {
                RadianceSample::miss(Vec3::ONE)
            };

            (dir, sample)
        });

        let actual = relocation().relocate(Vec3::ZERO, samples);

        assert!(actual.length() > 0.3, "{actual}");
    }

    #[test]
    fn pushed_away_from_close_frontface() {
        let rays = rays();

        // Wall right next to the probe, on the +X side
        let samples = rays.iter().map(|dir| {
            let sample = if dir.x > 0.5 {
                RadianceSample::hit(Vec3::ZERO, 0.1)
            } else {
                RadianceSample::hit(Vec3::ZERO, 1.0 + dir.x.abs())
            };

            (dir, sample)
        });

        let actual = relocation().relocate(Vec3::ZERO, samples);

        assert!(actual.x < 0.0, "{actual}");
    }

    #[test]
    fn offset_is_clamped() {
        let rays = rays();
        let samples = rays
            .iter()
            .map(|dir| (dir, RadianceSample::backface(100.0)));

        let actual = relocation().relocate(Vec3::ZERO, samples);

        assert!(actual.x.abs() <= 1.0);
        assert!(actual.y.abs() <= 1.0);
        assert!(actual.z.abs() <= 1.0);

        assert_eq!(
            vec3(1.0, -1.0, 0.5),
            relocation().clamp(vec3(5.0, -5.0, 0.5))
        );
    }
}
