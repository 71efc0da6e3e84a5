use glam::{uvec2, uvec3, vec3, UVec2, UVec3, Vec3};
use probegi_gpu as gpu;

use crate::ConfigError;

/// Shape of the probe grid: where probes are, how many of them there are and
/// how large their atlases get.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeVolume {
    pub probe_counts: UVec3,
    pub probe_spacing: Vec3,
    pub grid_origin: Vec3,
    pub rays_per_probe: u32,

    /// Number of interior texels (along each side) of a probe's tile in the
    /// irradiance atlas, excluding the one-texel border
    pub irradiance_probe_size: u32,

    /// See: [`Self::irradiance_probe_size`].
    pub visibility_probe_size: u32,
}

impl ProbeVolume {
    pub fn total_probes(&self) -> u32 {
        self.probe_counts.x * self.probe_counts.y * self.probe_counts.z
    }

    pub fn grid(&self) -> gpu::ProbeGrid {
        gpu::ProbeGrid {
            origin: self.grid_origin,
            spacing: self.probe_spacing,
            counts: self.probe_counts,
        }
    }

    pub fn irradiance_layout(&self) -> gpu::AtlasLayout {
        gpu::AtlasLayout::new(self.irradiance_probe_size, self.probe_counts)
    }

    pub fn visibility_layout(&self) -> gpu::AtlasLayout {
        gpu::AtlasLayout::new(self.visibility_probe_size, self.probe_counts)
    }

    pub fn radiance_size(&self) -> UVec2 {
        uvec2(self.rays_per_probe, self.total_probes())
    }

    pub fn offsets_size(&self) -> UVec2 {
        uvec2(self.probe_counts.x * self.probe_counts.y, self.probe_counts.z)
    }

    pub fn validate(&self, limits: &wgpu::Limits) -> Result<(), ConfigError> {
        let total_probes = match self.grid().checked_len() {
            Some(total_probes) => total_probes,

            None => {
                return Err(ConfigError::TooManyProbes {
                    x: self.probe_counts.x,
                    y: self.probe_counts.y,
                    z: self.probe_counts.z,
                });
            }
        };

        if total_probes == 0 {
            return Err(ConfigError::NoProbes {
                x: self.probe_counts.x,
                y: self.probe_counts.y,
                z: self.probe_counts.z,
            });
        }

        if self.rays_per_probe == 0 {
            return Err(ConfigError::NoRays);
        }

        if !self.probe_spacing.is_finite()
            || self.probe_spacing.min_element() <= 0.0
        {
            return Err(ConfigError::DegenerateSpacing);
        }

        if !self.grid_origin.is_finite() {
            return Err(ConfigError::NonFiniteOrigin);
        }

        if self.irradiance_probe_size == 0 {
            return Err(ConfigError::EmptyProbeTile {
                atlas: "irradiance",
            });
        }

        if self.visibility_probe_size == 0 {
            return Err(ConfigError::EmptyProbeTile {
                atlas: "visibility",
            });
        }

        let limit = limits.max_texture_dimension_2d;

        for (texture, width, height) in self.texture_sizes() {
            if width > u64::from(limit) || height > u64::from(limit) {
                return Err(ConfigError::TextureTooLarge {
                    texture,
                    width,
                    height,
                    limit,
                });
            }
        }

        Ok(())
    }

    /// Returns `(name, width, height)` of each texture the volume allocates.
    ///
    /// Unlike [`Self::radiance_size()`] and friends, this works in 64 bits
    /// (saturating), so that it can be called before the counts have been
    /// validated.
    fn texture_sizes(&self) -> [(&'static str, u64, u64); 4] {
        let x = u64::from(self.probe_counts.x);
        let y = u64::from(self.probe_counts.y);
        let z = u64::from(self.probe_counts.z);
        let columns = x.saturating_mul(y);
        let tile = |probe_size: u32| u64::from(probe_size) + 2;
        let irradiance = tile(self.irradiance_probe_size);
        let visibility = tile(self.visibility_probe_size);

        [
            (
                "radiance",
                u64::from(self.rays_per_probe),
                columns.saturating_mul(z),
            ),
            ("probe offsets", columns, z),
            (
                "irradiance",
                columns.saturating_mul(irradiance),
                z.saturating_mul(irradiance),
            ),
            (
                "visibility",
                columns.saturating_mul(visibility),
                z.saturating_mul(visibility),
            ),
        ]
    }

    /// Returns whether switching from `self` to `other` requires allocating
    /// all the textures anew.
    pub fn needs_reallocation(&self, other: &Self) -> bool {
        self.probe_counts != other.probe_counts
            || self.rays_per_probe != other.rays_per_probe
            || self.irradiance_probe_size != other.irradiance_probe_size
            || self.visibility_probe_size != other.visibility_probe_size
    }

    /// Returns whether switching from `self` to `other` moves probes around,
    /// requiring their offsets to be found again.
    pub fn needs_resettling(&self, other: &Self) -> bool {
        self.grid_origin != other.grid_origin
            || self.probe_spacing != other.probe_spacing
    }

    pub fn describe(&self) -> String {
        format!(
            "{}x{}x{} probes ({} rays each)",
            self.probe_counts.x,
            self.probe_counts.y,
            self.probe_counts.z,
            self.rays_per_probe,
        )
    }
}

impl Default for ProbeVolume {
    fn default() -> Self {
        Self {
            probe_counts: uvec3(24, 20, 16),
            probe_spacing: vec3(1.726, 1.098, 1.124),
            grid_origin: vec3(-20.705, 0.426, -9.326),
            rays_per_probe: 128,
            irradiance_probe_size: 6,
            visibility_probe_size: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> wgpu::Limits {
        wgpu::Limits::default()
    }

    #[test]
    fn default_volume() {
        let volume = ProbeVolume::default();

        assert_eq!(7680, volume.total_probes());
        assert_eq!(uvec2(128, 7680), volume.radiance_size());
        assert_eq!(uvec2(480, 16), volume.offsets_size());
        assert_eq!(uvec2(3840, 128), volume.irradiance_layout().size());
        assert_eq!(uvec2(3840, 128), volume.visibility_layout().size());
        assert_eq!(Ok(()), volume.validate(&limits()));
    }

    #[test]
    fn atlas_size_follows_tile_size() {
        let volume = ProbeVolume {
            probe_counts: uvec3(4, 2, 3),
            irradiance_probe_size: 8,
            visibility_probe_size: 14,
            ..Default::default()
        };

        assert_eq!(uvec2(80, 30), volume.irradiance_layout().size());
        assert_eq!(uvec2(128, 48), volume.visibility_layout().size());
    }

    #[test]
    fn validate() {
        let base = ProbeVolume::default();

        let cases = [
            (
                ProbeVolume {
                    probe_counts: uvec3(4, 0, 4),
                    ..base.clone()
                },
                ConfigError::NoProbes { x: 4, y: 0, z: 4 },
            ),
            (
                ProbeVolume {
                    rays_per_probe: 0,
                    ..base.clone()
                },
                ConfigError::NoRays,
            ),
            (
                ProbeVolume {
                    probe_spacing: vec3(1.0, 0.0, 1.0),
                    ..base.clone()
                },
                ConfigError::DegenerateSpacing,
            ),
            (
                ProbeVolume {
                    probe_spacing: vec3(1.0, f32::NAN, 1.0),
                    ..base.clone()
                },
                ConfigError::DegenerateSpacing,
            ),
            (
                ProbeVolume {
                    visibility_probe_size: 0,
                    ..base.clone()
                },
                ConfigError::EmptyProbeTile {
                    atlas: "visibility",
                },
            ),
        ];

        for (volume, expected) in cases {
            assert_eq!(Err(expected), volume.validate(&limits()));
        }
    }

    #[test]
    fn validate_texture_limits() {
        let volume = ProbeVolume {
            probe_counts: uvec3(64, 64, 4),
            ..Default::default()
        };

        let actual = volume.validate(&limits());

        assert_eq!(
            Err(ConfigError::TextureTooLarge {
                texture: "radiance",
                width: 128,
                height: 16384,
                limit: 8192,
            }),
            actual
        );
    }

    #[test]
    fn validate_overflowing_counts() {
        let volume = ProbeVolume {
            probe_counts: uvec3(65536, 65536, 2),
            ..Default::default()
        };

        assert_eq!(
            Err(ConfigError::TooManyProbes {
                x: 65536,
                y: 65536,
                z: 2,
            }),
            volume.validate(&limits())
        );

        // Fits in 32 bits, but the atlases don't fit the device
        let volume = ProbeVolume {
            probe_counts: uvec3(65536, 65535, 1),
            rays_per_probe: 1,
            irradiance_probe_size: u32::MAX,
            ..Default::default()
        };

        assert_eq!(
            Err(ConfigError::TextureTooLarge {
                texture: "radiance",
                width: 1,
                height: 65536 * 65535,
                limit: 8192,
            }),
            volume.validate(&limits())
        );
    }

    #[test]
    fn invalidation() {
        let volume = ProbeVolume::default();

        let moved = ProbeVolume {
            grid_origin: Vec3::ZERO,
            ..volume.clone()
        };

        let resized = ProbeVolume {
            probe_counts: uvec3(8, 8, 8),
            ..volume.clone()
        };

        assert!(!volume.needs_reallocation(&volume));
        assert!(!volume.needs_resettling(&volume));

        assert!(!volume.needs_reallocation(&moved));
        assert!(volume.needs_resettling(&moved));

        assert!(volume.needs_reallocation(&resized));
        assert!(!volume.needs_resettling(&resized));
    }
}
