use glam::{Mat4, Quat, UVec2, Vec3};

use crate::ProbeVolume;

/// Sphere marking a probe's position, for the debug visualization of the
/// grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeSphere {
    pub probe: u32,

    /// Texel of the probe-offsets texture holding this probe's offset; the
    /// sphere's transform doesn't account for it
    pub offset_texel: UVec2,

    pub transform: Mat4,
}

/// Returns a sphere for every probe of the volume, placed at the probe's
/// grid position and scaled by `scale`.
pub fn probe_spheres(
    volume: &ProbeVolume,
    scale: f32,
) -> impl Iterator<Item = ProbeSphere> + '_ {
    let grid = volume.grid();

    (0..volume.total_probes()).map(move |probe| {
        let coord = grid.probe_coord(probe);

        ProbeSphere {
            probe,
            offset_texel: grid.probe_texel(coord),
            transform: Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                Quat::IDENTITY,
                grid.probe_position(coord),
            ),
        }
    })
}
