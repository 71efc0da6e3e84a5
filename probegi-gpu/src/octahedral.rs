use glam::{vec3, Vec2, Vec2Swizzles, Vec3, Vec3Swizzles};

/// Octahedral mapping between unit directions and the `[-1, 1]²` square.
///
/// The upper hemisphere (`z >= 0`) occupies the inner diamond, the lower one
/// is folded over into the corners.
pub struct Octahedral;

impl Octahedral {
    pub fn encode(dir: Vec3) -> Vec2 {
        let n = dir / (dir.x.abs() + dir.y.abs() + dir.z.abs());

        if n.z >= 0.0 {
            n.xy()
        } else {
            let mut t = 1.0 - n.xy().yx().abs();

            t.x = t.x.copysign(n.x);
            t.y = t.y.copysign(n.y);
            t
        }
    }

    /// See: [`Self::encode()`].
    pub fn decode(uv: Vec2) -> Vec3 {
        let mut n = vec3(uv.x, uv.y, 1.0 - uv.x.abs() - uv.y.abs());
        let t = (-n.z).max(0.0);

        n.x -= t.copysign(n.x);
        n.y -= t.copysign(n.y);
        n.normalize()
    }
}
