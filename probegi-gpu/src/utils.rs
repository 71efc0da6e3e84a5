mod f32_ext;

pub use self::f32_ext::*;
