mod bindable;
mod double_buffered;
mod external;
mod mapped_uniform_buffer;
mod storage_buffer;
mod texture;
mod utils;

pub use self::bindable::*;
pub use self::double_buffered::*;
pub use self::external::*;
pub use self::mapped_uniform_buffer::*;
pub use self::storage_buffer::*;
pub use self::texture::*;
