mod bounds;
pub use self::bounds::*;

mod linear_index;
pub use self::linear_index::*;

mod quantize;
pub use self::quantize::*;
