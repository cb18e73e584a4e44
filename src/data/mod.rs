pub mod image_ops;
pub mod landmarks;
pub mod loader;

pub use image_ops::*;
pub use landmarks::*;
pub use loader::*;
