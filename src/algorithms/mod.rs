pub mod geometry;
pub mod rough_offset;
pub mod scoring;
pub mod search;
pub mod track;

pub use geometry::*;
pub use rough_offset::*;
pub use scoring::*;
pub use search::*;
pub use track::*;
