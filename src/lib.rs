pub mod algorithms;
pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod visualization;

pub use algorithms::*;
pub use data::*;
pub use error::AlignError;

/// Result of one [`AlignByTrack::run`] call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlignmentResult {
    /// Full-resolution offset of the winning hypothesis; `None` when no
    /// hypothesis produced a positive score.
    pub offset: Option<Point>,
    /// Index into the configured search angles.
    pub rotation_index: usize,
    pub rotation_degrees: u32,
    pub score: f64,
    /// Every hypothesis in search order.
    pub hypotheses: Vec<HypothesisRecord>,
    pub processing_time_ms: f64,
    pub run_id: uuid::Uuid,
}

pub type Result<T> = std::result::Result<T, AlignError>;
