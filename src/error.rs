use std::path::PathBuf;

/// Errors surfaced by the alignment library.
///
/// Degenerate inputs (no qualified landmark match, no overlap between the
/// images at a candidate offset) are not errors; they score zero.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("chip template not set; call set_chip_template before run")]
    ChipTemplateNotSet,

    #[error("invalid chip template: {0}")]
    InvalidChipTemplate(String),

    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    #[error("search angle {0} is not a multiple of 90 degrees")]
    InvalidAngle(u32),

    #[error("{0} image is empty")]
    EmptyImage(&'static str),

    #[error("image too small: {width}x{height}, minimum: {min}x{min}")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("config serialization failed: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for AlignError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

impl From<toml::de::Error> for AlignError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

impl From<toml::ser::Error> for AlignError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
