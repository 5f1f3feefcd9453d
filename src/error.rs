use thiserror::Error;

/// Errors reported by the detection core. A failure is always for the whole
/// call; there is no partial output.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The input image is unusable (zero-dimension or undecodable).
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A tunable is outside its valid range. Out-of-range values fail
    /// rather than being silently clamped.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An underlying image operation failed.
    #[error("processing failed: {0}")]
    Processing(String),
}

impl From<image::ImageError> for DetectionError {
    fn from(err: image::ImageError) -> Self {
        DetectionError::Processing(err.to_string())
    }
}
