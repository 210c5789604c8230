use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdCardError {
    #[error("Image decoding error: {0}")]
    ImageDecoding(String),
    #[error("Text recognition error: {0}")]
    Recognition(String),
    #[error("OCR service not available: {0}")]
    OcrUnavailable(String),
    #[error("Invalid side: {0}")]
    InvalidSide(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IdCardError {
    /// Errors raised by the OCR/decoding collaborators rather than by the caller's input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            IdCardError::ImageDecoding(_)
                | IdCardError::Recognition(_)
                | IdCardError::OcrUnavailable(_)
        )
    }
}
