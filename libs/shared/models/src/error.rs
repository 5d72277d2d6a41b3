use thiserror::Error;

/// Failures raised by the shared infrastructure crates. Domain cells carry
/// their own error enums and translate at their boundaries.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
