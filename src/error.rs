use thiserror::Error;

/// Errors produced inside the request pipeline.
///
/// None of these cross a facade boundary: every `ApiError` is converted into
/// a negative [`ApiOutcome`](crate::response::ApiOutcome) before a service
/// method returns.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No HTTP response was received (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// The backend rejected the session (401). The store has already been
    /// cleared by the time this is observed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// An error status with a body the envelope parser could not read.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },
    /// A 2xx body that does not match the expected envelope shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
