use axum::http::StatusCode;
use thiserror::Error;

/// An error that carries an HTTP status and a detail message
///
/// Both the router's own failures and errors raised by application code implement it,
/// so a single callback can translate them.
pub trait HttpError: std::error::Error + Send + Sync + 'static {
    fn status_code(&self) -> u16;

    /// Becomes the envelope's `message`, which is always a string. Structured details
    /// belong in the response `data` instead.
    fn detail(&self) -> String;
}

/// Raised by application code to answer with an explicit status and detail
///
/// The status becomes the envelope's business `code`. It does not change the transport
/// status of the response.
///
/// # Example
/// ```
/// use axum::http::StatusCode;
/// use xyapi::exception::{HttpError, HttpException};
///
/// let exc = HttpException::from_status(StatusCode::NOT_FOUND);
/// assert_eq!(exc.status_code(), 404);
/// assert_eq!(exc.detail(), "Not Found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {detail}")]
pub struct HttpException {
    status: u16,
    detail: String,
}

impl HttpException {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Detail defaults to the status' reason phrase
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        )
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl HttpError for HttpException {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn detail(&self) -> String {
        self.detail.clone()
    }
}

/// Produced by the router fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl RoutingError {
    pub fn status(&self) -> StatusCode {
        match self {
            RoutingError::NotFound => StatusCode::NOT_FOUND,
            RoutingError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl HttpError for RoutingError {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn detail(&self) -> String {
        self.to_string()
    }
}
