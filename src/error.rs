use thiserror::Error;

pub type Result<T> = std::result::Result<T, XyapiError>;

#[derive(Debug, Error)]
pub enum XyapiError {
    #[error("Out of range float values are not JSON compliant: {0}")]
    NonFiniteFloat(f64),

    #[error("Object of type {type_name} is not JSON serializable")]
    Unsupported { type_name: String },

    #[error("Byte sequence is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Decimal {0} cannot be represented as a float")]
    DecimalOutOfRange(String),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl axum::response::IntoResponse for XyapiError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Failed to render response: {}", self);
        crate::common::response::internal_error_response()
    }
}
