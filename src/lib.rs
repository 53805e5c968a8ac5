//! # xyapi
//!
//! Uniform JSON responses and centralized error translation for axum applications.
//!
//! Every response, success or failure, has the same shape:
//!
//! ```text
//! {"code": <business code>, "message": <text>, "data": <payload>}
//! ```
//!
//! The business `code` is independent of the transport status, which is 200 unless a
//! response sets it explicitly.
//!
//! ## Features
//!
//! - **Response envelope**: [`ApiResponse`] with `ok` / `error` defaults and extra keys
//! - **Custom encoding**: dates, decimals, bytes and user types via [`encoder::Encodable`]
//! - **Exception handling**: validation, routing, HTTP and unhandled errors (including
//!   panics) translated by [`ApiExceptionHandler`] through a tower layer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, routing::{get, post}};
//! use serde::Deserialize;
//! use xyapi::prelude::*;
//!
//! #[derive(Deserialize, serde::Serialize)]
//! struct NewItem {
//!     name: String,
//! }
//!
//! async fn health() -> ApiResponse {
//!     ApiResponse::success(Value::map([("status", "up")]))
//! }
//!
//! async fn create(Payload(item): Payload<NewItem>) -> Result<ApiResponse, ApiError> {
//!     let data = Value::from_serialize(&item).map_err(ApiError::unhandled)?;
//!     Ok(ApiResponse::success(data))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::new()
//!         .route("/health", get(health))
//!         .route("/items", post(create));
//!     let app = ApiExceptionHandler::new(ApiConfig::from_env()).init_app(router);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod common;
pub mod config;
pub mod encoder;
pub mod error;
pub mod exception;

// Re-export core types
pub use common::{ApiResponse, ResponseKind};
pub use config::{ApiConfig, ConfigService};
pub use encoder::{CustomEncoder, Encodable, Value};
pub use error::{Result, XyapiError};
pub use exception::{ApiError, ApiExceptionHandler, ErrorCategory, ExceptionHandlers};

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use xyapi::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{ApiResponse, ResponseKind};
    pub use crate::config::{ApiConfig, ConfigService};
    pub use crate::encoder::{CustomEncoder, Encodable, Value};
    pub use crate::error::XyapiError;
    pub use crate::exception::{
        ApiError, ApiExceptionHandler, ErrorCategory, ExceptionHandlers, ExceptionLayer,
        FieldError, HttpError, HttpException, PathParams, Payload, QueryParams, RequestContext,
        RoutingError,
        UnhandledError, ValidationError,
    };
    pub use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
    };
}
