//! Translation of request errors into [`ApiResponse`](crate::common::ApiResponse) envelopes.
//!
//! Route handlers return `Err(ApiError)`. The error renders a default envelope on its
//! own, and when the [`ExceptionLayer`] is installed the layer replaces that envelope
//! with the output of the callback registered for the error's [`ErrorCategory`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub mod handler;
pub mod http;
pub mod layer;
pub mod registry;
pub mod unhandled;
pub mod validation;

pub use handler::ApiExceptionHandler;
pub use http::{HttpError, HttpException, RoutingError};
pub use layer::ExceptionLayer;
pub use registry::{ExceptionHandlers, HandlerFn, RequestContext};
pub use unhandled::UnhandledError;
pub use validation::{FieldError, PathParams, Payload, QueryParams, ValidationError};

/// The error kinds a callback can be registered for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
pub enum ErrorCategory {
    /// Malformed request input
    Validation,
    /// Raised by the router itself: unknown path, method not allowed
    Routing,
    /// Raised by application code with an explicit status and detail
    Http,
    /// Everything else
    Unhandled,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Http(#[from] HttpException),

    #[error(transparent)]
    Unhandled(#[from] UnhandledError),
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Validation(_) => ErrorCategory::Validation,
            ApiError::Routing(_) => ErrorCategory::Routing,
            ApiError::Http(_) => ErrorCategory::Http,
            ApiError::Unhandled(_) => ErrorCategory::Unhandled,
        }
    }

    pub fn http(status: StatusCode, detail: impl Into<String>) -> Self {
        ApiError::Http(HttpException::new(status.as_u16(), detail))
    }

    pub fn unhandled(error: impl Into<anyhow::Error>) -> Self {
        ApiError::Unhandled(UnhandledError::new(error))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Unhandled(UnhandledError::new(error))
    }
}

/// Carries the original error from the route to the [`ExceptionLayer`]
#[derive(Clone)]
pub(crate) struct ErrorSlot(pub(crate) Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = ApiExceptionHandler::quiet()
            .handle(&RequestContext::default(), &self)
            .into_response();
        response.extensions_mut().insert(ErrorSlot(Arc::new(self)));
        response
    }
}
