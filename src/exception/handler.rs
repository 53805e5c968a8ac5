use super::http::{HttpError, RoutingError};
use super::layer::ExceptionLayer;
use super::registry::{ExceptionHandlers, RequestContext};
use super::unhandled::UnhandledError;
use super::validation::ValidationError;
use super::{ApiError, ErrorCategory};
use crate::common::ApiResponse;
use crate::config::ApiConfig;
use crate::encoder::{CustomEncoder, Value};
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::fmt::Display;
use tower_http::catch_panic::CatchPanicLayer;

/// Translates errors into envelopes
///
/// Every translation is total: whatever the error holds, the result is an envelope
/// that renders. Unhandled errors never expose their message to the client.
///
/// # Example
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use xyapi::prelude::*;
///
/// async fn find_user() -> Result<ApiResponse, ApiError> {
///     Err(ApiError::http(StatusCode::NOT_FOUND, "User not found"))
/// }
///
/// let app: Router = ApiExceptionHandler::default()
///     .init_app(Router::new().route("/users/{id}", get(find_user)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ApiExceptionHandler {
    config: ApiConfig,
}

impl ApiExceptionHandler {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    /// Translation without any logging
    pub(crate) fn quiet() -> Self {
        Self::new(ApiConfig {
            log_unhandled: false,
            log_client_errors: false,
            ..ApiConfig::default()
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Register one callback per [`ErrorCategory`]
    ///
    /// Attaching twice to the same registry replaces the earlier callbacks.
    pub fn attach(&self, handlers: &mut ExceptionHandlers) {
        let this = self.clone();
        handlers.add_exception_handler(ErrorCategory::Validation, move |ctx, error| match error {
            ApiError::Validation(exc) => this.on_validation_error(ctx, exc),
            other => this.on_unhandled_error(ctx, other),
        });

        let this = self.clone();
        handlers.add_exception_handler(ErrorCategory::Routing, move |ctx, error| match error {
            ApiError::Routing(exc) => this.on_http_error(ctx, exc),
            other => this.on_unhandled_error(ctx, other),
        });

        let this = self.clone();
        handlers.add_exception_handler(ErrorCategory::Http, move |ctx, error| match error {
            ApiError::Http(exc) => this.on_http_error(ctx, exc),
            other => this.on_unhandled_error(ctx, other),
        });

        let this = self.clone();
        handlers.add_exception_handler(ErrorCategory::Unhandled, move |ctx, error| {
            this.on_unhandled_error(ctx, error)
        });
    }

    /// A layer holding a registry with this handler attached
    pub fn layer(&self) -> ExceptionLayer {
        let mut handlers = ExceptionHandlers::new();
        self.attach(&mut handlers);
        ExceptionLayer::new(handlers)
    }

    /// Install error translation on `router`
    ///
    /// Sets the router's fallbacks for unknown paths and disallowed methods, catches
    /// panics when configured to, and adds the [`ExceptionLayer`]. Routes added after
    /// this call are not covered.
    pub fn init_app<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let layer = self.layer();
        let router = router
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed);

        let router = if self.config.catch_panics {
            router.layer(CatchPanicLayer::custom(panic_response))
        } else {
            router
        };

        router.layer(layer)
    }

    /// Translate any [`ApiError`] with the matching method
    pub fn handle(&self, ctx: &RequestContext, error: &ApiError) -> ApiResponse {
        match error {
            ApiError::Validation(exc) => self.on_validation_error(ctx, exc),
            ApiError::Routing(exc) => self.on_http_error(ctx, exc),
            ApiError::Http(exc) => self.on_http_error(ctx, exc),
            ApiError::Unhandled(exc) => self.on_unhandled_error(ctx, exc),
        }
    }

    /// `400 Bad Request` with the error list and the rejected body as data
    pub fn on_validation_error(&self, ctx: &RequestContext, exc: &ValidationError) -> ApiResponse {
        if self.config.log_client_errors {
            tracing::info!("{} {} rejected: {}", ctx.method, ctx.uri, exc);
        } else {
            tracing::debug!("{} {} rejected: {}", ctx.method, ctx.uri, exc);
        }

        let status = StatusCode::BAD_REQUEST;
        ApiResponse::new()
            .with_http_status(status)
            .with_code(status.as_u16() as i64)
            .with_message(status.canonical_reason().unwrap_or_default())
            .with_data(Value::map([
                ("detail", exc.errors_value()),
                ("body", sanitize_body(exc.body())),
            ]))
    }

    /// The error's status becomes the business code; transport status stays 200
    pub fn on_http_error(&self, ctx: &RequestContext, exc: &dyn HttpError) -> ApiResponse {
        if self.config.log_client_errors {
            tracing::info!("{} {} failed: {}", ctx.method, ctx.uri, exc);
        } else {
            tracing::debug!("{} {} failed: {}", ctx.method, ctx.uri, exc);
        }

        ApiResponse::new()
            .with_code(exc.status_code() as i64)
            .with_message(exc.detail())
    }

    /// Generic `500`; the error itself is only logged
    pub fn on_unhandled_error(&self, ctx: &RequestContext, exc: &dyn Display) -> ApiResponse {
        if self.config.log_unhandled {
            tracing::error!("Unhandled error on {} {}: {}", ctx.method, ctx.uri, exc);
        }

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        ApiResponse::new()
            .with_code(status.as_u16() as i64)
            .with_message(status.canonical_reason().unwrap_or_default())
    }
}

/// Make the rejected body encodable no matter what it holds
fn sanitize_body(body: &Value) -> Value {
    match body {
        Value::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        other if CustomEncoder::new().to_json(other).is_ok() => other.clone(),
        _ => Value::Null,
    }
}

async fn not_found() -> ApiError {
    RoutingError::NotFound.into()
}

async fn method_not_allowed() -> ApiError {
    RoutingError::MethodNotAllowed.into()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::from(UnhandledError::panic(message)).into_response()
}
