use super::{ApiError, ErrorCategory, ErrorSlot};
use crate::common::ApiResponse;
use axum::http::{Method, Request, Uri, Version};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Callback translating an error into an envelope
pub type HandlerFn = Arc<dyn Fn(&RequestContext, &ApiError) -> ApiResponse + Send + Sync>;

/// What a callback gets to know about the failed request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
}

impl RequestContext {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
        }
    }
}

/// Registry of error callbacks, keyed by [`ErrorCategory`]
///
/// # Example
/// ```
/// use xyapi::common::ApiResponse;
/// use xyapi::exception::{ErrorCategory, ExceptionHandlers};
///
/// let mut handlers = ExceptionHandlers::new();
/// handlers.add_exception_handler(ErrorCategory::Unhandled, |_, _| {
///     ApiResponse::error().with_message("try again later")
/// });
/// assert!(handlers.is_registered(ErrorCategory::Unhandled));
/// ```
#[derive(Clone, Default)]
pub struct ExceptionHandlers {
    handlers: HashMap<ErrorCategory, HandlerFn>,
}

impl ExceptionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `category`, replacing any earlier registration
    pub fn add_exception_handler<F>(&mut self, category: ErrorCategory, handler: F)
    where
        F: Fn(&RequestContext, &ApiError) -> ApiResponse + Send + Sync + 'static,
    {
        if self.handlers.insert(category, Arc::new(handler)).is_some() {
            tracing::warn!("Replacing exception handler for {}", category);
        }
    }

    pub fn handler_for(&self, category: ErrorCategory) -> Option<&HandlerFn> {
        self.handlers.get(&category)
    }

    pub fn is_registered(&self, category: ErrorCategory) -> bool {
        self.handlers.contains_key(&category)
    }

    /// Categories without a callback
    pub fn missing(&self) -> Vec<ErrorCategory> {
        ErrorCategory::iter()
            .filter(|category| !self.is_registered(*category))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the callback for `error`'s category
    ///
    /// Falls back to the `Unhandled` callback, then to a generic 500 envelope.
    pub fn dispatch(&self, context: &RequestContext, error: &ApiError) -> ApiResponse {
        let category = error.category();
        let handler = self
            .handlers
            .get(&category)
            .or_else(|| self.handlers.get(&ErrorCategory::Unhandled));

        match handler {
            Some(handler) => handler(context, error),
            None => {
                tracing::warn!("No exception handler registered for {}", category);
                ApiResponse::new()
                    .with_code(500)
                    .with_message("Internal Server Error")
            }
        }
    }

    /// Replace an error response with the registered callback's envelope
    pub(crate) fn resolve(&self, context: &RequestContext, mut response: Response) -> Response {
        match response.extensions_mut().remove::<ErrorSlot>() {
            Some(ErrorSlot(error)) => {
                tracing::debug!(
                    "Dispatching {} error for {} {}",
                    error.category(),
                    context.method,
                    context.uri
                );
                self.dispatch(context, &error).into_response()
            }
            None => response,
        }
    }
}

impl fmt::Debug for ExceptionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<_> = ErrorCategory::iter()
            .filter(|category| self.is_registered(*category))
            .collect();
        f.debug_struct("ExceptionHandlers")
            .field("registered", &registered)
            .finish()
    }
}
