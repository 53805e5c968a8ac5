use super::registry::{ExceptionHandlers, RequestContext};
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer routing error responses through an [`ExceptionHandlers`] registry
#[derive(Clone)]
pub struct ExceptionLayer {
    handlers: Arc<ExceptionHandlers>,
}

impl ExceptionLayer {
    pub fn new(handlers: ExceptionHandlers) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    pub fn handlers(&self) -> &Arc<ExceptionHandlers> {
        &self.handlers
    }
}

impl<S> Layer<S> for ExceptionLayer {
    type Service = ExceptionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionMiddleware {
            inner,
            handlers: self.handlers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ExceptionMiddleware<S> {
    inner: S,
    handlers: Arc<ExceptionHandlers>,
}

impl<S> Service<Request<Body>> for ExceptionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let context = RequestContext::from_request(&request);
        let handlers = self.handlers.clone();

        // The clone is not necessarily ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let response = inner.call(request).await?;
            Ok(handlers.resolve(&context, response))
        })
    }
}
