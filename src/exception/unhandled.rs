use std::fmt;
use std::sync::Arc;

/// Any failure without a more specific translation
///
/// The wrapped error is only ever logged; it never reaches the response body.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    inner: Arc<anyhow::Error>,
    panicked: bool,
}

impl UnhandledError {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: Arc::new(error.into()),
            panicked: false,
        }
    }

    /// A route handler panicked with `message`
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(anyhow::anyhow!("handler panicked: {}", message.into())),
            panicked: true,
        }
    }

    pub fn is_panic(&self) -> bool {
        self.panicked
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl fmt::Display for UnhandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for UnhandledError {}

impl From<anyhow::Error> for UnhandledError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_display_includes_context_chain() {
        let result: anyhow::Result<()> =
            Err(anyhow::anyhow!("connection refused")).context("loading user");
        let error = UnhandledError::new(result.unwrap_err());
        assert_eq!(error.to_string(), "loading user: connection refused");
        assert!(!error.is_panic());
    }

    #[test]
    fn test_panic() {
        let error = UnhandledError::panic("index out of bounds");
        assert!(error.is_panic());
        assert_eq!(error.to_string(), "handler panicked: index out of bounds");
    }
}
