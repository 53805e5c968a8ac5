use super::ApiError;
use crate::encoder::Value;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use thiserror::Error;

/// One problem found in the request input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path to the offending input, e.g. `["body", "name"]`
    pub loc: Vec<String>,
    pub msg: String,
    pub kind: String,
}

impl FieldError {
    pub fn new<I, L>(loc: I, msg: impl Into<String>, kind: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            loc: loc.into_iter().map(Into::into).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::map([
            ("loc", Value::from(self.loc.clone())),
            ("msg", Value::from(self.msg.as_str())),
            ("type", Value::from(self.kind.as_str())),
        ])
    }
}

/// The request input could not be accepted
#[derive(Debug, Clone, Error)]
#[error("{} validation error(s)", .errors.len())]
pub struct ValidationError {
    errors: Vec<FieldError>,
    body: Value,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            body: Value::Null,
        }
    }

    /// Attach the raw input that was rejected
    pub fn with_body(mut self, body: impl Into<Value>) -> Self {
        self.body = body.into();
        self
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn errors_value(&self) -> Value {
        Value::Array(self.errors.iter().map(FieldError::to_value).collect())
    }

    /// Describe a failed JSON decode of `body`
    pub fn from_json_error(error: &serde_json::Error, body: &[u8]) -> Self {
        let message = error.to_string();
        let mut loc = vec!["body".to_string()];
        if let Some(field) = missing_field(&message) {
            loc.push(field.to_string());
        }

        let kind = match error.classify() {
            Category::Syntax | Category::Eof => "json_invalid",
            Category::Data => "value_error",
            Category::Io => "body_read",
        };

        Self::new(vec![FieldError::new(loc, message, kind)]).with_body(Value::bytes(body))
    }
}

/// Field named by serde's "missing field `name`" message
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

impl From<JsonRejection> for ValidationError {
    fn from(rejection: JsonRejection) -> Self {
        let kind = match &rejection {
            JsonRejection::JsonDataError(_) => "value_error",
            JsonRejection::JsonSyntaxError(_) => "json_invalid",
            JsonRejection::MissingJsonContentType(_) => "content_type",
            JsonRejection::BytesRejection(_) => "body_read",
            _ => "invalid",
        };
        Self::new(vec![FieldError::new(["body"], rejection.body_text(), kind)])
    }
}

impl From<QueryRejection> for ValidationError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(vec![FieldError::new(
            ["query"],
            rejection.body_text(),
            "value_error",
        )])
    }
}

impl From<PathRejection> for ValidationError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(vec![FieldError::new(
            ["path"],
            rejection.body_text(),
            "value_error",
        )])
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.into())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.into())
    }
}

/// JSON body extractor that keeps the raw bytes of a rejected body
///
/// ```rust,ignore
/// async fn create(Payload(item): Payload<NewItem>) -> ApiResponse {
///     ApiResponse::success(Value::from_serialize(&item)?)
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            ValidationError::new(vec![FieldError::new(
                ["body"],
                rejection.body_text(),
                "body_read",
            )])
        })?;

        serde_json::from_slice(&bytes)
            .map(Payload)
            .map_err(|e| ValidationError::from_json_error(&e, &bytes).into())
    }
}

/// Path parameter extractor whose rejection is a [`ValidationError`]
///
/// The rejected path is kept as the error's body.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParams(value)),
            Err(rejection) => {
                let path = parts.uri.path().to_string();
                Err(ValidationError::from(rejection).with_body(path).into())
            }
        }
    }
}

/// Query string extractor whose rejection is a [`ValidationError`]
///
/// The raw query string is kept as the error's body.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => {
                let query = parts.uri.query().map(str::to_string);
                Err(ValidationError::from(rejection).with_body(query).into())
            }
        }
    }
}
