use crate::encoder::{CustomEncoder, Value};
use crate::error::Result;
use axum::{
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode as HttpStatusCode,
        header::{CONTENT_TYPE, IntoHeaderName},
    },
    response::{IntoResponse, Response},
};

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Keys the body is always built from, in this order
pub const BODY_KEYS: [&str; 3] = ["code", "message", "data"];

/// Extra keys that also configure the transport response
pub const TRANSPORT_KEYS: [&str; 5] = [
    "content",
    "status_code",
    "headers",
    "media_type",
    "background",
];

const INTERNAL_ERROR_BODY: &str = r#"{"code":500,"message":"Internal Server Error","data":null}"#;

/// Which default `code` / `message` pair an envelope starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// No defaults, both serialize as `null`
    #[default]
    Plain,
    Ok,
    Error,
}

impl ResponseKind {
    pub fn default_code(self) -> Option<i64> {
        match self {
            ResponseKind::Plain => None,
            ResponseKind::Ok => Some(200),
            ResponseKind::Error => Some(500),
        }
    }

    pub fn default_message(self) -> Option<&'static str> {
        match self {
            ResponseKind::Plain => None,
            ResponseKind::Ok => Some("ok"),
            ResponseKind::Error => Some("error"),
        }
    }
}

/// Standard API response envelope
///
/// Every response, success or failure, serializes as `{"code", "message", "data"}` plus
/// any extra keys. The business `code` is independent of the transport status, which
/// stays 200 unless set with [`with_http_status`](ApiResponse::with_http_status).
///
/// # Example
/// ```
/// use xyapi::common::response::ApiResponse;
/// use xyapi::encoder::Value;
///
/// let response = ApiResponse::ok().with_data(Value::map([("id", 1)]));
/// assert_eq!(response.render().unwrap(), br#"{"code":200,"message":"ok","data":{"id":1}}"#);
/// ```
#[derive(Debug, Clone)]
pub struct ApiResponse {
    kind: ResponseKind,
    http_status: HttpStatusCode,
    code: Option<i64>,
    message: Option<String>,
    data: Value,
    extras: Vec<(String, Value)>,
    headers: HeaderMap,
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiResponse {
    /// Envelope without default code or message
    pub fn new() -> Self {
        Self::of(ResponseKind::Plain)
    }

    /// `code = 200`, `message = "ok"`
    pub fn ok() -> Self {
        Self::of(ResponseKind::Ok)
    }

    /// `code = 500`, `message = "error"`
    pub fn error() -> Self {
        Self::of(ResponseKind::Error)
    }

    /// Successful envelope carrying `data`
    pub fn success(data: impl Into<Value>) -> Self {
        Self::ok().with_data(data)
    }

    pub fn of(kind: ResponseKind) -> Self {
        Self {
            kind,
            http_status: HttpStatusCode::OK,
            code: kind.default_code(),
            message: kind.default_message().map(str::to_string),
            data: Value::Null,
            extras: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Set the payload. `Value::Null` keeps the current payload.
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        let data = data.into();
        if !data.is_null() {
            self.data = data;
        }
        self
    }

    /// Set the business code. `0` keeps the current code.
    pub fn with_code(mut self, code: i64) -> Self {
        if code != 0 {
            self.code = Some(code);
        }
        self
    }

    /// Set the message. An empty message keeps the current one.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.message = Some(message);
        }
        self
    }

    /// Set the transport status
    pub fn with_http_status(mut self, status: HttpStatusCode) -> Self {
        self.http_status = status;
        self
    }

    /// Add a body key next to `code`, `message` and `data`.
    ///
    /// Extras win over the base keys on collision. `status_code`, `headers` and
    /// `media_type` are also applied to the transport response; `content` and
    /// `background` have no transport counterpart and only land in the body.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        self.apply_transport_option(&key, &value);
        self.extras.push((key, value));
        self
    }

    fn apply_transport_option(&mut self, key: &str, value: &Value) {
        if !TRANSPORT_KEYS.contains(&key) {
            return;
        }

        match key {
            "status_code" => match status_from_value(value) {
                Some(status) => self.http_status = status,
                None => tracing::warn!("Ignoring invalid status_code extra: {:?}", value),
            },
            "headers" => match value {
                Value::Map(entries) => {
                    for (name, value) in entries {
                        match (HeaderName::try_from(name.as_str()), header_value(value)) {
                            (Ok(name), Some(value)) => {
                                self.headers.insert(name, value);
                            }
                            _ => tracing::warn!("Ignoring invalid header extra: {}", name),
                        }
                    }
                }
                other => tracing::warn!("Ignoring non-map headers extra: {:?}", other),
            },
            "media_type" => match header_value(value) {
                Some(media_type) => {
                    self.headers.insert(CONTENT_TYPE, media_type);
                }
                None => tracing::warn!("Ignoring invalid media_type extra: {:?}", value),
            },
            _ => {}
        }
    }

    pub fn with_header<K: IntoHeaderName>(mut self, key: K, value: HeaderValue) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn http_status(&self) -> HttpStatusCode {
        self.http_status
    }

    pub fn code(&self) -> Option<i64> {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn extras(&self) -> &[(String, Value)] {
        &self.extras
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body: base keys first, extras merged over them
    pub fn content(&self) -> Value {
        let mut body: Vec<(String, Value)> = vec![
            (BODY_KEYS[0].to_string(), self.code.into()),
            (BODY_KEYS[1].to_string(), self.message.clone().into()),
            (BODY_KEYS[2].to_string(), self.data.clone()),
        ];

        for (key, value) in &self.extras {
            match body.iter_mut().find(|(existing, _)| existing == key) {
                Some(entry) => entry.1 = value.clone(),
                None => body.push((key.clone(), value.clone())),
            }
        }

        Value::Map(body)
    }

    /// Encode the body as compact UTF-8 JSON
    pub fn render(&self) -> Result<Vec<u8>> {
        self.render_with(&CustomEncoder::new())
    }

    pub fn render_with(&self, encoder: &CustomEncoder) -> Result<Vec<u8>> {
        encoder.encode(&self.content())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = match self.render() {
            Ok(body) => body,
            Err(e) => return e.into_response(),
        };

        let mut response = (self.http_status, body).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response.headers_mut().extend(self.headers);
        response
    }
}

fn status_from_value(value: &Value) -> Option<HttpStatusCode> {
    let code = match value {
        Value::Int(code) => u16::try_from(*code).ok()?,
        Value::UInt(code) => u16::try_from(*code).ok()?,
        _ => return None,
    };
    HttpStatusCode::from_u16(code).ok()
}

fn header_value(value: &Value) -> Option<HeaderValue> {
    match value {
        Value::String(s) => HeaderValue::from_str(s).ok(),
        Value::Int(i) => Some(HeaderValue::from(*i)),
        Value::UInt(u) => Some(HeaderValue::from(*u)),
        _ => None,
    }
}

/// Generic 500 envelope used when a response cannot be rendered
pub(crate) fn internal_error_response() -> Response {
    (
        HttpStatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        INTERNAL_ERROR_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XyapiError;

    fn rendered(response: &ApiResponse) -> String {
        String::from_utf8(response.render().unwrap()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_ok_envelope() {
        let response = ApiResponse::ok().with_data(Value::map([("id", 1)]));
        assert_eq!(
            rendered(&response),
            r#"{"code":200,"message":"ok","data":{"id":1}}"#
        );
    }

    #[test]
    fn test_error_envelope_defaults() {
        assert_eq!(
            rendered(&ApiResponse::error()),
            r#"{"code":500,"message":"error","data":null}"#
        );
    }

    #[test]
    fn test_plain_envelope_has_null_defaults() {
        assert_eq!(
            rendered(&ApiResponse::new()),
            r#"{"code":null,"message":null,"data":null}"#
        );
    }

    #[test]
    fn test_falsy_overrides_keep_defaults() {
        let response = ApiResponse::error()
            .with_code(0)
            .with_message("")
            .with_data(Value::Null);
        assert_eq!(response.code(), Some(500));
        assert_eq!(response.message(), Some("error"));
        assert!(response.data().is_null());
    }

    #[test]
    fn test_overrides() {
        let response = ApiResponse::ok().with_code(201).with_message("created");
        assert_eq!(
            rendered(&response),
            r#"{"code":201,"message":"created","data":null}"#
        );
        assert_eq!(response.http_status(), HttpStatusCode::OK);
    }

    #[test]
    fn test_extras_are_merged() {
        let response = ApiResponse::ok()
            .with_extra("trace_id", "abc")
            .with_extra("message", "overridden")
            .with_extra("headers", 1);
        assert_eq!(
            rendered(&response),
            r#"{"code":200,"message":"overridden","data":null,"trace_id":"abc","headers":1}"#
        );
    }

    #[test]
    fn test_render_is_repeatable() {
        let response = ApiResponse::success(vec!["a", "b"]);
        assert_eq!(response.render().unwrap(), response.render().unwrap());
    }

    #[test]
    fn test_nan_data_fails_to_render() {
        let response = ApiResponse::ok().with_data(f64::NAN);
        assert!(matches!(
            response.render(),
            Err(XyapiError::NonFiniteFloat(_))
        ));
    }

    #[tokio::test]
    async fn test_into_response() {
        let response = ApiResponse::error()
            .with_http_status(HttpStatusCode::CONFLICT)
            .with_header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("42"),
            )
            .into_response();

        assert_eq!(response.status(), HttpStatusCode::CONFLICT);
        assert_eq!(response.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
        assert_eq!(response.headers()["x-request-id"], "42");
        assert_eq!(
            body_string(response).await,
            r#"{"code":500,"message":"error","data":null}"#
        );
    }

    #[tokio::test]
    async fn test_unrenderable_response_falls_back() {
        let response = ApiResponse::ok().with_data(f64::INFINITY).into_response();
        assert_eq!(response.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, INTERNAL_ERROR_BODY);
    }

    #[tokio::test]
    async fn test_transport_extras_reach_the_response() {
        let response = ApiResponse::ok()
            .with_extra("status_code", 201)
            .with_extra("headers", Value::map([("x-trace", "t-1")]))
            .with_extra("media_type", "application/vnd.api+json");
        assert_eq!(response.http_status(), HttpStatusCode::CREATED);

        let response = response.into_response();
        assert_eq!(response.status(), HttpStatusCode::CREATED);
        assert_eq!(response.headers()["x-trace"], "t-1");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/vnd.api+json");
        assert_eq!(
            body_string(response).await,
            r#"{"code":200,"message":"ok","data":null,"status_code":201,"headers":{"x-trace":"t-1"},"media_type":"application/vnd.api+json"}"#
        );
    }

    #[test]
    fn test_invalid_transport_extras_stay_in_body() {
        let response = ApiResponse::ok()
            .with_extra("status_code", 42)
            .with_extra("content", "ignored");
        assert_eq!(response.http_status(), HttpStatusCode::OK);
        assert_eq!(
            rendered(&response),
            r#"{"code":200,"message":"ok","data":null,"status_code":42,"content":"ignored"}"#
        );
    }
}
