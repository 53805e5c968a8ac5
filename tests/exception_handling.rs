use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
    response::Response,
    routing::{get, post},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tower::ServiceExt;
use xyapi::prelude::*;

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
}

async fn ok() -> ApiResponse {
    ApiResponse::ok().with_data(Value::map([("id", 1)]))
}

async fn typed() -> ApiResponse {
    let at = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();
    ApiResponse::success(Value::map([
        ("at", Value::from(at)),
        ("on", Value::from(at.date())),
        ("price", Value::from(Decimal::from_str("9.99").unwrap())),
        ("raw", Value::bytes("bytes")),
    ]))
}

async fn missing() -> Result<ApiResponse, ApiError> {
    Err(HttpException::new(404, "Not Found").into())
}

async fn create(Payload(item): Payload<NewItem>) -> ApiResponse {
    ApiResponse::success(Value::map([("name", item.name)]))
}

#[derive(Debug, Deserialize)]
struct Paging {
    page: u32,
}

async fn user(PathParams(id): PathParams<u64>) -> ApiResponse {
    ApiResponse::success(Value::map([("id", id)]))
}

async fn users(QueryParams(paging): QueryParams<Paging>) -> ApiResponse {
    ApiResponse::success(Value::map([("page", paging.page)]))
}

async fn failing() -> Result<ApiResponse, ApiError> {
    Err(anyhow::anyhow!("db password=hunter2 rejected").into())
}

async fn panicking() -> ApiResponse {
    panic!("handler blew up")
}

async fn not_a_number() -> ApiResponse {
    ApiResponse::ok().with_data(f64::NAN)
}

fn app() -> Router {
    let router = Router::new()
        .route("/ok", get(ok))
        .route("/typed", get(typed))
        .route("/missing", get(missing))
        .route("/items", post(create))
        .route("/users/{id}", get(user))
        .route("/users", get(users))
        .route("/failing", get(failing))
        .route("/panicking", get(panicking))
        .route("/nan", get(not_a_number));
    ApiExceptionHandler::default().init_app(router)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response: Response = app.oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers()[CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_success_envelope() {
    let (status, body) = send(app(), get_request("/ok")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"code":200,"message":"ok","data":{"id":1}}"#);
}

#[tokio::test]
async fn test_extended_values_round_trip() {
    let (_, body) = send(app(), get_request("/typed")).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["at"], "2024-01-02 03:04:05");
    assert_eq!(json["data"]["on"], "2024-01-02");
    assert_eq!(json["data"]["price"], 9.99);
    assert_eq!(json["data"]["raw"], "bytes");
}

#[tokio::test]
async fn test_http_exception_keeps_transport_status() {
    let (status, body) = send(app(), get_request("/missing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"code":404,"message":"Not Found","data":null}"#);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, body) = send(app(), get_request("/nowhere")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"code":404,"message":"Not Found","data":null}"#);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/ok")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app(), request).await;
    assert_eq!(
        body,
        r#"{"code":405,"message":"Method Not Allowed","data":null}"#
    );
}

#[tokio::test]
async fn test_validation_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 400);
    assert_eq!(json["message"], "Bad Request");
    assert_eq!(json["data"]["detail"][0]["loc"], serde_json::json!(["body", "name"]));
    assert_eq!(json["data"]["body"], "{}");
}

#[tokio::test]
async fn test_valid_payload() {
    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .body(Body::from(r#"{"name":"茶"}"#))
        .unwrap();
    let (_, body) = send(app(), request).await;
    assert_eq!(body, r#"{"code":200,"message":"ok","data":{"name":"茶"}}"#);
}

#[tokio::test]
async fn test_unhandled_error_is_generic() {
    let (status, body) = send(app(), get_request("/failing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        r#"{"code":500,"message":"Internal Server Error","data":null}"#
    );
    assert!(!body.contains("hunter2"));
}

#[tokio::test]
async fn test_panic_is_unhandled_error() {
    let (_, body) = send(app(), get_request("/panicking")).await;
    assert_eq!(
        body,
        r#"{"code":500,"message":"Internal Server Error","data":null}"#
    );
}

#[tokio::test]
async fn test_unrenderable_data() {
    let (status, body) = send(app(), get_request("/nan")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("NaN"));
    assert_eq!(
        body,
        r#"{"code":500,"message":"Internal Server Error","data":null}"#
    );
}

#[tokio::test]
async fn test_custom_handler_receives_request_context() {
    let mut handlers = ExceptionHandlers::new();
    ApiExceptionHandler::default().attach(&mut handlers);
    handlers.add_exception_handler(ErrorCategory::Http, |ctx, error| {
        ApiResponse::error()
            .with_http_status(StatusCode::NOT_FOUND)
            .with_message(error.to_string())
            .with_extra("path", ctx.uri.path())
    });

    let app = Router::new()
        .route("/missing", get(missing))
        .layer(ExceptionLayer::new(handlers));

    let (status, body) = send(app, get_request("/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        r#"{"code":500,"message":"404: Not Found","data":null,"path":"/missing"}"#
    );
}

#[tokio::test]
async fn test_path_params() {
    let (_, body) = send(app(), get_request("/users/7")).await;
    assert_eq!(body, r#"{"code":200,"message":"ok","data":{"id":7}}"#);
}

#[tokio::test]
async fn test_bad_path_param_is_validation_error() {
    let (status, body) = send(app(), get_request("/users/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 400);
    assert_eq!(json["message"], "Bad Request");
    assert_eq!(json["data"]["detail"][0]["loc"], serde_json::json!(["path"]));
    assert_eq!(json["data"]["body"], "/users/abc");
}

#[tokio::test]
async fn test_bad_query_is_validation_error() {
    let (status, body) = send(app(), get_request("/users?page=x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], 400);
    assert_eq!(json["data"]["detail"][0]["loc"], serde_json::json!(["query"]));
    assert_eq!(json["data"]["body"], "page=x");
}

#[tokio::test]
async fn test_query_params() {
    let (_, body) = send(app(), get_request("/users?page=3")).await;
    assert_eq!(body, r#"{"code":200,"message":"ok","data":{"page":3}}"#);
}
