use axum::{
    Router,
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use xyapi::prelude::*;

#[derive(Debug, Deserialize)]
struct Listing {
    page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NewUser {
    name: String,
    email: String,
}

async fn health() -> ApiResponse {
    ApiResponse::success(Value::map([
        ("status", Value::from("up")),
        ("time", Value::from(Utc::now())),
    ]))
}

async fn get_user(PathParams(id): PathParams<u64>) -> Result<ApiResponse, ApiError> {
    if id == 1 {
        Ok(ApiResponse::success(Value::map([
            ("id", Value::from(id)),
            ("name", Value::from("Test User")),
        ])))
    } else {
        Err(ApiError::http(StatusCode::NOT_FOUND, "User not found"))
    }
}

async fn list_users(QueryParams(listing): QueryParams<Listing>) -> ApiResponse {
    ApiResponse::success(Value::map([
        ("page", Value::from(listing.page.unwrap_or(1))),
        ("users", Value::Array(Vec::new())),
    ]))
}

async fn create_user(Payload(user): Payload<NewUser>) -> Result<ApiResponse, ApiError> {
    let data = Value::from_serialize(&user).map_err(ApiError::unhandled)?;
    Ok(ApiResponse::success(data)
        .with_code(201)
        .with_message("created"))
}

async fn broken() -> Result<ApiResponse, ApiError> {
    Err(anyhow::anyhow!("upstream connection reset").into())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ApiConfig::from_env();
    tracing::info!("Starting envelope server with {:?}", config);

    let router = Router::new()
        .route("/health", get(health))
        .route("/users/{id}", get(get_user))
        .route("/users", get(list_users).post(create_user))
        .route("/broken", get(broken));
    let app = ApiExceptionHandler::new(config).init_app(router);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    tracing::info!("Server running on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await.unwrap();
}
