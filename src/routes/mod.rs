pub mod auth;
pub mod games;
pub mod health;

use std::sync::Arc;

use axum::{
    extract::FromRequest,
    routing::{get, post},
    Router,
};

use crate::{error::AppError, AppState};

/// `Json` extractor whose rejections use the API's error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_current_user))
        .route("/games/create", post(games::create_game))
        .route("/games/join", post(games::join_game))
        .route("/games/move", post(games::make_move))
        .route("/games/available", get(games::list_available_games))
        .route("/games/history", get(games::get_history))
        .route("/games/{id}", get(games::get_game))
}

/// Shared helpers for router-level tests
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{config::Config, db::MemoryStore, AppState};

    pub fn test_app() -> Router {
        let state = Arc::new(AppState {
            config: Config::for_tests(),
            store: Arc::new(MemoryStore::new()),
        });
        super::create_routes().with_state(state)
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Register a user and return their bearer token
    pub async fn register(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(serde_json::json!({ "username": username, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}
