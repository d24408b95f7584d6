//! Route handlers organized by resource

pub mod authors;
pub mod books;
pub mod health;
pub mod reviews;
pub mod users;

/// Router test harness over an in-memory store.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::MemoryStore;
    use crate::http::server::{build_router, AppState, ServerConfig};

    pub fn app() -> Router {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        build_router(state, &ServerConfig::default())
    }

    pub fn uniform_app() -> Router {
        let state = AppState::new(Arc::new(MemoryStore::new())).with_uniform_responses(true);
        build_router(state, &ServerConfig::default())
    }

    /// Send one request; an empty response body comes back as `Value::Null`.
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// POST and return the new resource's id.
    pub async fn create(app: &Router, uri: &str, body: Value) -> i64 {
        let (status, json) = send(app, Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", uri, json);
        json["id"].as_i64().unwrap()
    }
}
