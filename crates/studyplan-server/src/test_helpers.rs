use std::sync::Arc;

use axum::Router;
use studyplan_core::user::{Session, SignUp};
use studyplan_service::MemoryStore;
use tokio::net::TcpListener;

/// Build a test router over a fresh in-memory store.
pub fn test_router() -> Router {
    crate::routes::build_router(Arc::new(MemoryStore::new()))
}

/// Build a test router with one registered user, returning (router, session).
pub async fn test_router_with_session() -> (Router, Session) {
    let store = Arc::new(MemoryStore::new());
    let session = store
        .sign_up(&SignUp {
            name: "Test User".into(),
            email: "test@example.com".into(),
            password: "Abc123!@".into(),
        })
        .expect("test user sign-up");
    let router = crate::routes::build_router(store);
    (router, session)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let app = test_router();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        _handle: handle,
    }
}
