pub mod auth;
pub mod health;
pub mod plans;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use studyplan_service::{MemoryStore, ServiceError};
use tower_http::cors::CorsLayer;

use crate::auth::auth_middleware;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
}

pub fn build_router(store: Arc<MemoryStore>) -> Router {
    let state = AppState { store };

    let public = Router::new()
        .merge(health::routes())
        .merge(auth::public_routes());

    let protected = Router::new()
        .merge(plans::routes())
        .merge(auth::protected_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn to_error(err: ServiceError) -> (StatusCode, Json<Value>) {
    let status = match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let msg = match err {
        ServiceError::NotFound(m)
        | ServiceError::InvalidInput(m)
        | ServiceError::Unauthorized(m)
        | ServiceError::Internal(m) => m,
    };
    (status, Json(json!({ "error": msg })))
}
