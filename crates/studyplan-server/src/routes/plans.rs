use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};
use studyplan_core::plan::{CreatePlan, UpdatePlan};

use crate::auth::AuthUser;

use super::{to_error, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/plans", get(list_plans).post(create_plan))
        .route(
            "/api/plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
}

async fn list_plans(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Json<Value> {
    Json(json!(state.store.list_plans(&user.id)))
}

async fn get_plan(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .store
        .get_plan(&user.id, &id)
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn create_plan(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(input): Json<CreatePlan>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .store
        .create_plan(&user.id, &input)
        .map(|p| (StatusCode::CREATED, Json(json!(p))))
        .map_err(to_error)
}

async fn update_plan(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(update): Json<UpdatePlan>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .store
        .update_plan(&user.id, &id, &update)
        .map(|p| Json(json!(p)))
        .map_err(to_error)
}

async fn delete_plan(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    state
        .store
        .delete_plan(&user.id, &id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(to_error)
}
