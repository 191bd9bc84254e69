use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use studyplan_core::user::{SignIn, SignUp, User};

use crate::auth::{AuthUser, SessionToken};

use super::{to_error, AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/sign-out", post(sign_out))
}

async fn sign_up(
    State(state): State<AppState>,
    Json(input): Json<SignUp>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .store
        .sign_up(&input)
        .map(|s| (StatusCode::CREATED, Json(json!(s))))
        .map_err(to_error)
}

async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignIn>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .store
        .sign_in(&input)
        .map(|s| Json(json!(s)))
        .map_err(to_error)
}

async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<User> {
    Json(user)
}

async fn sign_out(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> StatusCode {
    state.store.sign_out(&token);
    StatusCode::NO_CONTENT
}
