use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use studyplan_core::user::User;

use crate::routes::AppState;

/// The authenticated user for the current request, inserted by
/// `auth_middleware` and read by handlers via `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// The raw bearer token the request authenticated with. Sign-out needs it
/// to discard the session.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Axum middleware that enforces authentication.
///
/// Requires a valid `Authorization: Bearer <token>` header resolving to a
/// live session. The resolved user is re-derived here on every request;
/// handlers never trust a client-supplied owner.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = match token {
        Some(t) => t,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing or invalid session token" })),
            )
                .into_response();
        }
    };

    match state.store.session_user(&token) {
        Some(user) => {
            request.extensions_mut().insert(AuthUser(user));
            request.extensions_mut().insert(SessionToken(token));
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing or invalid session token" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::test_helpers::{test_router, test_router_with_session};

    #[tokio::test]
    async fn plans_require_a_token() {
        let app = test_router();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/plans")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_bearer_passes() {
        let (app, session) = test_router_with_session().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/plans")
                    .header("Authorization", format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_bearer_rejected() {
        let (app, _session) = test_router_with_session().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/plans")
                    .header("Authorization", "Bearer sp_not_a_real_token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_endpoint_needs_no_auth() {
        let app = test_router();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn me_reflects_the_session_user() {
        let (app, session) = test_router_with_session().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header("Authorization", format!("Bearer {}", session.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let user: studyplan_core::user::User = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(user.id, session.user.id);
    }
}
