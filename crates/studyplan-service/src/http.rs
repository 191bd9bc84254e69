use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use studyplan_core::plan::{CreatePlan, StudyPlan, UpdatePlan};
use studyplan_core::user::{Session, SignIn, SignUp, User};

use crate::{PlanService, ServiceError};

/// Async HTTP client implementation of `PlanService`.
///
/// Holds the bearer session token: set on sign-in/sign-up, cleared on
/// sign-out or when the backend answers 401. Every call is attempted
/// exactly once; there are no retries.
pub struct HttpService {
    base_url: String,
    client: Client,
    token: RwLock<Option<String>>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            token: RwLock::new(None),
        }
    }

    /// Resume an existing session instead of signing in again.
    pub fn with_token(base_url: &str, token: String) -> Self {
        let service = Self::new(base_url);
        service.set_token(Some(token));
        service
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap() = token;
    }

    fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Check if the backend is reachable.
    /// The health endpoint is NOT authenticated.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let builder = self.client.get(format!("{}{path}", self.base_url));
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), ServiceError> {
        let builder = self.client.post(format!("{}{path}", self.base_url));
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }

    async fn put_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .put(format!("{}{path}", self.base_url))
            .json(body);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }

    async fn delete_req(&self, path: &str) -> Result<(), ServiceError> {
        let builder = self.client.delete(format!("{}{path}", self.base_url));
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(parse_error(resp).await)
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error(resp: reqwest::Response) -> ServiceError {
    let status = resp.status();
    parse_error_with_status(status, resp).await
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(msg)
    } else if status == StatusCode::BAD_REQUEST {
        ServiceError::InvalidInput(msg)
    } else if status == StatusCode::UNAUTHORIZED {
        ServiceError::Unauthorized(msg)
    } else {
        ServiceError::Internal(msg)
    }
}

#[async_trait]
impl PlanService for HttpService {
    async fn current_user(&self) -> Result<Option<User>, ServiceError> {
        if self.token().is_none() {
            return Ok(None);
        }
        match self.get_json::<User>("/api/auth/me").await {
            Ok(user) => Ok(Some(user)),
            // An expired or revoked session is "nobody", not a failure.
            Err(ServiceError::Unauthorized(_)) => {
                self.set_token(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_up(&self, input: &SignUp) -> Result<Session, ServiceError> {
        let session: Session = self.post_json("/api/auth/sign-up", input).await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn sign_in(&self, input: &SignIn) -> Result<Session, ServiceError> {
        let session: Session = self.post_json("/api/auth/sign-in", input).await?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        let had_token = self.token().is_some();
        if had_token {
            let result = self.post_empty("/api/auth/sign-out").await;
            self.set_token(None);
            match result {
                // The token was already dead server-side; signing out is done.
                Ok(()) | Err(ServiceError::Unauthorized(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn list_plans(&self) -> Result<Vec<StudyPlan>, ServiceError> {
        self.get_json("/api/plans").await
    }

    async fn get_plan(&self, id: &str) -> Result<StudyPlan, ServiceError> {
        self.get_json(&format!("/api/plans/{id}")).await
    }

    async fn create_plan(&self, input: &CreatePlan) -> Result<StudyPlan, ServiceError> {
        self.post_json("/api/plans", input).await
    }

    async fn update_plan(&self, id: &str, update: &UpdatePlan) -> Result<StudyPlan, ServiceError> {
        self.put_json(&format!("/api/plans/{id}"), update).await
    }

    async fn delete_plan(&self, id: &str) -> Result<(), ServiceError> {
        self.delete_req(&format!("/api/plans/{id}")).await
    }
}
