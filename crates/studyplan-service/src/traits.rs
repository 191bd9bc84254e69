use async_trait::async_trait;
use studyplan_core::plan::{CreatePlan, Status, StudyPlan, UpdatePlan};
use studyplan_core::user::{Session, SignIn, SignUp, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Auth failures: bad credentials, duplicate account, weak password,
    /// missing or expired session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Network failures and backend-reported errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Abstraction over the plan backend.
///
/// The TUI and the stand-in server program against this trait.
/// `HttpService` talks to a remote backend over HTTP.
/// `LocalService` wraps an in-process `MemoryStore`.
///
/// Every plan operation is scoped to the session's user by the backend
/// itself; nothing here lets a client reach another owner's plans.
#[async_trait]
pub trait PlanService: Send + Sync {
    // -- Auth --

    /// The user behind the current session, or `None` when there is no
    /// session or it has expired.
    async fn current_user(&self) -> Result<Option<User>, ServiceError>;
    async fn sign_up(&self, input: &SignUp) -> Result<Session, ServiceError>;
    async fn sign_in(&self, input: &SignIn) -> Result<Session, ServiceError>;
    async fn sign_out(&self) -> Result<(), ServiceError>;

    // -- Plans --

    /// All plans owned by the session's user, newest created first.
    async fn list_plans(&self) -> Result<Vec<StudyPlan>, ServiceError>;
    async fn get_plan(&self, id: &str) -> Result<StudyPlan, ServiceError>;
    async fn create_plan(&self, input: &CreatePlan) -> Result<StudyPlan, ServiceError>;
    async fn update_plan(&self, id: &str, update: &UpdatePlan) -> Result<StudyPlan, ServiceError>;
    async fn delete_plan(&self, id: &str) -> Result<(), ServiceError>;

    /// A status change is a partial update with only `status` set.
    async fn update_status(&self, id: &str, status: Status) -> Result<StudyPlan, ServiceError> {
        self.update_plan(
            id,
            &UpdatePlan {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}
