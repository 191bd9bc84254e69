use studyplan_core::plan::{CreatePlan, Status, StudyPlan, UpdatePlan};
use studyplan_core::user::{Session, SignIn, SignUp, User};
use tokio::runtime::Runtime;

use crate::{HttpService, PlanService, ServiceError};

/// Blocking wrapper around the async `HttpService`.
///
/// Creates an internal tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpService {
    inner: HttpService,
    rt: Runtime,
}

impl BlockingHttpService {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: HttpService::new(base_url),
            rt: Runtime::new().expect("failed to create tokio runtime"),
        }
    }

    pub fn with_token(base_url: &str, token: String) -> Self {
        Self {
            inner: HttpService::with_token(base_url, token),
            rt: Runtime::new().expect("failed to create tokio runtime"),
        }
    }

    pub fn health_check(&self) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.health_check())
    }

    // -- Trait method delegates --

    pub fn current_user(&self) -> Result<Option<User>, ServiceError> {
        self.rt.block_on(self.inner.current_user())
    }

    pub fn sign_up(&self, input: &SignUp) -> Result<Session, ServiceError> {
        self.rt.block_on(self.inner.sign_up(input))
    }

    pub fn sign_in(&self, input: &SignIn) -> Result<Session, ServiceError> {
        self.rt.block_on(self.inner.sign_in(input))
    }

    pub fn sign_out(&self) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.sign_out())
    }

    pub fn list_plans(&self) -> Result<Vec<StudyPlan>, ServiceError> {
        self.rt.block_on(self.inner.list_plans())
    }

    pub fn get_plan(&self, id: &str) -> Result<StudyPlan, ServiceError> {
        self.rt.block_on(self.inner.get_plan(id))
    }

    pub fn create_plan(&self, input: &CreatePlan) -> Result<StudyPlan, ServiceError> {
        self.rt.block_on(self.inner.create_plan(input))
    }

    pub fn update_plan(&self, id: &str, update: &UpdatePlan) -> Result<StudyPlan, ServiceError> {
        self.rt.block_on(self.inner.update_plan(id, update))
    }

    pub fn update_status(&self, id: &str, status: Status) -> Result<StudyPlan, ServiceError> {
        self.rt.block_on(self.inner.update_status(id, status))
    }

    pub fn delete_plan(&self, id: &str) -> Result<(), ServiceError> {
        self.rt.block_on(self.inner.delete_plan(id))
    }
}
