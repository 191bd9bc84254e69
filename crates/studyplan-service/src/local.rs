use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use studyplan_core::plan::{CreatePlan, StudyPlan, UpdatePlan};
use studyplan_core::user::{Session, SignIn, SignUp, User};

use crate::{MemoryStore, PlanService, ServiceError};

/// In-process client: `PlanService` over a shared `MemoryStore`, holding
/// its own session token like `HttpService` does. Several `LocalService`
/// values can share one store to act as different signed-in users.
pub struct LocalService {
    store: Arc<MemoryStore>,
    token: RwLock<Option<String>>,
}

impl LocalService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            token: RwLock::new(None),
        }
    }

    fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap() = token;
    }

    fn owner(&self) -> Result<User, ServiceError> {
        self.token()
            .and_then(|t| self.store.session_user(&t))
            .ok_or_else(|| ServiceError::Unauthorized("no active session".into()))
    }
}

#[async_trait]
impl PlanService for LocalService {
    async fn current_user(&self) -> Result<Option<User>, ServiceError> {
        Ok(self.token().and_then(|t| self.store.session_user(&t)))
    }

    async fn sign_up(&self, input: &SignUp) -> Result<Session, ServiceError> {
        let session = self.store.sign_up(input)?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn sign_in(&self, input: &SignIn) -> Result<Session, ServiceError> {
        let session = self.store.sign_in(input)?;
        self.set_token(Some(session.token.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        if let Some(token) = self.token() {
            self.store.sign_out(&token);
        }
        self.set_token(None);
        Ok(())
    }

    async fn list_plans(&self) -> Result<Vec<StudyPlan>, ServiceError> {
        let owner = self.owner()?;
        Ok(self.store.list_plans(&owner.id))
    }

    async fn get_plan(&self, id: &str) -> Result<StudyPlan, ServiceError> {
        let owner = self.owner()?;
        self.store.get_plan(&owner.id, id)
    }

    async fn create_plan(&self, input: &CreatePlan) -> Result<StudyPlan, ServiceError> {
        let owner = self.owner()?;
        self.store.create_plan(&owner.id, input)
    }

    async fn update_plan(&self, id: &str, update: &UpdatePlan) -> Result<StudyPlan, ServiceError> {
        let owner = self.owner()?;
        self.store.update_plan(&owner.id, id, update)
    }

    async fn delete_plan(&self, id: &str) -> Result<(), ServiceError> {
        let owner = self.owner()?;
        self.store.delete_plan(&owner.id, id)
    }
}
