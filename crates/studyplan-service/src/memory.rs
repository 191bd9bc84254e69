use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use sha2::{Digest, Sha256};
use studyplan_core::plan::{CreatePlan, StudyPlan, UpdatePlan};
use studyplan_core::user::{Session, SignIn, SignUp, User};
use studyplan_core::validate::{self, validate_plan};
use uuid::Uuid;

use crate::ServiceError;

/// SHA-256 hash a string, returning the hex-encoded digest.
fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate a session token: `sp_` + 43 chars of base62-encoded random bytes.
fn generate_token() -> String {
    use rand::Rng;
    const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let random_part: String = (0..43)
        .map(|_| {
            let idx = rng.gen_range(0..BASE62.len());
            BASE62[idx] as char
        })
        .collect();
    format!("sp_{random_part}")
}

struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Inner {
    users: Vec<UserRecord>,
    /// token -> user id
    sessions: HashMap<String, String>,
    plans: Vec<StudyPlan>,
}

/// In-memory stand-in for the hosted backend: users, sessions and plans
/// behind one mutex. State lives for the process lifetime only.
///
/// Ownership is enforced here, not in clients: every plan operation takes
/// the caller's user id and answers `NotFound` for plans it does not own,
/// so other owners' records are indistinguishable from missing ones.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    // -- Auth --

    pub fn sign_up(&self, input: &SignUp) -> Result<Session, ServiceError> {
        if let Some(message) = validate::password_error(&input.password) {
            return Err(ServiceError::Unauthorized(message.to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .iter()
            .any(|r| r.user.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(ServiceError::Unauthorized(
                "an account with this email already exists".into(),
            ));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: input.email.clone(),
            name: input.name.clone(),
            created_at: Utc::now(),
        };
        inner.users.push(UserRecord {
            user: user.clone(),
            password_hash: sha256_hex(&input.password),
        });
        let token = generate_token();
        inner.sessions.insert(token.clone(), user.id.clone());
        tracing::debug!(user_id = %user.id, "user signed up");
        Ok(Session { token, user })
    }

    pub fn sign_in(&self, input: &SignIn) -> Result<Session, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let hash = sha256_hex(&input.password);
        let user = inner
            .users
            .iter()
            .find(|r| r.user.email.eq_ignore_ascii_case(&input.email) && r.password_hash == hash)
            .map(|r| r.user.clone())
            .ok_or_else(|| ServiceError::Unauthorized("invalid email or password".into()))?;
        let token = generate_token();
        inner.sessions.insert(token.clone(), user.id.clone());
        Ok(Session { token, user })
    }

    /// Discards the session. Unknown tokens are a no-op: signing out twice
    /// is not an error.
    pub fn sign_out(&self, token: &str) {
        self.inner.lock().unwrap().sessions.remove(token);
    }

    pub fn session_user(&self, token: &str) -> Option<User> {
        let inner = self.inner.lock().unwrap();
        let user_id = inner.sessions.get(token)?;
        inner
            .users
            .iter()
            .find(|r| &r.user.id == user_id)
            .map(|r| r.user.clone())
    }

    // -- Plans --

    /// All plans owned by `owner_id`, created_at descending. The sort is
    /// stable, so equal timestamps keep insertion order.
    pub fn list_plans(&self, owner_id: &str) -> Vec<StudyPlan> {
        let inner = self.inner.lock().unwrap();
        let mut plans: Vec<StudyPlan> = inner
            .plans
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        plans
    }

    pub fn get_plan(&self, owner_id: &str, id: &str) -> Result<StudyPlan, ServiceError> {
        let inner = self.inner.lock().unwrap();
        inner
            .plans
            .iter()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("plan {id}")))
    }

    pub fn create_plan(
        &self,
        owner_id: &str,
        input: &CreatePlan,
    ) -> Result<StudyPlan, ServiceError> {
        validate_plan(input).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let now = Utc::now();
        let plan = StudyPlan {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: input.title.clone(),
            description: input.description.clone(),
            category: input.category.clone(),
            due_date: input.due_date,
            priority: input.priority,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().unwrap().plans.push(plan.clone());
        tracing::debug!(plan_id = %plan.id, "plan created");
        Ok(plan)
    }

    pub fn update_plan(
        &self,
        owner_id: &str,
        id: &str,
        update: &UpdatePlan,
    ) -> Result<StudyPlan, ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let plan = inner
            .plans
            .iter_mut()
            .find(|p| p.id == id && p.owner_id == owner_id)
            .ok_or_else(|| ServiceError::NotFound(format!("plan {id}")))?;

        let mut candidate = plan.clone();
        if let Some(ref title) = update.title {
            candidate.title = title.clone();
        }
        if let Some(ref description) = update.description {
            candidate.description = description.clone();
        }
        if let Some(ref category) = update.category {
            candidate.category = category.clone();
        }
        if let Some(due_date) = update.due_date {
            candidate.due_date = due_date;
        }
        if let Some(status) = update.status {
            candidate.status = status;
        }
        if let Some(priority) = update.priority {
            candidate.priority = priority;
        }
        validate_plan(&CreatePlan {
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            category: candidate.category.clone(),
            due_date: candidate.due_date,
            priority: candidate.priority,
            status: candidate.status,
        })
        .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        candidate.updated_at = Utc::now();
        *plan = candidate.clone();
        tracing::debug!(plan_id = %id, "plan updated");
        Ok(candidate)
    }

    pub fn delete_plan(&self, owner_id: &str, id: &str) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.plans.len();
        inner.plans.retain(|p| !(p.id == id && p.owner_id == owner_id));
        if inner.plans.len() == before {
            return Err(ServiceError::NotFound(format!("plan {id}")));
        }
        tracing::debug!(plan_id = %id, "plan deleted");
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyplan_core::plan::{Priority, Status};

    fn sign_up_ada(store: &MemoryStore) -> Session {
        store
            .sign_up(&SignUp {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "Abc123!@".into(),
            })
            .unwrap()
    }

    fn plan_input(title: &str) -> CreatePlan {
        CreatePlan {
            title: title.into(),
            description: String::new(),
            category: "Mathematics".into(),
            due_date: None,
            priority: Priority::Medium,
            status: Status::NotStarted,
        }
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn generate_token_format() {
        let token = generate_token();
        assert!(token.starts_with("sp_"), "token should start with 'sp_': {token}");
        assert_eq!(token.len(), 46);
        assert!(token[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(generate_token(), token);
    }

    #[test]
    fn sign_up_then_session_lookup() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let user = store.session_user(&session.token).unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn sign_up_duplicate_email_rejected() {
        let store = MemoryStore::new();
        sign_up_ada(&store);
        let err = store
            .sign_up(&SignUp {
                name: "Other".into(),
                email: "Ada@Example.com".into(),
                password: "Abc123!@".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn sign_up_weak_password_rejected() {
        let store = MemoryStore::new();
        let err = store
            .sign_up(&SignUp {
                name: "Ada".into(),
                email: "ada@example.com".into(),
                password: "abc12345".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn sign_in_wrong_password_rejected() {
        let store = MemoryStore::new();
        sign_up_ada(&store);
        let err = store
            .sign_in(&SignIn {
                email: "ada@example.com".into(),
                password: "Wrong123!@".into(),
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn sign_out_invalidates_session() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        store.sign_out(&session.token);
        assert!(store.session_user(&session.token).is_none());
        // Second sign-out is a no-op.
        store.sign_out(&session.token);
    }

    #[test]
    fn list_is_newest_first() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let owner = &session.user.id;
        store.create_plan(owner, &plan_input("first")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.create_plan(owner, &plan_input("second")).unwrap();
        let titles: Vec<_> = store
            .list_plans(owner)
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn plans_are_owner_scoped() {
        let store = MemoryStore::new();
        let ada = sign_up_ada(&store);
        let eve = store
            .sign_up(&SignUp {
                name: "Eve".into(),
                email: "eve@example.com".into(),
                password: "Abc123!@".into(),
            })
            .unwrap();

        let plan = store.create_plan(&ada.user.id, &plan_input("Algebra")).unwrap();
        assert_eq!(plan.owner_id, ada.user.id);

        // Another owner's plan reads as missing, never as forbidden.
        let err = store.get_plan(&eve.user.id, &plan.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = store
            .update_plan(
                &eve.user.id,
                &plan.id,
                &UpdatePlan {
                    status: Some(Status::Completed),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = store.delete_plan(&eve.user.id, &plan.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(store.list_plans(&eve.user.id).is_empty());
    }

    #[test]
    fn update_stamps_updated_at() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let plan = store
            .create_plan(&session.user.id, &plan_input("Algebra"))
            .unwrap();
        assert_eq!(plan.created_at, plan.updated_at);

        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = store
            .update_plan(
                &session.user.id,
                &plan.id,
                &UpdatePlan {
                    status: Some(Status::Completed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, Status::Completed);
        assert!(updated.updated_at > plan.updated_at);
        assert_eq!(updated.created_at, plan.created_at);
    }

    #[test]
    fn update_cannot_blank_the_title() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let plan = store
            .create_plan(&session.user.id, &plan_input("Algebra"))
            .unwrap();
        let err = store
            .update_plan(
                &session.user.id,
                &plan.id,
                &UpdatePlan {
                    title: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        // Nothing was applied.
        let unchanged = store.get_plan(&session.user.id, &plan.id).unwrap();
        assert_eq!(unchanged.title, "Algebra");
        assert_eq!(unchanged.updated_at, plan.updated_at);
    }

    #[test]
    fn create_rejects_invalid_input() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let err = store
            .create_plan(&session.user.id, &plan_input(""))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(store.list_plans(&session.user.id).is_empty());
    }

    #[test]
    fn delete_removes_the_plan() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let plan = store
            .create_plan(&session.user.id, &plan_input("Algebra"))
            .unwrap();
        store.delete_plan(&session.user.id, &plan.id).unwrap();
        assert!(store.list_plans(&session.user.id).is_empty());
        let err = store.delete_plan(&session.user.id, &plan.id).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn due_date_can_be_cleared() {
        let store = MemoryStore::new();
        let session = sign_up_ada(&store);
        let mut input = plan_input("Algebra");
        input.due_date = chrono::NaiveDate::from_ymd_opt(2025, 6, 1);
        let plan = store.create_plan(&session.user.id, &input).unwrap();
        assert!(plan.due_date.is_some());

        let updated = store
            .update_plan(
                &session.user.id,
                &plan.id,
                &UpdatePlan {
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.due_date, None);
    }
}
