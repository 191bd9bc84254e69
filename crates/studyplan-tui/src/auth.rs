use studyplan_core::user::User;

/// Who is signed in, as far as this process knows.
#[derive(Debug, Clone)]
pub enum AuthState {
    /// The initial session check against the backend has not resolved yet.
    Loading,
    Authenticated(User),
    Anonymous,
}

/// The single source of truth for the current session, owned by the app and
/// passed down by reference. Screens that need a user consult it and
/// redirect to the auth screen only once `Loading` has resolved.
#[derive(Debug, Clone)]
pub struct AuthContext {
    state: AuthState,
}

impl AuthContext {
    pub fn new() -> Self {
        Self {
            state: AuthState::Loading,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AuthState::Loading)
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Resolve the initial backend session check.
    pub fn resolve(&mut self, user: Option<User>) {
        self.state = match user {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Anonymous,
        };
    }

    /// A sign-in or sign-up succeeded: the session is replaced wholesale.
    pub fn signed_in(&mut self, user: User) {
        self.state = AuthState::Authenticated(user);
    }

    /// Sign-out, or the backend reported the session expired.
    pub fn signed_out(&mut self) {
        self.state = AuthState::Anonymous;
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn starts_loading() {
        let ctx = AuthContext::new();
        assert!(ctx.is_loading());
        assert!(ctx.user().is_none());
    }

    #[test]
    fn resolves_to_authenticated() {
        let mut ctx = AuthContext::new();
        ctx.resolve(Some(user()));
        assert!(!ctx.is_loading());
        assert_eq!(ctx.user().unwrap().id, "u1");
    }

    #[test]
    fn resolves_to_anonymous() {
        let mut ctx = AuthContext::new();
        ctx.resolve(None);
        assert!(matches!(ctx.state(), AuthState::Anonymous));
    }

    #[test]
    fn sign_in_then_out() {
        let mut ctx = AuthContext::new();
        ctx.resolve(None);
        ctx.signed_in(user());
        assert!(ctx.user().is_some());
        ctx.signed_out();
        assert!(ctx.user().is_none());
        assert!(!ctx.is_loading());
    }
}
