//! Form validation: ordered per-field rules with the first failing rule's
//! message kept per field. Validation runs before any remote call; the
//! backend re-checks on its side and clients must not be trusted with it.

use std::error::Error;
use std::fmt;

use crate::plan::CreatePlan;
use crate::user::{SignIn, SignUp};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const PASSWORD_MIN: usize = 8;

/// Field-level validation failures, in form order. Each field carries at
/// most one message: the first rule that failed for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        if self.message(field).is_none() {
            self.errors.push((field, message.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The message for a field, if that field failed.
    pub fn message(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// The auth form's field set, fixed per mode at compile time. Sign-up adds
/// the display name and the confirmation field; the confirmation never
/// leaves the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFields {
    SignIn {
        email: String,
        password: String,
    },
    SignUp {
        name: String,
        email: String,
        password: String,
        confirm_password: String,
    },
}

impl AuthFields {
    pub fn empty_sign_in() -> Self {
        AuthFields::SignIn {
            email: String::new(),
            password: String::new(),
        }
    }

    pub fn empty_sign_up() -> Self {
        AuthFields::SignUp {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
        }
    }
}

pub fn validate_plan(input: &CreatePlan) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if input.title.is_empty() {
        errors.push("title", "Title is required");
    } else if input.title.chars().count() > TITLE_MAX {
        errors.push("title", "Title must be less than 100 characters");
    }
    if input.description.chars().count() > DESCRIPTION_MAX {
        errors.push("description", "Description must be less than 500 characters");
    }
    if input.category.is_empty() {
        errors.push("category", "Category is required");
    }
    errors.into_result()
}

pub fn validate_auth(fields: &AuthFields) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match fields {
        AuthFields::SignIn { email, password } => {
            check_email(&mut errors, email);
            if password.is_empty() {
                errors.push("password", "Password is required");
            }
        }
        AuthFields::SignUp {
            name,
            email,
            password,
            confirm_password,
        } => {
            if name.chars().count() < 2 {
                errors.push("name", "Name must be at least 2 characters");
            }
            check_email(&mut errors, email);
            if let Some(message) = password_error(password) {
                errors.push("password", message);
            }
            if confirm_password.is_empty() {
                errors.push("confirm_password", "Please confirm your password");
            } else if confirm_password != password {
                errors.push("confirm_password", "Passwords do not match");
            }
        }
    }
    errors.into_result()
}

/// The sign-up password strength rule: length plus all four character
/// classes, checked in order. Returns the first failing rule's message.
pub fn password_error(password: &str) -> Option<&'static str> {
    if password.chars().count() < PASSWORD_MIN {
        return Some("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must contain at least one number");
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        return Some("Password must contain at least one special character");
    }
    None
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !is_valid_email(email) {
        errors.push("email", "Please enter a valid email address");
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
