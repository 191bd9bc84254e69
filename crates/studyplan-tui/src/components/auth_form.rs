use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use studyplan_core::user::{SignIn, SignUp};
use studyplan_core::validate::{validate_auth, AuthFields, ValidationErrors};

/// The validated payload a submitted form produces.
#[derive(Debug, Clone)]
pub enum AuthSubmit {
    SignIn(SignIn),
    SignUp(SignUp),
}

/// The sign-in / sign-up card. The field set is fixed per mode; toggling
/// the mode starts over with empty fields.
pub struct AuthForm {
    fields: AuthFields,
    focus: usize,
    errors: ValidationErrors,
}

impl AuthForm {
    pub fn sign_in() -> Self {
        Self {
            fields: AuthFields::empty_sign_in(),
            focus: 0,
            errors: ValidationErrors::new(),
        }
    }

    pub fn sign_up() -> Self {
        Self {
            fields: AuthFields::empty_sign_up(),
            focus: 0,
            errors: ValidationErrors::new(),
        }
    }

    pub fn is_sign_up(&self) -> bool {
        matches!(self.fields, AuthFields::SignUp { .. })
    }

    pub fn toggle_mode(&mut self) {
        *self = if self.is_sign_up() {
            Self::sign_in()
        } else {
            Self::sign_up()
        };
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn field_names(&self) -> &'static [&'static str] {
        match self.fields {
            AuthFields::SignIn { .. } => &["email", "password"],
            AuthFields::SignUp { .. } => &["name", "email", "password", "confirm_password"],
        }
    }

    fn field_labels(&self) -> &'static [&'static str] {
        match self.fields {
            AuthFields::SignIn { .. } => &["Email", "Password"],
            AuthFields::SignUp { .. } => &["Name", "Email", "Password", "Confirm Password"],
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_names().len()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.field_count() - 1) % self.field_count();
    }

    pub fn on_last_field(&self) -> bool {
        self.focus + 1 == self.field_count()
    }

    fn value_mut(&mut self, idx: usize) -> &mut String {
        match &mut self.fields {
            AuthFields::SignIn { email, password } => match idx {
                0 => email,
                _ => password,
            },
            AuthFields::SignUp {
                name,
                email,
                password,
                confirm_password,
            } => match idx {
                0 => name,
                1 => email,
                2 => password,
                _ => confirm_password,
            },
        }
    }

    fn value(&self, idx: usize) -> &str {
        match &self.fields {
            AuthFields::SignIn { email, password } => match idx {
                0 => email,
                _ => password,
            },
            AuthFields::SignUp {
                name,
                email,
                password,
                confirm_password,
            } => match idx {
                0 => name,
                1 => email,
                2 => password,
                _ => confirm_password,
            },
        }
    }

    fn is_secret(&self, idx: usize) -> bool {
        let name = self.field_names()[idx];
        name == "password" || name == "confirm_password"
    }

    pub fn input_char(&mut self, c: char) {
        let focus = self.focus;
        self.value_mut(focus).push(c);
    }

    pub fn backspace(&mut self) {
        let focus = self.focus;
        self.value_mut(focus).pop();
    }

    /// Validate and, on success, produce the payload for the backend.
    /// On failure the field errors are kept for inline rendering and
    /// nothing leaves the client.
    pub fn submit(&mut self) -> Option<AuthSubmit> {
        match validate_auth(&self.fields) {
            Ok(()) => {
                self.errors = ValidationErrors::new();
                Some(match &self.fields {
                    AuthFields::SignIn { email, password } => AuthSubmit::SignIn(SignIn {
                        email: email.clone(),
                        password: password.clone(),
                    }),
                    AuthFields::SignUp {
                        name,
                        email,
                        password,
                        ..
                    } => AuthSubmit::SignUp(SignUp {
                        name: name.clone(),
                        email: email.clone(),
                        password: password.clone(),
                    }),
                })
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (title, subtitle, toggle_hint) = if self.is_sign_up() {
            (
                "Create an account",
                "Sign up to start organizing your studies",
                "Ctrl+T: sign in instead",
            )
        } else {
            (
                "Welcome back",
                "Sign in to access your study plans",
                "Ctrl+T: create an account",
            )
        };

        let mut lines = vec![
            Line::from(Span::styled(subtitle, Style::default().fg(Color::DarkGray))),
            Line::raw(""),
        ];
        for idx in 0..self.field_count() {
            let focused = idx == self.focus;
            let marker = if focused { "> " } else { "  " };
            let shown = if self.is_secret(idx) {
                "\u{2022}".repeat(self.value(idx).chars().count())
            } else {
                self.value(idx).to_string()
            };
            let label_style = if focused {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{marker}{:<18}", self.field_labels()[idx]), label_style),
                Span::raw(shown),
                Span::styled(if focused { "_" } else { "" }, Style::default().fg(Color::Cyan)),
            ]));
            if let Some(message) = self.errors.message(self.field_names()[idx]) {
                lines.push(Line::from(Span::styled(
                    format!("  {message}"),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("Enter: submit   Tab: next field   {toggle_hint}   Esc: back"),
            Style::default().fg(Color::DarkGray),
        )));

        let card = Paragraph::new(lines).block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(card, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(form: &mut AuthForm, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn toggling_switches_the_field_set() {
        let mut form = AuthForm::sign_in();
        assert_eq!(form.field_count(), 2);
        form.toggle_mode();
        assert!(form.is_sign_up());
        assert_eq!(form.field_count(), 4);
        form.toggle_mode();
        assert_eq!(form.field_count(), 2);
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = AuthForm::sign_in();
        form.focus_next();
        assert!(form.on_last_field());
        form.focus_next();
        assert_eq!(form.focus(), 0);
        form.focus_prev();
        assert!(form.on_last_field());
    }

    #[test]
    fn valid_sign_in_submits_the_payload() {
        let mut form = AuthForm::sign_in();
        type_into(&mut form, "ada@example.com");
        form.focus_next();
        type_into(&mut form, "hunter2");
        match form.submit() {
            Some(AuthSubmit::SignIn(payload)) => {
                assert_eq!(payload.email, "ada@example.com");
                assert_eq!(payload.password, "hunter2");
            }
            other => panic!("expected a sign-in payload, got {other:?}"),
        }
        assert!(form.errors().is_empty());
    }

    #[test]
    fn mismatched_confirmation_blocks_submission() {
        let mut form = AuthForm::sign_up();
        type_into(&mut form, "Ada");
        form.focus_next();
        type_into(&mut form, "ada@example.com");
        form.focus_next();
        type_into(&mut form, "Abc123!@");
        form.focus_next();
        type_into(&mut form, "Abc123!#");
        assert!(form.submit().is_none());
        assert_eq!(
            form.errors().message("confirm_password"),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn backspace_edits_the_focused_field() {
        let mut form = AuthForm::sign_in();
        type_into(&mut form, "ada@example.comm");
        form.backspace();
        form.focus_next();
        type_into(&mut form, "hunter2");
        assert!(matches!(form.submit(), Some(AuthSubmit::SignIn(p)) if p.email == "ada@example.com"));
    }
}
