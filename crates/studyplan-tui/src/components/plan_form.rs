use chrono::NaiveDate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use studyplan_core::plan::{CreatePlan, Priority, CATEGORIES};
use studyplan_core::validate::{validate_plan, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanField {
    Title,
    Description,
    Category,
    DueDate,
    Priority,
}

const FIELDS: &[PlanField] = &[
    PlanField::Title,
    PlanField::Description,
    PlanField::Category,
    PlanField::DueDate,
    PlanField::Priority,
];

/// The plan creation form. Text fields take typed input; the category and
/// priority fields cycle with Left/Right through fixed options.
pub struct PlanForm {
    title: String,
    description: String,
    category_idx: Option<usize>,
    due_date: String,
    priority: Priority,
    focus: usize,
    errors: ValidationErrors,
}

impl PlanForm {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category_idx: None,
            due_date: String::new(),
            priority: Priority::Medium,
            focus: 0,
            errors: ValidationErrors::new(),
        }
    }

    pub fn focus(&self) -> PlanField {
        FIELDS[self.focus]
    }

    pub fn on_last_field(&self) -> bool {
        self.focus + 1 == FIELDS.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FIELDS.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn input_char(&mut self, c: char) {
        match self.focus() {
            PlanField::Title => self.title.push(c),
            PlanField::Description => self.description.push(c),
            PlanField::DueDate => self.due_date.push(c),
            // Category and priority are pickers, not text fields.
            PlanField::Category | PlanField::Priority => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus() {
            PlanField::Title => {
                self.title.pop();
            }
            PlanField::Description => {
                self.description.pop();
            }
            PlanField::DueDate => {
                self.due_date.pop();
            }
            PlanField::Category | PlanField::Priority => {}
        }
    }

    /// Left/Right on the picker fields.
    pub fn cycle(&mut self, forward: bool) {
        match self.focus() {
            PlanField::Category => {
                let len = CATEGORIES.len();
                self.category_idx = Some(match self.category_idx {
                    None => {
                        if forward {
                            0
                        } else {
                            len - 1
                        }
                    }
                    Some(idx) => {
                        if forward {
                            (idx + 1) % len
                        } else {
                            (idx + len - 1) % len
                        }
                    }
                });
            }
            PlanField::Priority => {
                let all = Priority::ALL;
                let idx = all.iter().position(|p| *p == self.priority).unwrap_or(1);
                let next = if forward {
                    (idx + 1) % all.len()
                } else {
                    (idx + all.len() - 1) % all.len()
                };
                self.priority = all[next];
            }
            _ => {}
        }
    }

    pub fn category(&self) -> &str {
        self.category_idx.map(|i| CATEGORIES[i]).unwrap_or("")
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Validate and, on success, produce the creation payload. Field errors
    /// are kept for inline rendering and nothing leaves the client until
    /// they are fixed.
    pub fn submit(&mut self) -> Option<CreatePlan> {
        let mut due_date = None;
        let mut date_error = false;
        let typed = self.due_date.trim();
        if !typed.is_empty() {
            match NaiveDate::parse_from_str(typed, "%Y-%m-%d") {
                Ok(date) => due_date = Some(date),
                Err(_) => date_error = true,
            }
        }

        let input = CreatePlan {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category().to_string(),
            due_date,
            priority: self.priority,
            // New plans always start out not started.
            status: Default::default(),
        };

        let mut errors = match validate_plan(&input) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if date_error {
            errors.push("due_date", "Due date must be YYYY-MM-DD");
        }
        if errors.is_empty() {
            self.errors = ValidationErrors::new();
            Some(input)
        } else {
            self.errors = errors;
            None
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(
                "Describe the study activity to track",
                Style::default().fg(Color::DarkGray),
            )),
            Line::raw(""),
        ];

        let rows: &[(&str, &str, String)] = &[
            ("title", "Title", self.title.clone()),
            ("description", "Description", self.description.clone()),
            (
                "category",
                "Category",
                if self.category().is_empty() {
                    "(←/→ to pick)".to_string()
                } else {
                    self.category().to_string()
                },
            ),
            (
                "due_date",
                "Due Date (optional)",
                if self.due_date.is_empty() {
                    "YYYY-MM-DD".to_string()
                } else {
                    self.due_date.clone()
                },
            ),
            (
                "priority",
                "Priority",
                format!("← {} →", self.priority.display_name()),
            ),
        ];

        for (idx, (field, label, value)) in rows.iter().enumerate() {
            let focused = idx == self.focus;
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{marker}{label:<22}"), label_style),
                Span::raw(value.clone()),
            ]));
            if let Some(message) = self.errors.message(field) {
                lines.push(Line::from(Span::styled(
                    format!("  {message}"),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Enter: create   Tab: next field   Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let card = Paragraph::new(lines).block(
            Block::default()
                .title(" Create New Study Plan ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(card, area);
    }
}

impl Default for PlanForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyplan_core::plan::Status;

    fn type_into(form: &mut PlanForm, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn empty_form_reports_required_fields() {
        let mut form = PlanForm::new();
        assert!(form.submit().is_none());
        assert_eq!(form.errors().message("title"), Some("Title is required"));
        assert_eq!(form.errors().message("category"), Some("Category is required"));
    }

    #[test]
    fn filled_form_produces_the_payload() {
        let mut form = PlanForm::new();
        type_into(&mut form, "Algebra revision");
        form.focus_next();
        type_into(&mut form, "Chapters 3 and 4");
        form.focus_next();
        form.cycle(true); // Mathematics
        form.focus_next();
        type_into(&mut form, "2025-06-01");
        form.focus_next();
        form.cycle(true); // medium -> high

        let input = form.submit().expect("form should validate");
        assert_eq!(input.title, "Algebra revision");
        assert_eq!(input.category, "Mathematics");
        assert_eq!(input.due_date, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(input.priority, Priority::High);
        assert_eq!(input.status, Status::NotStarted);
        assert!(form.errors().is_empty());
    }

    #[test]
    fn malformed_due_date_is_an_inline_error() {
        let mut form = PlanForm::new();
        type_into(&mut form, "Algebra");
        form.focus_next();
        form.focus_next();
        form.cycle(true);
        form.focus_next();
        type_into(&mut form, "tomorrow");
        assert!(form.submit().is_none());
        assert_eq!(
            form.errors().message("due_date"),
            Some("Due date must be YYYY-MM-DD")
        );

        // Clearing the date fixes it; the date stays optional.
        for _ in 0.."tomorrow".len() {
            form.backspace();
        }
        let input = form.submit().expect("empty due date is allowed");
        assert_eq!(input.due_date, None);
    }

    #[test]
    fn priority_cycles_through_all_levels() {
        let mut form = PlanForm::new();
        // Move to the priority field.
        for _ in 0..4 {
            form.focus_next();
        }
        assert_eq!(form.priority(), Priority::Medium);
        form.cycle(true);
        assert_eq!(form.priority(), Priority::High);
        form.cycle(true);
        assert_eq!(form.priority(), Priority::Low);
        form.cycle(false);
        assert_eq!(form.priority(), Priority::High);
    }

    #[test]
    fn typing_into_pickers_is_ignored() {
        let mut form = PlanForm::new();
        form.focus_next();
        form.focus_next();
        assert_eq!(form.focus(), PlanField::Category);
        type_into(&mut form, "abc");
        assert_eq!(form.category(), "");
    }
}
