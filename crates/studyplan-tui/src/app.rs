use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use studyplan_core::plan::{Status, StudyPlan};
use studyplan_service::{BlockingHttpService, ServiceError};

use crate::auth::AuthContext;
use crate::components::auth_form::{AuthForm, AuthSubmit};
use crate::components::plan_card::render_card;
use crate::components::plan_form::PlanForm;
use crate::components::plan_list::PlanList;

/// Which screen the app is showing
pub enum Mode {
    /// Marketing/landing screen, the only one with nothing behind it
    Landing,
    /// Sign-in / sign-up card
    Auth { form: AuthForm },
    /// Summary tiles plus the recent/high-priority tabs
    Dashboard { tab: DashboardTab },
    /// Full plan list with search and filters
    Plans,
    /// Typing into the search box on the plans screen
    Search { input: String },
    /// Creation form over the plans screen
    NewPlan { form: PlanForm },
    /// One plan, full description
    PlanDetail { plan: StudyPlan },
    /// Confirm delete, the only irreversible operation
    ConfirmDelete { plan: StudyPlan },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Recent,
    HighPriority,
}

pub struct App {
    service: BlockingHttpService,
    auth: AuthContext,
    plans: PlanList,
    mode: Mode,
    status_message: Option<String>,
}

impl App {
    /// Resolve the existing session (if any) before the first frame, then
    /// start on the landing screen.
    pub fn new(service: BlockingHttpService) -> Self {
        let mut auth = AuthContext::new();
        let mut status_message = None;
        match service.current_user() {
            Ok(user) => auth.resolve(user),
            Err(e) => {
                auth.resolve(None);
                status_message = Some(format!("Error: {e}"));
            }
        }
        Self {
            service,
            auth,
            plans: PlanList::new(),
            mode: Mode::Landing,
            status_message,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn plan_list(&self) -> &PlanList {
        &self.plans
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(
            self.mode,
            Mode::Auth { .. } | Mode::Search { .. } | Mode::NewPlan { .. }
        )
    }

    /// Surface a remote failure. A 401 means the session died out from
    /// under us: drop to the auth screen. Returns true in that case.
    fn remote_error(&mut self, e: ServiceError) -> bool {
        if matches!(e, ServiceError::Unauthorized(_)) {
            self.auth.signed_out();
            self.status_message = Some("Session expired, please sign in again".into());
            self.mode = Mode::Auth {
                form: AuthForm::sign_in(),
            };
            true
        } else {
            self.status_message = Some(format!("Error: {e}"));
            false
        }
    }

    /// Refetch the plan list. On failure the previous list is retained and
    /// the error is surfaced. Returns false when the session expired (the
    /// mode has already been switched).
    fn reload(&mut self) -> bool {
        let seq = self.plans.begin_load();
        match self.service.list_plans() {
            Ok(plans) => {
                self.plans.apply_load(seq, plans);
                true
            }
            Err(e) => !self.remote_error(e),
        }
    }

    fn goto_dashboard(&mut self) {
        if self.auth.is_loading() {
            // Never redirect before the initial session check resolves.
            self.mode = Mode::Landing;
            return;
        }
        if self.auth.user().is_none() {
            self.mode = Mode::Auth {
                form: AuthForm::sign_in(),
            };
            return;
        }
        if self.reload() {
            self.mode = Mode::Dashboard {
                tab: DashboardTab::Recent,
            };
        }
    }

    fn goto_plans(&mut self) {
        if self.auth.is_loading() {
            self.mode = Mode::Landing;
            return;
        }
        if self.auth.user().is_none() {
            self.mode = Mode::Auth {
                form: AuthForm::sign_in(),
            };
            return;
        }
        if self.reload() {
            self.mode = Mode::Plans;
        }
    }

    fn sign_out(&mut self) {
        match self.service.sign_out() {
            Ok(()) => {
                self.auth.signed_out();
                self.status_message = Some("Signed out".into());
                self.mode = Mode::Landing;
            }
            Err(e) => {
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        let mode = std::mem::replace(&mut self.mode, Mode::Landing);
        match mode {
            Mode::Landing => self.handle_landing(key),
            Mode::Auth { form } => self.handle_auth(key, form),
            Mode::Dashboard { tab } => self.handle_dashboard(key, tab),
            Mode::Plans => self.handle_plans(key),
            Mode::Search { input } => self.handle_search(key, input),
            Mode::NewPlan { form } => self.handle_new_plan(key, form),
            Mode::PlanDetail { plan } => self.handle_plan_detail(key, plan),
            Mode::ConfirmDelete { plan } => self.handle_confirm_delete(key, plan),
        }
    }

    fn handle_landing(&mut self, key: KeyEvent) {
        self.mode = Mode::Landing;
        match key.code {
            KeyCode::Char('d') | KeyCode::Enter => self.goto_dashboard(),
            KeyCode::Char('p') => self.goto_plans(),
            KeyCode::Char('s') => {
                if self.auth.user().is_none() && !self.auth.is_loading() {
                    self.mode = Mode::Auth {
                        form: AuthForm::sign_in(),
                    };
                }
            }
            KeyCode::Char('o') => {
                if self.auth.user().is_some() {
                    self.sign_out();
                }
            }
            _ => {}
        }
    }

    fn handle_auth(&mut self, key: KeyEvent, mut form: AuthForm) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('t') {
                form.toggle_mode();
            }
            self.mode = Mode::Auth { form };
            return;
        }
        match key.code {
            KeyCode::Esc => self.mode = Mode::Landing,
            KeyCode::Tab | KeyCode::Down => {
                form.focus_next();
                self.mode = Mode::Auth { form };
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus_prev();
                self.mode = Mode::Auth { form };
            }
            KeyCode::Backspace => {
                form.backspace();
                self.mode = Mode::Auth { form };
            }
            KeyCode::Enter => {
                if !form.on_last_field() {
                    form.focus_next();
                    self.mode = Mode::Auth { form };
                    return;
                }
                match form.submit() {
                    // Field errors render inline; nothing was sent.
                    None => self.mode = Mode::Auth { form },
                    Some(AuthSubmit::SignIn(payload)) => {
                        match self.service.sign_in(&payload) {
                            Ok(session) => {
                                self.auth.signed_in(session.user);
                                self.status_message = Some("Signed in".into());
                                self.goto_dashboard();
                            }
                            Err(e) => {
                                self.status_message = Some(format!("Error: {e}"));
                                self.mode = Mode::Auth { form };
                            }
                        }
                    }
                    Some(AuthSubmit::SignUp(payload)) => {
                        match self.service.sign_up(&payload) {
                            Ok(session) => {
                                self.auth.signed_in(session.user);
                                self.status_message = Some("Account created".into());
                                self.goto_dashboard();
                            }
                            Err(e) => {
                                self.status_message = Some(format!("Error: {e}"));
                                self.mode = Mode::Auth { form };
                            }
                        }
                    }
                }
            }
            KeyCode::Char(c) => {
                form.input_char(c);
                self.mode = Mode::Auth { form };
            }
            _ => self.mode = Mode::Auth { form },
        }
    }

    fn handle_dashboard(&mut self, key: KeyEvent, tab: DashboardTab) {
        self.mode = Mode::Dashboard { tab };
        match key.code {
            KeyCode::Tab | KeyCode::Char('t') => {
                let next = match tab {
                    DashboardTab::Recent => DashboardTab::HighPriority,
                    DashboardTab::HighPriority => DashboardTab::Recent,
                };
                self.mode = Mode::Dashboard { tab: next };
            }
            KeyCode::Char('p') => self.goto_plans(),
            KeyCode::Char('r') => {
                if self.reload() {
                    self.mode = Mode::Dashboard { tab };
                }
            }
            KeyCode::Char('o') => self.sign_out(),
            KeyCode::Esc => self.mode = Mode::Landing,
            _ => {}
        }
    }

    fn handle_plans(&mut self, key: KeyEvent) {
        self.mode = Mode::Plans;
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') => {
                self.mode = Mode::Dashboard {
                    tab: DashboardTab::Recent,
                };
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Search {
                    input: self.plans.search().to_string(),
                };
            }
            KeyCode::Char('s') => self.plans.cycle_status_filter(),
            KeyCode::Char('f') => self.plans.cycle_priority_filter(),
            KeyCode::Char('n') => {
                self.mode = Mode::NewPlan {
                    form: PlanForm::new(),
                };
            }
            KeyCode::Char('r') => {
                self.reload();
            }
            KeyCode::Char('o') => self.sign_out(),
            KeyCode::Enter => {
                if let Some(plan) = self.plans.selected_plan().cloned() {
                    self.mode = Mode::PlanDetail { plan };
                }
            }
            KeyCode::Char('m') => {
                if let Some(plan) = self.plans.selected_plan().cloned() {
                    self.toggle_status(&plan);
                }
            }
            KeyCode::Char('d') => {
                if let Some(plan) = self.plans.selected_plan().cloned() {
                    self.mode = Mode::ConfirmDelete { plan };
                }
            }
            _ => self.plans.handle_key(key),
        }
    }

    /// Mark complete, or reopen a completed plan. The displayed status only
    /// changes after the backend confirms and the list is refetched.
    fn toggle_status(&mut self, plan: &StudyPlan) {
        let next = if plan.status == Status::Completed {
            Status::InProgress
        } else {
            Status::Completed
        };
        match self.service.update_status(&plan.id, next) {
            Ok(updated) => {
                self.status_message =
                    Some(format!("Status updated to {}", updated.status.display_name()));
                self.reload();
            }
            Err(e) => {
                self.remote_error(e);
            }
        }
    }

    fn handle_search(&mut self, key: KeyEvent, mut input: String) {
        match key.code {
            KeyCode::Enter => self.mode = Mode::Plans,
            KeyCode::Esc => {
                self.plans.set_search(String::new());
                self.mode = Mode::Plans;
            }
            KeyCode::Backspace => {
                input.pop();
                // The visible list tracks every keystroke, no remote call.
                self.plans.set_search(input.clone());
                self.mode = Mode::Search { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.plans.set_search(input.clone());
                self.mode = Mode::Search { input };
            }
            _ => self.mode = Mode::Search { input },
        }
    }

    fn handle_new_plan(&mut self, key: KeyEvent, mut form: PlanForm) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Plans,
            KeyCode::Tab | KeyCode::Down => {
                form.focus_next();
                self.mode = Mode::NewPlan { form };
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.focus_prev();
                self.mode = Mode::NewPlan { form };
            }
            KeyCode::Left => {
                form.cycle(false);
                self.mode = Mode::NewPlan { form };
            }
            KeyCode::Right => {
                form.cycle(true);
                self.mode = Mode::NewPlan { form };
            }
            KeyCode::Backspace => {
                form.backspace();
                self.mode = Mode::NewPlan { form };
            }
            KeyCode::Enter => {
                if !form.on_last_field() {
                    form.focus_next();
                    self.mode = Mode::NewPlan { form };
                    return;
                }
                match form.submit() {
                    None => self.mode = Mode::NewPlan { form },
                    Some(input) => match self.service.create_plan(&input) {
                        Ok(_) => {
                            self.status_message = Some("Study plan created".into());
                            if self.reload() {
                                self.mode = Mode::Plans;
                            }
                        }
                        Err(e) => {
                            if !self.remote_error(e) {
                                self.mode = Mode::NewPlan { form };
                            }
                        }
                    },
                }
            }
            KeyCode::Char(c) => {
                form.input_char(c);
                self.mode = Mode::NewPlan { form };
            }
            _ => self.mode = Mode::NewPlan { form },
        }
    }

    fn handle_plan_detail(&mut self, key: KeyEvent, plan: StudyPlan) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Plans,
            KeyCode::Char('m') => {
                let next = if plan.status == Status::Completed {
                    Status::InProgress
                } else {
                    Status::Completed
                };
                match self.service.update_status(&plan.id, next) {
                    Ok(updated) => {
                        self.status_message =
                            Some(format!("Status updated to {}", updated.status.display_name()));
                        if self.reload() {
                            self.mode = Mode::PlanDetail { plan: updated };
                        }
                    }
                    Err(e) => {
                        if !self.remote_error(e) {
                            self.mode = Mode::PlanDetail { plan };
                        }
                    }
                }
            }
            KeyCode::Char('d') => self.mode = Mode::ConfirmDelete { plan },
            _ => self.mode = Mode::PlanDetail { plan },
        }
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, plan: StudyPlan) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.service.delete_plan(&plan.id) {
                    Ok(()) => {
                        self.status_message = Some(format!("Deleted: {}", plan.title));
                        if self.reload() {
                            self.mode = Mode::Plans;
                        }
                    }
                    Err(e) => {
                        if !self.remote_error(e) {
                            self.mode = Mode::Plans;
                        }
                    }
                }
            }
            _ => self.mode = Mode::Plans,
        }
    }

    // -- Rendering --

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_body(frame, chunks[1]);
        self.render_status_bar(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let screen = match self.mode {
            Mode::Landing => "Home",
            Mode::Auth { .. } => "Sign In",
            Mode::Dashboard { .. } => "Dashboard",
            Mode::Plans | Mode::Search { .. } | Mode::NewPlan { .. } => "Plans",
            Mode::PlanDetail { .. } | Mode::ConfirmDelete { .. } => "Plans",
        };
        let who = match self.auth.user() {
            Some(user) => user.email.clone(),
            None => "not signed in".to_string(),
        };
        let header = Line::from(vec![
            Span::styled(" StudyPlan ", Style::default().fg(Color::Cyan).bold()),
            Span::styled(format!("· {screen} "), Style::default().fg(Color::Gray)),
            Span::styled(format!("· {who}"), Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        match &self.mode {
            Mode::Landing => self.render_landing(frame, area),
            Mode::Auth { form } => {
                let popup = centered_rect(54, 16, area);
                frame.render_widget(Clear, popup);
                form.render(frame, popup);
            }
            Mode::Dashboard { tab } => self.render_dashboard(frame, area, *tab),
            Mode::Plans | Mode::Search { .. } => self.render_plans(frame, area),
            Mode::NewPlan { form } => {
                self.render_plans(frame, area);
                let popup = centered_rect(64, 18, area);
                frame.render_widget(Clear, popup);
                form.render(frame, popup);
            }
            Mode::PlanDetail { plan } => {
                let popup = centered_rect(64, 14, area);
                frame.render_widget(Clear, popup);
                render_card(frame, popup, plan, self.plans.recently_updated(&plan.id));
            }
            Mode::ConfirmDelete { plan } => {
                self.render_plans(frame, area);
                let popup = centered_rect(50, 5, area);
                frame.render_widget(Clear, popup);
                let text = Paragraph::new(vec![
                    Line::raw(format!("Delete \"{}\"?", plan.title)),
                    Line::from(Span::styled(
                        "This cannot be undone.  y: delete   any other key: cancel",
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .title(" Confirm Delete ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                );
                frame.render_widget(text, popup);
            }
        }
    }

    fn render_landing(&self, frame: &mut Frame, area: Rect) {
        let signed_in = self.auth.user().is_some();
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                "StudyPlan",
                Style::default().fg(Color::Cyan).bold(),
            )),
            Line::raw(""),
            Line::raw("Organize your study activities, track progress,"),
            Line::raw("and stay on top of deadlines."),
            Line::raw(""),
        ];
        if signed_in {
            lines.push(Line::from(Span::styled(
                "d: dashboard   p: plans   o: sign out   q: quit",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "s: sign in   d: dashboard   p: plans   q: quit",
                Style::default().fg(Color::DarkGray),
            )));
        }
        let body = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(
                Style::default().fg(Color::DarkGray),
            ));
        frame.render_widget(body, area);
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect, tab: DashboardTab) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        let name = self
            .auth
            .user()
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "there".into());
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" Welcome back, {name}"),
                Style::default().fg(Color::Gray),
            ))),
            chunks[0],
        );

        let counts = self.plans.counts();
        let tiles = [
            ("Total Plans", counts.total, Color::Cyan),
            ("Completed", counts.completed, Color::Green),
            ("In Progress", counts.in_progress, Color::Blue),
            ("Not Started", counts.not_started, Color::DarkGray),
        ];
        let tile_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(chunks[1]);
        for ((label, count, color), chunk) in tiles.iter().zip(tile_chunks.iter()) {
            let tile = Paragraph::new(Line::from(vec![
                Span::styled(format!("{count} "), Style::default().fg(*color).bold()),
                Span::styled(*label, Style::default().fg(Color::Gray)),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            frame.render_widget(tile, *chunk);
        }

        let tab_line = match tab {
            DashboardTab::Recent => Line::from(vec![
                Span::styled(" [Recent Plans] ", Style::default().fg(Color::Cyan).bold()),
                Span::styled(" High Priority ", Style::default().fg(Color::DarkGray)),
                Span::styled("  (t: switch, p: plans, r: refresh)", Style::default().fg(Color::DarkGray)),
            ]),
            DashboardTab::HighPriority => Line::from(vec![
                Span::styled(" Recent Plans ", Style::default().fg(Color::DarkGray)),
                Span::styled(" [High Priority] ", Style::default().fg(Color::Cyan).bold()),
                Span::styled("  (t: switch, p: plans, r: refresh)", Style::default().fg(Color::DarkGray)),
            ]),
        };
        frame.render_widget(Paragraph::new(tab_line), chunks[2]);

        let shown = match tab {
            DashboardTab::Recent => self.plans.recent(3),
            DashboardTab::HighPriority => self.plans.high_priority(3),
        };
        if shown.is_empty() {
            let empty = match tab {
                DashboardTab::Recent => "No recent plans found. Press p to create your first plan.",
                DashboardTab::HighPriority => "No high priority plans found.",
            };
            frame.render_widget(
                Paragraph::new(empty)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                chunks[3],
            );
            return;
        }
        let card_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); 3])
            .split(chunks[3]);
        for (plan, chunk) in shown.iter().zip(card_chunks.iter()) {
            render_card(frame, *chunk, plan, self.plans.recently_updated(&plan.id));
        }
    }

    fn render_plans(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let searching = matches!(self.mode, Mode::Search { .. });
        let search_text = if self.plans.search().is_empty() && !searching {
            "(press /)".to_string()
        } else if searching {
            format!("{}_", self.plans.search())
        } else {
            self.plans.search().to_string()
        };
        let status_text = self
            .plans
            .status_filter()
            .map(|s| s.display_name())
            .unwrap_or("All");
        let priority_text = self
            .plans
            .priority_filter()
            .map(|p| p.display_name())
            .unwrap_or("All");
        let search_style = if searching {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let filter_bar = Line::from(vec![
            Span::styled(" Search: ", Style::default().fg(Color::DarkGray)),
            Span::styled(search_text, search_style),
            Span::styled("   Status: ", Style::default().fg(Color::DarkGray)),
            Span::raw(status_text),
            Span::styled("   Priority: ", Style::default().fg(Color::DarkGray)),
            Span::raw(priority_text),
            Span::styled(
                "   (n: new  m: complete/reopen  d: delete  s/f: filters)",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(filter_bar), chunks[0]);

        self.plans.render(frame, chunks[1]);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.status_message {
            Some(message) => Line::from(Span::styled(
                format!(" {message}"),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(Span::styled(
                " q: quit   Esc: back",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
