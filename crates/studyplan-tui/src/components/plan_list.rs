use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use studyplan_core::plan::{Priority, Status, StudyPlan};

use super::plan_card::{priority_style, status_style};

/// Per-status totals for the dashboard tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
}

/// Client-side state for the signed-in user's plans.
///
/// Holds the authoritative list exactly as last fetched (the backend orders
/// it newest-created-first) and derives the visible subset from the search
/// text plus the status/priority selections. The visible list is recomputed
/// on demand, never stored.
///
/// Refreshes are tagged with a monotonically increasing sequence number.
/// A response is applied only if it is newer than the last applied one, so
/// when two refreshes race the one issued last wins regardless of arrival
/// order, and a failed refresh leaves the previous list untouched.
pub struct PlanList {
    plans: Vec<StudyPlan>,
    search: String,
    status_filter: Option<Status>,
    priority_filter: Option<Priority>,
    list_state: ListState,
    issued_seq: u64,
    applied_seq: u64,
    recent_updates: RecentUpdates,
}

impl PlanList {
    pub fn new() -> Self {
        Self {
            plans: Vec::new(),
            search: String::new(),
            status_filter: None,
            priority_filter: None,
            list_state: ListState::default(),
            issued_seq: 0,
            applied_seq: 0,
            recent_updates: RecentUpdates::default(),
        }
    }

    // -- Refresh cycle --

    /// Start a refresh: returns the sequence number to pass to
    /// [`apply_load`](Self::apply_load) with the fetched list.
    pub fn begin_load(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    /// Apply a fetched list. Returns false (and changes nothing) when a
    /// newer load has already been applied.
    pub fn apply_load(&mut self, seq: u64, plans: Vec<StudyPlan>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        let selected_id = self.selected_plan().map(|p| p.id.clone());
        self.recent_updates.observe(&plans);
        self.plans = plans;
        match selected_id {
            Some(id) => {
                if !self.select_plan_by_id(&id) {
                    self.clamp_selection();
                }
            }
            None => self.clamp_selection(),
        }
        true
    }

    // -- Filters --

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: String) {
        self.search = search;
        self.clamp_selection();
    }

    pub fn status_filter(&self) -> Option<Status> {
        self.status_filter
    }

    pub fn priority_filter(&self) -> Option<Priority> {
        self.priority_filter
    }

    /// all -> not-started -> in-progress -> completed -> all
    pub fn cycle_status_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(Status::NotStarted),
            Some(Status::NotStarted) => Some(Status::InProgress),
            Some(Status::InProgress) => Some(Status::Completed),
            Some(Status::Completed) => None,
        };
        self.clamp_selection();
    }

    /// all -> low -> medium -> high -> all
    pub fn cycle_priority_filter(&mut self) {
        self.priority_filter = match self.priority_filter {
            None => Some(Priority::Low),
            Some(Priority::Low) => Some(Priority::Medium),
            Some(Priority::Medium) => Some(Priority::High),
            Some(Priority::High) => None,
        };
        self.clamp_selection();
    }

    fn matches(&self, plan: &StudyPlan) -> bool {
        let text_ok = if self.search.is_empty() {
            true
        } else {
            let needle = self.search.to_lowercase();
            plan.title.to_lowercase().contains(&needle)
                || plan.description.to_lowercase().contains(&needle)
        };
        let status_ok = self.status_filter.map_or(true, |s| plan.status == s);
        let priority_ok = self.priority_filter.map_or(true, |p| plan.priority == p);
        text_ok && status_ok && priority_ok
    }

    /// The filtered subset in fetch order. All three predicates conjoin.
    pub fn visible(&self) -> Vec<&StudyPlan> {
        self.plans.iter().filter(|p| self.matches(p)).collect()
    }

    pub fn plans(&self) -> &[StudyPlan] {
        &self.plans
    }

    // -- Dashboard views --

    pub fn counts(&self) -> StatusCounts {
        StatusCounts {
            total: self.plans.len(),
            completed: self.count_status(Status::Completed),
            in_progress: self.count_status(Status::InProgress),
            not_started: self.count_status(Status::NotStarted),
        }
    }

    fn count_status(&self, status: Status) -> usize {
        self.plans.iter().filter(|p| p.status == status).count()
    }

    /// Up to `n` most recently created plans. Ties keep fetch order, which
    /// the backend already sorts newest first.
    pub fn recent(&self, n: usize) -> Vec<&StudyPlan> {
        let mut plans: Vec<&StudyPlan> = self.plans.iter().collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        plans.truncate(n);
        plans
    }

    /// Up to `n` high-priority plans that are not finished, in fetch order.
    pub fn high_priority(&self, n: usize) -> Vec<&StudyPlan> {
        self.plans
            .iter()
            .filter(|p| p.priority == Priority::High && p.status != Status::Completed)
            .take(n)
            .collect()
    }

    /// True when the plan's backend timestamp advanced on the latest
    /// refresh; drives a transient highlight in the list and cards.
    pub fn recently_updated(&self, id: &str) -> bool {
        self.recent_updates.is_recent(id)
    }

    // -- Selection --

    pub fn selected_plan(&self) -> Option<&StudyPlan> {
        let idx = self.list_state.selected()?;
        self.visible().get(idx).copied()
    }

    /// Select the given plan if it is visible. Returns true on success.
    pub fn select_plan_by_id(&mut self, id: &str) -> bool {
        let idx = self.visible().iter().position(|p| p.id == id);
        match idx {
            Some(idx) => {
                self.list_state.select(Some(idx));
                true
            }
            None => false,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            let idx = self.list_state.selected().unwrap_or(0).min(len - 1);
            self.list_state.select(Some(idx));
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let len = self.visible().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let current = self.list_state.selected().unwrap_or(0);
                if current + 1 < len {
                    self.list_state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let current = self.list_state.selected().unwrap_or(0);
                if current > 0 {
                    self.list_state.select(Some(current - 1));
                }
            }
            KeyCode::Char('g') => {
                if len > 0 {
                    self.list_state.select(Some(0));
                }
            }
            KeyCode::Char('G') => {
                if len > 0 {
                    self.list_state.select(Some(len - 1));
                }
            }
            _ => {}
        }
    }

    // -- Rendering --

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let visible = self.visible();
        let title = format!(" Plans ({}/{}) ", visible.len(), self.plans.len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let items: Vec<ListItem> = visible
            .iter()
            .map(|plan| {
                let title_style = if self.recently_updated(&plan.id) {
                    Style::default().fg(Color::Yellow).italic()
                } else {
                    Style::default()
                };
                let mut spans = vec![
                    Span::styled(
                        format!("{:<2} ", plan.priority.symbol()),
                        priority_style(plan.priority),
                    ),
                    Span::styled(plan.title.clone(), title_style),
                    Span::raw("  "),
                    Span::styled(plan.status.display_name(), status_style(plan.status)),
                ];
                if let Some(due) = plan.due_date {
                    spans.push(Span::styled(
                        format!("  due {due}"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }
}

impl Default for PlanList {
    fn default() -> Self {
        Self::new()
    }
}

/// Remembers each plan's `updated_at` from the previous refresh and flags
/// the ones whose timestamp advanced. The remembered map is rebuilt in the
/// same pass that diffs it, so the flags only survive until the next
/// refresh, and back-to-back updates can mask one highlight window.
#[derive(Default)]
struct RecentUpdates {
    prev: HashMap<String, DateTime<Utc>>,
    flagged: HashSet<String>,
}

impl RecentUpdates {
    fn observe(&mut self, plans: &[StudyPlan]) {
        let mut flagged = HashSet::new();
        let mut prev = HashMap::with_capacity(plans.len());
        for plan in plans {
            if let Some(&seen) = self.prev.get(&plan.id) {
                if plan.updated_at > seen {
                    flagged.insert(plan.id.clone());
                }
            }
            prev.insert(plan.id.clone(), plan.updated_at);
        }
        self.prev = prev;
        self.flagged = flagged;
    }

    fn is_recent(&self, id: &str) -> bool {
        self.flagged.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_plan(id: &str, title: &str, status: Status, priority: Priority) -> StudyPlan {
        let now = Utc::now();
        StudyPlan {
            id: id.to_string(),
            owner_id: "u1".to_string(),
            title: title.to_string(),
            description: String::new(),
            category: "Mathematics".to_string(),
            due_date: None,
            priority,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn loaded(plans: Vec<StudyPlan>) -> PlanList {
        let mut list = PlanList::new();
        let seq = list.begin_load();
        assert!(list.apply_load(seq, plans));
        list
    }

    fn titles(plans: &[&StudyPlan]) -> Vec<String> {
        plans.iter().map(|p| p.title.clone()).collect()
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let mut algebra = make_plan("1", "Algebra", Status::NotStarted, Priority::Medium);
        algebra.description = "quadratic equations".into();
        let biology = make_plan("2", "Biology", Status::NotStarted, Priority::Medium);
        let mut list = loaded(vec![algebra, biology]);

        list.set_search("alg".into());
        assert_eq!(titles(&list.visible()), vec!["Algebra"]);

        list.set_search("QUADRATIC".into());
        assert_eq!(titles(&list.visible()), vec!["Algebra"]);

        list.set_search(String::new());
        assert_eq!(list.visible().len(), 2);
    }

    #[test]
    fn all_three_predicates_conjoin() {
        let list = {
            let mut list = loaded(vec![
                make_plan("1", "Botany", Status::NotStarted, Priority::High),
                make_plan("2", "Analysis", Status::Completed, Priority::Low),
                make_plan("3", "Anatomy", Status::NotStarted, Priority::Low),
            ]);
            list.set_search("an".into());
            list.cycle_status_filter(); // not-started
            list.cycle_priority_filter(); // low
            list
        };
        // "an" matches all three titles; status keeps 1 and 3; priority keeps 3.
        assert_eq!(titles(&list.visible()), vec!["Anatomy"]);
    }

    #[test]
    fn changing_search_leaves_other_predicates_alone() {
        let mut list = loaded(vec![
            make_plan("1", "Algebra", Status::Completed, Priority::Medium),
            make_plan("2", "History", Status::Completed, Priority::Medium),
            make_plan("3", "Biology", Status::NotStarted, Priority::Medium),
        ]);
        // completed only
        list.cycle_status_filter();
        list.cycle_status_filter();
        list.cycle_status_filter();
        assert_eq!(list.status_filter(), Some(Status::Completed));
        assert_eq!(list.visible().len(), 2);

        list.set_search("his".into());
        assert_eq!(titles(&list.visible()), vec!["History"]);

        // Biology matches the text but still fails the status predicate.
        list.set_search("bio".into());
        assert!(list.visible().is_empty());
    }

    #[test]
    fn high_priority_view_excludes_completed() {
        let list = loaded(vec![
            make_plan("1", "Algebra", Status::NotStarted, Priority::High),
            make_plan("2", "History", Status::Completed, Priority::High),
        ]);
        assert_eq!(titles(&list.high_priority(3)), vec!["Algebra"]);
    }

    #[test]
    fn high_priority_view_is_capped() {
        let list = loaded(vec![
            make_plan("1", "A", Status::NotStarted, Priority::High),
            make_plan("2", "B", Status::NotStarted, Priority::High),
            make_plan("3", "C", Status::InProgress, Priority::High),
            make_plan("4", "D", Status::NotStarted, Priority::High),
        ]);
        assert_eq!(titles(&list.high_priority(3)), vec!["A", "B", "C"]);
    }

    #[test]
    fn recent_view_sorts_by_creation_time() {
        let base = Utc::now();
        let mut plans = Vec::new();
        for (i, title) in ["oldest", "older", "newer", "newest"].iter().enumerate() {
            let mut plan = make_plan(&i.to_string(), title, Status::NotStarted, Priority::Medium);
            plan.created_at = base + Duration::seconds(i as i64);
            plan.updated_at = plan.created_at;
            plans.push(plan);
        }
        // Fetch order is newest first; shuffle to prove recent() sorts.
        plans.swap(0, 3);
        let list = loaded(plans);
        assert_eq!(titles(&list.recent(3)), vec!["newest", "newer", "older"]);
    }

    #[test]
    fn counts_tally_by_status() {
        let list = loaded(vec![
            make_plan("1", "A", Status::NotStarted, Priority::Medium),
            make_plan("2", "B", Status::InProgress, Priority::Medium),
            make_plan("3", "C", Status::Completed, Priority::Medium),
            make_plan("4", "D", Status::Completed, Priority::Medium),
        ]);
        let counts = list.counts();
        assert_eq!(counts.total, 4);
        assert_eq!(counts.completed, 2);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.not_started, 1);
    }

    #[test]
    fn stale_load_response_is_discarded() {
        let mut list = PlanList::new();
        let first = list.begin_load();
        let second = list.begin_load();

        // The later-issued load resolves first and wins.
        assert!(list.apply_load(
            second,
            vec![make_plan("2", "Second", Status::NotStarted, Priority::Medium)]
        ));
        // The earlier load's response arrives late and is dropped.
        assert!(!list.apply_load(
            first,
            vec![make_plan("1", "First", Status::NotStarted, Priority::Medium)]
        ));
        assert_eq!(titles(&list.visible()), vec!["Second"]);
    }

    #[test]
    fn failed_load_keeps_the_previous_list() {
        let mut list = loaded(vec![make_plan(
            "1",
            "Algebra",
            Status::NotStarted,
            Priority::Medium,
        )]);
        // A load was issued but errored, so apply_load is never called.
        let _seq = list.begin_load();
        assert_eq!(titles(&list.visible()), vec!["Algebra"]);
    }

    #[test]
    fn selection_follows_the_plan_across_reloads() {
        let a = make_plan("a", "Algebra", Status::NotStarted, Priority::Medium);
        let b = make_plan("b", "Biology", Status::NotStarted, Priority::Medium);
        let c = make_plan("c", "Chemistry", Status::NotStarted, Priority::Medium);
        let mut list = loaded(vec![a.clone(), b.clone(), c.clone()]);

        assert!(list.select_plan_by_id("b"));
        assert_eq!(list.selected_plan().unwrap().id, "b");

        // A reload that drops the plan above it keeps "b" selected.
        let seq = list.begin_load();
        assert!(list.apply_load(seq, vec![b.clone(), c.clone()]));
        assert_eq!(list.selected_plan().unwrap().id, "b");

        // A reload that drops the selected plan clamps to a neighbor.
        let seq = list.begin_load();
        assert!(list.apply_load(seq, vec![c]));
        assert_eq!(list.selected_plan().unwrap().id, "c");
    }

    #[test]
    fn selection_clamps_when_filters_shrink_the_view() {
        let mut list = loaded(vec![
            make_plan("1", "A", Status::NotStarted, Priority::Medium),
            make_plan("2", "B", Status::Completed, Priority::Medium),
            make_plan("3", "C", Status::NotStarted, Priority::Medium),
        ]);
        list.select_plan_by_id("3");
        list.set_search("b".into());
        assert_eq!(list.selected_plan().unwrap().id, "2");
        list.set_search("zzz".into());
        assert!(list.selected_plan().is_none());
    }

    #[test]
    fn recently_updated_flags_advance_and_clear() {
        let plan = make_plan("1", "Algebra", Status::NotStarted, Priority::Medium);
        let mut list = loaded(vec![plan.clone()]);
        assert!(!list.recently_updated("1"));

        let mut touched = plan.clone();
        touched.updated_at = plan.updated_at + Duration::seconds(1);
        let seq = list.begin_load();
        list.apply_load(seq, vec![touched.clone()]);
        assert!(list.recently_updated("1"));

        // Next refresh with no change clears the flag.
        let seq = list.begin_load();
        list.apply_load(seq, vec![touched]);
        assert!(!list.recently_updated("1"));
    }

    #[test]
    fn plans_never_seen_before_are_not_flagged() {
        let mut list = PlanList::new();
        let seq = list.begin_load();
        list.apply_load(
            seq,
            vec![make_plan("1", "Algebra", Status::NotStarted, Priority::Medium)],
        );
        assert!(!list.recently_updated("1"));
    }
}
