use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use studyplan_core::plan::{Priority, Status, StudyPlan};

pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::LightRed),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

pub fn status_style(status: Status) -> Style {
    match status {
        Status::Completed => Style::default().fg(Color::Green),
        Status::InProgress => Style::default().fg(Color::Blue),
        Status::NotStarted => Style::default().fg(Color::DarkGray),
    }
}

/// Render one plan as a bordered card. `highlight` marks a plan whose
/// backend timestamp advanced on the latest refresh.
pub fn render_card(frame: &mut Frame, area: Rect, plan: &StudyPlan, highlight: bool) {
    let border_style = if highlight {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(format!(" {} ", plan.title))
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut lines = vec![Line::from(vec![
        Span::styled(plan.priority.display_name(), priority_style(plan.priority)),
        Span::raw("  "),
        Span::styled(plan.status.display_name(), status_style(plan.status)),
        Span::raw("  "),
        Span::styled(plan.category.clone(), Style::default().fg(Color::Cyan)),
    ])];
    if let Some(due) = plan.due_date {
        lines.push(Line::from(Span::styled(
            format!("Due: {}", due.format("%b %-d, %Y")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::raw(""));
    if plan.description.is_empty() {
        lines.push(Line::from(Span::styled(
            "No description provided.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::raw(plan.description.clone()));
    }

    let card = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(card, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_colors_match_the_badges() {
        assert_eq!(priority_style(Priority::High).fg, Some(Color::LightRed));
        assert_eq!(priority_style(Priority::Medium).fg, Some(Color::Yellow));
        assert_eq!(priority_style(Priority::Low).fg, Some(Color::Green));
    }

    #[test]
    fn status_colors_match_the_badges() {
        assert_eq!(status_style(Status::Completed).fg, Some(Color::Green));
        assert_eq!(status_style(Status::InProgress).fg, Some(Color::Blue));
        assert_eq!(status_style(Status::NotStarted).fg, Some(Color::DarkGray));
    }
}
