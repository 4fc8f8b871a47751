use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::calendar::AggregateState;
use crate::theme::Theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        state: &AggregateState,
        refreshing: bool,
        message: Option<&str>,
        theme: &Theme,
    ) {
        let w = area.width as usize;

        let left = format!(" {} ", refresh_label(state.last_refreshed_at, refreshing));
        let warning = failure_label(&state.failed_sources, w.saturating_sub(left.len()));

        // Show status message if present, otherwise width-dependent hints
        let right = match message {
            Some(msg) => format!(" {} ", msg),
            None if w >= 70 => " jk:Move Enter:Open link ?:Help q:Quit ".to_string(),
            None if w >= 45 => " jk:Move Enter:Open q:Quit ".to_string(),
            None => " ?:Help q:Quit ".to_string(),
        };

        let used = left.chars().count() + warning.chars().count() + right.chars().count();
        let right = if used > w { String::new() } else { right };
        let padding = " ".repeat(w.saturating_sub(
            left.chars().count() + warning.chars().count() + right.chars().count(),
        ));

        let line = Line::from(vec![
            Span::styled(left, theme.status),
            Span::styled(warning, theme.error),
            Span::styled(padding, theme.status),
            Span::styled(right, theme.status),
        ]);

        let bar = Paragraph::new(line).style(theme.status);
        frame.render_widget(bar, area);
    }
}

fn refresh_label(last: Option<DateTime<Utc>>, refreshing: bool) -> String {
    match (last, refreshing) {
        (_, true) => "Refreshing...".to_string(),
        (None, false) => "Not refreshed yet".to_string(),
        (Some(at), false) => format!("Updated {}", at.with_timezone(&Local).format("%H:%M")),
    }
}

fn failure_label(failed: &[String], room: usize) -> String {
    if failed.is_empty() {
        return String::new();
    }
    let full = format!(" unavailable: {} ", failed.join(", "));
    if full.chars().count() <= room {
        full
    } else {
        format!(" {} unavailable ", failed.len())
    }
}
