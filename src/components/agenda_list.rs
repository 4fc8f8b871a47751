use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::agenda::{AgendaBody, AgendaRow, AgendaView, EventRow};
use crate::theme::{parse_color, Theme};

const CHIP: &str = "\u{25cf} ";
const LINK_MARK: &str = " \u{2197}";
const BAR: char = '\u{2501}';

pub struct AgendaList;

impl AgendaList {
    /// Draw the agenda card. `selected` is the index of the highlighted event.
    pub fn render(frame: &mut Frame, area: Rect, view: &AgendaView, selected: usize, theme: &Theme) {
        let block = Block::default()
            .title(format!(" {} ", view.title))
            .title_style(theme.title)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let rows = match &view.body {
            AgendaBody::Message(message) => {
                let inner = block.inner(area);
                frame.render_widget(block, area);
                let msg = Paragraph::new(message.as_str())
                    .style(theme.details)
                    .wrap(Wrap { trim: true });
                frame.render_widget(msg, inner);
                return;
            }
            AgendaBody::Rows(rows) => rows,
        };

        let inner_w = area.width.saturating_sub(2) as usize;
        let mut items: Vec<ListItem> = Vec::with_capacity(rows.len());
        let mut selected_item = None;

        for row in rows {
            match row {
                AgendaRow::DayHeader { label, .. } => {
                    if !items.is_empty() {
                        items.push(ListItem::new(Line::from("")));
                    }
                    items.push(ListItem::new(Line::from(Span::styled(
                        label.to_uppercase(),
                        theme.day_header,
                    ))));
                }
                AgendaRow::Event(event) => {
                    let is_selected = event.index == selected;
                    if is_selected {
                        selected_item = Some(items.len());
                    }

                    let item = format_event(event, inner_w, theme);
                    items.push(if is_selected {
                        item.style(theme.selected)
                    } else {
                        item
                    });
                }
            }
        }

        let mut state = ListState::default().with_selected(selected_item);
        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_event(ev: &EventRow, max_width: usize, theme: &Theme) -> ListItem<'static> {
    let text_style = if ev.ended { theme.ended } else { theme.event };
    let mut title_spans = Vec::new();

    if let Some(ref chip) = ev.chip {
        let chip_style = parse_color(chip)
            .map(|c| Style::default().fg(c))
            .unwrap_or_default();
        title_spans.push(Span::styled(CHIP, chip_style));
    }

    let link_w = if ev.link.is_some() { 2 } else { 0 };
    let chip_w = if ev.chip.is_some() { 2 } else { 0 };
    let title_w = max_width.saturating_sub(chip_w + link_w);
    title_spans.push(Span::styled(
        truncate(&ev.title, title_w),
        text_style.add_modifier(Modifier::BOLD),
    ));
    if ev.link.is_some() {
        title_spans.push(Span::styled(LINK_MARK, theme.details));
    }

    let details_style = if ev.ended { theme.ended } else { theme.details };
    let mut details = format!("  {}", ev.time_range);
    if let Some(ref loc) = ev.location {
        details.push_str(&format!("  @ {}", loc));
    }

    let mut lines = vec![
        Line::from(title_spans),
        Line::from(Span::styled(truncate(&details, max_width), details_style)),
    ];

    if let Some(pct) = ev.progress {
        lines.push(Line::from(Span::styled(
            progress_bar(pct, max_width),
            theme.progress,
        )));
    }

    ListItem::new(Text::from(lines))
}

/// A bar filling `pct` percent of `width` cells, at least one cell while running.
pub fn progress_bar(pct: f64, width: usize) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    BAR.to_string().repeat(filled.clamp(1, width.max(1)))
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        s.to_string()
    } else if max > 3 {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, buffer::Buffer, style::Color, Terminal};

    fn row(progress: Option<f64>) -> EventRow {
        EventRow {
            index: 0,
            title: "Dentist".to_string(),
            link: None,
            chip: Some("#FF0000".to_string()),
            time_range: "10:00 - 11:00".to_string(),
            location: Some("Main St".to_string()),
            ended: false,
            progress,
        }
    }

    fn render(view: &AgendaView, selected: usize) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal
            .draw(|frame| AgendaList::render(frame, frame.area(), view, selected, &Theme::default()))
            .unwrap();
        terminal.backend().buffer().clone()
    }

    fn draw(view: &AgendaView) -> String {
        let buffer = render(view, 0);
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn bar_scales_with_progress() {
        assert_eq!(progress_bar(50.0, 10).chars().count(), 5);
        assert_eq!(progress_bar(100.0, 10).chars().count(), 10);
        assert_eq!(progress_bar(0.1, 10).chars().count(), 1);
        assert_eq!(progress_bar(250.0, 10).chars().count(), 10);
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("Zahnärztin Termin", 8), "Zahnä...");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn renders_message_body() {
        let view = AgendaView {
            title: "Calendar".to_string(),
            body: AgendaBody::Message("Loading...".to_string()),
        };
        let screen = draw(&view);
        assert!(screen.contains("Calendar"));
        assert!(screen.contains("Loading..."));
    }

    #[test]
    fn renders_headers_events_and_details() {
        let view = AgendaView {
            title: "Calendar".to_string(),
            body: AgendaBody::Rows(vec![
                AgendaRow::DayHeader {
                    label: "January 1, 2024".to_string(),
                },
                AgendaRow::Event(row(Some(50.0))),
            ]),
        };
        let screen = draw(&view);
        assert!(screen.contains("JANUARY 1, 2024"));
        assert!(screen.contains("Dentist"));
        assert!(screen.contains("10:00 - 11:00  @ Main St"));
        assert!(screen.contains(BAR));
    }

    #[test]
    fn highlights_the_event_with_the_selected_index() {
        let gym = EventRow {
            index: 1,
            title: "Gym".to_string(),
            ..row(None)
        };
        let view = AgendaView {
            title: "Calendar".to_string(),
            body: AgendaBody::Rows(vec![
                AgendaRow::DayHeader {
                    label: "January 1, 2024".to_string(),
                },
                AgendaRow::Event(row(None)),
                AgendaRow::DayHeader {
                    label: "January 2, 2024".to_string(),
                },
                AgendaRow::Event(gym),
            ]),
        };
        let buffer = render(&view, 1);
        let line_with = |text: &str| {
            (0..buffer.area.height)
                .find(|&y| {
                    let line: String = (0..buffer.area.width)
                        .map(|x| buffer[(x, y)].symbol().to_string())
                        .collect();
                    line.contains(text)
                })
                .unwrap()
        };
        assert_eq!(buffer[(1, line_with("Gym"))].bg, Color::DarkGray);
        assert_ne!(buffer[(1, line_with("Dentist"))].bg, Color::DarkGray);
    }
}
