use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

pub struct HelpPopup;

impl HelpPopup {
    pub fn render(frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_w = area.width.clamp(30, 48).min(area.width);
        let popup_h = area.height.clamp(10, 13).min(area.height);
        let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
        let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
        let popup_area = Rect::new(x, y, popup_w, popup_h);

        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Keybindings ")
            .title_style(theme.title)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let binding = |keys: &'static str, desc: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {:<10}", keys), key_style),
                Span::styled(desc, theme.event),
            ])
        };

        let lines = vec![
            Line::from(Span::styled("Agenda", section_style)),
            binding("j/k", "Next/previous event"),
            binding("g/G", "First/last event"),
            binding("Enter", "Open event link"),
            Line::from(""),
            Line::from(Span::styled(
                "Calendars refresh every 15 minutes at most.",
                theme.details,
            )),
            Line::from(""),
            binding("q/Esc", "Quit / close popup"),
        ];

        let para = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(para, inner);
    }
}
