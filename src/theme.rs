use std::path::PathBuf;

use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;
use tracing::warn;

use crate::config;

/// Styles used by the agenda, loaded from `theme.toml` next to the config.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub title: Style,
    pub day_header: Style,
    pub event: Style,
    pub ended: Style,
    pub details: Style,
    pub progress: Style,
    pub border: Style,
    pub status: Style,
    pub error: Style,
    pub selected: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            title: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            day_header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            event: Style::default(),
            ended: Style::default().add_modifier(Modifier::DIM),
            details: Style::default().fg(Color::Gray),
            progress: Style::default().fg(Color::Cyan),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            error: Style::default().fg(Color::LightRed).bg(Color::DarkGray),
            selected: Style::default().bg(Color::DarkGray),
        }
    }
}

impl Theme {
    pub fn load() -> Self {
        let Some(path) = theme_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| toml::from_str::<ThemeConfig>(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config.into_theme(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable theme");
                Self::default()
            }
        }
    }

    /// Get a built-in preset by name.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => Self::dracula(),
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            _ => Self::default(),
        }
    }

    fn from_palette(name: &str, fg: Color, dim: Color, accent: Color, panel: Color) -> Self {
        Self {
            name: name.to_string(),
            title: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            day_header: Style::default().fg(accent).add_modifier(Modifier::BOLD),
            event: Style::default().fg(fg),
            ended: Style::default().fg(dim),
            details: Style::default().fg(dim),
            progress: Style::default().fg(accent),
            border: Style::default().fg(panel),
            status: Style::default().fg(fg).bg(panel),
            error: Style::default().fg(Color::LightRed).bg(panel),
            selected: Style::default().bg(panel),
        }
    }

    fn dracula() -> Self {
        Self::from_palette(
            "dracula",
            Color::Rgb(248, 248, 242),
            Color::Rgb(98, 114, 164),
            Color::Rgb(189, 147, 249), // purple
            Color::Rgb(68, 71, 90),
        )
    }

    fn gruvbox() -> Self {
        Self::from_palette(
            "gruvbox",
            Color::Rgb(235, 219, 178),
            Color::Rgb(146, 131, 116),
            Color::Rgb(250, 189, 47), // yellow
            Color::Rgb(80, 73, 69),
        )
    }

    fn nord() -> Self {
        Self::from_palette(
            "nord",
            Color::Rgb(229, 233, 240),
            Color::Rgb(76, 86, 106),
            Color::Rgb(136, 192, 208), // frost
            Color::Rgb(67, 76, 94),
        )
    }
}

fn theme_path() -> Option<PathBuf> {
    config::config_dir().map(|d| d.join("theme.toml"))
}

// ── TOML theme types ──

#[derive(Debug, Deserialize, Default)]
struct ThemeConfig {
    preset: Option<String>,
    title_fg: Option<String>,
    day_header_fg: Option<String>,
    event_fg: Option<String>,
    ended_fg: Option<String>,
    details_fg: Option<String>,
    progress_fg: Option<String>,
    border_fg: Option<String>,
    status_fg: Option<String>,
    status_bg: Option<String>,
    selected_bg: Option<String>,
}

impl ThemeConfig {
    fn into_theme(self) -> Theme {
        let mut theme = self
            .preset
            .as_deref()
            .map(Theme::preset)
            .unwrap_or_default();

        override_fg(&mut theme.title, &self.title_fg);
        override_fg(&mut theme.day_header, &self.day_header_fg);
        override_fg(&mut theme.event, &self.event_fg);
        override_fg(&mut theme.ended, &self.ended_fg);
        override_fg(&mut theme.details, &self.details_fg);
        override_fg(&mut theme.progress, &self.progress_fg);
        override_fg(&mut theme.border, &self.border_fg);
        override_fg(&mut theme.status, &self.status_fg);
        if let Some(c) = self.status_bg.as_deref().and_then(parse_color) {
            theme.status = theme.status.bg(c);
            theme.error = theme.error.bg(c);
        }
        if let Some(c) = self.selected_bg.as_deref().and_then(parse_color) {
            theme.selected = theme.selected.bg(c);
        }

        theme
    }
}

fn override_fg(style: &mut Style, value: &Option<String>) {
    if let Some(c) = value.as_deref().and_then(parse_color) {
        *style = style.fg(c);
    }
}

/// Parse a color string: hex "#rrggbb", or named colors.
pub fn parse_color(s: &str) -> Option<Color> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Color::Rgb(r, g, b));
        }
        return None;
    }
    match s.to_lowercase().as_str() {
        "black" => Some(Color::Black),
        "red" => Some(Color::Red),
        "green" => Some(Color::Green),
        "yellow" => Some(Color::Yellow),
        "blue" => Some(Color::Blue),
        "magenta" | "purple" => Some(Color::Magenta),
        "cyan" => Some(Color::Cyan),
        "white" => Some(Color::White),
        "gray" | "grey" => Some(Color::Gray),
        "darkgray" | "darkgrey" => Some(Color::DarkGray),
        "orange" => Some(Color::Rgb(255, 165, 0)),
        "lightred" => Some(Color::LightRed),
        "lightgreen" => Some(Color::LightGreen),
        "lightyellow" => Some(Color::LightYellow),
        "lightblue" => Some(Color::LightBlue),
        "lightmagenta" => Some(Color::LightMagenta),
        "lightcyan" => Some(Color::LightCyan),
        _ => None,
    }
}
