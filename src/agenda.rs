//! Turns the latest aggregate into what the agenda shows.
//!
//! Everything here is a pure function of the state, the config and the
//! current time; drawing lives in `components::agenda_list`.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::calendar::{AggregateState, DisplayEvent};
use crate::config::DisplayConfig;

pub const BUSY: &str = "Busy";
const FALLBACK_DATE_FORMAT: &str = "%B %-d, %Y";

#[derive(Debug, Clone, PartialEq)]
pub struct AgendaView {
    pub title: String,
    pub body: AgendaBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgendaBody {
    /// Loading or empty state.
    Message(String),
    Rows(Vec<AgendaRow>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgendaRow {
    DayHeader { label: String },
    Event(EventRow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Position in `AggregateState::events`.
    pub index: usize,
    pub title: String,
    pub link: Option<String>,
    pub chip: Option<String>,
    pub time_range: String,
    pub location: Option<String>,
    pub ended: bool,
    /// Percent elapsed, only while the event is running.
    pub progress: Option<f64>,
}

impl AgendaView {
    pub fn event_rows(&self) -> impl Iterator<Item = &EventRow> {
        let rows: &[AgendaRow] = match &self.body {
            AgendaBody::Rows(rows) => rows,
            AgendaBody::Message(_) => &[],
        };
        rows.iter().filter_map(|row| match row {
            AgendaRow::Event(event) => Some(event),
            AgendaRow::DayHeader { .. } => None,
        })
    }
}

pub fn present<Tz: TimeZone>(
    state: &AggregateState,
    config: &DisplayConfig,
    now: &DateTime<Tz>,
) -> AgendaView {
    let body = if state.loading {
        AgendaBody::Message(config.loading_message.clone())
    } else if state.events.is_empty() {
        AgendaBody::Message(config.no_event_message.clone())
    } else {
        AgendaBody::Rows(rows(&state.events, config, now))
    };

    AgendaView {
        title: config.title.clone(),
        body,
    }
}

fn rows<Tz: TimeZone>(events: &[DisplayEvent], config: &DisplayConfig, now: &DateTime<Tz>) -> Vec<AgendaRow> {
    let tz = now.timezone();
    let mut rows = Vec::with_capacity(events.len() * 2);
    let mut previous_day: Option<NaiveDate> = None;

    for (index, event) in events.iter().enumerate() {
        let day = event.start.with_timezone(&tz).date_naive();
        if previous_day != Some(day) {
            rows.push(AgendaRow::DayHeader {
                label: format_day(day, &config.date_format),
            });
        }
        previous_day = Some(day);

        rows.push(AgendaRow::Event(event_row(index, event, config, now)));
    }

    rows
}

fn event_row<Tz: TimeZone>(
    index: usize,
    event: &DisplayEvent,
    config: &DisplayConfig,
    now: &DateTime<Tz>,
) -> EventRow {
    let chip = (config.show_color && !event.color.is_empty()).then(|| event.color.clone());
    let location = event
        .location
        .as_ref()
        .filter(|loc| config.show_location && !loc.trim().is_empty())
        .cloned();
    let title = event
        .summary
        .as_ref()
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| BUSY.to_string());

    EventRow {
        index,
        title,
        link: event.link.clone(),
        chip,
        time_range: time_range(event, &now.timezone()),
        location,
        ended: event.is_ended(now),
        progress: progress(event, now),
    }
}

/// Percent of the event elapsed at `now`, if it is running.
pub fn progress<Tz: TimeZone>(event: &DisplayEvent, now: &DateTime<Tz>) -> Option<f64> {
    if !event.is_in_progress(now) {
        return None;
    }
    let elapsed = now.with_timezone(&chrono::Utc) - event.start;
    let total = event.end - event.start;
    let percent = 100.0 * elapsed.num_milliseconds() as f64 / total.num_milliseconds() as f64;
    Some(percent.clamp(0.0, 100.0))
}

fn time_range<Tz: TimeZone>(event: &DisplayEvent, tz: &Tz) -> String {
    if event.all_day {
        return "All day".to_string();
    }
    let start = event.start.with_timezone(tz).naive_local();
    let end = event.end.with_timezone(tz).naive_local();
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

/// Long date for a day header; bad user formats fall back to the default.
pub fn format_day(day: NaiveDate, format: &str) -> String {
    let mut label = String::new();
    if write!(label, "{}", day.format(format)).is_err() {
        label.clear();
        let _ = write!(label, "{}", day.format(FALLBACK_DATE_FORMAT));
    }
    label
}
