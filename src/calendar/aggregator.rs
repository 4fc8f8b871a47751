use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use super::event::{local_to_utc, DisplayEvent, RawEvent};
use super::fetch::EventSource;
use crate::config::{DisplayConfig, SourceConfig};
use crate::error::Result;

/// The latest completed refresh. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateState {
    /// Ascending by start; ties keep fetch order.
    pub events: Vec<DisplayEvent>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub loading: bool,
    pub failed_sources: Vec<String>,
}

impl Default for AggregateState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            last_refreshed_at: None,
            loading: true,
            failed_sources: Vec::new(),
        }
    }
}

impl AggregateState {
    /// Whether enough time has passed since the last refresh to fetch again.
    pub fn is_due<Tz: TimeZone>(&self, now: &DateTime<Tz>, interval: chrono::Duration) -> bool {
        match self.last_refreshed_at {
            None => true,
            Some(last) => now.with_timezone(&Utc) - last >= interval,
        }
    }
}

/// Today's local midnight through the end of day `today + days`, in UTC.
pub fn display_window<Tz: TimeZone>(now: &DateTime<Tz>, days: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let last_day = today
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);

    (
        local_to_utc(&tz, today.and_time(NaiveTime::MIN)),
        local_to_utc(&tz, last_day.and_time(end_of_day)),
    )
}

/// Merge per-calendar fetch results into one sorted, truncated list.
///
/// Failed calendars contribute nothing and are returned by id; malformed
/// events are dropped.
pub fn merge<Tz: TimeZone>(
    results: Vec<(&SourceConfig, Result<Vec<RawEvent>>)>,
    limit: i64,
    tz: &Tz,
) -> (Vec<DisplayEvent>, Vec<String>) {
    let mut events = Vec::new();
    let mut failed = Vec::new();

    for (source, result) in results {
        let raw_events = match result {
            Ok(raw_events) => raw_events,
            Err(e) => {
                warn!(calendar = %source.entity, error = %e, "Calendar fetch failed; showing it as empty");
                failed.push(source.entity.clone());
                continue;
            }
        };

        let color = source.display_color();
        for raw in raw_events {
            match DisplayEvent::from_raw(raw, &source.entity, &color, tz) {
                Ok(event) => events.push(event),
                Err(reason) => {
                    warn!(calendar = %source.entity, %reason, "Dropping malformed event");
                }
            }
        }
    }

    events.sort_by_key(|e| e.start);
    if let Ok(limit) = usize::try_from(limit) {
        events.truncate(limit);
    }

    (events, failed)
}

/// Fetches all configured calendars, at most once per refresh interval.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn EventSource>,
    config: Arc<DisplayConfig>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn EventSource>, config: Arc<DisplayConfig>) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn is_due<Tz: TimeZone>(&self, previous: &AggregateState, now: &DateTime<Tz>) -> bool {
        previous.is_due(now, self.config.refresh_interval)
    }

    /// Build a fresh state, or `None` if the previous one is still recent
    /// enough to keep.
    pub async fn refresh<Tz>(&self, previous: &AggregateState, now: DateTime<Tz>) -> Option<AggregateState>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        if !self.is_due(previous, &now) {
            return None;
        }

        let (start, end) = display_window(&now, self.config.days_to_show);
        info!(
            calendars = self.config.sources.len(),
            %start,
            %end,
            "Refreshing calendars"
        );

        let fetches = self
            .config
            .sources
            .iter()
            .map(|s| self.source.fetch(&s.entity, start, end));
        let results = join_all(fetches).await;

        let (events, failed_sources) = merge(
            self.config.sources.iter().zip(results).collect(),
            self.config.limit,
            &now.timezone(),
        );
        info!(
            events = events.len(),
            failed = failed_sources.len(),
            "Calendars refreshed"
        );

        Some(AggregateState {
            events,
            last_refreshed_at: Some(now.with_timezone(&Utc)),
            loading: false,
            failed_sources,
        })
    }
}
