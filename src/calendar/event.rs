use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

/// Start or end of an event as Home Assistant reports it: either an
/// instant (`dateTime`) or a whole day (`date`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl EventTime {
    pub fn at(instant: &str) -> Self {
        Self {
            date_time: Some(instant.to_string()),
            date: None,
        }
    }

    pub fn on(day: &str) -> Self {
        Self {
            date_time: None,
            date: Some(day.to_string()),
        }
    }

    /// Resolve to an instant; whole days start at local midnight in `tz`.
    fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> Result<(DateTime<Utc>, bool), String> {
        if let Some(ref dt) = self.date_time {
            let parsed = DateTime::parse_from_rfc3339(dt)
                .map_err(|e| format!("invalid dateTime {:?}: {}", dt, e))?;
            return Ok((parsed.with_timezone(&Utc), false));
        }
        if let Some(ref d) = self.date {
            let day = NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|e| format!("invalid date {:?}: {}", d, e))?;
            return Ok((local_to_utc(tz, day.and_time(chrono::NaiveTime::MIN)), true));
        }
        Err("neither dateTime nor date present".to_string())
    }
}

/// An event exactly as the calendar API returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub location: Option<String>,
    pub html_link: Option<String>,
}

/// A validated event tagged with the color of the calendar it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEvent {
    pub source: String,
    pub summary: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub location: Option<String>,
    pub link: Option<String>,
    pub color: String,
}

impl DisplayEvent {
    /// Validate `raw`. Events without a usable start and end, or ending
    /// before they start, are rejected with a reason.
    pub fn from_raw<Tz: TimeZone>(
        raw: RawEvent,
        source: &str,
        color: &str,
        tz: &Tz,
    ) -> Result<Self, String> {
        let start = raw.start.as_ref().ok_or("missing start")?;
        let end = raw.end.as_ref().ok_or("missing end")?;
        let (start, start_all_day) = start.resolve(tz)?;
        let (end, _) = end.resolve(tz)?;
        if end < start {
            return Err(format!("ends ({}) before it starts ({})", end, start));
        }

        Ok(Self {
            source: source.to_string(),
            summary: raw.summary,
            start,
            end,
            all_day: start_all_day,
            location: raw.location,
            link: raw.html_link,
            color: color.to_string(),
        })
    }

    pub fn is_ended<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        *now > self.end
    }

    pub fn is_in_progress<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        *now > self.start && *now < self.end
    }
}

/// Convert a wall-clock time in `tz` to UTC, stepping over DST gaps.
pub fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => match tz.from_local_datetime(&(naive + Duration::hours(1))).earliest() {
            Some(dt) => dt.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&naive),
        },
    }
}
