use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::event::RawEvent;
use crate::config::ConnectionConfig;
use crate::error::{fetch_error, Result};

/// Something that can list the events of one calendar in a time window.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch(
        &self,
        source_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>>;
}

/// `YYYY-MM-DDTHH:MM:SSZ`, the window format the calendar API expects.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Reads events from the Home Assistant REST calendar API.
pub struct HomeAssistantClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HomeAssistantClient {
    pub fn new(connection: &ConnectionConfig) -> Result<Self> {
        // Validate early so a typo in the URL fails at startup.
        Url::parse(&connection.url)?;
        let client = Client::builder()
            .user_agent(concat!("ha-agenda/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: connection.url.trim_end_matches('/').to_string(),
            token: connection.token.clone(),
        })
    }

    pub fn events_url(
        &self,
        source_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/calendars/{}", self.base_url, source_id))?;
        url.query_pairs_mut()
            .append_pair("start", &format_instant(start))
            .append_pair("end", &format_instant(end));
        Ok(url)
    }
}

#[async_trait]
impl EventSource for HomeAssistantClient {
    async fn fetch(
        &self,
        source_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        let url = self.events_url(source_id, start, end)?;
        debug!(%url, "Fetching calendar events");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| fetch_error(source_id, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(fetch_error(source_id, format!("HTTP {} - {}", status, body)));
        }

        let events: Vec<RawEvent> = response
            .json()
            .await
            .map_err(|e| fetch_error(source_id, format!("Failed to parse events: {}", e)))?;
        debug!(calendar = source_id, count = events.len(), "Fetched calendar events");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(url: &str) -> HomeAssistantClient {
        HomeAssistantClient::new(&ConnectionConfig {
            url: url.to_string(),
            token: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn formats_window_bounds_with_utc_designator() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        assert_eq!(format_instant(instant), "2024-01-01T23:00:00Z");
    }

    #[test]
    fn builds_calendar_url() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 8, 23, 59, 59).unwrap();
        let url = client("http://ha.lan:8123/")
            .events_url("calendar.home", start, end)
            .unwrap();

        assert_eq!(url.path(), "/api/calendars/calendar.home");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("start".to_string(), "2024-01-01T00:00:00Z".to_string()),
                ("end".to_string(), "2024-01-08T23:59:59Z".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = HomeAssistantClient::new(&ConnectionConfig {
            url: "not a url".to_string(),
            token: "secret".to_string(),
        });
        assert!(result.is_err());
    }
}
