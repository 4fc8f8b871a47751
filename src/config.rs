use std::path::PathBuf;

use chrono::Duration;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{config_error, Result};

/// Fetches never happen more often than this, whatever the config says.
pub const MIN_REFRESH_MINUTES: i64 = 15;

pub const DEFAULT_URL: &str = "http://homeassistant.local:8123";
pub const TOKEN_ENV: &str = "HASS_TOKEN";
pub const CONFIG_ENV: &str = "HA_AGENDA_CONFIG";

/// One calendar entity to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub entity: String,
    pub color: Option<String>,
}

/// Everything the aggregator and the agenda need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub sources: Vec<SourceConfig>,
    pub days_to_show: u32,
    /// Negative means unbounded.
    pub limit: i64,
    pub show_color: bool,
    pub show_location: bool,
    pub loading_message: String,
    pub no_event_message: String,
    pub title: String,
    pub date_format: String,
    pub refresh_interval: Duration,
}

impl DisplayConfig {
    /// Build a config for the given sources with every other field at its default.
    pub fn with_sources(sources: Vec<SourceConfig>) -> Result<Self> {
        if sources.is_empty() {
            return Err(config_error("You need to define an entity"));
        }
        Ok(Self {
            sources,
            days_to_show: default_days_to_show(),
            limit: default_limit(),
            show_color: true,
            show_location: true,
            loading_message: default_loading_message(),
            no_event_message: default_no_event_message(),
            title: default_title(),
            date_format: default_date_format(),
            refresh_interval: Duration::minutes(MIN_REFRESH_MINUTES),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub url: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub display: DisplayConfig,
    pub connection: ConnectionConfig,
}

impl Config {
    /// Load the config file, taking the access token from the environment if set.
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| config_error("Could not locate a config directory"))?;
        info!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            config_error(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let env_token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::parse(&content, env_token)
    }

    pub fn parse(content: &str, env_token: Option<String>) -> Result<Self> {
        let mut file: ConfigFile = toml::from_str(content)?;
        let connection = file.connection.take().unwrap_or_default();
        let display = file.display()?;

        let token = env_token
            .or(connection.token)
            .ok_or_else(|| {
                config_error(format!(
                    "No access token: set {} or connection.token",
                    TOKEN_ENV
                ))
            })?;
        let url = connection
            .url
            .unwrap_or_else(|| DEFAULT_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let source_count = display.sources.len();
        debug!(sources = source_count, %url, "Configuration resolved");

        Ok(Self {
            display,
            connection: ConnectionConfig { url, token },
        })
    }
}

/// Path of the config file: `$HA_AGENDA_CONFIG`, else the user config dir.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|d| d.join("config.toml"))
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ha-agenda"))
}

// ── TOML config types ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    entities: Option<toml::Value>,
    #[serde(default = "default_days_to_show")]
    days_to_show: u32,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default = "default_true")]
    show_color: bool,
    #[serde(default = "default_true")]
    show_location: bool,
    #[serde(default = "default_loading_message")]
    loading_message: String,
    #[serde(default = "default_no_event_message")]
    no_event_message: String,
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_date_format")]
    date_format: String,
    #[serde(default = "default_refresh_minutes")]
    refresh_interval_minutes: i64,
    connection: Option<ConnectionFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ConnectionFile {
    url: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityEntry {
    Id(String),
    Table { entity: String, color: Option<String> },
}

impl ConfigFile {
    fn display(self) -> Result<DisplayConfig> {
        let sources = parse_entities(self.entities)?;
        let minutes = self.refresh_interval_minutes.max(MIN_REFRESH_MINUTES);

        Ok(DisplayConfig {
            sources,
            days_to_show: self.days_to_show,
            limit: self.limit,
            show_color: self.show_color,
            show_location: self.show_location,
            loading_message: self.loading_message,
            no_event_message: self.no_event_message,
            title: self.title,
            date_format: self.date_format,
            refresh_interval: Duration::minutes(minutes),
        })
    }
}

fn parse_entities(value: Option<toml::Value>) -> Result<Vec<SourceConfig>> {
    let Some(toml::Value::Array(items)) = value else {
        return Err(config_error("You need to define an entity"));
    };
    if items.is_empty() {
        return Err(config_error("You need to define an entity"));
    }

    items
        .into_iter()
        .map(|item| {
            let entry: EntityEntry = item
                .try_into()
                .map_err(|e| config_error(format!("Invalid entity entry: {}", e)))?;
            let source = match entry {
                EntityEntry::Id(entity) => SourceConfig { entity, color: None },
                EntityEntry::Table { entity, color } => SourceConfig { entity, color },
            };
            if source.entity.trim().is_empty() {
                return Err(config_error("Entity id must not be empty"));
            }
            Ok(source)
        })
        .collect()
}

fn default_days_to_show() -> u32 {
    7
}

fn default_limit() -> i64 {
    -1
}

fn default_true() -> bool {
    true
}

fn default_loading_message() -> String {
    "Loading...".to_string()
}

fn default_no_event_message() -> String {
    "No upcoming event".to_string()
}

fn default_title() -> String {
    "Calendar".to_string()
}

fn default_date_format() -> String {
    "%B %-d, %Y".to_string()
}

fn default_refresh_minutes() -> i64 {
    MIN_REFRESH_MINUTES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn token() -> Option<String> {
        Some("env-token".to_string())
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::parse(r#"entities = ["calendar.home"]"#, token()).unwrap();
        let display = config.display;
        assert_eq!(display.days_to_show, 7);
        assert_eq!(display.limit, -1);
        assert!(display.show_color);
        assert!(display.show_location);
        assert_eq!(display.loading_message, "Loading...");
        assert_eq!(display.no_event_message, "No upcoming event");
        assert_eq!(display.title, "Calendar");
        assert_eq!(display.refresh_interval, Duration::minutes(15));
        assert_eq!(config.connection.url, DEFAULT_URL);
    }

    #[test]
    fn entities_accept_strings_and_tables() {
        let content = r##"
            entities = [
                "calendar.home",
                { entity = "calendar.work", color = "#FF0000" },
            ]
            daysToShow = 3
            limit = 5
            showColor = false
        "##;
        let display = Config::parse(content, token()).unwrap().display;
        assert_eq!(
            display.sources,
            vec![
                SourceConfig { entity: "calendar.home".into(), color: None },
                SourceConfig {
                    entity: "calendar.work".into(),
                    color: Some("#FF0000".into())
                },
            ]
        );
        assert_eq!(display.days_to_show, 3);
        assert_eq!(display.limit, 5);
        assert!(!display.show_color);
    }

    #[test]
    fn missing_entities_is_a_config_error() {
        let err = Config::parse(r#"title = "Agenda""#, token()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_entities_is_a_config_error() {
        let err = Config::parse("entities = []", token()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn non_list_entities_is_a_config_error() {
        let err = Config::parse(r#"entities = "calendar.home""#, token()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn with_sources_rejects_empty_list() {
        assert!(matches!(
            DisplayConfig::with_sources(Vec::new()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn refresh_interval_cannot_go_below_floor() {
        let content = r#"
            entities = ["calendar.home"]
            refreshIntervalMinutes = 1
        "#;
        let display = Config::parse(content, token()).unwrap().display;
        assert_eq!(display.refresh_interval, Duration::minutes(15));

        let content = r#"
            entities = ["calendar.home"]
            refreshIntervalMinutes = 60
        "#;
        let display = Config::parse(content, token()).unwrap().display;
        assert_eq!(display.refresh_interval, Duration::minutes(60));
    }

    #[test]
    fn environment_token_wins_over_file() {
        let content = r#"
            entities = ["calendar.home"]
            [connection]
            url = "http://ha.lan:8123/"
            token = "file-token"
        "#;
        let config = Config::parse(content, token()).unwrap();
        assert_eq!(config.connection.token, "env-token");
        assert_eq!(config.connection.url, "http://ha.lan:8123");

        let config = Config::parse(content, None).unwrap();
        assert_eq!(config.connection.token, "file-token");
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::parse(r#"entities = ["calendar.home"]"#, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
