use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::agenda::{self, AgendaView};
use crate::calendar::{AggregateState, Aggregator};
use crate::config::DisplayConfig;
use crate::event::Action;

pub struct App {
    pub running: bool,
    pub show_help: bool,
    /// Index among event rows, not list lines.
    pub selected: usize,
    pub refreshing: bool,
    pub status_message: Option<String>,
    state: AggregateState,
    aggregator: Aggregator,
    refresh_task: Option<JoinHandle<()>>,
    tx: UnboundedSender<Option<AggregateState>>,
    rx: UnboundedReceiver<Option<AggregateState>>,
}

impl App {
    pub fn new(aggregator: Aggregator) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            show_help: false,
            selected: 0,
            refreshing: false,
            status_message: None,
            state: AggregateState::default(),
            aggregator,
            refresh_task: None,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    pub fn config(&self) -> &DisplayConfig {
        self.aggregator.config()
    }

    /// Called on every loop iteration: take in a finished refresh and start
    /// the next one once the previous state is old enough.
    pub fn tick(&mut self) {
        let task_done = self.refresh_task.as_ref().is_some_and(JoinHandle::is_finished);
        self.receive_refreshes();
        if task_done {
            self.refresh_task = None;
            if self.refreshing {
                // The task ended without reporting back, so it panicked.
                error!("Refresh task died without a result");
                self.refreshing = false;
            }
        }
        if !self.refreshing && self.aggregator.is_due(&self.state, &Local::now()) {
            self.spawn_refresh();
        }
    }

    fn receive_refreshes(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(result) => {
                    self.refreshing = false;
                    if let Some(state) = result {
                        self.replace_state(state);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    error!("Refresh channel closed");
                    break;
                }
            }
        }
    }

    fn spawn_refresh(&mut self) {
        self.refreshing = true;
        let aggregator = self.aggregator.clone();
        let previous = self.state.clone();
        let tx = self.tx.clone();

        self.refresh_task = Some(tokio::spawn(async move {
            let result = aggregator.refresh(&previous, Local::now()).await;
            if tx.send(result).is_err() {
                debug!("App gone before refresh finished");
            }
        }));
    }

    /// Swap in a completed state wholesale.
    pub fn replace_state(&mut self, state: AggregateState) {
        if !state.failed_sources.is_empty() {
            warn!(failed = ?state.failed_sources, "Some calendars could not be loaded");
        }
        self.state = state;
        let last = self.state.events.len().saturating_sub(1);
        self.selected = self.selected.min(last);
    }

    pub fn view<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> AgendaView {
        agenda::present(&self.state, self.config(), now)
    }

    pub fn handle(&mut self, action: Action) {
        self.status_message = None;

        if self.show_help {
            if matches!(action, Action::ToggleHelp | Action::Close) {
                self.show_help = false;
            } else if action == Action::Quit {
                self.running = false;
            }
            return;
        }

        let count = self.state.events.len();
        match action {
            Action::Quit | Action::Close => self.running = false,
            Action::ToggleHelp => self.show_help = true,
            Action::Next => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            Action::Previous => self.selected = self.selected.saturating_sub(1),
            Action::First => self.selected = 0,
            Action::Last => self.selected = count.saturating_sub(1),
            Action::OpenLink => self.open_selected(),
        }
    }

    pub fn selected_link(&self) -> Option<&str> {
        self.state
            .events
            .get(self.selected)
            .and_then(|e| e.link.as_deref())
    }

    fn open_selected(&mut self) {
        let Some(link) = self.selected_link().map(str::to_string) else {
            self.status_message = Some("No link for this event".to_string());
            return;
        };
        match open::that(&link) {
            Ok(()) => self.status_message = Some("Opened in browser".to_string()),
            Err(e) => {
                warn!(%link, error = %e, "Failed to open event link");
                self.status_message = Some(format!("Could not open link: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DisplayEvent, EventSource, RawEvent};
    use crate::config::SourceConfig;
    use crate::error::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoEvents;

    #[async_trait]
    impl EventSource for NoEvents {
        async fn fetch(
            &self,
            _source_id: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<RawEvent>> {
            Ok(Vec::new())
        }
    }

    struct Explodes(AtomicUsize);

    #[async_trait]
    impl EventSource for Explodes {
        async fn fetch(
            &self,
            _source_id: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<RawEvent>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            panic!("calendar backend blew up");
        }
    }

    fn config() -> Arc<DisplayConfig> {
        Arc::new(
            DisplayConfig::with_sources(vec![SourceConfig {
                entity: "calendar.home".to_string(),
                color: None,
            }])
            .unwrap(),
        )
    }

    fn app() -> App {
        App::new(Aggregator::new(Arc::new(NoEvents), config()))
    }

    fn event(hour: u32, link: Option<&str>) -> DisplayEvent {
        let start = Utc::now().date_naive().and_hms_opt(hour, 0, 0).unwrap().and_utc();
        DisplayEvent {
            source: "calendar.home".to_string(),
            summary: Some(format!("event {}", hour)),
            start,
            end: start + chrono::Duration::hours(1),
            all_day: false,
            location: None,
            link: link.map(str::to_string),
            color: "#000000".to_string(),
        }
    }

    fn loaded(events: Vec<DisplayEvent>) -> AggregateState {
        AggregateState {
            events,
            last_refreshed_at: Some(Utc::now()),
            loading: false,
            failed_sources: Vec::new(),
        }
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut app = app();
        app.replace_state(loaded(vec![event(9, None), event(10, None), event(11, None)]));

        app.handle(Action::Previous);
        assert_eq!(app.selected, 0);
        app.handle(Action::Last);
        assert_eq!(app.selected, 2);
        app.handle(Action::Next);
        assert_eq!(app.selected, 2);

        app.replace_state(loaded(vec![event(9, None)]));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn help_swallows_navigation() {
        let mut app = app();
        app.replace_state(loaded(vec![event(9, None), event(10, None)]));
        app.handle(Action::ToggleHelp);
        assert!(app.show_help);
        app.handle(Action::Next);
        assert_eq!(app.selected, 0);
        app.handle(Action::Close);
        assert!(!app.show_help);
        assert!(app.running);
        app.handle(Action::Close);
        assert!(!app.running);
    }

    #[test]
    fn missing_link_reports_status() {
        let mut app = app();
        app.replace_state(loaded(vec![event(9, None), event(10, Some("https://example.com"))]));
        app.handle(Action::OpenLink);
        assert_eq!(app.status_message.as_deref(), Some("No link for this event"));
        app.handle(Action::Next);
        assert_eq!(app.selected_link(), Some("https://example.com"));
    }

    #[test]
    fn view_shows_loading_until_first_refresh() {
        let app = app();
        let view = app.view(&Utc::now());
        assert_eq!(view.body, agenda::AgendaBody::Message("Loading...".to_string()));
    }

    #[tokio::test]
    async fn tick_runs_one_refresh_at_a_time() {
        let mut app = app();
        app.tick();
        assert!(app.refreshing);
        app.tick();
        assert!(app.refreshing);

        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            app.tick();
            if !app.refreshing {
                break;
            }
        }
        assert!(!app.refreshing);
        assert!(!app.state().loading);
        assert!(app.state().last_refreshed_at.is_some());
        assert_eq!(
            app.view(&Utc::now()).body,
            agenda::AgendaBody::Message("No upcoming event".to_string())
        );

        // Fresh state: further ticks do not fetch again.
        app.tick();
        assert!(!app.refreshing);
    }

    #[tokio::test]
    async fn panicked_refresh_does_not_block_later_ones() {
        let source = Arc::new(Explodes(AtomicUsize::new(0)));
        let mut app = App::new(Aggregator::new(source.clone(), config()));

        app.tick();
        assert!(app.refreshing);
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            app.tick();
            if source.0.load(Ordering::SeqCst) >= 2 {
                break;
            }
        }
        assert!(source.0.load(Ordering::SeqCst) >= 2);
        assert!(app.state().loading);
    }
}
