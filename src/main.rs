use std::time::Duration;

use chrono::Local;
use color_eyre::Result;
use ratatui::layout::{Constraint, Layout};
use tracing::info;

use ha_agenda::app::App;
use ha_agenda::components::{AgendaList, HelpPopup, StatusBar};
use ha_agenda::theme::Theme;
use ha_agenda::{event, startup, tui};

const FRAME_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    startup::init_logging()?;

    // Configuration problems are reported before the terminal is taken over.
    let aggregator = startup::build_aggregator()?;
    let theme = Theme::load();
    info!(theme = %theme.name, "Starting agenda");

    let mut app = App::new(aggregator);
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &theme);
    tui::restore()?;
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App, theme: &Theme) -> Result<()> {
    while app.running {
        app.tick();

        let now = Local::now();
        let view = app.view(&now);

        terminal.draw(|frame| {
            let area = frame.area();
            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

            AgendaList::render(frame, layout[0], &view, app.selected, theme);
            StatusBar::render(
                frame,
                layout[1],
                app.state(),
                app.refreshing,
                app.status_message.as_deref(),
                theme,
            );

            if app.show_help {
                HelpPopup::render(frame, area, theme);
            }
        })?;

        if let Some(action) = event::next_action(FRAME_INTERVAL)? {
            app.handle(action);
        }
    }

    info!("Quitting");
    Ok(())
}
