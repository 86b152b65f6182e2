mod app;
mod files;
mod handler;
mod logging;
mod markup;
mod playback;
mod speech;
mod tui;
mod ui;

use anyhow::Result;
use app::App;
use doulia_core::Config;
use tracing::{error, info};
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not read config ({:#}), using defaults", e);
            Config::new()
        }
    };

    match logging::init(&config) {
        Ok(path) => info!(log = %path.display(), version = env!("CARGO_PKG_VERSION"), "Starting DOULIA"),
        Err(e) => eprintln!("Warning: logging disabled: {:#}", e),
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;
    app.shutdown();

    tui::restore()?;
    if let Err(e) = &result {
        error!("Exited with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    info!("Shutting down");
    Ok(())
}
