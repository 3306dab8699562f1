use anyhow::Result;

mod app;
mod backend;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_panic_hook();

    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let mut app = App::new(backend::DEFAULT_BASE_URL);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }

        // Fold a completed exchange into the transcript. Ticks keep the
        // loop turning, so a finished request never waits on a keypress.
        if app.exchange_ready() {
            app.collect_exchange().await;
        }
    }

    tui::restore()?;
    Ok(())
}
