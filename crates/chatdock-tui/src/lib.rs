//! chatdock-tui: Terminal UI for the chatdock chat widget
//!
//! This crate renders the widget in a terminal, including:
//! - A launcher badge that opens the chat panel
//! - The panel with transcript, typing indicator, error banner and input
//! - The event loop wiring keys, ticks and dispatched sends together

mod app;
mod event;
#[cfg(test)]
pub mod test_utils;
mod theme;
pub mod widgets;

pub use app::App;
pub use event::{key_to_action, Action, Event, EventHandler};
pub use chatdock_engine;
pub use theme::Theme;

use chatdock_engine::{
    ControllerOptions, ConversationController, HostBridge, HostEnvelope, HttpTransport,
    WidgetConfig,
};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use widgets::ChatView;

/// Tick rate for the event loop, in milliseconds.
const TICK_RATE_MS: u64 = 150;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the widget in the terminal.
///
/// Mounts the widget: attaches the host bridge to `host_inbox` for the
/// lifetime of the call, creates the controller, runs the event loop and
/// restores the terminal on exit.
pub async fn run_tui(
    config: &WidgetConfig,
    host_inbox: mpsc::UnboundedReceiver<HostEnvelope>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bridge = HostBridge::new(config.origin_policy());
    let credentials = bridge.subscribe();
    let _bridge_guard = bridge.attach(host_inbox);

    let transport = Arc::new(HttpTransport::from_config(config));
    let endpoint = transport.endpoint().to_string();
    let controller =
        ConversationController::new(transport, credentials, ControllerOptions::from(config));
    info!(session = %controller.session_id(), %endpoint, "Widget mounted");

    let mut app = App::new(controller, config.title.clone());

    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    info!("Widget unmounted");
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<HttpTransport>,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    let theme = Theme::default();

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            let view = ChatView::new(&app.controller, &theme)
                .title(&app.title)
                .tick(app.tick);
            frame.render_widget(view, area);
        })?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Tick => {
                    app.tick();
                }
                Event::Key(_) | Event::Mouse(_) | Event::Resize(_, _) => {}
            }
        }

        // Replies may land between ticks
        app.controller.pump();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
