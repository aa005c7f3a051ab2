//! Test utilities for chatdock-tui rendering and interaction tests.

use crate::app::App;
use crate::theme::Theme;
use crate::widgets::ChatView;
use chatdock_engine::testing::{test_bridge, ScriptedTransport};
use chatdock_engine::{ControllerOptions, ConversationController, HostBridge, DEFAULT_GREETING};
use ratatui::{backend::TestBackend, buffer::Buffer, layout::Rect, widgets::Widget, Terminal};
use std::sync::Arc;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Create a test terminal with the default dimensions (80x24).
pub fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(TEST_WIDTH, TEST_HEIGHT);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Create an app with the panel open and no credential yet.
///
/// Returns the bridge so the test can deliver a credential, and the
/// transport so it can inspect requests.
pub fn create_test_app(
    transport: ScriptedTransport,
) -> (App<ScriptedTransport>, HostBridge, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let bridge = test_bridge();
    let controller = ConversationController::new(
        Arc::clone(&transport),
        bridge.subscribe(),
        ControllerOptions {
            greeting: DEFAULT_GREETING.into(),
            open_on_mount: true,
        },
    );
    (App::new(controller, "AI Assistant"), bridge, transport)
}

/// Feed `text` to the app one character at a time.
pub fn type_text(app: &mut App<ScriptedTransport>, text: &str) {
    for c in text.chars() {
        app.handle_action(crate::event::Action::Insert(c));
    }
}

/// Convert a buffer to a string, one line per row, trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Render the whole widget at the default size and return it as a string.
pub fn render_app_to_string(app: &App<ScriptedTransport>) -> String {
    let area = Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT);
    let mut buffer = Buffer::empty(area);
    let theme = Theme::default();
    ChatView::new(&app.controller, &theme)
        .title(&app.title)
        .tick(app.tick)
        .render(area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_terminal() {
        let terminal = create_test_terminal();
        let size = terminal.size().unwrap();
        assert_eq!(size.width, TEST_WIDTH);
        assert_eq!(size.height, TEST_HEIGHT);
    }

    #[test]
    fn test_create_test_app() {
        let (app, bridge, _) = create_test_app(ScriptedTransport::new());
        assert!(app.controller.is_open());
        assert!(!bridge.has_credential());
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        let result = buffer_to_string(&buffer);
        assert_eq!(result, "Hello\nWorld\n");
    }
}
