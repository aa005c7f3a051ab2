//! The chat widget: launcher when closed, panel when open.
//!
//! ```text
//!                          ┌─ AI Assistant ───────────────┐
//!                          │Assistant: Hello! How can I   │
//!                          │           help you today?    │
//!                          │                              │
//!                          │You: hello                    │
//!                          │                              │
//!                          │Assistant: ● ● ●              │
//!                          │Cannot connect to the chat... │
//!                          │┌────────────────────────────┐│
//!                          ││> █Type a message...        ││
//!                          │└─────────────Enter to send ─┘│
//!                          └──────────────────────────────┘
//! ```

use chatdock_engine::{ChatTransport, ConversationController};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use unicode_width::UnicodeWidthStr;

use super::input_bar::{InputBar, INPUT_HEIGHT};
use super::launcher::Launcher;
use super::transcript::{transcript_lines, typing_line};
use crate::theme::Theme;

/// Preferred panel size on a roomy terminal.
const PANEL_WIDTH: u16 = 50;
const PANEL_HEIGHT: u16 = 24;

/// Below this size the panel takes the whole terminal.
const COMPACT_WIDTH: u16 = 60;
const COMPACT_HEIGHT: u16 = 20;

/// Maximum lines given to the error banner.
const MAX_BANNER_HEIGHT: u16 = 3;

/// Area the open panel occupies within `area`.
pub fn panel_rect(area: Rect) -> Rect {
    if area.width < COMPACT_WIDTH || area.height < COMPACT_HEIGHT {
        return area;
    }
    let width = PANEL_WIDTH;
    let height = PANEL_HEIGHT.min(area.height * 4 / 5);
    Rect::new(
        area.x + area.width - width - 2,
        area.y + area.height - height - 1,
        width,
        height,
    )
}

/// Whole widget view over a controller.
pub struct ChatView<'a, T: ChatTransport + 'static> {
    controller: &'a ConversationController<T>,
    theme: &'a Theme,
    title: &'a str,
    tick: usize,
}

impl<'a, T: ChatTransport + 'static> ChatView<'a, T> {
    /// Create a new view.
    pub fn new(controller: &'a ConversationController<T>, theme: &'a Theme) -> Self {
        Self {
            controller,
            theme,
            title: "AI Assistant",
            tick: 0,
        }
    }

    /// Set the panel title.
    #[must_use]
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    /// Set the animation tick.
    #[must_use]
    pub fn tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }

    fn render_transcript(&self, area: Rect, buf: &mut Buffer) {
        let mut lines = transcript_lines(self.controller.messages(), area.width as usize, self.theme);
        if self.controller.is_sending() {
            lines.push(Line::default());
            lines.push(typing_line(self.tick, self.theme));
        }

        // Keep the newest lines visible
        let overflow = lines.len().saturating_sub(area.height as usize);
        let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);

        Paragraph::new(lines)
            .style(Style::default().bg(self.theme.base))
            .scroll((scroll, 0))
            .render(area, buf);
    }

    fn banner_height(&self, width: u16) -> u16 {
        let Some(error) = self.controller.error() else {
            return 0;
        };
        if width == 0 {
            return 1;
        }
        let lines = error.width().div_ceil(width as usize);
        u16::try_from(lines).unwrap_or(MAX_BANNER_HEIGHT).clamp(1, MAX_BANNER_HEIGHT)
    }

    fn render_panel(&self, area: Rect, buf: &mut Buffer) {
        let panel = panel_rect(area);
        Clear.render(panel, buf);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused))
            .style(Style::default().bg(self.theme.base));
        let inner = block.inner(panel);
        block.render(panel, buf);

        let input_height = INPUT_HEIGHT.min(inner.height);
        let banner_height = self
            .banner_height(inner.width)
            .min(inner.height - input_height);
        let transcript_height = inner.height - input_height - banner_height;

        let transcript_area = Rect::new(inner.x, inner.y, inner.width, transcript_height);
        let banner_area = Rect::new(inner.x, inner.y + transcript_height, inner.width, banner_height);
        let input_area = Rect::new(
            inner.x,
            inner.y + transcript_height + banner_height,
            inner.width,
            input_height,
        );

        self.render_transcript(transcript_area, buf);

        if let Some(error) = self.controller.error() {
            Paragraph::new(error.to_string())
                .style(self.theme.banner())
                .wrap(Wrap { trim: true })
                .render(banner_area, buf);
        }

        InputBar::new(self.controller.input(), self.theme)
            .placeholder(self.controller.placeholder())
            .enabled(self.controller.input_enabled())
            .send_enabled(self.controller.send_enabled())
            .sending(self.controller.is_sending())
            .render(input_area, buf);
    }
}

impl<T: ChatTransport + 'static> Widget for ChatView<'_, T> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.controller.is_open() {
            self.render_panel(area, buf);
        } else {
            Launcher::new(self.theme).render(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, render_app_to_string, type_text};
    use chatdock_engine::testing::{deliver_token, ScriptedTransport};
    use chatdock_engine::MISSING_CREDENTIAL_MESSAGE;

    #[test]
    fn test_panel_rect_roomy_terminal() {
        let rect = panel_rect(Rect::new(0, 0, 120, 40));
        assert_eq!(rect, Rect::new(68, 15, 50, 24));
    }

    #[test]
    fn test_panel_rect_compact_terminal_is_fullscreen() {
        let area = Rect::new(0, 0, 50, 30);
        assert_eq!(panel_rect(area), area);
    }

    #[test]
    fn test_open_panel_shows_title_greeting_and_placeholder() {
        let (app, _bridge, _) = create_test_app(ScriptedTransport::new());
        let out = render_app_to_string(&app);

        assert!(out.contains("AI Assistant"));
        assert!(out.contains("Assistant: Hello!"));
        assert!(out.contains("Initializing chat..."));
    }

    #[test]
    fn test_closed_panel_shows_launcher_only() {
        let (mut app, _bridge, _) = create_test_app(ScriptedTransport::new());
        app.controller.close();
        let out = render_app_to_string(&app);

        assert!(out.contains("AI"));
        assert!(!out.contains("Assistant"));
    }

    #[test]
    fn test_banner_rendered_on_missing_credential() {
        let (mut app, _bridge, _) = create_test_app(ScriptedTransport::new());
        let _ = app.controller.begin_send();
        let out = render_app_to_string(&app);

        assert_eq!(app.controller.error(), Some(MISSING_CREDENTIAL_MESSAGE));
        assert!(out.contains("Chat service is not"));
    }

    #[tokio::test]
    async fn test_typing_indicator_while_sending() {
        let (mut app, bridge, _transport) = create_test_app(ScriptedTransport::gated().reply("hi"));
        deliver_token(&bridge, "abc");
        type_text(&mut app, "hello");
        app.controller.dispatch().unwrap();

        let out = render_app_to_string(&app);

        assert!(out.contains("You: hello"));
        assert!(out.contains("● ● ●"));
        assert!(out.contains("Waiting for reply"));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let (app, _bridge, _) = create_test_app(ScriptedTransport::new());
        let area = Rect::new(0, 0, 10, 2);
        let mut buffer = Buffer::empty(area);
        ChatView::new(&app.controller, &Theme::default()).render(area, &mut buffer);
    }
}
