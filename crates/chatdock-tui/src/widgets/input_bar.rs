//! Input footer of the chat panel.
//!
//! Shows the input text with a cursor, the placeholder when empty, or a
//! waiting indicator while a send is in flight. The bottom border carries
//! the send hint, dimmed when sending is not possible.

use chatdock_engine::InputBuffer;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Height of the input bar including borders.
pub const INPUT_HEIGHT: u16 = 3;

/// Input bar for the chat panel.
pub struct InputBar<'a> {
    input: &'a InputBuffer,
    theme: &'a Theme,
    placeholder: &'a str,
    enabled: bool,
    send_enabled: bool,
    sending: bool,
}

impl<'a> InputBar<'a> {
    /// Create a new input bar widget.
    pub fn new(input: &'a InputBuffer, theme: &'a Theme) -> Self {
        Self {
            input,
            theme,
            placeholder: "",
            enabled: true,
            send_enabled: false,
            sending: false,
        }
    }

    /// Set the placeholder shown when the input is empty.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Set whether the input accepts edits.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set whether the send hint is active.
    #[must_use]
    pub fn send_enabled(mut self, send_enabled: bool) -> Self {
        self.send_enabled = send_enabled;
        self
    }

    /// Set whether a reply is pending.
    #[must_use]
    pub fn sending(mut self, sending: bool) -> Self {
        self.sending = sending;
        self
    }

    /// Build the input line with a block cursor.
    fn input_line(&self) -> Line<'static> {
        let prompt = Span::styled("> ", Style::default().fg(self.theme.primary));

        if self.input.is_empty() {
            let mut spans = vec![prompt];
            if self.enabled {
                spans.push(Span::styled("█", self.theme.body()));
            }
            spans.push(Span::styled(self.placeholder.to_string(), self.theme.dim()));
            return Line::from(spans);
        }

        let chars: Vec<char> = self.input.content().chars().collect();
        let cursor = self.input.cursor().min(chars.len());
        let before: String = chars[..cursor].iter().collect();
        let after: String = chars[cursor..].iter().collect();

        let mut spans = vec![prompt, Span::styled(before, self.theme.body())];
        if self.enabled {
            spans.push(Span::styled("█", self.theme.body()));
        }
        spans.push(Span::styled(after, self.theme.body()));
        Line::from(spans)
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.enabled {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };
        let hint_style = if self.send_enabled {
            Style::default().fg(self.theme.primary)
        } else {
            self.theme.dim()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_bottom(Line::from(Span::styled(" Enter to send ", hint_style)).right_aligned());

        let paragraph = if self.sending {
            Paragraph::new("● Waiting for reply...")
                .block(block)
                .style(self.theme.dim())
        } else {
            Paragraph::new(self.input_line()).block(block)
        };

        paragraph.render(area, buf);
    }
}
