//! Launcher badge shown in the bottom-right corner while the panel is closed.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

const LAUNCHER_WIDTH: u16 = 8;
const LAUNCHER_HEIGHT: u16 = 3;
const MARGIN_X: u16 = 2;
const MARGIN_Y: u16 = 1;

/// Area the launcher occupies within `area`.
pub fn launcher_rect(area: Rect) -> Rect {
    let width = LAUNCHER_WIDTH.min(area.width);
    let height = LAUNCHER_HEIGHT.min(area.height);
    let x = area.x + area.width.saturating_sub(width + MARGIN_X);
    let y = area.y + area.height.saturating_sub(height + MARGIN_Y);
    Rect::new(x, y, width, height)
}

/// Round badge that opens the chat panel.
pub struct Launcher<'a> {
    theme: &'a Theme,
}

impl<'a> Launcher<'a> {
    /// Create a new launcher widget.
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme }
    }
}

impl Widget for Launcher<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rect = launcher_rect(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.primary))
            .style(Style::default().bg(self.theme.base));

        Paragraph::new("AI")
            .centered()
            .style(
                Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD),
            )
            .block(block)
            .render(rect, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launcher_anchored_bottom_right() {
        let rect = launcher_rect(Rect::new(0, 0, 80, 24));
        assert_eq!(rect, Rect::new(70, 20, 8, 3));
    }

    #[test]
    fn test_launcher_fits_tiny_area() {
        let rect = launcher_rect(Rect::new(0, 0, 4, 2));
        assert_eq!(rect.width, 4);
        assert_eq!(rect.height, 2);
        assert_eq!((rect.x, rect.y), (0, 0));
    }
}
