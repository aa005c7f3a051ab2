//! Transcript rendering.
//!
//! Each message becomes one or more lines: a sender label followed by the
//! text, wrapped to the pane width with continuation lines indented under
//! the text. The first line carries the local send time, right-aligned, when
//! there is room for it.

use chatdock_engine::{Message, Sender};
use chrono::{DateTime, Local, Utc};
use ratatui::text::{Line, Span};
use textwrap::{Options, WrapAlgorithm};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Label prefixed to user messages.
pub const USER_LABEL: &str = "You: ";

/// Label prefixed to assistant messages.
pub const ASSISTANT_LABEL: &str = "Assistant: ";

fn label_for(sender: Sender) -> &'static str {
    match sender {
        Sender::User => USER_LABEL,
        Sender::Assistant => ASSISTANT_LABEL,
    }
}

/// Send time as shown next to a message.
pub fn format_sent_at(sent_at: DateTime<Utc>) -> String {
    sent_at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Wrap one message, label included, to `width` columns.
pub fn wrap_message(message: &Message, width: usize) -> Vec<String> {
    let label = label_for(message.sender);

    // Too narrow to indent under the label
    if width <= label.len() + 1 {
        return vec![format!("{label}{}", message.text)];
    }

    let indent = " ".repeat(label.len());
    let options = Options::new(width)
        .initial_indent(label)
        .subsequent_indent(&indent)
        .wrap_algorithm(WrapAlgorithm::FirstFit);

    textwrap::wrap(&message.text, options)
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Build styled lines for the whole transcript, one blank line between messages.
pub fn transcript_lines(messages: &[Message], width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }

        let label = label_for(message.sender);
        let label_style = match message.sender {
            Sender::User => theme.user_label(),
            Sender::Assistant => theme.assistant_label(),
        };

        for (j, text) in wrap_message(message, width).into_iter().enumerate() {
            let rest = if j == 0 {
                text.strip_prefix(label).map(str::to_string)
            } else {
                None
            };
            let Some(rest) = rest else {
                lines.push(Line::from(Span::styled(text, theme.body())));
                continue;
            };

            let mut spans = vec![Span::styled(label, label_style), Span::styled(rest, theme.body())];
            let stamp = format_sent_at(message.sent_at);
            let gap = width.saturating_sub(text.width() + stamp.width());
            if gap >= 1 {
                spans.push(Span::raw(" ".repeat(gap)));
                spans.push(Span::styled(stamp, theme.dim()));
            }
            lines.push(Line::from(spans));
        }
    }

    lines
}

/// Typing indicator shown while a reply is pending. One dot is lit per tick.
pub fn typing_line(tick: usize, theme: &Theme) -> Line<'static> {
    let lit = tick % 3;
    let mut spans = vec![Span::styled(ASSISTANT_LABEL, theme.assistant_label())];
    for i in 0..3 {
        let style = if i == lit {
            theme.assistant_label()
        } else {
            theme.dim()
        };
        spans.push(Span::styled("●", style));
        if i < 2 {
            spans.push(Span::raw(" "));
        }
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdock_engine::DEFAULT_GREETING;
    use chrono::TimeZone;
    use insta::assert_debug_snapshot;

    #[test]
    fn test_greeting_wraps_under_label() {
        let lines = wrap_message(&Message::assistant(DEFAULT_GREETING), 30);
        assert_debug_snapshot!(lines, @r###"
        [
            "Assistant: Hello! How can I",
            "           help you today?",
            "           Type a message",
            "           below.",
        ]
        "###);
    }

    #[test]
    fn test_short_user_message_is_one_line() {
        let lines = wrap_message(&Message::user("hello"), 30);
        assert_eq!(lines, vec!["You: hello".to_string()]);
    }

    #[test]
    fn test_narrow_width_does_not_wrap() {
        let lines = wrap_message(&Message::user("hello world"), 4);
        assert_eq!(lines, vec!["You: hello world".to_string()]);
    }

    #[test]
    fn test_transcript_separates_messages() {
        let theme = Theme::default();
        let messages = vec![Message::assistant("hi"), Message::user("hello")];
        let lines = transcript_lines(&messages, 40, &theme);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].width(), 0);
        assert!(lines[2].to_string().starts_with("You: hello "));
    }

    #[test]
    fn test_send_time_right_aligned_on_first_line() {
        let sent_at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 0).unwrap();
        let message = Message {
            sent_at,
            ..Message::user("hello")
        };
        let lines = transcript_lines(&[message], 40, &Theme::default());
        let rendered = lines[0].to_string();

        assert_eq!(lines[0].width(), 40);
        assert!(rendered.starts_with("You: hello"));
        assert!(rendered.ends_with(&format_sent_at(sent_at)));
    }

    #[test]
    fn test_send_time_dropped_when_line_is_full() {
        let message = Message::user("a message that fills");
        let lines = transcript_lines(&[message], 25, &Theme::default());

        assert_eq!(lines[0].to_string(), "You: a message that fills");
    }

    #[test]
    fn test_typing_line_has_three_dots() {
        let line = typing_line(4, &Theme::default());
        assert_eq!(line.to_string(), "Assistant: ● ● ●");
    }
}
