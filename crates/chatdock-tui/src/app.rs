//! Application state and update logic for the chatdock TUI.

use crate::event::{key_to_action, Action};
use chatdock_engine::{ChatTransport, ConversationController, InputBuffer, Settlement};
use crossterm::event::KeyEvent;
use tracing::debug;

/// Application state.
pub struct App<T: ChatTransport + 'static> {
    /// The widget's conversation state.
    pub controller: ConversationController<T>,

    /// Panel title.
    pub title: String,

    /// Whether the app should quit.
    pub should_quit: bool,

    /// Tick counter for animations.
    pub tick: usize,
}

impl<T: ChatTransport + 'static> App<T> {
    /// Create a new app around a mounted controller.
    pub fn new(controller: ConversationController<T>, title: impl Into<String>) -> Self {
        Self {
            controller,
            title: title.into(),
            should_quit: false,
            tick: 0,
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let action = key_to_action(key, self.controller.is_open());
        self.handle_action(action);
    }

    /// Apply an action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePanel => self.controller.toggle(),
            Action::ClosePanel => self.controller.close(),
            Action::Submit => {
                if let Err(rejection) = self.controller.dispatch() {
                    debug!(%rejection, "Submit rejected");
                }
            }
            Action::Insert(c) => self.edit(|input| input.insert(c)),
            Action::Backspace => self.edit(InputBuffer::backspace),
            Action::Delete => self.edit(InputBuffer::delete),
            Action::Left => self.edit(InputBuffer::move_left),
            Action::Right => self.edit(InputBuffer::move_right),
            Action::Home => self.edit(InputBuffer::move_home),
            Action::End => self.edit(InputBuffer::move_end),
            Action::None => {}
        }
    }

    fn edit(&mut self, f: impl FnOnce(&mut InputBuffer)) {
        if let Some(input) = self.controller.edit_input() {
            f(input);
        }
    }

    /// Advance animations and apply finished sends.
    pub fn tick(&mut self) -> Vec<Settlement> {
        self.tick = self.tick.wrapping_add(1);
        self.controller.pump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, type_text};
    use chatdock_engine::testing::{deliver_token, ScriptedTransport};
    use chatdock_engine::{Sender, DEFAULT_GREETING};
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;

    #[tokio::test]
    async fn test_typing_and_submitting_dispatches() {
        let (mut app, bridge, transport) = create_test_app(ScriptedTransport::new().reply("hi"));
        deliver_token(&bridge, "abc");

        type_text(&mut app, "hello");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(app.controller.is_sending());
        let settlement = tokio::time::timeout(
            Duration::from_secs(1),
            app.controller.next_settlement(),
        )
        .await
        .unwrap();

        assert_eq!(settlement, Some(Settlement::Replied("hi".into())));
        let texts: Vec<_> = app
            .controller
            .messages()
            .iter()
            .map(|m| (m.sender, m.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (Sender::Assistant, DEFAULT_GREETING),
                (Sender::User, "hello"),
                (Sender::Assistant, "hi"),
            ]
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_typing_ignored_without_credential() {
        let (mut app, _bridge, _) = create_test_app(ScriptedTransport::new());
        type_text(&mut app, "hello");
        assert!(app.controller.input().is_empty());
    }

    #[test]
    fn test_submit_without_credential_shows_banner() {
        let (mut app, _bridge, transport) = create_test_app(ScriptedTransport::new());
        app.handle_action(Action::Submit);
        assert!(app.controller.error().is_some());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_escape_closes_then_quits() {
        let (mut app, _bridge, _) = create_test_app(ScriptedTransport::new());
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);

        app.handle_key(esc);
        assert!(!app.controller.is_open());
        assert!(!app.should_quit);

        app.handle_key(esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_editing_keys() {
        let (mut app, bridge, _) = create_test_app(ScriptedTransport::new());
        deliver_token(&bridge, "abc");
        type_text(&mut app, "helo");
        app.handle_action(Action::Left);
        app.handle_action(Action::Insert('l'));
        app.handle_action(Action::End);
        app.handle_action(Action::Backspace);
        assert_eq!(app.controller.input().content(), "hell");
    }
}
