//! Conversation controller.
//!
//! Owns the widget's panel visibility, transcript, input buffer and the
//! lifecycle of a single send:
//!
//! ```text
//! Idle --submit--> Validating --ok--> InFlight --reply/error--> Settled --> Idle
//!                      |
//!                      +--rejected--> Idle
//! ```
//!
//! At most one send is in flight per controller. A dispatched send runs as a
//! task owned by the controller; closing the panel or dropping the controller
//! aborts it, and any completion that still arrives is discarded as stale.

use crate::bridge::{Credential, CredentialReceiver};
use crate::client::{ChatReply, ChatRequest, ChatTransport, FailureKind, TransportError};
use crate::config::WidgetConfig;
use crate::input::InputBuffer;
use crate::message::{Message, DEFAULT_GREETING};
use crate::session::SessionId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Banner shown when the user submits before the host supplied a credential.
pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Chat service is not available. Please wait or refresh.";

/// Reply substituted when the backend answers without a usable `reply`.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered a problem responding.";

/// Input placeholder while waiting for a credential.
pub const PLACEHOLDER_WAITING: &str = "Initializing chat...";

/// Input placeholder once sending is possible.
pub const PLACEHOLDER_READY: &str = "Type a message...";

/// Per-instance options, usually derived from [`WidgetConfig`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Assistant greeting seeded on open.
    pub greeting: String,
    /// Whether the panel opens during construction.
    pub open_on_mount: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.into(),
            open_on_mount: false,
        }
    }
}

impl From<&WidgetConfig> for ControllerOptions {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            greeting: config.greeting.clone(),
            open_on_mount: config.open_on_mount,
        }
    }
}

/// Identifies one send so its completion can be matched to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTicket(u64);

/// Everything needed to perform one validated send.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub ticket: SendTicket,
    pub request: ChatRequest,
    pub credential: Credential,
}

/// Why a submit did not start a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Trimmed input was empty.
    #[error("Nothing to send")]
    EmptyInput,

    /// A send is already in flight.
    #[error("A message is already being sent")]
    AlreadySending,

    /// The host has not supplied a credential yet.
    #[error("No credential received from host")]
    MissingCredential,

    /// The panel is closed.
    #[error("Chat panel is closed")]
    PanelClosed,
}

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// An assistant reply (or the fallback) was appended.
    Replied(String),
    /// The failure copy for this kind was appended and shown in the banner.
    Failed(FailureKind),
    /// The send was abandoned (panel closed) and its result discarded.
    Stale,
}

struct Completion {
    ticket: SendTicket,
    outcome: Result<ChatReply, TransportError>,
}

/// What woke a waiting [`ConversationController::next_settlement`].
enum Wake {
    Reported(Completion),
    Ended,
}

/// State machine for one widget instance.
pub struct ConversationController<T: ChatTransport + 'static> {
    transport: Arc<T>,
    credentials: CredentialReceiver,
    session_id: SessionId,
    greeting: String,

    panel_open: bool,
    messages: Vec<Message>,
    input: InputBuffer,
    sending: bool,
    error: Option<String>,

    next_ticket: u64,
    pending: Option<SendTicket>,
    in_flight: Option<JoinHandle<()>>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<T: ChatTransport + 'static> ConversationController<T> {
    /// Mount a controller: generates the session identifier and, if
    /// configured, opens the panel.
    pub fn new(transport: Arc<T>, credentials: CredentialReceiver, options: ControllerOptions) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let session_id = SessionId::generate();
        debug!(session = %session_id, "Mounted chat controller");

        let mut controller = Self {
            transport,
            credentials,
            session_id,
            greeting: options.greeting,
            panel_open: false,
            messages: Vec::new(),
            input: InputBuffer::new(),
            sending: false,
            error: None,
            next_ticket: 0,
            pending: None,
            in_flight: None,
            completion_tx,
            completion_rx,
        };
        if options.open_on_mount {
            controller.open();
        }
        controller
    }

    // === Visibility ===

    /// Open the panel, seeding the transcript with the greeting.
    pub fn open(&mut self) {
        if self.panel_open {
            return;
        }
        self.panel_open = true;
        self.messages = vec![Message::assistant(self.greeting.clone())];
        self.error = None;
        info!(session = %self.session_id, "Chat panel opened");
    }

    /// Close the panel, discarding all per-panel state.
    ///
    /// Session identifier and credential survive. A send still in flight is
    /// aborted and its result will be ignored.
    pub fn close(&mut self) {
        if !self.panel_open {
            return;
        }
        self.panel_open = false;
        self.messages.clear();
        self.error = None;
        self.input.clear();
        self.sending = false;
        self.pending = None;
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
            debug!(session = %self.session_id, "Aborted in-flight send on close");
        }
        info!(session = %self.session_id, "Chat panel closed");
    }

    /// Open if closed, close if open.
    pub fn toggle(&mut self) {
        if self.panel_open {
            self.close();
        } else {
            self.open();
        }
    }

    // === Input ===

    /// Mutable access to the input buffer, if the input is enabled.
    pub fn edit_input(&mut self) -> Option<&mut InputBuffer> {
        if self.panel_open && self.input_enabled() {
            Some(&mut self.input)
        } else {
            None
        }
    }

    /// Replace the input text. Returns `false` if the input is disabled.
    pub fn set_input(&mut self, text: impl Into<String>) -> bool {
        match self.edit_input() {
            Some(input) => {
                input.set(text);
                true
            }
            None => false,
        }
    }

    // === Sending ===

    /// Validate the current input and move to the in-flight state.
    ///
    /// On success the user message is already in the transcript and the
    /// caller must deliver the returned request and pass the outcome to
    /// [`settle`](Self::settle).
    pub fn begin_send(&mut self) -> Result<OutboundRequest, Rejection> {
        if !self.panel_open {
            return Err(Rejection::PanelClosed);
        }
        let Some(credential) = self.credential() else {
            self.error = Some(MISSING_CREDENTIAL_MESSAGE.into());
            return Err(Rejection::MissingCredential);
        };
        if self.sending {
            return Err(Rejection::AlreadySending);
        }
        let text = self.input.trimmed().to_string();
        if text.is_empty() {
            return Err(Rejection::EmptyInput);
        }

        self.sending = true;
        self.error = None;
        self.messages.push(Message::user(text.clone()));
        self.input.clear();

        let ticket = SendTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);

        debug!(session = %self.session_id, chars = text.chars().count(), "Sending message");
        Ok(OutboundRequest {
            ticket,
            request: ChatRequest::new(&self.session_id, text),
            credential,
        })
    }

    /// Apply the outcome of a send and return to idle.
    pub fn settle(
        &mut self,
        ticket: SendTicket,
        outcome: Result<ChatReply, TransportError>,
    ) -> Settlement {
        if self.pending != Some(ticket) {
            debug!(session = %self.session_id, "Discarding stale send result");
            return Settlement::Stale;
        }
        self.pending = None;
        self.in_flight = None;
        self.sending = false;

        match outcome {
            Ok(reply) => {
                let text = reply.reply_text().unwrap_or(FALLBACK_REPLY).to_string();
                self.messages.push(Message::assistant(text.clone()));
                Settlement::Replied(text)
            }
            Err(e) => {
                let kind = e.kind();
                warn!(session = %self.session_id, error = %e, "Failed to send chat message");
                let text = kind.user_message();
                self.error = Some(text.to_string());
                self.messages.push(Message::assistant(text));
                Settlement::Failed(kind)
            }
        }
    }

    /// Validate, deliver and settle one message inline.
    pub async fn submit(&mut self) -> Result<Settlement, Rejection> {
        let outbound = self.begin_send()?;
        let outcome = self
            .transport
            .send(&outbound.request, &outbound.credential)
            .await;
        Ok(self.settle(outbound.ticket, outcome))
    }

    /// Validate and deliver one message in a background task.
    ///
    /// The result is applied by [`pump`](Self::pump) or
    /// [`next_settlement`](Self::next_settlement).
    pub fn dispatch(&mut self) -> Result<SendTicket, Rejection> {
        let OutboundRequest {
            ticket,
            request,
            credential,
        } = self.begin_send()?;

        let transport = Arc::clone(&self.transport);
        let tx = self.completion_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = transport.send(&request, &credential).await;
            let _ = tx.send(Completion { ticket, outcome });
        }));
        Ok(ticket)
    }

    /// Apply every dispatched result that has arrived, without waiting.
    ///
    /// A send task that ended without reporting (it panicked or was
    /// cancelled) settles as a generic failure.
    pub fn pump(&mut self) -> Vec<Settlement> {
        // Sample before draining: a finished task has already reported
        let task_ended = self.in_flight.as_ref().is_some_and(JoinHandle::is_finished);

        let mut settled = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            settled.push(self.settle(completion.ticket, completion.outcome));
        }
        if task_ended && self.pending.is_some() {
            settled.push(self.fail_pending());
        }
        settled
    }

    /// Wait for the dispatched send to settle.
    ///
    /// Returns `None` immediately if nothing was dispatched. A send started
    /// with [`begin_send`](Self::begin_send) must be settled by its caller.
    pub async fn next_settlement(&mut self) -> Option<Settlement> {
        while self.pending.is_some() {
            let handle = self.in_flight.as_mut()?;
            let wake = tokio::select! {
                biased;
                completion = self.completion_rx.recv() => Wake::Reported(completion?),
                joined = handle => {
                    if let Err(e) = joined {
                        debug!(error = %e, "Send task ended abnormally");
                    }
                    Wake::Ended
                }
            };

            let settlement = match wake {
                Wake::Reported(completion) => self.settle(completion.ticket, completion.outcome),
                Wake::Ended => {
                    self.in_flight = None;
                    while let Ok(completion) = self.completion_rx.try_recv() {
                        match self.settle(completion.ticket, completion.outcome) {
                            Settlement::Stale => {}
                            settlement => return Some(settlement),
                        }
                    }
                    self.fail_pending()
                }
            };
            if settlement != Settlement::Stale {
                return Some(settlement);
            }
        }
        None
    }

    /// Settle the pending send whose task is gone without a result.
    fn fail_pending(&mut self) -> Settlement {
        let Some(ticket) = self.pending else {
            return Settlement::Stale;
        };
        let error = TransportError::Request("send task ended without a result".into());
        self.settle(ticket, Err(error))
    }

    // === Accessors ===

    fn credential(&self) -> Option<Credential> {
        self.credentials.borrow().clone()
    }

    /// Transcript in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current error banner.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current input buffer.
    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Whether a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Whether the panel is open.
    pub fn is_open(&self) -> bool {
        self.panel_open
    }

    /// Session identifier, fixed for the controller's lifetime.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether the host has supplied a credential.
    pub fn has_credential(&self) -> bool {
        self.credentials.borrow().is_some()
    }

    /// Whether the input accepts edits.
    pub fn input_enabled(&self) -> bool {
        !self.sending && self.has_credential()
    }

    /// Whether the send affordance is active.
    pub fn send_enabled(&self) -> bool {
        self.input_enabled() && !self.input.trimmed().is_empty()
    }

    /// Placeholder text for an empty input.
    pub fn placeholder(&self) -> &'static str {
        if self.has_credential() {
            PLACEHOLDER_READY
        } else {
            PLACEHOLDER_WAITING
        }
    }
}

impl<T: ChatTransport + 'static> Drop for ConversationController<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
