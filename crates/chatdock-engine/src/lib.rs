//! chatdock-engine: Headless engine for the chatdock chat widget
//!
//! This crate provides the message-exchange core of the widget, including:
//! - Session identity and the transcript model
//! - The host bridge that receives the tenant credential
//! - The HTTP transport to the chat backend and failure classification
//! - The conversation controller driving the send lifecycle
//! - Widget configuration

pub mod bridge;
pub mod client;
pub mod config;
pub mod controller;
pub mod input;
pub mod message;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types
pub use bridge::{
    host_channel, BridgeGuard, BridgeOutcome, Credential, CredentialReceiver, HostBridge,
    HostEnvelope, HostPort, OriginPolicy,
};
pub use client::{ChatReply, ChatRequest, ChatTransport, FailureKind, HttpTransport, TransportError};
pub use config::{ConfigError, WidgetConfig};
pub use controller::{
    ControllerOptions, ConversationController, OutboundRequest, Rejection, SendTicket, Settlement,
    FALLBACK_REPLY, MISSING_CREDENTIAL_MESSAGE,
};
pub use input::InputBuffer;
pub use message::{Message, Sender, DEFAULT_GREETING};
pub use session::SessionId;
