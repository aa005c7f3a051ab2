//! Test doubles for the chat transport.
//!
//! Enabled for this crate's tests and, via the `test-utils` feature, for
//! downstream crates.

use crate::bridge::{Credential, HostBridge, HostEnvelope, OriginPolicy};
use crate::client::{ChatReply, ChatRequest, ChatTransport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Origin used by test bridges.
pub const TEST_ORIGIN: &str = "local";

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub request: ChatRequest,
    pub api_key: String,
}

/// Transport answering from a queue of canned outcomes.
///
/// When gated, each call waits for [`ScriptedTransport::release`] before
/// answering, so tests can observe the in-flight state.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedTransport {
    /// Create a transport with no queued outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose calls block until released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    /// Queue a successful reply.
    #[must_use]
    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(ChatReply::text(text)))
    }

    /// Queue a successful response with no `reply` field.
    #[must_use]
    pub fn empty_reply(self) -> Self {
        self.push(Ok(ChatReply::default()))
    }

    /// Queue a failure.
    #[must_use]
    pub fn fail(self, error: TransportError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<ChatReply, TransportError>) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
        self
    }

    /// Let one gated call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, TransportError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                request: request.clone(),
                api_key: credential.expose().to_string(),
            });
        }

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or_else(|| Err(TransportError::Request("no scripted outcome".into())))
    }
}

/// A bridge trusting [`TEST_ORIGIN`].
pub fn test_bridge() -> HostBridge {
    HostBridge::new(OriginPolicy::new([TEST_ORIGIN]))
}

/// Deliver `token` through `bridge` as the host would.
pub fn deliver_token(bridge: &HostBridge, token: &str) {
    bridge.accept(&HostEnvelope::token(TEST_ORIGIN, token));
}
