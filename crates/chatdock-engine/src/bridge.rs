//! Host bridge: receives the tenant credential from the embedding context.
//!
//! The widget never initiates contact with its host. The host posts
//! [`HostEnvelope`]s through a [`HostPort`]; the bridge checks the envelope's
//! origin against an [`OriginPolicy`], extracts the `token` field and
//! publishes it to every controller watching the credential channel.
//!
//! The subscription is a scoped resource: [`HostBridge::attach`] spawns the
//! listener task and returns a [`BridgeGuard`] that tears it down on drop.

use serde::Deserialize;
use std::fmt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Allow-list entry that trusts every origin.
pub const ANY_ORIGIN: &str = "*";

/// Bearer-style tenant key authorizing outbound requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw key. Returns `None` for an empty key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// The raw key, for attaching to a request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Receiving side of the credential channel, held by controllers.
pub type CredentialReceiver = watch::Receiver<Option<Credential>>;

/// A cross-context message posted by the host.
#[derive(Debug, Clone)]
pub struct HostEnvelope {
    /// Origin the host claims to be posting from.
    pub origin: String,
    /// Arbitrary payload. Only `{ "token": string }` is understood.
    pub data: serde_json::Value,
}

impl HostEnvelope {
    /// Build an envelope carrying a credential payload.
    pub fn token(origin: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: serde_json::json!({ "token": token.into() }),
        }
    }
}

/// Payload shape the bridge understands.
#[derive(Debug, Deserialize)]
struct CredentialPayload {
    token: String,
    #[serde(default)]
    apikey: Option<String>,
}

/// Origins whose envelopes the bridge will read.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Build a policy from an allow-list. An empty list trusts nobody.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Policy trusting every origin.
    pub fn any() -> Self {
        Self::new([ANY_ORIGIN])
    }

    /// Whether envelopes from `origin` may be read.
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed
            .iter()
            .any(|allowed| allowed == ANY_ORIGIN || allowed == origin)
    }
}

/// What the bridge did with an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The token was stored as the active credential.
    Accepted,
    /// The origin is not on the allow-list; payload not read.
    DisallowedOrigin,
    /// The payload lacked a non-empty string `token`.
    Malformed,
}

/// Sending half of the host channel, handed to whatever embeds the widget.
#[derive(Debug, Clone)]
pub struct HostPort {
    tx: mpsc::UnboundedSender<HostEnvelope>,
}

impl HostPort {
    /// Post an envelope to the widget.
    ///
    /// Returns `false` if the bridge has been torn down.
    pub fn post(&self, envelope: HostEnvelope) -> bool {
        self.tx.send(envelope).is_ok()
    }
}

/// Create a host channel: the port for the host, the inbox for the bridge.
pub fn host_channel() -> (HostPort, mpsc::UnboundedReceiver<HostEnvelope>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HostPort { tx }, rx)
}

/// Stores credentials received from the host.
#[derive(Debug)]
pub struct HostBridge {
    policy: OriginPolicy,
    credential_tx: watch::Sender<Option<Credential>>,
}

impl HostBridge {
    /// Create a bridge with no credential yet.
    pub fn new(policy: OriginPolicy) -> Self {
        let (credential_tx, _) = watch::channel(None);
        Self {
            policy,
            credential_tx,
        }
    }

    /// Watch the active credential.
    pub fn subscribe(&self) -> CredentialReceiver {
        self.credential_tx.subscribe()
    }

    /// Whether a credential has been received.
    pub fn has_credential(&self) -> bool {
        self.credential_tx.borrow().is_some()
    }

    /// Handle one envelope from the host.
    pub fn accept(&self, envelope: &HostEnvelope) -> BridgeOutcome {
        if !self.policy.allows(&envelope.origin) {
            warn!(origin = %envelope.origin, "Ignoring host message from disallowed origin");
            return BridgeOutcome::DisallowedOrigin;
        }

        let payload = match serde_json::from_value::<CredentialPayload>(envelope.data.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(origin = %envelope.origin, error = %e, "Ignoring malformed host message");
                return BridgeOutcome::Malformed;
            }
        };

        let Some(credential) = Credential::new(payload.token) else {
            debug!(origin = %envelope.origin, "Ignoring host message with empty token");
            return BridgeOutcome::Malformed;
        };

        info!(
            origin = %envelope.origin,
            has_apikey = payload.apikey.is_some(),
            "Received credential from host"
        );
        self.credential_tx.send_replace(Some(credential));
        BridgeOutcome::Accepted
    }

    /// Listen for envelopes until the host port closes or the guard drops.
    pub fn attach(self, mut inbox: mpsc::UnboundedReceiver<HostEnvelope>) -> BridgeGuard {
        let handle = tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                self.accept(&envelope);
            }
            debug!("Host port closed; bridge listener exiting");
        });
        BridgeGuard { handle }
    }
}

/// Keeps the bridge listener alive. Dropping it removes the subscription.
#[derive(Debug)]
pub struct BridgeGuard {
    handle: JoinHandle<()>,
}

impl Drop for BridgeGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
