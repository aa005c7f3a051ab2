//! Outbound transport to the remote chat backend.
//!
//! The controller talks to the backend through the [`ChatTransport`] trait so
//! tests can script replies; [`HttpTransport`] is the production
//! implementation.

use crate::bridge::Credential;
use crate::config::WidgetConfig;
use crate::session::SessionId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Header carrying the tenant credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Body of the outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Session identifier of the sending widget.
    pub user_identifier: String,
    /// Trimmed user text.
    pub message: String,
}

impl ChatRequest {
    /// Build a request for one user message.
    pub fn new(session: &SessionId, message: impl Into<String>) -> Self {
        Self {
            user_identifier: session.as_str().to_string(),
            message: message.into(),
        }
    }
}

/// Body the backend answers with. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text, if the backend produced one.
    #[serde(default, deserialize_with = "lenient_string")]
    pub reply: Option<String>,
}

impl ChatReply {
    /// A reply carrying `text`.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
        }
    }

    /// The reply text, if present and non-empty.
    pub fn reply_text(&self) -> Option<&str> {
        self.reply.as_deref().filter(|text| !text.is_empty())
    }
}

/// Accept any JSON value for `reply`, keeping only strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Coarse classification of a failed exchange, used to pick user-facing copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The backend could not be reached at all.
    Unreachable,
    /// The backend answered with a non-success status.
    Api,
    /// Anything else: undecodable body, timeout, unexpected transport error.
    Other,
}

impl FailureKind {
    /// Message shown in the transcript and the error banner.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Unreachable => {
                "Cannot connect to the chat service. Please check your internet connection."
            }
            Self::Api => "There was a problem with the chat service. Please try again later.",
            Self::Other => "Sorry, I couldn't process your message. Please try again.",
        }
    }
}

/// Errors that can occur while exchanging a message with the backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("Failed to fetch: {0}")]
    Unreachable(String),

    /// Backend answered with a non-success status.
    #[error("API error: {status} {body}")]
    Api { status: u16, body: String },

    /// Response body was not the expected JSON.
    #[error("Failed to decode reply: {0}")]
    Decode(String),

    /// No response within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Any other transport failure.
    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Classify this error for user-facing copy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unreachable(_) => FailureKind::Unreachable,
            Self::Api { .. } => FailureKind::Api,
            Self::Decode(_) | Self::Timeout | Self::Request(_) => FailureKind::Other,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Unreachable(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Something that can deliver one user message and return the reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` authorized by `credential`.
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, TransportError>;
}

/// JSON-over-HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Create a transport from widget configuration.
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self::new(config.endpoint.clone(), config.request_timeout())
    }

    /// Endpoint this transport posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<ChatReply, TransportError> {
        debug!(endpoint = %self.endpoint, session = %request.user_identifier, "Sending chat message");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, credential.expose())
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential() -> Credential {
        Credential::new("abc").unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            user_identifier: "session-1".into(),
            message: "hello".into(),
        }
    }

    fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(format!("{}/widget/chat", server.uri()), None)
    }

    #[tokio::test]
    async fn test_posts_expected_headers_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/widget/chat"))
            .and(header("x-api-key", "abc"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "user_identifier": "session-1",
                "message": "hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": "hi"})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = transport(&server).send(&request(), &credential()).await.unwrap();
        assert_eq!(reply.reply_text(), Some("hi"));
    }

    #[tokio::test]
    async fn test_missing_reply_field_is_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"other": 1})))
            .mount(&server)
            .await;

        let reply = transport(&server).send(&request(), &credential()).await.unwrap();
        assert_eq!(reply.reply_text(), None);
    }

    #[tokio::test]
    async fn test_non_string_reply_is_treated_as_absent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": 7})))
            .mount(&server)
            .await;

        let reply = transport(&server).send(&request(), &credential()).await.unwrap();
        assert_eq!(reply.reply_text(), None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = transport(&server).send(&request(), &credential()).await.unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 500, .. }));
        assert_eq!(err.kind(), FailureKind::Api);
        assert!(err.to_string().starts_with("API error:"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_generic_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = transport(&server).send(&request(), &credential()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
        assert_eq!(err.kind(), FailureKind::Other);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind then drop a listener to get a port nobody is serving.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::new(format!("http://127.0.0.1:{port}/widget/chat"), None);
        let err = transport.send(&request(), &credential()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Unreachable);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"reply": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(
            format!("{}/widget/chat", server.uri()),
            Some(Duration::from_millis(100)),
        );
        let err = transport.send(&request(), &credential()).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout));
        assert_eq!(err.kind(), FailureKind::Other);
    }

    #[test]
    fn test_failure_copy() {
        assert!(FailureKind::Unreachable
            .user_message()
            .starts_with("Cannot connect"));
        assert!(FailureKind::Api.user_message().starts_with("There was a problem"));
        assert!(FailureKind::Other.user_message().starts_with("Sorry"));
    }
}
