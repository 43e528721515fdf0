//! Inference gateway port
//!
//! Defines the narrow contract to the external reasoning engine:
//! `generate(system, history) -> text` and `stream(...) -> text chunks`.

use async_trait::async_trait;
use panel_domain::StreamEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during inference gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

/// Role of a conversation message sent to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation history handed to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Gateway to the external inference engine.
///
/// The engine is a black box that accepts a system instruction plus a
/// conversation and returns (or streams) text. It is assumed to fail
/// occasionally with transport or timeout errors, which callers treat as
/// analyst-local failures, never fatal to a batch.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Send a conversation and get the complete response text.
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError>;

    /// Send a conversation and get a streaming response.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Completed` event, so non-streaming adapters work unchanged.
    async fn stream(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.generate(system, messages).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is dropped before this lands, that's fine
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }
}

/// Handle for receiving streaming events from an inference call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::RequestFailed(e));
                }
            }
        }
        // Channel closed without Completed - return what we have
        Ok(full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGateway;

    #[async_trait]
    impl InferenceGateway for EchoGateway {
        async fn generate(
            &self,
            _system: &str,
            messages: &[ChatMessage],
        ) -> Result<String, GatewayError> {
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn default_stream_falls_back_to_generate() {
        let gateway = EchoGateway;
        let handle = gateway
            .stream("system", &[ChatMessage::user("hello")])
            .await
            .unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn collect_text_concatenates_deltas() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("a".to_string())).await.unwrap();
        tx.send(StreamEvent::Delta("b".to_string())).await.unwrap();
        tx.send(StreamEvent::Completed("ignored".to_string()))
            .await
            .unwrap();
        drop(tx);
        let text = StreamHandle::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "ab");
    }
}
