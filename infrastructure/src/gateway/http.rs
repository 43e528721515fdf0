//! HTTP adapter for the inference gateway port.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. `generate` is a
//! plain request/response call; `stream` sets `stream: true` and decodes the
//! server-sent-event lines into [`StreamEvent`]s on a channel.

use async_trait::async_trait;
use futures::StreamExt;
use panel_application::{ChatMessage, GatewayError, InferenceGateway, Role, StreamHandle};
use panel_domain::StreamEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Inference gateway over an OpenAI-compatible HTTP endpoint.
pub struct HttpInferenceGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpInferenceGateway {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(
        &self,
        system: &str,
        messages: &[ChatMessage],
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let mut wire_messages = vec![WireMessage {
            role: "system",
            content: system.to_string(),
        }];
        wire_messages.extend(messages.iter().map(|m| WireMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.content.clone(),
        }));

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&json!({
                "model": self.model,
                "messages": wire_messages,
                "stream": stream,
            }));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let response = self
            .request(system, messages, false)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!("{status}: {body}")));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GatewayError::RequestFailed("Empty choices in response".to_string()))
    }

    async fn stream(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<StreamHandle, GatewayError> {
        let response = self
            .request(system, messages, true)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!("{status}: {body}")));
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();
            let mut collected = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Stream transport error: {e}");
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE frames are newline-delimited; hold the last partial
                // line in the buffer.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);
                    match parse_sse_line(&line) {
                        SseLine::Delta(delta) => {
                            collected.push_str(&delta);
                            if tx.send(StreamEvent::Delta(delta)).await.is_err() {
                                debug!("Stream consumer dropped; stopping decode");
                                return;
                            }
                        }
                        SseLine::Done => {
                            let _ = tx.send(StreamEvent::Completed(collected)).await;
                            return;
                        }
                        SseLine::Skip => {}
                    }
                }
            }
            // Stream closed without a [DONE] marker
            let _ = tx.send(StreamEvent::Completed(collected)).await;
        });
        Ok(StreamHandle::new(rx))
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

enum SseLine {
    Delta(String),
    Done,
    Skip,
}

/// Decode one SSE line. Non-data lines and deltas without text content
/// (role preludes, finish markers) are skipped.
fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return SseLine::Skip;
    };
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
            Some(content) if !content.is_empty() => SseLine::Delta(content),
            _ => SseLine::Skip,
        },
        Err(e) => {
            debug!("Skipping undecodable SSE line: {e}");
            SseLine::Skip
        }
    }
}
