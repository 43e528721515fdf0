//! Event relay: the ordered, single-consumer event stream for a remote
//! client.
//!
//! [`PanelEvent`] is a closed tagged union with a `type` discriminant,
//! checked exhaustively at this boundary. Each variant carries enough
//! identifying fields (speaker, reader id, phase) for a client to
//! reconstruct full session state from the stream alone.

use panel_domain::{
    ConfidenceLevel, ExecutiveEvaluation, FocusMessage, Phase, ReaderId, SessionState,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// A typed event on the consumer-facing stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    ReaderStart {
        reader: ReaderId,
    },
    ReaderProgress {
        reader: ReaderId,
        note: String,
    },
    ReaderComplete {
        reader: ReaderId,
    },
    ReaderError {
        reader: ReaderId,
        error: String,
    },
    DeliverableReady {
        kind: String,
    },
    PhaseChange {
        phase: Phase,
    },
    FocusGroupMessage {
        message: FocusMessage,
    },
    /// A speaker is composing; emitted before their statement streams.
    FocusGroupTyping {
        speaker: String,
        reader: Option<ReaderId>,
    },
    FocusGroupComplete {
        state: SessionState,
        messages: usize,
    },
    ExecutiveStart,
    ExecutiveComplete {
        evaluation: ExecutiveEvaluation,
    },
    /// A secondary call (e.g. memory extraction) started.
    ToolStart {
        name: String,
        reader: Option<ReaderId>,
    },
    ToolEnd {
        name: String,
        reader: Option<ReaderId>,
    },
    /// One token-level chunk of the statement currently streaming.
    TextDelta {
        speaker: String,
        delta: String,
    },
    /// Discrete boundary: the streaming statement is complete.
    TextComplete {
        speaker: String,
    },
    Error {
        error: String,
    },
    Result {
        confidence: ConfidenceLevel,
        narrative: String,
    },
}

/// Single-producer, single-consumer ordered event channel for one session.
///
/// The channel is bounded; back-pressure is the consumer's responsibility
/// and the producer never buffers unboundedly. A relay built with
/// [`EventRelay::null`] drops every event, for callers that do not stream.
#[derive(Clone)]
pub struct EventRelay {
    tx: Option<mpsc::Sender<PanelEvent>>,
}

impl EventRelay {
    /// Create a relay and the consumer end of its channel.
    pub fn channel(capacity: usize) -> (EventRelay, mpsc::Receiver<PanelEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (EventRelay { tx: Some(tx) }, rx)
    }

    /// A relay that discards every event.
    pub fn null() -> EventRelay {
        EventRelay { tx: None }
    }

    /// Emit one event in order.
    ///
    /// Returns false once the consumer has disconnected; emission stops but
    /// already-committed state is unaffected.
    pub async fn emit(&self, event: PanelEvent) -> bool {
        match &self.tx {
            Some(tx) => match tx.send(event).await {
                Ok(()) => true,
                Err(_) => {
                    debug!("Event consumer disconnected; dropping event");
                    false
                }
            },
            None => false,
        }
    }

    /// Whether any consumer is (still) attached.
    pub fn is_live(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (relay, mut rx) = EventRelay::channel(8);
        relay
            .emit(PanelEvent::PhaseChange {
                phase: Phase::Analysis,
            })
            .await;
        relay
            .emit(PanelEvent::ReaderStart {
                reader: ReaderId::new("craft"),
            })
            .await;
        drop(relay);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, PanelEvent::PhaseChange { .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, PanelEvent::ReaderStart { .. }));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn null_relay_drops_events() {
        let relay = EventRelay::null();
        assert!(!relay.emit(PanelEvent::ExecutiveStart).await);
        assert!(!relay.is_live());
    }

    #[tokio::test]
    async fn emit_after_disconnect_returns_false() {
        let (relay, rx) = EventRelay::channel(1);
        drop(rx);
        assert!(!relay.emit(PanelEvent::ExecutiveStart).await);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PanelEvent::ReaderError {
            reader: ReaderId::new("market"),
            error: "timeout".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reader_error");
        assert_eq!(json["reader"], "market");
    }
}
