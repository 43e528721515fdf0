//! Focus-group session entities.
//!
//! A session belongs to exactly one (project, draft) and holds an ordered,
//! append-only sequence of messages. Sequence number is the sole ordering
//! key; messages are immutable once appended, and `Complete` is terminal.

use crate::core::error::DomainError;
use crate::reader::persona::ReaderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Derive a session id from its draft key and start time.
    pub fn generate(project: &str, draft: u32) -> Self {
        Self(format!("{}-d{}-{}", project, draft, Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reader")]
pub enum Speaker {
    Moderator,
    Reader(ReaderId),
    User,
}

impl Speaker {
    pub fn reader(&self) -> Option<&ReaderId> {
        match self {
            Speaker::Reader(id) => Some(id),
            _ => None,
        }
    }
}

/// How a reaction relates to the statement it replies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Agrees,
    Disagrees,
    BuildsOn,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Agrees => "agrees",
            ReactionKind::Disagrees => "disagrees",
            ReactionKind::BuildsOn => "builds_on",
        }
    }
}

/// Reference from a reaction message back to the statement it replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Sequence number of the message being reacted to
    pub to_sequence: u64,
    /// The reader who made that statement
    pub to_reader: ReaderId,
    pub kind: ReactionKind,
}

/// One atomic statement in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusMessage {
    /// Sole ordering key within the session
    pub sequence: u64,
    pub speaker: Speaker,
    pub content: String,
    pub topic: Option<String>,
    pub sentiment: Option<String>,
    /// Present only on reaction messages
    pub reaction: Option<Reaction>,
    pub timestamp: DateTime<Utc>,
}

/// State machine position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SessionState {
    Opening,
    /// Working through the question at this index
    Discussion { question: usize },
    Closing,
    /// Terminal: no further writes permitted
    Complete,
    /// Aborted mid-session; produced turns remain valid
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Aborted)
    }
}

/// An ordered, append-only focus-group conversation for one (project, draft).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusGroupSession {
    pub id: SessionId,
    pub project: String,
    pub draft: u32,
    pub state: SessionState,
    messages: Vec<FocusMessage>,
}

impl FocusGroupSession {
    pub fn new(project: impl Into<String>, draft: u32) -> Self {
        let project = project.into();
        Self {
            id: SessionId::generate(&project, draft),
            project,
            draft,
            state: SessionState::Opening,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[FocusMessage] {
        &self.messages
    }

    /// The last `n` messages, for transcript-window prompt context.
    pub fn transcript_window(&self, n: usize) -> &[FocusMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Append a statement, assigning the next sequence number.
    ///
    /// Fails once the session has reached a terminal state.
    pub fn append(
        &mut self,
        speaker: Speaker,
        content: impl Into<String>,
        topic: Option<String>,
        reaction: Option<Reaction>,
    ) -> Result<&FocusMessage, DomainError> {
        if self.state.is_terminal() {
            return Err(DomainError::SessionComplete);
        }
        let message = FocusMessage {
            sequence: self.messages.len() as u64 + 1,
            speaker,
            content: content.into(),
            topic,
            sentiment: None,
            reaction,
            timestamp: Utc::now(),
        };
        self.messages.push(message);
        Ok(self.messages.last().unwrap())
    }

    /// Find a reader's most recent statement, for resolving reactions back
    /// to a concrete message reference.
    pub fn last_statement_of(&self, reader: &ReaderId) -> Option<&FocusMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.speaker.reader() == Some(reader) && m.reaction.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_are_ordered() {
        let mut session = FocusGroupSession::new("proj", 1);
        session
            .append(Speaker::Moderator, "Welcome", None, None)
            .unwrap();
        session
            .append(Speaker::Reader(ReaderId::new("craft")), "First point", None, None)
            .unwrap();
        let sequences: Vec<u64> = session.messages().iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn test_complete_session_rejects_appends() {
        let mut session = FocusGroupSession::new("proj", 1);
        session.state = SessionState::Complete;
        let result = session.append(Speaker::Moderator, "Too late", None, None);
        assert!(matches!(result, Err(DomainError::SessionComplete)));
    }

    #[test]
    fn test_transcript_window_takes_tail() {
        let mut session = FocusGroupSession::new("proj", 1);
        for i in 0..10 {
            session
                .append(Speaker::Moderator, format!("m{i}"), None, None)
                .unwrap();
        }
        let window = session.transcript_window(6);
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].content, "m4");
    }

    #[test]
    fn test_last_statement_skips_reactions() {
        let mut session = FocusGroupSession::new("proj", 1);
        let craft = ReaderId::new("craft");
        session
            .append(Speaker::Reader(craft.clone()), "Statement", None, None)
            .unwrap();
        session
            .append(
                Speaker::Reader(craft.clone()),
                "Reaction",
                None,
                Some(Reaction {
                    to_sequence: 1,
                    to_reader: ReaderId::new("market"),
                    kind: ReactionKind::Agrees,
                }),
            )
            .unwrap();
        assert_eq!(session.last_statement_of(&craft).unwrap().content, "Statement");
    }
}
