//! Reaction reply parsing.
//!
//! Readers are instructed to open a reaction with
//! `AGREES_WITH <name>:`, `DISAGREES_WITH <name>:`, or `BUILDS_ON <name>:`,
//! or to reply `NO_REACTION` to stay silent. A reply that matches none of
//! these, or that names a peer not in the panel, is treated as no reaction.

use super::session::ReactionKind;
use crate::reader::persona::{ReaderId, ReaderPersona};

/// A successfully parsed reaction, with the peer resolved to a panel member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReaction {
    pub kind: ReactionKind,
    pub peer: ReaderId,
    pub content: String,
}

const PREFIXES: [(&str, ReactionKind); 3] = [
    ("AGREES_WITH", ReactionKind::Agrees),
    ("DISAGREES_WITH", ReactionKind::Disagrees),
    ("BUILDS_ON", ReactionKind::BuildsOn),
];

/// Parse a reaction reply against the panel.
///
/// Returns `None` for declines, unrecognized formats, unresolvable peers,
/// and empty reaction bodies.
pub fn parse_reaction(text: &str, panel: &[ReaderPersona]) -> Option<ParsedReaction> {
    let text = text.trim();

    let (kind, rest) = PREFIXES
        .iter()
        .find_map(|(prefix, kind)| text.strip_prefix(prefix).map(|rest| (*kind, rest)))?;

    // Peer name sits between the prefix and the first colon; the body follows.
    let (name, content) = rest.split_once(':')?;
    let (name, content) = (name.trim(), content.trim());
    if name.is_empty() || name.contains('\n') || content.is_empty() {
        return None;
    }

    let peer = resolve_peer(name, panel)?;
    Some(ParsedReaction {
        kind,
        peer,
        content: content.to_string(),
    })
}

/// Match a stated peer name against panel ids and display names,
/// case-insensitively.
fn resolve_peer(name: &str, panel: &[ReaderPersona]) -> Option<ReaderId> {
    let needle = name.to_lowercase();
    panel
        .iter()
        .find(|p| {
            p.id.as_str().to_lowercase() == needle || p.name.to_lowercase() == needle
        })
        .map(|p| p.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> Vec<ReaderPersona> {
        vec![
            ReaderPersona::new("craft", "The Craft Critic"),
            ReaderPersona::new("market", "The Market Reader"),
        ]
    }

    #[test]
    fn test_parse_agrees() {
        let parsed =
            parse_reaction("AGREES_WITH market: The hook really is the strongest asset.", &panel())
                .unwrap();
        assert_eq!(parsed.kind, ReactionKind::Agrees);
        assert_eq!(parsed.peer, ReaderId::new("market"));
        assert!(parsed.content.contains("strongest asset"));
    }

    #[test]
    fn test_parse_by_display_name() {
        let parsed = parse_reaction(
            "DISAGREES_WITH The Craft Critic: The dialogue works for this genre.",
            &panel(),
        )
        .unwrap();
        assert_eq!(parsed.kind, ReactionKind::Disagrees);
        assert_eq!(parsed.peer, ReaderId::new("craft"));
    }

    #[test]
    fn test_decline_is_none() {
        assert!(parse_reaction("NO_REACTION", &panel()).is_none());
    }

    #[test]
    fn test_unrecognized_format_is_no_reaction() {
        // Unparsable replies are dropped, not coerced into builds_on.
        assert!(parse_reaction("I think the pacing is fine overall.", &panel()).is_none());
    }

    #[test]
    fn test_unknown_peer_is_no_reaction() {
        assert!(parse_reaction("BUILDS_ON stranger: interesting point.", &panel()).is_none());
    }

    #[test]
    fn test_empty_body_is_no_reaction() {
        assert!(parse_reaction("AGREES_WITH market:", &panel()).is_none());
    }

    #[test]
    fn test_multiline_body_preserved() {
        let parsed = parse_reaction(
            "BUILDS_ON market: First line.\nSecond line with detail.",
            &panel(),
        )
        .unwrap();
        assert!(parsed.content.contains("Second line"));
    }
}
