//! Reader persona value objects
//!
//! A [`ReaderPersona`] is the immutable configuration of one simulated
//! analyst: who they are, how they weigh each scoring dimension, and the
//! behavioral instruction injected into their inference calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The scoring dimensions a reader judges a manuscript on.
///
/// Five scored dimensions plus `Overall`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Premise,
    Plot,
    Character,
    Dialogue,
    Pacing,
    Overall,
}

impl Dimension {
    /// All dimensions including `Overall`, in canonical order.
    pub fn all() -> [Dimension; 6] {
        [
            Dimension::Premise,
            Dimension::Plot,
            Dimension::Character,
            Dimension::Dialogue,
            Dimension::Pacing,
            Dimension::Overall,
        ]
    }

    /// The five scored dimensions, excluding `Overall`.
    pub fn scored() -> [Dimension; 5] {
        [
            Dimension::Premise,
            Dimension::Plot,
            Dimension::Character,
            Dimension::Dialogue,
            Dimension::Pacing,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Premise => "premise",
            Dimension::Plot => "plot",
            Dimension::Character => "character",
            Dimension::Dialogue => "dialogue",
            Dimension::Pacing => "pacing",
            Dimension::Overall => "overall",
        }
    }

    /// Capitalized label for display and divergence topics.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Premise => "Premise",
            Dimension::Plot => "Plot",
            Dimension::Character => "Character",
            Dimension::Dialogue => "Dialogue",
            Dimension::Pacing => "Pacing",
            Dimension::Overall => "Overall",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier of a configured reader persona (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReaderId(String);

impl ReaderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReaderId {
    fn from(s: &str) -> Self {
        ReaderId::new(s)
    }
}

impl From<String> for ReaderId {
    fn from(s: String) -> Self {
        ReaderId::new(s)
    }
}

/// Per-dimension weight multipliers for one reader.
///
/// Multipliers default to 1.0 for any dimension not explicitly configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionWeights(BTreeMap<Dimension, f64>);

impl DimensionWeights {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn with(mut self, dimension: Dimension, multiplier: f64) -> Self {
        self.0.insert(dimension, multiplier);
        self
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(1.0)
    }
}

impl FromIterator<(Dimension, f64)> for DimensionWeights {
    fn from_iter<T: IntoIterator<Item = (Dimension, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Immutable configuration for one simulated reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderPersona {
    /// Stable identifier
    pub id: ReaderId,
    /// Display name
    pub name: String,
    /// Per-dimension weight multipliers applied on top of evidence strength
    pub weights: DimensionWeights,
    /// Behavioral system instruction
    pub instruction: String,
    /// Display color (hex), for clients
    pub color: String,
}

impl ReaderPersona {
    pub fn new(id: impl Into<ReaderId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weights: DimensionWeights::uniform(),
            instruction: String::new(),
            color: "#888888".to_string(),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_weights(mut self, weights: DimensionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// The built-in three-reader panel used when no panel is configured.
    pub fn default_panel() -> Vec<ReaderPersona> {
        vec![
            ReaderPersona::new("craft", "The Craft Critic")
                .with_instruction(
                    "You are a literary craft specialist. Judge the manuscript on prose \
                     control, structural integrity, and scene-level technique. You are \
                     exacting about dialogue and pacing, and you cite specific passages.",
                )
                .with_weights(
                    DimensionWeights::uniform()
                        .with(Dimension::Dialogue, 1.2)
                        .with(Dimension::Pacing, 1.2),
                )
                .with_color("#7c5cff"),
            ReaderPersona::new("market", "The Market Reader")
                .with_instruction(
                    "You are a commercially-minded acquisitions reader. Judge the \
                     manuscript on hook strength, audience clarity, and comparative \
                     positioning. Premise and plot momentum matter most to you.",
                )
                .with_weights(
                    DimensionWeights::uniform()
                        .with(Dimension::Premise, 1.3)
                        .with(Dimension::Plot, 1.1),
                )
                .with_color("#ff8c42"),
            ReaderPersona::new("audience", "The Audience Proxy")
                .with_instruction(
                    "You are an avid genre reader standing in for the target audience. \
                     Judge the manuscript on emotional engagement, character attachment, \
                     and whether you would keep turning pages.",
                )
                .with_weights(DimensionWeights::uniform().with(Dimension::Character, 1.3))
                .with_color("#2ec4b6"),
        ]
    }
}
