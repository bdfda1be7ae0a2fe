//! Core types for the claimsim workflow simulator.
//!
//! This module defines the fundamental identifiers used throughout the
//! simulator: stage ids, stage statuses, branch conditions, and the named
//! flow variants. These are the core domain concepts that define what a
//! simulated pipeline *is*; runtime execution types live in [`crate::sim`].
//!
//! # Examples
//!
//! ```rust
//! use claimsim::types::{BranchCondition, FlowVariant, StageId, StageStatus};
//!
//! let gate: StageId = "validation".into();
//! assert_eq!(gate.as_str(), "validation");
//!
//! assert_eq!(BranchCondition::Igo.to_string(), "IGO");
//! assert_eq!(FlowVariant::decode("chess"), Some(FlowVariant::ChessAugmented));
//! assert_eq!(StageStatus::default(), StageStatus::Idle);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a stage within a flow graph.
///
/// Stage ids are short, stable, lowercase strings (`"intake"`,
/// `"validation"`) unique within one flow variant. They are used as map keys
/// for scripts, layouts, and message state, so the type is `Eq + Hash` and
/// cheap to clone.
///
/// # Examples
///
/// ```rust
/// use claimsim::types::StageId;
///
/// let id = StageId::new("adjudication");
/// let same: StageId = "adjudication".into();
/// assert_eq!(id, same);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of a stage during a run.
///
/// Exactly one stage may be [`Active`](Self::Active) at any instant; zero if
/// the run has not started or has finished. Reset returns every stage to
/// [`Idle`](Self::Idle).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Not yet visited in the current run.
    #[default]
    Idle,
    /// The single currently executing stage.
    Active,
    /// Visited and completed in the current run.
    Done,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Outcome condition carried by the two edges leaving the validation gate.
///
/// `Igo` ("In Good Order") continues the happy path; `Nigo` ("Not In Good
/// Order") routes the claim through remediation and back to the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BranchCondition {
    Igo,
    Nigo,
}

impl fmt::Display for BranchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Igo => write!(f, "IGO"),
            Self::Nigo => write!(f, "NIGO"),
        }
    }
}

/// Named pipeline topology a claim is simulated against.
///
/// The variant is selected from the claim's integration-type tag: claims
/// tagged for the CHESS eligibility system run the augmented pipeline,
/// everything else runs the standard one. Each variant keeps an independent
/// persisted layout (see [`crate::layout`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    /// The default claims-intake pipeline.
    #[default]
    Standard,
    /// The pipeline augmented with CHESS eligibility stages.
    ChessAugmented,
}

impl FlowVariant {
    /// Stable string form used as a persistence key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ChessAugmented => "chess_augmented",
        }
    }

    /// Decode a persisted or integration-type string back into a variant.
    ///
    /// Accepts the persistence key forms plus the integration-type tag
    /// (`"chess"`) carried on claim records. Unknown strings return `None`
    /// so callers can fail loudly instead of rendering an empty graph.
    pub fn decode(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "chess_augmented" | "chess" => Some(Self::ChessAugmented),
            _ => None,
        }
    }

    /// Variant for a claim's integration-type tag, defaulting to standard.
    #[must_use]
    pub fn for_integration_type(tag: &str) -> Self {
        Self::decode(tag).unwrap_or(Self::Standard)
    }
}

impl fmt::Display for FlowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
