use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::{BranchCondition, FlowVariant, StageId};

/// One display event emitted by the simulator.
///
/// Events carry everything a renderer needs; consumers never have to poll
/// simulator state to animate a run. `timestamp` is epoch milliseconds and
/// matches the event-log entry written for the same moment, where one exists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SimEvent {
    RunStarted {
        timestamp: i64,
        run_id: String,
        variant: FlowVariant,
        entry: StageId,
    },
    /// An edge lit up; renderers highlight it for the transition animation.
    EdgeTraversed {
        timestamp: i64,
        edge_id: String,
        condition: Option<BranchCondition>,
    },
    TransitionTaken {
        timestamp: i64,
        from: StageId,
        to: StageId,
        reason: String,
    },
    /// Narrated script line `index` became visible on `stage`.
    StageMessage {
        timestamp: i64,
        stage: StageId,
        index: usize,
        text: String,
    },
    StageCompleted {
        timestamp: i64,
        stage: StageId,
        phrase: String,
    },
    RunCompleted {
        timestamp: i64,
        run_id: String,
        terminal: StageId,
    },
    Paused {
        timestamp: i64,
        stage: StageId,
    },
    Resumed {
        timestamp: i64,
        stage: StageId,
    },
    SpeedChanged {
        timestamp: i64,
        speed: f64,
    },
    Diagnostic {
        timestamp: i64,
        scope: String,
        message: String,
    },
}

impl SimEvent {
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::RunStarted { timestamp, .. }
            | Self::EdgeTraversed { timestamp, .. }
            | Self::TransitionTaken { timestamp, .. }
            | Self::StageMessage { timestamp, .. }
            | Self::StageCompleted { timestamp, .. }
            | Self::RunCompleted { timestamp, .. }
            | Self::Paused { timestamp, .. }
            | Self::Resumed { timestamp, .. }
            | Self::SpeedChanged { timestamp, .. }
            | Self::Diagnostic { timestamp, .. } => *timestamp,
        }
    }

    /// Normalized JSON shape for wire consumers: the serde representation
    /// (`kind` tag plus variant fields) with no envelope.
    pub fn to_json_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "kind": "diagnostic" }))
    }

    pub fn diagnostic(timestamp: i64, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Diagnostic {
            timestamp,
            scope: scope.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted { run_id, variant, entry, .. } => {
                write!(f, "[run {run_id}] started ({variant:?}) at {entry}")
            }
            Self::EdgeTraversed { edge_id, condition, .. } => match condition {
                Some(c) => write!(f, "[edge {edge_id}] traversed ({c})"),
                None => write!(f, "[edge {edge_id}] traversed"),
            },
            Self::TransitionTaken { from, to, reason, .. } => {
                write!(f, "[{from} -> {to}] {reason}")
            }
            Self::StageMessage { stage, index, text, .. } => {
                write!(f, "[{stage}#{index}] {text}")
            }
            Self::StageCompleted { stage, phrase, .. } => write!(f, "[{stage}] {phrase}"),
            Self::RunCompleted { run_id, terminal, .. } => {
                write!(f, "[run {run_id}] completed at {terminal}")
            }
            Self::Paused { stage, .. } => write!(f, "[{stage}] paused"),
            Self::Resumed { stage, .. } => write!(f, "[{stage}] resumed"),
            Self::SpeedChanged { speed, .. } => write!(f, "speed set to {speed}x"),
            Self::Diagnostic { scope, message, .. } => write!(f, "[{scope}] {message}"),
        }
    }
}
