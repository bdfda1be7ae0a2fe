//! Validated flow graph and its node/edge records.

use serde::{Deserialize, Serialize};

use crate::types::{BranchCondition, StageId, StageStatus};

/// 2D rendering coordinate for a stage node.
///
/// Positions are rendering hints only and never influence simulation
/// correctness; they mutate via explicit user drag or auto-layout,
/// independently of run state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One stage of the simulated claims pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: StageId,
    /// Human-readable stage title shown in the UI and in completion events.
    pub label: String,
    pub status: StageStatus,
    /// Dwell time before the stepper advances past this stage, before the
    /// speed multiplier is applied.
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// A transition between two stages.
///
/// Edges carrying a [`BranchCondition`] exist only at the designated gate
/// stage; all other edges are unconditional single-successor transitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: StageId,
    pub target: StageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<BranchCondition>,
}

/// A validated flow: ordered stages + transitions with a known entry,
/// terminal, and (optional) branch gate.
///
/// Construct through [`FlowBuilder`](super::FlowBuilder); the builder
/// guarantees the structural invariants this type's accessors rely on
/// (exactly one entry, exactly one terminal, well-formed gate).
#[derive(Clone, Debug)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    entry: StageId,
    terminal: StageId,
    gate: Option<StageId>,
}

impl FlowGraph {
    pub(super) fn from_validated_parts(
        nodes: Vec<FlowNode>,
        edges: Vec<FlowEdge>,
        entry: StageId,
        terminal: StageId,
        gate: Option<StageId>,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
            terminal,
            gate,
        }
    }

    /// The unique stage with no incoming edges.
    #[must_use]
    pub fn entry(&self) -> &StageId {
        &self.entry
    }

    /// The unique stage with no outgoing edges.
    #[must_use]
    pub fn terminal(&self) -> &StageId {
        &self.terminal
    }

    /// The designated branch gate, if this flow has one.
    #[must_use]
    pub fn gate(&self) -> Option<&StageId> {
        self.gate.as_ref()
    }

    #[must_use]
    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: &StageId) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &StageId) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &StageId) -> bool {
        self.node(id).is_some()
    }

    /// All edges leaving the given stage, in definition order.
    pub fn outgoing(&self, id: &StageId) -> impl Iterator<Item = &FlowEdge> {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// The single unconditional successor edge of a non-gate stage.
    #[must_use]
    pub fn unconditional_successor(&self, id: &StageId) -> Option<&FlowEdge> {
        self.outgoing(id).find(|e| e.condition.is_none())
    }

    /// The gate edge carrying the given condition.
    #[must_use]
    pub fn gate_edge(&self, gate: &StageId, condition: BranchCondition) -> Option<&FlowEdge> {
        self.outgoing(gate).find(|e| e.condition == Some(condition))
    }

    /// The stage currently marked active, if any.
    #[must_use]
    pub fn active_stage(&self) -> Option<&StageId> {
        self.nodes
            .iter()
            .find(|n| n.status == StageStatus::Active)
            .map(|n| &n.id)
    }

    /// Return every stage to [`StageStatus::Idle`], keeping positions.
    pub fn reset_statuses(&mut self) {
        for node in &mut self.nodes {
            node.status = StageStatus::Idle;
        }
    }
}
