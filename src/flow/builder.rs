//! Fluent builder and structural validation for flow graphs.

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::graph::{FlowEdge, FlowGraph, FlowNode};
use crate::types::{BranchCondition, StageId, StageStatus};

/// Structural validation failures raised by [`FlowBuilder::build`].
///
/// Per the error-handling design, flow definitions are static data authored
/// by developers, so every violation here is loud and descriptive instead of
/// being papered over at runtime.
#[derive(Debug, Error, Diagnostic)]
pub enum FlowError {
    #[error("flow has no stages")]
    #[diagnostic(code(claimsim::flow::empty))]
    Empty,

    #[error("duplicate stage id: {id}")]
    #[diagnostic(
        code(claimsim::flow::duplicate_stage),
        help("Stage ids must be unique within one flow variant.")
    )]
    DuplicateStage { id: StageId },

    #[error("edge {edge} references unknown stage: {stage}")]
    #[diagnostic(code(claimsim::flow::unknown_stage))]
    UnknownStage { edge: String, stage: StageId },

    #[error("flow has no entry stage (every stage has an incoming edge)")]
    #[diagnostic(
        code(claimsim::flow::no_entry),
        help("Exactly one stage must have no incoming edges.")
    )]
    NoEntry,

    #[error("flow has multiple entry stages: {ids:?}")]
    #[diagnostic(code(claimsim::flow::multiple_entries))]
    MultipleEntries { ids: Vec<StageId> },

    #[error("flow has no terminal stage (every stage has an outgoing edge)")]
    #[diagnostic(
        code(claimsim::flow::no_terminal),
        help("Exactly one stage must have no outgoing edges.")
    )]
    NoTerminal,

    #[error("flow has multiple terminal stages: {ids:?}")]
    #[diagnostic(code(claimsim::flow::multiple_terminals))]
    MultipleTerminals { ids: Vec<StageId> },

    #[error("conditioned edges leave more than one stage: {ids:?}")]
    #[diagnostic(
        code(claimsim::flow::multiple_gates),
        help("Only the single designated gate stage may carry branch conditions.")
    )]
    MultipleGates { ids: Vec<StageId> },

    #[error("gate stage {gate} must have exactly two outgoing edges, found {outgoing}")]
    #[diagnostic(code(claimsim::flow::gate_arity))]
    GateArity { gate: StageId, outgoing: usize },

    #[error("gate stage {gate} must have exactly one IGO and one NIGO edge")]
    #[diagnostic(code(claimsim::flow::gate_conditions))]
    GateConditions { gate: StageId },
}

/// Builder for flow graphs with a fluent API.
///
/// Stages and edges are collected in definition order; [`build`](Self::build)
/// validates the whole graph and returns a [`FlowGraph`] or the first
/// [`FlowError`] encountered.
///
/// # Examples
///
/// ```rust
/// use claimsim::flow::FlowBuilder;
/// use claimsim::types::BranchCondition;
///
/// let flow = FlowBuilder::new()
///     .add_stage("start", "Start", 1000)
///     .add_stage("gate", "Gate", 1000)
///     .add_stage("done", "Done", 1000)
///     .add_stage("fix", "Fix", 1000)
///     .add_edge("start", "gate")
///     .add_branch("gate", BranchCondition::Igo, "done")
///     .add_branch("gate", BranchCondition::Nigo, "fix")
///     .add_edge("fix", "gate")
///     .build()
///     .unwrap();
///
/// assert_eq!(flow.entry().as_str(), "start");
/// assert_eq!(flow.terminal().as_str(), "done");
/// assert_eq!(flow.gate().unwrap().as_str(), "gate");
/// ```
#[derive(Default)]
pub struct FlowBuilder {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
}

impl FlowBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage with its display label and dwell duration.
    #[must_use]
    pub fn add_stage(
        mut self,
        id: impl Into<StageId>,
        label: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        self.nodes.push(FlowNode {
            id: id.into(),
            label: label.into(),
            status: StageStatus::Idle,
            duration_ms,
            notes: None,
            position: None,
        });
        self
    }

    /// Attach free-form notes to the most recently added stage.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        if let Some(last) = self.nodes.last_mut() {
            last.notes = Some(notes.into());
        }
        self
    }

    /// Add an unconditional transition between two stages.
    #[must_use]
    pub fn add_edge(self, source: impl Into<StageId>, target: impl Into<StageId>) -> Self {
        self.push_edge(source.into(), target.into(), None)
    }

    /// Add a conditioned transition leaving the gate stage.
    #[must_use]
    pub fn add_branch(
        self,
        source: impl Into<StageId>,
        condition: BranchCondition,
        target: impl Into<StageId>,
    ) -> Self {
        self.push_edge(source.into(), target.into(), Some(condition))
    }

    fn push_edge(
        mut self,
        source: StageId,
        target: StageId,
        condition: Option<BranchCondition>,
    ) -> Self {
        let id = match condition {
            Some(c) => format!("{source}-{target}-{c}"),
            None => format!("{source}-{target}"),
        };
        self.edges.push(FlowEdge {
            id,
            source,
            target,
            condition,
        });
        self
    }

    /// Validate the collected stages and edges into a [`FlowGraph`].
    pub fn build(self) -> Result<FlowGraph, FlowError> {
        if self.nodes.is_empty() {
            return Err(FlowError::Empty);
        }

        let mut seen: FxHashSet<&StageId> = FxHashSet::default();
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(FlowError::DuplicateStage {
                    id: node.id.clone(),
                });
            }
        }

        for edge in &self.edges {
            for stage in [&edge.source, &edge.target] {
                if !seen.contains(stage) {
                    return Err(FlowError::UnknownStage {
                        edge: edge.id.clone(),
                        stage: stage.clone(),
                    });
                }
            }
        }

        let entry = Self::sole_stage_without(
            &self.nodes,
            |id| self.edges.iter().any(|e| &e.target == id),
            FlowError::NoEntry,
            |ids| FlowError::MultipleEntries { ids },
        )?;
        let terminal = Self::sole_stage_without(
            &self.nodes,
            |id| self.edges.iter().any(|e| &e.source == id),
            FlowError::NoTerminal,
            |ids| FlowError::MultipleTerminals { ids },
        )?;

        let gate = self.validate_gate()?;

        Ok(FlowGraph::from_validated_parts(
            self.nodes, self.edges, entry, terminal, gate,
        ))
    }

    fn sole_stage_without(
        nodes: &[FlowNode],
        has_edge: impl Fn(&StageId) -> bool,
        none_err: FlowError,
        many_err: impl FnOnce(Vec<StageId>) -> FlowError,
    ) -> Result<StageId, FlowError> {
        let mut candidates: Vec<StageId> = nodes
            .iter()
            .filter(|n| !has_edge(&n.id))
            .map(|n| n.id.clone())
            .collect();
        match candidates.len() {
            0 => Err(none_err),
            1 => Ok(candidates.remove(0)),
            _ => Err(many_err(candidates)),
        }
    }

    fn validate_gate(&self) -> Result<Option<StageId>, FlowError> {
        let mut conditioned_sources: Vec<&StageId> = Vec::new();
        for edge in &self.edges {
            if edge.condition.is_some() && !conditioned_sources.contains(&&edge.source) {
                conditioned_sources.push(&edge.source);
            }
        }

        match conditioned_sources.len() {
            0 => Ok(None),
            1 => {
                let gate = conditioned_sources[0].clone();
                let outgoing: Vec<&FlowEdge> =
                    self.edges.iter().filter(|e| e.source == gate).collect();
                if outgoing.len() != 2 {
                    return Err(FlowError::GateArity {
                        gate,
                        outgoing: outgoing.len(),
                    });
                }
                let mut counts: FxHashMap<BranchCondition, usize> = FxHashMap::default();
                for edge in &outgoing {
                    match edge.condition {
                        Some(c) => *counts.entry(c).or_default() += 1,
                        None => return Err(FlowError::GateConditions { gate }),
                    }
                }
                if counts.get(&BranchCondition::Igo) != Some(&1)
                    || counts.get(&BranchCondition::Nigo) != Some(&1)
                {
                    return Err(FlowError::GateConditions { gate });
                }
                Ok(Some(gate))
            }
            _ => Err(FlowError::MultipleGates {
                ids: conditioned_sources.into_iter().cloned().collect(),
            }),
        }
    }
}
