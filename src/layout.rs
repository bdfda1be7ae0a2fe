//! Automatic layered layout for flow graphs, plus per-variant persistence of
//! user-adjusted positions.
//!
//! The computed layout is deterministic: a node's vertical layer is its BFS
//! distance from the entry stage, and nodes sharing a layer are spread
//! horizontally, centered on the spine. Saved layouts are keyed by flow
//! variant so the standard and CHESS-augmented pipelines keep independent
//! adjustments.

use std::collections::VecDeque;
use std::path::PathBuf;

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flow::{FlowGraph, Position};
use crate::types::{FlowVariant, StageId};

/// Vertical distance between BFS layers.
pub const LAYER_SPACING: f64 = 140.0;
/// Horizontal distance between nodes sharing a layer.
pub const NODE_SPACING: f64 = 220.0;

/// Positions for every node of one variant's graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    pub positions: FxHashMap<StageId, Position>,
}

/// Compute the default layered layout for a graph.
///
/// Layer = BFS distance from the entry stage, following all outgoing edges
/// (branch edges included, so `pend` sits one layer below the gate). Within
/// a layer, nodes keep BFS discovery order and are centered around x = 0.
#[must_use]
pub fn compute_layout(graph: &FlowGraph) -> Layout {
    let mut layers: Vec<Vec<StageId>> = Vec::new();
    let mut seen: FxHashSet<StageId> = FxHashSet::default();
    let mut queue: VecDeque<(StageId, usize)> = VecDeque::new();

    seen.insert(graph.entry().clone());
    queue.push_back((graph.entry().clone(), 0));

    while let Some((stage, depth)) = queue.pop_front() {
        if layers.len() <= depth {
            layers.resize_with(depth + 1, Vec::new);
        }
        layers[depth].push(stage.clone());
        for edge in graph.outgoing(&stage) {
            if seen.insert(edge.target.clone()) {
                queue.push_back((edge.target.clone(), depth + 1));
            }
        }
    }

    let mut positions = FxHashMap::default();
    for (depth, layer) in layers.iter().enumerate() {
        let count = layer.len() as f64;
        for (slot, stage) in layer.iter().enumerate() {
            let x = (slot as f64 - (count - 1.0) / 2.0) * NODE_SPACING;
            positions.insert(
                stage.clone(),
                Position {
                    x,
                    y: depth as f64 * LAYER_SPACING,
                },
            );
        }
    }

    Layout { positions }
}

/// Write a layout's positions onto the graph nodes.
pub fn apply_layout(graph: &mut FlowGraph, layout: &Layout) {
    let stages: Vec<StageId> = graph.nodes().iter().map(|n| n.id.clone()).collect();
    for stage in stages {
        if let Some(position) = layout.positions.get(&stage)
            && let Some(node) = graph.node_mut(&stage)
        {
            node.position = Some(*position);
        }
    }
}

/// Errors from layout persistence.
#[derive(Debug, Error, Diagnostic)]
pub enum LayoutError {
    #[error("layout store I/O failure")]
    #[diagnostic(code(claimsim::layout::io))]
    Io(#[from] std::io::Error),

    #[error("layout payload is not valid JSON")]
    #[diagnostic(code(claimsim::layout::serde))]
    Serde(#[from] serde_json::Error),
}

/// Persistence seam for user-adjusted layouts, keyed by flow variant.
pub trait LayoutStore: Send + Sync {
    fn save(&mut self, variant: FlowVariant, layout: &Layout) -> Result<(), LayoutError>;
    /// `Ok(None)` when no layout was saved for this variant.
    fn load(&self, variant: FlowVariant) -> Result<Option<Layout>, LayoutError>;
    fn clear(&mut self, variant: FlowVariant) -> Result<(), LayoutError>;
}

/// Volatile store for tests and single-session demos.
#[derive(Debug, Default)]
pub struct InMemoryLayoutStore {
    saved: FxHashMap<FlowVariant, Layout>,
}

impl InMemoryLayoutStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutStore for InMemoryLayoutStore {
    fn save(&mut self, variant: FlowVariant, layout: &Layout) -> Result<(), LayoutError> {
        self.saved.insert(variant, layout.clone());
        Ok(())
    }

    fn load(&self, variant: FlowVariant) -> Result<Option<Layout>, LayoutError> {
        Ok(self.saved.get(&variant).cloned())
    }

    fn clear(&mut self, variant: FlowVariant) -> Result<(), LayoutError> {
        self.saved.remove(&variant);
        Ok(())
    }
}

/// Flat-file store: one JSON document per variant under a base directory.
#[derive(Debug)]
pub struct FileLayoutStore {
    base_dir: PathBuf,
}

impl FileLayoutStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, variant: FlowVariant) -> PathBuf {
        self.base_dir.join(format!("{}_layout.json", variant.as_str()))
    }
}

impl LayoutStore for FileLayoutStore {
    fn save(&mut self, variant: FlowVariant, layout: &Layout) -> Result<(), LayoutError> {
        std::fs::create_dir_all(&self.base_dir)?;
        let json = serde_json::to_string_pretty(layout)?;
        std::fs::write(self.path_for(variant), json)?;
        Ok(())
    }

    fn load(&self, variant: FlowVariant) -> Result<Option<Layout>, LayoutError> {
        let path = self.path_for(variant);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn clear(&mut self, variant: FlowVariant) -> Result<(), LayoutError> {
        let path = self.path_for(variant);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Saved layout for the variant if one exists, otherwise the computed
/// default.
pub fn layout_for(
    store: &dyn LayoutStore,
    variant: FlowVariant,
    graph: &FlowGraph,
) -> Result<Layout, LayoutError> {
    match store.load(variant)? {
        Some(saved) => Ok(saved),
        None => Ok(compute_layout(graph)),
    }
}
