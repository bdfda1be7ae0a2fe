//! The two shipped pipeline topologies.
//!
//! Both variants share the same intake/validation/adjudication spine; the
//! CHESS-augmented variant inserts an eligibility lookup before document
//! extraction and a record sync before payment. The validation gate is the
//! only branch point: IGO proceeds to adjudication, NIGO detours through the
//! pend review stage and loops back to the gate.

use super::builder::FlowBuilder;
use super::graph::FlowGraph;
use crate::types::{BranchCondition, FlowVariant};

/// Build a fresh (all-idle) graph for the given variant.
#[must_use]
pub fn graph_for(variant: FlowVariant) -> FlowGraph {
    match variant {
        FlowVariant::Standard => standard(),
        FlowVariant::ChessAugmented => chess_augmented(),
    }
}

/// The default claims-intake pipeline.
#[must_use]
pub fn standard() -> FlowGraph {
    spine(FlowBuilder::new(), false)
        .build()
        .expect("built-in standard flow is structurally valid")
}

/// The pipeline augmented with CHESS eligibility stages.
#[must_use]
pub fn chess_augmented() -> FlowGraph {
    spine(FlowBuilder::new(), true)
        .build()
        .expect("built-in CHESS-augmented flow is structurally valid")
}

fn spine(builder: FlowBuilder, chess: bool) -> FlowBuilder {
    let mut b = builder
        .add_stage("intake", "Claim Received", 2_500)
        .with_notes("Submission registered and assigned a claim number.");

    if chess {
        b = b
            .add_stage("chess_eligibility", "CHESS Eligibility Lookup", 3_500)
            .with_notes("Member coverage verified against the CHESS system.");
    }

    b = b
        .add_stage("extraction", "Document Extraction", 4_000)
        .with_notes("Structured fields pulled from the submitted documents.")
        .add_stage("validation", "Validation Gate", 3_000)
        .with_notes("IGO / NIGO completeness check.")
        .add_stage("pend", "Pend Review", 3_500)
        .with_notes("Missing or inconsistent information resolved manually.")
        .add_stage("adjudication", "Adjudication", 4_500)
        .add_stage("payment", "Payment Processing", 3_000)
        .add_stage("closure", "Claim Closed", 1_500);

    if chess {
        b = b.add_stage("chess_sync", "CHESS Record Sync", 2_500);
    }

    if chess {
        b = b
            .add_edge("intake", "chess_eligibility")
            .add_edge("chess_eligibility", "extraction");
    } else {
        b = b.add_edge("intake", "extraction");
    }

    b = b
        .add_edge("extraction", "validation")
        .add_branch("validation", BranchCondition::Igo, "adjudication")
        .add_branch("validation", BranchCondition::Nigo, "pend")
        .add_edge("pend", "validation");

    if chess {
        b.add_edge("adjudication", "chess_sync")
            .add_edge("chess_sync", "payment")
            .add_edge("payment", "closure")
    } else {
        b.add_edge("adjudication", "payment")
            .add_edge("payment", "closure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_variant_shape() {
        let flow = standard();
        assert_eq!(flow.entry().as_str(), "intake");
        assert_eq!(flow.terminal().as_str(), "closure");
        assert_eq!(flow.gate().unwrap().as_str(), "validation");
        assert_eq!(flow.nodes().len(), 7);
    }

    #[test]
    fn chess_variant_adds_two_stages() {
        let flow = chess_augmented();
        assert_eq!(flow.nodes().len(), 9);
        assert!(flow.contains(&"chess_eligibility".into()));
        assert!(flow.contains(&"chess_sync".into()));
        // Same gate and endpoints as the standard pipeline.
        assert_eq!(flow.gate().unwrap().as_str(), "validation");
        assert_eq!(flow.terminal().as_str(), "closure");
    }
}
