//! Wire shape and topology of the shipped flow variants.

use claimsim::flow::{self, FlowBuilder};
use claimsim::types::{BranchCondition, FlowVariant, StageId};
use serde_json::json;

#[test]
fn standard_variant_visits_stages_in_pipeline_order() {
    let graph = flow::graph_for(FlowVariant::Standard);
    let order: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(
        order,
        [
            "intake",
            "extraction",
            "validation",
            "pend",
            "adjudication",
            "payment",
            "closure"
        ]
    );
}

#[test]
fn chess_variant_inserts_eligibility_and_sync() {
    let graph = flow::graph_for(FlowVariant::ChessAugmented);

    let eligibility = graph
        .unconditional_successor(&StageId::from("intake"))
        .unwrap();
    assert_eq!(eligibility.target.as_str(), "chess_eligibility");

    let sync = graph
        .unconditional_successor(&StageId::from("adjudication"))
        .unwrap();
    assert_eq!(sync.target.as_str(), "chess_sync");
    assert_eq!(
        graph
            .unconditional_successor(&StageId::from("chess_sync"))
            .unwrap()
            .target
            .as_str(),
        "payment"
    );
}

#[test]
fn gate_edges_carry_both_conditions() {
    for variant in [FlowVariant::Standard, FlowVariant::ChessAugmented] {
        let graph = flow::graph_for(variant);
        let gate = graph.gate().unwrap().clone();
        let igo = graph.gate_edge(&gate, BranchCondition::Igo).unwrap();
        let nigo = graph.gate_edge(&gate, BranchCondition::Nigo).unwrap();
        assert_eq!(igo.target.as_str(), "adjudication");
        assert_eq!(nigo.target.as_str(), "pend");
        // The pend detour loops back to the gate.
        let back = graph
            .unconditional_successor(&StageId::from("pend"))
            .unwrap();
        assert_eq!(&back.target, &gate);
    }
}

#[test]
fn nodes_and_edges_serialize_in_wire_form() {
    let graph = flow::graph_for(FlowVariant::Standard);

    let intake = serde_json::to_value(graph.node(&"intake".into()).unwrap()).unwrap();
    assert_eq!(intake["id"], "intake");
    assert_eq!(intake["durationMs"], 2500);
    assert_eq!(intake["status"], "idle");

    let nigo = graph
        .gate_edge(&"validation".into(), BranchCondition::Nigo)
        .unwrap();
    let edge = serde_json::to_value(nigo).unwrap();
    assert_eq!(edge["condition"], "NIGO");
    assert_eq!(edge["id"], json!("validation-pend-NIGO"));
}

#[test]
fn cyclic_flow_without_conditions_still_finds_entry_and_terminal() {
    // The pend loop must not confuse entry/terminal detection.
    let flow = FlowBuilder::new()
        .add_stage("a", "A", 100)
        .add_stage("gate", "Gate", 100)
        .add_stage("fix", "Fix", 100)
        .add_stage("z", "Z", 100)
        .add_edge("a", "gate")
        .add_branch("gate", BranchCondition::Igo, "z")
        .add_branch("gate", BranchCondition::Nigo, "fix")
        .add_edge("fix", "gate")
        .build()
        .unwrap();
    assert_eq!(flow.entry().as_str(), "a");
    assert_eq!(flow.terminal().as_str(), "z");
}
