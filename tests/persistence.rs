//! File-backed persistence: per-variant layouts and the event-log archive.

use claimsim::archive::EventLogArchive;
use claimsim::flow::{self, Position};
use claimsim::layout::{self, FileLayoutStore, LayoutStore};
use claimsim::log::LogEvent;
use claimsim::types::FlowVariant;

#[test]
fn file_store_keeps_variants_independent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileLayoutStore::new(dir.path());

    let standard = layout::compute_layout(&flow::graph_for(FlowVariant::Standard));
    let chess = layout::compute_layout(&flow::graph_for(FlowVariant::ChessAugmented));

    store.save(FlowVariant::Standard, &standard).unwrap();
    store.save(FlowVariant::ChessAugmented, &chess).unwrap();

    assert_eq!(store.load(FlowVariant::Standard).unwrap(), Some(standard));
    assert_eq!(
        store.load(FlowVariant::ChessAugmented).unwrap(),
        Some(chess.clone())
    );

    store.clear(FlowVariant::Standard).unwrap();
    assert_eq!(store.load(FlowVariant::Standard).unwrap(), None);
    // Clearing one variant leaves the other alone.
    assert_eq!(store.load(FlowVariant::ChessAugmented).unwrap(), Some(chess));
}

#[test]
fn user_adjustment_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileLayoutStore::new(dir.path());

    let graph = flow::graph_for(FlowVariant::Standard);
    let mut layout = layout::compute_layout(&graph);
    layout
        .positions
        .insert("pend".into(), Position::new(-50.0, 300.0));
    store.save(FlowVariant::Standard, &layout).unwrap();

    let loaded = layout::layout_for(&store, FlowVariant::Standard, &graph).unwrap();
    assert_eq!(loaded.positions[&"pend".into()], Position::new(-50.0, 300.0));
}

#[test]
fn missing_layout_falls_back_to_computed() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLayoutStore::new(dir.path());
    let graph = flow::graph_for(FlowVariant::Standard);

    let fallback = layout::layout_for(&store, FlowVariant::Standard, &graph).unwrap();
    assert_eq!(fallback, layout::compute_layout(&graph));
}

fn sample_events() -> Vec<LogEvent> {
    vec![
        LogEvent::start(1_000, "intake".into()),
        LogEvent::transition(2_000, "intake".into(), "extraction".into(), "done"),
        LogEvent::stage_message(3_000, "extraction".into(), "Reading documents."),
    ]
}

#[test]
fn archive_writes_latest_and_timestamped_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let archive = EventLogArchive::new(dir.path());

    let snapshot = archive
        .save("CLM-2025-1047", "Marie Tremblay", &sample_events())
        .unwrap();
    assert!(snapshot.exists());

    let latest = archive.load_latest("CLM-2025-1047").unwrap().unwrap();
    assert_eq!(latest.claim_number, "CLM-2025-1047");
    assert_eq!(latest.patient_name, "Marie Tremblay");
    assert_eq!(latest.events.len(), 3);
    assert_eq!(latest.events[0].to_node.as_str(), "intake");
}

#[test]
fn latest_follows_the_most_recent_save() {
    let dir = tempfile::tempdir().unwrap();
    let archive = EventLogArchive::new(dir.path());

    archive.save("CLM-1", "A B", &sample_events()[..1]).unwrap();
    archive.save("CLM-1", "A B", &sample_events()).unwrap();

    let latest = archive.load_latest("CLM-1").unwrap().unwrap();
    assert_eq!(latest.events.len(), 3);
}

#[test]
fn unknown_claim_has_no_latest() {
    let dir = tempfile::tempdir().unwrap();
    let archive = EventLogArchive::new(dir.path());
    assert!(archive.load_latest("CLM-NONE").unwrap().is_none());
}

#[test]
fn claim_numbers_with_separators_are_sanitized_in_filenames() {
    let dir = tempfile::tempdir().unwrap();
    let archive = EventLogArchive::new(dir.path());

    archive
        .save("CLM 2025/47", "A B", &sample_events())
        .unwrap();
    assert!(dir.path().join("CLM_2025_47_latest.json").exists());
    assert!(archive.load_latest("CLM 2025/47").unwrap().is_some());
}
