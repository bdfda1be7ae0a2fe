//! End-to-end simulator runs driven through the actor handle, with tokio's
//! paused clock auto-advancing the stage timers.

use std::time::Duration;

use claimsim::branch::BranchPolicy;
use claimsim::claims;
use claimsim::events::{self, SimEvent};
use claimsim::sim::{Phase, SimConfig, Simulator};
use claimsim::types::StageStatus;
use futures_util::StreamExt;

fn config(policy: BranchPolicy) -> SimConfig {
    SimConfig::new().with_policy(policy).with_seed(7)
}

/// Total scripted run time is well under this; sleeping this long on the
/// paused clock drains every timer.
const WHOLE_RUN: Duration = Duration::from_secs(600);

fn transitions_to<'a>(events: &'a [SimEvent], stage: &str) -> Vec<&'a SimEvent> {
    events
        .iter()
        .filter(|e| matches!(e, SimEvent::TransitionTaken { to, .. } if to.as_str() == stage))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn igo_run_walks_the_happy_path() {
    let (event_tx, event_rx) = flume::unbounded();
    let (sim, task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;

    let snapshot = sim.snapshot().await.unwrap();
    assert!(matches!(&snapshot.phase, Phase::Terminal(t) if t.as_str() == "closure"));
    assert!(snapshot.stages.iter().all(|s| s.status == StageStatus::Done
        || s.id.as_str() == "pend" && s.status == StageStatus::Idle));

    sim.shutdown().await.unwrap();
    task.await.unwrap();

    let events: Vec<SimEvent> = event_rx.drain().collect();
    assert!(transitions_to(&events, "pend").is_empty());
    assert!(events.iter().any(|e| matches!(e, SimEvent::RunCompleted { .. })));
    // Stages visited in order: intake, extraction, validation, adjudication,
    // payment, closure — five transitions plus run start/end.
    let transition_count = events
        .iter()
        .filter(|e| matches!(e, SimEvent::TransitionTaken { .. }))
        .count();
    assert_eq!(transition_count, 5);
}

#[tokio::test(start_paused = true)]
async fn nigo_detours_through_pend_once_and_terminates() {
    let (event_tx, event_rx) = flume::unbounded();
    let (sim, task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysNigoOnce),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;

    let snapshot = sim.snapshot().await.unwrap();
    assert!(matches!(&snapshot.phase, Phase::Terminal(_)));

    sim.shutdown().await.unwrap();
    task.await.unwrap();

    let events: Vec<SimEvent> = event_rx.drain().collect();
    assert_eq!(transitions_to(&events, "pend").len(), 1);
    // The gate was decided twice: NIGO to pend, then IGO onward.
    assert_eq!(transitions_to(&events, "adjudication").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exactly_one_stage_active_while_running() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    for _ in 0..12 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let snapshot = sim.snapshot().await.unwrap();
        let active = snapshot
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Active)
            .count();
        match snapshot.phase {
            Phase::StageActive(_) => assert_eq!(active, 1),
            _ => assert_eq!(active, 0),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_the_run_and_resume_continues() {
    let (event_tx, event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    sim.pause().await.unwrap();

    let frozen = sim.snapshot().await.unwrap();
    assert!(frozen.paused);
    let stage_before = frozen.phase.clone();
    let log_before = frozen.log.len();

    // A very long paused wait changes nothing: no timers fire, no messages
    // appear, the same stage stays active.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    let still = sim.snapshot().await.unwrap();
    assert_eq!(still.phase, stage_before);
    assert_eq!(still.log.len(), log_before);

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;
    let done = sim.snapshot().await.unwrap();
    assert!(matches!(done.phase, Phase::Terminal(_)));

    let events: Vec<SimEvent> = event_rx.drain().collect();
    assert!(events.iter().any(|e| matches!(e, SimEvent::Paused { .. })));
    assert!(events.iter().any(|e| matches!(e, SimEvent::Resumed { .. })));
}

#[tokio::test(start_paused = true)]
async fn step_advances_one_stage_at_a_time_while_held() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.step().await.unwrap();
    let s1 = sim.snapshot().await.unwrap();
    assert!(s1.paused);
    assert!(matches!(&s1.phase, Phase::StageActive(s) if s.as_str() == "intake"));

    sim.step().await.unwrap();
    let s2 = sim.snapshot().await.unwrap();
    assert!(matches!(&s2.phase, Phase::StageActive(s) if s.as_str() == "extraction"));

    // Held: no timer may fire between steps.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    let s3 = sim.snapshot().await.unwrap();
    assert_eq!(s3.phase, s2.phase);
}

#[tokio::test(start_paused = true)]
async fn reset_returns_to_not_started_with_empty_log() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    sim.reset().await.unwrap();

    let snapshot = sim.snapshot().await.unwrap();
    assert!(matches!(snapshot.phase, Phase::NotStarted));
    assert!(snapshot.log.is_empty());
    assert!(snapshot.visible_messages.is_empty());
    assert!(snapshot.stages.iter().all(|s| s.status == StageStatus::Idle));

    // A fresh run starts cleanly after reset.
    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;
    let done = sim.snapshot().await.unwrap();
    assert!(matches!(done.phase, Phase::Terminal(_)));
}

#[tokio::test(start_paused = true)]
async fn speed_multiplier_shortens_the_run() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo).with_speed(8.0),
        event_tx,
    );

    sim.play().await.unwrap();
    // At 8x the dwells shrink to a few seconds total; scripts still play at
    // their own pace, so allow for both.
    tokio::time::sleep(Duration::from_secs(120)).await;
    let snapshot = sim.snapshot().await.unwrap();
    assert!(matches!(snapshot.phase, Phase::Terminal(_)));
}

#[tokio::test(start_paused = true)]
async fn replay_after_terminal_starts_a_fresh_run() {
    let (event_tx, event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysNigoOnce),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;
    assert!(matches!(
        sim.snapshot().await.unwrap().phase,
        Phase::Terminal(_)
    ));

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;
    let snapshot = sim.snapshot().await.unwrap();
    assert!(matches!(snapshot.phase, Phase::Terminal(_)));

    let events: Vec<SimEvent> = event_rx.drain().collect();
    let starts = events
        .iter()
        .filter(|e| matches!(e, SimEvent::RunStarted { .. }))
        .count();
    assert_eq!(starts, 2);
    // NIGO-once applies per run: each replay detours through pend once.
    assert_eq!(transitions_to(&events, "pend").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn elapsed_clock_freezes_on_pause_and_zeroes_on_reset() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    assert_eq!(sim.snapshot().await.unwrap().elapsed_ms, 0);

    sim.play().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    sim.pause().await.unwrap();

    let frozen = sim.snapshot().await.unwrap();
    assert!(frozen.elapsed_ms >= 5_000);
    assert!(frozen.elapsed_ms < 6_000);

    // A long paused wait adds nothing to the clock.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    let still = sim.snapshot().await.unwrap();
    assert_eq!(still.elapsed_ms, frozen.elapsed_ms);

    sim.reset().await.unwrap();
    assert_eq!(sim.snapshot().await.unwrap().elapsed_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn elapsed_clock_stops_at_terminal() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;

    let done = sim.snapshot().await.unwrap();
    assert!(matches!(done.phase, Phase::Terminal(_)));
    assert!(done.elapsed_ms > 0);
    // The run finished well before the full wait, so a still-ticking clock
    // would have accumulated the whole 600s.
    assert!(done.elapsed_ms < WHOLE_RUN.as_millis() as u64);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    let later = sim.snapshot().await.unwrap();
    assert_eq!(later.elapsed_ms, done.elapsed_ms);
}

#[tokio::test(start_paused = true)]
async fn stream_subscriber_sees_the_run_in_emit_order() {
    let (event_tx, event_rx) = flume::unbounded();
    let stream = events::event_stream(event_rx);
    let (sim, task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;
    sim.shutdown().await.unwrap();
    task.await.unwrap();

    // The actor held the only sender, so the stream terminates after it.
    let collected: Vec<SimEvent> = stream.collect().await;
    assert!(matches!(collected.first(), Some(SimEvent::RunStarted { .. })));
    assert!(matches!(collected.last(), Some(SimEvent::RunCompleted { .. })));
    assert!(
        collected
            .windows(2)
            .all(|pair| pair[0].timestamp() <= pair[1].timestamp())
    );
}

#[tokio::test(start_paused = true)]
async fn script_messages_reach_log_and_event_stream_equally() {
    let (event_tx, event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;
    let snapshot = sim.snapshot().await.unwrap();

    let events: Vec<SimEvent> = event_rx.drain().collect();
    let displayed = events
        .iter()
        .filter(|e| matches!(e, SimEvent::StageMessage { .. }))
        .count();
    let logged = snapshot
        .log
        .iter()
        .filter(|e| {
            e.from_node.as_ref() == Some(&e.to_node)
                && events.iter().any(|ev| {
                    matches!(ev, SimEvent::StageMessage { text, .. }
                        if Some(text) == e.reason.as_ref())
                })
        })
        .count();
    assert!(displayed > 0);
    assert_eq!(displayed, logged);
}

#[tokio::test(start_paused = true)]
async fn priority_edit_lands_in_the_logged_entry() {
    let (event_tx, _event_rx) = flume::unbounded();
    let (sim, _task) = Simulator::spawn(
        claims::demo_claim(),
        config(BranchPolicy::AlwaysIgo),
        event_tx,
    );

    sim.play().await.unwrap();
    tokio::time::sleep(WHOLE_RUN).await;

    let snapshot = sim.snapshot().await.unwrap();
    let (index, _) = snapshot
        .log
        .iter()
        .enumerate()
        .find(|(_, e)| e.action == Some(claimsim::log::LogAction::SetPriority))
        .expect("adjudication logs a priority action");

    sim.edit_action(index, serde_json::json!({"priority": "urgent"}))
        .await
        .unwrap();

    let after = sim.snapshot().await.unwrap();
    assert_eq!(after.log.len(), snapshot.log.len());
    assert_eq!(
        after.log[index].action_data,
        Some(serde_json::json!({"priority": "urgent"}))
    );
    assert_eq!(after.log[index].timestamp, snapshot.log[index].timestamp);

    // Editing a plain entry is rejected.
    let plain = after
        .log
        .iter()
        .position(|e| e.action.is_none())
        .expect("log has plain entries");
    assert!(sim
        .edit_action(plain, serde_json::json!({"x": 1}))
        .await
        .is_err());
}
