//! Pure simulation state machine.
//!
//! The [`Engine`] owns everything about a run except time: phase, stage
//! statuses, gate resolution, the event log, and the visible message window
//! for the active stage. Every mutation takes the caller's timestamp and
//! returns the display events it produced, so the whole machine is
//! deterministic under test — the actor in [`super::runner`] is the only
//! place timers live.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::branch::BranchResolver;
use crate::claims::Claim;
use crate::events::SimEvent;
use crate::flow::{self, FlowGraph};
use crate::log::{EventLog, EventLogError, LogEvent};
use crate::scripts::ScriptLibrary;
use crate::types::{StageId, StageStatus};

/// Where a run currently is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "stage")]
pub enum Phase {
    /// No run in progress; all stages idle.
    NotStarted,
    /// Exactly this stage is active.
    StageActive(StageId),
    /// The run finished at the terminal stage.
    Terminal(StageId),
}

/// One narrated line currently visible on the active stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleMessage {
    pub index: usize,
    pub text: String,
    pub timestamp: i64,
}

/// Errors from invalid engine transitions.
#[derive(Debug, Error, Diagnostic)]
pub enum SimError {
    #[error("run already in progress")]
    #[diagnostic(code(claimsim::sim::already_running))]
    AlreadyRunning,

    #[error("no run in progress")]
    #[diagnostic(
        code(claimsim::sim::not_running),
        help("Start a run before advancing or pausing it.")
    )]
    NotRunning,

    #[error("stage {stage} has no outgoing edge")]
    #[diagnostic(code(claimsim::sim::stuck))]
    Stuck { stage: StageId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Log(#[from] EventLogError),
}

/// Outcome of showing one script line.
#[derive(Clone, Debug)]
pub struct LineShown {
    pub event: SimEvent,
    /// Delay before the next line (or the settle period) begins.
    pub delay_ms: u64,
    pub is_last: bool,
}

/// Point-in-time view of a run, served to observers.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimSnapshot {
    pub run_id: Option<String>,
    #[serde(flatten)]
    pub phase: Phase,
    pub claim_number: String,
    pub variant: String,
    pub stages: Vec<StageView>,
    pub visible_messages: Vec<VisibleMessage>,
    pub log: Vec<LogEvent>,
    pub speed: f64,
    pub paused: bool,
    /// Wall-clock run time in milliseconds, excluding paused stretches.
    /// Frozen at the terminal phase; zero before the first start and after
    /// a reset.
    pub elapsed_ms: u64,
}

/// Stage status line within a snapshot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub id: StageId,
    pub label: String,
    pub status: StageStatus,
}

/// The deterministic core of a simulation run.
pub struct Engine {
    claim: Claim,
    graph: FlowGraph,
    library: ScriptLibrary,
    resolver: BranchResolver,
    log: EventLog,
    phase: Phase,
    run_id: Option<String>,
    visible: Vec<VisibleMessage>,
    next_line: usize,
}

impl Engine {
    /// Engine for one claim, using the claim's flow variant.
    #[must_use]
    pub fn new(claim: Claim, library: ScriptLibrary, resolver: BranchResolver) -> Self {
        let graph = flow::graph_for(claim.flow_variant());
        Self::with_graph(claim, graph, library, resolver)
    }

    /// Engine over an explicit graph, for flows built with
    /// [`crate::flow::FlowBuilder`] rather than a shipped variant.
    #[must_use]
    pub fn with_graph(
        claim: Claim,
        graph: FlowGraph,
        library: ScriptLibrary,
        resolver: BranchResolver,
    ) -> Self {
        Self {
            claim,
            graph,
            library,
            resolver,
            log: EventLog::new(),
            phase: Phase::NotStarted,
            run_id: None,
            visible: Vec::new(),
            next_line: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    #[must_use]
    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    #[must_use]
    pub fn visible_messages(&self) -> &[VisibleMessage] {
        &self.visible
    }

    /// The currently active stage, if the run is mid-flight.
    #[must_use]
    pub fn active_stage(&self) -> Option<&StageId> {
        match &self.phase {
            Phase::StageActive(stage) => Some(stage),
            _ => None,
        }
    }

    /// Unscaled dwell of the active stage.
    #[must_use]
    pub fn active_dwell_ms(&self) -> Option<u64> {
        self.active_stage()
            .and_then(|s| self.graph.node(s))
            .map(|n| n.duration_ms)
    }

    /// Settle delay of the active stage's script (0 without a script).
    #[must_use]
    pub fn active_settle_ms(&self) -> u64 {
        self.active_script().map_or(0, |s| s.settle_ms)
    }

    fn active_script(&self) -> Option<&crate::scripts::StageScript> {
        let stage = self.active_stage()?;
        self.library.script_for(stage, &self.claim.script_keys())
    }

    /// Begin a run from the entry stage.
    pub fn start(&mut self, ts: i64) -> Result<Vec<SimEvent>, SimError> {
        if matches!(self.phase, Phase::StageActive(_)) {
            return Err(SimError::AlreadyRunning);
        }
        // Replay after a terminal run begins from a clean slate.
        self.reset();

        let run_id = Uuid::new_v4().to_string();
        let entry = self.graph.entry().clone();
        self.set_status(&entry, StageStatus::Active);
        self.phase = Phase::StageActive(entry.clone());
        self.run_id = Some(run_id.clone());
        self.log.append(LogEvent::start(ts, entry.clone()));

        Ok(vec![SimEvent::RunStarted {
            timestamp: ts,
            run_id,
            variant: self.claim.flow_variant(),
            entry,
        }])
    }

    /// Reveal the next script line on the active stage.
    ///
    /// Returns `Ok(None)` once the script is exhausted (or the stage has no
    /// script). The line is appended to the event log, carrying its action
    /// tag when one is attached.
    pub fn show_next_line(&mut self, ts: i64) -> Result<Option<LineShown>, SimError> {
        let stage = self.active_stage().ok_or(SimError::NotRunning)?.clone();
        let Some(script) = self.active_script() else {
            return Ok(None);
        };
        let index = self.next_line;
        let Some(line) = script.lines.get(index).cloned() else {
            return Ok(None);
        };
        let is_last = index + 1 == script.len();
        self.next_line += 1;

        self.visible.push(VisibleMessage {
            index,
            text: line.text.clone(),
            timestamp: ts,
        });

        let mut entry = LogEvent::stage_message(ts, stage.clone(), line.text.clone());
        if let Some(action) = line.action {
            entry = entry.with_action(action, line.action_data.unwrap_or(Value::Null));
        }
        self.log.append(entry);

        Ok(Some(LineShown {
            event: SimEvent::StageMessage {
                timestamp: ts,
                stage,
                index,
                text: line.text,
            },
            delay_ms: line.delay_ms,
            is_last,
        }))
    }

    /// Complete the active stage and advance along the flow.
    ///
    /// At the gate the branch resolver picks the edge; everywhere else the
    /// single unconditional successor is taken. Completing the terminal
    /// stage ends the run.
    pub fn complete_stage(&mut self, ts: i64) -> Result<Vec<SimEvent>, SimError> {
        let stage = self.active_stage().ok_or(SimError::NotRunning)?.clone();
        let label = self
            .graph
            .node(&stage)
            .map(|n| n.label.clone())
            .unwrap_or_else(|| stage.to_string());
        let phrase = self
            .active_script()
            .and_then(|s| s.completion.clone())
            .unwrap_or_else(|| format!("{label} completed."));

        let mut events = Vec::new();
        events.push(SimEvent::StageCompleted {
            timestamp: ts,
            stage: stage.clone(),
            phrase: phrase.clone(),
        });
        self.log.append(LogEvent::stage_message(ts, stage.clone(), phrase));

        if &stage == self.graph.terminal() {
            self.set_status(&stage, StageStatus::Done);
            self.phase = Phase::Terminal(stage.clone());
            self.clear_messages();
            let run_id = self.run_id.clone().unwrap_or_default();
            events.push(SimEvent::RunCompleted {
                timestamp: ts,
                run_id,
                terminal: stage,
            });
            return Ok(events);
        }

        let (edge_id, condition, target, reason) = if self.graph.gate() == Some(&stage) {
            let decision = self.resolver.decide();
            let edge = self
                .graph
                .gate_edge(&stage, decision.condition)
                .ok_or_else(|| SimError::Stuck { stage: stage.clone() })?;
            (
                edge.id.clone(),
                edge.condition,
                edge.target.clone(),
                decision.reason,
            )
        } else {
            let edge = self
                .graph
                .unconditional_successor(&stage)
                .ok_or_else(|| SimError::Stuck { stage: stage.clone() })?;
            (
                edge.id.clone(),
                edge.condition,
                edge.target.clone(),
                format!("{label} finished processing."),
            )
        };

        self.set_status(&stage, StageStatus::Done);
        self.set_status(&target, StageStatus::Active);
        self.phase = Phase::StageActive(target.clone());
        self.clear_messages();

        events.push(SimEvent::EdgeTraversed {
            timestamp: ts,
            edge_id,
            condition,
        });
        events.push(SimEvent::TransitionTaken {
            timestamp: ts,
            from: stage.clone(),
            to: target.clone(),
            reason: reason.clone(),
        });
        self.log.append(LogEvent::transition(ts, stage, target, reason));

        Ok(events)
    }

    /// Edit the action payload of a log entry in place.
    pub fn edit_action(&mut self, index: usize, data: Value) -> Result<(), SimError> {
        self.log.update_action_data(index, data)?;
        Ok(())
    }

    /// Return to [`Phase::NotStarted`]: statuses idle, log empty, resolver
    /// back to first-visit state. Positions are untouched.
    pub fn reset(&mut self) {
        self.graph.reset_statuses();
        self.resolver.reset();
        self.log.clear();
        self.clear_messages();
        self.phase = Phase::NotStarted;
        self.run_id = None;
    }

    /// Snapshot of the engine's portion of run state; the actor fills in
    /// `speed`, `paused`, and the elapsed clock.
    #[must_use]
    pub fn snapshot(&self, speed: f64, paused: bool, elapsed_ms: u64) -> SimSnapshot {
        SimSnapshot {
            run_id: self.run_id.clone(),
            phase: self.phase.clone(),
            claim_number: self.claim.claim_number.clone(),
            variant: self.claim.flow_variant().as_str().to_string(),
            stages: self
                .graph
                .nodes()
                .iter()
                .map(|n| StageView {
                    id: n.id.clone(),
                    label: n.label.clone(),
                    status: n.status,
                })
                .collect(),
            visible_messages: self.visible.clone(),
            log: self.log.to_vec(),
            speed,
            paused,
            elapsed_ms,
        }
    }

    fn clear_messages(&mut self) {
        self.visible.clear();
        self.next_line = 0;
    }

    fn set_status(&mut self, stage: &StageId, status: StageStatus) {
        if let Some(node) = self.graph.node_mut(stage) {
            node.status = status;
        }
    }
}
