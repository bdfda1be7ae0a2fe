//! The simulator actor: owns an [`Engine`], drives it from tokio timers, and
//! serializes commands so no observer ever sees a half-applied transition.
//!
//! Two logical timers exist per active stage: the *dwell* timer (the node's
//! duration scaled by the speed multiplier) and the *script* timer (the next
//! narration line, then the settle period; never scaled). The stage
//! completes when both have elapsed. Pausing freezes the exact remaining
//! time of each timer; resuming re-arms from those remainders, so a pause
//! never shortens or extends a stage. An elapsed-time clock accumulates
//! unpaused run time, stops at the terminal phase, and zeroes on reset.

use std::time::Duration;

use chrono::Utc;
use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{error, info, instrument, warn};

use super::config::SimConfig;
use super::state::{Engine, Phase, SimError, SimSnapshot};
use crate::branch::BranchResolver;
use crate::claims::Claim;
use crate::events::SimEvent;

/// Errors surfaced to simulator clients.
#[derive(Debug, Error, Diagnostic)]
pub enum SimulatorError {
    #[error("simulator task has stopped")]
    #[diagnostic(
        code(claimsim::sim::closed),
        help("The simulator was shut down or its task panicked; spawn a new one.")
    )]
    Closed,

    #[error(transparent)]
    #[diagnostic(transparent)]
    State(#[from] SimError),
}

enum Command {
    Play,
    Pause,
    Step,
    Reset,
    SetSpeed(f64),
    EditAction {
        index: usize,
        data: Value,
        reply: oneshot::Sender<Result<(), SimulatorError>>,
    },
    Snapshot(oneshot::Sender<SimSnapshot>),
    Shutdown,
}

/// Cloneable client handle; every method is a message to the actor task.
#[derive(Clone)]
pub struct SimulatorHandle {
    tx: flume::Sender<Command>,
}

impl SimulatorHandle {
    /// Start a run, or resume a paused one. At the terminal phase this
    /// replays from a clean slate.
    pub async fn play(&self) -> Result<(), SimulatorError> {
        self.send(Command::Play).await
    }

    /// Freeze both stage timers, keeping their exact remaining time.
    pub async fn pause(&self) -> Result<(), SimulatorError> {
        self.send(Command::Pause).await
    }

    /// Advance one discrete step while holding: start the run if idle,
    /// otherwise jump the active stage to completion. Leaves the simulator
    /// paused.
    pub async fn step(&self) -> Result<(), SimulatorError> {
        self.send(Command::Step).await
    }

    /// Return to the not-started phase: statuses idle, log cleared.
    pub async fn reset(&self) -> Result<(), SimulatorError> {
        self.send(Command::Reset).await
    }

    /// Change the dwell-time multiplier, rescaling any in-flight dwell.
    pub async fn set_speed(&self, speed: f64) -> Result<(), SimulatorError> {
        self.send(Command::SetSpeed(speed)).await
    }

    /// Edit the action payload of the log entry at `index` in place.
    pub async fn edit_action(&self, index: usize, data: Value) -> Result<(), SimulatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::EditAction { index, data, reply }).await?;
        rx.await.map_err(|_| SimulatorError::Closed)?
    }

    /// Consistent point-in-time view of the whole run.
    pub async fn snapshot(&self) -> Result<SimSnapshot, SimulatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| SimulatorError::Closed)
    }

    /// Stop the actor task.
    pub async fn shutdown(&self) -> Result<(), SimulatorError> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, cmd: Command) -> Result<(), SimulatorError> {
        self.tx
            .send_async(cmd)
            .await
            .map_err(|_| SimulatorError::Closed)
    }
}

/// Factory for the actor task.
pub struct Simulator;

impl Simulator {
    /// Spawn a simulator for one claim. Display events go to `events`;
    /// callers typically pass [`EventBus::get_sender`](crate::events::EventBus::get_sender).
    pub fn spawn(
        claim: Claim,
        config: SimConfig,
        events: flume::Sender<SimEvent>,
    ) -> (SimulatorHandle, JoinHandle<()>) {
        let resolver = match config.seed {
            Some(seed) => BranchResolver::seeded(config.policy, seed),
            None => BranchResolver::new(config.policy),
        };
        let claim_number = claim.claim_number.clone();
        let engine = Engine::new(claim, config.library, resolver);
        let run_loop = RunLoop {
            engine,
            events,
            speed: config.speed.clamp(SimConfig::MIN_SPEED, SimConfig::MAX_SPEED),
            paused: false,
            dwell: Timer::Idle,
            dwell_done: false,
            script: Timer::Idle,
            script_done: false,
            settling: false,
            elapsed: Duration::ZERO,
            running_since: None,
        };

        let (tx, rx) = flume::unbounded();
        let task = tokio::spawn(run_loop.run(rx));
        info!(claim_number, "simulator spawned");
        (SimulatorHandle { tx }, task)
    }
}

#[derive(Clone, Copy, Debug)]
enum Timer {
    Idle,
    Armed(Instant),
    /// Paused with this much time left.
    Frozen(Duration),
}

#[derive(Clone, Copy, Debug)]
enum Slot {
    Dwell,
    Script,
}

struct RunLoop {
    engine: Engine,
    events: flume::Sender<SimEvent>,
    speed: f64,
    paused: bool,
    dwell: Timer,
    dwell_done: bool,
    script: Timer,
    script_done: bool,
    /// Script finished its lines and is in the settle period.
    settling: bool,
    /// Run time accumulated over completed unpaused stretches.
    elapsed: Duration,
    /// Start of the current unpaused stretch; `None` while paused, idle, or
    /// at the terminal phase.
    running_since: Option<Instant>,
}

impl RunLoop {
    #[instrument(name = "sim", skip_all, fields(claim = %self.engine.claim().claim_number))]
    async fn run(mut self, rx: flume::Receiver<Command>) {
        loop {
            match self.next_deadline() {
                Some((at, slot)) => {
                    tokio::select! {
                        cmd = rx.recv_async() => match cmd {
                            Err(_) => break,
                            Ok(cmd) => {
                                if self.handle(cmd) {
                                    break;
                                }
                            }
                        },
                        () = time::sleep_until(at) => self.on_timer(slot),
                    }
                }
                None => match rx.recv_async().await {
                    Err(_) => break,
                    Ok(cmd) => {
                        if self.handle(cmd) {
                            break;
                        }
                    }
                },
            }
        }
    }

    /// Returns true on shutdown.
    fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Step => self.step(),
            Command::Reset => self.reset(),
            Command::SetSpeed(speed) => self.set_speed(speed),
            Command::EditAction { index, data, reply } => {
                let result = self
                    .engine
                    .edit_action(index, data)
                    .map_err(SimulatorError::from);
                let _ = reply.send(result);
            }
            Command::Snapshot(reply) => {
                let elapsed_ms = self.elapsed_now().as_millis() as u64;
                let _ = reply.send(self.engine.snapshot(self.speed, self.paused, elapsed_ms));
            }
            Command::Shutdown => return true,
        }
        false
    }

    fn play(&mut self) {
        match self.engine.phase() {
            Phase::StageActive(_) => {
                if self.paused {
                    self.paused = false;
                    self.thaw_timers();
                    self.running_since = Some(Instant::now());
                    if let Some(stage) = self.engine.active_stage().cloned() {
                        self.emit(SimEvent::Resumed {
                            timestamp: now_ms(),
                            stage,
                        });
                    }
                }
            }
            Phase::NotStarted | Phase::Terminal(_) => {
                self.paused = false;
                self.start_run();
            }
        }
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.freeze_timers();
        self.freeze_clock();
        if let Some(stage) = self.engine.active_stage().cloned() {
            self.emit(SimEvent::Paused {
                timestamp: now_ms(),
                stage,
            });
        }
    }

    fn step(&mut self) {
        if !self.paused {
            self.paused = true;
            self.freeze_timers();
            self.freeze_clock();
        }
        match self.engine.phase() {
            Phase::NotStarted | Phase::Terminal(_) => self.start_run(),
            Phase::StageActive(_) => self.complete_active_stage(),
        }
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.dwell = Timer::Idle;
        self.script = Timer::Idle;
        self.dwell_done = false;
        self.script_done = false;
        self.settling = false;
        self.paused = false;
        self.elapsed = Duration::ZERO;
        self.running_since = None;
        self.emit(SimEvent::diagnostic(now_ms(), "sim", "Simulation reset."));
    }

    fn set_speed(&mut self, speed: f64) {
        let speed = speed.clamp(SimConfig::MIN_SPEED, SimConfig::MAX_SPEED);
        // Rescale the in-flight dwell so the already-elapsed fraction holds.
        let ratio = self.speed / speed;
        self.dwell = match self.dwell {
            Timer::Armed(at) => {
                let now = Instant::now();
                Timer::Armed(now + at.saturating_duration_since(now).mul_f64(ratio))
            }
            Timer::Frozen(d) => Timer::Frozen(d.mul_f64(ratio)),
            Timer::Idle => Timer::Idle,
        };
        self.speed = speed;
        self.emit(SimEvent::SpeedChanged {
            timestamp: now_ms(),
            speed,
        });
    }

    fn start_run(&mut self) {
        match self.engine.start(now_ms()) {
            Ok(events) => {
                // A fresh run restarts the elapsed clock; it only ticks
                // while unpaused.
                self.elapsed = Duration::ZERO;
                self.running_since = (!self.paused).then(Instant::now);
                self.emit_all(events);
                self.enter_stage();
            }
            Err(e) => self.report(e),
        }
    }

    /// Arm both timers for the stage the engine just entered, and reveal the
    /// first script line immediately.
    fn enter_stage(&mut self) {
        self.dwell_done = false;
        self.script_done = false;
        self.settling = false;
        let dwell_ms = self.engine.active_dwell_ms().unwrap_or(0);
        self.dwell = self.arm(self.scaled(dwell_ms));
        self.advance_script();
    }

    fn advance_script(&mut self) {
        match self.engine.show_next_line(now_ms()) {
            Ok(Some(shown)) => {
                let delay = if shown.is_last {
                    self.settling = true;
                    self.engine.active_settle_ms()
                } else {
                    shown.delay_ms
                };
                self.emit(shown.event);
                self.script = self.arm(Duration::from_millis(delay));
            }
            Ok(None) => {
                // No script on this stage; only the dwell gates completion.
                self.script = Timer::Idle;
                self.script_done = true;
                self.maybe_complete();
            }
            Err(e) => self.report(e),
        }
    }

    fn on_timer(&mut self, slot: Slot) {
        match slot {
            Slot::Dwell => {
                self.dwell = Timer::Idle;
                self.dwell_done = true;
                self.maybe_complete();
            }
            Slot::Script => {
                if self.settling {
                    self.script = Timer::Idle;
                    self.script_done = true;
                    self.maybe_complete();
                } else {
                    self.advance_script();
                }
            }
        }
    }

    fn maybe_complete(&mut self) {
        if self.dwell_done && self.script_done && self.engine.active_stage().is_some() {
            self.complete_active_stage();
        }
    }

    fn complete_active_stage(&mut self) {
        match self.engine.complete_stage(now_ms()) {
            Ok(events) => {
                self.emit_all(events);
                match self.engine.phase() {
                    Phase::StageActive(_) => self.enter_stage(),
                    _ => {
                        self.dwell = Timer::Idle;
                        self.script = Timer::Idle;
                        // The clock stops with the run.
                        self.freeze_clock();
                        info!(run_id = ?self.engine.run_id(), "run completed");
                    }
                }
            }
            Err(e) => self.report(e),
        }
    }

    fn next_deadline(&self) -> Option<(Instant, Slot)> {
        let mut best: Option<(Instant, Slot)> = None;
        if let Timer::Armed(at) = self.dwell {
            best = Some((at, Slot::Dwell));
        }
        if let Timer::Armed(at) = self.script
            && best.is_none_or(|(b, _)| at < b)
        {
            best = Some((at, Slot::Script));
        }
        best
    }

    fn arm(&self, duration: Duration) -> Timer {
        if self.paused {
            Timer::Frozen(duration)
        } else {
            Timer::Armed(Instant::now() + duration)
        }
    }

    fn freeze_timers(&mut self) {
        let now = Instant::now();
        for timer in [&mut self.dwell, &mut self.script] {
            if let Timer::Armed(at) = *timer {
                *timer = Timer::Frozen(at.saturating_duration_since(now));
            }
        }
    }

    fn thaw_timers(&mut self) {
        let now = Instant::now();
        for timer in [&mut self.dwell, &mut self.script] {
            if let Timer::Frozen(remaining) = *timer {
                *timer = Timer::Armed(now + remaining);
            }
        }
    }

    fn freeze_clock(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.elapsed += since.elapsed();
        }
    }

    fn elapsed_now(&self) -> Duration {
        match self.running_since {
            Some(since) => self.elapsed + since.elapsed(),
            None => self.elapsed,
        }
    }

    fn scaled(&self, ms: u64) -> Duration {
        Duration::from_secs_f64(ms as f64 / 1000.0 / self.speed)
    }

    fn emit(&self, event: SimEvent) {
        if self.events.send(event).is_err() {
            warn!("display event receiver dropped");
        }
    }

    fn emit_all(&self, events: Vec<SimEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    fn report(&self, error: SimError) {
        error!(error = %error, "simulator transition rejected");
        self.emit(SimEvent::diagnostic(now_ms(), "sim", error.to_string()));
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
