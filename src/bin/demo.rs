//! Run the demo claim through the pipeline, narrating to stdout, then
//! archive the event log under `./event_logs`.
//!
//! ```bash
//! cargo run --bin demo
//! RUST_LOG=claimsim=debug cargo run --bin demo
//! ```

use std::time::Duration;

use claimsim::archive::EventLogArchive;
use claimsim::branch::BranchPolicy;
use claimsim::claims;
use claimsim::events::{EventBus, StdOutSink};
use claimsim::sim::{Phase, SimConfig, Simulator};
use claimsim::telemetry;

#[tokio::main]
async fn main() -> miette::Result<()> {
    telemetry::init_tracing();

    let bus = EventBus::with_sink(StdOutSink::default());
    bus.listen_for_events();

    let claim = claims::demo_claim();
    let config = SimConfig::new()
        .with_policy(BranchPolicy::AlwaysNigoOnce)
        .with_speed(4.0);
    let (sim, _task) = Simulator::spawn(claim.clone(), config, bus.get_sender());

    sim.play().await?;
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = sim.snapshot().await?;
        if matches!(snapshot.phase, Phase::Terminal(_)) {
            let archive = EventLogArchive::new("event_logs");
            let path =
                archive.save(&claim.claim_number, &claim.patient_name, &snapshot.log)?;
            println!("event log archived to {}", path.display());
            break;
        }
    }

    sim.shutdown().await?;
    bus.stop_listener().await;
    Ok(())
}
