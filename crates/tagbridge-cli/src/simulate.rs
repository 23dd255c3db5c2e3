//! `tagbridge simulate`: the reader station without hardware.
//!
//! A scenario file lists mock readers and what each answers to successive
//! polls. The real [`ReaderManager`] runs against them and the event
//! stream goes to stdout exactly as the station would write it to its
//! serial port, startup lines included.
//!
//! ```json
//! {
//!   "cycles": 4,
//!   "readers": [
//!     { "name": "pn532-gp5",
//!       "steps": [ { "kind": "tag", "uid": "04A3B2C1", "text": "Cat" } ] },
//!     { "name": "pn532-gp6", "probe_fails": true }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use tagbridge_hardware::AnyTagReader;
use tagbridge_hardware::mock::{MockReader, PollStep};
use tagbridge_station::{LineSink, ReaderManager, StationConfig};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::cli::SimulateArgs;
use crate::error::SetupError;

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub station: StationConfig,

    /// Poll cycles to run; defaults to the longest reader script.
    #[serde(default)]
    pub cycles: Option<u64>,

    pub readers: Vec<ReaderScript>,
}

/// One mock reader, in slot order.
#[derive(Debug, Deserialize)]
pub struct ReaderScript {
    pub name: String,

    #[serde(default)]
    pub probe_fails: bool,

    #[serde(default)]
    pub steps: Vec<PollStep>,
}

impl ReaderScript {
    fn into_reader(self) -> AnyTagReader {
        let reader = MockReader::scripted(self.name, self.steps);
        if self.probe_fails {
            reader.with_failing_probe().into()
        } else {
            reader.into()
        }
    }
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, SetupError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let text = std::fs::read_to_string(path).map_err(|source| SetupError::ReadScenario {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    fn script_len(&self) -> u64 {
        self.readers
            .iter()
            .map(|reader| reader.steps.len() as u64)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSummary {
    pub cycles: u64,
    pub events: usize,
    pub faults: usize,
}

pub async fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let cycles = args
        .cycles
        .or(scenario.cycles)
        .unwrap_or_else(|| scenario.script_len());

    let mut stdout = tokio::io::stdout();
    let summary = simulate(scenario, cycles, &mut stdout).await?;

    info!(
        cycles = summary.cycles,
        events = summary.events,
        faults = summary.faults,
        "Simulation finished"
    );
    Ok(())
}

/// Probe the scenario's readers, then run `cycles` poll cycles, writing the
/// station's output to `out`.
///
/// Stops early once every reader is disabled.
pub async fn simulate<W: AsyncWrite + Unpin>(
    scenario: Scenario,
    cycles: u64,
    out: &mut W,
) -> anyhow::Result<SimulationSummary> {
    let mut manager = ReaderManager::new(scenario.station).map_err(SetupError::from)?;
    let readers = scenario
        .readers
        .into_iter()
        .map(ReaderScript::into_reader)
        .collect();

    let report = manager.initialize(readers).await;
    for slot in manager.slots() {
        let line = if report.failed.contains(&slot.id()) {
            format!("Didn't find PN53x board on reader {}\n", slot.id())
        } else {
            format!("Reader {} ({}): OK\n", slot.id(), slot.name())
        };
        out.write_all(line.as_bytes()).await?;
    }
    out.write_all(b"Waiting for ISO14443A cards ...\n").await?;

    let max_faults = manager.config().max_faults;
    let mut summary = SimulationSummary::default();

    while summary.cycles < cycles && manager.active_slot_count() > 0 {
        let cycle = manager.poll_cycle(&mut LineSink::new(&mut *out)).await?;
        summary.cycles += 1;
        summary.events += cycle.events;
        summary.faults += cycle.faults;

        for slot in cycle.newly_disabled {
            let line = format!("Reader {slot} disabled after {max_faults} read errors\n");
            out.write_all(line.as_bytes()).await?;
        }
    }

    out.flush().await?;
    Ok(summary)
}
