//! Reader manager.
//!
//! Owns every reader slot and polls them round-robin, one reader
//! transaction at a time, since all readers share one bus.
//!
//! ```text
//!              poll_cycle()
//!   ┌─────────────────────────────────────────┐
//!   │ slot 1 ─► slot 2 ─► slot 3 ─► slot 4    │   disabled slots skipped
//!   └────┬─────────┬─────────┬─────────┬──────┘
//!        │ poll (bounded), decode (budgeted)
//!        ▼
//!   presence step ─► UID / PAYLOAD / REMOVED ─► EventSink
//! ```
//!
//! # Examples
//!
//! ```
//! use tagbridge_core::{TagEvent, TagUid};
//! use tagbridge_hardware::AnyTagReader;
//! use tagbridge_hardware::mock::{MockReader, MockTag, PollStep};
//! use tagbridge_station::{ReaderManager, StationConfig};
//!
//! #[tokio::main]
//! async fn main() -> tagbridge_station::Result<()> {
//!     let uid = TagUid::from_hex("04A3B2C1").unwrap();
//!     let tag = MockTag::with_text(uid, "Goblin");
//!     let reader = MockReader::scripted("r1", vec![PollStep::Tag(tag)]);
//!
//!     let mut manager = ReaderManager::new(StationConfig::default())?;
//!     manager.initialize(vec![AnyTagReader::from(reader)]).await;
//!
//!     let mut events = Vec::new();
//!     manager.poll_cycle(&mut events).await?;
//!     assert_eq!(events[1], TagEvent::Payload("Goblin".to_string()));
//!     Ok(())
//! }
//! ```

use tagbridge_core::{SlotId, TagEvent};
use tagbridge_hardware::{AnyTagReader, ReaderInfo, TagReader};
use tracing::{debug, info, warn};

use crate::config::StationConfig;
use crate::error::Result;
use crate::presence::{PayloadSource, Transition};
use crate::sink::EventSink;
use crate::slot::{ReaderSlot, SlotPoll};

/// Outcome of startup probing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Slots that answered the probe.
    pub ready: Vec<(SlotId, ReaderInfo)>,
    /// Slots that did not answer and are disabled.
    pub failed: Vec<SlotId>,
}

impl InitReport {
    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Slots polled this cycle.
    pub polled: usize,
    /// Polls that faulted.
    pub faults: usize,
    /// Slots disabled during this cycle.
    pub newly_disabled: Vec<SlotId>,
    /// Events emitted.
    pub events: usize,
}

/// Polls all reader slots and turns their presence changes into events.
#[derive(Debug)]
pub struct ReaderManager {
    config: StationConfig,
    slots: Vec<ReaderSlot>,
}

impl ReaderManager {
    /// Create a manager with no slots.
    ///
    /// # Errors
    ///
    /// Returns `StationError::InvalidConfig` if the config does not validate.
    pub fn new(config: StationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            slots: Vec::new(),
        })
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Attach readers as slots 1..=n and probe each once.
    ///
    /// Readers that fail the probe are disabled and never polled. Having no
    /// working reader is not an error; the report says so.
    pub async fn initialize(&mut self, readers: Vec<AnyTagReader>) -> InitReport {
        let mut report = InitReport::default();

        for reader in readers {
            let Ok(index) = u8::try_from(self.slots.len()) else {
                warn!(reader = reader.name(), "no slot index left, reader ignored");
                continue;
            };
            let mut slot = ReaderSlot::new(SlotId::from_index(index), reader);

            match slot.probe(&self.config).await {
                Ok(firmware) => {
                    info!(slot = %slot.id(), reader = slot.name(), %firmware, "Reader ready");
                    report
                        .ready
                        .push((slot.id(), ReaderInfo::new(slot.name(), firmware)));
                }
                Err(e) => {
                    warn!(
                        slot = %slot.id(),
                        reader = slot.name(),
                        error = %e,
                        "Reader not found, slot disabled"
                    );
                    report.failed.push(slot.id());
                }
            }
            self.slots.push(slot);
        }

        if report.ready.is_empty() {
            warn!("No reader answered the probe");
        }
        report
    }

    /// Poll every active slot once, in slot order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the sink fails. Reader faults are counted
    /// per slot and never surface here.
    pub async fn poll_cycle<S: EventSink>(&mut self, sink: &mut S) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for slot in self.slots.iter_mut().filter(|slot| slot.is_active()) {
            report.polled += 1;

            match slot.poll(&self.config).await {
                SlotPoll::Fault { error, disabled } => {
                    report.faults += 1;
                    if disabled {
                        warn!(
                            slot = %slot.id(),
                            faults = slot.consecutive_faults(),
                            %error,
                            "Reader disabled after repeated faults"
                        );
                        report.newly_disabled.push(slot.id());
                    }
                }
                SlotPoll::Polled(transition) => {
                    report.events += emit_transition(slot.id(), transition, sink).await?;
                }
            }
        }

        Ok(report)
    }

    /// Poll forever.
    ///
    /// Returns `Ok(())` once every slot is disabled, since nothing can
    /// happen after that.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub async fn run<S: EventSink>(&mut self, sink: &mut S) -> Result<()> {
        info!(active = self.active_slot_count(), "Polling readers");

        while self.active_slot_count() > 0 {
            self.poll_cycle(sink).await?;
            tokio::task::yield_now().await;
        }

        warn!("All readers disabled, polling stopped");
        Ok(())
    }

    pub fn slots(&self) -> &[ReaderSlot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> Option<&ReaderSlot> {
        self.slots.get(id.index())
    }

    pub fn active_slot_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_active()).count()
    }
}

/// Turn one presence step into events; returns how many were emitted.
async fn emit_transition<S: EventSink>(
    slot: SlotId,
    transition: Transition,
    sink: &mut S,
) -> Result<usize> {
    match transition {
        Transition::Resolved {
            uid,
            payload,
            source,
        } => {
            match source {
                PayloadSource::Decoded => info!(%slot, %uid, %payload, "Tag identified"),
                PayloadSource::RawUid => info!(%slot, %uid, "Tag identified, payload unreadable"),
            }
            sink.emit(TagEvent::Uid { slot, uid }).await?;
            sink.emit(TagEvent::Payload(payload)).await?;
            Ok(2)
        }
        Transition::Removed { uid } => {
            info!(%slot, %uid, "Tag removed");
            sink.emit(TagEvent::Removed { slot }).await?;
            Ok(1)
        }
        Transition::Pending { uid, retries } => {
            debug!(%slot, %uid, retries, "Payload not readable yet");
            Ok(0)
        }
        Transition::Dropped { uid } => {
            debug!(%slot, %uid, "Unannounced tag left");
            Ok(0)
        }
        Transition::Unchanged => Ok(0),
    }
}
