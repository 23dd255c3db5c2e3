//! Reader slot: one reader on the shared bus plus its per-slot state.

use std::fmt;

use tagbridge_core::{SlotId, TagUid};
use tagbridge_hardware::{AnyTagReader, FirmwareInfo, HardwareError, TagReader};
use tagbridge_rfid::read_payload;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::config::StationConfig;
use crate::presence::{PollOutcome, PresenceState, Transition};

/// Whether a slot still takes part in polling.
///
/// There is no way back from `Disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Active,
    Disabled,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Liveness::Active => write!(f, "active"),
            Liveness::Disabled => write!(f, "disabled"),
        }
    }
}

/// What polling a slot once did.
#[derive(Debug)]
pub(crate) enum SlotPoll {
    /// The poll succeeded and drove one presence step.
    Polled(Transition),
    /// The poll faulted; `disabled` is set when this fault hit the limit.
    Fault { error: HardwareError, disabled: bool },
}

/// One reader slot.
#[derive(Debug)]
pub struct ReaderSlot {
    id: SlotId,
    reader: AnyTagReader,
    liveness: Liveness,
    consecutive_faults: u32,
    presence: PresenceState,
    firmware: Option<FirmwareInfo>,
}

impl ReaderSlot {
    pub(crate) fn new(id: SlotId, reader: AnyTagReader) -> Self {
        Self {
            id,
            reader,
            liveness: Liveness::Active,
            consecutive_faults: 0,
            presence: PresenceState::Idle,
            firmware: None,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.reader.name()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_active(&self) -> bool {
        self.liveness == Liveness::Active
    }

    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    pub fn presence(&self) -> &PresenceState {
        &self.presence
    }

    /// Tag currently associated with the slot, announced or not.
    pub fn current_uid(&self) -> Option<&TagUid> {
        self.presence.uid()
    }

    /// Firmware reported at startup; `None` if the probe failed.
    pub fn firmware(&self) -> Option<FirmwareInfo> {
        self.firmware
    }

    pub(crate) fn disable(&mut self) {
        self.liveness = Liveness::Disabled;
    }

    /// Run the one-time firmware probe. A failed probe disables the slot.
    pub(crate) async fn probe(
        &mut self,
        config: &StationConfig,
    ) -> Result<FirmwareInfo, HardwareError> {
        let result = match timeout(config.probe_timeout(), self.reader.probe()).await {
            Ok(result) => result,
            Err(_) => Err(HardwareError::timeout(config.probe_timeout_ms)),
        };

        match result {
            Ok(firmware) => {
                self.firmware = Some(firmware);
                Ok(firmware)
            }
            Err(e) => {
                self.disable();
                Err(e)
            }
        }
    }

    /// Poll the reader once and advance the presence state.
    ///
    /// Must only be called on an active slot.
    pub(crate) async fn poll(&mut self, config: &StationConfig) -> SlotPoll {
        let poll = self.reader.poll_tag(config.poll_timeout());
        let polled = match timeout(config.poll_guard(), poll).await {
            Err(_) => {
                trace!(slot = %self.id, "poll guard elapsed");
                Ok(None)
            }
            Ok(Err(e)) if e.is_timeout() => Ok(None),
            Ok(result) => result,
        };

        let uid = match polled {
            Ok(uid) => uid,
            Err(error) => {
                self.consecutive_faults += 1;
                let disabled = self.consecutive_faults >= config.max_faults;
                if disabled {
                    self.disable();
                }
                debug!(slot = %self.id, faults = self.consecutive_faults, %error, "poll fault");
                return SlotPoll::Fault { error, disabled };
            }
        };
        self.consecutive_faults = 0;

        let outcome = PollOutcome::from(uid);
        let decoded = if self.presence.wants_decode(&outcome) {
            self.decode(config).await
        } else {
            None
        };

        let transition = self
            .presence
            .advance(outcome, decoded, config.max_decode_retries);
        SlotPoll::Polled(transition)
    }

    async fn decode(&mut self, config: &StationConfig) -> Option<String> {
        let attempt = read_payload(&mut self.reader, config.memory_layout());
        match timeout(config.decode_budget(), attempt).await {
            Ok(decoded) => decoded,
            Err(_) => {
                debug!(slot = %self.id, budget_ms = config.decode_budget_ms, "decode budget exceeded");
                None
            }
        }
    }
}
