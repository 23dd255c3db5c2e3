//! Station configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tagbridge_core::constants::{
    DEFAULT_BLOCK_COUNT, DEFAULT_DECODE_BUDGET_MS, DEFAULT_FIRST_BLOCK, DEFAULT_MAX_DECODE_RETRIES,
    DEFAULT_MAX_FAULTS, DEFAULT_POLL_TIMEOUT_MS,
};
use tagbridge_rfid::MemoryLayout;

use crate::error::{Result, StationError};

/// Firmware probes get more time than polls; a reader fresh out of reset
/// answers slowly.
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 500;

/// Tunables for the reader manager.
///
/// Every field has a default, so a partial JSON object is a valid config.
///
/// # Examples
///
/// ```
/// use tagbridge_station::StationConfig;
///
/// let config: StationConfig = serde_json::from_str(r#"{"max_faults": 3}"#).unwrap();
/// assert_eq!(config.max_faults, 3);
/// assert_eq!(config.max_decode_retries, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Bounded wait for one tag poll.
    pub poll_timeout_ms: u64,

    /// Time budget for one payload decode attempt (all block reads).
    pub decode_budget_ms: u64,

    /// Bounded wait for the one-time firmware probe.
    pub probe_timeout_ms: u64,

    /// Consecutive faults after which a slot is disabled for good.
    pub max_faults: u32,

    /// Failed decode attempts after which the raw UID is reported instead.
    pub max_decode_retries: u32,

    /// First tag memory block of the NDEF area.
    pub first_block: u8,

    /// Blocks read per decode attempt.
    pub block_count: u8,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            decode_budget_ms: DEFAULT_DECODE_BUDGET_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            max_faults: DEFAULT_MAX_FAULTS,
            max_decode_retries: DEFAULT_MAX_DECODE_RETRIES,
            first_block: DEFAULT_FIRST_BLOCK,
            block_count: DEFAULT_BLOCK_COUNT,
        }
    }
}

impl StationConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn decode_budget(&self) -> Duration {
        Duration::from_millis(self.decode_budget_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Guard around a whole poll transaction.
    ///
    /// The reader itself waits up to `poll_timeout`; the guard only fires
    /// when a reader stops answering altogether.
    pub fn poll_guard(&self) -> Duration {
        self.poll_timeout() * 2
    }

    pub fn memory_layout(&self) -> MemoryLayout {
        MemoryLayout::new(self.first_block, self.block_count)
    }

    /// Check that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `StationError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.poll_timeout_ms == 0, "poll_timeout_ms must be positive"),
            (self.decode_budget_ms == 0, "decode_budget_ms must be positive"),
            (self.probe_timeout_ms == 0, "probe_timeout_ms must be positive"),
            (self.max_faults == 0, "max_faults must be at least 1"),
            (self.max_decode_retries == 0, "max_decode_retries must be at least 1"),
            (self.block_count == 0, "block_count must be at least 1"),
        ];

        match checks.into_iter().find(|(bad, _)| *bad) {
            Some((_, message)) => Err(StationError::InvalidConfig(message.to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = StationConfig::default();
        assert_eq!(config.poll_timeout(), Duration::from_millis(50));
        assert_eq!(config.max_faults, 5);
        assert_eq!(config.max_decode_retries, 10);
        assert_eq!(config.memory_layout(), MemoryLayout::new(4, 16));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(StationConfig { max_faults: 0, ..Default::default() }, "max_faults")]
    #[case(StationConfig { max_decode_retries: 0, ..Default::default() }, "max_decode_retries")]
    #[case(StationConfig { poll_timeout_ms: 0, ..Default::default() }, "poll_timeout_ms")]
    #[case(StationConfig { block_count: 0, ..Default::default() }, "block_count")]
    fn test_validate_rejects(#[case] config: StationConfig, #[case] field: &str) {
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(field), "{err}");
    }

    #[test]
    fn test_partial_json() {
        let config: StationConfig =
            serde_json::from_str(r#"{"poll_timeout_ms": 20, "block_count": 32}"#).unwrap();
        assert_eq!(config.poll_timeout_ms, 20);
        assert_eq!(config.block_count, 32);
        assert_eq!(config.first_block, 4);
    }
}
