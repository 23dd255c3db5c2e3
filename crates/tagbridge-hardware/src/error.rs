//! Reader transaction errors.
//!
//! A transaction on the shared bus either times out or faults. The timeout
//! is what an idle reader does when nothing is in its field, so callers
//! check [`HardwareError::is_timeout`] before counting anything as a fault.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The reader did not answer the firmware query at startup.
    #[error("Reader probe failed: {reason}")]
    ProbeFailed { reason: String },

    /// No answer within the transaction deadline.
    #[error("Reader timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Garbled or unacknowledged bus exchange.
    #[error("Bus fault: {reason}")]
    Bus { reason: String },

    /// The tag left or refused a memory read.
    #[error("Tag read failed: {reason}")]
    TagRead { reason: String },

    /// The reader (or the mock driving it) is gone.
    #[error("Reader gone: {reader}")]
    Gone { reader: String },

    #[error("Reader I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn bus(reason: impl Into<String>) -> Self {
        Self::Bus {
            reason: reason.into(),
        }
    }

    pub fn tag_read(reason: impl Into<String>) -> Self {
        Self::TagRead {
            reason: reason.into(),
        }
    }

    pub fn gone(reader: impl Into<String>) -> Self {
        Self::Gone {
            reader: reader.into(),
        }
    }

    /// True for a transaction that simply ran out of time.
    ///
    /// For `poll_tag` this is the empty-field outcome, not a fault.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
