//! Multi-reader tag polling station.
//!
//! The station polls a fixed set of readers on a shared bus, tracks tag
//! presence per slot, decodes tag payloads, and reports what happens as a
//! line-oriented event stream:
//!
//! ```text
//! UID:1:04A3B2C1D2E3F4
//! PAYLOAD:Cat
//! REMOVED:1
//! ```
//!
//! - [`manager`]: [`ReaderManager`], startup probing and the poll loop
//! - [`slot`]: [`ReaderSlot`] with liveness and fault counting
//! - [`presence`]: per-slot presence state machine
//! - [`sink`]: where events go
//! - [`config`]: [`StationConfig`]

pub mod config;
pub mod error;
pub mod manager;
pub mod presence;
pub mod sink;
pub mod slot;

pub use config::StationConfig;
pub use error::{Result, StationError};
pub use manager::{CycleReport, InitReport, ReaderManager};
pub use presence::{PayloadSource, PollOutcome, PresenceState, Transition};
pub use sink::{EventSink, LineSink};
pub use slot::{Liveness, ReaderSlot};
