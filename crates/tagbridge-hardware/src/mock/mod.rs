//! Mock reader implementation for simulation and testing.
//!
//! This module provides a reader that can be scripted ahead of time or
//! driven live through a handle, without physical hardware.

pub mod bus;
pub mod reader;

pub use bus::{BusTransaction, MockBus};
pub use reader::{MockReader, MockReaderHandle, MockTag, PollStep};
