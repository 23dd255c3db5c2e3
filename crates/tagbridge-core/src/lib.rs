pub mod constants;
pub mod error;
pub mod event;
pub mod types;

pub use error::{Error, Result};
pub use event::TagEvent;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
