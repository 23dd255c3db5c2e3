/// Result type alias for station operations.
pub type Result<T> = std::result::Result<T, StationError>;

/// Errors that stop the station.
///
/// Reader faults and decode failures never show up here; they are absorbed
/// per slot. What remains is bad configuration and a broken event output.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// Configuration value out of range.
    #[error("Invalid station configuration: {0}")]
    InvalidConfig(String),

    /// Writing to the event output failed.
    #[error("Event output error: {0}")]
    Sink(#[from] std::io::Error),

    /// The event consumer went away.
    #[error("Event output closed")]
    SinkClosed,
}
