//! Design-level error umbrella.

use thiserror::Error;
use tileflow::{FifoFullError, GatekeeperError, MemoryError};

use crate::config::ConfigError;

/// Any failure an execution call can report.
///
/// Nothing here retries: a configuration error leaves the device untouched, everything else
/// aborts the in-flight tile, and the only recovery path is the global reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NpuError {
    /// The configuration was rejected before any memory access.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A bus-level fault aborted the in-flight tile; partial writes are not rolled back.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A dataflow-contract violation, fatal to the current tile.
    #[error(transparent)]
    Gatekeeper(#[from] GatekeeperError),

    /// A FIFO overran while staging operands.
    #[error(transparent)]
    Fifo(#[from] FifoFullError),
}
