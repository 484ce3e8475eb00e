use std::path::PathBuf;

/// Error type returned on failed vectored writes to the fifo.
///
/// A failed write is fatal to the current render. Transient conditions
/// (an interrupted call, a momentarily full pipe) are retried inside
/// the writer and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("no space left on device")]
    /// The transfer failed because the fifo's backing store is full.
    NoSpaceLeft,

    #[error("error while writing to fifo {path:?}: {source}")]
    /// Any other OS-level transfer failure.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error type returned on rejected location changes.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("changing the location while the fifo is open is not supported")]
    /// A pipe handle is currently open on the previous location.
    Busy,
}
