use std::path::PathBuf;

/// Error type returned on failed fifo opens.
///
/// Opening is a hard validation step: the rest of the crate assumes
/// fifo semantics for the descriptor, so none of these are recovered
/// from by retrying.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("no fifo location specified for writing")]
    /// No target path was configured.
    NotFound,

    #[error("could not open fifo {path:?} for writing: {source}")]
    /// The open call itself failed.
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path:?} is not a fifo")]
    /// The target exists but is not a named pipe.
    NotAFifo { path: PathBuf },
}
