//! This module provides a helper type for a slice of [`IoSlice`]s
//! (`std::io::IoSlice`) used as one in-flight scatter/gather request,
//! to advance the buffer cursor after partial vectored IO and to cap
//! the number of entries submitted per call.
//!
//! # Advancing the write cursor
//!
//! Vectored IO system-calls don't guarantee transferring all input
//! buffers in one call. This is why these APIs always return the number
//! of bytes transferred, so that calling the
//! [`TransferWindow::advance`] method offsets the start of the slices
//! by that number of bytes: fully-consumed leading entries are dropped
//! from the window and a partially-consumed leading entry is resliced
//! past its consumed prefix.
//!
//! ```text
//! --------------------------------------
//! | entry: 4096    | entry: 8192 | 100 |
//! --------------------------------------
//!         ^ advance(5000) lands here
//! -----------------------------
//!         | entry: 7288 | 100 |
//!         -----------------------
//! ```
//!
//! # Capping entries per call
//!
//! The kernel caps how many scatter/gather entries one call may carry
//! (`IOV_MAX`). [`TransferWindow::chunk`] hands out at most that many
//! leading entries; the cap has to be re-applied after every advance,
//! since partial consumption shifts which entries lead the window.
//!
//! [`IoSlice`]: std::io::IoSlice

pub mod window;
pub use window::*;
