//! Vectored zero-copy transfer of buffer batches into the fifo.
//!
//! Batches are flattened into one scatter/gather vector, buffer order
//! then segment order, and driven through `vmsplice(2)` until every
//! byte is in the pipe. The pipe references the caller's pages until
//! the reader consumes them, which is why segments stay mapped for the
//! whole call.

use std::{io::IoSlice, os::fd::AsRawFd, path::Path, thread};

use nix::{
    errno::Errno,
    fcntl::{vmsplice, SpliceFFlags},
};

use crate::{
    buffer::{Buffer, MapInfo},
    define::MAX_VECTORS_PER_CALL,
    error::sink::WriteError,
    iovecs::TransferWindow,
};

use super::handle::PipeHandle;

impl PipeHandle {
    /// Transfers the whole batch into the fifo.
    ///
    /// On success the handle's byte counter has grown by exactly the
    /// batch's total size; on error, by the bytes the kernel accepted
    /// before the failure. Every segment mapping taken for the call is
    /// released before returning, on the error paths too.
    ///
    /// # Important
    ///
    /// The transfer primitive may be invoked repeatedly until all bytes
    /// are in the pipe, so this operation is not atomic. A full pipe
    /// blocks the call indefinitely; that stall is the intended
    /// backpressure on the producer.
    pub fn write_batch(&mut self, buffers: &[Buffer]) -> Result<(), WriteError> {
        let total_mems: usize = buffers.iter().map(Buffer::n_memory).sum();
        if total_mems == 0 {
            log::trace!("empty batch, nothing to write");
            return Ok(());
        }
        log::trace!("{} buffers, {} memories", buffers.len(), total_mems);

        // scratch for the flattened request, sized to the batch's total
        // segment count and released before return
        let mut vecs: Vec<IoSlice<'_>> = Vec::with_capacity(total_mems);
        let mut maps: Vec<MapInfo<'_>> = Vec::with_capacity(total_mems);

        let mut size = 0;
        for buffer in buffers {
            size += fill_vectors(buffer, &mut vecs, &mut maps);
        }
        if size == 0 {
            return Ok(());
        }

        let fd = self.file.as_raw_fd();
        write_vectors(
            |iov| vmsplice(fd, iov, SpliceFFlags::empty()),
            TransferWindow::new(&mut vecs),
            size,
            &self.path,
            &mut self.bytes_written,
        )
    }
}

/// Maps each of the buffer's segments read-only and appends one view
/// per segment, in segment order. Returns the byte total of the
/// appended views.
///
/// A segment that refuses to map gets a zero-length view so the batch
/// keeps its shape; the failure is logged and the render degrades
/// instead of aborting.
fn fill_vectors<'a>(
    buffer: &'a Buffer,
    vecs: &mut Vec<IoSlice<'a>>,
    maps: &mut Vec<MapInfo<'a>>,
) -> usize {
    let mut size = 0;
    for (i, memory) in buffer.memories().enumerate() {
        match MapInfo::map(memory) {
            Ok(map) => {
                let data = map.data();
                vecs.push(IoSlice::new(data));
                size += data.len();
                maps.push(map);
            }
            Err(e) => {
                log::warn!("failed to map memory {} for reading: {}", i, e);
                vecs.push(IoSlice::new(&[]));
            }
        }
    }
    size
}

/// Drives the window through the transfer primitive until all `size`
/// bytes have been accepted, tallying accepted bytes into
/// `bytes_written` as it goes.
///
/// `write` takes the entries for one call and returns the byte count
/// the kernel accepted. An interrupted call is repeated identically; a
/// momentarily full pipe (zero bytes accepted, or `EAGAIN`, which
/// `EWOULDBLOCK` aliases) is retried after yielding, as it is neither
/// progress nor failure. Anything else is fatal to the render.
fn write_vectors<'a, W>(
    mut write: W,
    mut window: TransferWindow<'a>,
    size: usize,
    path: &Path,
    bytes_written: &mut u64,
) -> Result<(), WriteError>
where
    W: FnMut(&[IoSlice<'a>]) -> nix::Result<usize>,
{
    let mut left = size;
    while left > 0 {
        // the per-call entry cap must be re-applied after every
        // partial consumption, not computed once
        let ret = match write(window.chunk(MAX_VECTORS_PER_CALL)) {
            Err(Errno::EINTR) => continue,
            Err(Errno::EAGAIN) => {
                thread::yield_now();
                continue;
            }
            Err(Errno::ENOSPC) => return Err(WriteError::NoSpaceLeft),
            Err(errno) => {
                log::warn!("error while writing to fifo {:?}: {}", path, errno);
                return Err(WriteError::Io {
                    path: path.to_owned(),
                    source: std::io::Error::from_raw_os_error(errno as i32),
                });
            }
            Ok(0) => {
                thread::yield_now();
                continue;
            }
            Ok(n) => n,
        };

        debug_assert!(ret <= left);
        *bytes_written += ret as u64;
        left -= ret;
        window.advance(ret);
        assert!(
            left == 0 || !window.is_empty(),
            "transfer window drained with {} bytes left",
            left
        );
        debug_assert_eq!(window.remaining(), left);
    }

    Ok(())
}
