//! The fifo sink element: thin glue between the host pipeline and the
//! pipe writer.

use std::path::{Path, PathBuf};

use crate::{
    buffer::Buffer,
    error::{
        pipe::OpenError,
        sink::{LocationError, WriteError},
    },
    pipe::PipeHandle,
};

/// The lifecycle and data callbacks the host pipeline drives.
///
/// The host serializes calls per sink instance and renders only between
/// `start` and `stop`; the sink performs no locking of its own.
pub trait Sink {
    /// Acquires the sink's resource. Invoked once when streaming
    /// starts.
    fn start(&mut self) -> Result<(), OpenError>;

    /// Releases the sink's resource. Invoked once when streaming stops;
    /// safe to repeat.
    fn stop(&mut self);

    /// Writes a single buffer.
    fn render(&mut self, buffer: &Buffer) -> Result<(), WriteError>;

    /// Writes an ordered list of buffers as one batch.
    fn render_list(&mut self, buffers: &[Buffer]) -> Result<(), WriteError>;
}

/// Writes buffer batches to a fifo (named pipe) using `vmsplice(2)`.
///
/// One owned instance per sink: created at setup, dropped at teardown.
/// While the fifo is open the configured location is frozen.
#[derive(Default)]
pub struct FifoSink {
    location: Option<PathBuf>,
    handle: Option<PipeHandle>,
}

impl FifoSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(location: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
            handle: None,
        }
    }

    /// Sets or clears the fifo location.
    ///
    /// Changing the location while the fifo is open is not supported
    /// and is rejected.
    pub fn set_location(&mut self, location: Option<PathBuf>) -> Result<(), LocationError> {
        if self.handle.is_some() {
            log::warn!("changing the location while the fifo is open is not supported");
            return Err(LocationError::Busy);
        }
        if let Some(location) = &location {
            log::info!("location: {:?}", location);
        }
        self.location = location;
        Ok(())
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// The open pipe handle, while streaming.
    pub fn handle(&self) -> Option<&PipeHandle> {
        self.handle.as_ref()
    }

    /// Bytes transferred since the sink started; 0 while stopped.
    pub fn bytes_written(&self) -> u64 {
        self.handle.as_ref().map_or(0, PipeHandle::bytes_written)
    }

    fn write(&mut self, buffers: &[Buffer]) -> Result<(), WriteError> {
        match self.handle.as_mut() {
            Some(handle) => handle.write_batch(buffers),
            // rendering on a sink that was never started observes the
            // same error a closed descriptor would produce
            None => Err(WriteError::Io {
                path: self.location.clone().unwrap_or_default(),
                source: std::io::Error::from_raw_os_error(nix::libc::EBADF),
            }),
        }
    }
}

impl Sink for FifoSink {
    fn start(&mut self) -> Result<(), OpenError> {
        if self.handle.is_some() {
            log::debug!("sink already started");
            return Ok(());
        }
        let location = self.location.as_deref().ok_or(OpenError::NotFound)?;
        self.handle = Some(PipeHandle::open(location)?);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }

    fn render(&mut self, buffer: &Buffer) -> Result<(), WriteError> {
        log::trace!("render: nmem={}", buffer.n_memory());
        if buffer.n_memory() == 0 {
            return Ok(());
        }
        self.write(std::slice::from_ref(buffer))
    }

    fn render_list(&mut self, buffers: &[Buffer]) -> Result<(), WriteError> {
        if buffers.is_empty() {
            log::trace!("empty buffer list");
            return Ok(());
        }
        self.write(buffers)
    }
}
