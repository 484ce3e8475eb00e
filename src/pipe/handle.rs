use std::{
    fs::{File, OpenOptions},
    os::fd::{AsRawFd, IntoRawFd},
    os::unix::fs::FileTypeExt,
    path::{Path, PathBuf},
};

use nix::fcntl::{fcntl, FcntlArg};

use crate::{
    define::{DEFAULT_PIPE_CAPACITY, PIPE_MAX_SIZE_PATH},
    error::pipe::OpenError,
};

/// The process-owned write end of a fifo.
///
/// Exactly one handle is live per sink instance: created on start,
/// consumed on stop. The byte counter grows by exactly the number of
/// bytes the kernel accepted, across successful and failed renders
/// alike.
pub struct PipeHandle {
    pub(crate) file: File,
    pub(crate) path: PathBuf,
    pub(crate) bytes_written: u64,
    capacity: usize,
}

impl PipeHandle {
    /// Opens the fifo at `path` for writing and enlarges its kernel
    /// buffer to the system-wide maximum.
    ///
    /// The open is a plain blocking `O_WRONLY`, so it waits until a
    /// reader has the other end open. The target must be a fifo; the
    /// rest of the crate relies on pipe semantics for backpressure.
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        if path.as_os_str().is_empty() {
            return Err(OpenError::NotFound);
        }

        log::trace!("opening fifo {:?} for writing", path);
        let file = OpenOptions::new().write(true).open(path).map_err(|e| {
            log::warn!("could not open {:?} for writing: {}", path, e);
            OpenError::OpenFailed {
                path: path.to_owned(),
                source: e,
            }
        })?;

        let file_type = file
            .metadata()
            .map_err(|e| OpenError::OpenFailed {
                path: path.to_owned(),
                source: e,
            })?
            .file_type();
        if !file_type.is_fifo() {
            log::error!("{:?} is not a fifo", path);
            return Err(OpenError::NotAFifo {
                path: path.to_owned(),
            });
        }

        let capacity = negotiate_capacity(&file);
        log::debug!("opened fifo {:?}, capacity {} bytes", path, capacity);

        Ok(Self {
            file,
            path: path.to_owned(),
            bytes_written: 0,
            capacity,
        })
    }

    /// The configured target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The pipe capacity the kernel granted at open time.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total bytes transferred into the fifo through this handle.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Closes the write end. A failed close is logged and otherwise
    /// ignored; consuming the handle makes a second close impossible.
    pub fn close(self) {
        let path = self.path;
        let fd = self.file.into_raw_fd();
        if let Err(e) = nix::unistd::close(fd) {
            log::warn!("error closing fifo {:?}: {}", path, e);
        } else {
            log::debug!("closed fifo {:?}", path);
        }
    }
}

/// Grows the pipe's kernel buffer to the system-wide maximum, read from
/// `/proc/sys/fs/pipe-max-size`, falling back to 1 MiB if that file is
/// unreadable or malformed.
///
/// Growing is best-effort: some kernels cap the size silently, so a
/// refused resize is logged and the capacity actually granted is
/// returned instead.
fn negotiate_capacity(file: &File) -> usize {
    let wanted = std::fs::read_to_string(PIPE_MAX_SIZE_PATH)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_PIPE_CAPACITY);

    let fd = file.as_raw_fd();
    match fcntl(fd, FcntlArg::F_SETPIPE_SZ(wanted as nix::libc::c_int)) {
        Ok(granted) => granted as usize,
        Err(e) => {
            log::debug!("could not grow pipe buffer to {}: {}", wanted, e);
            fcntl(fd, FcntlArg::F_GETPIPE_SZ)
                .map(|n| n as usize)
                .unwrap_or(wanted)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use nix::{sys::stat::Mode, unistd::mkfifo};
    use tempfile::{tempdir, NamedTempFile};

    use super::*;

    #[test]
    fn should_reject_empty_path() {
        assert!(matches!(
            PipeHandle::open(Path::new("")),
            Err(OpenError::NotFound)
        ));
    }

    #[test]
    fn should_report_failed_open() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("no-such-fifo");

        assert!(matches!(
            PipeHandle::open(&missing),
            Err(OpenError::OpenFailed { .. })
        ));
    }

    #[test]
    fn should_reject_regular_file() {
        let file = NamedTempFile::new().unwrap();

        assert!(matches!(
            PipeHandle::open(file.path()),
            Err(OpenError::NotAFifo { .. })
        ));
    }

    #[test]
    fn should_open_fifo_and_negotiate_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fifo");
        mkfifo(&path, Mode::from_bits_truncate(0o644)).unwrap();

        // the write end cannot open until a reader holds the other end
        let reader_path = path.clone();
        let reader = std::thread::spawn(move || {
            let mut data = Vec::new();
            File::open(reader_path).unwrap().read_to_end(&mut data).unwrap();
            data
        });

        let handle = PipeHandle::open(&path).unwrap();
        assert_eq!(handle.path(), path);
        assert_eq!(handle.bytes_written(), 0);
        assert!(handle.capacity() > 0);

        handle.close();
        assert!(reader.join().unwrap().is_empty());
    }
}
