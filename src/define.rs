/// Capacity applied to the fifo when the system-wide maximum cannot be
/// read from [`PIPE_MAX_SIZE_PATH`].
pub const DEFAULT_PIPE_CAPACITY: usize = 1024 * 1024;

/// The sysctl file holding the system-wide maximum pipe capacity.
pub const PIPE_MAX_SIZE_PATH: &str = "/proc/sys/fs/pipe-max-size";

/// The most scatter/gather entries a single vectored transfer call
/// accepts. Larger windows are submitted in multiple calls.
pub const MAX_VECTORS_PER_CALL: usize = nix::libc::UIO_MAXIOV as usize;
