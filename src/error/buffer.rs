/// Error type returned on failed memory mappings.
///
/// This error is non-fatal: the mapper substitutes a zero-length view
/// for the segment and the render proceeds, so it should not be grouped
/// with the fatal write errors.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("memory is not readable")]
    /// The segment refused a read-only mapping.
    NotReadable,
}
