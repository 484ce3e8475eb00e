//! Buffers handed to the sink by the host pipeline.
//!
//! A [`Buffer`] is an ordered list of [`Memory`] segments. The sink
//! never owns or copies segment contents; it maps each segment
//! read-only for the duration of one transfer call and releases every
//! mapping before returning. [`MapInfo`] ties a successful mapping to
//! its release so that the release happens on every exit path.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::buffer::MapError;

/// One mappable memory segment of a buffer.
///
/// The host implements this for whatever backs its buffers. The crate
/// ships [`HeapMemory`] for plain heap-backed data.
pub trait Memory: Send + Sync {
    /// The segment's size in bytes.
    fn size(&self) -> usize;

    /// Borrows the segment's contents read-only.
    ///
    /// A successful mapping must be released with exactly one matching
    /// [`Memory::unmap`] call; use [`MapInfo::map`] to get that pairing
    /// for free.
    fn map_readable(&self) -> Result<&[u8], MapError>;

    /// Releases a mapping produced by [`Memory::map_readable`].
    fn unmap(&self) {}
}

/// A read-only mapping of one memory segment.
///
/// Releases the mapping when dropped, so a mapped segment cannot leak
/// past the transfer call that created it, error paths included.
pub struct MapInfo<'a> {
    memory: &'a dyn Memory,
    data: &'a [u8],
}

impl<'a> MapInfo<'a> {
    /// Maps `memory` read-only.
    pub fn map(memory: &'a dyn Memory) -> Result<Self, MapError> {
        let data = memory.map_readable()?;
        Ok(Self { memory, data })
    }

    /// The mapped bytes. The returned slice outlives this guard but not
    /// the segment borrow it was created from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for MapInfo<'_> {
    fn drop(&mut self) {
        self.memory.unmap();
    }
}

/// Heap-backed segment contents.
#[derive(Debug, Clone)]
pub struct HeapMemory {
    data: Bytes,
}

impl HeapMemory {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

impl Memory for HeapMemory {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn map_readable(&self) -> Result<&[u8], MapError> {
        Ok(&self.data)
    }
}

/// An ordered list of memory segments rendered as one contiguous byte
/// sequence.
///
/// Segments are reference counted so the host can share them between
/// buffers; the sink only ever borrows them.
#[derive(Clone, Default)]
pub struct Buffer {
    memories: Vec<Arc<dyn Memory>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer with a single heap-backed segment.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let mut buffer = Self::new();
        buffer.append_memory(Arc::new(HeapMemory::new(data)));
        buffer
    }

    /// Appends a segment to the end of the buffer.
    pub fn append_memory(&mut self, memory: Arc<dyn Memory>) {
        self.memories.push(memory);
    }

    /// The number of memory segments in the buffer.
    pub fn n_memory(&self) -> usize {
        self.memories.len()
    }

    /// The segment at `index`, if any.
    pub fn peek_memory(&self, index: usize) -> Option<&dyn Memory> {
        self.memories.get(index).map(|m| m.as_ref())
    }

    /// The segments in order.
    pub fn memories(&self) -> impl Iterator<Item = &dyn Memory> {
        self.memories.iter().map(|m| m.as_ref())
    }

    /// Total byte size across all segments.
    pub fn size(&self) -> usize {
        self.memories.iter().map(|m| m.size()).sum()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("n_memory", &self.n_memory())
            .field("size", &self.size())
            .finish()
    }
}
