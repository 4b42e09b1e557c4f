use std::error::Error;
use std::fmt;

/// Errors surfaced by the core nonce-generation pipeline.
///
/// The pipeline is a pure computation over caller-provided buffers: the
/// only failures it can report are bad call arguments (caught once, at
/// the boundary, before any destination byte is touched) and allocation
/// failure for the two per-call scratch buffers.
#[derive(Debug)]
pub enum NonceGenError {
    /// `chunk_offset + count` would run past the end of the destination
    /// cache's `cache_size` nonce slots.
    ChunkOutOfRange {
        chunk_offset: u64,
        count: u64,
        cache_size: u64,
    },
    /// The caller's destination buffer is smaller than
    /// `cache_size * NUM_SCOOPS * SCOOP_SIZE` bytes.
    CacheTooSmall { needed: usize, actual: usize },
    /// A width was requested that this process never initialized a
    /// template for (the host CPU does not support it, or
    /// `init_cpu_extensions` / `init_shabal_<w>` was never called).
    UnsupportedWidth(crate::dispatch::SimdExtension),
    /// Allocating the `N * (NONCE_SIZE + HASH_SIZE)` byte scratch buffers
    /// for a batch failed.
    ScratchAllocation { requested_bytes: usize },
}

impl fmt::Display for NonceGenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NonceGenError::ChunkOutOfRange {
                chunk_offset,
                count,
                cache_size,
            } => write!(
                f,
                "chunk_offset ({}) + count ({}) exceeds cache_size ({})",
                chunk_offset, count, cache_size
            ),
            NonceGenError::CacheTooSmall { needed, actual } => write!(
                f,
                "destination cache too small: needed {} bytes, got {}",
                needed, actual
            ),
            NonceGenError::UnsupportedWidth(w) => {
                write!(f, "SIMD width {:?} was not initialized on this host", w)
            }
            NonceGenError::ScratchAllocation { requested_bytes } => write!(
                f,
                "failed to allocate {} bytes of scratch space for a batch",
                requested_bytes
            ),
        }
    }
}

impl Error for NonceGenError {}
