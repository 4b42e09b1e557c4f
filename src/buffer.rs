//! A page-aligned, SIMD-width-aligned byte buffer for the destination
//! cache. The widest dispatched width needs 64-byte alignment for
//! aligned lane access; rounding up to the OS page size besides costs
//! nothing and keeps large caches huge-page friendly.
//!
//! Per §5 of the generation model, distinct calls with disjoint
//! `[chunk_offset, chunk_offset + count)` nonce ranges write disjoint
//! byte ranges of the destination cache and need no synchronization
//! between them. A `Mutex` around the whole buffer would defeat that —
//! every chunk task would serialize on the same lock regardless of
//! which scoop rows it actually touches — so this hands out the raw
//! buffer behind an `unsafe` shared-mutable view instead, the same way
//! `rayon`'s own `par_chunks_mut` relies on the caller to prove
//! disjointness rather than taking a lock per chunk.

use aligned_alloc::{aligned_alloc, aligned_free};
use std::slice;
use std::sync::Arc;

/// Raw aligned allocation, freed through the same allocator it came
/// from. `Vec`'s own allocator assumptions don't hold for memory handed
/// out by `aligned_alloc`, so this type owns the pointer directly
/// instead of wrapping it in a `Vec`.
struct AlignedBytes {
    ptr: *mut u8,
    len: usize,
}

// Safety: the pointer is never aliased by `AlignedBytes` itself (it is
// only ever read through `PageAlignedByteBuffer`'s explicit, documented
// sharing API), so it is sound to send and share the allocation across
// threads.
unsafe impl Send for AlignedBytes {}
unsafe impl Sync for AlignedBytes {}

impl AlignedBytes {
    fn new(size: usize, align: usize) -> Self {
        let ptr = aligned_alloc(size, align) as *mut u8;
        assert!(!ptr.is_null(), "failed to allocate {} aligned bytes", size);
        AlignedBytes { ptr, len: size }
    }
}

impl Drop for AlignedBytes {
    fn drop(&mut self) {
        unsafe { aligned_free(self.ptr as *mut std::ffi::c_void) };
    }
}

/// A cheaply-cloneable handle to one aligned allocation, sized for a
/// whole stagger group's destination cache.
#[derive(Clone)]
pub struct PageAlignedByteBuffer {
    inner: Arc<AlignedBytes>,
}

impl PageAlignedByteBuffer {
    pub fn new(size: usize) -> Self {
        let align = page_size::get().max(64);
        PageAlignedByteBuffer {
            inner: Arc::new(AlignedBytes::new(size, align)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// An unsynchronized mutable view of the whole buffer.
    ///
    /// # Safety
    /// The caller must ensure that every concurrent holder of a
    /// `shared_mut_slice` for this buffer writes to disjoint byte
    /// ranges. The nonce pipeline's own chunk split guarantees this: a
    /// scheduler that hands distinct threads non-overlapping
    /// `[chunk_offset, chunk_offset + count)` nonce ranges never
    /// produces two writers touching the same destination bytes.
    pub unsafe fn shared_mut_slice(&self) -> &mut [u8] {
        slice::from_raw_parts_mut(self.inner.ptr, self.inner.len)
    }

    /// A read-only view of the whole buffer. Sound to call once every
    /// outstanding `shared_mut_slice` borrow has gone out of scope —
    /// e.g. after joining the thread pool scope that produced them.
    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.inner.ptr, self.inner.len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_requested_size() {
        let buf = PageAlignedByteBuffer::new(4096);
        assert_eq!(buf.len(), 4096);
        assert_eq!(buf.as_slice().len(), 4096);
    }

    #[test]
    fn is_aligned_to_at_least_64_bytes() {
        let buf = PageAlignedByteBuffer::new(NUM_SCOOPS_TEST_SIZE);
        assert_eq!(buf.as_slice().as_ptr() as usize % 64, 0);
    }

    #[test]
    fn disjoint_writers_do_not_corrupt_each_other() {
        let buf = PageAlignedByteBuffer::new(8);
        let a = buf.clone();
        let b = buf.clone();
        let ta = std::thread::spawn(move || unsafe {
            a.shared_mut_slice()[0..4].copy_from_slice(&[1, 2, 3, 4]);
        });
        let tb = std::thread::spawn(move || unsafe {
            b.shared_mut_slice()[4..8].copy_from_slice(&[5, 6, 7, 8]);
        });
        ta.join().unwrap();
        tb.join().unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    const NUM_SCOOPS_TEST_SIZE: usize = 4096 * 64;
}
