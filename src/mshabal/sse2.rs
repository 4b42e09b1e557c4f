//! SSE2 width: 4 lanes over 128-bit registers. One 32-bit word per lane
//! times 4 lanes is exactly one `__m128i`; the soft-SIMD engine in
//! [`crate::mshabal`] is written so LLVM can pick that register for
//! every `[u32; 4]` it sees once this function is compiled with SSE2
//! enabled.

use crate::error::NonceGenError;
use crate::mshabal::MwState;

pub const LANES: usize = 4;

#[target_feature(enable = "sse2")]
unsafe fn run_inner(
    cache: &mut [u8],
    cache_size: u64,
    chunk_offset: u64,
    numeric_id: u64,
    start_nonce: u64,
    count: u64,
) -> Result<(), NonceGenError> {
    let state = MwState::<LANES>::init();
    crate::noncegen::run(
        &state,
        cache,
        cache_size,
        chunk_offset,
        numeric_id,
        start_nonce,
        count,
    )
}

/// # Safety
/// Caller must have confirmed `sse2` support, e.g. via
/// [`crate::dispatch::init_shabal_sse2`].
pub unsafe fn run(
    cache: &mut [u8],
    cache_size: u64,
    chunk_offset: u64,
    numeric_id: u64,
    start_nonce: u64,
    count: u64,
) -> Result<(), NonceGenError> {
    run_inner(cache, cache_size, chunk_offset, numeric_id, start_nonce, count)
}
