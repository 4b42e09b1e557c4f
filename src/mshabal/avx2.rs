//! AVX2 width: 8 lanes over 256-bit integer registers (`__m256i`),
//! twice the SSE2/AVX lane count.

use crate::error::NonceGenError;
use crate::mshabal::MwState;

pub const LANES: usize = 8;

#[target_feature(enable = "avx2")]
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
/// Caller must have confirmed `avx2` support, e.g. via
/// [`crate::dispatch::init_shabal_avx2`].
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
