//! AVX512F width: 16 lanes over 512-bit integer registers (`__m512i`),
//! twice the AVX2 lane count and the widest form the dispatcher ever
//! picks.

use crate::error::NonceGenError;
use crate::mshabal::MwState;

pub const LANES: usize = 16;

#[target_feature(enable = "avx512f")]
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
/// Caller must have confirmed `avx512f` support, e.g. via
/// [`crate::dispatch::init_shabal_avx512f`].
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
