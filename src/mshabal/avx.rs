//! AVX width: still 4 lanes (AVX widens float/double paths, not the
//! 32-bit integer lane count this engine relies on) but compiled with
//! AVX enabled so the surrounding code in a mixed AVX/AVX2 binary gets
//! the VEX-encoded form of these instructions.

use crate::error::NonceGenError;
use crate::mshabal::MwState;

pub const LANES: usize = 4;

#[target_feature(enable = "avx")]
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
/// Caller must have confirmed `avx` support, e.g. via
/// [`crate::dispatch::init_shabal_avx`].
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
