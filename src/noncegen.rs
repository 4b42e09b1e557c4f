//! The nonce generation pipeline: per-batch seed templates, the
//! backward Shabal hash chain, final whitening, and the PoC2 scoop
//! interleave into a caller-owned destination cache.
//!
//! [`run`] is generic over the lane count and is what every vectorised
//! width in [`crate::mshabal`] calls into after warming its own
//! [`MwState`]; [`run_scalar`] is the one-nonce-at-a-time fallback that
//! both handles hosts with no usable SIMD extension and mops up the
//! remainder when `count` is not a multiple of the lane count.

use crate::error::NonceGenError;
use crate::mshabal::{self, MwState};
use crate::shabal256::shabal256_hash_fast;
use crate::{HASH_CAP, HASH_SIZE, NONCE_SIZE, NUM_SCOOPS, SCOOP_SIZE};

const BLOCK_WORDS: usize = 16;
const DIGEST_WORDS: usize = HASH_SIZE / 4;
const PAGE_WORDS: usize = NONCE_SIZE / 4;
const SCOOP_SLOTS: usize = 2 * HASH_CAP / HASH_SIZE;

const TERM_WORDS: [u32; 8] = [0x0000_0080, 0, 0, 0, 0, 0, 0, 0];

/// Allocate the per-batch `N * NONCE_SIZE` scratch page, surfacing an
/// allocation failure as [`NonceGenError::ScratchAllocation`] instead of
/// aborting the process the way a bare `vec![]` would.
fn alloc_page<const LANES: usize>(words: usize) -> Result<Vec<[u32; LANES]>, NonceGenError> {
    let mut page = Vec::new();
    page.try_reserve_exact(words).map_err(|_| NonceGenError::ScratchAllocation {
        requested_bytes: words * LANES * 4,
    })?;
    page.resize(words, [0u32; LANES]);
    Ok(page)
}

/// Scalar analogue of [`alloc_page`]: one `NONCE_SIZE`-byte page.
fn alloc_page_bytes(size: usize) -> Result<Vec<u8>, NonceGenError> {
    let mut page = Vec::new();
    page.try_reserve_exact(size)
        .map_err(|_| NonceGenError::ScratchAllocation { requested_bytes: size })?;
    page.resize(size, 0u8);
    Ok(page)
}

/// The 8 words (32 bytes) every per-nonce template embeds: the account
/// id and nonce, big-endian encoded and then reinterpreted as the
/// little-endian words Shabal absorbs, padded with zero words.
fn seed_words(numeric_id: u64, nonce: u64) -> [u32; 8] {
    let id = numeric_id.to_be_bytes();
    let nc = nonce.to_be_bytes();
    [
        u32::from_le_bytes([id[0], id[1], id[2], id[3]]),
        u32::from_le_bytes([id[4], id[5], id[6], id[7]]),
        u32::from_le_bytes([nc[0], nc[1], nc[2], nc[3]]),
        u32::from_le_bytes([nc[4], nc[5], nc[6], nc[7]]),
        0,
        0,
        0,
        0,
    ]
}

fn check_bounds(cache: &[u8], cache_size: u64, chunk_offset: u64, count: u64) -> Result<(), NonceGenError> {
    let end = chunk_offset.checked_add(count);
    if end.map_or(true, |end| end > cache_size) {
        return Err(NonceGenError::ChunkOutOfRange {
            chunk_offset,
            count,
            cache_size,
        });
    }
    let needed = cache_size as usize * NUM_SCOOPS * SCOOP_SIZE;
    if cache.len() < needed {
        return Err(NonceGenError::CacheTooSmall {
            needed,
            actual: cache.len(),
        });
    }
    Ok(())
}

/// Run the vector pipeline for as many full lanes of `count` as fit,
/// then hand the remainder to [`run_scalar`].
///
/// `template_state` is the per-width warmed IV, shared read-only across
/// every batch and every thread that happens to call in concurrently.
pub fn run<const LANES: usize>(
    template_state: &MwState<LANES>,
    cache: &mut [u8],
    cache_size: u64,
    chunk_offset: u64,
    numeric_id: u64,
    start_nonce: u64,
    count: u64,
) -> Result<(), NonceGenError> {
    check_bounds(cache, cache_size, chunk_offset, count)?;

    let lanes = LANES as u64;
    let mut n = 0u64;
    let mut page = alloc_page::<LANES>(PAGE_WORDS)?;

    while n + lanes <= count {
        let mut t1 = [[0u32; LANES]; BLOCK_WORDS];
        let mut t2 = [[0u32; LANES]; BLOCK_WORDS];
        let mut t3 = [[0u32; LANES]; BLOCK_WORDS];
        for lane in 0..LANES {
            let nonce = start_nonce.wrapping_add(n).wrapping_add(lane as u64);
            let seed = seed_words(numeric_id, nonce);
            for w in 0..8 {
                t1[w][lane] = seed[w];
                t2[8 + w][lane] = seed[w];
                t3[w][lane] = TERM_WORDS[w];
            }
        }

        // Step 2: first hash, written into the page's final HASH_SIZE bytes.
        let mut last_hash = [[0u32; LANES]; DIGEST_WORDS];
        mshabal::fast_hash(template_state, &[], &t1, &mut last_hash);
        page[PAGE_WORDS - DIGEST_WORDS..].copy_from_slice(&last_hash);

        // Step 3: seed t2's first half with that same output.
        t2[..DIGEST_WORDS].copy_from_slice(&last_hash);

        // Step 4: backward chain, upper region (bounded by HASH_CAP).
        let start_i = NONCE_SIZE - HASH_SIZE;
        let floor_i = NONCE_SIZE - HASH_CAP + HASH_SIZE;
        let steps = (start_i - floor_i) / HASH_SIZE + 1;
        for s in 0..steps {
            let i = start_i - s * HASH_SIZE;
            let m = (NONCE_SIZE + 16 - i) / 64;
            let word_i = i / 4;
            let template = if i % 64 == 0 { &t1 } else { &t2 };
            let mut out = [[0u32; LANES]; DIGEST_WORDS];
            mshabal::fast_hash(
                template_state,
                &page[word_i..word_i + m * BLOCK_WORDS],
                template,
                &mut out,
            );
            let dest = (i - HASH_SIZE) / 4;
            page[dest..dest + DIGEST_WORDS].copy_from_slice(&out);
        }

        // Step 5: backward chain, lower region (inputs capped at HASH_CAP).
        let start_i = NONCE_SIZE - HASH_CAP;
        let steps = (start_i - HASH_SIZE) / HASH_SIZE + 1;
        for s in 0..steps {
            let i = start_i - s * HASH_SIZE;
            let word_i = i / 4;
            let mut out = [[0u32; LANES]; DIGEST_WORDS];
            mshabal::fast_hash(
                template_state,
                &page[word_i..word_i + HASH_CAP / 4],
                &t3,
                &mut out,
            );
            let dest = (i - HASH_SIZE) / 4;
            page[dest..dest + DIGEST_WORDS].copy_from_slice(&out);
        }

        // Step 6: final whitening hash over the whole page plus t1's tail.
        let mut final_digest = [[0u32; LANES]; DIGEST_WORDS];
        mshabal::fast_hash(template_state, &page[..], &t1, &mut final_digest);

        // Step 7: XOR whitening, tiling the final digest across the page.
        for slot in page.chunks_exact_mut(DIGEST_WORDS) {
            for (word, key) in slot.iter_mut().zip(final_digest.iter()) {
                for lane in 0..LANES {
                    word[lane] ^= key[lane];
                }
            }
        }

        // Step 8: PoC2 scoop interleave into the destination cache.
        write_scoops(&page, cache, cache_size, chunk_offset, n);

        n += lanes;
    }

    if n < count {
        run_scalar(
            cache,
            cache_size,
            chunk_offset + n,
            numeric_id,
            start_nonce + n,
            count - n,
        )?;
    }

    Ok(())
}

fn write_scoops<const LANES: usize>(
    page: &[[u32; LANES]],
    cache: &mut [u8],
    cache_size: u64,
    chunk_offset: u64,
    n: u64,
) {
    for i in 0..SCOOP_SLOTS {
        let half = i & 1;
        let sidx = i >> 1;
        let dest_scoop = if half == 1 { NUM_SCOOPS - 1 - sidx } else { sidx };
        for lane in 0..LANES {
            let nonce_slot = chunk_offset + n + lane as u64;
            let base = dest_scoop as u64 * cache_size * SCOOP_SIZE as u64
                + nonce_slot * SCOOP_SIZE as u64
                + half as u64 * 32;
            for w in 0..DIGEST_WORDS {
                let word = page[i * DIGEST_WORDS + w][lane];
                let off = base as usize + w * 4;
                cache[off..off + 4].copy_from_slice(&word.to_le_bytes());
            }
        }
    }
}

/// One-nonce-at-a-time fallback: no SIMD, plain [`crate::shabal256`]
/// calls. Used for the scalar width and for whatever remainder a
/// vectorised [`run`] can't fit into a whole batch of lanes.
pub fn run_scalar(
    cache: &mut [u8],
    cache_size: u64,
    chunk_offset: u64,
    numeric_id: u64,
    start_nonce: u64,
    count: u64,
) -> Result<(), NonceGenError> {
    check_bounds(cache, cache_size, chunk_offset, count)?;

    for n in 0..count {
        let nonce = start_nonce.wrapping_add(n);
        let seed = seed_words(numeric_id, nonce);

        let mut t1 = [0u32; BLOCK_WORDS];
        let mut t2 = [0u32; BLOCK_WORDS];
        let mut t3 = [0u32; BLOCK_WORDS];
        t1[..8].copy_from_slice(&seed);
        t2[8..].copy_from_slice(&seed);
        t3[..8].copy_from_slice(&TERM_WORDS);

        let mut page = alloc_page_bytes(NONCE_SIZE)?;

        let last_hash = shabal256_hash_fast(&[], &t1);
        page[NONCE_SIZE - HASH_SIZE..].copy_from_slice(&last_hash);

        for k in 0..8 {
            t2[k] = u32::from_le_bytes([
                last_hash[k * 4],
                last_hash[k * 4 + 1],
                last_hash[k * 4 + 2],
                last_hash[k * 4 + 3],
            ]);
        }

        let start_i = NONCE_SIZE - HASH_SIZE;
        let floor_i = NONCE_SIZE - HASH_CAP + HASH_SIZE;
        let steps = (start_i - floor_i) / HASH_SIZE + 1;
        for s in 0..steps {
            let i = start_i - s * HASH_SIZE;
            let m = (NONCE_SIZE + 16 - i) / 64;
            let template = if i % 64 == 0 { &t1 } else { &t2 };
            let out = shabal256_hash_fast(&page[i..i + m * 64], template);
            page[i - HASH_SIZE..i].copy_from_slice(&out);
        }

        let start_i = NONCE_SIZE - HASH_CAP;
        let steps = (start_i - HASH_SIZE) / HASH_SIZE + 1;
        for s in 0..steps {
            let i = start_i - s * HASH_SIZE;
            let out = shabal256_hash_fast(&page[i..i + HASH_CAP], &t3);
            page[i - HASH_SIZE..i].copy_from_slice(&out);
        }

        let final_digest = shabal256_hash_fast(&page, &t1);
        for slot in page.chunks_exact_mut(HASH_SIZE) {
            for (byte, key) in slot.iter_mut().zip(final_digest.iter()) {
                *byte ^= key;
            }
        }

        let nonce_slot = chunk_offset + n;
        for i in 0..SCOOP_SLOTS {
            let half = i & 1;
            let sidx = i >> 1;
            let dest_scoop = if half == 1 { NUM_SCOOPS - 1 - sidx } else { sidx };
            let src = &page[i * HASH_SIZE..i * HASH_SIZE + HASH_SIZE];
            let base = dest_scoop * cache_size as usize * SCOOP_SIZE
                + nonce_slot as usize * SCOOP_SIZE
                + half * 32;
            cache[base..base + HASH_SIZE].copy_from_slice(src);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_for(cache_size: u64) -> Vec<u8> {
        vec![0u8; cache_size as usize * NUM_SCOOPS * SCOOP_SIZE]
    }

    #[test]
    fn scalar_is_deterministic() {
        let mut a = cache_for(1);
        let mut b = cache_for(1);
        run_scalar(&mut a, 1, 0, 42, 7, 1).unwrap();
        run_scalar(&mut b, 1, 0, 42, 7, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_nonces_differ() {
        let mut a = cache_for(1);
        let mut b = cache_for(1);
        run_scalar(&mut a, 1, 0, 42, 7, 1).unwrap();
        run_scalar(&mut b, 1, 0, 42, 8, 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn vector_matches_scalar_reference() {
        let state = MwState::<2>::init();
        let mut vector_cache = cache_for(2);
        run(&state, &mut vector_cache, 2, 0, 42, 1000, 2).unwrap();

        let mut scalar_cache = cache_for(2);
        run_scalar(&mut scalar_cache, 2, 0, 42, 1000, 1).unwrap();
        run_scalar(&mut scalar_cache, 2, 1, 42, 1001, 1).unwrap();

        assert_eq!(vector_cache, scalar_cache);
    }

    #[test]
    fn batch_split_matches_single_call() {
        let mut whole = cache_for(17);
        run_scalar(&mut whole, 17, 0, 42, 0, 17).unwrap();

        let mut split = cache_for(17);
        run_scalar(&mut split, 17, 0, 42, 0, 5).unwrap();
        run_scalar(&mut split, 17, 5, 42, 5, 12).unwrap();

        assert_eq!(whole, split);
    }

    #[test]
    fn out_of_range_chunk_is_rejected() {
        let mut cache = cache_for(4);
        let err = run_scalar(&mut cache, 4, 3, 42, 0, 2).unwrap_err();
        assert!(matches!(err, NonceGenError::ChunkOutOfRange { .. }));
    }

    #[test]
    fn oversized_scratch_request_is_rejected_not_aborted() {
        let err = alloc_page_bytes(usize::MAX).unwrap_err();
        assert!(matches!(err, NonceGenError::ScratchAllocation { .. }));

        let err = alloc_page::<4>(usize::MAX / 4).unwrap_err();
        assert!(matches!(err, NonceGenError::ScratchAllocation { .. }));
    }

    #[test]
    fn disjoint_nonces_occupy_disjoint_scoop_rows() {
        let mut cache = cache_for(4);
        run_scalar(&mut cache, 4, 0, 42, 0, 1).unwrap();
        run_scalar(&mut cache, 4, 1, 42, 1, 1).unwrap();

        for scoop in 0..NUM_SCOOPS {
            let row = scoop * 4 * SCOOP_SIZE;
            let first = &cache[row..row + SCOOP_SIZE];
            let second = &cache[row + SCOOP_SIZE..row + 2 * SCOOP_SIZE];
            assert_ne!(first, second);
        }
    }
}
