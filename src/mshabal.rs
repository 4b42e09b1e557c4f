//! Multi-way ("mshabal") Shabal-256: the same register machine as
//! [`crate::shabal256`], run on `LANES` independent messages at once by
//! keeping one register file per lane side by side in memory.
//!
//! Every width the nonce pipeline dispatches to (SSE2, AVX, AVX2,
//! AVX512F) is this *one* generic engine, instantiated at a different
//! `LANES` and wrapped in a `#[target_feature]`-gated function so the
//! compiler is free to auto-vectorize the per-lane loops onto the
//! matching register width. There is no hand-written intrinsic path:
//! the ISA-specific modules only pick `LANES` and carry the feature
//! gate, matching the "soft SIMD" shape the scalar/CPU split in
//! [`crate::dispatch`] already expects.

pub mod avx;
pub mod avx2;
pub mod avx512f;
pub mod sse2;

const BLOCK_WORDS: usize = 16;

// Same published Shabal-256 IV as the scalar engine, broadcast across
// lanes at `init`. Keep these in lockstep with `shabal256::IV_{A,B,C}`.
const IV_A: [u32; 12] = [
    0x52F8_4552, 0xE54B_7999, 0x2D8E_E3EC, 0xB964_5191, 0xE007_8B86, 0xBB7C_44C9, 0xD2B5_C1CA,
    0xB0D2_EB8C, 0x14CE_5A45, 0x22AF_50DC, 0xEFFD_BC6B, 0xEB21_B74A,
];
const IV_B: [u32; 16] = [
    0xB555_C6EE, 0x3E71_0596, 0xA72A_652F, 0x9301_515F, 0xDA28_C1FA, 0x696F_D868, 0x9CB6_BF72,
    0x0AFE_4002, 0xA6E0_3615, 0x5138_C1D4, 0xBE21_6306, 0xB38B_8890, 0x3EA8_B96B, 0x3299_ACE4,
    0x3092_4DD4, 0x55CB_34A5,
];
const IV_C: [u32; 16] = [
    0xB405_F031, 0xC423_3EBA, 0xB373_3979, 0xC0DD_9D55, 0xC51C_28AE, 0xFB13_56D6, 0x6A35_D91A,
    0xD702_2F54, 0x00CB_3D93, 0xE7B8_D033, 0xF5B2_0891, 0x1888_F195, 0xB3AD_2208, 0xA1E7_F5F6,
    0xCAF5_F52F, 0x6FBF_92C1,
];

/// `LANES` independent Shabal-256 register files, interleaved lane-minor
/// (`state.a[word][lane]`) so a fixed-`LANES` build can let the loop
/// over `lane` auto-vectorize onto one SIMD register per `word`.
#[derive(Clone, Copy)]
pub struct MwState<const LANES: usize> {
    a: [[u32; LANES]; 12],
    b: [[u32; LANES]; 16],
    c: [[u32; LANES]; 16],
    w_low: u32,
    w_high: u32,
}

impl<const LANES: usize> MwState<LANES> {
    /// Broadcast the fixed Shabal-256 IV into every lane.
    pub fn init() -> Self {
        let mut a = [[0u32; LANES]; 12];
        let mut b = [[0u32; LANES]; 16];
        let mut c = [[0u32; LANES]; 16];
        for i in 0..12 {
            a[i] = [IV_A[i]; LANES];
        }
        for i in 0..16 {
            b[i] = [IV_B[i]; LANES];
            c[i] = [IV_C[i]; LANES];
        }
        MwState {
            a,
            b,
            c,
            w_low: 1,
            w_high: 0,
        }
    }

    #[inline(always)]
    fn input_block(&mut self, m: &[[u32; LANES]; BLOCK_WORDS]) {
        for i in 0..16 {
            for l in 0..LANES {
                self.b[i][l] = self.b[i][l].wrapping_add(m[i][l]);
            }
        }

        self.w_low = self.w_low.wrapping_add(1);
        if self.w_low == 0 {
            self.w_high = self.w_high.wrapping_add(1);
        }
        for l in 0..LANES {
            self.a[0][l] ^= self.w_low;
            self.a[1][l] ^= self.w_high;
        }

        for i in 0..16 {
            for l in 0..LANES {
                self.b[i][l] = self.b[i][l].rotate_left(17);
            }
        }

        self.permute(m);

        for i in 0..16 {
            for l in 0..LANES {
                self.c[i][l] = self.c[i][l].wrapping_sub(m[i][l]);
            }
        }
        std::mem::swap(&mut self.b, &mut self.c);
    }

    /// The three-pass, sixteen-step Shabal round function (`APPLY_P`):
    /// 48 lane-parallel applications of the published `PERM_ELT` formula
    /// followed by the three-sweep, 36-way accumulation of `C` back
    /// into `A` — see [`crate::shabal256::Shabal256::permute`] for the
    /// scalar form this must stay bit-identical to, lane by lane.
    #[inline(always)]
    fn permute(&mut self, m: &[[u32; LANES]; BLOCK_WORDS]) {
        for _pass in 0..3 {
            for j in 0..16usize {
                let ai = j % 12;
                let a_prev = (ai + 11) % 12;
                let b0 = j;
                let b1 = (j + 13) % 16;
                let b2 = (j + 9) % 16;
                let b3 = (j + 6) % 16;
                let c_idx = (24 - j) % 16;

                for l in 0..LANES {
                    let a_new = (self.a[ai][l]
                        ^ self.a[a_prev][l].rotate_left(15).wrapping_mul(5)
                        ^ self.c[c_idx][l])
                        .wrapping_mul(3)
                        ^ self.b[b1][l]
                        ^ (self.b[b2][l] & !self.b[b3][l])
                        ^ m[j][l];
                    self.a[ai][l] = a_new;
                    self.b[b0][l] = !self.b[b0][l].rotate_left(1) ^ a_new;
                }
            }
        }

        for ai in 0..12 {
            for sweep in 1..=3i32 {
                let c_idx = ((ai as i32 + 4 * sweep - 9).rem_euclid(16)) as usize;
                for l in 0..LANES {
                    self.a[ai][l] = self.a[ai][l].wrapping_add(self.c[c_idx][l]);
                }
            }
        }
    }

    #[inline(always)]
    fn digest_into(&self, out: &mut [[u32; LANES]; 8]) {
        out.copy_from_slice(&self.c[8..16]);
    }
}

/// The multi-way analogue of [`crate::shabal256::shabal256_hash_fast`]:
/// absorb the whole blocks in `input` (already interleaved lane-minor,
/// `input.len()` must be a multiple of 16 words), then absorb `template`
/// once more, and write the `LANES` resulting digests to `out` without
/// any closing permutation — the template block is always the thing
/// that plays the terminator's role for every call site in the nonce
/// pipeline.
///
/// `template_state` is the shared warmed-up IV state; it is cloned, not
/// mutated, so the same template can seed many calls.
#[inline(always)]
pub fn fast_hash<const LANES: usize>(
    template_state: &MwState<LANES>,
    input: &[[u32; LANES]],
    template: &[[u32; LANES]; BLOCK_WORDS],
    out: &mut [[u32; LANES]; 8],
) {
    debug_assert_eq!(input.len() % BLOCK_WORDS, 0);
    let mut state = *template_state;
    for block in input.chunks_exact(BLOCK_WORDS) {
        let mut m = [[0u32; LANES]; BLOCK_WORDS];
        m.copy_from_slice(block);
        state.input_block(&m);
    }
    state.input_block(template);
    state.digest_into(out);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Kept in lockstep with `shabal256::tests::iv_matches_published_shabal256_constants`:
    /// both engines must broadcast the same published IV.
    #[test]
    fn iv_matches_scalar_engine() {
        assert_eq!(IV_A, crate::shabal256::IV_A);
        assert_eq!(IV_B, crate::shabal256::IV_B);
        assert_eq!(IV_C, crate::shabal256::IV_C);
    }

    #[test]
    fn lanes_are_independent() {
        let state = MwState::<4>::init();
        let mut template = [[0u32; 4]; BLOCK_WORDS];
        // lane 2 gets a distinct terminator word, the rest share one.
        for lane in 0..4 {
            template[0][lane] = 0x80;
        }
        template[1][2] = 0xdead_beef;

        let mut out = [[0u32; 4]; 8];
        fast_hash(&state, &[], &template, &mut out);

        assert_ne!(out[0][2], out[0][0]);
        assert_eq!(out[0][0], out[0][1]);
        assert_eq!(out[0][1], out[0][3]);
    }

    #[test]
    fn matches_scalar_single_lane() {
        use crate::shabal256::shabal256_hash_fast;

        let prefix = [3u8; 64];
        let mut template_words = [0u32; BLOCK_WORDS];
        template_words[0] = 0x80;
        let scalar = shabal256_hash_fast(&prefix, &template_words);

        let state = MwState::<2>::init();
        let mut input = [[0u32; 2]; BLOCK_WORDS];
        for (w, bytes) in input.iter_mut().zip(prefix.chunks_exact(4)) {
            let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            *w = [word, word];
        }
        let mut template = [[0u32; 2]; BLOCK_WORDS];
        for (w, &sw) in template.iter_mut().zip(template_words.iter()) {
            *w = [sw, sw];
        }
        let mut out = [[0u32; 2]; 8];
        fast_hash(&state, &input, &template, &mut out);

        let mut mw_digest = [0u8; 32];
        for lane in 0..2 {
            for (i, word) in out.iter().enumerate() {
                mw_digest[i * 4..i * 4 + 4].copy_from_slice(&word[lane].to_le_bytes());
            }
            assert_eq!(mw_digest, scalar);
        }
    }
}
