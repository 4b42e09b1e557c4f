#![warn(unused_extern_crates)]
#[macro_use]
extern crate log;

pub mod buffer;
pub mod dispatch;
pub mod error;
pub mod mshabal;
pub mod noncegen;
pub mod shabal256;

pub use crate::dispatch::{init_cpu_extensions, noncegen, SimdExtension};
pub use crate::error::NonceGenError;

/// Size in bytes of a Shabal-256 digest.
pub const HASH_SIZE: usize = 32;
/// Upper bound, in bytes, on how much of a nonce page is absorbed into any
/// single intermediate hash of the backward chain.
pub const HASH_CAP: usize = 4096;
/// Number of scoops in a nonce page.
pub const NUM_SCOOPS: usize = 4096;
/// Size in bytes of one scoop (two 32-byte halves).
pub const SCOOP_SIZE: usize = 64;
/// Size in bytes of one complete nonce page.
pub const NONCE_SIZE: usize = NUM_SCOOPS * SCOOP_SIZE;
/// Size in bytes of the seed block: an 8-byte big-endian account id followed
/// by an 8-byte big-endian nonce number.
pub const SEED_SIZE: usize = 16;
