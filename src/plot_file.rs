//! Packaging a filled destination cache into a plot file on disk. No
//! algorithmic content of its own: the cache the core pipeline writes
//! is already laid out scoop-major, nonce-minor, which is exactly the
//! on-disk PoC2 plot format, so this module's whole job is naming the
//! file and copying a chunk's slice of the cache into its matching
//! byte range.

use noncegen::{NUM_SCOOPS, SCOOP_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// The conventional Burst/Signum plot file name:
/// `<numeric_id>_<start_nonce>_<nonces>_<stagger>`.
pub fn file_name(numeric_id: u64, start_nonce: u64, nonces: u64, stagger_size: u64) -> String {
    format!("{}_{}_{}_{}", numeric_id, start_nonce, nonces, stagger_size)
}

pub fn file_path(
    output_path: &str,
    numeric_id: u64,
    start_nonce: u64,
    nonces: u64,
    stagger_size: u64,
) -> PathBuf {
    Path::new(output_path).join(file_name(numeric_id, start_nonce, nonces, stagger_size))
}

/// Open (creating if needed) the plot file for a stagger group and size
/// it to hold exactly `cache_size` nonce slots in every scoop row. A
/// partially-plotted file from an earlier, interrupted run is reused as
/// it stands: resuming re-runs the same chunk range through the
/// (deterministic) pipeline and overwrites its slots with identical
/// bytes, so nothing already on disk is corrupted.
pub fn create_or_open(path: &Path, cache_size: u64) -> io::Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)?;
    file.set_len(cache_size * NUM_SCOOPS as u64 * SCOOP_SIZE as u64)?;
    Ok(file)
}

/// Copy one chunk's worth of scoop-major bytes out of `cache` into
/// `file`, one scoop row at a time so the chunk's nonce slots land at
/// the same byte offsets on disk as they occupy in memory.
pub fn write_chunk(
    file: &mut File,
    cache: &[u8],
    cache_size: u64,
    chunk_offset: u64,
    count: u64,
) -> io::Result<()> {
    let row_bytes = count as usize * SCOOP_SIZE;
    for scoop in 0..NUM_SCOOPS as u64 {
        let row_start =
            (scoop * cache_size + chunk_offset) as usize * SCOOP_SIZE;
        file.seek(SeekFrom::Start(row_start as u64))?;
        file.write_all(&cache[row_start..row_start + row_bytes])?;
    }
    Ok(())
}

/// An existing file is considered a complete plot for `cache_size` if
/// it is already sized for the full stagger group; used to skip
/// already-finished stagger groups when resuming a multi-file plot run.
pub fn is_complete(path: &Path, cache_size: u64) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() == cache_size * NUM_SCOOPS as u64 * SCOOP_SIZE as u64,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile_shim::TempDir;

    mod tempfile_shim {
        use std::path::PathBuf;

        /// Minimal scratch-directory helper: the teacher's own test
        /// suite has no dependency on the `tempfile` crate, so this
        /// mirrors that by cleaning up under `std::env::temp_dir()`
        /// with a PID-qualified name instead of pulling in a new crate
        /// just for one test module.
        pub struct TempDir(PathBuf);

        impl TempDir {
            pub fn new(tag: &str) -> Self {
                let dir = std::env::temp_dir().join(format!("noncegen-test-{}-{}", tag, std::process::id()));
                std::fs::create_dir_all(&dir).unwrap();
                TempDir(dir)
            }
            pub fn path(&self) -> &std::path::Path {
                &self.0
            }
        }

        impl Drop for TempDir {
            fn drop(&mut self) {
                let _ = std::fs::remove_dir_all(&self.0);
            }
        }
    }

    #[test]
    fn file_name_matches_convention() {
        assert_eq!(file_name(1, 2, 3, 4), "1_2_3_4");
    }

    #[test]
    fn create_or_open_sizes_file_to_cache() {
        let dir = TempDir::new("create");
        let path = dir.path().join("1_0_10_10");
        let file = create_or_open(&path, 10).unwrap();
        assert_eq!(file.metadata().unwrap().len(), 10 * NUM_SCOOPS as u64 * SCOOP_SIZE as u64);
    }

    #[test]
    fn write_chunk_lands_at_matching_offsets() {
        let dir = TempDir::new("write");
        let path = dir.path().join("1_0_4_4");
        let mut file = create_or_open(&path, 4).unwrap();

        let mut cache = vec![0u8; 4 * NUM_SCOOPS * SCOOP_SIZE];
        cache[..SCOOP_SIZE].copy_from_slice(&[7u8; SCOOP_SIZE]);
        write_chunk(&mut file, &cache, 4, 0, 1).unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(&on_disk[..SCOOP_SIZE], &[7u8; SCOOP_SIZE][..]);
    }

    #[test]
    fn is_complete_checks_expected_size() {
        let dir = TempDir::new("complete");
        let path = dir.path().join("1_0_2_2");
        assert!(!is_complete(&path, 2));
        create_or_open(&path, 2).unwrap();
        assert!(is_complete(&path, 2));
    }
}
