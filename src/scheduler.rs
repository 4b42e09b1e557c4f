//! Drives the core nonce pipeline across a CPU thread pool: one rayon
//! task per chunk of a stagger group, with a channel carrying
//! completion messages back to this thread for progress reporting and
//! plot-file writes. Generalizes the teacher's `cpu_hasher`/`scheduler`
//! split from "grab mining work, report deadlines" to "grab a nonce
//! sub-range, call `noncegen`, report nonces written".

use crate::config::Cfg;
use crate::plot_file;
use crossbeam_channel::unbounded;
use noncegen::buffer::PageAlignedByteBuffer;
use noncegen::{NUM_SCOOPS, SCOOP_SIZE};
use pbr::ProgressBar;
use std::cmp::min;
use std::io;
use std::path::PathBuf;
use stopwatch::Stopwatch;

struct ChunkDone {
    chunk_offset: u64,
    count: u64,
}

/// Plot one stagger group (at most `cfg.stagger_size` nonces) starting
/// at `start_nonce`, writing the completed file under
/// `cfg.output_path`. Returns the path written.
pub fn plot_stagger_group(
    cfg: &Cfg,
    cpu_threads: usize,
    start_nonce: u64,
    nonces: u64,
) -> io::Result<PathBuf> {
    let path = plot_file::file_path(
        &cfg.output_path,
        cfg.numeric_id,
        start_nonce,
        nonces,
        cfg.stagger_size,
    );
    if plot_file::is_complete(&path, nonces) {
        info!("{} already complete, skipping", path.display());
        return Ok(path);
    }

    let cache_size = nonces;
    let cache_bytes = cache_size as usize * NUM_SCOOPS * SCOOP_SIZE;
    let cache = PageAlignedByteBuffer::new(cache_bytes);

    let pinning = cfg.cpu_thread_pinning;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cpu_threads)
        .start_handler(move |idx| {
            if pinning {
                if let Some(core_ids) = core_affinity::get_core_ids() {
                    if let Some(core_id) = core_ids.get(idx % core_ids.len()) {
                        core_affinity::set_for_current(*core_id);
                    }
                }
            }
        })
        .build()
        .expect("failed to build cpu thread pool");

    let (tx, rx) = unbounded();
    let chunk_size = cfg.cpu_worker_task_size.max(1);
    let numeric_id = cfg.numeric_id;

    pool.scope(|scope| {
        let mut offset = 0u64;
        while offset < nonces {
            let count = min(chunk_size, nonces - offset);
            let cache = cache.clone();
            let tx = tx.clone();
            scope.spawn(move |_| {
                // Safety: each spawned task gets a disjoint
                // [offset, offset + count) nonce range, so the scoop
                // rows it writes never overlap another task's.
                let cache_slice = unsafe { cache.shared_mut_slice() };
                noncegen::noncegen(
                    cache_slice,
                    cache_size,
                    offset,
                    numeric_id,
                    start_nonce + offset,
                    count,
                )
                .expect("nonce generation failed");
                tx.send(ChunkDone {
                    chunk_offset: offset,
                    count,
                })
                .expect("scheduler channel closed early");
            });
            offset += count;
        }
    });
    drop(tx);

    let mut file = plot_file::create_or_open(&path, cache_size)?;
    let bytes = cache.as_slice();

    let mut pb = ProgressBar::new(nonces);
    pb.message(&format!("{}: ", path.display()));
    let sw = Stopwatch::start_new();
    let mut done = 0u64;
    for msg in rx {
        plot_file::write_chunk(&mut file, bytes, cache_size, msg.chunk_offset, msg.count)?;
        done += msg.count;
        pb.set(done);
    }
    pb.finish_println(&format!(
        "wrote {} ({} nonces, {:.2} nonces/s)",
        path.display(),
        nonces,
        done as f64 * 1000.0 / (1 + sw.elapsed_ms()) as f64
    ));
    info!(
        "[{}] plotted {} nonces to {}",
        chrono::Local::now().format("%H:%M:%S"),
        done,
        path.display()
    );

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_for(output_path: &str) -> Cfg {
        serde_yaml::from_str(&format!(
            "numeric_id: 42\nstart_nonce: 0\nnonces: 8\nstagger_size: 8\noutput_path: \"{}\"\ncpu_worker_task_size: 3\n",
            output_path
        ))
        .unwrap()
    }

    #[test]
    fn plots_a_small_stagger_group() {
        let dir = std::env::temp_dir().join(format!("noncegen-scheduler-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let cfg = cfg_for(dir.to_str().unwrap());

        let path = plot_stagger_group(&cfg, 2, 0, 8).unwrap();
        assert!(plot_file::is_complete(&path, 8));

        std::fs::remove_dir_all(&dir).ok();
    }
}
