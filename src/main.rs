#![warn(unused_extern_crates)]
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

mod config;
mod logger;
mod plot_file;
mod scheduler;

use crate::config::load_cfg;
use clap::{App, Arg};
use noncegen::init_cpu_extensions;
use std::cmp::min;
use std::process;

fn main() {
    let matches = App::new("PoC2 plotter")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Location of the config file")
                .takes_value(true)
                .default_value("config.yaml"),
        )
        .arg(
            Arg::with_name("numeric_id")
                .short("i")
                .long("id")
                .value_name("NUMERIC_ID")
                .help("Numeric account id to plot for (overrides config)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("start_nonce")
                .short("s")
                .long("start-nonce")
                .value_name("NONCE")
                .help("First nonce to plot (overrides config)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("nonces")
                .short("n")
                .long("nonces")
                .value_name("COUNT")
                .help("Number of nonces to plot (overrides config)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output_path")
                .short("o")
                .long("output")
                .value_name("DIR")
                .help("Directory to write plot files into (overrides config)")
                .takes_value(true),
        )
        .get_matches();

    let config_path = matches.value_of("config").unwrap();
    let mut cfg = load_cfg(config_path);

    if let Some(v) = matches.value_of("numeric_id") {
        cfg.numeric_id = v.parse().expect("numeric_id must be a u64");
    }
    if let Some(v) = matches.value_of("start_nonce") {
        cfg.start_nonce = v.parse().expect("start_nonce must be a u64");
    }
    if let Some(v) = matches.value_of("nonces") {
        cfg.nonces = v.parse().expect("nonces must be a u64");
    }
    if let Some(v) = matches.value_of("output_path") {
        cfg.output_path = v.to_owned();
    }

    logger::init_logger(&cfg);

    info!("plotter v{}", crate_version!());

    let simd_extension = init_cpu_extensions();
    let cpuid = raw_cpuid::CpuId::new();
    let cpu_name = cpuid
        .get_extended_function_info()
        .and_then(|info| info.processor_brand_string().map(|s| s.trim().to_owned()))
        .unwrap_or_else(|| "unknown cpu".to_owned());

    let cpu_threads = if cfg.cpu_threads == 0 {
        num_cpus::get()
    } else {
        min(cfg.cpu_threads, 2 * num_cpus::get())
    };

    info!(
        "cpu: {} [using {} of {} cores + {:?}]",
        cpu_name,
        cpu_threads,
        num_cpus::get(),
        simd_extension
    );
    info!("numeric_id: {}", cfg.numeric_id);
    info!(
        "plotting nonces [{}, {})",
        cfg.start_nonce,
        cfg.start_nonce + cfg.nonces
    );
    info!("stagger size: {}", cfg.stagger_size);
    info!("output path: {}", cfg.output_path);

    if let Err(e) = run(&cfg, cpu_threads) {
        error!("plotting failed: {}", e);
        process::exit(1);
    }
}

fn run(cfg: &config::Cfg, cpu_threads: usize) -> std::io::Result<()> {
    let mut offset = 0u64;
    while offset < cfg.nonces {
        let count = min(cfg.stagger_size, cfg.nonces - offset);
        scheduler::plot_stagger_group(cfg, cpu_threads, cfg.start_nonce + offset, count)?;
        offset += count;
    }
    Ok(())
}

