//! Programmatic `log4rs` setup: a level-filtered console appender plus a
//! size-rolled file appender, both driven off the six logging fields in
//! [`crate::config::Cfg`]. No `log4rs.yaml` — the plotter is a single
//! binary and the defaults cover the common case.

use crate::config::Cfg;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;
use std::str::FromStr;

fn level_or(name: &str, default: LevelFilter) -> LevelFilter {
    LevelFilter::from_str(name).unwrap_or(default)
}

/// Build and install the global logger for this process. Panics on a
/// malformed log4rs config, matching the teacher's "fail fast at
/// start-up" posture for anything that would otherwise run silent.
pub fn init_logger(cfg: &Cfg) {
    let console_level = level_or(&cfg.console_log_level, LevelFilter::Info);
    let logfile_level = level_or(&cfg.logfile_log_level, LevelFilter::Warn);

    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(&cfg.console_log_pattern)))
        .build();

    let roller = FixedWindowRoller::builder()
        .build("plotter.{}.log", cfg.logfile_max_count)
        .expect("failed to build log roller");
    let trigger = SizeTrigger::new(cfg.logfile_max_size * 1024 * 1024);
    let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

    let logfile = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(&cfg.logfile_log_pattern)))
        .build("plotter.log", Box::new(policy))
        .expect("failed to build rolling file appender");

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(console_level)))
                .build("console", Box::new(console)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(logfile_level)))
                .build("logfile", Box::new(logfile)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("logfile")
                .build(console_level.max(logfile_level)),
        )
        .expect("failed to build log4rs config");

    log4rs::init_config(config).expect("failed to install logger");
}
