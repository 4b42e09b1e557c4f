use rand::Rng;
use std::fs;

/// Plotting parameters loaded from a YAML config file, with per-field
/// defaults so an operator only has to specify what differs from the
/// usual run (mirrors the teacher project's `Cfg`/`load_cfg` split).
#[derive(Debug, Serialize, Deserialize)]
pub struct Cfg {
    #[serde(default = "default_numeric_id")]
    pub numeric_id: u64,

    #[serde(default = "default_start_nonce")]
    pub start_nonce: u64,

    #[serde(default = "default_nonces")]
    pub nonces: u64,

    /// Nonce slots per scoop row in a single plot file — the `cache_size`
    /// the core pipeline writes into (a.k.a. "stagger size").
    #[serde(default = "default_stagger_size")]
    pub stagger_size: u64,

    #[serde(default = "default_output_path")]
    pub output_path: String,

    #[serde(default = "default_cpu_threads")]
    pub cpu_threads: usize,

    #[serde(default = "default_cpu_task_size")]
    pub cpu_worker_task_size: u64,

    #[serde(default = "default_cpu_thread_pinning")]
    pub cpu_thread_pinning: bool,

    #[serde(default = "default_console_log_level")]
    pub console_log_level: String,

    #[serde(default = "default_logfile_log_level")]
    pub logfile_log_level: String,

    #[serde(default = "default_logfile_max_count")]
    pub logfile_max_count: u32,

    #[serde(default = "default_logfile_max_size")]
    pub logfile_max_size: u64,

    #[serde(default = "default_console_log_pattern")]
    pub console_log_pattern: String,

    #[serde(default = "default_logfile_log_pattern")]
    pub logfile_log_pattern: String,
}

fn default_numeric_id() -> u64 {
    0
}

/// A fresh random starting nonce so two operators who forget to set
/// this explicitly don't silently overwrite each other's plot files.
fn default_start_nonce() -> u64 {
    let mut rng = rand::thread_rng();
    u64::from(rng.gen::<u32>())
}

fn default_nonces() -> u64 {
    1000
}

fn default_stagger_size() -> u64 {
    1000
}

fn default_output_path() -> String {
    ".".to_owned()
}

fn default_cpu_threads() -> usize {
    0
}

fn default_cpu_task_size() -> u64 {
    64
}

fn default_cpu_thread_pinning() -> bool {
    false
}

fn default_console_log_level() -> String {
    "Info".to_owned()
}

fn default_logfile_log_level() -> String {
    "Warn".to_owned()
}

fn default_logfile_max_count() -> u32 {
    10
}

fn default_logfile_max_size() -> u64 {
    20
}

fn default_console_log_pattern() -> String {
    "\r{d(%H:%M:%S.%3f%z)} [{h({l}):<5}] [{T}] [{t}] - {M}:{m}{n}".to_owned()
}

fn default_logfile_log_pattern() -> String {
    "\r{d(%Y-%m-%dT%H:%M:%S.%3f%z)} [{h({l}):<5}] [{T}] [{f}:{L}] [{t}] - {M}:{m}{n}".to_owned()
}

pub fn load_cfg(config: &str) -> Cfg {
    let cfg_str =
        fs::read_to_string(config).unwrap_or_else(|_| panic!("failed to open config, config={}", config));
    let cfg: Cfg = serde_yaml::from_str(&cfg_str).expect("failed to parse config");
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_cfg() {
        let cfg = load_cfg("config.yaml");
        assert_eq!(cfg.numeric_id, 1234567890123456789);
        assert_eq!(cfg.nonces, 10000);
        assert_eq!(cfg.stagger_size, 5000);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Cfg = serde_yaml::from_str("numeric_id: 42\n").unwrap();
        assert_eq!(cfg.numeric_id, 42);
        assert_eq!(cfg.stagger_size, default_stagger_size());
        assert_eq!(cfg.console_log_level, "Info");
    }
}
