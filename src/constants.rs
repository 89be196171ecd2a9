pub const SAMPLE_INTERVAL_SECS: u64 = 1; // cadence the feed emits at
pub const HISTORY_WINDOW_SECS: u64 = 120;
pub const WINDOW_CAPACITY: usize = (HISTORY_WINDOW_SECS / SAMPLE_INTERVAL_SECS) as usize;

pub const DEFAULT_HOST: &str = "127.0.0.1:3000";
pub const STREAM_PATH: &str = "/ws";
pub const DEFAULT_LOG_FILE: &str = "mem_watch.log";

// Keyboard poll budget between stream events
pub const INPUT_POLL_MS: u64 = 50;
