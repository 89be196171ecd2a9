//! Live memory-usage chart fed by a profiler's WebSocket stream.

pub mod app;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod sample;
pub mod stream;
pub mod ui;
pub mod util;
pub mod window;
