use chrono::{DateTime, Local};

use crate::sample::Sample;
use crate::stream::{ConnectionState, LifecycleEvent, StreamEvent};
use crate::util::local_time;
use crate::window::WindowBuffer;

// Headroom above the window peak on the value axis
const Y_HEADROOM: f64 = 1.1;
// Value axis top when the window holds nothing above zero
const Y_FLOOR_KB: f64 = 1024.0;
// Time axis span for a single point
const X_MIN_SPAN_MS: f64 = 1000.0;

/// Static description of the chart: one series on a time axis against a
/// zero-based memory axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub title: String,
    pub series_label: &'static str,
    pub x_title: &'static str,
    pub y_title: &'static str,
}

impl PlotConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            series_label: "Memory Usage (KB)",
            x_title: "Time",
            y_title: "Memory (KB)",
        }
    }
}

// Windowed series renderer state. Only the UI thread mutates it.
pub struct App {
    pub plot: PlotConfig,
    window: WindowBuffer,
    connection: ConnectionState,
    last_error: Option<String>,
    accepted: u64,
    redraw_pending: bool,
}

impl App {
    /// Fresh session: empty window, chart configured, first draw pending.
    pub fn initialize(plot: PlotConfig) -> App {
        App {
            plot,
            window: WindowBuffer::new(),
            connection: ConnectionState::Connecting,
            last_error: None,
            accepted: 0,
            redraw_pending: true,
        }
    }

    /// Append, evict the oldest arrival past capacity, and ask for a quiet
    /// redraw. The terminal surface never animates, so every redraw is quiet.
    pub fn ingest(&mut self, sample: Sample) {
        self.window.push(sample);
        self.accepted += 1;
        self.redraw_pending = true;
    }

    pub fn observe(&mut self, event: &LifecycleEvent) {
        if let LifecycleEvent::Errored { message } = event {
            self.last_error = Some(message.clone());
        }
        self.connection = event.state();
        self.redraw_pending = true;
    }

    pub fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Sample(sample) => self.ingest(sample),
            StreamEvent::Lifecycle(lifecycle) => self.observe(&lifecycle),
        }
    }

    pub fn request_redraw(&mut self) {
        self.redraw_pending = true;
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_pending)
    }

    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Samples accepted this session, including those already evicted.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.window.points()
    }

    pub fn peak(&self) -> Option<(f64, Option<DateTime<Local>>)> {
        self.window
            .peak()
            .map(|s| (s.memory_kb, local_time(s.point().0)))
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let (lo, hi) = self
            .window
            .iter()
            .map(|s| s.point().0)
            .fold((f64::MAX, f64::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
        if lo > hi {
            return [0.0, X_MIN_SPAN_MS];
        }
        if hi - lo < X_MIN_SPAN_MS {
            return [lo, lo + X_MIN_SPAN_MS];
        }
        [lo, hi]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let max = self
            .window
            .iter()
            .map(|s| s.memory_kb)
            .fold(0.0, f64::max);
        let top = if max > 0.0 { max * Y_HEADROOM } else { Y_FLOOR_KB };
        [0.0, top]
    }
}
