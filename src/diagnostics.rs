//! Diagnostic reports emitted by the stream ingestor.
//!
//! Nothing here is fatal: malformed frames and connection transitions are
//! described and handed to a [`DiagnosticSink`], and the session carries on.

use std::fmt;
use std::sync::Arc;

use log::{info, warn};

use crate::stream::LifecycleEvent;

// Longest frame prefix quoted in a report
const EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Lifecycle(LifecycleEvent),
    MalformedFrame { reason: String, excerpt: String },
}

impl Diagnostic {
    pub fn malformed(reason: impl fmt::Display, frame: &str) -> Self {
        let mut excerpt: String = frame.chars().take(EXCERPT_CHARS).collect();
        if frame.chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        Diagnostic::MalformedFrame {
            reason: reason.to_string(),
            excerpt,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Lifecycle(LifecycleEvent::Opened) => write!(f, "connected to profiler server"),
            Diagnostic::Lifecycle(LifecycleEvent::Closed { reason: Some(r) }) => {
                write!(f, "disconnected from profiler server ({r})")
            }
            Diagnostic::Lifecycle(LifecycleEvent::Closed { reason: None }) => {
                write!(f, "disconnected from profiler server")
            }
            Diagnostic::Lifecycle(LifecycleEvent::Errored { message }) => {
                write!(f, "stream error: {message}")
            }
            Diagnostic::MalformedFrame { reason, excerpt } => {
                write!(f, "dropped frame: {reason} [{excerpt}]")
            }
        }
    }
}

/// Observer for everything the ingestor wants a human to know about.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn report(&self, diagnostic: &Diagnostic) {
        (**self).report(diagnostic)
    }
}

/// Forwards reports to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::Lifecycle(LifecycleEvent::Opened)
            | Diagnostic::Lifecycle(LifecycleEvent::Closed { .. }) => info!("{diagnostic}"),
            _ => warn!("{diagnostic}"),
        }
    }
}
