//! Stream ingestor: one WebSocket connection to the profiler server.
//!
//! The ingestor runs on its own reader thread and never touches the window
//! or the chart. Everything it produces goes out through a single channel of
//! [`StreamEvent`]s, in the order the transport delivered the frames, and
//! every failure is downgraded to a [`Diagnostic`] report.

use std::io;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use log::debug;
use tungstenite::Message;

use crate::config::Endpoint;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::sample::Sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Opened,
    Closed { reason: Option<String> },
    Errored { message: String },
}

impl LifecycleEvent {
    pub fn state(&self) -> ConnectionState {
        match self {
            Self::Opened => ConnectionState::Open,
            Self::Closed { .. } => ConnectionState::Closed,
            Self::Errored { .. } => ConnectionState::Errored,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Sample(Sample),
    Lifecycle(LifecycleEvent),
}

pub struct Ingestor<S> {
    events: Sender<StreamEvent>,
    sink: S,
    state: ConnectionState,
    // receiver went away; nobody is watching anymore
    detached: bool,
}

impl<S: DiagnosticSink> Ingestor<S> {
    pub fn new(events: Sender<StreamEvent>, sink: S) -> Self {
        Self {
            events,
            sink,
            state: ConnectionState::Connecting,
            detached: false,
        }
    }

    /// Handle one text frame. A frame that does not decode into a sample is
    /// dropped and reported once; it never ends the session.
    pub fn on_message(&mut self, raw: &str) {
        match Sample::parse(raw) {
            Ok(sample) => self.forward(StreamEvent::Sample(sample)),
            Err(err) => self.sink.report(&Diagnostic::malformed(err, raw)),
        }
    }

    pub fn on_binary(&mut self, raw: &[u8]) {
        match Sample::parse_bytes(raw) {
            Ok(sample) => self.forward(StreamEvent::Sample(sample)),
            Err(err) => self
                .sink
                .report(&Diagnostic::malformed(err, &String::from_utf8_lossy(raw))),
        }
    }

    /// Record a lifecycle transition. `Closed` is terminal and reported once.
    pub fn on_lifecycle(&mut self, event: LifecycleEvent) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = event.state();
        self.sink.report(&Diagnostic::Lifecycle(event.clone()));
        self.forward(StreamEvent::Lifecycle(event));
    }

    fn forward(&mut self, event: StreamEvent) {
        if self.events.send(event).is_err() {
            self.detached = true;
        }
    }

    /// Connect and pump frames until the connection ends. No retry.
    pub fn run(mut self, endpoint: &Endpoint) {
        debug!("connecting to {endpoint}");
        let (mut socket, _response) = match tungstenite::connect(endpoint.as_str()) {
            Ok(connected) => connected,
            Err(err) => {
                self.on_lifecycle(LifecycleEvent::Errored {
                    message: err.to_string(),
                });
                self.on_lifecycle(LifecycleEvent::Closed { reason: None });
                return;
            }
        };
        self.on_lifecycle(LifecycleEvent::Opened);

        let mut close_reason = None;
        loop {
            // a blocking read only notices a departed receiver on the next frame
            if self.detached {
                debug!("event receiver dropped, closing stream");
                let _ = socket.close(None);
                return;
            }
            match socket.read() {
                Ok(Message::Text(raw)) => self.on_message(&raw),
                Ok(Message::Binary(raw)) => self.on_binary(&raw),
                Ok(Message::Close(frame)) => {
                    // keep reading so the closing handshake completes
                    close_reason = frame
                        .map(|f| f.reason.into_owned())
                        .filter(|reason| !reason.is_empty());
                }
                Ok(_) => {}
                Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                    break
                }
                Err(err) => {
                    self.on_lifecycle(LifecycleEvent::Errored {
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }
        self.on_lifecycle(LifecycleEvent::Closed {
            reason: close_reason,
        });
    }
}

/// Spawn the reader thread for `endpoint`.
pub fn connect<S>(
    endpoint: Endpoint,
    events: Sender<StreamEvent>,
    sink: S,
) -> io::Result<JoinHandle<()>>
where
    S: DiagnosticSink + 'static,
{
    thread::Builder::new()
        .name("stream-ingestor".into())
        .spawn(move || Ingestor::new(events, sink).run(&endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Diagnostic>>);

    impl DiagnosticSink for Recorder {
        fn report(&self, diagnostic: &Diagnostic) {
            self.0.lock().unwrap().push(diagnostic.clone());
        }
    }

    impl Recorder {
        fn taken(&self) -> Vec<Diagnostic> {
            self.0.lock().unwrap().clone()
        }
    }

    fn ingestor() -> (Ingestor<Arc<Recorder>>, mpsc::Receiver<StreamEvent>, Arc<Recorder>) {
        let (tx, rx) = mpsc::channel();
        let sink = Arc::new(Recorder::default());
        (Ingestor::new(tx, Arc::clone(&sink)), rx, sink)
    }

    #[test]
    fn valid_frame_is_forwarded() {
        let (mut ingestor, rx, sink) = ingestor();
        ingestor.on_message(r#"{"timestamp":1000,"memory_kb":512}"#);
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::Sample(Sample::new(1000.0, 512.0)));
        assert!(sink.taken().is_empty());
    }

    #[test]
    fn malformed_frame_is_dropped_and_reported_once() {
        let (mut ingestor, rx, sink) = ingestor();
        ingestor.on_message(r#"{"timestamp":"bad"}"#);
        assert!(rx.try_recv().is_err());
        let reports = sink.taken();
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0], Diagnostic::MalformedFrame { .. }));
    }

    #[test]
    fn undecodable_binary_frame_is_reported() {
        let (mut ingestor, rx, sink) = ingestor();
        ingestor.on_binary(&[0xc3, 0x28]);
        assert!(rx.try_recv().is_err());
        assert_eq!(sink.taken().len(), 1);
    }

    #[test]
    fn closed_is_terminal() {
        let (mut ingestor, rx, sink) = ingestor();
        ingestor.on_lifecycle(LifecycleEvent::Opened);
        ingestor.on_lifecycle(LifecycleEvent::Closed { reason: None });
        ingestor.on_lifecycle(LifecycleEvent::Closed { reason: None });
        assert_eq!(sink.taken().len(), 2);
        let events: Vec<StreamEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                StreamEvent::Lifecycle(LifecycleEvent::Opened),
                StreamEvent::Lifecycle(LifecycleEvent::Closed { reason: None }),
            ]
        );
    }

    #[test]
    fn unreachable_server_reports_error_then_close() {
        // bind then drop to get a port nothing listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let endpoint = Endpoint::from_host(&format!("127.0.0.1:{port}")).unwrap();

        let (ingestor, rx, sink) = ingestor();
        ingestor.run(&endpoint);

        let events: Vec<StreamEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StreamEvent::Lifecycle(LifecycleEvent::Errored { .. })));
        assert_eq!(events[1], StreamEvent::Lifecycle(LifecycleEvent::Closed { reason: None }));
        assert_eq!(sink.taken().len(), 2);
    }

    #[test]
    fn detaches_when_receiver_is_gone() {
        let (mut ingestor, rx, _sink) = ingestor();
        drop(rx);
        ingestor.on_message(r#"{"timestamp":1,"memory_kb":1}"#);
        assert!(ingestor.detached);
    }
}
