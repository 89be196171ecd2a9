use serde::Deserialize;
use thiserror::Error;

/// One memory-usage observation as delivered by the feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds since the Unix epoch, fractional allowed.
    pub timestamp: f64,
    pub memory_kb: f64,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid sample payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary frame is not valid UTF-8")]
    NotUtf8,
}

// Wire schema. Unknown fields are ignored.
#[derive(Deserialize)]
struct Payload {
    timestamp: f64,
    memory_kb: f64,
}

impl Sample {
    pub fn new(timestamp: f64, memory_kb: f64) -> Self {
        Self { timestamp, memory_kb }
    }

    /// Decode one text frame. Values are taken as-is: neither timestamp
    /// ordering nor the sign of `memory_kb` is checked.
    pub fn parse(raw: &str) -> Result<Sample, ParseError> {
        let payload: Payload = serde_json::from_str(raw)?;
        Ok(Sample::new(payload.timestamp, payload.memory_kb))
    }

    pub fn parse_bytes(raw: &[u8]) -> Result<Sample, ParseError> {
        let text = std::str::from_utf8(raw).map_err(|_| ParseError::NotUtf8)?;
        Sample::parse(text)
    }

    /// Plot point: (milliseconds since epoch, KiB).
    pub fn point(&self) -> (f64, f64) {
        (self.timestamp * 1000.0, self.memory_kb)
    }
}
