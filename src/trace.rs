//! # State Trace
//!
//! Records controller state changes to JSONL (JSON Lines).
//!
//! One line is written per state change, so a trace of a controller sitting
//! idle stays empty. Each record is the [`ControllerState`] plus an RFC 3339
//! timestamp:
//!
//! ```json
//! {"timestamp":"2024-01-01T12:00:00.000+00:00","cycle":42,"hat":{"up":true,...},...}
//! ```

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::input::state::ControllerState;

#[derive(Serialize)]
struct TraceRecord<'a> {
    timestamp: String,
    #[serde(flatten)]
    state: &'a ControllerState,
}

/// Writes changed controller states as JSON lines.
#[derive(Debug)]
pub struct StateTrace<W: Write> {
    writer: W,
    last: Option<ControllerState>,
    written: u64,
}

impl StateTrace<BufWriter<File>> {
    /// Creates (or truncates) a trace file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!("Tracing state changes to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> StateTrace<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            last: None,
            written: 0,
        }
    }

    /// Records `state` if its input differs from the last recorded state.
    ///
    /// Returns whether a line was written. The cycle number alone does not
    /// count as a change.
    ///
    /// # Errors
    ///
    /// Returns `Io` if serialization or the write fails.
    pub fn record(&mut self, state: &ControllerState) -> Result<bool> {
        if self.last.is_some_and(|last| last.same_input(state)) {
            return Ok(false);
        }

        let record = TraceRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            state,
        };
        serde_json::to_writer(&mut self.writer, &record).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;

        self.last = Some(*state);
        self.written += 1;
        Ok(true)
    }

    /// Number of lines written.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::directional::DirectionalResult;
    use crate::input::state::{Button, Buttons};
    use serde_json::Value;

    fn state(cycle: u64, up: bool) -> ControllerState {
        ControllerState {
            cycle,
            hat: DirectionalResult { up, ..DirectionalResult::NEUTRAL },
            ..ControllerState::default()
        }
    }

    fn lines(trace: StateTrace<Vec<u8>>) -> Vec<Value> {
        let bytes = trace.into_inner();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_first_state_always_written() {
        let mut trace = StateTrace::new(Vec::new());
        assert!(trace.record(&state(0, false)).unwrap());
        assert_eq!(trace.written(), 1);
    }

    #[test]
    fn test_unchanged_state_skipped() {
        let mut trace = StateTrace::new(Vec::new());
        trace.record(&state(0, false)).unwrap();
        assert!(!trace.record(&state(1, false)).unwrap());
        assert!(trace.record(&state(2, true)).unwrap());
        assert!(!trace.record(&state(3, true)).unwrap());
        assert!(trace.record(&state(4, false)).unwrap());
        assert_eq!(trace.written(), 3);
    }

    #[test]
    fn test_record_format() {
        let mut trace = StateTrace::new(Vec::new());
        let mut pressed = state(7, true);
        pressed.buttons = [Button::B1].into_iter().collect::<Buttons>();
        trace.record(&pressed).unwrap();

        let records = lines(trace);
        assert_eq!(records.len(), 1);
        let record = &records[0];

        let timestamp = record["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert_eq!(record["cycle"], 7);
        assert_eq!(record["hat"]["up"], true);
        assert_eq!(record["hat"]["down"], false);
        assert_eq!(record["buttons"], Button::B1.mask());
        assert_eq!(record["left_stick"]["x"], 0);
        assert_eq!(record["modifiers"]["socd_mode"], "neutral");
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");

        let mut trace = StateTrace::create(&path).unwrap();
        trace.record(&state(0, true)).unwrap();
        trace.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.ends_with('\n'));
    }
}
