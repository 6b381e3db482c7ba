//! JSON-lines trace replay
//!
//! One [`TelemetryFrame`] per line. Blank lines and lines starting with
//! `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{TelemetryFrame, TelemetrySource};
use tracing::{debug, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Replays a recorded trace
///
/// Malformed lines are skipped with a warning and counted; use
/// [`ReplaySource::load_all`] for strict decoding.
pub struct ReplaySource {
    name: String,
    reader: Box<dyn BufRead + Send>,
    line: usize,
    tick_hz: Option<f64>,
    metrics: Arc<IngestionMetrics>,
}

impl std::fmt::Debug for ReplaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySource")
            .field("name", &self.name)
            .field("line", &self.line)
            .field("tick_hz", &self.tick_hz)
            .finish_non_exhaustive()
    }
}

impl ReplaySource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestionError::TraceIo {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened trace");
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
        ))
    }

    pub fn from_reader(name: impl Into<String>, reader: impl BufRead + Send + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
            line: 0,
            tick_hz: None,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Declare the rate the trace was recorded at
    pub fn with_tick_hz(mut self, hz: f64) -> Self {
        self.tick_hz = Some(hz);
        self
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Decode a whole trace, failing on the first malformed line
    pub fn load_all(path: &Path) -> Result<Vec<TelemetryFrame>> {
        let file = File::open(path).map_err(|source| IngestionError::TraceIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut frames = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| IngestionError::TraceIo {
                path: PathBuf::from(path),
                source,
            })?;
            if let Some(frame) = decode_line(&line, idx + 1)? {
                frames.push(frame);
            }
        }
        Ok(frames)
    }
}

/// Decode one trace line; `Ok(None)` for blank and comment lines
pub fn decode_line(line: &str, line_no: usize) -> Result<Option<TelemetryFrame>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| IngestionError::TraceDecode {
            line: line_no,
            message: e.to_string(),
        })
}

/// Write frames as a JSON-lines trace
pub fn write_trace<'a, W: Write>(
    mut writer: W,
    frames: impl IntoIterator<Item = &'a TelemetryFrame>,
) -> std::io::Result<()> {
    for frame in frames {
        serde_json::to_writer(&mut writer, frame)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

impl TelemetrySource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_frame(&mut self) -> Option<TelemetryFrame> {
        let mut buf = String::new();
        loop {
            buf.clear();
            match self.reader.read_line(&mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    warn!(source = %self.name, line = self.line + 1, error = %e, "trace read failed");
                    return None;
                }
            }
            self.line += 1;
            match decode_line(&buf, self.line) {
                Ok(Some(frame)) => {
                    self.metrics.record_emitted();
                    return Some(frame);
                }
                Ok(None) => continue,
                Err(e) => {
                    self.metrics.record_decode_error();
                    warn!(source = %self.name, error = %e, "skipping malformed trace line");
                }
            }
        }
    }

    fn tick_hz(&self) -> Option<f64> {
        self.tick_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;
    use std::io::Cursor;

    const TRACE: &str = r##"# recorded at 60 Hz
{"session_time_sec": 1.0, "player_car_idx": 0, "lap_dist_pct": [0.1, 0.2]}

{"session_time_sec": 1.016, "player_car_idx": 0, "lap_dist_pct": [0.1002, 0.2002]}
not json
{"session_time_sec": 1.033, "player_car_idx": 0}
"##;

    #[test]
    fn test_replay_skips_blank_comment_and_malformed() {
        let mut source = ReplaySource::from_reader("mem", Cursor::new(TRACE)).with_tick_hz(60.0);
        let times: Vec<f64> = std::iter::from_fn(|| source.next_frame())
            .map(|f| f.session_time_sec)
            .collect();
        assert_eq!(times, vec![1.0, 1.016, 1.033]);
        assert_eq!(source.tick_hz(), Some(60.0));
        let snapshot = source.metrics().snapshot();
        assert_eq!(snapshot.frames_emitted, 3);
        assert_eq!(snapshot.decode_errors, 1);
    }

    #[test]
    fn test_load_all_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();
        let err = ReplaySource::load_all(file.path()).unwrap_err();
        assert!(
            matches!(err, IngestionError::TraceDecode { line: 5, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_write_then_open() {
        let frames = vec![
            TelemetryFrame {
                session_time_sec: 3.0,
                session_type_name: "Race".into(),
                lap: vec![1, 2],
                ..Default::default()
            },
            TelemetryFrame {
                session_time_sec: 3.1,
                ..Default::default()
            },
        ];
        let file = tempfile::NamedTempFile::new().unwrap();
        write_trace(file.as_file(), &frames).unwrap();

        let loaded = ReplaySource::load_all(file.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].lap, vec![1, 2]);
        assert_eq!(loaded[0].session_type_name, "Race");

        let mut source = ReplaySource::open(file.path()).unwrap();
        assert!(!source.name().is_empty());
        assert_eq!(source.next_frame().map(|f| f.session_time_sec), Some(3.0));
    }

    #[test]
    fn test_open_missing_file() {
        let err = ReplaySource::open(Path::new("/nonexistent/trace.jsonl")).unwrap_err();
        assert!(matches!(err, IngestionError::TraceIo { .. }));
        assert!(matches!(ContractError::from(err), ContractError::Io(_)));
    }
}
