//! Accelerometer trace files
//!
//! One reading per line, either JSON (`{"t_ms": 10, "x": 0.0, "y": 0.0,
//! "z": 9.81}`) or CSV (`10,0.0,0.0,9.81`). `t_ms` is milliseconds since the
//! start of the trace. Blank lines and lines starting with `#` are skipped.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};
use tapper_core::Sample;
use thiserror::Error;

/// A malformed trace line
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("line {line}: invalid JSON record: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: expected 4 comma-separated fields, got {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid number {text:?}")]
    Number { line: usize, text: String },

    #[error("line {line}: timestamp must be finite and non-negative, got {t_ms}")]
    Timestamp { line: usize, t_ms: f64 },

    #[error("reading trace: {0}")]
    Io(#[from] std::io::Error),
}

/// One reading in a trace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Milliseconds since trace start
    pub t_ms: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl TraceRecord {
    /// Parse one line; `Ok(None)` for blank and comment lines
    pub fn parse(text: &str, line: usize) -> Result<Option<Self>, TraceError> {
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return Ok(None);
        }

        let record = if text.starts_with('{') {
            serde_json::from_str(text).map_err(|source| TraceError::Json { line, source })?
        } else {
            Self::parse_csv(text, line)?
        };

        if !record.t_ms.is_finite() || record.t_ms < 0.0 {
            return Err(TraceError::Timestamp {
                line,
                t_ms: record.t_ms,
            });
        }
        Ok(Some(record))
    }

    fn parse_csv(text: &str, line: usize) -> Result<Self, TraceError> {
        let fields: Vec<&str> = text.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(TraceError::FieldCount {
                line,
                found: fields.len(),
            });
        }

        let mut values = [0.0f64; 4];
        for (value, field) in values.iter_mut().zip(&fields) {
            *value = field.parse().map_err(|_| TraceError::Number {
                line,
                text: field.to_string(),
            })?;
        }
        let [t_ms, x, y, z] = values;
        Ok(Self { t_ms, x, y, z })
    }

    /// Offset from the start of the trace
    pub fn offset(&self) -> Duration {
        Duration::from_nanos((self.t_ms * 1_000_000.0).round() as u64)
    }

    /// Sample stamped `base + t_ms`
    pub fn to_sample(&self, base: Instant) -> Sample {
        Sample::new(self.x, self.y, self.z, base + self.offset())
    }

    pub fn from_reading(offset: Duration, [x, y, z]: [f64; 3]) -> Self {
        Self {
            t_ms: offset.as_nanos() as f64 / 1_000_000.0,
            x,
            y,
            z,
        }
    }
}

/// Iterator over the records of a trace
///
/// Malformed lines are yielded as errors; the caller decides whether to skip
/// them. Reading continues after a bad line.
pub struct TraceReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Number of lines read so far
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    match TraceRecord::parse(&self.buf, self.line) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Write records as JSON lines
pub fn write_records<W: Write>(
    mut out: W,
    records: impl IntoIterator<Item = TraceRecord>,
) -> anyhow::Result<usize> {
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
