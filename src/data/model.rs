use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{ProcessingError, Result};

// ---------------------------------------------------------------------------
// HeaderValue – a single value of a `KEY:VALUE` radar header line
// ---------------------------------------------------------------------------

/// A dynamically-typed header value. MALA headers mix integers (`SAMPLES`),
/// floats (`TIMEWINDOW`) and free text (`ANTENNAS`).
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Text(s) => write!(f, "{s}"),
            HeaderValue::Empty => write!(f, "<empty>"),
        }
    }
}

impl HeaderValue {
    /// Guess the narrowest type for a raw header value.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return HeaderValue::Empty;
        }
        if let Ok(i) = s.parse::<i64>() {
            return HeaderValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return HeaderValue::Float(f);
        }
        HeaderValue::Text(s.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integral values only; a float header such as `1024.0` also counts.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            HeaderValue::Integer(i) if *i >= 0 => Some(*i as usize),
            HeaderValue::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as usize),
            _ => None,
        }
    }
}

/// Parsed header, keyed by the text left of the first colon.
pub type Header = BTreeMap<String, HeaderValue>;

// ---------------------------------------------------------------------------
// ProfileMetadata – scalar survey description
// ---------------------------------------------------------------------------

pub const KEY_SAMPLES: &str = "SAMPLES";
pub const KEY_TIME_WINDOW: &str = "TIMEWINDOW";
pub const KEY_DISTANCE_INTERVAL: &str = "DISTANCE INTERVAL";
pub const KEY_LAST_TRACE: &str = "LAST TRACE";
pub const KEY_FREQUENCY: &str = "FREQUENCY";

/// Scalars needed to turn sample / trace indices into time and distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileMetadata {
    pub sample_count: usize,
    pub time_window_ns: f64,
    pub distance_interval_m: f64,
    pub trace_count: usize,
    pub frequency_mhz: f64,
}

impl ProfileMetadata {
    /// Two-way travel time of every sample: `sample_count` points evenly
    /// spaced from 0 to the time window, both ends included.
    pub fn time_axis(&self) -> Vec<f64> {
        linspace(0.0, self.time_window_ns, self.sample_count)
    }

    /// Along-profile coordinate of every trace.
    pub fn positions(&self) -> Vec<f64> {
        (0..self.trace_count)
            .map(|t| t as f64 * self.distance_interval_m)
            .collect()
    }

    /// Distance of a trace from the start of the line.
    pub fn distance_of(&self, trace_index: usize) -> f64 {
        trace_index as f64 * self.distance_interval_m
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Profile – the 2-D amplitude array
// ---------------------------------------------------------------------------

/// One column of time-ordered amplitudes recorded at a single position.
pub type Trace = Vec<f64>;

/// Rectangular (samples × traces) array stored trace by trace.
///
/// Row `r` is sample `r` of every trace; column `t` is trace `t`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Profile {
    traces: Vec<Trace>,
    sample_count: usize,
}

impl Profile {
    /// Build a profile from traces, rejecting ragged input.
    pub fn new(traces: Vec<Trace>) -> Result<Self> {
        let sample_count = traces.first().map_or(0, Vec::len);
        if let Some(bad) = traces.iter().find(|t| t.len() != sample_count) {
            return Err(ProcessingError::ShapeMismatch {
                what: "trace length",
                expected: sample_count,
                found: bad.len(),
            });
        }
        Ok(Profile {
            traces,
            sample_count,
        })
    }

    /// Build a profile from sample rows (each row holds one amplitude per trace).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let trace_count = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != trace_count) {
            return Err(ProcessingError::ShapeMismatch {
                what: "row length",
                expected: trace_count,
                found: bad.len(),
            });
        }
        let traces = (0..trace_count)
            .map(|t| rows.iter().map(|row| row[t]).collect())
            .collect();
        Ok(Profile {
            traces,
            sample_count: rows.len(),
        })
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty() || self.sample_count == 0
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn trace(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index)
    }

    /// Apply `f` to every sample, keeping the shape.
    pub fn map_samples(self, f: impl Fn(f64) -> f64) -> Profile {
        let traces = self
            .traces
            .into_iter()
            .map(|t| t.into_iter().map(&f).collect())
            .collect();
        Profile {
            traces,
            sample_count: self.sample_count,
        }
    }

    /// Amplitude of sample `row` in trace `trace`.
    pub fn get(&self, row: usize, trace: usize) -> Option<f64> {
        self.traces.get(trace).and_then(|t| t.get(row)).copied()
    }

    /// Sample `row` of every trace, in trace order.
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.sample_count {
            return None;
        }
        Some(self.traces.iter().map(|t| t[row]).collect())
    }

    /// Transpose into sample rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.sample_count)
            .map(|r| self.traces.iter().map(|t| t[r]).collect())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Detection – one located reflector
// ---------------------------------------------------------------------------

/// A reflector hit: the trace where it was found, the shallowest row that
/// produced it, and both converted to physical units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub trace_index: usize,
    pub row: usize,
    pub distance_m: f64,
    /// Row-derived stand-in for depth (no velocity model applied).
    pub depth: f64,
}
