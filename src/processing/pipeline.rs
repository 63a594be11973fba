use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

use super::dewow::dewow;
use super::locator::{LocatorConfig, UtilityLocator};
use super::resample::resample;
use super::time_zero::set_zero_time;
use crate::data::model::{Detection, Profile, ProfileMetadata};
use crate::error::{ProcessingError, Result};

// ---------------------------------------------------------------------------
// ProcessingStep – one textual filter invocation
// ---------------------------------------------------------------------------

/// A filter stage written as `name(args)`, e.g. `dewow(10)` or `smooth(3,2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProcessingStep {
    /// `zero_time(ns)`
    ZeroTime(f64),
    /// `dewow(samples)`
    Dewow(usize),
    /// `smooth(trace_width[, oversample])`
    Smooth { trace_width: usize, oversample: usize },
}

impl ProcessingStep {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStep::ZeroTime(_) => "zero_time",
            ProcessingStep::Dewow(_) => "dewow",
            ProcessingStep::Smooth { .. } => "smooth",
        }
    }
}

impl fmt::Display for ProcessingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStep::ZeroTime(ns) => write!(f, "zero_time({ns})"),
            ProcessingStep::Dewow(w) => write!(f, "dewow({w})"),
            ProcessingStep::Smooth {
                trace_width,
                oversample,
            } => write!(f, "smooth({trace_width},{oversample})"),
        }
    }
}

impl FromStr for ProcessingStep {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || ProcessingError::ParseStep(s.to_string());
        let s_trim = s.trim();
        let (name, rest) = s_trim.split_once('(').ok_or_else(bad)?;
        let args: Vec<&str> = rest
            .strip_suffix(')')
            .ok_or_else(bad)?
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect();

        match (name.trim(), args.as_slice()) {
            ("zero_time", [ns]) => Ok(ProcessingStep::ZeroTime(ns.parse().map_err(|_| bad())?)),
            ("dewow", [w]) => Ok(ProcessingStep::Dewow(w.parse().map_err(|_| bad())?)),
            ("smooth", [w]) => Ok(ProcessingStep::Smooth {
                trace_width: w.parse().map_err(|_| bad())?,
                oversample: 1,
            }),
            ("smooth", [w, k]) => Ok(ProcessingStep::Smooth {
                trace_width: w.parse().map_err(|_| bad())?,
                oversample: k.parse().map_err(|_| bad())?,
            }),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for ProcessingStep {
    type Error = ProcessingError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ProcessingStep> for String {
    fn from(step: ProcessingStep) -> Self {
        step.to_string()
    }
}

// ---------------------------------------------------------------------------
// Survey – a profile travelling through the pipeline
// ---------------------------------------------------------------------------

/// A profile together with the axes and scalars describing it, kept coherent
/// as filter stages replace the amplitudes.
#[derive(Debug, Clone)]
pub struct Survey {
    pub profile: Profile,
    pub metadata: ProfileMetadata,
    /// Two-way travel time per sample, ns.
    pub time_axis: Vec<f64>,
    /// Along-profile coordinate per trace, m.
    pub positions: Vec<f64>,
    /// One line per applied step.
    pub log: Vec<String>,
}

impl Survey {
    pub fn new(profile: Profile, metadata: ProfileMetadata) -> Result<Self> {
        if profile.trace_count() != metadata.trace_count {
            return Err(ProcessingError::ShapeMismatch {
                what: "metadata trace count",
                expected: profile.trace_count(),
                found: metadata.trace_count,
            });
        }
        if profile.trace_count() > 0 && profile.sample_count() != metadata.sample_count {
            return Err(ProcessingError::ShapeMismatch {
                what: "metadata sample count",
                expected: profile.sample_count(),
                found: metadata.sample_count,
            });
        }
        Ok(Survey {
            time_axis: metadata.time_axis(),
            positions: metadata.positions(),
            profile,
            metadata,
            log: Vec::new(),
        })
    }

    /// Run one step, replacing the profile and updating axes and metadata.
    pub fn apply(&mut self, step: &ProcessingStep) -> Result<()> {
        let start = Instant::now();
        match *step {
            ProcessingStep::ZeroTime(ns) => {
                let (profile, axis) = set_zero_time(&self.profile, &self.time_axis, ns)?;
                self.metadata.sample_count = axis.len();
                self.metadata.time_window_ns = axis.last().copied().unwrap_or(0.0);
                self.profile = profile;
                self.time_axis = axis;
            }
            ProcessingStep::Dewow(window) => {
                self.profile = dewow(&self.profile, window)?;
            }
            ProcessingStep::Smooth {
                trace_width,
                oversample,
            } => {
                let (profile, positions) =
                    resample(&self.profile, &self.positions, trace_width, oversample)?;
                self.metadata.trace_count = positions.len();
                if positions.len() > 1 {
                    let span = positions[positions.len() - 1] - positions[0];
                    self.metadata.distance_interval_m = span / (positions.len() - 1) as f64;
                }
                self.profile = profile;
                self.positions = positions;
            }
        }
        self.log_event(step, start);
        Ok(())
    }

    pub fn apply_all(&mut self, steps: &[ProcessingStep]) -> Result<()> {
        steps.iter().try_for_each(|s| self.apply(s))
    }

    /// Locate reflectors in the current profile over `config.rows`.
    pub fn locate(&self, config: &LocatorConfig) -> Result<Vec<Detection>> {
        let locator = UtilityLocator::new(config)?;
        let detections = locator.locate(&self.profile, &self.metadata, config.rows.into());
        info!("located {} reflectors", detections.len());
        Ok(detections)
    }

    fn log_event(&mut self, step: &ProcessingStep, start: Instant) {
        let line = format!(
            "{} (duration: {:.3}s): {} samples x {} traces",
            step,
            start.elapsed().as_secs_f32(),
            self.profile.sample_count(),
            self.profile.trace_count()
        );
        info!("{}: {line}", step.name());
        self.log.push(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::locator::Band;
    use crate::processing::peaks::PeakCriteria;

    fn survey(traces: usize, samples: usize) -> Survey {
        let profile = Profile::new(
            (0..traces)
                .map(|t| (0..samples).map(|s| ((t + s) % 7) as f64).collect())
                .collect(),
        )
        .unwrap();
        let metadata = ProfileMetadata {
            sample_count: samples,
            time_window_ns: (samples - 1) as f64,
            distance_interval_m: 0.1,
            trace_count: traces,
            frequency_mhz: 250.0,
        };
        Survey::new(profile, metadata).unwrap()
    }

    #[test]
    fn steps_parse_and_print() {
        assert_eq!("dewow(10)".parse::<ProcessingStep>(), Ok(ProcessingStep::Dewow(10)));
        assert_eq!(
            " zero_time( 2.5 ) ".parse::<ProcessingStep>(),
            Ok(ProcessingStep::ZeroTime(2.5))
        );
        assert_eq!(
            "smooth(3)".parse::<ProcessingStep>(),
            Ok(ProcessingStep::Smooth {
                trace_width: 3,
                oversample: 1
            })
        );
        let step: ProcessingStep = "smooth(3, 2)".parse().unwrap();
        assert_eq!(step.to_string(), "smooth(3,2)");
        for bad in ["dewow", "dewow()", "dewow(x)", "gain(2)", "smooth(1,2,3)"] {
            assert!(matches!(
                bad.parse::<ProcessingStep>(),
                Err(ProcessingError::ParseStep(_))
            ));
        }
    }

    #[test]
    fn steps_deserialize_from_strings() {
        let steps: Vec<ProcessingStep> =
            serde_json::from_str(r#"["zero_time(1)", "dewow(5)", "smooth(2,3)"]"#).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(serde_json::to_string(&steps[1]).unwrap(), "\"dewow(5)\"");
        assert!(serde_json::from_str::<Vec<ProcessingStep>>(r#"["warp(1)"]"#).is_err());
    }

    #[test]
    fn smoothing_keeps_axes_coherent() {
        let mut s = survey(5, 8);
        let step: ProcessingStep = "smooth(2,3)".parse().unwrap();
        s.apply(&step).unwrap();
        assert_eq!(s.profile.trace_count(), 15);
        assert_eq!(s.positions.len(), 15);
        assert_eq!(s.metadata.trace_count, 15);
        assert!((s.metadata.distance_interval_m - 0.4 / 14.0).abs() < 1e-12);
        assert_eq!(s.log.len(), 1);
        assert!(s.log[0].starts_with("smooth(2,3)"));
    }

    #[test]
    fn zero_time_shrinks_samples() {
        let mut s = survey(2, 10);
        s.apply_all(&[ProcessingStep::ZeroTime(3.0), ProcessingStep::Dewow(3)])
            .unwrap();
        assert_eq!(s.profile.sample_count(), 7);
        assert_eq!(s.metadata.sample_count, 7);
        assert_eq!(s.time_axis.len(), 7);
        assert_eq!(s.metadata.time_window_ns, 6.0);
        assert_eq!(s.log.len(), 2);
    }

    #[test]
    fn failed_step_leaves_survey_untouched() {
        let mut s = survey(3, 6);
        let before = s.profile.clone();
        assert!(s.apply(&ProcessingStep::Dewow(0)).is_err());
        assert_eq!(s.profile, before);
        assert!(s.log.is_empty());
    }

    #[test]
    fn metadata_must_describe_profile() {
        let s = survey(3, 6);
        let mut meta = s.metadata.clone();
        meta.trace_count = 4;
        assert!(Survey::new(s.profile.clone(), meta).is_err());
    }

    #[test]
    fn locate_uses_current_profile() {
        let mut rows = vec![vec![0.0; 12]; 6];
        rows[3][4] = 8000.0;
        let profile = Profile::from_rows(&rows).unwrap();
        let metadata = ProfileMetadata {
            sample_count: 6,
            time_window_ns: 5.0,
            distance_interval_m: 0.25,
            trace_count: 12,
            frequency_mhz: 500.0,
        };
        let s = Survey::new(profile, metadata).unwrap();
        let config = LocatorConfig {
            rows: Band { start: 0, end: 6 },
            peaks: PeakCriteria {
                min_height: 5000.0,
                min_threshold: 0.0,
                min_separation: 2,
                min_width: 0.0,
            },
            dedup_gap: 1,
            depth_per_sample: 0.5,
            trace_window: None,
        };
        let hits = s.locate(&config).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance_m, 1.0);
        assert_eq!(hits[0].depth, 1.5);
    }
}
