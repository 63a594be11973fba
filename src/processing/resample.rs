use log::debug;
use rayon::prelude::*;

use super::window_stats::{mean, moving_mean, WindowSpec};
use crate::data::model::{linspace, Profile, Trace};
use crate::error::{ProcessingError, Result};

/// Oversample and smooth a profile along the survey line.
///
/// Every trace is first repeated `oversample` times side by side, and the
/// positions are re-spaced evenly over the original span. The traces are then
/// replaced by a moving average over `trace_width` neighbours:
///
/// * `trace_width` 0 or 1: no smoothing
/// * `trace_width >= oversample * trace_count`: every trace becomes the mean
///   trace (the trace count is kept)
/// * otherwise: the clamped moving mean of [`moving_mean`], row by row
///
/// The output always holds `oversample * trace_count` traces and as many
/// positions, with the sample count unchanged.
pub fn resample(
    profile: &Profile,
    positions: &[f64],
    trace_width: usize,
    oversample: usize,
) -> Result<(Profile, Vec<f64>)> {
    if oversample == 0 {
        return Err(ProcessingError::invalid("oversample factor must be at least 1"));
    }
    if positions.len() != profile.trace_count() {
        return Err(ProcessingError::ShapeMismatch {
            what: "profile positions",
            expected: profile.trace_count(),
            found: positions.len(),
        });
    }

    let total = oversample * profile.trace_count();
    debug!(
        "resample: {} traces -> {} (oversample {}), smoothing over {} traces",
        profile.trace_count(),
        total,
        oversample,
        trace_width
    );

    let new_positions = match (positions.first(), positions.last()) {
        (Some(&first), Some(&last)) => linspace(first, last, total),
        _ => Vec::new(),
    };

    let repeated: Vec<Trace> = profile
        .traces()
        .iter()
        .flat_map(|t| std::iter::repeat(t).take(oversample).cloned())
        .collect();
    let repeated = Profile::new(repeated)?;

    let smoothed = if trace_width <= 1 || repeated.is_empty() {
        repeated
    } else if trace_width >= total {
        let mean_trace: Trace = repeated.to_rows().iter().map(|row| mean(row)).collect();
        Profile::new(vec![mean_trace; total])?
    } else {
        let window = WindowSpec::new(trace_width);
        let rows = repeated
            .to_rows()
            .par_iter()
            .map(|row| moving_mean(row, window))
            .collect::<Result<Vec<_>>>()?;
        Profile::from_rows(&rows)?
    };

    Ok((smoothed, new_positions))
}
