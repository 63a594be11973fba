use log::debug;
use rayon::prelude::*;

use super::window_stats::{moving_mean, WindowSpec};
use crate::data::model::{Profile, Trace};
use crate::error::{ProcessingError, Result};

/// Subtract an along-time moving average from every trace.
///
/// Acts as a low-cut filter: slow additive drift ("wow") goes, reflector
/// wavelets stay. A window at least as long as the trace removes the
/// per-trace mean. Traces are processed independently and in parallel.
pub fn dewow(profile: &Profile, window_samples: usize) -> Result<Profile> {
    if window_samples == 0 {
        return Err(ProcessingError::invalid("dewow window must be at least 1 sample"));
    }
    debug!(
        "dewow: {} traces x {} samples, window {}",
        profile.trace_count(),
        profile.sample_count(),
        window_samples
    );
    if profile.is_empty() {
        return Ok(profile.clone());
    }

    let window = WindowSpec::new(window_samples);
    let traces = profile
        .traces()
        .par_iter()
        .map(|trace| dewow_trace(trace, window))
        .collect::<Result<Vec<Trace>>>()?;
    Profile::new(traces)
}

fn dewow_trace(trace: &[f64], window: WindowSpec) -> Result<Trace> {
    let background = moving_mean(trace, window)?;
    Ok(trace.iter().zip(&background).map(|(x, m)| x - m).collect())
}
