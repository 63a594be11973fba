use crate::data::model::Profile;
use crate::error::{ProcessingError, Result};

// ---------------------------------------------------------------------------
// Clamped moving mean
// ---------------------------------------------------------------------------

/// Symmetric moving-average window, measured in samples or traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub width: usize,
}

impl WindowSpec {
    pub fn new(width: usize) -> Self {
        WindowSpec { width }
    }

    /// Length of each constant edge block minus one: `ceil(width / 2)`.
    pub fn half_width(&self) -> usize {
        self.width.div_ceil(2)
    }

    /// Reach of the centred window on either side: `floor(width / 2)`.
    pub fn reach(&self) -> usize {
        self.width / 2
    }
}

/// Moving mean with constant edge blocks.
///
/// With `h = ceil(width / 2)`:
/// * `width >= len`: every element is the global mean.
/// * indices `0..=h` all take the mean of `values[0..=h]`, and the last
///   `h + 1` indices all take the mean of the last `h + 1` values.
/// * every index in between takes the mean of the centred window
///   `values[i - width/2 ..= i + width/2]`.
///
/// When the two edge blocks would overlap (`2 * (h + 1) > len`) they cannot
/// both stay constant, so every element takes the global mean instead. No
/// centred mean is computed for a middle index in that case.
///
/// Only `width == 0` leaves the input unchanged; `width == 1` already
/// averages the first two and the last two samples.
pub fn moving_mean(values: &[f64], window: WindowSpec) -> Result<Vec<f64>> {
    let n = values.len();
    if n == 0 {
        return Err(ProcessingError::invalid("moving mean of an empty sequence"));
    }
    let h = window.half_width();
    if window.width >= n || 2 * (h + 1) > n {
        return Ok(vec![mean(values); n]);
    }

    let mut out = vec![0.0; n];
    let head = mean(&values[..=h]);
    let tail_start = n - h - 1;
    let tail = mean(&values[tail_start..]);
    out[..=h].fill(head);
    out[tail_start..].fill(tail);

    let reach = window.reach();
    for i in h + 1..tail_start {
        out[i] = mean(&values[i - reach..=i + reach]);
    }
    Ok(out)
}

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean amplitude of every `stride`-th trace, as `(trace_index, mean)`.
pub fn trace_mean_amplitudes(profile: &Profile, stride: usize) -> Result<Vec<(usize, f64)>> {
    if stride == 0 {
        return Err(ProcessingError::invalid("trace stride must be at least 1"));
    }
    Ok(profile
        .traces()
        .iter()
        .enumerate()
        .step_by(stride)
        .map(|(i, t)| (i, mean(t)))
        .collect())
}
