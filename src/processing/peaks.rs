//! Constrained local-maximum detection.
//!
//! Candidates are strict local maxima, then filtered in a fixed order:
//! height, neighbour threshold, separation, width. Every limit comes from the
//! caller through [`PeakCriteria`].

use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};

/// Limits a local maximum must satisfy to count as a peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakCriteria {
    /// Minimum amplitude of the peak sample.
    pub min_height: f64,
    /// Minimum drop from the peak to the lower of its two neighbours.
    pub min_threshold: f64,
    /// Minimum index distance between two accepted peaks.
    pub min_separation: usize,
    /// Minimum width, in samples, at half prominence.
    pub min_width: f64,
}

impl PeakCriteria {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_height", self.min_height),
            ("min_threshold", self.min_threshold),
            ("min_width", self.min_width),
        ] {
            if value.is_nan() {
                return Err(ProcessingError::invalid(format!("{name} is NaN")));
            }
        }
        if self.min_threshold < 0.0 || self.min_width < 0.0 {
            return Err(ProcessingError::invalid(
                "min_threshold and min_width must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PeakCandidate {
    index: usize,
    amplitude: f64,
}

/// Indices of the peaks of `values` that pass every criterion, ascending.
///
/// Sequences shorter than three samples have no interior and yield nothing.
pub fn find_peaks(values: &[f64], criteria: &PeakCriteria) -> Vec<usize> {
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }

    let mut candidates: Vec<PeakCandidate> = (1..n - 1)
        .filter(|&i| values[i] > values[i - 1] && values[i] > values[i + 1])
        .map(|i| PeakCandidate {
            index: i,
            amplitude: values[i],
        })
        .collect();

    candidates.retain(|c| c.amplitude >= criteria.min_height);

    candidates.retain(|c| {
        let lower = values[c.index - 1].min(values[c.index + 1]);
        c.amplitude - lower >= criteria.min_threshold
    });

    if criteria.min_separation > 1 {
        candidates = enforce_separation(candidates, criteria.min_separation);
    }

    if criteria.min_width > 0.0 {
        candidates.retain(|c| half_prominence_width(values, c.index) >= criteria.min_width);
    }

    candidates.into_iter().map(|c| c.index).collect()
}

/// Keep the strongest peaks first, dropping any weaker peak closer than
/// `min_separation` to one already kept. Equal amplitudes favour the earlier
/// index. Input and output are in index order.
fn enforce_separation(candidates: Vec<PeakCandidate>, min_separation: usize) -> Vec<PeakCandidate> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .amplitude
            .total_cmp(&candidates[a].amplitude)
            .then(candidates[a].index.cmp(&candidates[b].index))
    });

    let mut keep = vec![true; candidates.len()];
    for &i in &order {
        if !keep[i] {
            continue;
        }
        let centre = candidates[i].index;
        // candidates are index-sorted, so the conflicts sit next to i
        for j in (0..i).rev() {
            if centre - candidates[j].index >= min_separation {
                break;
            }
            keep[j] = false;
        }
        for j in i + 1..candidates.len() {
            if candidates[j].index - centre >= min_separation {
                break;
            }
            keep[j] = false;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}

/// Topographic prominence of the peak at `peak`, with the indices of its
/// left and right bases. The search on each side stops at the first sample
/// higher than the peak.
fn prominence(values: &[f64], peak: usize) -> (f64, usize, usize) {
    let height = values[peak];

    let mut left_base = peak;
    let mut left_min = height;
    for i in (0..peak).rev() {
        if values[i] > height {
            break;
        }
        if values[i] < left_min {
            left_min = values[i];
            left_base = i;
        }
    }

    let mut right_base = peak;
    let mut right_min = height;
    for i in peak + 1..values.len() {
        if values[i] > height {
            break;
        }
        if values[i] < right_min {
            right_min = values[i];
            right_base = i;
        }
    }

    (height - left_min.max(right_min), left_base, right_base)
}

/// Width of the peak at half its prominence, with linear interpolation
/// between the samples that straddle the reference level.
fn half_prominence_width(values: &[f64], peak: usize) -> f64 {
    let (prom, left_base, right_base) = prominence(values, peak);
    let level = values[peak] - 0.5 * prom;

    let mut i = peak;
    while i > left_base && values[i] > level {
        i -= 1;
    }
    let mut left = i as f64;
    if values[i] < level {
        left += (level - values[i]) / (values[i + 1] - values[i]);
    }

    let mut j = peak;
    while j < right_base && values[j] > level {
        j += 1;
    }
    let mut right = j as f64;
    if values[j] < level {
        right -= (level - values[j]) / (values[j - 1] - values[j]);
    }

    right - left
}
