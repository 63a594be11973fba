use log::debug;

use crate::data::model::Profile;
use crate::error::{ProcessingError, Result};

/// Move time zero to the sample nearest `new_zero_ns`.
///
/// Earlier samples are cut from every trace and the time axis is shifted so
/// the retained first sample sits exactly at 0 ns.
pub fn set_zero_time(
    profile: &Profile,
    time_axis: &[f64],
    new_zero_ns: f64,
) -> Result<(Profile, Vec<f64>)> {
    if !new_zero_ns.is_finite() {
        return Err(ProcessingError::invalid("new zero time must be finite"));
    }
    if time_axis.len() != profile.sample_count() {
        return Err(ProcessingError::ShapeMismatch {
            what: "time axis",
            expected: profile.sample_count(),
            found: time_axis.len(),
        });
    }
    if time_axis.is_empty() {
        return Ok((profile.clone(), Vec::new()));
    }

    let zero = nearest_index(time_axis, new_zero_ns);
    debug!("time zero: {new_zero_ns} ns -> dropping {zero} samples");

    let traces = profile
        .traces()
        .iter()
        .map(|t| t[zero..].to_vec())
        .collect();
    let mut axis: Vec<f64> = time_axis[zero..].iter().map(|t| t - new_zero_ns).collect();
    axis[0] = 0.0;
    Ok((Profile::new(traces)?, axis))
}

/// Index of the first value closest to `target`.
fn nearest_index(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, dist), (i, v)| {
            let d = (v - target).abs();
            if d < dist {
                (i, d)
            } else {
                (best, dist)
            }
        })
        .0
}
