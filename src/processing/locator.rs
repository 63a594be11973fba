use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Range;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::peaks::{find_peaks, PeakCriteria};
use crate::data::model::{Detection, Profile, ProfileMetadata};
use crate::error::{ProcessingError, Result};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Half-open band `[start, end)` of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub start: usize,
    pub end: usize,
}

impl From<Band> for Range<usize> {
    fn from(b: Band) -> Self {
        b.start..b.end
    }
}

/// Everything the locator needs besides the profile itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Sample rows to scan, shallowest first.
    pub rows: Band,
    pub peaks: PeakCriteria,
    /// Hits whose trace index is within this many traces of the previous
    /// kept hit are merged into it.
    pub dedup_gap: usize,
    /// Depth units per sample row.
    pub depth_per_sample: f64,
    /// Only traces inside this band may produce detections.
    #[serde(default)]
    pub trace_window: Option<Band>,
}

// ---------------------------------------------------------------------------
// UtilityLocator
// ---------------------------------------------------------------------------

/// Turns across-profile peaks in a band of rows into (distance, depth) hits.
#[derive(Debug, Clone)]
pub struct UtilityLocator {
    criteria: PeakCriteria,
    dedup_gap: usize,
    depth_per_sample: f64,
    trace_window: Option<Range<usize>>,
}

impl UtilityLocator {
    pub fn new(config: &LocatorConfig) -> Result<Self> {
        config.peaks.validate()?;
        if !config.depth_per_sample.is_finite() {
            return Err(ProcessingError::invalid("depth_per_sample must be finite"));
        }
        Ok(UtilityLocator {
            criteria: config.peaks.clone(),
            dedup_gap: config.dedup_gap,
            depth_per_sample: config.depth_per_sample,
            trace_window: config.trace_window.map(Range::from),
        })
    }

    /// Scan `rows` and return one detection per reflector, ordered by trace.
    ///
    /// Each row is rectified and searched for peaks across the traces. A trace
    /// keeps the shallowest row that hit it, whatever order rows finish in.
    /// Hits closer than `dedup_gap` traces to the previous kept hit are then
    /// dropped. Rows past the end of the profile are ignored.
    pub fn locate(
        &self,
        profile: &Profile,
        metadata: &ProfileMetadata,
        rows: Range<usize>,
    ) -> Vec<Detection> {
        let rows = rows.start..rows.end.min(profile.sample_count());
        if rows.is_empty() || profile.trace_count() == 0 {
            return Vec::new();
        }

        let hits: Vec<(usize, Vec<usize>)> = rows
            .clone()
            .into_par_iter()
            .filter_map(|r| {
                let row: Vec<f64> = profile.row(r)?.into_iter().map(f64::abs).collect();
                Some((r, find_peaks(&row, &self.criteria)))
            })
            .collect();

        let first_hits = self.merge_first_hits(metadata, hits);
        debug!(
            "locate: rows {:?} produced hits on {} traces",
            rows,
            first_hits.len()
        );

        self.deduplicate(first_hits)
    }

    /// Fold `(row, peak traces)` pairs into one detection per trace, keeping
    /// the smallest row. The pairs may arrive in any row order.
    fn merge_first_hits(
        &self,
        metadata: &ProfileMetadata,
        hits: impl IntoIterator<Item = (usize, Vec<usize>)>,
    ) -> BTreeMap<usize, Detection> {
        let mut first_hits: BTreeMap<usize, Detection> = BTreeMap::new();
        for (r, traces) in hits {
            for t in traces.into_iter().filter(|t| self.in_window(*t)) {
                let candidate = self.detection(metadata, t, r);
                match first_hits.entry(t) {
                    Entry::Vacant(slot) => {
                        slot.insert(candidate);
                    }
                    Entry::Occupied(mut slot) => {
                        if r < slot.get().row {
                            slot.insert(candidate);
                        }
                    }
                }
            }
        }
        first_hits
    }

    fn in_window(&self, trace: usize) -> bool {
        self.trace_window
            .as_ref()
            .map_or(true, |w| w.contains(&trace))
    }

    fn detection(&self, metadata: &ProfileMetadata, trace: usize, row: usize) -> Detection {
        Detection {
            trace_index: trace,
            row,
            distance_m: metadata.distance_of(trace),
            depth: row as f64 * self.depth_per_sample,
        }
    }

    /// Walk hits in trace order, dropping any within `dedup_gap` of the last
    /// kept one.
    fn deduplicate(&self, first_hits: BTreeMap<usize, Detection>) -> Vec<Detection> {
        let mut kept: Vec<Detection> = Vec::with_capacity(first_hits.len());
        for (t, d) in first_hits {
            match kept.last() {
                Some(prev) if t - prev.trace_index <= self.dedup_gap => continue,
                _ => kept.push(d),
            }
        }
        kept
    }
}

/// Run the locator over the band configured in `config.rows`.
pub fn locate(
    profile: &Profile,
    metadata: &ProfileMetadata,
    config: &LocatorConfig,
) -> Result<Vec<Detection>> {
    let locator = UtilityLocator::new(config)?;
    Ok(locator.locate(profile, metadata, config.rows.into()))
}
