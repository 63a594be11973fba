use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::processing::{LocatorConfig, ProcessingStep};

// ---------------------------------------------------------------------------
// RunConfig – what to do with a loaded profile
// ---------------------------------------------------------------------------

/// A processing run read from JSON:
///
/// ```json
/// {
///   "steps": ["zero_time(2.0)", "dewow(10)", "smooth(3,2)"],
///   "locator": {
///     "rows": {"start": 20, "end": 30},
///     "peaks": {"min_height": 2000.0, "min_threshold": 0.0,
///               "min_separation": 20, "min_width": 0.0},
///     "dedup_gap": 5,
///     "depth_per_sample": 0.04943,
///     "trace_window": {"start": 750, "end": 900}
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub steps: Vec<ProcessingStep>,
    #[serde(default)]
    pub locator: Option<LocatorConfig>,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config<P: AsRef<Path>>(config: &RunConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(config).context("serializing config")?;
    std::fs::write(path, json).with_context(|| format!("writing config {}", path.display()))
}
