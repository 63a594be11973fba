use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::model::{Detection, Profile, ProfileMetadata};

// ---------------------------------------------------------------------------
// CSV writers
// ---------------------------------------------------------------------------

/// Write detections as `trace_index,row,distance_m,depth` rows.
pub fn write_detections<W: Write>(writer: W, detections: &[Detection]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for d in detections {
        csv.serialize(d).context("writing detection")?;
    }
    csv.flush().context("flushing detections")?;
    Ok(())
}

pub fn save_detections(path: &Path, detections: &[Detection]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_detections(file, detections)
}

/// Write the profile as a grid: one line per sample row, one column per trace.
pub fn write_profile<W: Write>(writer: W, profile: &Profile) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for row in profile.to_rows() {
        csv.write_record(row.iter().map(|v| v.to_string()))
            .context("writing profile row")?;
    }
    csv.flush().context("flushing profile")?;
    Ok(())
}

pub fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_profile(file, profile)
}

// ---------------------------------------------------------------------------
// JSON run summary
// ---------------------------------------------------------------------------

/// What a `locate` run did, for machine consumption.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub input: String,
    pub metadata: &'a ProfileMetadata,
    pub steps: &'a [String],
    pub detections: &'a [Detection],
}

pub fn save_summary(path: &Path, summary: &RunSummary<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serializing summary")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detections_have_a_header() {
        let detections = vec![
            Detection {
                trace_index: 4,
                row: 2,
                distance_m: 0.2,
                depth: 0.1,
            },
            Detection {
                trace_index: 9,
                row: 3,
                distance_m: 0.45,
                depth: 0.15,
            },
        ];
        let mut buf = Vec::new();
        write_detections(&mut buf, &detections).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "trace_index,row,distance_m,depth");
        assert_eq!(lines[1], "4,2,0.2,0.1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn profile_is_written_row_major() {
        let p = Profile::from_rows(&[vec![1.0, 2.0], vec![3.5, -4.0]]).unwrap();
        let mut buf = Vec::new();
        write_profile(&mut buf, &p).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["1,2", "3.5,-4"]);
    }
}
