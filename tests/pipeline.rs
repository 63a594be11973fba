use std::path::{Path, PathBuf};

use rusty_gpr::config::RunConfig;
use rusty_gpr::data::loader::load_file;
use rusty_gpr::export::write_detections;
use rusty_gpr::processing::{dewow, find_peaks, resample, PeakCriteria, Survey};
use rusty_gpr::Profile;

const SAMPLES: usize = 64;
const TRACES: usize = 48;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rusty-gpr-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Drifting background plus two point reflectors whose apex is row 20 at
/// trace 12 and row 40 at trace 34.
fn write_mala(stem: &Path) {
    let mut body = Vec::new();
    for t in 0..TRACES {
        for s in 0..SAMPLES {
            let mut v = 3000.0 - 30.0 * s as f64 + 5.0 * t as f64;
            for (apex_t, apex_s) in [(12i64, 20i64), (34, 40)] {
                let offset = (t as i64 - apex_t).abs();
                if s as i64 == apex_s + offset && offset <= 3 {
                    // weaker flanks stay under the locator's height cut
                    v += if offset == 0 { 12000.0 } else { 4000.0 };
                }
            }
            body.extend_from_slice(&(v as i16).to_le_bytes());
        }
    }
    let header = format!(
        "SAMPLES:{SAMPLES}\nFREQUENCY:500.000000\nTIMEWINDOW:20.0\n\
         DISTANCE INTERVAL:0.1\nLAST TRACE:{TRACES}\n"
    );
    let mut rad = stem.as_os_str().to_owned();
    rad.push(".rad");
    let mut rd3 = stem.as_os_str().to_owned();
    rd3.push(".rd3");
    std::fs::write(rad, header).unwrap();
    std::fs::write(rd3, body).unwrap();
}

const RUN: &str = r#"{
    "steps": ["dewow(8)"],
    "locator": {
        "rows": {"start": 10, "end": 50},
        "peaks": {"min_height": 6000.0, "min_threshold": 1000.0,
                  "min_separation": 4, "min_width": 0.0},
        "dedup_gap": 4,
        "depth_per_sample": 0.05
    }
}"#;

#[test]
fn reader_filters_and_locator_end_to_end() {
    let stem = temp_dir().join("line_0001");
    write_mala(&stem);
    let mut rd3 = stem.clone().into_os_string();
    rd3.push(".rd3");

    let loaded = load_file(&PathBuf::from(rd3)).unwrap();
    assert_eq!(loaded.profile.sample_count(), SAMPLES);
    assert_eq!(loaded.profile.trace_count(), TRACES);

    let run: RunConfig = serde_json::from_str(RUN).unwrap();
    let mut survey = Survey::new(loaded.profile, loaded.metadata).unwrap();
    survey.apply_all(&run.steps).unwrap();
    let detections = survey.locate(run.locator.as_ref().unwrap()).unwrap();

    let found: Vec<(usize, usize)> = detections.iter().map(|d| (d.trace_index, d.row)).collect();
    assert_eq!(found, vec![(12, 20), (34, 40)]);
    assert!((detections[0].distance_m - 1.2).abs() < 1e-9);
    assert!((detections[1].depth - 2.0).abs() < 1e-9);

    let mut csv = Vec::new();
    write_detections(&mut csv, &detections).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 3);
}

#[test]
fn dewow_then_oversample_keeps_reflectors() {
    let mut rows = vec![vec![100.0; 4]; 16];
    rows[8] = vec![100.0, 5000.0, 100.0, 100.0];
    let profile = Profile::from_rows(&rows).unwrap();

    let filtered = dewow(&profile, 4).unwrap();
    let (wide, positions) = resample(&filtered, &[0.0, 1.0, 2.0, 3.0], 0, 2).unwrap();
    assert_eq!(wide.trace_count(), 8);
    assert_eq!(positions.last().copied(), Some(3.0));

    // duplicated traces form a plateau, which is not a strict maximum
    let row = wide.row(8).unwrap();
    let criteria = PeakCriteria {
        min_height: 1000.0,
        min_threshold: 0.0,
        min_separation: 0,
        min_width: 0.0,
    };
    assert!(find_peaks(&row, &criteria).is_empty());
    assert_eq!(find_peaks(&filtered.row(8).unwrap(), &criteria), vec![1]);
}
