use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{info, warn};

use super::model::{
    Header, HeaderValue, Profile, ProfileMetadata, KEY_DISTANCE_INTERVAL, KEY_FREQUENCY,
    KEY_LAST_TRACE, KEY_SAMPLES, KEY_TIME_WINDOW,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// A loaded survey line: amplitudes, derived scalars, and the raw header.
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: Profile,
    pub metadata: ProfileMetadata,
    pub header: Header,
}

/// Load a radar profile from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.rad` / `.rd3` / `.rd7` – MALA header + binary pair sharing a stem
pub fn load_file(path: &Path) -> Result<LoadedProfile> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "rad" | "rd3" | "rd7" => load_mala(&path.with_extension("")),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// MALA loader
// ---------------------------------------------------------------------------

/// Read `<stem>.rad` and the matching `.rd3` (or `.rd7`) body.
///
/// The body is a flat run of 16-bit signed little-endian samples, trace after
/// trace, `SAMPLES` values per trace.
pub fn load_mala(stem: &Path) -> Result<LoadedProfile> {
    let header_path = sibling(stem, "rad");
    let text = std::fs::read_to_string(&header_path)
        .with_context(|| format!("reading header {}", header_path.display()))?;
    let header = parse_header(&text);
    let sample_count = required_usize(&header, KEY_SAMPLES)?;
    if sample_count == 0 {
        bail!("{KEY_SAMPLES} is zero in {}", header_path.display());
    }

    let (data_path, rectify) = data_file_for(stem)?;
    let bytes = std::fs::read(&data_path)
        .with_context(|| format!("reading data {}", data_path.display()))?;
    let mut profile = decode_traces(&bytes, sample_count)
        .with_context(|| format!("decoding {}", data_path.display()))?;
    if rectify {
        profile = profile.map_samples(f64::abs);
    }

    let trace_count = profile.trace_count();
    if let Some(last) = header.get(KEY_LAST_TRACE).and_then(HeaderValue::as_usize) {
        if last != trace_count {
            warn!(
                "{KEY_LAST_TRACE} says {last} traces but {} holds {trace_count}; using the data",
                data_path.display()
            );
        }
    }

    let metadata = ProfileMetadata {
        sample_count,
        time_window_ns: required_f64(&header, KEY_TIME_WINDOW)?,
        distance_interval_m: required_f64(&header, KEY_DISTANCE_INTERVAL)?,
        trace_count,
        frequency_mhz: header
            .get(KEY_FREQUENCY)
            .and_then(HeaderValue::as_f64)
            .unwrap_or(0.0),
    };

    info!(
        "loaded {}: {} samples x {} traces",
        stem.display(),
        sample_count,
        trace_count
    );

    Ok(LoadedProfile {
        profile,
        metadata,
        header,
    })
}

/// Parse colon-delimited `KEY:VALUE` lines. Lines without a colon are skipped;
/// only the first colon splits, so values may contain colons themselves.
pub fn parse_header(text: &str) -> Header {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), HeaderValue::parse(value)))
        .collect()
}

/// Split little-endian i16 bytes into traces of `sample_count` samples.
pub fn decode_traces(bytes: &[u8], sample_count: usize) -> Result<Profile> {
    let trace_bytes = sample_count * 2;
    if bytes.len() % trace_bytes != 0 {
        bail!(
            "{} bytes is not a whole number of {}-sample traces",
            bytes.len(),
            sample_count
        );
    }
    let traces = bytes
        .chunks_exact(trace_bytes)
        .map(|chunk| {
            chunk
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f64)
                .collect()
        })
        .collect();
    Ok(Profile::new(traces)?)
}

// -- Helpers --

fn data_file_for(stem: &Path) -> Result<(PathBuf, bool)> {
    let rd3 = sibling(stem, "rd3");
    if rd3.exists() {
        return Ok((rd3, false));
    }
    // .rd7 is read with the .rd3 layout and rectified
    let rd7 = sibling(stem, "rd7");
    if rd7.exists() {
        return Ok((rd7, true));
    }
    bail!("no .rd3 or .rd7 data next to {}", stem.display())
}

/// `stem` plus an extension, without `Path::with_extension` eating dotted stems.
fn sibling(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn required_f64(header: &Header, key: &str) -> Result<f64> {
    header
        .get(key)
        .with_context(|| format!("header missing '{key}'"))?
        .as_f64()
        .with_context(|| format!("header '{key}' is not numeric"))
}

fn required_usize(header: &Header, key: &str) -> Result<usize> {
    header
        .get(key)
        .with_context(|| format!("header missing '{key}'"))?
        .as_usize()
        .with_context(|| format!("header '{key}' is not a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "SAMPLES:4\nFREQUENCY:500.000000\nTIMEWINDOW:30.0\n\
                          DISTANCE INTERVAL:0.02\nLAST TRACE:3\nANTENNAS:500MHz shielded\n";

    fn temp_stem(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rusty-gpr-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn encode(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn header_keys_keep_spaces() {
        let header = parse_header(HEADER);
        assert_eq!(header.get("SAMPLES"), Some(&HeaderValue::Integer(4)));
        assert_eq!(
            header.get("DISTANCE INTERVAL"),
            Some(&HeaderValue::Float(0.02))
        );
        assert_eq!(header.get("LAST TRACE"), Some(&HeaderValue::Integer(3)));
    }

    #[test]
    fn decodes_trace_major_i16() {
        let bytes = encode(&[1, -2, 3, 4, 5, 6]);
        let profile = decode_traces(&bytes, 3).unwrap();
        assert_eq!(profile.trace_count(), 2);
        assert_eq!(profile.trace(0), Some(&vec![1.0, -2.0, 3.0]));
        assert_eq!(profile.row(0), Some(vec![1.0, 4.0]));
    }

    #[test]
    fn partial_trace_is_an_error() {
        assert!(decode_traces(&encode(&[1, 2, 3]), 2).is_err());
    }

    #[test]
    fn loads_rad_rd3_pair() {
        let stem = temp_stem("pair");
        std::fs::write(stem.with_extension("rad"), HEADER).unwrap();
        let samples: Vec<i16> = (0..12).map(|v| v * 100 - 600).collect();
        std::fs::write(stem.with_extension("rd3"), encode(&samples)).unwrap();

        let loaded = load_file(&stem.with_extension("rd3")).unwrap();
        assert_eq!(loaded.metadata.sample_count, 4);
        assert_eq!(loaded.metadata.trace_count, 3);
        assert_eq!(loaded.metadata.time_window_ns, 30.0);
        assert_eq!(loaded.metadata.distance_interval_m, 0.02);
        assert_eq!(loaded.metadata.frequency_mhz, 500.0);
        assert_eq!(loaded.profile.trace(2), Some(&vec![200.0, 300.0, 400.0, 500.0]));
    }

    #[test]
    fn rd7_is_rectified() {
        let stem = temp_stem("rect");
        std::fs::write(stem.with_extension("rad"), HEADER).unwrap();
        std::fs::write(stem.with_extension("rd7"), encode(&[-1, 2, -3, 4])).unwrap();
        let loaded = load_file(&stem.with_extension("rad")).unwrap();
        assert_eq!(loaded.profile.trace(0), Some(&vec![1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn missing_key_is_reported() {
        let stem = temp_stem("nokey");
        std::fs::write(stem.with_extension("rad"), "SAMPLES:2\nTIMEWINDOW:10\n").unwrap();
        std::fs::write(stem.with_extension("rd3"), encode(&[0, 0])).unwrap();
        let err = load_file(&stem.with_extension("rad")).unwrap_err();
        assert!(format!("{err:#}").contains("DISTANCE INTERVAL"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(load_file(Path::new("profile.dzt")).is_err());
    }
}
