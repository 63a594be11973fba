//! Writes a synthetic MALA profile (`.rad` + `.rd3`) with buried utilities.
//!
//! Usage: `generate_sample [output_stem]` (default `sample_profile`).

use std::io::Write;

const SAMPLES: usize = 512;
const TRACES: usize = 400;
const TIME_WINDOW_NS: f64 = 50.0;
const DISTANCE_INTERVAL_M: f64 = 0.05;
const FREQUENCY_MHZ: f64 = 500.0;

/// A point reflector: apex trace, apex sample, peak amplitude.
const UTILITIES: [(f64, f64, f64); 3] = [(80.0, 140.0, 14000.0), (210.0, 260.0, 11000.0), (330.0, 190.0, 16000.0)];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Ricker wavelet centred on `mu`.
fn ricker(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    let u = (x - mu) / sigma;
    amplitude * (1.0 - u * u) * (-u * u / 2.0).exp()
}

fn generate_trace(trace: usize, noise: &mut Noise) -> Vec<f64> {
    let x = trace as f64;
    // slow per-trace drift that dewow should remove
    let wow_level = 2500.0 + 800.0 * (x * 0.02).sin();
    (0..SAMPLES)
        .map(|s| {
            let t = s as f64;
            let wow = wow_level * (-t / 150.0).exp();
            let direct = ricker(t, 20.0, 3.0, 20000.0);
            let reflectors: f64 = UTILITIES
                .iter()
                .map(|&(x0, s0, amp)| {
                    // hyperbolic moveout away from the apex
                    let offset = (x - x0) * 1.6;
                    let arrival = (s0 * s0 + offset * offset).sqrt();
                    let decay = gaussian(x, x0, 40.0, 1.0);
                    ricker(t, arrival, 2.5, amp * decay)
                })
                .sum();
            wow + direct + reflectors + noise.gauss(60.0)
        })
        .collect()
}

/// Deterministic Gaussian noise from a SplitMix64 stream.
struct Noise {
    state: u64,
}

impl Noise {
    fn seeded(seed: u64) -> Self {
        Noise { state: seed }
    }

    /// Uniform in `(0, 1]`.
    fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        ((z >> 11) + 1) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller, one sample per call.
    fn gauss(&mut self, std_dev: f64) -> f64 {
        let (u1, u2) = (self.uniform(), self.uniform());
        std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

fn main() -> anyhow::Result<()> {
    let stem = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_profile".to_string());
    let mut noise = Noise::seeded(42);

    let mut body = Vec::with_capacity(SAMPLES * TRACES * 2);
    for trace in 0..TRACES {
        for v in generate_trace(trace, &mut noise) {
            let clamped = v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
            body.extend_from_slice(&clamped.to_le_bytes());
        }
    }
    std::fs::write(format!("{stem}.rd3"), &body)?;

    let mut header = std::fs::File::create(format!("{stem}.rad"))?;
    writeln!(header, "SAMPLES:{SAMPLES}")?;
    writeln!(header, "FREQUENCY:{FREQUENCY_MHZ:.6}")?;
    writeln!(header, "TIMEWINDOW:{TIME_WINDOW_NS:.6}")?;
    writeln!(header, "DISTANCE INTERVAL:{DISTANCE_INTERVAL_M:.6}")?;
    writeln!(header, "LAST TRACE:{TRACES}")?;
    writeln!(header, "ANTENNAS:synthetic {FREQUENCY_MHZ:.0}MHz")?;

    println!(
        "Wrote {TRACES} traces ({SAMPLES} samples each) to {stem}.rad / {stem}.rd3; utilities at traces {:?}",
        UTILITIES.iter().map(|u| u.0 as usize).collect::<Vec<_>>()
    );
    Ok(())
}
