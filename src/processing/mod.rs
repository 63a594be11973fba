/// Numeric core: filters and reflector detection.
///
/// ```text
///   Profile ──► zero_time ──► dewow ──► resample ──► locator ──► Vec<Detection>
///                              │           │            │
///                              └── window_stats ──┘     └── peaks
/// ```
///
/// Every stage borrows its input and returns a freshly owned output.

pub mod dewow;
pub mod locator;
pub mod peaks;
pub mod pipeline;
pub mod resample;
pub mod time_zero;
pub mod window_stats;

pub use dewow::dewow;
pub use locator::{locate, Band, LocatorConfig, UtilityLocator};
pub use peaks::{find_peaks, PeakCriteria};
pub use pipeline::{ProcessingStep, Survey};
pub use resample::resample;
pub use time_zero::set_zero_time;
pub use window_stats::{moving_mean, trace_mean_amplitudes, WindowSpec};
