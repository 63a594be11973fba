//! Ground-penetrating-radar profile conditioning and buried utility location.
//!
//! A common-offset profile is read into a [`Profile`] (samples × traces),
//! filtered (time-zero correction, dewow, along-profile smoothing), and
//! scanned for reflectors, producing (distance, depth) [`Detection`]s.

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod processing;

pub use data::model::{Detection, Profile, ProfileMetadata, Trace};
pub use error::{ProcessingError, Result};
