//! Derivation engine for recorded tour time series.
//!
//! A producer hands over samples (time, distance, altitude, position, pulse,
//! cadence, power, temperature, device speed). The [`Tour`] derives speed,
//! pace, gradient, vertical speed, smoothed series, ascent/descent, breaks,
//! heart rate zones and segment summaries from them on demand.

pub mod averages;
pub mod breaks;
pub mod config;
pub mod douglas_peucker;
pub mod elevation;
pub mod error;
pub mod geodesy;
pub mod gradient;
pub mod hr_zones;
pub mod import;
pub mod interpolation;
pub mod sample;
pub mod segmenter;
pub mod segments;
pub mod series;
pub mod smoothed_series;
pub mod smoothing;
pub mod speed;
pub mod summary;
pub mod tour;
pub mod units;

pub use config::EngineConfig;
pub use error::{ImportError, SeriesError};
pub use sample::{is_missing, Sample, TourMeta, MISSING};
pub use segments::TourSegment;
pub use series::{SerieField, TourSeries};
pub use summary::TourSummary;
pub use tour::{DerivedSeries, Tour};
pub use units::UnitSystem;
