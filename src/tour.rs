//! A tour with all of its derived series.
//!
//! Derived series are computed on first access and cached in
//! [`DerivedSeries`]. Every mutation of a raw serie or of the configuration
//! drops all cached values.

use crate::averages;
use crate::breaks::{self, BreakInput, BreakTimeMethod, BreakTimeResult};
use crate::config::{BreakTimeConfig, EngineConfig, SmoothingAlgorithm};
use crate::elevation::{self, AltitudeUpDown, ElevationAlgorithm};
use crate::error::SeriesError;
use crate::geodesy::distance_from_positions;
use crate::gradient::{self, AltimeterSeries};
use crate::hr_zones::{self, HrZoneProfile, HrZoneTimes};
use crate::sample::{is_missing, Sample, TourMeta, VARIABLE_TIME_INTERVAL};
use crate::segmenter::{self, ComputedBreakpoints};
use crate::segments::{self, SegmentInput, SegmentOptions, TourSegment, TourTotals};
use crate::series::{SerieField, TourSeries};
use crate::smoothed_series::{self, AltitudeSmoothed};
use crate::speed::{self, Positions, SpeedSeries};
use crate::summary::TourSummary;
use crate::units::UnitSystem;

/// Reference altitudes below this value are not valid.
const MIN_REFERENCE_ALTITUDE: f64 = -1000.0;
const MAX_REFERENCE_ALTITUDE: f64 = 10000.0;

/// Cached derivations, `None` until they are computed or when the required
/// raw series are not available.
#[derive(Debug, Clone, Default)]
pub struct DerivedSeries {
    /// Recorded distance, or the distance computed from positions.
    pub metric_distance: Option<Vec<f64>>,
    pub speed: Option<SpeedSeries>,
    pub gradient: Option<Vec<f64>>,
    pub altimeter: Option<AltimeterSeries>,
    pub altitude_smoothed: Option<AltitudeSmoothed>,
    pub pulse_smoothed: Option<Vec<f64>>,
    pub break_time: Option<BreakTimeResult>,
    pub altitude_up_down: Option<AltitudeUpDown>,

    /// Speed, gradient, altimeter and smoothed altitude are computed together.
    is_data_computed: bool,
}

#[derive(Debug, Clone)]
pub struct Tour {
    series: TourSeries,
    meta: TourMeta,
    config: EngineConfig,
    derived: DerivedSeries,
}

fn distance_total(distance: &[f64]) -> f64 {
    match (distance.first(), distance.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    }
}

fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().fold(None, |max, value| match max {
        Some(max) if max >= value => Some(max),
        _ => Some(value),
    })
}

impl Tour {
    pub fn new(series: TourSeries, meta: TourMeta, config: EngineConfig) -> Self {
        Tour {
            series,
            meta,
            config,
            derived: DerivedSeries::default(),
        }
    }

    pub fn from_samples(samples: &[Sample], meta: TourMeta, config: EngineConfig) -> Result<Self, SeriesError> {
        let series = TourSeries::from_samples(samples, &meta)?;
        Ok(Tour::new(series, meta, config))
    }

    /// Appends several tours into one multi tour. The start of each tour is
    /// kept as a forced Douglas-Peucker point.
    pub fn concatenate(tours: &[Tour], config: EngineConfig) -> Result<Tour, SeriesError> {
        let first_start = tours.first().and_then(|tour| tour.meta.start_time);

        let offsets: Vec<i64> = tours
            .iter()
            .map(|tour| match (first_start, tour.meta.start_time) {
                (Some(first), Some(start)) => (start - first).num_seconds(),
                _ => 0,
            })
            .collect();

        let parts: Vec<&TourSeries> = tours.iter().map(|tour| &tour.series).collect();
        let (series, start_indices) = TourSeries::concatenate(&parts, &offsets)?;

        let device_time_interval = match tours.first() {
            Some(first)
                if tours
                    .iter()
                    .all(|tour| tour.meta.device_time_interval == first.meta.device_time_interval) =>
            {
                first.meta.device_time_interval
            }
            _ => VARIABLE_TIME_INTERVAL,
        };

        tracing::debug!("{} tours are concatenated into {} samples", tours.len(), series.len());

        let meta = TourMeta {
            start_time: first_start,
            device_time_interval,
            is_distance_from_sensor: !tours.is_empty() && tours.iter().all(|tour| tour.meta.is_distance_from_sensor),
            imported_dp_tolerance: None,
            multiple_tour_start_indices: start_indices,
        };

        Ok(Tour::new(series, meta, config))
    }

    pub fn series(&self) -> &TourSeries {
        &self.series
    }

    pub fn meta(&self) -> &TourMeta {
        &self.meta
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn derived(&self) -> &DerivedSeries {
        &self.derived
    }

    /// Drops all cached derivations.
    pub fn invalidate(&mut self) {
        self.derived = DerivedSeries::default();
    }

    /// Replaces the time axis, fields which no longer match its length are dropped.
    pub fn set_time_serie(&mut self, time: Vec<i64>) -> Result<(), SeriesError> {
        let mut series = TourSeries::new(time)?;

        for field in SerieField::ALL {
            let values = self.series.field(field).map(|values| values.to_vec());
            if let Err(err) = series.set_field(field, values) {
                tracing::warn!("dropping field after time change: {}", err);
            }
        }

        self.series = series;
        self.invalidate();
        Ok(())
    }

    fn set_serie(&mut self, field: SerieField, values: Option<Vec<f64>>) -> Result<(), SeriesError> {
        let result = self.series.set_field(field, values);
        self.invalidate();
        result
    }

    pub fn set_distance_serie(&mut self, distance: Option<Vec<f64>>) -> Result<(), SeriesError> {
        self.set_serie(SerieField::Distance, distance)
    }

    pub fn set_altitude_serie(&mut self, altitude: Option<Vec<f64>>) -> Result<(), SeriesError> {
        self.set_serie(SerieField::Altitude, altitude)
    }

    pub fn set_pulse_serie(&mut self, pulse: Option<Vec<f64>>) -> Result<(), SeriesError> {
        self.set_serie(SerieField::Pulse, pulse)
    }

    /// Sets the speed measured by the device (km/h).
    pub fn set_speed_serie(&mut self, speed: Option<Vec<f64>>) -> Result<(), SeriesError> {
        self.set_serie(SerieField::Speed, speed)
    }

    /// Replaces the altitude with values from a reference source, e.g. a
    /// digital elevation model. Values outside of the valid range are clamped,
    /// missing values repeat the previous one.
    pub fn replace_altitude_from_reference(&mut self, reference: &[f64]) -> Result<(), SeriesError> {
        let mut last_valid = 0.0;
        let altitude = reference
            .iter()
            .map(|value| {
                if is_missing(*value) {
                    return last_valid;
                }
                last_valid = if *value < MIN_REFERENCE_ALTITUDE {
                    0.0
                } else {
                    value.min(MAX_REFERENCE_ALTITUDE)
                };
                last_valid
            })
            .collect();

        self.set_altitude_serie(Some(altitude))
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
        self.invalidate();
    }

    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.config.unit_system = unit_system;
        self.invalidate();
    }

    fn compute_metric_distance(&mut self) {
        if self.derived.metric_distance.is_some() {
            return;
        }

        self.derived.metric_distance = match (&self.series.distance, &self.series.latitude, &self.series.longitude) {
            (Some(distance), _, _) => Some(distance.clone()),
            (None, Some(latitude), Some(longitude)) => {
                tracing::debug!("distance is computed from {} positions", latitude.len());
                Some(distance_from_positions(latitude, longitude))
            }
            _ => None,
        };
    }

    fn compute_data_series(&mut self) {
        if self.derived.is_data_computed {
            return;
        }
        self.compute_metric_distance();
        self.derived.is_data_computed = true;

        let time = &self.series.time;
        if time.len() < 2 {
            tracing::debug!("{} samples are not enough to compute speed and gradient", time.len());
            return;
        }

        let distance = self.derived.metric_distance.as_deref();
        let altitude = self.series.altitude.as_deref();
        let smoothing = &self.config.smoothing;

        let (speed, gradient, altimeter, altitude_smoothed) = match smoothing.algorithm {
            SmoothingAlgorithm::DoubleExponential => {
                let smoothed = smoothed_series::derive(time, distance, altitude, smoothing);
                (smoothed.speed, smoothed.gradient, smoothed.altimeter, smoothed.altitude)
            }
            SmoothingAlgorithm::Off => {
                // positions only identify stalled gps data
                let positions = match (&self.series.latitude, &self.series.longitude) {
                    (Some(latitude), Some(longitude)) if !self.meta.is_distance_from_sensor => {
                        Some(Positions { latitude, longitude })
                    }
                    _ => None,
                };

                let is_variable = self.meta.is_variable_interval();
                let interval = self.meta.device_time_interval;
                let min_time_slice = self.config.speed.min_time_slice;

                let speed = distance.map(|distance| {
                    if is_variable {
                        speed::variable_interval(time, distance, positions, min_time_slice)
                    } else {
                        speed::fixed_interval(time, distance, interval)
                    }
                });

                let gradient_series = match (distance, altitude, speed.as_ref()) {
                    (Some(distance), Some(altitude), Some(speed)) if is_variable => Some(gradient::variable_interval(
                        time,
                        distance,
                        altitude,
                        &speed.metric,
                        positions,
                        min_time_slice,
                    )),
                    (Some(distance), Some(altitude), _) => Some(gradient::fixed_interval(distance, altitude, interval)),
                    _ => None,
                };

                let (gradient, altimeter) = match gradient_series {
                    Some(series) => (Some(series.gradient), Some(series.altimeter)),
                    None => (None, None),
                };

                let altitude_smoothed = altitude.map(|altitude| AltitudeSmoothed::from_metric(altitude.to_vec()));

                (speed, gradient, altimeter, altitude_smoothed)
            }
        };

        // measured speed replaces the computed speed
        let speed = match self.series.speed.as_deref() {
            Some(device_speed) => Some(speed::from_device(device_speed)),
            None => speed,
        };

        self.derived.speed = speed;
        self.derived.gradient = gradient;
        self.derived.altimeter = altimeter;
        self.derived.altitude_smoothed = altitude_smoothed;
    }

    fn compute_pulse_smoothed(&mut self) {
        if self.derived.pulse_smoothed.is_some() {
            return;
        }

        let time = &self.series.time;
        let smoothing = &self.config.smoothing;

        self.derived.pulse_smoothed = self.series.pulse.as_deref().map(|pulse| match smoothing.algorithm {
            SmoothingAlgorithm::DoubleExponential => smoothed_series::smooth_pulse(time, pulse, smoothing),
            SmoothingAlgorithm::Off => pulse.to_vec(),
        });
    }

    /// Break configuration of the whole tour, fixed interval devices always
    /// detect breaks from an unchanged distance.
    fn tour_break_config(&self) -> BreakTimeConfig {
        let mut config = self.config.break_time.clone();
        if self.meta.device_time_interval > 0 {
            config.method = BreakTimeMethod::FixedDistance;
        }
        config
    }

    fn compute_break_time(&mut self, config: &BreakTimeConfig) -> Option<BreakTimeResult> {
        self.compute_data_series();

        let distance = self.derived.metric_distance.as_deref()?;
        let speed = self
            .derived
            .speed
            .as_ref()
            .map_or(&[][..], |speed| speed.metric.as_slice());

        let input = BreakInput {
            time: &self.series.time,
            distance,
            speed,
            device_time_interval: self.meta.device_time_interval,
        };

        Some(breaks::compute(&input, config))
    }

    fn compute_tour_break_time(&mut self) {
        if self.derived.break_time.is_none() {
            let config = self.tour_break_config();
            self.derived.break_time = self.compute_break_time(&config);
        }
    }

    fn compute_altitude_up_down(&mut self) {
        if self.derived.altitude_up_down.is_some() {
            return;
        }
        self.compute_metric_distance();

        let altitude = match self.series.altitude.as_deref() {
            Some(altitude) => altitude,
            None => return,
        };

        let elevation_config = &self.config.elevation;
        let forced_indices: &[usize] = if self.meta.is_multiple_tours() {
            &self.meta.multiple_tour_start_indices
        } else {
            &[]
        };

        // the imported tolerance is stored in 1/10 m
        let tolerance = self
            .meta
            .imported_dp_tolerance
            .map_or(elevation_config.dp_tolerance, |tolerance| tolerance as f64 / 10.0);

        self.derived.altitude_up_down = match (elevation_config.algorithm, self.derived.metric_distance.as_deref()) {
            (ElevationAlgorithm::LineSimplification, Some(distance)) => {
                elevation::compute_dp(distance, altitude, tolerance, forced_indices)
            }
            _ => elevation::compute_threshold(altitude, elevation_config.min_altitude_diff, None),
        };
    }

    /// Recorded distance or the distance computed from positions, in meters.
    pub fn metric_distance(&mut self) -> Option<&[f64]> {
        self.compute_metric_distance();
        self.derived.metric_distance.as_deref()
    }

    pub fn speed_series(&mut self) -> Option<&SpeedSeries> {
        self.compute_data_series();
        self.derived.speed.as_ref()
    }

    /// Gradient in %.
    pub fn gradient_serie(&mut self) -> Option<&[f64]> {
        self.compute_data_series();
        self.derived.gradient.as_deref()
    }

    pub fn altimeter_series(&mut self) -> Option<&AltimeterSeries> {
        self.compute_data_series();
        self.derived.altimeter.as_ref()
    }

    pub fn altitude_smoothed(&mut self) -> Option<&AltitudeSmoothed> {
        self.compute_data_series();
        self.derived.altitude_smoothed.as_ref()
    }

    pub fn pulse_smoothed(&mut self) -> Option<&[f64]> {
        self.compute_pulse_smoothed();
        self.derived.pulse_smoothed.as_deref()
    }

    pub fn break_time_result(&mut self) -> Option<&BreakTimeResult> {
        self.compute_tour_break_time();
        self.derived.break_time.as_ref()
    }

    /// Break time in seconds within `(start, end]`.
    pub fn break_time(&mut self, start: usize, end: usize) -> i64 {
        self.compute_tour_break_time();
        match &self.derived.break_time {
            Some(result) => result.break_time(&self.series.time, start, end),
            None => 0,
        }
    }

    /// Break time with another configuration, the cached break mask is not
    /// changed.
    pub fn break_time_with(&mut self, start: usize, end: usize, config: &BreakTimeConfig) -> i64 {
        if *config == self.tour_break_config() {
            return self.break_time(start, end);
        }
        self.compute_break_time(config)
            .map_or(0, |result| result.break_time(&self.series.time, start, end))
    }

    pub fn recording_time(&self) -> i64 {
        match (self.series.time.first(), self.series.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        }
    }

    pub fn moving_time(&mut self) -> i64 {
        let last = self.series.len().saturating_sub(1);
        self.recording_time() - self.break_time(0, last)
    }

    pub fn altitude_up_down(&mut self) -> Option<AltitudeUpDown> {
        self.compute_altitude_up_down();
        self.derived.altitude_up_down
    }

    /// Breakpoints of the threshold algorithm over the recorded altitude.
    pub fn altitude_segments(&self, min_alti_diff: f64) -> Option<ComputedBreakpoints> {
        let altitude = self.series.altitude.as_deref()?;
        if altitude.len() < 2 {
            return None;
        }
        Some(segmenter::by_computed_alti_up_down(altitude, min_alti_diff))
    }

    fn tour_average(&self, values: &[f64]) -> Option<f64> {
        let last = self.series.len().checked_sub(1)?;
        let mask = self.derived.break_time.as_ref().map(|result| result.mask.as_slice());
        Some(averages::time_weighted(&self.series.time, values, mask, 0, last))
    }

    pub fn avg_pulse(&mut self) -> Option<f64> {
        self.compute_pulse_smoothed();
        self.compute_tour_break_time();
        let pulse = self.derived.pulse_smoothed.as_deref()?;
        self.tour_average(pulse)
    }

    pub fn avg_cadence(&mut self) -> Option<f64> {
        self.compute_tour_break_time();
        let cadence = self.series.cadence.as_deref()?;
        self.tour_average(cadence)
    }

    /// Temperatures can be negative, they are averaged without weights.
    pub fn avg_temperature(&self) -> Option<f64> {
        averages::mean(self.series.temperature.as_deref()?)
    }

    /// km/h
    pub fn max_speed(&mut self) -> Option<f64> {
        self.speed_series().map(|speed| speed.max_speed)
    }

    pub fn max_altitude(&self) -> Option<f64> {
        max_value(self.series.altitude.as_deref()?)
    }

    pub fn max_pulse(&self) -> Option<f64> {
        max_value(self.series.pulse.as_deref()?)
    }

    /// Time in each hr zone, `None` without pulse, tour date or max heart rate.
    pub fn hr_zones(&mut self, profile: &mut HrZoneProfile) -> Option<HrZoneTimes> {
        let tour_date = match self.meta.start_time {
            Some(start_time) => start_time.date_naive(),
            None => {
                tracing::debug!("hr zones need the tour start date");
                return None;
            }
        };

        self.compute_pulse_smoothed();
        self.compute_tour_break_time();

        let pulse = self.derived.pulse_smoothed.as_deref()?;
        let context = profile.context_for(tour_date)?;
        let mask = self.derived.break_time.as_ref().map(|result| result.mask.as_slice());

        Some(hr_zones::accumulate(&self.series.time, pulse, mask, context))
    }

    /// Segments between `breakpoints`. Break time is computed with
    /// `break_config` when it is set, otherwise with the tour configuration.
    pub fn segments(
        &mut self,
        breakpoints: &[usize],
        break_config: Option<&BreakTimeConfig>,
    ) -> Result<Vec<TourSegment>, SeriesError> {
        self.create_segments(breakpoints, None, break_config)
    }

    /// Segments of the threshold algorithm, they also contain the computed
    /// altitude difference.
    pub fn computed_segments(
        &mut self,
        breakpoints: &ComputedBreakpoints,
        break_config: Option<&BreakTimeConfig>,
    ) -> Result<Vec<TourSegment>, SeriesError> {
        self.create_segments(
            &breakpoints.indices,
            Some(&breakpoints.computed_altitude_diffs),
            break_config,
        )
    }

    fn create_segments(
        &mut self,
        breakpoints: &[usize],
        computed_altitude_diffs: Option<&[f64]>,
        break_config: Option<&BreakTimeConfig>,
    ) -> Result<Vec<TourSegment>, SeriesError> {
        self.compute_data_series();
        self.compute_altitude_up_down();

        let avg_pulse = self.avg_pulse();
        let avg_cadence = self.avg_cadence();

        let tour_config = self.tour_break_config();
        let custom_breaks = match break_config {
            Some(config) if *config != tour_config => self.compute_break_time(config),
            _ => None,
        };
        let breaks = custom_breaks.as_ref().or(self.derived.break_time.as_ref());

        let totals = TourTotals {
            recording_time: self.recording_time(),
            break_time: breaks.map_or(0, |result| result.break_time),
            distance: self.derived.metric_distance.as_deref().map_or(0.0, distance_total),
            avg_pulse,
            avg_cadence,
            altitude_up_down: self.derived.altitude_up_down,
        };

        let input = SegmentInput {
            time: &self.series.time,
            distance: self.derived.metric_distance.as_deref(),
            altitude_smoothed: self
                .derived
                .altitude_smoothed
                .as_ref()
                .map(|altitude| altitude.metric.as_slice()),
            pulse_smoothed: self.derived.pulse_smoothed.as_deref(),
            cadence: self.series.cadence.as_deref(),
            power: self.series.power.as_deref(),
            break_mask: breaks.map(|result| result.mask.as_slice()),
        };

        let options = SegmentOptions {
            unit_system: self.config.unit_system,
            computed_altitude_diffs,
        };

        segments::build_segments(&input, breakpoints, &totals, &options).map_err(|err| {
            tracing::warn!("segments are not created: {}", err);
            err
        })
    }

    /// Computes all scalar values of the tour, hr zones are only computed
    /// when a profile is set.
    pub fn compute_computed_values(&mut self, profile: Option<&mut HrZoneProfile>) -> TourSummary {
        let unit_system = self.config.unit_system;

        let recording_time = self.recording_time();
        let moving_time = self.moving_time();
        let break_time = recording_time - moving_time;

        let distance = self.metric_distance().map_or(0.0, distance_total);
        let avg_speed = if moving_time == 0 {
            0.0
        } else {
            unit_system.speed_from_kmh(distance / moving_time as f64 * 3.6)
        };

        let altitude_up_down = self.altitude_up_down();

        TourSummary {
            unit_system,
            start_time: self.meta.start_time,
            samples: self.series.len(),
            recording_time,
            moving_time,
            break_time,
            distance: distance / 1000.0 / unit_system.distance_divisor(),
            avg_speed,
            max_speed: self.max_speed().map(|speed| unit_system.speed_from_kmh(speed)),
            avg_pace: unit_system.pace_seconds(moving_time as f64, distance),
            altitude_up: altitude_up_down.map(|up_down| unit_system.altitude_from_meters(up_down.up)),
            altitude_down: altitude_up_down.map(|up_down| unit_system.altitude_from_meters(up_down.down)),
            max_altitude: self
                .max_altitude()
                .map(|altitude| unit_system.altitude_from_meters(altitude)),
            avg_pulse: self.avg_pulse(),
            max_pulse: self.max_pulse(),
            avg_cadence: self.avg_cadence(),
            avg_temperature: self.avg_temperature(),
            hr_zones: profile.and_then(|profile| self.hr_zones(profile)),
        }
    }
}
