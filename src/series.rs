//! Parallel per-sample arrays of one tour.
//!
//! Every field is either absent or exactly as long as the time serie. Fields
//! which are assembled from [`Sample`]s are completed here: gaps are
//! interpolated (or zeroed for counters) so that derivations never see a
//! `MISSING` value.

use crate::error::SeriesError;
use crate::interpolation::{fill_gaps, remove_distance_without_position, remove_invalid_distance_values, zero_gaps};
use crate::sample::{is_missing, Sample, TourMeta, MISSING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerieField {
    Distance,
    Altitude,
    Latitude,
    Longitude,
    Pulse,
    Cadence,
    Power,
    Temperature,
    Speed,
}

impl SerieField {
    pub const ALL: [SerieField; 9] = [
        SerieField::Distance,
        SerieField::Altitude,
        SerieField::Latitude,
        SerieField::Longitude,
        SerieField::Pulse,
        SerieField::Cadence,
        SerieField::Power,
        SerieField::Temperature,
        SerieField::Speed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SerieField::Distance => "distance",
            SerieField::Altitude => "altitude",
            SerieField::Latitude => "latitude",
            SerieField::Longitude => "longitude",
            SerieField::Pulse => "pulse",
            SerieField::Cadence => "cadence",
            SerieField::Power => "power",
            SerieField::Temperature => "temperature",
            SerieField::Speed => "speed",
        }
    }

    /// Counters and device speed are not interpolated, a gap is a `0`.
    fn is_zero_filled(self) -> bool {
        matches!(self, SerieField::Cadence | SerieField::Power | SerieField::Speed)
    }

    fn value_of(self, sample: &Sample) -> Option<f64> {
        match self {
            SerieField::Distance => sample.distance,
            SerieField::Altitude => sample.altitude,
            SerieField::Latitude => sample.latitude,
            SerieField::Longitude => sample.longitude,
            SerieField::Pulse => sample.pulse,
            SerieField::Cadence => sample.cadence,
            SerieField::Power => sample.power,
            SerieField::Temperature => sample.temperature,
            SerieField::Speed => sample.speed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourSeries {
    /// Seconds since the tour start, non decreasing.
    pub time: Vec<i64>,
    pub distance: Option<Vec<f64>>,
    pub altitude: Option<Vec<f64>>,
    pub latitude: Option<Vec<f64>>,
    pub longitude: Option<Vec<f64>>,
    pub pulse: Option<Vec<f64>>,
    pub cadence: Option<Vec<f64>>,
    pub power: Option<Vec<f64>>,
    pub temperature: Option<Vec<f64>>,
    /// Speed in km/h measured by the device.
    pub speed: Option<Vec<f64>>,
}

/// Checks that the time serie never decreases.
pub fn validate_time(time: &[i64]) -> Result<(), SeriesError> {
    for (index, w) in time.windows(2).enumerate() {
        if w[1] < w[0] {
            return Err(SeriesError::TimeNotMonotonic {
                index: index + 1,
                previous: w[0],
                current: w[1],
            });
        }
    }
    Ok(())
}

impl TourSeries {
    /// Creates a serie bundle with only a time axis.
    pub fn new(time: Vec<i64>) -> Result<Self, SeriesError> {
        validate_time(&time)?;
        Ok(TourSeries {
            time,
            ..Default::default()
        })
    }

    /// Builder variant of [`TourSeries::set_field`], a field with a wrong
    /// length is logged and dropped.
    pub fn with_field(mut self, field: SerieField, values: Vec<f64>) -> Self {
        if let Err(err) = self.set_field(field, Some(values)) {
            tracing::warn!("dropping field: {}", err);
        }
        self
    }

    pub fn set_field(&mut self, field: SerieField, values: Option<Vec<f64>>) -> Result<(), SeriesError> {
        if let Some(values) = &values {
            if values.len() != self.time.len() {
                *self.field_mut(field) = None;
                return Err(SeriesError::LengthMismatch {
                    field: field.name(),
                    expected: self.time.len(),
                    actual: values.len(),
                });
            }
        }
        *self.field_mut(field) = values;
        Ok(())
    }

    pub fn field(&self, field: SerieField) -> Option<&[f64]> {
        match field {
            SerieField::Distance => self.distance.as_deref(),
            SerieField::Altitude => self.altitude.as_deref(),
            SerieField::Latitude => self.latitude.as_deref(),
            SerieField::Longitude => self.longitude.as_deref(),
            SerieField::Pulse => self.pulse.as_deref(),
            SerieField::Cadence => self.cadence.as_deref(),
            SerieField::Power => self.power.as_deref(),
            SerieField::Temperature => self.temperature.as_deref(),
            SerieField::Speed => self.speed.as_deref(),
        }
    }

    fn field_mut(&mut self, field: SerieField) -> &mut Option<Vec<f64>> {
        match field {
            SerieField::Distance => &mut self.distance,
            SerieField::Altitude => &mut self.altitude,
            SerieField::Latitude => &mut self.latitude,
            SerieField::Longitude => &mut self.longitude,
            SerieField::Pulse => &mut self.pulse,
            SerieField::Cadence => &mut self.cadence,
            SerieField::Power => &mut self.power,
            SerieField::Temperature => &mut self.temperature,
            SerieField::Speed => &mut self.speed,
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn has_positions(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Builds the arrays from producer samples and completes missing values.
    pub fn from_samples(samples: &[Sample], meta: &TourMeta) -> Result<Self, SeriesError> {
        let time: Vec<i64> = samples.iter().map(|s| s.time).collect();
        validate_time(&time)?;

        let mut series = TourSeries {
            time,
            ..Default::default()
        };

        for field in SerieField::ALL {
            let values: Vec<f64> = samples
                .iter()
                .map(|s| field.value_of(s).unwrap_or(MISSING))
                .collect();

            if values.iter().all(|v| is_missing(*v)) {
                continue;
            }
            *series.field_mut(field) = Some(values);
        }

        series.complete_data(meta);

        Ok(series)
    }

    fn complete_data(&mut self, meta: &TourMeta) {
        // positions are required to detect distance values recorded without gps
        if !meta.is_distance_from_sensor {
            if let (Some(distance), Some(latitude)) = (self.distance.as_mut(), self.latitude.as_ref()) {
                remove_distance_without_position(distance, latitude);
            }
        }

        if let Some(distance) = self.distance.as_mut() {
            if !remove_invalid_distance_values(distance) {
                tracing::debug!("distance serie contains no valid values, it is removed");
                self.distance = None;
            }
        }

        let time = std::mem::take(&mut self.time);
        for field in SerieField::ALL {
            let zero_filled = field.is_zero_filled();
            if let Some(values) = self.field_mut(field).as_mut() {
                if zero_filled {
                    zero_gaps(values);
                } else {
                    fill_gaps(values, &time);
                }
            }
        }
        self.time = time;
    }

    /// Appends several tours into one serie bundle.
    ///
    /// `start_offsets` holds the requested time offset of each part in seconds
    /// since the first part started, a part never starts before the previous
    /// part ended. Distance continues from the end of the previous part.
    ///
    /// A field which only some parts have is 0 in the other parts, a field
    /// which no part has stays absent.
    ///
    /// Returns the merged bundle and the start index of every part.
    pub fn concatenate(parts: &[&TourSeries], start_offsets: &[i64]) -> Result<(TourSeries, Vec<usize>), SeriesError> {
        let mut merged = TourSeries::default();
        let mut start_indices = Vec::with_capacity(parts.len());

        let total: usize = parts.iter().map(|p| p.len()).sum();
        let mut fields: Vec<(SerieField, Vec<f64>)> = SerieField::ALL
            .iter()
            .filter(|f| parts.iter().any(|p| p.field(**f).is_some()))
            .map(|f| (*f, Vec::with_capacity(total)))
            .collect();

        let mut distance_offset = 0.0;

        for (part_index, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }

            let requested = start_offsets.get(part_index).copied().unwrap_or(0);
            let time_offset = match merged.time.last() {
                Some(&last) => requested.max(last - part.time[0]),
                None => requested,
            };

            start_indices.push(merged.time.len());
            merged.time.extend(part.time.iter().map(|t| t + time_offset));

            for (field, values) in fields.iter_mut() {
                match part.field(*field) {
                    Some(part_values) if *field == SerieField::Distance => {
                        let first = part_values[0];
                        values.extend(part_values.iter().map(|d| d - first + distance_offset));
                    }
                    Some(part_values) => values.extend_from_slice(part_values),
                    // a part without distance does not move
                    None if *field == SerieField::Distance => {
                        values.extend(std::iter::repeat(distance_offset).take(part.len()))
                    }
                    None => values.extend(std::iter::repeat(0.0).take(part.len())),
                }
            }

            if let Some(distance) = fields
                .iter()
                .find(|(field, _)| *field == SerieField::Distance)
                .map(|(_, values)| values)
            {
                if let Some(last) = distance.last() {
                    if !is_missing(*last) {
                        distance_offset = *last;
                    }
                }
            }
        }

        validate_time(&merged.time)?;

        // every part is already gap free, values are never carried across parts
        for (field, values) in fields {
            merged.set_field(field, Some(values))?;
        }

        Ok((merged, start_indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: i64, distance: Option<f64>, altitude: Option<f64>) -> Sample {
        Sample {
            time,
            distance,
            altitude,
            ..Sample::at(time)
        }
    }

    #[test]
    fn test_decreasing_time_is_rejected() {
        let err = TourSeries::new(vec![0, 5, 3]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::TimeNotMonotonic {
                index: 2,
                previous: 5,
                current: 3
            }
        );
        assert!(TourSeries::new(vec![0, 0, 1]).is_ok());
    }

    #[test]
    fn test_mismatched_field_is_dropped() {
        let series = TourSeries::new(vec![0, 1, 2])
            .unwrap()
            .with_field(SerieField::Altitude, vec![1.0, 2.0])
            .with_field(SerieField::Pulse, vec![100.0, 101.0, 102.0]);

        assert!(series.altitude.is_none());
        assert_eq!(series.pulse.as_deref(), Some(&[100.0, 101.0, 102.0][..]));
    }

    #[test]
    fn test_from_samples_completes_gaps() {
        let samples = vec![
            sample(0, Some(0.0), None),
            sample(10, None, Some(5.0)),
            Sample {
                cadence: Some(80.0),
                ..sample(20, Some(100.0), None)
            },
        ];
        let series = TourSeries::from_samples(&samples, &TourMeta::default()).unwrap();

        assert_eq!(series.distance, Some(vec![0.0, 50.0, 100.0]));
        assert_eq!(series.altitude, Some(vec![5.0, 5.0, 5.0]));
        assert_eq!(series.cadence, Some(vec![0.0, 0.0, 80.0]));
        assert!(series.pulse.is_none());
        assert!(series.latitude.is_none());
    }

    #[test]
    fn test_from_samples_removes_distance_without_position() {
        let samples = vec![
            Sample {
                latitude: Some(47.0),
                longitude: Some(8.0),
                ..sample(0, Some(0.0), None)
            },
            sample(10, Some(500.0), None),
            Sample {
                latitude: Some(47.001),
                longitude: Some(8.0),
                ..sample(20, Some(100.0), None)
            },
        ];
        let series = TourSeries::from_samples(&samples, &TourMeta::default()).unwrap();
        assert_eq!(series.distance, Some(vec![0.0, 50.0, 100.0]));

        // sensor distance is kept
        let meta = TourMeta {
            is_distance_from_sensor: true,
            ..Default::default()
        };
        let series = TourSeries::from_samples(&samples, &meta).unwrap();
        assert_eq!(series.distance, Some(vec![0.0, 500.0, 100.0]));
    }

    #[test]
    fn test_concatenate_offsets_time_and_distance() {
        let first = TourSeries::new(vec![0, 10])
            .unwrap()
            .with_field(SerieField::Distance, vec![0.0, 100.0]);
        let second = TourSeries::new(vec![0, 10])
            .unwrap()
            .with_field(SerieField::Distance, vec![1000.0, 1050.0])
            .with_field(SerieField::Pulse, vec![120.0, 130.0]);

        let (merged, starts) = TourSeries::concatenate(&[&first, &second], &[0, 60]).unwrap();

        assert_eq!(starts, vec![0, 2]);
        assert_eq!(merged.time, vec![0, 10, 60, 70]);
        assert_eq!(merged.distance, Some(vec![0.0, 100.0, 100.0, 150.0]));
        assert_eq!(merged.pulse, Some(vec![0.0, 0.0, 120.0, 130.0]));
        assert_eq!(merged.altitude, None);
    }

    #[test]
    fn test_concatenate_does_not_invent_values_for_missing_fields() {
        let without_pulse = TourSeries::new(vec![0, 1, 2])
            .unwrap()
            .with_field(SerieField::Altitude, vec![400.0, 401.0, 402.0]);
        let with_pulse = TourSeries::new(vec![0, 1])
            .unwrap()
            .with_field(SerieField::Pulse, vec![150.0, 150.0]);

        let (merged, starts) = TourSeries::concatenate(&[&without_pulse, &with_pulse], &[0, 10]).unwrap();

        assert_eq!(starts, vec![0, 3]);
        assert_eq!(merged.pulse, Some(vec![0.0, 0.0, 0.0, 150.0, 150.0]));
        assert_eq!(merged.altitude, Some(vec![400.0, 401.0, 402.0, 0.0, 0.0]));
        assert_eq!(merged.distance, None);
    }

    #[test]
    fn test_concatenate_part_without_distance_stands_still() {
        let first = TourSeries::new(vec![0, 10])
            .unwrap()
            .with_field(SerieField::Distance, vec![0.0, 100.0]);
        let second = TourSeries::new(vec![0, 10]).unwrap();

        let (merged, _) = TourSeries::concatenate(&[&first, &second], &[0, 60]).unwrap();
        assert_eq!(merged.distance, Some(vec![0.0, 100.0, 100.0, 100.0]));
    }

    #[test]
    fn test_concatenate_never_goes_back_in_time() {
        let first = TourSeries::new(vec![0, 100]).unwrap();
        let second = TourSeries::new(vec![0, 10]).unwrap();
        let (merged, _) = TourSeries::concatenate(&[&first, &second], &[0, 0]).unwrap();
        assert_eq!(merged.time, vec![0, 100, 100, 110]);
    }
}
