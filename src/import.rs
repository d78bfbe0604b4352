/// Small producers which turn GPX and CSV files into samples.
///
/// GPX files only carry time, position and elevation. CSV files can contain
/// every sample column, empty cells are missing values.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use gpx::read;

use crate::error::ImportError;
use crate::sample::{Sample, TourMeta};

struct TrackPoint {
    time: Option<DateTime<Utc>>,
    latitude: f64,
    longitude: f64,
    elevation: Option<f64>,
}

pub fn read_gpx<R: Read>(reader: R) -> Result<(Vec<Sample>, TourMeta), ImportError> {
    let gpx = read(BufReader::new(reader))?;

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for point in &segment.points {
                let time = point
                    .time
                    .as_ref()
                    .and_then(|time| time.format().ok())
                    .and_then(|time| DateTime::parse_from_rfc3339(&time).ok())
                    .map(|time| time.with_timezone(&Utc));

                points.push(TrackPoint {
                    time,
                    latitude: point.point().y(),
                    longitude: point.point().x(),
                    elevation: point.elevation,
                });
            }
        }
    }

    if points.is_empty() {
        return Err(ImportError::NoTrackPoints);
    }

    let start_time = points.iter().find_map(|point| point.time);

    let mut samples = Vec::with_capacity(points.len());
    let mut prev_time = 0;
    let mut backward_steps = 0;

    for (index, point) in points.iter().enumerate() {
        let time = match (start_time, point.time) {
            (Some(start), Some(time)) => (time - start).num_seconds(),
            // points without time are recorded with the previous time
            (Some(_), None) => prev_time,
            // without any time, each point is one second
            (None, _) => index as i64,
        };

        let time = if time < prev_time {
            backward_steps += 1;
            prev_time
        } else {
            time
        };
        prev_time = time;

        samples.push(Sample {
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            altitude: point.elevation,
            ..Sample::at(time)
        });
    }

    if backward_steps > 0 {
        tracing::warn!("{} track points go back in time, they keep the previous time", backward_steps);
    }

    let meta = TourMeta {
        start_time,
        ..Default::default()
    };

    Ok((samples, meta))
}

pub fn read_gpx_file(path: &Path) -> Result<(Vec<Sample>, TourMeta), ImportError> {
    read_gpx(File::open(path)?)
}

/// Reads samples from a CSV file with a header row, columns are named like
/// the [`Sample`] fields and only `time` is required.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Sample>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let samples = reader.deserialize().collect::<Result<Vec<Sample>, _>>()?;
    if samples.is_empty() {
        return Err(ImportError::NoTrackPoints);
    }

    Ok(samples)
}

pub fn read_csv_file(path: &Path) -> Result<Vec<Sample>, ImportError> {
    read_csv(File::open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="47.0" lon="8.0"><ele>400</ele><time>2021-06-01T08:00:00Z</time></trkpt>
      <trkpt lat="47.0001" lon="8.0"><ele>401</ele><time>2021-06-01T08:00:05Z</time></trkpt>
      <trkpt lat="47.0002" lon="8.0"><time>2021-06-01T08:00:12Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_read_gpx() {
        let (samples, meta) = read_gpx(GPX.as_bytes()).unwrap();

        assert_eq!(samples.iter().map(|s| s.time).collect::<Vec<_>>(), vec![0, 5, 12]);
        assert_eq!(samples[1].altitude, Some(401.0));
        assert_eq!(samples[2].altitude, None);
        assert_eq!(samples[2].latitude, Some(47.0002));
        assert!(samples[0].distance.is_none());
        assert_eq!(meta.start_time, Utc.with_ymd_and_hms(2021, 6, 1, 8, 0, 0).single());
    }

    #[test]
    fn test_read_gpx_without_points() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1"></gpx>"#;
        assert!(matches!(read_gpx(gpx.as_bytes()), Err(ImportError::NoTrackPoints)));
    }

    #[test]
    fn test_read_csv() {
        let csv = "time, distance, altitude, pulse\n0, 0, 400,\n5, 20.5, 401, 120\n";
        let samples = read_csv(csv.as_bytes()).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].pulse, None);
        assert_eq!(samples[1].pulse, Some(120.0));
        assert_eq!(samples[1].distance, Some(20.5));
        assert_eq!(samples[1].cadence, None);
    }
}
