/// Gap filling for field arrays which contain `MISSING` values.
///
/// Importers can deliver time slices where a device did not record a value
/// (tunnel, sensor dropout). Those gaps are completed against the time axis
/// so that every later derivation can assume a fully defined array.
use crate::sample::is_missing;

/// Linear interpolation of the value at `time` between two anchors.
///
/// When both anchors share the same time the midpoint of the anchor values is
/// returned instead of dividing by zero.
pub fn linear_interpolation(time1: f64, time2: f64, value1: f64, value2: f64, time: f64) -> f64 {
    if time2 == time1 {
        (value1 + value2) / 2.0
    } else {
        value1 + (value2 - value1) / (time2 - time1) * (time - time1)
    }
}

/// Replaces every missing value in `field` by a linear interpolation between
/// the nearest valid neighbours.
///
/// * leading gaps are back-filled with the first valid value
/// * trailing gaps are filled with the last valid value
/// * a field without any valid value is set to `0`
pub fn fill_gaps(field: &mut [f64], time: &[i64]) {
    let size = field.len().min(time.len());
    if size == 0 {
        return;
    }

    let first_valid = match field[..size].iter().position(|v| !is_missing(*v)) {
        Some(index) => index,
        None => {
            tracing::debug!("field has no valid value, setting {} values to 0", size);
            field[..size].iter_mut().for_each(|v| *v = 0.0);
            return;
        }
    };

    // back-fill the start with a flat constant
    let first_value = field[first_valid];
    field[..first_valid].iter_mut().for_each(|v| *v = first_value);

    let mut serie_index = first_valid + 1;
    while serie_index < size {
        if !is_missing(field[serie_index]) {
            serie_index += 1;
            continue;
        }

        let prev_index = serie_index - 1;

        // search forward to the next valid value
        let next_valid = (serie_index..size).find(|&i| !is_missing(field[i]));

        match next_valid {
            Some(next_index) => {
                let time1 = time[prev_index] as f64;
                let time2 = time[next_index] as f64;
                let value1 = field[prev_index];
                let value2 = field[next_index];

                for index in serie_index..next_index {
                    field[index] = linear_interpolation(time1, time2, value1, value2, time[index] as f64);
                }
                serie_index = next_index + 1;
            }
            None => {
                // no later anchor, keep the last valid value
                let last_value = field[prev_index];
                field[serie_index..size].iter_mut().for_each(|v| *v = last_value);
                break;
            }
        }
    }
}

/// Sets missing values to `0`. Used for fields which must not be interpolated
/// (cadence, power, device speed).
pub fn zero_gaps(field: &mut [f64]) {
    for value in field.iter_mut() {
        if is_missing(*value) {
            *value = 0.0;
        }
    }
}

/// Distance which is computed by a gps device is invalid where no position was
/// recorded, e.g. in a tunnel. These values are removed so that they are
/// interpolated later.
pub fn remove_distance_without_position(distance: &mut [f64], latitude: &[f64]) {
    for (dist, lat) in distance.iter_mut().zip(latitude.iter()) {
        if is_missing(*lat) {
            *dist = f64::NAN;
        }
    }
}

/// Marks negative distances as missing.
///
/// Returns `false` when no valid distance remains after the first slice and the
/// first slice is `0`, in this case the field carries no information and must be
/// treated as absent.
pub fn remove_invalid_distance_values(distance: &mut [f64]) -> bool {
    if distance.len() < 2 {
        return true;
    }

    let mut is_data_valid = false;

    for value in distance.iter_mut().skip(1) {
        if *value < 0.0 {
            *value = f64::NAN;
        } else if !is_missing(*value) {
            is_data_valid = true;
        }
    }

    if is_data_valid {
        return true;
    }

    !(distance[0] == 0.0 || is_missing(distance[0]))
}
