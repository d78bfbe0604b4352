//! Time spent in each heart rate zone.
//!
//! A person defines zones as percentages of the max heart rate. The max heart
//! rate depends on the age at the tour date, so the bpm boundaries are
//! computed once per age and cached on the profile.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

pub const MAX_HR_ZONES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HrMaxFormula {
    /// 220 - age
    #[default]
    Fox220,
    /// 205.8 - 0.685 * age
    Tanaka205_8,
    /// 206.9 - 0.67 * age
    Gellish206_9,
    /// 191.5 - 0.007 * age²
    Gellish191_5,
    /// The max pulse is set by the person.
    Manual,
}

impl HrMaxFormula {
    pub fn max_hr(self, age: i32, manual_max_pulse: Option<f64>) -> Option<f64> {
        let age = age as f64;
        match self {
            HrMaxFormula::Fox220 => Some(220.0 - age),
            HrMaxFormula::Tanaka205_8 => Some(205.8 - 0.685 * age),
            HrMaxFormula::Gellish206_9 => Some(206.9 - 0.67 * age),
            HrMaxFormula::Gellish191_5 => Some(191.5 - 0.007 * age * age),
            HrMaxFormula::Manual => manual_max_pulse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrZone {
    pub name: String,
    /// % of the max heart rate
    pub min_percent: f64,
    /// `None` for an unbounded last zone.
    pub max_percent: Option<f64>,
}

impl HrZone {
    pub fn new(name: &str, min_percent: f64, max_percent: Option<f64>) -> Self {
        HrZone {
            name: name.to_string(),
            min_percent,
            max_percent,
        }
    }

    pub fn default_zones() -> Vec<HrZone> {
        vec![
            HrZone::new("Recovery", 50.0, Some(60.0)),
            HrZone::new("Endurance", 60.0, Some(70.0)),
            HrZone::new("Tempo", 70.0, Some(80.0)),
            HrZone::new("Threshold", 80.0, Some(90.0)),
            HrZone::new("Maximum", 90.0, None),
        ]
    }
}

/// Bpm boundaries of all zones for one max heart rate.
#[derive(Debug, Clone, PartialEq)]
pub struct HrZoneContext {
    pub max_hr: f64,
    pub zone_min_bpm: Vec<f64>,
    pub zone_max_bpm: Vec<f64>,
}

impl HrZoneContext {
    pub fn new(zones: &[HrZone], max_hr: f64) -> Self {
        let mut zone_min_bpm = Vec::with_capacity(zones.len());
        let mut zone_max_bpm = Vec::with_capacity(zones.len());

        for (index, zone) in zones.iter().enumerate() {
            let is_last = index + 1 == zones.len();

            let max_bpm = match zone.max_percent {
                Some(percent) if !is_last => (max_hr * percent / 100.0).round(),
                _ => f64::INFINITY,
            };

            let min_bpm = match zone_max_bpm.last() {
                Some(prev_max) => prev_max + 1.0,
                None => (max_hr * zone.min_percent / 100.0).round(),
            };

            zone_min_bpm.push(min_bpm);
            zone_max_bpm.push(max_bpm);
        }

        HrZoneContext {
            max_hr,
            zone_min_bpm,
            zone_max_bpm,
        }
    }

    pub fn len(&self) -> usize {
        self.zone_min_bpm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zone_min_bpm.is_empty()
    }

    /// Zone index of a pulse value, zones are matched with half a bpm
    /// tolerance so that consecutive zones have no gap.
    pub fn zone_of(&self, pulse: f64) -> Option<usize> {
        self.zone_min_bpm
            .iter()
            .zip(self.zone_max_bpm.iter())
            .position(|(min, max)| pulse >= min - 0.5 && pulse < max + 0.5)
    }
}

/// Heart rate settings of a person.
#[derive(Debug, Clone)]
pub struct HrZoneProfile {
    birth_date: Option<NaiveDate>,
    formula: HrMaxFormula,
    max_pulse: Option<f64>,
    zones: Vec<HrZone>,
    contexts: HashMap<i32, HrZoneContext>,
}

/// Full years between `birth_date` and `date`.
pub fn age_at(birth_date: NaiveDate, date: NaiveDate) -> i32 {
    let mut age = date.year() - birth_date.year();
    if (date.month(), date.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

impl HrZoneProfile {
    pub fn new(
        birth_date: Option<NaiveDate>,
        formula: HrMaxFormula,
        max_pulse: Option<f64>,
        zones: Vec<HrZone>,
    ) -> Result<Self, SeriesError> {
        if zones.is_empty() {
            return Err(SeriesError::EmptyZoneTable);
        }
        if zones.len() > MAX_HR_ZONES {
            return Err(SeriesError::TooManyHrZones(zones.len()));
        }
        if let Some(index) = zones[..zones.len() - 1].iter().position(|zone| zone.max_percent.is_none()) {
            return Err(SeriesError::OpenHrZone(index));
        }

        Ok(HrZoneProfile {
            birth_date,
            formula,
            max_pulse,
            zones,
            contexts: HashMap::new(),
        })
    }

    pub fn zones(&self) -> &[HrZone] {
        &self.zones
    }

    pub fn formula(&self) -> HrMaxFormula {
        self.formula
    }

    /// Zone context at the tour date, `None` when the max heart rate cannot
    /// be computed.
    pub fn context_for(&mut self, tour_date: NaiveDate) -> Option<&HrZoneContext> {
        let age = match self.birth_date {
            Some(birth_date) => age_at(birth_date, tour_date),
            // the age is not needed for a manual max pulse
            None if self.formula == HrMaxFormula::Manual => 0,
            None => return None,
        };

        if !self.contexts.contains_key(&age) {
            let max_hr = self.formula.max_hr(age, self.max_pulse)?;
            tracing::debug!("hr zone context for age {}, max hr {:.0}", age, max_hr);
            self.contexts.insert(age, HrZoneContext::new(&self.zones, max_hr));
        }

        self.contexts.get(&age)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrZoneTimes {
    /// Seconds per zone.
    pub seconds: Vec<i64>,
    /// Seconds with a pulse which matched no zone.
    pub unmatched: i64,
}

impl HrZoneTimes {
    pub fn total(&self) -> i64 {
        self.seconds.iter().sum::<i64>() + self.unmatched
    }
}

/// Adds the duration of every non break time slice to the zone of its pulse.
pub fn accumulate(time: &[i64], pulse: &[f64], break_mask: Option<&[bool]>, context: &HrZoneContext) -> HrZoneTimes {
    let mut seconds = vec![0; context.len()];
    let mut unmatched = 0;
    let mut unmatched_samples = 0;

    let size = time.len().min(pulse.len());
    let mut prev_time = time.first().copied().unwrap_or(0);

    for index in 0..size {
        let time_diff = time[index] - prev_time;
        prev_time = time[index];

        if break_mask.and_then(|mask| mask.get(index).copied()).unwrap_or(false) {
            continue;
        }

        match context.zone_of(pulse[index]) {
            Some(zone) => seconds[zone] += time_diff,
            None => {
                unmatched += time_diff;
                unmatched_samples += 1;
            }
        }
    }

    if unmatched_samples > 0 {
        tracing::warn!(
            "{} pulse values ({} s) are outside of all hr zones",
            unmatched_samples,
            unmatched
        );
    }

    HrZoneTimes { seconds, unmatched }
}
