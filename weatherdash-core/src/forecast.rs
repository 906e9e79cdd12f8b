//! Collapses the provider's 3-hourly forecast feed into one entry per day.
//!
//! Days are keyed by their short weekday label in the location's own UTC
//! offset and come out in the order each label first appears in the feed,
//! capped at [`MAX_FORECAST_DAYS`].

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Timelike};
use indexmap::IndexMap;

use crate::model::{DailyForecastEntry, round_half_up};

/// Number of daily entries the dashboard shows.
pub const MAX_FORECAST_DAYS: usize = 5;

/// 5 days at one sample every 3 hours.
pub const FORECAST_SAMPLE_COUNT: u32 = 40;

/// Local hours (inclusive) treated as "around noon".
const NOON_HOURS: std::ops::RangeInclusive<u32> = 12..=14;

/// One timestamped point of the forecast feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Unix seconds.
    pub timestamp: i64,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: String,
}

/// Full pipeline: keep one near-noon sample per day, then aggregate.
pub fn normalize(samples: &[ForecastSample], offset: FixedOffset) -> Vec<DailyForecastEntry> {
    let representative = one_sample_per_day(samples, offset);
    aggregate_daily(&representative, offset)
}

/// Keep at most one sample per weekday label. A sample whose local hour is
/// within [12, 14] replaces whatever was kept for its day; otherwise the
/// first sample of the day is kept. Days keep their first-seen position.
pub fn one_sample_per_day(samples: &[ForecastSample], offset: FixedOffset) -> Vec<ForecastSample> {
    let mut by_day: IndexMap<String, &ForecastSample> = IndexMap::new();

    for sample in samples {
        let Some(local) = local_time(sample.timestamp, offset) else {
            tracing::debug!(
                timestamp = sample.timestamp,
                "skipping forecast sample with invalid timestamp"
            );
            continue;
        };
        let label = weekday_label(&local);
        let near_noon = NOON_HOURS.contains(&local.hour());

        if near_noon || !by_day.contains_key(&label) {
            by_day.insert(label, sample);
        }
    }

    by_day.into_values().cloned().collect()
}

#[derive(Debug)]
struct DayAccumulator {
    high: i32,
    low: i32,
    temp: i32,
    humidity: u8,
    wind_speed: f64,
    condition_counts: HashMap<String, u32>,
    dominant: Option<(String, u32)>,
}

impl DayAccumulator {
    fn new() -> Self {
        Self {
            high: i32::MIN,
            low: i32::MAX,
            temp: 0,
            humidity: 0,
            wind_speed: 0.0,
            condition_counts: HashMap::new(),
            dominant: None,
        }
    }

    fn add(&mut self, sample: &ForecastSample) {
        self.high = self.high.max(round_half_up(sample.temp_max));
        self.low = self.low.min(round_half_up(sample.temp_min));
        self.temp = round_half_up(sample.temp);
        self.humidity = sample.humidity;
        self.wind_speed = sample.wind_speed;

        let count = self.condition_counts.entry(sample.condition.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        // Strictly greater: on a tie the condition that got there first stays.
        let leading = self.dominant.as_ref().map_or(0, |(_, best)| *best);
        if count > leading {
            self.dominant = Some((sample.condition.clone(), count));
        }
    }

    fn finish(self, day: String) -> DailyForecastEntry {
        DailyForecastEntry {
            day,
            high: self.high,
            low: self.low,
            temp: self.temp,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            condition: self.dominant.map(|(condition, _)| condition).unwrap_or_default(),
        }
    }
}

/// Group samples by weekday label and summarise each group.
pub fn aggregate_daily(samples: &[ForecastSample], offset: FixedOffset) -> Vec<DailyForecastEntry> {
    let mut days: IndexMap<String, DayAccumulator> = IndexMap::new();

    for sample in samples {
        let Some(local) = local_time(sample.timestamp, offset) else {
            continue;
        };
        days.entry(weekday_label(&local))
            .or_insert_with(DayAccumulator::new)
            .add(sample);
    }

    days.into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(day, acc)| acc.finish(day))
        .collect()
}

fn local_time(timestamp: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&offset))
}

fn weekday_label(local: &DateTime<FixedOffset>) -> String {
    local.format("%a").to_string()
}
