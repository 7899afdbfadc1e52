use crate::history::{Dimension, HistoryPoint};
use crate::stats::upper_median;
use chrono::{DateTime, Datelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// The trading day starts nine hours before UTC midnight. DST is ignored.
pub const TRADING_DAY_OFFSET_SECS: i64 = 32_400;

pub const WEEKDAY_NAMES: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

/// Weekday of a unix time under the trading-day convention, 0 = Sunday.
pub fn trading_weekday(unix_time: i64) -> Option<u32> {
    DateTime::from_timestamp(unix_time - TRADING_DAY_OFFSET_SECS, 0).map(|t| t.weekday().num_days_from_sunday())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayBucket {
    pub weekday: u32,
    values: BTreeMap<Dimension, Vec<f64>>,
    medians: BTreeMap<Dimension, f64>,
}

impl WeekdayBucket {
    fn new(weekday: u32) -> Self {
        WeekdayBucket {
            weekday,
            values: BTreeMap::new(),
            medians: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        WEEKDAY_NAMES[self.weekday as usize]
    }

    pub fn sample_count(&self, dimension: Dimension) -> usize {
        self.values.get(&dimension).map_or(0, Vec::len)
    }

    /// `None` when no sample of this weekday carried the dimension.
    pub fn median(&self, dimension: Dimension) -> Option<f64> {
        self.medians.get(&dimension).copied()
    }

    fn calculate_medians(&mut self) {
        self.medians = self
            .values
            .iter()
            .filter_map(|(dim, values)| upper_median(values).map(|m| (*dim, m)))
            .collect();
    }
}

/// Buckets history points into the seven trading weekdays.
pub fn aggregate_weekdays(points: &[HistoryPoint], dimensions: &[Dimension]) -> [WeekdayBucket; 7] {
    let mut buckets: [WeekdayBucket; 7] = std::array::from_fn(|i| WeekdayBucket::new(i as u32));

    for point in points {
        let Some(weekday) = trading_weekday(point.time) else {
            tracing::warn!(time = point.time, "history point outside the representable time range");
            continue;
        };
        let bucket = &mut buckets[weekday as usize];
        for &dim in dimensions {
            if let Some(value) = point.value(dim) {
                bucket.values.entry(dim).or_default().push(value);
            }
        }
    }

    for bucket in buckets.iter_mut() {
        bucket.calculate_medians();
    }
    buckets
}
