use crate::model::{EventCalendar, MarketRecord};
use crate::stats::{linear_regression_least_squares, SeriesSummary};
use crate::weekday::aggregate_weekdays;
use serde::Serialize;
use std::collections::BTreeMap;

/// Minimum number of usable points before a trend line is drawn.
pub const MIN_TREND_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dimension {
    SellOffer,
    BuyOffer,
    DaySold,
    DayBought,
    ActiveTraders,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::SellOffer,
        Dimension::BuyOffer,
        Dimension::DaySold,
        Dimension::DayBought,
        Dimension::ActiveTraders,
    ];

    /// Counts can genuinely be zero; prices cannot.
    pub fn allows_zero(self) -> bool {
        !matches!(self, Dimension::SellOffer | Dimension::BuyOffer)
    }

    pub fn is_present(self, value: f64) -> bool {
        value.is_finite() && if self.allows_zero() { value >= 0.0 } else { value > 0.0 }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::SellOffer => "Sell Offer",
            Dimension::BuyOffer => "Buy Offer",
            Dimension::DaySold => "Sold",
            Dimension::DayBought => "Bought",
            Dimension::ActiveTraders => "Traders",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Dimension::SellOffer => "#82ca9d",
            Dimension::BuyOffer => "#8884d8",
            Dimension::DaySold => "#ffc658",
            Dimension::DayBought => "#ff7f50",
            Dimension::ActiveTraders => "#a4de6c",
        }
    }

    fn from_record(self, record: &MarketRecord) -> f64 {
        match self {
            Dimension::SellOffer => record.sell_offer,
            Dimension::BuyOffer => record.buy_offer,
            Dimension::DaySold => record.day_sold,
            Dimension::DayBought => record.day_bought,
            Dimension::ActiveTraders => record.active_traders,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Series {
    Raw(Dimension),
    Trend(Dimension),
}

impl Series {
    pub fn dimension(self) -> Dimension {
        match self {
            Series::Raw(dim) | Series::Trend(dim) => dim,
        }
    }

    /// Trend lines are plotted but kept out of tooltips and legends.
    pub fn excluded_from_tooltip(self) -> bool {
        matches!(self, Series::Trend(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesInfo {
    pub series: Series,
    pub label: String,
    pub color: &'static str,
}

impl SeriesInfo {
    fn raw(dim: Dimension) -> Self {
        SeriesInfo {
            series: Series::Raw(dim),
            label: dim.label().to_string(),
            color: dim.color(),
        }
    }

    fn trend(dim: Dimension) -> Self {
        SeriesInfo {
            series: Series::Trend(dim),
            label: format!("{} Trend", dim.label()),
            color: dim.color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub time: i64,
    raw: BTreeMap<Dimension, f64>,
    trends: BTreeMap<Dimension, f64>,
    pub events: Vec<String>,
}

impl HistoryPoint {
    pub fn new(time: i64) -> Self {
        HistoryPoint {
            time,
            raw: BTreeMap::new(),
            trends: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn from_record(record: &MarketRecord, calendar: &EventCalendar) -> Self {
        let mut point = HistoryPoint::new(record.time);
        for dim in Dimension::ALL {
            point.set(dim, dim.from_record(record));
        }
        point.events = calendar.events_on(record.time);
        point
    }

    /// Stores a raw value; sentinels and non-positive prices are dropped.
    pub fn set(&mut self, dim: Dimension, value: f64) {
        if dim.is_present(value) {
            self.raw.insert(dim, value);
        } else {
            self.raw.remove(&dim);
        }
    }

    pub fn value(&self, dim: Dimension) -> Option<f64> {
        self.raw.get(&dim).copied()
    }

    pub fn trend(&self, dim: Dimension) -> Option<f64> {
        self.trends.get(&dim).copied()
    }

    pub fn get(&self, series: Series) -> Option<f64> {
        match series {
            Series::Raw(dim) => self.value(dim),
            Series::Trend(dim) => self.trend(dim),
        }
    }
}

/// Chart data for one item on one world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub points: Vec<HistoryPoint>,
    pub series: Vec<SeriesInfo>,
    /// Points are weekday buckets (time = 0..6), not a chronology.
    pub is_weekday_aggregate: bool,
}

impl TimeSeries {
    pub fn from_history(records: &[MarketRecord], calendar: &EventCalendar) -> Self {
        let mut points: Vec<HistoryPoint> = records.iter().map(|r| HistoryPoint::from_record(r, calendar)).collect();
        points.sort_by_key(|p| p.time);

        TimeSeries {
            points,
            series: Dimension::ALL.into_iter().map(SeriesInfo::raw).collect(),
            is_weekday_aggregate: false,
        }
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        self.series
            .iter()
            .filter_map(|info| match info.series {
                Series::Raw(dim) => Some(dim),
                Series::Trend(_) => None,
            })
            .collect()
    }

    pub fn values(&self, dim: Dimension) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value(dim)).collect()
    }

    pub fn summary(&self, dim: Dimension) -> Option<SeriesSummary> {
        SeriesSummary::from_values(&self.values(dim))
    }

    /// Adds a least-squares trend series for every raw dimension with enough data.
    ///
    /// The fit only uses present values, but a trend value is written for every
    /// point and clamped at zero.
    pub fn add_trends(&mut self) {
        for dim in self.dimensions() {
            if self.series.iter().any(|info| info.series == Series::Trend(dim)) {
                continue;
            }

            let (xs, ys): (Vec<f64>, Vec<f64>) = self
                .points
                .iter()
                .filter_map(|p| p.value(dim).filter(|&v| dim.is_present(v)).map(|v| (p.time as f64, v)))
                .unzip();

            if xs.len() < MIN_TREND_POINTS {
                tracing::debug!(dimension = ?dim, points = xs.len(), "not enough points for a trend");
                continue;
            }

            let fit = linear_regression_least_squares(&xs, &ys);
            if !fit.is_finite() {
                tracing::debug!(dimension = ?dim, "discarding degenerate trend fit");
                continue;
            }

            for point in self.points.iter_mut() {
                let trend = fit.at(point.time as f64).max(0.0);
                point.trends.insert(dim, trend);
            }
            self.series.push(SeriesInfo::trend(dim));
        }
    }

    pub fn with_trends(mut self) -> Self {
        self.add_trends();
        self
    }

    /// Median per trading weekday, as a seven point series.
    pub fn weekday_series(&self) -> TimeSeries {
        let dimensions = self.dimensions();
        let buckets = aggregate_weekdays(&self.points, &dimensions);

        let points = buckets
            .iter()
            .map(|bucket| {
                let mut point = HistoryPoint::new(bucket.weekday as i64);
                for &dim in &dimensions {
                    if let Some(median) = bucket.median(dim) {
                        point.raw.insert(dim, median);
                    }
                }
                point
            })
            .collect();

        TimeSeries {
            points,
            series: dimensions.into_iter().map(SeriesInfo::raw).collect(),
            is_weekday_aggregate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;
    const START: i64 = 1_704_067_200;

    fn record(day: i64, sell: f64, buy: f64, sold: f64) -> MarketRecord {
        MarketRecord {
            id: 1,
            time: START + day * DAY,
            sell_offer: sell,
            buy_offer: buy,
            day_sold: sold,
            ..Default::default()
        }
    }

    #[test]
    fn history_points_drop_sentinels() {
        let series = TimeSeries::from_history(&[record(0, -1.0, 0.0, 0.0)], &EventCalendar::default());
        let point = &series.points[0];
        assert_eq!(point.value(Dimension::SellOffer), None);
        assert_eq!(point.value(Dimension::BuyOffer), None);
        assert_eq!(point.value(Dimension::DaySold), Some(0.0));
        assert_eq!(point.value(Dimension::ActiveTraders), None);
    }

    #[test]
    fn points_are_ordered_by_time() {
        let records = [record(2, 30.0, 1.0, 1.0), record(0, 10.0, 1.0, 1.0), record(1, 20.0, 1.0, 1.0)];
        let series = TimeSeries::from_history(&records, &EventCalendar::default());
        assert_eq!(series.values(Dimension::SellOffer), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn trend_follows_a_linear_price() {
        let records: Vec<MarketRecord> = (0..5).map(|d| record(d, 100.0 + 10.0 * d as f64, -1.0, -1.0)).collect();
        let series = TimeSeries::from_history(&records, &EventCalendar::default()).with_trends();

        for (i, point) in series.points.iter().enumerate() {
            let trend = point.trend(Dimension::SellOffer).unwrap();
            assert!((trend - (100.0 + 10.0 * i as f64)).abs() < 1e-3, "trend {} at {}", trend, i);
        }
        assert!(series.series.iter().any(|s| s.series == Series::Trend(Dimension::SellOffer)));
        assert!(Series::Trend(Dimension::SellOffer).excluded_from_tooltip());
    }

    #[test]
    fn series_with_trends_serialises_to_json() {
        let records: Vec<MarketRecord> = (0..4).map(|d| record(d, 100.0 + d as f64, 90.0, 5.0)).collect();
        let series = TimeSeries::from_history(&records, &EventCalendar::default()).with_trends();

        let json: serde_json::Value = serde_json::to_value(&series).unwrap();
        let point = &json["points"][0];
        assert_eq!(point["raw"]["SellOffer"], 100.0);
        assert!(point["trends"]["SellOffer"].as_f64().unwrap() > 0.0);
        assert!(point["raw"].get("ActiveTraders").is_none());
        assert_eq!(json["is_weekday_aggregate"], false);
    }

    #[test]
    fn trend_is_written_for_points_without_a_value_and_clamped() {
        let records = vec![
            record(0, 300.0, -1.0, -1.0),
            record(1, 200.0, -1.0, -1.0),
            record(2, 100.0, -1.0, -1.0),
            record(3, -1.0, -1.0, -1.0),
            record(4, -1.0, -1.0, -1.0),
        ];
        let series = TimeSeries::from_history(&records, &EventCalendar::default()).with_trends();
        assert!((series.points[3].trend(Dimension::SellOffer).unwrap() - 0.0).abs() < 1e-3);
        assert_eq!(series.points[4].trend(Dimension::SellOffer), Some(0.0));
    }

    #[test]
    fn no_trend_with_fewer_than_three_points() {
        let records = vec![record(0, 10.0, -1.0, -1.0), record(1, 20.0, -1.0, -1.0), record(2, -1.0, -1.0, -1.0)];
        let series = TimeSeries::from_history(&records, &EventCalendar::default()).with_trends();
        assert!(series.points.iter().all(|p| p.trend(Dimension::SellOffer).is_none()));
        assert!(!series.series.iter().any(|s| s.series == Series::Trend(Dimension::SellOffer)));
    }

    #[test]
    fn zero_counts_take_part_in_count_trends() {
        let records: Vec<MarketRecord> = (0..3).map(|d| record(d, -1.0, -1.0, 0.0)).collect();
        let series = TimeSeries::from_history(&records, &EventCalendar::default()).with_trends();
        assert_eq!(series.points[0].trend(Dimension::DaySold), Some(0.0));
    }

    #[test]
    fn weekday_series_has_seven_buckets() {
        let records: Vec<MarketRecord> = (0..14).map(|d| record(d, 50.0 + d as f64, -1.0, -1.0)).collect();
        let weekdays = TimeSeries::from_history(&records, &EventCalendar::default()).weekday_series();
        assert!(weekdays.is_weekday_aggregate);
        assert_eq!(weekdays.points.len(), 7);
        assert_eq!(weekdays.points[3].time, 3);
        assert!(weekdays.points.iter().all(|p| p.value(Dimension::SellOffer).is_some()));
        assert!(weekdays.points.iter().all(|p| p.value(Dimension::BuyOffer).is_none()));
    }
}
