use crate::model::MetricKind;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Upstream date key format (`1/22/20`)
pub const DATE_FORMAT: &str = "%m/%d/%y";

/// Cumulative worldwide counts per day, one series per metric
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    pub cases: BTreeMap<NaiveDate, u64>,
    pub recovered: BTreeMap<NaiveDate, u64>,
    pub deaths: BTreeMap<NaiveDate, u64>,
}

impl Timeline {
    pub fn series(&self, metric: MetricKind) -> &BTreeMap<NaiveDate, u64> {
        match metric {
            MetricKind::Cases => &self.cases,
            MetricKind::Recovered => &self.recovered,
            MetricKind::Deaths => &self.deaths,
        }
    }

    pub fn series_mut(&mut self, metric: MetricKind) -> &mut BTreeMap<NaiveDate, u64> {
        match metric {
            MetricKind::Cases => &mut self.cases,
            MetricKind::Recovered => &mut self.recovered,
            MetricKind::Deaths => &mut self.deaths,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty() && self.recovered.is_empty() && self.deaths.is_empty()
    }

    /// New counts per day: difference to the previous day, first day skipped.
    /// Negative values are upstream corrections and are kept.
    pub fn daily_new(&self, metric: MetricKind) -> Vec<(NaiveDate, i64)> {
        let series = self.series(metric);
        series
            .iter()
            .zip(series.iter().skip(1))
            .map(|((_, &prev), (&date, &cur))| (date, cur as i64 - prev as i64))
            .collect()
    }

    /// Chart points with the day index as x
    pub fn chart_points(&self, metric: MetricKind) -> Vec<(f64, f64)> {
        self.daily_new(metric)
            .into_iter()
            .enumerate()
            .map(|(idx, (_, value))| (idx as f64, value as f64))
            .collect()
    }

    /// First and last date with a daily value
    pub fn date_range(&self, metric: MetricKind) -> Option<(NaiveDate, NaiveDate)> {
        let series = self.series(metric);
        let first = series.keys().nth(1)?;
        let last = series.keys().next_back()?;
        Some((*first, *last))
    }
}

pub fn parse_date(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(points: &[(&str, u64)]) -> Timeline {
        let mut timeline = Timeline::default();
        for (key, value) in points {
            timeline.cases.insert(parse_date(key).unwrap(), *value);
        }
        timeline
    }

    #[test]
    fn parses_upstream_keys() {
        assert_eq!(parse_date("1/22/20"), NaiveDate::from_ymd_opt(2020, 1, 22));
        assert_eq!(parse_date("12/3/21"), NaiveDate::from_ymd_opt(2021, 12, 3));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn daily_new_orders_by_date_not_key_text() {
        // "10/1/20" sorts before "9/30/20" as text
        let t = timeline(&[("10/1/20", 130), ("9/30/20", 100), ("10/2/20", 125)]);
        let daily = t.daily_new(MetricKind::Cases);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0], (parse_date("10/1/20").unwrap(), 30));
        assert_eq!(daily[1], (parse_date("10/2/20").unwrap(), -5));
    }

    #[test]
    fn single_day_has_no_deltas() {
        let t = timeline(&[("1/1/21", 5)]);
        assert!(t.daily_new(MetricKind::Cases).is_empty());
        assert!(t.date_range(MetricKind::Cases).is_none());
        assert!(t.daily_new(MetricKind::Deaths).is_empty());
    }

    #[test]
    fn chart_points_index_days() {
        let t = timeline(&[("1/1/21", 1), ("1/2/21", 4), ("1/3/21", 10)]);
        assert_eq!(t.chart_points(MetricKind::Cases), vec![(0.0, 3.0), (1.0, 6.0)]);
        assert_eq!(
            t.date_range(MetricKind::Cases),
            Some((parse_date("1/2/21").unwrap(), parse_date("1/3/21").unwrap()))
        );
    }
}
