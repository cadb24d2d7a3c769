use crate::model::{CountryOption, CountryRecord, Marker, MetricKind, TableRow};
use std::borrow::Borrow;
use std::sync::Arc;

/// Map country records to selector options, one-to-one and in input order.
/// Records without an ISO2 code fall back to their name, which the upstream
/// single-country endpoint also accepts.
pub fn country_options<T: Borrow<CountryRecord>>(records: &[T]) -> Vec<CountryOption> {
    records
        .iter()
        .map(|record| {
            let record = record.borrow();
            let name = record.display_name().to_string();
            let value = record.iso2().map(str::to_string).unwrap_or_else(|| name.clone());
            CountryOption { name, value }
        })
        .collect()
}

/// Copy of `records` ordered by total cases, descending.
/// The sort is stable so equal counts keep their original relative order.
pub fn sort_data<T: Borrow<CountryRecord> + Clone>(records: &[T]) -> Vec<T> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.borrow().cases.cmp(&a.borrow().cases));
    sorted
}

/// Ranked table rows; always ordered by cases regardless of the active metric
pub fn table_rows(records: &[Arc<CountryRecord>]) -> Vec<TableRow> {
    sort_data(records)
        .into_iter()
        .enumerate()
        .map(|(idx, record)| TableRow { rank: idx + 1, record })
        .collect()
}

/// Map bubbles for the active metric. Records without coordinates are skipped.
pub fn map_markers<T: Borrow<CountryRecord>>(records: &[T], metric: MetricKind) -> Vec<Marker> {
    records
        .iter()
        .filter_map(|record| {
            let record = record.borrow();
            let info = record.info.as_ref()?;
            Some(Marker {
                name: record.display_name().to_string(),
                code: info.iso2.clone(),
                lat: info.lat,
                lon: info.long,
                value: record.total(metric).unwrap_or(0),
            })
        })
        .collect()
}
