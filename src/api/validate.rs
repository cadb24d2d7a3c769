//! Schema validation at the fetch boundary.
//!
//! Bodies are decoded with simd-json into lenient wire structs (every field
//! optional), then checked and converted into domain records. Anything that
//! would otherwise blow up later (missing coordinates, missing totals) is
//! reported here as a `MalformedResponse`.

use crate::error::{FetchError, FetchResult};
use crate::history::{parse_date, Timeline};
use crate::model::{CountryInfo, CountryRecord, MetricKind};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    country: Option<String>,
    country_info: Option<WireInfo>,
    cases: Option<f64>,
    today_cases: Option<f64>,
    recovered: Option<f64>,
    today_recovered: Option<f64>,
    deaths: Option<f64>,
    today_deaths: Option<f64>,
    active: Option<f64>,
    critical: Option<f64>,
    population: Option<f64>,
    updated: Option<f64>,
}

#[derive(Deserialize, Default, Debug)]
struct WireInfo {
    iso2: Option<String>,
    iso3: Option<String>,
    lat: Option<f64>,
    long: Option<f64>,
}

#[derive(Deserialize, Default, Debug)]
struct WireHistory {
    cases: Option<HashMap<String, Option<f64>>>,
    recovered: Option<HashMap<String, Option<f64>>>,
    deaths: Option<HashMap<String, Option<f64>>>,
}

/// Worldwide totals: only `cases` is required
pub fn parse_totals(body: &mut [u8]) -> FetchResult<CountryRecord> {
    let wire: WireRecord = simd_json::serde::from_slice(body)?;
    totals_record(wire)
}

/// A single country: name and coordinates are required as well
pub fn parse_country(body: &mut [u8]) -> FetchResult<CountryRecord> {
    let wire: WireRecord = simd_json::serde::from_slice(body)?;
    country_record(wire)
}

/// The country list. Entries failing validation are skipped with a warning;
/// a body that is not a list of objects fails as a whole.
pub fn parse_countries(body: &mut [u8]) -> FetchResult<Vec<CountryRecord>> {
    let wires: Vec<WireRecord> = simd_json::serde::from_slice(body)?;
    let total = wires.len();

    let records: Vec<CountryRecord> = wires
        .into_iter()
        .enumerate()
        .filter_map(|(idx, wire)| {
            let name = wire.country.clone();
            match country_record(wire) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index = idx, country = ?name, error = %e, "skipping country entry");
                    None
                }
            }
        })
        .collect();

    if total > 0 && records.is_empty() {
        return Err(FetchError::malformed("no valid entries in country list"));
    }
    Ok(records)
}

/// Historical cumulative counts keyed by `m/d/yy`
pub fn parse_history(body: &mut [u8]) -> FetchResult<Timeline> {
    let wire: WireHistory = simd_json::serde::from_slice(body)?;
    if wire.cases.is_none() {
        return Err(FetchError::malformed("history is missing the `cases` series"));
    }

    let mut timeline = Timeline::default();
    for (metric, series) in [
        (MetricKind::Cases, wire.cases),
        (MetricKind::Recovered, wire.recovered),
        (MetricKind::Deaths, wire.deaths),
    ] {
        let Some(series) = series else { continue };
        let target = timeline.series_mut(metric);
        for (key, value) in series {
            let date = parse_date(&key)
                .ok_or_else(|| FetchError::malformed(format!("bad date key `{key}` in {metric} history")))?;
            if let Some(value) = count(value) {
                target.insert(date, value);
            }
        }
    }
    Ok(timeline)
}

fn totals_record(wire: WireRecord) -> FetchResult<CountryRecord> {
    let cases = count(wire.cases).ok_or_else(|| FetchError::malformed("missing or invalid `cases`"))?;

    let info = match wire.country_info {
        Some(info) => coordinates(info).ok(),
        None => None,
    };

    Ok(CountryRecord {
        country: wire.country.filter(|name| !name.trim().is_empty()),
        info,
        cases,
        today_cases: count(wire.today_cases),
        recovered: count(wire.recovered),
        today_recovered: count(wire.today_recovered),
        deaths: count(wire.deaths),
        today_deaths: count(wire.today_deaths),
        active: count(wire.active),
        critical: count(wire.critical),
        population: count(wire.population),
        updated: wire.updated.filter(|v| v.is_finite()).map(|v| v as i64),
    })
}

fn country_record(mut wire: WireRecord) -> FetchResult<CountryRecord> {
    let name = wire
        .country
        .clone()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| FetchError::malformed("missing `country`"))?;

    let info = wire
        .country_info
        .take()
        .ok_or_else(|| FetchError::malformed(format!("{name}: missing `countryInfo`")))?;
    let info = coordinates(info).map_err(|e| FetchError::malformed(format!("{name}: {e}")))?;

    let mut record = totals_record(wire).map_err(|e| FetchError::malformed(format!("{name}: {e}")))?;
    record.info = Some(info);
    Ok(record)
}

fn coordinates(info: WireInfo) -> Result<CountryInfo, String> {
    let lat = info
        .lat
        .filter(|lat| lat.is_finite() && (-90.0..=90.0).contains(lat))
        .ok_or("missing or out-of-range `countryInfo.lat`")?;
    let long = info
        .long
        .filter(|long| long.is_finite() && (-180.0..=180.0).contains(long))
        .ok_or("missing or out-of-range `countryInfo.long`")?;

    Ok(CountryInfo {
        iso2: info.iso2.filter(|code| !code.is_empty()),
        iso3: info.iso3.filter(|code| !code.is_empty()),
        lat,
        long,
    })
}

/// Null, negative and non-finite counts become absent
#[inline(always)]
fn count(value: Option<f64>) -> Option<u64> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
}
