use ratatui::style::Color;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Geographic metadata attached to a country record
#[derive(Clone, Debug, PartialEq)]
pub struct CountryInfo {
    pub iso2: Option<String>,
    pub iso3: Option<String>,
    pub lat: f64,
    pub long: f64,
}

/// One validated statistics snapshot, either worldwide totals or a single country
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CountryRecord {
    /// Display name (absent for worldwide totals)
    pub country: Option<String>,
    /// Coordinates and ISO codes (absent for worldwide totals)
    pub info: Option<CountryInfo>,
    pub cases: u64,
    pub today_cases: Option<u64>,
    pub recovered: Option<u64>,
    pub today_recovered: Option<u64>,
    pub deaths: Option<u64>,
    pub today_deaths: Option<u64>,
    pub active: Option<u64>,
    pub critical: Option<u64>,
    pub population: Option<u64>,
    /// Upstream update time in epoch milliseconds
    pub updated: Option<i64>,
}

impl CountryRecord {
    /// Cumulative count for the given metric
    pub fn total(&self, metric: MetricKind) -> Option<u64> {
        match metric {
            MetricKind::Cases => Some(self.cases),
            MetricKind::Recovered => self.recovered,
            MetricKind::Deaths => self.deaths,
        }
    }

    /// Count reported today for the given metric
    pub fn today(&self, metric: MetricKind) -> Option<u64> {
        match metric {
            MetricKind::Cases => self.today_cases,
            MetricKind::Recovered => self.today_recovered,
            MetricKind::Deaths => self.today_deaths,
        }
    }

    pub fn iso2(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.iso2.as_deref())
    }

    pub fn coordinates(&self) -> Option<LatLng> {
        self.info.as_ref().map(|info| LatLng::new(info.lat, info.long))
    }

    pub fn display_name(&self) -> &str {
        self.country.as_deref().unwrap_or("Worldwide")
    }

    /// Whether a code/name pair names this record's country. Codes are
    /// compared when both sides carry one, names otherwise.
    pub fn is_country(&self, code: Option<&str>, name: &str) -> bool {
        match (self.iso2(), code) {
            (Some(own), Some(other)) => own.eq_ignore_ascii_case(other),
            _ => self.country.as_deref() == Some(name),
        }
    }
}

/// Selector entry derived from a country record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryOption {
    pub name: String,
    pub value: String,
}

/// Geographic selection driving which totals are displayed
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Worldwide,
    Country(String),
}

impl Scope {
    pub const WORLDWIDE: &'static str = "worldwide";

    pub fn is_worldwide(&self) -> bool {
        matches!(self, Scope::Worldwide)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Worldwide => f.write_str(Self::WORLDWIDE),
            Scope::Country(code) => f.write_str(code),
        }
    }
}

impl FromStr for Scope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::WORLDWIDE) {
            Ok(Scope::Worldwide)
        } else {
            Ok(Scope::Country(trimmed.to_string()))
        }
    }
}

/// Which numeric field is highlighted across cards, map and graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MetricKind {
    #[default]
    Cases,
    Recovered,
    Deaths,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Cases, MetricKind::Recovered, MetricKind::Deaths];

    pub fn title(self) -> &'static str {
        match self {
            MetricKind::Cases => "Coronavirus Cases",
            MetricKind::Recovered => "Recovered",
            MetricKind::Deaths => "Deaths",
        }
    }

    /// Key of this metric in upstream JSON objects
    pub fn key(self) -> &'static str {
        match self {
            MetricKind::Cases => "cases",
            MetricKind::Recovered => "recovered",
            MetricKind::Deaths => "deaths",
        }
    }

    pub fn color(self) -> Color {
        match self {
            MetricKind::Cases => Color::Rgb(204, 16, 52),
            MetricKind::Recovered => Color::Rgb(125, 215, 29),
            MetricKind::Deaths => Color::Rgb(251, 68, 67),
        }
    }

    /// Bubble radius in meters per square root of the count
    pub fn radius_multiplier(self) -> f64 {
        match self {
            MetricKind::Cases => 800.0,
            MetricKind::Recovered => 1200.0,
            MetricKind::Deaths => 2000.0,
        }
    }

    /// Cards with a red accent
    pub fn is_red(self) -> bool {
        match self {
            MetricKind::Cases | MetricKind::Deaths => true,
            MetricKind::Recovered => false,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Map center and Leaflet-style zoom level requested by the current scope
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
}

impl MapView {
    /// Zoom used when a single country is focused
    pub const COUNTRY_ZOOM: u8 = 4;

    pub const fn initial() -> Self {
        Self {
            center: LatLng::new(34.80746, -40.4796),
            zoom: 3,
        }
    }

    pub const fn focus(center: LatLng) -> Self {
        Self {
            center,
            zoom: Self::COUNTRY_ZOOM,
        }
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::initial()
    }
}

/// A country placed at a rank position by total case count
#[derive(Clone, Debug)]
pub struct TableRow {
    /// 1-based rank
    pub rank: usize,
    pub record: Arc<CountryRecord>,
}

/// A map bubble
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub name: String,
    pub code: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub value: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_parses_sentinel_case_insensitively() {
        assert_eq!("worldwide".parse::<Scope>().unwrap(), Scope::Worldwide);
        assert_eq!("WorldWide".parse::<Scope>().unwrap(), Scope::Worldwide);
        assert_eq!("".parse::<Scope>().unwrap(), Scope::Worldwide);
        assert_eq!(" US ".parse::<Scope>().unwrap(), Scope::Country("US".into()));
        assert_eq!(Scope::Country("FR".into()).to_string(), "FR");
        assert_eq!(Scope::Worldwide.to_string(), "worldwide");
    }

    #[test]
    fn metric_fields_are_read_per_kind() {
        let record = CountryRecord {
            cases: 10,
            today_cases: Some(1),
            recovered: Some(7),
            today_recovered: Some(2),
            deaths: Some(3),
            today_deaths: None,
            ..Default::default()
        };
        assert_eq!(record.total(MetricKind::Cases), Some(10));
        assert_eq!(record.total(MetricKind::Recovered), Some(7));
        assert_eq!(record.total(MetricKind::Deaths), Some(3));
        assert_eq!(record.today(MetricKind::Recovered), Some(2));
        assert_eq!(record.today(MetricKind::Deaths), None);
        assert_eq!(record.display_name(), "Worldwide");
    }

    #[test]
    fn country_identity_prefers_code_then_name() {
        let france = CountryRecord {
            country: Some("France".into()),
            info: Some(CountryInfo { iso2: Some("FR".into()), iso3: None, lat: 46.0, long: 2.0 }),
            ..Default::default()
        };
        assert!(france.is_country(Some("fr"), "Anything"));
        assert!(!france.is_country(Some("DE"), "France"));
        assert!(france.is_country(None, "France"));

        let ship = CountryRecord {
            country: Some("Diamond Princess".into()),
            info: Some(CountryInfo { iso2: None, iso3: None, lat: 35.4, long: 139.6 }),
            ..Default::default()
        };
        assert!(ship.is_country(None, "Diamond Princess"));
        assert!(ship.is_country(Some("XX"), "Diamond Princess"));
        assert!(!ship.is_country(None, "MS Zaandam"));

        // Worldwide totals name no country
        assert!(!CountryRecord::default().is_country(None, "Worldwide"));
    }

    #[test]
    fn default_metric_is_cases() {
        assert_eq!(MetricKind::default(), MetricKind::Cases);
        assert_eq!(MapView::default(), MapView::initial());
    }
}
