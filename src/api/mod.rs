//! Upstream disease.sh API: the fetch boundary, request plumbing and payload validation.

mod client;
mod fetcher;
pub mod validate;

pub use client::{Client, DEFAULT_BASE_URL};
pub use fetcher::Fetcher;

use crate::error::FetchResult;
use crate::history::Timeline;
use crate::model::{CountryRecord, Scope};
use tracing::debug;

/// Source of COVID-19 statistics
pub trait CovidSource: Send + Sync {
    /// Worldwide totals (`/v3/covid-19/all`)
    fn worldwide(&self) -> FetchResult<CountryRecord>;

    /// Every country (`/v3/covid-19/countries`)
    fn countries(&self) -> FetchResult<Vec<CountryRecord>>;

    /// One country by ISO code or name (`/v3/covid-19/countries/{code}`)
    fn country(&self, code: &str) -> FetchResult<CountryRecord>;

    /// Worldwide cumulative history for the last `days` days
    fn historical(&self, days: u32) -> FetchResult<Timeline>;

    /// Totals for a scope
    fn totals(&self, scope: &Scope) -> FetchResult<CountryRecord> {
        match scope {
            Scope::Worldwide => self.worldwide(),
            Scope::Country(code) => self.country(code),
        }
    }
}

/// A fetch issued by the selection controller
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Totals for a scope, stamped with the controller's sequence number
    Totals { seq: u64, scope: Scope },
    Countries { generation: u64 },
    History { days: u32 },
}

/// Result of a request, carrying the stamp it was issued with
#[derive(Clone, Debug)]
pub enum Response {
    Totals {
        seq: u64,
        scope: Scope,
        result: FetchResult<CountryRecord>,
    },
    Countries {
        generation: u64,
        result: FetchResult<Vec<CountryRecord>>,
    },
    History {
        result: FetchResult<Timeline>,
    },
}

/// Run a request against a source, blocking until it completes
pub fn execute(source: &dyn CovidSource, request: Request) -> Response {
    debug!(?request, "executing fetch");
    match request {
        Request::Totals { seq, scope } => {
            let result = source.totals(&scope);
            Response::Totals { seq, scope, result }
        }
        Request::Countries { generation } => Response::Countries {
            generation,
            result: source.countries(),
        },
        Request::History { days } => Response::History {
            result: source.historical(days),
        },
    }
}
