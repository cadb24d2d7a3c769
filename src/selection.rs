//! Selection controller: the single owner of dashboard view state.
//!
//! Fetches are modelled as tickets. `select_scope` issues a [`Request`]
//! stamped with a monotonically increasing sequence number and returns
//! immediately; the caller runs it however it likes (worker thread, test
//! double) and hands the [`Response`] back to [`Selection::apply`]. A totals
//! response is applied only if its stamp is the latest issued, so a slow
//! response for an earlier selection can never overwrite a newer one. The
//! one exception fills cards that are still empty (see `backfill_totals`).

use crate::aggregate::{country_options, map_markers, table_rows};
use crate::api::{Request, Response};
use crate::error::FetchError;
use crate::history::Timeline;
use crate::model::{CountryOption, CountryRecord, MapView, Marker, MetricKind, Scope, TableRow};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_HISTORY_DAYS: u32 = 120;

/// View state that every panel reads. Mutated only through [`Selection`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub scope: Scope,
    pub active_metric: MetricKind,
    /// Totals for `scope`; `None` until the first totals response lands
    pub current_totals: Option<CountryRecord>,
    pub map_view: MapView,
}

/// What `apply` did with a response
#[derive(Clone, Debug, PartialEq)]
pub enum Applied {
    /// New totals for this scope are now current
    Totals(Scope),
    /// Country list, map dataset and table replaced
    Countries(usize),
    History,
    /// Superseded by a newer request; dropped without touching state
    Stale,
    /// Fetch failed; state unchanged, error recorded
    Failed(FetchError),
}

pub struct Selection {
    state: ViewState,
    options: Vec<CountryOption>,
    countries: Vec<Arc<CountryRecord>>,
    table: Vec<TableRow>,
    history: Option<Timeline>,
    last_error: Option<FetchError>,
    history_days: u32,
    /// Scope of the latest issued totals request
    requested_scope: Scope,
    /// Latest issued totals stamp
    scope_seq: u64,
    /// Latest stamp whose response has been received
    settled_seq: u64,
    countries_generation: u64,
    initialized: bool,
}

impl Selection {
    pub fn new(history_days: u32) -> Self {
        Self {
            state: ViewState::default(),
            options: Vec::new(),
            countries: Vec::new(),
            table: Vec::new(),
            history: None,
            last_error: None,
            history_days,
            requested_scope: Scope::Worldwide,
            scope_seq: 0,
            settled_seq: 0,
            countries_generation: 0,
            initialized: false,
        }
    }

    /// Startup fetches: worldwide totals, the country list and history.
    /// Returns them on the first call only; later calls are no-ops.
    pub fn initialize(&mut self) -> Vec<Request> {
        if self.initialized {
            return Vec::new();
        }
        self.initialized = true;
        info!("initializing dashboard data");

        vec![
            self.issue_totals(Scope::Worldwide),
            self.issue_countries(),
            Request::History { days: self.history_days },
        ]
    }

    /// Request totals for a new scope. Visible state changes only once the
    /// response is applied.
    pub fn select_scope(&mut self, scope: Scope) -> Request {
        self.issue_totals(scope)
    }

    /// Switch which field cards, map and graph read. Scope, totals and table
    /// order are untouched.
    pub fn select_metric(&mut self, metric: MetricKind) {
        if self.state.active_metric != metric {
            debug!(%metric, "active metric changed");
        }
        self.state.active_metric = metric;
    }

    /// Re-fetch the most recently requested scope and the country list. A
    /// selection still in flight is re-issued rather than dropped.
    pub fn refresh(&mut self) -> Vec<Request> {
        let scope = self.requested_scope.clone();
        vec![self.issue_totals(scope), self.issue_countries()]
    }

    /// Apply a completed fetch
    pub fn apply(&mut self, response: Response) -> Applied {
        match response {
            Response::Totals { seq, scope, result } => self.apply_totals(seq, scope, result),
            Response::Countries { generation, result } => {
                if generation != self.countries_generation {
                    debug!(generation, latest = self.countries_generation, "dropping stale country list");
                    return Applied::Stale;
                }
                match result {
                    Ok(records) => {
                        let countries: Vec<_> = records.into_iter().map(Arc::new).collect();
                        self.options = country_options(&countries);
                        self.table = table_rows(&countries);
                        self.countries = countries;
                        info!(count = self.countries.len(), "country list loaded");
                        Applied::Countries(self.countries.len())
                    }
                    Err(e) => self.fail("country list", e),
                }
            }
            Response::History { result } => match result {
                Ok(timeline) => {
                    self.history = Some(timeline);
                    Applied::History
                }
                Err(e) => self.fail("history", e),
            },
        }
    }

    fn apply_totals(&mut self, seq: u64, scope: Scope, result: Result<CountryRecord, FetchError>) -> Applied {
        if seq != self.scope_seq {
            return self.backfill_totals(seq, scope, result);
        }
        self.settled_seq = seq;

        let record = match result {
            Ok(record) => record,
            Err(e) => return self.fail("totals", e),
        };

        // Resolve the new map view before touching any state so the update is all-or-nothing
        let map_view = match &scope {
            Scope::Worldwide => MapView::initial(),
            Scope::Country(code) => match record.coordinates() {
                Some(center) => MapView::focus(center),
                None => {
                    return self.fail(
                        "totals",
                        FetchError::malformed(format!("{code}: totals carry no coordinates")),
                    )
                }
            },
        };

        info!(%scope, cases = record.cases, "scope applied");
        self.state.scope = scope.clone();
        self.state.current_totals = Some(record);
        self.state.map_view = map_view;
        self.last_error = None;
        Applied::Totals(scope)
    }

    /// A superseded response still fills empty cards when it matches the
    /// scope on screen, so a failed startup country leaves worldwide totals.
    /// It never replaces totals that are already shown.
    fn backfill_totals(&mut self, seq: u64, scope: Scope, result: Result<CountryRecord, FetchError>) -> Applied {
        match result {
            Ok(record) if self.state.current_totals.is_none() && scope == self.state.scope => {
                info!(seq, %scope, "superseded totals fill empty cards");
                self.state.current_totals = Some(record);
                Applied::Totals(scope)
            }
            _ => {
                debug!(seq, latest = self.scope_seq, %scope, "dropping stale totals");
                Applied::Stale
            }
        }
    }

    fn fail(&mut self, what: &str, error: FetchError) -> Applied {
        warn!(what, error = %error, "fetch failed; keeping previous state");
        self.last_error = Some(error.clone());
        Applied::Failed(error)
    }

    fn issue_totals(&mut self, scope: Scope) -> Request {
        self.scope_seq += 1;
        debug!(seq = self.scope_seq, %scope, "issuing totals request");
        self.requested_scope = scope.clone();
        Request::Totals { seq: self.scope_seq, scope }
    }

    fn issue_countries(&mut self) -> Request {
        self.countries_generation += 1;
        Request::Countries { generation: self.countries_generation }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn scope(&self) -> &Scope {
        &self.state.scope
    }

    pub fn active_metric(&self) -> MetricKind {
        self.state.active_metric
    }

    pub fn current_totals(&self) -> Option<&CountryRecord> {
        self.state.current_totals.as_ref()
    }

    /// Totals of the selected country, `None` while the scope is worldwide
    pub fn selected_country(&self) -> Option<&CountryRecord> {
        match self.state.scope {
            Scope::Worldwide => None,
            Scope::Country(_) => self.state.current_totals.as_ref(),
        }
    }

    pub fn map_view(&self) -> MapView {
        self.state.map_view
    }

    pub fn options(&self) -> &[CountryOption] {
        &self.options
    }

    pub fn countries(&self) -> &[Arc<CountryRecord>] {
        &self.countries
    }

    pub fn table(&self) -> &[TableRow] {
        &self.table
    }

    /// Map bubbles for the active metric
    pub fn markers(&self) -> Vec<Marker> {
        map_markers(&self.countries, self.state.active_metric)
    }

    pub fn history(&self) -> Option<&Timeline> {
        self.history.as_ref()
    }

    /// Most recent fetch failure, cleared by the next applied totals
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// A totals request is still in flight for the latest selection
    pub fn is_pending(&self) -> bool {
        self.settled_seq != self.scope_seq
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Display name for the current scope, falling back to its code
    pub fn scope_name(&self) -> String {
        match &self.state.scope {
            Scope::Worldwide => "Worldwide".to_string(),
            Scope::Country(code) => self
                .state
                .current_totals
                .as_ref()
                .and_then(|r| r.country.clone())
                .unwrap_or_else(|| code.clone()),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DAYS)
    }
}
