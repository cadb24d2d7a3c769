//! End-to-end behaviour of the selection controller against a scripted source.

use covid_tui::aggregate::sort_data;
use covid_tui::api::{execute, CovidSource, Request, Response};
use covid_tui::error::{FetchError, FetchResult};
use covid_tui::format::pretty_print_stat;
use covid_tui::history::{parse_date, Timeline};
use covid_tui::model::{CountryInfo, CountryRecord, LatLng, MapView, MetricKind, Scope};
use covid_tui::selection::{Applied, Selection};
use std::collections::HashMap;
use std::sync::Mutex;

/// Source whose answers can be changed between calls
#[derive(Default)]
struct Scripted {
    worldwide: Mutex<Option<FetchResult<CountryRecord>>>,
    countries: Vec<CountryRecord>,
    by_code: HashMap<String, FetchResult<CountryRecord>>,
}

impl Scripted {
    fn set_worldwide(&self, result: FetchResult<CountryRecord>) {
        *self.worldwide.lock().unwrap() = Some(result);
    }
}

impl CovidSource for Scripted {
    fn worldwide(&self) -> FetchResult<CountryRecord> {
        self.worldwide
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(FetchError::Network("no worldwide scripted".into())))
    }

    fn countries(&self) -> FetchResult<Vec<CountryRecord>> {
        Ok(self.countries.clone())
    }

    fn country(&self, code: &str) -> FetchResult<CountryRecord> {
        self.by_code
            .get(code)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Network(format!("{code}: connection refused"))))
    }

    fn historical(&self, _days: u32) -> FetchResult<Timeline> {
        let mut timeline = Timeline::default();
        for (key, value) in [("3/1/21", 10), ("3/2/21", 15), ("3/3/21", 30)] {
            timeline.cases.insert(parse_date(key).unwrap(), value);
        }
        Ok(timeline)
    }
}

fn worldwide(cases: u64, today: u64) -> CountryRecord {
    CountryRecord {
        cases,
        today_cases: Some(today),
        ..Default::default()
    }
}

fn country(name: &str, code: &str, cases: u64, lat: f64, long: f64) -> CountryRecord {
    CountryRecord {
        country: Some(name.into()),
        info: Some(CountryInfo {
            iso2: Some(code.into()),
            iso3: None,
            lat,
            long,
        }),
        cases,
        deaths: Some(cases / 100),
        ..Default::default()
    }
}

fn source() -> Scripted {
    let us = country("USA", "US", 900, 38.0, -97.0);
    let fr = country("France", "FR", 300, 46.0, 2.0);
    let mut by_code = HashMap::new();
    by_code.insert("US".to_string(), Ok(us.clone()));
    by_code.insert("FR".to_string(), Ok(fr.clone()));

    let source = Scripted {
        worldwide: Mutex::new(None),
        countries: vec![fr, us, country("Peru", "PE", 300, -10.0, -76.0)],
        by_code,
    };
    source.set_worldwide(Ok(worldwide(100, 5)));
    source
}

/// Run every request synchronously and apply the responses in order
fn run(selection: &mut Selection, source: &Scripted, requests: Vec<Request>) -> Vec<Applied> {
    requests
        .into_iter()
        .map(|request| selection.apply(execute(source, request)))
        .collect()
}

fn initialized(source: &Scripted) -> Selection {
    let mut selection = Selection::default();
    let requests = selection.initialize();
    run(&mut selection, source, requests);
    selection
}

#[test]
fn initializing_shows_worldwide_totals() {
    let source = source();
    let selection = initialized(&source);

    let totals = selection.current_totals().expect("totals loaded");
    assert_eq!(totals.cases, 100);
    assert_eq!(pretty_print_stat(totals.today_cases.map(|v| v as f64)), "+5");
    assert_eq!(selection.scope(), &Scope::Worldwide);
    assert_eq!(selection.options().len(), 3);
    assert_eq!(selection.markers().len(), 3);
    assert!(selection.history().is_some());
}

#[test]
fn initialize_is_idempotent() {
    let source = source();
    let mut selection = initialized(&source);
    assert!(selection.initialize().is_empty());
}

#[test]
fn table_is_ranked_by_cases_with_stable_ties() {
    let source = source();
    let selection = initialized(&source);

    let names: Vec<_> = selection
        .table()
        .iter()
        .map(|row| (row.rank, row.record.display_name().to_string()))
        .collect();
    assert_eq!(
        names,
        [(1, "USA".to_string()), (2, "France".to_string()), (3, "Peru".to_string())]
    );

    // The map dataset keeps upstream order
    let order: Vec<_> = selection.countries().iter().map(|c| c.display_name()).collect();
    assert_eq!(order, ["France", "USA", "Peru"]);
}

#[test]
fn returning_to_worldwide_restores_totals_and_resets_map() {
    let source = source();
    let mut selection = initialized(&source);

    let us = selection.select_scope(Scope::Country("US".into()));
    run(&mut selection, &source, vec![us]);
    assert_eq!(selection.scope(), &Scope::Country("US".into()));
    assert_eq!(selection.current_totals().unwrap().cases, 900);
    assert_eq!(selection.map_view(), MapView::focus(LatLng::new(38.0, -97.0)));

    let world = selection.select_scope(Scope::Worldwide);
    run(&mut selection, &source, vec![world]);
    assert_eq!(selection.scope(), &Scope::Worldwide);
    assert_eq!(selection.current_totals().unwrap().cases, 100);
    assert_eq!(selection.map_view(), MapView::initial());
}

#[test]
fn rejected_fetch_leaves_state_unchanged() {
    let source = source();
    let mut selection = initialized(&source);

    let fr = selection.select_scope(Scope::Country("FR".into()));
    run(&mut selection, &source, vec![fr]);
    let before = selection.state().clone();

    let bad = selection.select_scope(Scope::Country("XX".into()));
    let applied = run(&mut selection, &source, vec![bad]);

    assert!(matches!(applied[0], Applied::Failed(FetchError::Network(_))));
    assert_eq!(selection.state(), &before);
    assert!(selection.last_error().is_some());

    // Failed worldwide refresh behaves the same way
    source.set_worldwide(Err(FetchError::Network("timed out".into())));
    let world = selection.select_scope(Scope::Worldwide);
    run(&mut selection, &source, vec![world]);
    assert_eq!(selection.scope(), &Scope::Country("FR".into()));
    assert_eq!(selection.current_totals().unwrap().cases, 300);
}

#[test]
fn malformed_payload_is_a_recoverable_failure() {
    let source = source();
    let mut selection = initialized(&source);

    let seq = match selection.select_scope(Scope::Country("US".into())) {
        Request::Totals { seq, .. } => seq,
        other => panic!("expected totals request, got {other:?}"),
    };
    let applied = selection.apply(Response::Totals {
        seq,
        scope: Scope::Country("US".into()),
        result: Err(FetchError::malformed("USA: missing `countryInfo`")),
    });

    assert!(matches!(applied, Applied::Failed(FetchError::MalformedResponse(_))));
    assert_eq!(selection.scope(), &Scope::Worldwide);

    // A later good response recovers and clears the error
    let us = selection.select_scope(Scope::Country("US".into()));
    run(&mut selection, &source, vec![us]);
    assert_eq!(selection.scope(), &Scope::Country("US".into()));
    assert!(selection.last_error().is_none());
}

#[test]
fn metric_switch_changes_only_the_metric() {
    let source = source();
    let mut selection = initialized(&source);
    let totals = selection.current_totals().cloned();
    let table: Vec<_> = selection.table().iter().map(|r| r.record.cases).collect();

    selection.select_metric(MetricKind::Deaths);

    assert_eq!(selection.active_metric(), MetricKind::Deaths);
    assert_eq!(selection.current_totals().cloned(), totals);
    assert_eq!(selection.table().iter().map(|r| r.record.cases).collect::<Vec<_>>(), table);
    assert_eq!(selection.scope(), &Scope::Worldwide);
    // Map bubbles now read deaths
    assert!(selection.markers().iter().all(|m| m.value < 10));
}

#[test]
fn latest_selection_wins_regardless_of_completion_order() {
    let source = source();
    let mut selection = initialized(&source);

    let first = selection.select_scope(Scope::Country("US".into()));
    let second = selection.select_scope(Scope::Country("FR".into()));

    // Second completes first, then the superseded one lands
    let applied_second = selection.apply(execute(&source, second));
    let applied_first = selection.apply(execute(&source, first));

    assert_eq!(applied_second, Applied::Totals(Scope::Country("FR".into())));
    assert_eq!(applied_first, Applied::Stale);
    assert_eq!(selection.scope(), &Scope::Country("FR".into()));
    assert_eq!(selection.current_totals().unwrap().cases, 300);
    assert_eq!(selection.map_view().center, LatLng::new(46.0, 2.0));
}

#[test]
fn sorting_never_touches_the_shared_list() {
    let source = source();
    let before = source.countries.clone();
    let sorted = sort_data(&source.countries);
    assert_eq!(source.countries, before);
    assert_eq!(sorted[0].cases, 900);
}

#[test]
fn trend_graph_reads_daily_new_counts() {
    let source = source();
    let selection = initialized(&source);
    let history = selection.history().unwrap();
    assert_eq!(history.chart_points(MetricKind::Cases), vec![(0.0, 5.0), (1.0, 15.0)]);
    assert!(history.chart_points(MetricKind::Deaths).is_empty());
}

#[test]
fn failed_startup_country_falls_back_to_worldwide_cards() {
    let source = source();
    let mut selection = Selection::default();
    let mut requests = selection.initialize();
    requests.push(selection.select_scope(Scope::Country("XX".into())));

    run(&mut selection, &source, requests);

    assert_eq!(selection.scope(), &Scope::Worldwide);
    assert_eq!(selection.current_totals().unwrap().cases, 100);
    assert!(selection.last_error().is_some());
    assert!(selection.selected_country().is_none());
}

#[test]
fn refresh_during_pending_selection_keeps_the_choice() {
    let source = source();
    let mut selection = initialized(&source);

    let pending = selection.select_scope(Scope::Country("US".into()));
    let refreshed = selection.refresh();
    let mut requests = vec![pending];
    requests.extend(refreshed);

    run(&mut selection, &source, requests);

    assert_eq!(selection.scope(), &Scope::Country("US".into()));
    assert_eq!(selection.current_totals().unwrap().cases, 900);
    assert!(!selection.is_pending());
}
