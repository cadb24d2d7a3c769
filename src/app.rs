use crate::api::Fetcher;
use crate::map::{Lod, MapRenderer, Viewport};
use crate::model::{MapView, MetricKind, Scope};
use crate::selection::{Applied, Selection};
use crate::selector::CountrySelector;
use tracing::debug;

/// Rows the table scrolls per page
const TABLE_PAGE: usize = 10;

/// Terminal cell of the map's top-left inner corner: below header (3) and
/// cards (5), inside the map border
const MAP_ORIGIN: (u16, u16) = (1, 9);

/// Zoom step for a mouse wheel notch
const WHEEL_ZOOM: f64 = 1.5;

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub selection: Selection,
    fetcher: Fetcher,
    /// Country picker, open while `Some`
    pub selector: Option<CountrySelector>,
    /// First visible table row
    pub table_offset: usize,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Controller map view the viewport was last synced to
    synced_view: MapView,
}

/// Braille pixel size of the map panel for a terminal size. The UI recomputes
/// the exact size on every frame; this only seeds pan/zoom scaling.
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    let inner_width = (width * 65 / 100).saturating_sub(2);
    // Header (3), cards (5), status bar (1) and the map border (2)
    let inner_height = height.saturating_sub(11);
    (inner_width * 2, inner_height * 4)
}

impl App {
    pub fn new(width: usize, height: usize, fetcher: Fetcher, history_days: u32) -> Self {
        let (px_width, px_height) = map_pixels(width, height);
        let synced_view = MapView::initial();

        Self {
            viewport: Viewport::from_map_view(synced_view, px_width, px_height),
            map_renderer: MapRenderer::new(),
            selection: Selection::new(history_days),
            fetcher,
            selector: None,
            table_offset: 0,
            should_quit: false,
            last_mouse: None,
            synced_view,
        }
    }

    /// Kick off the startup fetches (no-op after the first call)
    pub fn start(&mut self) {
        let requests = self.selection.initialize();
        self.fetcher.dispatch_all(requests);
    }

    /// Apply every completed fetch. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        let responses: Vec<_> = self.fetcher.drain().collect();
        for response in responses {
            match self.selection.apply(response) {
                Applied::Stale => {}
                Applied::Countries(_) => {
                    self.table_offset = 0;
                    changed = true;
                }
                applied => {
                    debug!(?applied, "response applied");
                    changed = true;
                }
            }
        }
        self.sync_viewport();
        changed
    }

    /// Follow the controller's map view when it moves (new scope applied)
    fn sync_viewport(&mut self) {
        let view = self.selection.map_view();
        if view != self.synced_view {
            self.synced_view = view;
            self.viewport = Viewport::from_map_view(view, self.viewport.width, self.viewport.height);
        }
    }

    pub fn select_scope(&mut self, scope: Scope) {
        let request = self.selection.select_scope(scope);
        self.fetcher.dispatch(request);
    }

    pub fn select_metric(&mut self, metric: MetricKind) {
        self.selection.select_metric(metric);
    }

    pub fn refresh(&mut self) {
        let requests = self.selection.refresh();
        self.fetcher.dispatch_all(requests);
    }

    pub fn open_selector(&mut self) {
        self.selector = Some(CountrySelector::new());
    }

    pub fn close_selector(&mut self) {
        self.selector = None;
    }

    /// Select the highlighted choice and close the popup
    pub fn confirm_selector(&mut self) {
        let choice = self
            .selector
            .take()
            .and_then(|selector| selector.current(self.selection.options()));
        if let Some(scope) = choice {
            self.select_scope(scope);
        }
    }

    pub fn selector_input(&mut self, ch: char) {
        if let Some(selector) = self.selector.as_mut() {
            selector.push_char(ch);
        }
    }

    pub fn selector_backspace(&mut self) {
        if let Some(selector) = self.selector.as_mut() {
            selector.pop_char();
        }
    }

    pub fn selector_up(&mut self) {
        if let Some(selector) = self.selector.as_mut() {
            selector.move_up();
        }
    }

    pub fn selector_down(&mut self) {
        if let Some(selector) = self.selector.as_mut() {
            selector.move_down(self.selection.options());
        }
    }

    pub fn selector_page(&mut self, delta: isize) {
        if let Some(selector) = self.selector.as_mut() {
            selector.page(self.selection.options(), delta);
        }
    }

    /// Scroll the ranked table by pages
    pub fn scroll_table(&mut self, pages: isize) {
        let max = self.selection.table().len().saturating_sub(1);
        let delta = pages.unsigned_abs() * TABLE_PAGE;
        self.table_offset = if pages < 0 {
            self.table_offset.saturating_sub(delta)
        } else {
            (self.table_offset + delta).min(max)
        };
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (px_width, px_height) = map_pixels(width, height);
        self.viewport.width = px_width;
        self.viewport.height = px_height;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Braille pixel under a terminal cell, if the cell is inside the map
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let px = col.checked_sub(MAP_ORIGIN.0)? as i32 * 2;
        let py = row.checked_sub(MAP_ORIGIN.1)? as i32 * 4;
        (px < self.viewport.width as i32 && py < self.viewport.height as i32).then_some((px, py))
    }

    /// Wheel zoom towards the cursor; zooms about the center when the cursor
    /// is off the map
    pub fn zoom_at_cell(&mut self, col: u16, row: u16, zoom_in: bool) {
        let factor = if zoom_in { WHEEL_ZOOM } else { 1.0 / WHEEL_ZOOM };
        match self.map_pixel(col, row) {
            Some((px, py)) => self.viewport.zoom_at(px, py, factor),
            None if zoom_in => self.viewport.zoom_in(),
            None => self.viewport.zoom_out(),
        }
    }

    /// Drop manual pan/zoom and return to the controller's map view
    pub fn recenter(&mut self) {
        self.viewport =
            Viewport::from_map_view(self.selection.map_view(), self.viewport.width, self.viewport.height);
    }

    /// Mouse drag pans the map
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.viewport.zoom).label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CovidSource;
    use crate::error::{FetchError, FetchResult};
    use crate::history::Timeline;
    use crate::model::{CountryInfo, CountryRecord};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct Stub;

    impl CovidSource for Stub {
        fn worldwide(&self) -> FetchResult<CountryRecord> {
            Ok(CountryRecord { cases: 100, today_cases: Some(5), ..Default::default() })
        }
        fn countries(&self) -> FetchResult<Vec<CountryRecord>> {
            Ok((0..25)
                .map(|i| CountryRecord {
                    country: Some(format!("C{i}")),
                    info: Some(CountryInfo { iso2: Some(format!("C{i}")), iso3: None, lat: 0.0, long: i as f64 }),
                    cases: i,
                    ..Default::default()
                })
                .collect())
        }
        fn country(&self, code: &str) -> FetchResult<CountryRecord> {
            match code {
                "IT" => Ok(CountryRecord {
                    country: Some("Italy".into()),
                    info: Some(CountryInfo { iso2: Some("IT".into()), iso3: None, lat: 42.0, long: 12.0 }),
                    cases: 50,
                    ..Default::default()
                }),
                _ => Err(FetchError::Network("unreachable".into())),
            }
        }
        fn historical(&self, _days: u32) -> FetchResult<Timeline> {
            Ok(Timeline::default())
        }
    }

    fn app() -> App {
        App::new(120, 40, Fetcher::new(Arc::new(Stub)), 30)
    }

    /// Poll until `done` holds or a few seconds pass
    fn poll_until(app: &mut App, done: impl Fn(&App) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(app) && Instant::now() < deadline {
            app.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn start_loads_totals_and_table() {
        let mut app = app();
        app.start();
        poll_until(&mut app, |a| a.selection.current_totals().is_some() && !a.selection.table().is_empty());

        assert_eq!(app.selection.current_totals().unwrap().cases, 100);
        assert_eq!(app.selection.table().len(), 25);
        assert_eq!(app.selection.table()[0].record.cases, 24);
    }

    #[test]
    fn selecting_country_moves_viewport() {
        let mut app = app();
        app.start();
        poll_until(&mut app, |a| a.selection.current_totals().is_some());

        app.select_scope(Scope::Country("IT".into()));
        poll_until(&mut app, |a| a.selection.scope() == &Scope::Country("IT".into()));

        assert_eq!(app.viewport.zoom, 2.0);
        assert_eq!(app.viewport.center_lat, 42.0);
        assert_eq!(app.viewport.center_lon, 12.0);

        // Manual pan, then recenter snaps back
        app.pan(30, 0);
        assert_ne!(app.viewport.center_lon, 12.0);
        app.recenter();
        assert_eq!(app.viewport.center_lon, 12.0);
    }

    #[test]
    fn failed_selection_surfaces_error() {
        let mut app = app();
        app.start();
        poll_until(&mut app, |a| a.selection.current_totals().is_some());

        app.select_scope(Scope::Country("ZZ".into()));
        poll_until(&mut app, |a| a.selection.last_error().is_some());

        assert_eq!(app.selection.scope(), &Scope::Worldwide);
        assert_eq!(app.selection.current_totals().unwrap().cases, 100);
    }

    #[test]
    fn selector_confirms_highlighted_choice() {
        let mut app = app();
        app.start();
        poll_until(&mut app, |a| !a.selection.options().is_empty());

        app.open_selector();
        for ch in "C13".chars() {
            app.selector_input(ch);
        }
        app.confirm_selector();
        assert!(app.selector.is_none());
        // C13 is unknown to the stub, so the request fails and scope stays put
        poll_until(&mut app, |a| a.selection.last_error().is_some());
        assert_eq!(app.selection.scope(), &Scope::Worldwide);
    }

    #[test]
    fn table_scroll_is_clamped() {
        let mut app = app();
        app.start();
        poll_until(&mut app, |a| !a.selection.table().is_empty());

        app.scroll_table(-1);
        assert_eq!(app.table_offset, 0);
        app.scroll_table(1);
        assert_eq!(app.table_offset, 10);
        app.scroll_table(5);
        assert_eq!(app.table_offset, 24);
    }

    #[test]
    fn wheel_zoom_targets_map_cells_only() {
        let mut app = app();
        let before = app.viewport.zoom;

        // Header row is off the map, so this zooms about the center
        let center = (app.viewport.center_lon, app.viewport.center_lat);
        app.zoom_at_cell(5, 0, true);
        assert!(app.viewport.zoom > before);
        assert_eq!((app.viewport.center_lon, app.viewport.center_lat), center);

        // A corner cell on the map drags the center towards it
        app.zoom_at_cell(MAP_ORIGIN.0, MAP_ORIGIN.1, true);
        assert!(app.viewport.center_lon < center.0);
    }

    #[test]
    fn metric_switch_keeps_table_order() {
        let mut app = app();
        app.start();
        poll_until(&mut app, |a| !a.selection.table().is_empty());
        let before: Vec<_> = app.selection.table().iter().map(|r| r.record.cases).collect();

        app.select_metric(MetricKind::Deaths);
        let after: Vec<_> = app.selection.table().iter().map(|r| r.record.cases).collect();
        assert_eq!(before, after);
        assert_eq!(app.selection.active_metric(), MetricKind::Deaths);
    }
}
