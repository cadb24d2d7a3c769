use anyhow::{Context, Result};
use clap::Parser;
use covid_tui::api::{Client, Fetcher};
use covid_tui::app::App;
use covid_tui::config::Args;
use covid_tui::model::MetricKind;
use covid_tui::{data, ui};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_path())?;
    info!(?args, "starting covid-tui");

    let client = Client::new(&args.api_url, args.timeout())?;
    let fetcher = Fetcher::new(Arc::new(client));

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &args, fetcher);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_outlines(app: &mut App, data_dir: &Path) {
    if data_dir.exists() {
        data::load_all_geojson(&mut app.map_renderer, data_dir);
    }
    if !app.map_renderer.has_data() {
        info!("no outline data found, using built-in world");
        data::generate_simple_world(&mut app.map_renderer);
    }
}

/// Keys while the country picker is open
fn handle_selector_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_selector(),
        KeyCode::Enter => app.confirm_selector(),
        KeyCode::Up => app.selector_up(),
        KeyCode::Down => app.selector_down(),
        KeyCode::PageUp => app.selector_page(-10),
        KeyCode::PageDown => app.selector_page(10),
        KeyCode::Backspace => app.selector_backspace(),
        KeyCode::Char(ch) => app.selector_input(ch),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if app.selector.is_some() {
        handle_selector_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Active metric
        KeyCode::Char('1') | KeyCode::Char('c') => app.select_metric(MetricKind::Cases),
        KeyCode::Char('2') | KeyCode::Char('r') => app.select_metric(MetricKind::Recovered),
        KeyCode::Char('3') | KeyCode::Char('d') => app.select_metric(MetricKind::Deaths),

        // Scope
        KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Enter => app.open_selector(),
        KeyCode::Char('R') => app.refresh(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
        KeyCode::Char('0') => app.recenter(),

        // Layer toggles
        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('o') | KeyCode::Char('O') => app.map_renderer.toggle_bubbles(),
        KeyCode::Char('L') => app.map_renderer.toggle_labels(),

        // Table
        KeyCode::PageUp => app.scroll_table(-1),
        KeyCode::PageDown => app.scroll_table(1),

        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_at_cell(mouse.column, mouse.row, true),
        MouseEventKind::ScrollDown => app.zoom_at_cell(mouse.column, mouse.row, false),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, args: &Args, fetcher: Fetcher) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize, fetcher, args.history_days);
    load_outlines(&mut app, &args.data_dir);

    app.start();
    if let Some(scope) = args.initial_scope() {
        app.select_scope(scope);
    }

    loop {
        app.poll();
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Nothing animates, so a relaxed tick is enough to pick up fetch results
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
