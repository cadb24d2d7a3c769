use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::format::{group_digits, magnitude_format, pretty_print_stat};
use crate::map::MapLayers;
use crate::model::{MetricKind, Scope};
use crate::selector::CountrySelector;
use chrono::DateTime;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Row, Table, Widget,
    },
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5)])
        .split(body[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Min(8)])
        .split(body[1]);

    render_header(frame, app, chunks[0]);
    render_cards(frame, app, left[0]);
    render_map(frame, app, left[1]);
    render_table(frame, app, right[0]);
    render_graph(frame, app, right[1]);
    render_status_bar(frame, app, chunks[2]);

    if let Some(selector) = &app.selector {
        render_selector(frame, app, selector, area);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let selection = &app.selection;

    let mut spans = vec![
        Span::styled(
            " COVID-19 Tracker ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            selection.scope_name(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ▾ [/] change ", Style::default().fg(Color::DarkGray)),
    ];

    if selection.is_pending() {
        spans.push(Span::styled(" loading… ", Style::default().fg(Color::Yellow)));
    }
    if let Some(error) = selection.last_error() {
        spans.push(Span::styled(
            format!(" {error} "),
            Style::default().fg(Color::Red),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    let totals = app.selection.current_totals();
    let active = app.selection.active_metric();

    for (idx, metric) in MetricKind::ALL.into_iter().enumerate() {
        let today = totals.and_then(|t| t.today(metric)).map(|v| v as f64);
        let total = totals.and_then(|t| t.total(metric)).map(|v| v as f64);
        let is_active = metric == active;

        let border_style = if is_active {
            Style::default().fg(metric.color()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let today_color = if metric.is_red() { Color::Red } else { Color::Green };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                format!(" {} {} ", idx + 1, metric.title()),
                Style::default().fg(Color::Gray),
            ));

        let lines = vec![
            Line::from(Span::styled(
                pretty_print_stat(today),
                Style::default().fg(today_color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} Total", magnitude_format(total)),
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), cells[idx]);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let metric = app.selection.active_metric();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" World Map · {} ", metric.title()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let selected = app.selection.selected_country();
    let markers = app.selection.markers();
    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &markers,
        metric,
        selected,
    );

    frame.render_widget(MapWidget { layers, metric }, inner);
}

/// Braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    metric: MetricKind,
}

impl MapWidget {
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        let rows = canvas.height().min(area.height as usize);
        let cols = canvas.width().min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(ch) = canvas.glyph(col, row) {
                    buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: outlines, bubbles, selected bubble
        Self::render_layer(&self.layers.land, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.bubbles, self.metric.color(), area, buf);
        Self::render_layer(&self.layers.highlight, Color::Yellow, area, buf);

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            let x = area.x + *lx;
            let y = area.y + *ly;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(x + i as u16, y)].set_char(ch).set_style(label_style);
            }
        }
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let selected = app.selection.selected_country();

    let visible = area.height.saturating_sub(3) as usize;
    let rows: Vec<Row> = app
        .selection
        .table()
        .iter()
        .skip(app.table_offset)
        .take(visible)
        .map(|row| {
            let record = &row.record;
            let style = if selected.is_some_and(|country| country.is_country(record.iso2(), record.display_name())) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format!("{:>3}", row.rank)),
                Cell::from(record.display_name().to_string()),
                Cell::from(group_digits(record.cases)),
            ])
            .style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Live Cases by Country ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let table = Table::new(
        rows,
        [Constraint::Length(4), Constraint::Min(10), Constraint::Length(13)],
    )
    .header(Row::new(vec!["  #", "Country", "Cases"]).style(Style::default().fg(Color::DarkGray)))
    .block(block);

    frame.render_widget(table, area);
}

fn render_graph(frame: &mut Frame, app: &App, area: Rect) {
    let metric = app.selection.active_metric();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" Worldwide new {} ", metric.key()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let Some(history) = app.selection.history() else {
        frame.render_widget(Paragraph::new("Loading history…").block(block), area);
        return;
    };

    let points = history.chart_points(metric);
    let Some((first, last)) = history.date_range(metric).filter(|_| !points.is_empty()) else {
        frame.render_widget(Paragraph::new("No history").block(block), area);
        return;
    };

    let (min_y, max_y) = points
        .iter()
        .fold((0.0f64, 0.0f64), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    let max_x = (points.len().saturating_sub(1)).max(1) as f64;
    let max_y = if max_y > min_y { max_y } else { min_y + 1.0 };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(metric.color()))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, max_x])
                .labels([first.format("%m/%d").to_string(), last.format("%m/%d").to_string()]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([min_y, max_y])
                .labels([magnitude_format(Some(min_y)), magnitude_format(Some(max_y))]),
        );

    frame.render_widget(chart, area);
}

fn render_selector(frame: &mut Frame, app: &App, selector: &CountrySelector, area: Rect) {
    let popup = centered(area, 40, 70);
    frame.render_widget(Clear, popup);

    let choices = selector.choices(app.selection.options());
    let items: Vec<ListItem> = choices
        .iter()
        .map(|choice| {
            let code = match &choice.scope {
                Scope::Worldwide => String::new(),
                Scope::Country(code) => format!("  {code}"),
            };
            ListItem::new(Line::from(vec![
                Span::raw(choice.label.to_string()),
                Span::styled(code, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" Country: {}▏ ", selector.filter),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("› ");

    let mut state = ListState::default();
    if !choices.is_empty() {
        state.select(Some(selector.cursor.min(choices.len() - 1)));
    }
    frame.render_stateful_widget(list, popup, &mut state);
}

/// Rect of `pct_x` x `pct_y` percent centered in `area`
fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn updated_at(app: &App) -> Option<String> {
    let millis = app.selection.current_totals()?.updated?;
    let time = DateTime::from_timestamp_millis(millis)?;
    Some(time.format("%Y-%m-%d %H:%M UTC").to_string())
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let toggle = |on: bool, on_label: &'static str, off_label: &'static str| {
        Span::styled(
            if on { on_label } else { off_label },
            Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
        )
    };

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        toggle(settings.show_borders, "[B]order ", "[b]order "),
        toggle(settings.show_bubbles, "[O]bubbles ", "[o]bubbles "),
        toggle(settings.show_labels, "[L]abels ", "[l]abels "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    if let Some(updated) = updated_at(app) {
        spans.push(Span::styled(
            format!(" | updated {updated}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::styled(
        " | 1-3:metric /:country hjkl:pan +/-:zoom 0:recenter R:refresh q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
