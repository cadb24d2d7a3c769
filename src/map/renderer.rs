use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::projection::Viewport;
use crate::model::{CountryRecord, Marker, MetricKind};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Largest bubble radius in braille pixels
const MAX_BUBBLE_RADIUS: f64 = 12.0;

/// Bubbles at or below this radius are drawn filled
const FILLED_BUBBLE_RADIUS: i32 = 2;

/// Level of detail for map data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
    pub show_bubbles: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_borders: true,
            show_bubbles: true,
            show_labels: true,
        }
    }
}

/// Rendered map, one canvas per color
pub struct MapLayers {
    pub land: BrailleCanvas,
    pub bubbles: BrailleCanvas,
    /// Bubble of the selected country, drawn on top
    pub highlight: BrailleCanvas,
    /// Text overlays in character coordinates
    pub labels: Vec<(u16, u16, String)>,
}

/// Map renderer with multi-resolution outline data and per-country bubbles
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
    pub settings: DisplaySettings,
}

/// Bubble radius in braille pixels: `sqrt(value) * multiplier` meters at the
/// viewport's scale, clamped. Zero values get no bubble.
pub fn bubble_radius(value: u64, lat: f64, metric: MetricKind, viewport: &Viewport) -> Option<i32> {
    if value == 0 {
        return None;
    }
    let meters = (value as f64).sqrt() * metric.radius_multiplier();
    let px = meters / viewport.meters_per_pixel(lat);
    Some(px.min(MAX_BUBBLE_RADIUS).round() as i32)
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    /// Coastlines for the LOD, falling back to coarser data
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let candidates = match lod {
            Lod::High => [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low],
            Lod::Medium => [&self.coastlines_medium, &self.coastlines_low, &self.coastlines_low],
            Lod::Low => [&self.coastlines_low, &self.coastlines_medium, &self.coastlines_high],
        };
        candidates
            .into_iter()
            .find(|lines| !lines.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => &self.borders_high,
            _ => &self.borders_medium,
        }
    }

    /// Render outlines and bubbles. The two layers are independent so they are
    /// drawn in parallel.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        markers: &[Marker],
        metric: MetricKind,
        selected: Option<&CountryRecord>,
    ) -> MapLayers {
        let (land, (bubbles, highlight, labels)) = rayon::join(
            || self.render_land(width, height, viewport),
            || self.render_bubbles(width, height, viewport, markers, metric, selected),
        );

        MapLayers {
            land,
            bubbles,
            highlight,
            labels,
        }
    }

    fn render_land(&self, width: usize, height: usize, viewport: &Viewport) -> BrailleCanvas {
        let mut canvas = BrailleCanvas::new(width, height);
        let lod = Lod::from_zoom(viewport.zoom);

        for line in self.coastlines(lod) {
            draw_linestring(&mut canvas, line, viewport);
        }
        if self.settings.show_borders {
            for line in self.borders(lod) {
                draw_linestring(&mut canvas, line, viewport);
            }
        }
        canvas
    }

    fn render_bubbles(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        markers: &[Marker],
        metric: MetricKind,
        selected: Option<&CountryRecord>,
    ) -> (BrailleCanvas, BrailleCanvas, Vec<(u16, u16, String)>) {
        let mut bubbles = BrailleCanvas::new(width, height);
        let mut highlight = BrailleCanvas::new(width, height);
        let mut labels = Vec::new();

        if !self.settings.show_bubbles {
            return (bubbles, highlight, labels);
        }

        for marker in markers {
            let (px, py) = viewport.project(marker.lon, marker.lat);
            if !viewport.is_visible(px, py) {
                continue;
            }

            let is_selected = selected.is_some_and(|country| country.is_country(marker.code.as_deref(), &marker.name));
            let Some(radius) = bubble_radius(marker.value, marker.lat, metric, viewport) else {
                continue;
            };

            let target = if is_selected { &mut highlight } else { &mut bubbles };
            if radius <= FILLED_BUBBLE_RADIUS {
                draw_circle(target, px, py, radius);
            } else {
                draw_ring(target, px, py, radius);
            }

            if is_selected && self.settings.show_labels && px >= 0 && py >= 0 {
                let char_x = (px / 2) as u16;
                let char_y = (py / 4) as u16;
                if let Some(label_x) = char_x.checked_add(2) {
                    labels.push((label_x, char_y, marker.name.clone()));
                }
            }
        }

        (bubbles, highlight, labels)
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_bubbles(&mut self) {
        self.settings.show_bubbles = !self.settings.show_bubbles;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;
    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Skip segments that wrap around the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }
        prev = Some((px, py));
    }
}
