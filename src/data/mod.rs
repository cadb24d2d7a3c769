//! Natural Earth outlines for the map background.

use crate::map::{LineString, Lod, MapRenderer};
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outline layer a GeoJSON file feeds
#[derive(Clone, Copy, Debug)]
enum Layer {
    Coastline,
    Border,
}

const OUTLINE_FILES: [(&str, Layer, Lod); 6] = [
    ("ne_110m_coastline.json", Layer::Coastline, Lod::Low),
    ("natural-earth.json", Layer::Coastline, Lod::Medium),
    ("ne_50m_coastline.json", Layer::Coastline, Lod::Medium),
    ("ne_10m_coastline.json", Layer::Coastline, Lod::High),
    ("ne_50m_borders.json", Layer::Border, Lod::Medium),
    ("ne_10m_borders.json", Layer::Border, Lod::High),
];

/// Load every known outline file present in `data_dir`. Missing files are
/// skipped; unreadable ones are logged and skipped. Returns how many loaded.
pub fn load_all_geojson(renderer: &mut MapRenderer, data_dir: &Path) -> usize {
    let mut loaded = 0;

    for (filename, layer, lod) in OUTLINE_FILES {
        let path = data_dir.join(filename);
        if !path.exists() {
            continue;
        }
        match load_lines(&path) {
            Ok(lines) => {
                info!(file = filename, ?layer, ?lod, lines = lines.len(), "loaded outlines");
                for line in lines {
                    match layer {
                        Layer::Coastline => renderer.add_coastline(line, lod),
                        Layer::Border => renderer.add_border(line, lod),
                    }
                }
                loaded += 1;
            }
            Err(e) => warn!(file = filename, error = %e, "failed to load outlines"),
        }
    }

    loaded
}

fn load_lines(path: &Path) -> Result<Vec<LineString>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content
        .parse()
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(geojson_lines(&geojson))
}

/// Every line in a GeoJSON document. Polygons contribute their exterior ring.
pub fn geojson_lines(geojson: &GeoJson) -> Vec<LineString> {
    let mut lines = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
                geometry_lines(geometry, &mut lines);
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                geometry_lines(geometry, &mut lines);
            }
        }
        GeoJson::Geometry(geometry) => geometry_lines(geometry, &mut lines),
    }
    lines
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

fn geometry_lines(geometry: &Geometry, out: &mut Vec<LineString>) {
    match &geometry.value {
        Value::LineString(coords) => out.push(to_line(coords)),
        Value::MultiLineString(lines) => out.extend(lines.iter().map(|l| to_line(l))),
        Value::Polygon(rings) => out.extend(rings.first().map(|r| to_line(r))),
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().filter_map(|rings| rings.first()).map(|r| to_line(r)))
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                geometry_lines(g, out);
            }
        }
        _ => {}
    }
}

/// Simplified continent outlines used when no data files are available
const SIMPLE_WORLD: [&[(f64, f64)]; 7] = [
    // North America
    &[
        (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-130.0, 55.0), (-125.0, 48.0),
        (-124.0, 40.0), (-117.0, 32.0), (-110.0, 25.0), (-97.0, 25.0), (-97.0, 28.0),
        (-82.0, 24.0), (-80.0, 25.0), (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0),
        (-67.0, 45.0), (-65.0, 47.0), (-55.0, 47.0), (-52.0, 47.0), (-55.0, 52.0),
        (-58.0, 55.0), (-64.0, 60.0), (-73.0, 62.0), (-80.0, 63.0), (-95.0, 62.0),
        (-110.0, 68.0), (-130.0, 70.0), (-145.0, 70.0), (-168.0, 65.0),
    ],
    // South America
    &[
        (-80.0, 10.0), (-75.0, 5.0), (-70.0, 5.0), (-60.0, 5.0), (-50.0, 0.0),
        (-35.0, -5.0), (-35.0, -10.0), (-38.0, -15.0), (-40.0, -22.0), (-48.0, -25.0),
        (-55.0, -34.0), (-58.0, -38.0), (-65.0, -42.0), (-68.0, -50.0), (-75.0, -52.0),
        (-75.0, -45.0), (-72.0, -40.0), (-72.0, -30.0), (-70.0, -20.0), (-70.0, -15.0),
        (-80.0, -5.0), (-80.0, 0.0), (-80.0, 10.0),
    ],
    // Europe
    &[
        (-10.0, 36.0), (-5.0, 36.0), (0.0, 38.0), (5.0, 43.0), (10.0, 44.0),
        (15.0, 45.0), (20.0, 40.0), (25.0, 37.0), (30.0, 40.0), (35.0, 42.0),
        (40.0, 43.0), (40.0, 55.0), (30.0, 60.0), (25.0, 65.0), (20.0, 70.0),
        (10.0, 71.0), (5.0, 62.0), (5.0, 58.0), (-5.0, 58.0), (-10.0, 52.0),
        (-5.0, 48.0), (-5.0, 43.0), (-10.0, 36.0),
    ],
    // Southern Africa
    &[
        (-17.0, 15.0), (-15.0, 10.0), (-10.0, 5.0), (0.0, 5.0), (10.0, 5.0),
        (15.0, 0.0), (20.0, -5.0), (25.0, -10.0), (35.0, -20.0), (35.0, -25.0),
        (30.0, -30.0), (20.0, -35.0), (18.0, -35.0), (15.0, -30.0), (10.0, -15.0),
        (10.0, 0.0), (5.0, 5.0), (-5.0, 5.0), (-10.0, 10.0), (-17.0, 15.0),
    ],
    // Northern Africa
    &[
        (-17.0, 15.0), (-17.0, 20.0), (-15.0, 28.0), (-5.0, 35.0), (10.0, 37.0),
        (20.0, 33.0), (25.0, 32.0), (35.0, 30.0), (35.0, 20.0), (42.0, 12.0),
        (50.0, 12.0), (45.0, 5.0), (35.0, -5.0), (35.0, -20.0),
    ],
    // Asia
    &[
        (35.0, 42.0), (40.0, 43.0), (50.0, 40.0), (55.0, 37.0), (60.0, 25.0),
        (65.0, 25.0), (70.0, 20.0), (75.0, 15.0), (80.0, 8.0), (80.0, 15.0),
        (88.0, 22.0), (92.0, 22.0), (95.0, 16.0), (100.0, 14.0), (105.0, 10.0),
        (110.0, 20.0), (115.0, 22.0), (120.0, 22.0), (122.0, 25.0), (125.0, 30.0),
        (130.0, 35.0), (135.0, 35.0), (140.0, 40.0), (145.0, 45.0), (145.0, 50.0),
        (140.0, 55.0), (135.0, 55.0), (130.0, 52.0), (130.0, 43.0), (120.0, 40.0),
        (110.0, 45.0), (90.0, 50.0), (70.0, 55.0), (60.0, 55.0), (50.0, 50.0),
        (40.0, 43.0),
    ],
    // Australia
    &[
        (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0), (145.0, -15.0),
        (150.0, -25.0), (153.0, -30.0), (150.0, -35.0), (145.0, -38.0), (140.0, -38.0),
        (135.0, -35.0), (130.0, -32.0), (125.0, -32.0), (115.0, -35.0), (115.0, -25.0),
        (115.0, -20.0),
    ],
];

/// Fill the low-detail coastline layer with built-in continent outlines
pub fn generate_simple_world(renderer: &mut MapRenderer) {
    for outline in SIMPLE_WORLD {
        renderer.add_coastline(outline.to_vec(), Lod::Low);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_lines_and_polygon_rings() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]], [[0.2, 0.2], [0.3, 0.2], [0.2, 0.2]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [5, 5]}}
            ]
        }"#;
        let geojson: GeoJson = doc.parse().unwrap();
        let lines = geojson_lines(&geojson);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(lines[1].len(), 4);
    }

    #[test]
    fn simple_world_provides_low_detail_outlines() {
        let mut renderer = MapRenderer::new();
        assert!(!renderer.has_data());
        generate_simple_world(&mut renderer);
        assert!(renderer.has_data());
        assert_eq!(renderer.coastlines_low.len(), SIMPLE_WORLD.len());
    }

    #[test]
    fn missing_data_dir_loads_nothing() {
        let mut renderer = MapRenderer::new();
        let loaded = load_all_geojson(&mut renderer, Path::new("/nonexistent/covid-tui-data"));
        assert_eq!(loaded, 0);
        assert!(!renderer.has_data());
    }
}
