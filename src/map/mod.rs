mod geometry;
mod projection;
mod renderer;

pub use projection::Viewport;
pub use renderer::{bubble_radius, DisplaySettings, LineString, Lod, MapLayers, MapRenderer};
