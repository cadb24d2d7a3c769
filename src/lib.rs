//! Terminal COVID-19 dashboard: summary cards, a Braille world map with
//! per-country bubbles, a ranked table and a daily trend graph, fed by the
//! disease.sh REST API.

pub mod aggregate;
pub mod api;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod history;
pub mod map;
pub mod model;
pub mod selection;
pub mod selector;
pub mod ui;
