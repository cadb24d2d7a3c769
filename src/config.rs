use crate::api::DEFAULT_BASE_URL;
use crate::model::Scope;
use crate::selection::DEFAULT_HISTORY_DAYS;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Terminal COVID-19 dashboard backed by the disease.sh API
#[derive(Parser, Debug, Clone)]
#[command(name = "covid-tui", version, about)]
pub struct Args {
    /// Base URL of the disease.sh compatible API
    #[arg(long, env = "COVID_TUI_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Directory holding Natural Earth GeoJSON outlines
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: u64,

    /// Days of worldwide history for the trend graph
    #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS, value_parser = clap::value_parser!(u32).range(2..=2000))]
    pub history_days: u32,

    /// Log file (the terminal is taken by the UI); defaults to covid-tui.log in the temp dir
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Country code or name to select once the dashboard is up
    #[arg(long)]
    pub country: Option<String>,
}

impl Args {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("covid-tui.log"))
    }

    /// Scope requested on the command line, if it is not worldwide
    pub fn initial_scope(&self) -> Option<Scope> {
        let scope: Scope = self.country.as_deref()?.parse().ok()?;
        (!scope.is_worldwide()).then_some(scope)
    }
}
