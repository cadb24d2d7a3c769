use super::validate;
use super::CovidSource;
use crate::error::{FetchError, FetchResult};
use crate::history::Timeline;
use crate::model::CountryRecord;
use anyhow::{Context, Result};
use reqwest::blocking;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://disease.sh";

/// Blocking HTTP client for the disease.sh v3 API
pub struct Client {
    http: blocking::Client,
    base: Url,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid API url `{base_url}`"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("API url `{base_url}` cannot be used as a base");
        }

        let http = blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("covid-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        info!(%base, ?timeout, "API client ready");
        Ok(Self { http, base })
    }

    /// Build `{base}/v3/covid-19/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["v3", "covid-19"]).extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> FetchResult<Vec<u8>> {
        debug!(%url, "GET");
        let response = self.http.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {} from {url}", status.as_u16())));
        }
        Ok(response.bytes()?.to_vec())
    }
}

impl CovidSource for Client {
    fn worldwide(&self) -> FetchResult<CountryRecord> {
        let mut body = self.get(self.endpoint(&["all"]))?;
        validate::parse_totals(&mut body)
    }

    fn countries(&self) -> FetchResult<Vec<CountryRecord>> {
        let mut body = self.get(self.endpoint(&["countries"]))?;
        validate::parse_countries(&mut body)
    }

    fn country(&self, code: &str) -> FetchResult<CountryRecord> {
        let mut body = self.get(self.endpoint(&["countries", code]))?;
        validate::parse_country(&mut body)
    }

    fn historical(&self, days: u32) -> FetchResult<Timeline> {
        let mut url = self.endpoint(&["historical", "all"]);
        url.query_pairs_mut().append_pair("lastdays", &days.to_string());
        let mut body = self.get(url)?;
        validate::parse_history(&mut body)
    }
}
