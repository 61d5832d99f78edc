use crate::config::Config;
use crate::error::{KingdomError, Result};
use crate::models::{FoilFilter, SearchOptions};
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::OnceLock;
use std::time::Duration;

/// Retrieves one catalog page.
pub trait CatalogFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Search URL for `opts` on the catalog endpoint `base`:
/// `filter[name]=<query>` always, plus `filter[foil]=1` for foil-only searches.
pub fn build_search_url(base: &str, opts: &SearchOptions) -> Result<String> {
    let mut url = url::Url::parse(base)
        .map_err(|e| KingdomError::InvalidInput(format!("bad catalog url {}: {}", base, e)))?;
    url.query_pairs_mut().append_pair("filter[name]", &opts.query);
    if opts.foil == FoilFilter::FoilOnly {
        url.query_pairs_mut().append_pair("filter[foil]", "1");
    }
    Ok(url.to_string())
}

fn challenge_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(cf-browser-verification|cf_chl_|<title>\s*just a moment|attention required!\s*\|\s*cloudflare)",
        )
        .expect("challenge pattern")
    })
}

/// True when `body` looks like an anti-automation interstitial rather than a
/// results page. Only interstitial markers count: Cloudflare injects its
/// detection script and captcha widgets into ordinary pages too. Pages that
/// still carry product rows are never flagged.
pub fn is_challenge_page(body: &str) -> bool {
    !body.contains("product-row") && challenge_re().is_match(body)
}

/// Plain blocking GET against the live catalog.
pub struct HttpCatalog {
    client: Client,
}

impl HttpCatalog {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .build()
            .map_err(KingdomError::HttpClient)?;
        Ok(Self { client })
    }
}

impl CatalogFetcher for HttpCatalog {
    fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .map_err(|source| KingdomError::Fetch { url: url.to_string(), source })?;
        let status = resp.status();
        if !status.is_success() {
            log::warn!("catalog answered {} for {}", status, url);
        }
        let body = resp
            .text()
            .map_err(|source| KingdomError::Fetch { url: url.to_string(), source })?;
        if is_challenge_page(&body) {
            log::warn!("bot-check interstitial at {}", url);
            return Err(KingdomError::Blocked { url: url.to_string() });
        }
        Ok(body)
    }
}
