//! Set code → set name resolution.
//!
//! The mapping is loaded once per [`SetResolver`], from a JSON cache file when
//! it is younger than [`CACHE_MAX_AGE`], otherwise from a [`SetSource`] (the
//! Scryfall `/sets` endpoint in production). Any failure degrades to an empty
//! mapping: lookups then report "not found" and callers search without a set
//! filter.

use crate::config::Config;
use crate::error::{KingdomError, Result};
use crate::models::SetEntry;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

pub const CACHE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Where the full reference list comes from when the cache is unusable.
pub trait SetSource: Send + Sync {
    fn fetch_sets(&self) -> Result<Vec<SetEntry>>;
}

/// Scryfall answers with `{"data": [{"code": "mh2", "name": "Modern Horizons 2", ...}, ...]}`.
#[derive(Deserialize)]
struct SetsResponse {
    data: Vec<SetEntry>,
}

pub struct ScryfallSets {
    client: Client,
    url: String,
}

impl ScryfallSets {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kingdom-mcp/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .build()
            .map_err(KingdomError::HttpClient)?;
        Ok(Self { client, url: config.sets_url.clone() })
    }
}

impl SetSource for ScryfallSets {
    fn fetch_sets(&self) -> Result<Vec<SetEntry>> {
        log::info!("fetching set list from {}", self.url);
        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .map_err(|source| KingdomError::Fetch { url: self.url.clone(), source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(KingdomError::SetSource(format!("{} returned {}", self.url, status)));
        }
        let body = resp
            .text()
            .map_err(|source| KingdomError::Fetch { url: self.url.clone(), source })?;
        decode_remote(&body)
    }
}

/// Decode the wrapped remote payload.
pub fn decode_remote(body: &str) -> Result<Vec<SetEntry>> {
    let parsed: SetsResponse = serde_json::from_str(body)?;
    Ok(parsed.data)
}

/// Read the cache file: a bare JSON array of `{code, name}`.
pub fn load_cache(path: &Path) -> Result<Vec<SetEntry>> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Write the cache file through a sibling temp file so readers in other
/// processes never see a half-written array.
pub fn save_cache(path: &Path, entries: &[SetEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec(entries)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Age of the file by modification time; `None` when missing or the mtime is in the future.
fn cache_age(path: &Path) -> Option<Duration> {
    let meta = fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    modified.elapsed().ok()
}

fn into_map(entries: Vec<SetEntry>) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|e| (e.code.trim().to_uppercase(), e.name))
        .collect()
}

pub struct SetResolver {
    cache_path: PathBuf,
    max_age: Duration,
    source: Box<dyn SetSource>,
    sets: OnceLock<HashMap<String, String>>,
}

impl SetResolver {
    pub fn new(cache_path: PathBuf, source: Box<dyn SetSource>) -> Self {
        Self { cache_path, max_age: CACHE_MAX_AGE, source, sets: OnceLock::new() }
    }

    /// Resolver backed by Scryfall and the configured cache location.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.sets_cache_path(), Box::new(ScryfallSets::new(config)?)))
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Canonical set name for `code` ("mh2" → "Modern Horizons 2").
    pub fn resolve(&self, code: &str) -> Option<String> {
        let key = code.trim().to_uppercase();
        if key.is_empty() {
            return None;
        }
        self.sets().get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.sets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets().is_empty()
    }

    /// Force a remote fetch and rewrite the cache file. The in-memory mapping of
    /// an already-initialized resolver is left as is.
    pub fn refresh_cache(&self) -> Result<usize> {
        let entries = self.source.fetch_sets()?;
        save_cache(&self.cache_path, &entries)?;
        Ok(entries.len())
    }

    fn sets(&self) -> &HashMap<String, String> {
        self.sets.get_or_init(|| self.load())
    }

    fn load(&self) -> HashMap<String, String> {
        match cache_age(&self.cache_path) {
            Some(age) if age < self.max_age => match load_cache(&self.cache_path) {
                Ok(entries) => {
                    log::debug!("loaded {} sets from {}", entries.len(), self.cache_path.display());
                    return into_map(entries);
                }
                Err(e) => log::warn!("unreadable set cache {}: {}", self.cache_path.display(), e),
            },
            Some(age) => log::info!("set cache is stale ({}h old)", age.as_secs() / 3600),
            None => log::debug!("no set cache at {}", self.cache_path.display()),
        }

        let entries = match self.source.fetch_sets() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("failed to load sets: {}", e);
                return HashMap::new();
            }
        };
        if let Err(e) = save_cache(&self.cache_path, &entries) {
            log::warn!("could not write set cache {}: {}", self.cache_path.display(), e);
        }
        into_map(entries)
    }
}
