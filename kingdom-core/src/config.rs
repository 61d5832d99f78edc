use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://www.cardkingdom.com/catalog/search";
pub const DEFAULT_SETS_URL: &str = "https://api.scryfall.com/sets";
pub const SETS_CACHE_FILE: &str = "scryfall_sets.json";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Runtime settings shared by the CLI and the MCP server.
#[derive(Clone, Debug)]
pub struct Config {
    pub catalog_url: String,
    pub sets_url: String,
    pub cache_dir: PathBuf,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            sets_url: DEFAULT_SETS_URL.to_string(),
            cache_dir: std::env::temp_dir(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Defaults overridden by `KINGDOM_*` environment variables. Empty or
    /// unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut c = Config::default();
        if let Some(s) = non_empty_var("KINGDOM_CATALOG_URL") { c.catalog_url = s; }
        if let Some(s) = non_empty_var("KINGDOM_SETS_URL") { c.sets_url = s; }
        if let Some(s) = non_empty_var("KINGDOM_CACHE_DIR") { c.cache_dir = PathBuf::from(s); }
        if let Some(s) = non_empty_var("KINGDOM_USER_AGENT") { c.user_agent = s; }
        if let Some(v) = non_empty_var("KINGDOM_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            c.timeout = Duration::from_secs(v);
        }
        c
    }

    pub fn sets_cache_path(&self) -> PathBuf {
        self.cache_dir.join(SETS_CACHE_FILE)
    }
}

/// True when `KINGDOM_DEBUG` is set to a truthy value.
pub fn debug_enabled() -> bool {
    matches!(std::env::var("KINGDOM_DEBUG").ok().as_deref(), Some("1" | "true" | "yes"))
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}
