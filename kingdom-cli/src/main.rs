use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kingdom_core::{format_listings, Config, FoilFilter, ParsePolicy, PriceSearch, SearchOptions, SetResolver};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kingdom", version, about = "Card Kingdom price lookup")]
struct Cli {
    /// Directory holding the set-list cache (default: system temp dir)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Catalog search endpoint
    #[arg(long, global = true)]
    catalog_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search prices for a card
    Search(SearchCmd),
    /// Print the display name for a set code
    SetName {
        code: String,
    },
    /// Download the set list and rewrite the cache file
    RefreshSets,
}

#[derive(Args, Debug)]
struct SearchCmd {
    /// Card name
    query: String,
    /// Set code filter (e.g. MH2)
    #[arg(long = "set")]
    set_code: Option<String>,
    /// Foil printings only
    #[arg(long, conflicts_with = "non_foil")]
    foil: bool,
    /// Non-foil printings only
    #[arg(long)]
    non_foil: bool,
    /// Variant filter matched against the product name (e.g. Borderless)
    #[arg(long)]
    variant: Option<String>,
    /// Drop listings whose price or stock could not be read
    #[arg(long)]
    strict: bool,
    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

impl SearchCmd {
    fn options(&self) -> Result<SearchOptions> {
        let foil = match (self.foil, self.non_foil) {
            (true, _) => FoilFilter::FoilOnly,
            (_, true) => FoilFilter::NonFoilOnly,
            _ => FoilFilter::Any,
        };
        let policy = if self.strict { ParsePolicy::Strict } else { ParsePolicy::Lenient };
        Ok(SearchOptions::new(&self.query)?
            .with_set_code(self.set_code.clone())
            .with_foil(foil)
            .with_variant(self.variant.clone())
            .with_parse_policy(policy))
    }
}

fn config_for(cli: &Cli) -> Config {
    let mut c = Config::from_env();
    if let Some(d) = &cli.cache_dir { c.cache_dir = d.clone(); }
    if let Some(u) = &cli.catalog_url { c.catalog_url = u.clone(); }
    if let Some(t) = cli.timeout_secs { c.timeout = std::time::Duration::from_secs(t); }
    c
}

fn main() -> Result<()> {
    let level = if kingdom_core::config::debug_enabled() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let cli = Cli::parse();
    let config = config_for(&cli);
    match &cli.command {
        Commands::Search(cmd) => {
            let opts = cmd.options()?;
            let search = PriceSearch::from_config(&config)?;
            let prices = search.search(&opts).with_context(|| format!("searching {:?}", opts.query))?;
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&prices)?);
            } else {
                print!("{}", format_listings(&opts.query, &prices));
                if prices.is_empty() { println!(); }
            }
        }
        Commands::SetName { code } => {
            let resolver = SetResolver::from_config(&config)?;
            match resolver.resolve(code) {
                Some(name) => println!("{}", name),
                None => {
                    eprintln!("set code {} not found ({} sets known)", code, resolver.len());
                    std::process::exit(1);
                }
            }
        }
        Commands::RefreshSets => {
            let resolver = SetResolver::from_config(&config)?;
            let n = resolver.refresh_cache()?;
            println!("{} sets written to {}", n, resolver.cache_path().display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_flags_map_to_options() {
        let cli = Cli::parse_from(["kingdom", "search", "Lightning Bolt", "--set", "m10", "--foil", "--strict"]);
        let Commands::Search(cmd) = &cli.command else { panic!("expected search") };
        let o = cmd.options().unwrap();
        assert_eq!(o.query, "Lightning Bolt");
        assert_eq!(o.set_code.as_deref(), Some("m10"));
        assert_eq!(o.foil, FoilFilter::FoilOnly);
        assert_eq!(o.parse_policy, ParsePolicy::Strict);
    }

    #[test]
    fn foil_flags_conflict() {
        assert!(Cli::try_parse_from(["kingdom", "search", "Bolt", "--foil", "--non-foil"]).is_err());
        let cli = Cli::parse_from(["kingdom", "search", "Bolt", "--non-foil"]);
        let Commands::Search(cmd) = &cli.command else { panic!("expected search") };
        assert_eq!(cmd.options().unwrap().foil, FoilFilter::NonFoilOnly);
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::parse_from(["kingdom", "--cache-dir", "/tmp/k", "set-name", "mh2"]);
        let c = config_for(&cli);
        assert_eq!(c.sets_cache_path(), PathBuf::from("/tmp/k/scryfall_sets.json"));
    }
}
