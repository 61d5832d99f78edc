pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod models;
pub mod sets;
pub mod text_utils;

pub use config::Config;
pub use error::{KingdomError, Result};
pub use extract::{extract_listings, page_editions};
pub use fetch::{build_search_url, CatalogFetcher, HttpCatalog};
pub use format::{format_listings, no_results};
pub use models::{CardPrice, FieldIssue, FoilFilter, ParsePolicy, SearchOptions, SetEntry};
pub use sets::{ScryfallSets, SetResolver, SetSource};

use text_utils::contains_folded;

/// Catalog search pipeline: set resolution, one page fetch, extraction.
pub struct PriceSearch {
    catalog_url: String,
    resolver: SetResolver,
    fetcher: Box<dyn CatalogFetcher>,
}

impl PriceSearch {
    pub fn new(catalog_url: impl Into<String>, resolver: SetResolver, fetcher: Box<dyn CatalogFetcher>) -> Self {
        Self { catalog_url: catalog_url.into(), resolver, fetcher }
    }

    /// Live catalog and Scryfall-backed resolver.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.catalog_url.clone(),
            SetResolver::from_config(config)?,
            Box::new(HttpCatalog::new(config)?),
        ))
    }

    pub fn resolver(&self) -> &SetResolver {
        &self.resolver
    }

    /// Listings for `opts`. A set code the resolver does not know is tried as
    /// an edition name against the page (e.g. "Commander"); failing that the
    /// search runs without a set filter. Only URL or transport problems (and
    /// bot-check pages) are errors.
    pub fn search(&self, opts: &SearchOptions) -> Result<Vec<CardPrice>> {
        let resolved = opts.set_code.as_deref().map(|code| (code, self.resolver.resolve(code)));
        let url = build_search_url(&self.catalog_url, opts)?;
        let html = self.fetcher.fetch(&url)?;

        let set_name = match resolved {
            None => None,
            Some((code, Some(name))) => {
                log::debug!("set {} -> {}", code, name);
                Some(name)
            }
            Some((raw, None)) => {
                let raw = raw.trim();
                if page_editions(&html).iter().any(|e| contains_folded(e, raw)) {
                    log::warn!("set code {} not found; matching it as an edition name", raw);
                    Some(raw.to_string())
                } else {
                    log::warn!("set code {} not found; searching all sets", raw);
                    None
                }
            }
        };
        Ok(extract_listings(&html, opts, set_name.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedPage {
        html: Option<String>,
    }

    impl CatalogFetcher for CannedPage {
        fn fetch(&self, url: &str) -> Result<String> {
            assert!(url.starts_with("https://catalog.test/search?filter%5Bname%5D="), "{}", url);
            match &self.html {
                Some(h) => Ok(h.clone()),
                None => Err(KingdomError::Blocked { url: url.to_string() }),
            }
        }
    }

    struct StaticSets;

    impl SetSource for StaticSets {
        fn fetch_sets(&self) -> Result<Vec<SetEntry>> {
            Ok(vec![SetEntry { code: "mh2".into(), name: "Modern Horizons 2".into() }])
        }
    }

    const PAGE: &str = r#"<html><body>
      <div class="product-row"><span class="productDetailTitle">Ragavan, Nimble Pilferer</span>
        <div class="productDetailSet">Modern Horizons 2</div>
        <ul class="conditions"><li>NM</li><li>EX</li></ul>
        <ul class="price-stock"><li>$54.99 3</li><li>Out of stock</li></ul></div>
      <div class="product-row"><span class="productDetailTitle">Ragavan, Nimble Pilferer</span>
        <div class="productDetailSet">Promotional</div>
        <ul class="conditions"><li>NM</li></ul>
        <ul class="price-stock"><li>$89.99 1</li></ul></div>
    </body></html>"#;

    fn search(html: Option<&str>, dir: &std::path::Path) -> PriceSearch {
        let resolver = SetResolver::new(dir.join("sets.json"), Box::new(StaticSets));
        let fetcher = CannedPage { html: html.map(str::to_string) };
        PriceSearch::new("https://catalog.test/search", resolver, Box::new(fetcher))
    }

    #[test]
    fn resolved_set_filters_results() {
        let dir = tempfile::tempdir().unwrap();
        let s = search(Some(PAGE), dir.path());
        let opts = SearchOptions::new("Ragavan").unwrap().with_set_code(Some("mh2".into()));
        let got = s.search(&opts).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].price, 54.99);
    }

    #[test]
    fn unknown_set_code_searches_unfiltered() {
        let dir = tempfile::tempdir().unwrap();
        let s = search(Some(PAGE), dir.path());
        let opts = SearchOptions::new("Ragavan").unwrap().with_set_code(Some("XYZ".into()));
        assert_eq!(s.search(&opts).unwrap().len(), 2);
    }

    #[test]
    fn unresolved_code_matching_an_edition_filters_by_edition() {
        let dir = tempfile::tempdir().unwrap();
        let s = search(Some(PAGE), dir.path());
        let opts = SearchOptions::new("Ragavan").unwrap().with_set_code(Some("promotional".into()));
        let got = s.search(&opts).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].edition, "Promotional");
        assert_eq!(got[0].price, 89.99);
    }

    #[test]
    fn fetch_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let s = search(None, dir.path());
        let err = s.search(&SearchOptions::new("Ragavan").unwrap()).unwrap_err();
        assert!(matches!(err, KingdomError::Blocked { .. }));
    }

    #[test]
    fn no_matches_formats_as_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let s = search(Some("<html><body>Your search returned no results.</body></html>"), dir.path());
        let got = s.search(&SearchOptions::new("Zzyzx").unwrap()).unwrap();
        assert!(got.is_empty());
        assert_eq!(format_listings("Zzyzx", &got), "No prices found for Zzyzx");
    }
}
