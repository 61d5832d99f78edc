//! Listing extraction from a catalog search page.
//!
//! A product block looks like:
//!
//! ```html
//! <div class="product-row">
//!   <span class="productDetailTitle">Lightning Bolt (Foil)</span>
//!   <div class="productDetailSet">Magic 2010</div>
//!   <ul class="conditions"><li>NM</li><li>EX</li></ul>
//!   <ul class="price-stock"><li>$9.99 4</li><li>Out of stock</li></ul>
//! </div>
//! ```
//!
//! The two lists are parallel: the i-th condition is priced by the i-th blurb.

use crate::models::{CardPrice, FieldIssue, ParsePolicy, SearchOptions};
use crate::text_utils::{contains_folded, normalize_ws, parse_price, parse_stock, split_price_stock};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

const OUT_OF_STOCK: &str = "out of stock";

struct Selectors {
    product: Selector,
    title: Selector,
    edition: Selector,
    condition: Selector,
    price_stock: Selector,
}

fn selectors() -> &'static Selectors {
    static SEL: OnceLock<Selectors> = OnceLock::new();
    SEL.get_or_init(|| {
        let parse = |s: &str| Selector::parse(s).expect("static selector");
        Selectors {
            product: parse(".product-row"),
            title: parse(".productDetailTitle"),
            edition: parse(".productDetailSet"),
            condition: parse("ul.conditions > li"),
            price_stock: parse("ul.price-stock > li"),
        }
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text(block: &ElementRef<'_>, sel: &Selector) -> String {
    block.select(sel).next().map(element_text).unwrap_or_default()
}

/// Extract every listing that survives the filters in `opts`, in document
/// order. `set_name` is the resolved display name of `opts.set_code`; `None`
/// disables set filtering.
pub fn extract_listings(html: &str, opts: &SearchOptions, set_name: Option<&str>) -> Vec<CardPrice> {
    let doc = Html::parse_document(html);
    let sel = selectors();
    let mut out = Vec::new();
    let mut blocks = 0usize;

    for block in doc.select(&sel.product) {
        blocks += 1;
        let name = first_text(&block, &sel.title);
        let edition = first_text(&block, &sel.edition);

        if let Some(target) = set_name {
            if !contains_folded(&edition, target) {
                continue;
            }
        }
        let is_foil = contains_folded(&name, "foil") || contains_folded(&edition, "foil");
        if !opts.foil.admits(is_foil) {
            continue;
        }
        if let Some(variant) = opts.variant.as_deref() {
            if !contains_folded(&name, variant) {
                continue;
            }
        }

        let conditions: Vec<String> = block.select(&sel.condition).map(element_text).collect();
        let blurbs: Vec<String> = block.select(&sel.price_stock).map(element_text).collect();
        if conditions.len() != blurbs.len() {
            log::debug!("{}: {} conditions vs {} price rows", name, conditions.len(), blurbs.len());
        }

        for (i, condition) in conditions.into_iter().enumerate() {
            let Some(blurb) = blurbs.get(i) else { continue };
            let listing = parse_listing(&name, &edition, condition, is_foil, blurb);
            if let Some(listing) = listing {
                if opts.parse_policy == ParsePolicy::Strict && !listing.is_complete() {
                    log::debug!("dropping {} {}: {:?}", listing.name, listing.condition, listing.issues);
                    continue;
                }
                out.push(listing);
            }
        }
    }
    log::debug!("{} product blocks, {} listings kept", blocks, out.len());
    out
}

/// Distinct edition names on the page, in document order.
pub fn page_editions(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let sel = selectors();
    let mut editions: Vec<String> = Vec::new();
    for block in doc.select(&sel.product) {
        let edition = first_text(&block, &sel.edition);
        if !edition.is_empty() && !editions.contains(&edition) {
            editions.push(edition);
        }
    }
    editions
}

/// One listing from a condition label and its price/stock blurb. `None` when
/// the row is empty or out of stock; unparsable fields become zero with an issue.
fn parse_listing(name: &str, edition: &str, condition: String, is_foil: bool, blurb: &str) -> Option<CardPrice> {
    if blurb.is_empty() || contains_folded(blurb, OUT_OF_STOCK) {
        return None;
    }
    let (price_tok, stock_tok) = split_price_stock(blurb);
    let mut issues = Vec::new();
    let price = parse_price(price_tok).unwrap_or_else(|| {
        issues.push(FieldIssue::Price { raw: price_tok.to_string() });
        0.0
    });
    let stock = parse_stock(stock_tok).unwrap_or_else(|| {
        issues.push(FieldIssue::Stock { raw: stock_tok.to_string() });
        0
    });
    Some(CardPrice {
        name: name.to_string(),
        edition: edition.to_string(),
        condition,
        is_foil,
        price,
        stock,
        issues,
    })
}
