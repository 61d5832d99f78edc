use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a string for loose matching: NFKD, drop accents, lower-case, and
/// collapse every run of non-alphanumerics to a single space.
pub fn fold(s: &str) -> String {
    let t: String = s
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    t.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case- and punctuation-insensitive substring test. A needle with nothing
/// alphanumeric (e.g. "()" or "★") is matched literally, ignoring case.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    let folded = fold(needle);
    if folded.is_empty() {
        let needle = needle.trim().to_lowercase();
        return needle.is_empty() || haystack.to_lowercase().contains(&needle);
    }
    fold(haystack).contains(&folded)
}

/// Trim and collapse internal whitespace (HTML text nodes carry newlines and indentation).
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a "price stock" blurb on its first whitespace boundary.
/// The stock part is the first token after the price, so "$1.00 5 available" yields ("$1.00", "5").
pub fn split_price_stock(text: &str) -> (&str, &str) {
    let t = text.trim();
    match t.split_once(char::is_whitespace) {
        Some((price, rest)) => (price, rest.split_whitespace().next().unwrap_or("")),
        None => (t, ""),
    }
}

/// Parse a price token such as "$7,999.99": currency symbols and thousands
/// separators are discarded before the decimal parse.
pub fn parse_price(token: &str) -> Option<f64> {
    let digits: String = token.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_stock(token: &str) -> Option<u32> {
    token.trim().trim_end_matches(',').parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_ignores_case_accents_and_punctuation() {
        assert_eq!(fold("  Strixhaven: School of Mages "), "strixhaven school of mages");
        assert_eq!(fold("Pokémon"), "pokemon");
        assert!(contains_folded("Modern Horizons 2 (Foil Etched)", "modern horizons 2"));
        assert!(!contains_folded("Kaladesh", "Modern Horizons 2"));
    }

    #[test]
    fn symbol_only_needle_matches_literally() {
        assert!(!contains_folded("Lightning Bolt", "()"));
        assert!(contains_folded("Lightning Bolt ()", "()"));
        assert!(!contains_folded("Lightning Bolt", "★"));
        assert!(contains_folded("Lightning Bolt ★ Promo", "★"));
    }

    #[test]
    fn split_price_stock_takes_first_token_after_price() {
        assert_eq!(split_price_stock("$7,999.99 1"), ("$7,999.99", "1"));
        assert_eq!(split_price_stock("  $1.00\n   5 available "), ("$1.00", "5"));
        assert_eq!(split_price_stock("$3.50"), ("$3.50", ""));
    }

    #[test]
    fn parse_price_strips_currency_and_separators() {
        assert_eq!(parse_price("$7,999.99"), Some(7999.99));
        assert_eq!(parse_price("$10.00"), Some(10.0));
        assert_eq!(parse_price("$"), None);
        assert_eq!(parse_price("1.2.3"), None);
    }

    #[test]
    fn parse_stock_rejects_non_numeric() {
        assert_eq!(parse_stock("5"), Some(5));
        assert_eq!(parse_stock("many"), None);
        assert_eq!(parse_stock(""), None);
    }
}
