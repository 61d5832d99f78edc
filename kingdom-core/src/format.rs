use crate::models::CardPrice;

pub fn no_results(query: &str) -> String {
    format!("No prices found for {}", query)
}

/// `- Name: <Name>[ (Foil)], Set: <Edition>, Condition: <Condition>, Price: $<0.00>, Stock: <n>`
pub fn format_listing(p: &CardPrice) -> String {
    let foil = if p.is_foil { " (Foil)" } else { "" };
    let mut line = format!(
        "- Name: {}{}, Set: {}, Condition: {}, Price: ${:.2}, Stock: {}",
        p.name, foil, p.edition, p.condition, p.price, p.stock
    );
    if !p.issues.is_empty() {
        let fields: Vec<&str> = p.issues.iter().map(|i| i.field()).collect();
        line.push_str(&format!(" [unparsed: {}]", fields.join(", ")));
    }
    line
}

/// Text block for a whole result set; the no-results message when empty.
pub fn format_listings(query: &str, prices: &[CardPrice]) -> String {
    if prices.is_empty() {
        return no_results(query);
    }
    let mut out = format!("Prices for {}:\n", query);
    for p in prices {
        out.push_str(&format_listing(p));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldIssue;

    fn price(name: &str, is_foil: bool, price: f64) -> CardPrice {
        CardPrice {
            name: name.into(),
            edition: "Magic 2010".into(),
            condition: "NM".into(),
            is_foil,
            price,
            stock: 3,
            issues: Vec::new(),
        }
    }

    #[test]
    fn listing_line_layout() {
        assert_eq!(
            format_listing(&price("Lightning Bolt", true, 7999.99)),
            "- Name: Lightning Bolt (Foil), Set: Magic 2010, Condition: NM, Price: $7999.99, Stock: 3"
        );
        assert_eq!(
            format_listing(&price("Lightning Bolt", false, 10.0)),
            "- Name: Lightning Bolt, Set: Magic 2010, Condition: NM, Price: $10.00, Stock: 3"
        );
    }

    #[test]
    fn issues_are_flagged() {
        let mut p = price("Sol Ring", false, 0.0);
        p.issues.push(FieldIssue::Price { raw: "call".into() });
        assert!(format_listing(&p).ends_with("Stock: 3 [unparsed: price]"));
    }

    #[test]
    fn block_has_header_and_one_line_per_listing() {
        let text = format_listings("Bolt", &[price("A", false, 1.0), price("B", false, 2.0)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Prices for Bolt:");
        assert!(lines[1..].iter().all(|l| l.starts_with("- Name: ")));
    }

    #[test]
    fn empty_result_is_no_results_message() {
        assert_eq!(format_listings("Zzyzx", &[]), "No prices found for Zzyzx");
    }
}
