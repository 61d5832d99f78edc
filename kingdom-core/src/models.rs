use crate::error::{KingdomError, Result};
use serde::{Deserialize, Serialize};

/// One (product, condition) row scraped from the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CardPrice {
    pub name: String,
    pub edition: String,
    /// Grade label as printed by the catalog, e.g. "NM", "EX", "VG", "G"
    pub condition: String,
    pub is_foil: bool,
    pub price: f64,
    pub stock: u32,
    /// Fields that failed to parse and were defaulted to zero
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
}

impl CardPrice {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "field", rename_all = "lowercase")]
pub enum FieldIssue {
    Price { raw: String },
    Stock { raw: String },
}

impl FieldIssue {
    pub fn field(&self) -> &'static str {
        match self {
            FieldIssue::Price { .. } => "price",
            FieldIssue::Stock { .. } => "stock",
        }
    }
}

/// What to do with a listing whose price or stock could not be read.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Keep the listing with the field zeroed and the issue attached
    #[default]
    Lenient,
    /// Drop the listing
    Strict,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FoilFilter {
    #[default]
    Any,
    FoilOnly,
    NonFoilOnly,
}

impl FoilFilter {
    /// Map the optional `is_foil` flag: absent means any finish.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => FoilFilter::Any,
            Some(true) => FoilFilter::FoilOnly,
            Some(false) => FoilFilter::NonFoilOnly,
        }
    }

    pub fn admits(self, is_foil: bool) -> bool {
        match self {
            FoilFilter::Any => true,
            FoilFilter::FoilOnly => is_foil,
            FoilFilter::NonFoilOnly => !is_foil,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: String,
    #[serde(default)]
    pub set_code: Option<String>,
    #[serde(default)]
    pub foil: FoilFilter,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub parse_policy: ParsePolicy,
}

impl SearchOptions {
    /// Build options for `query`; blank queries are rejected.
    pub fn new(query: &str) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KingdomError::InvalidInput("query must not be empty".to_string()));
        }
        Ok(Self {
            query: query.to_string(),
            set_code: None,
            foil: FoilFilter::Any,
            variant: None,
            parse_policy: ParsePolicy::Lenient,
        })
    }

    pub fn with_set_code(mut self, code: Option<String>) -> Self {
        self.set_code = code.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_foil(mut self, foil: FoilFilter) -> Self {
        self.foil = foil;
        self
    }

    pub fn with_variant(mut self, variant: Option<String>) -> Self {
        self.variant = variant.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }
}

/// One entry of the set reference list (`code` is the unique key).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SetEntry {
    pub code: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_is_rejected() {
        assert!(matches!(SearchOptions::new("   "), Err(KingdomError::InvalidInput(_))));
        assert_eq!(SearchOptions::new(" Lightning Bolt ").unwrap().query, "Lightning Bolt");
    }

    #[test]
    fn foil_flag_is_tri_state() {
        assert_eq!(FoilFilter::from_flag(None), FoilFilter::Any);
        assert!(FoilFilter::from_flag(Some(true)).admits(true));
        assert!(!FoilFilter::from_flag(Some(true)).admits(false));
        assert!(FoilFilter::from_flag(Some(false)).admits(false));
        assert!(!FoilFilter::from_flag(Some(false)).admits(true));
        assert!(FoilFilter::Any.admits(true) && FoilFilter::Any.admits(false));
    }

    #[test]
    fn empty_optional_filters_are_dropped() {
        let o = SearchOptions::new("Bolt")
            .unwrap()
            .with_set_code(Some(" ".into()))
            .with_variant(Some(String::new()));
        assert_eq!(o.set_code, None);
        assert_eq!(o.variant, None);
    }
}
