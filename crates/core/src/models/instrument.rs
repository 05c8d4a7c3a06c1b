use serde::{Deserialize, Serialize};

/// A tradable security or fund.
///
/// `code` is what the upstream source understands (e.g. "005930.KS", "AAPL");
/// `name` is the display name and doubles as the column key in every
/// [`PriceTable`](super::price::PriceTable) and the key of the
/// [`VisibilityState`](super::visibility::VisibilityState).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instrument {
    pub code: String,
    pub name: String,
}

impl Instrument {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// A named group of instruments presented together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Category {
    /// Stable identifier used for selection and cache keys (e.g. "stocks").
    pub key: String,

    /// Human-readable label (e.g. "Individual Stocks").
    pub label: String,

    /// Instruments in display order.
    pub instruments: Vec<Instrument>,
}

impl Category {
    pub fn new(key: impl Into<String>, label: impl Into<String>, instruments: Vec<Instrument>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            instruments,
        }
    }

    /// Display names in configured order.
    pub fn names(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.name.as_str()).collect()
    }
}

/// Static registry of categories, in configured order.
///
/// Built from an already validated [`AppConfig`](super::settings::AppConfig);
/// it never changes for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRegistry {
    categories: Vec<Category>,
}

impl InstrumentRegistry {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn first(&self) -> Option<&Category> {
        self.categories.first()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.category(key).is_some()
    }

    /// Every display name across all categories, first occurrence wins.
    pub fn all_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.categories
            .iter()
            .flat_map(|c| c.instruments.iter())
            .filter(|i| seen.insert(i.name.as_str()))
            .map(|i| i.name.clone())
            .collect()
    }
}
