use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-instrument "shown in chart" flags for one session.
///
/// Keyed by display name across all categories. Unknown names are visible.
/// Only [`toggle`](Self::toggle) mutates it; switching categories or dates
/// leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityState {
    flags: HashMap<String, bool>,
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every given name as visible.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: names.into_iter().map(|n| (n.into(), true)).collect(),
        }
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(true)
    }

    /// Flip the flag for `name` (recording it as visible first if unseen).
    /// Returns the new value.
    pub fn toggle(&mut self, name: &str) -> bool {
        let flag = self.flags.entry(name.to_string()).or_insert(true);
        *flag = !*flag;
        *flag
    }

    /// The subset of `names` that is visible, order preserved.
    pub fn visible_of<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|n| self.is_visible(n))
            .map(str::to_string)
            .collect()
    }

    pub fn hidden_count(&self) -> usize {
        self.flags.values().filter(|v| !**v).count()
    }

    /// Ordered copy for the presentation layer.
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.flags.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
