use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Period return of one instrument over the selected window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Display name (the table column key).
    pub name: String,

    /// Close on `base_date`.
    pub start_price: f64,

    /// Close on `as_of_date`.
    pub current_price: f64,

    /// `(current_price - start_price) / start_price * 100`
    pub return_pct: f64,

    /// First date in the window that has table data.
    pub base_date: NaiveDate,

    /// Last date in the window that has table data.
    pub as_of_date: NaiveDate,
}

impl PeriodSummary {
    pub fn is_gain(&self) -> bool {
        self.return_pct >= 0.0
    }
}

/// Why an instrument could not get a period return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivisionFaultKind {
    /// The base-date close is exactly zero.
    ZeroStartPrice,
    /// No close on the base date.
    MissingStartPrice,
    /// No close on the as-of date.
    MissingCurrentPrice,
}

impl std::fmt::Display for DivisionFaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DivisionFaultKind::ZeroStartPrice => write!(f, "start price is zero"),
            DivisionFaultKind::MissingStartPrice => write!(f, "no price on the base date"),
            DivisionFaultKind::MissingCurrentPrice => write!(f, "no price on the as-of date"),
        }
    }
}

/// Data-integrity fault for one instrument. The instrument is left out of the
/// summary and the chart; the rest of the computation carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionFault {
    pub name: String,
    pub kind: DivisionFaultKind,
}

/// Ranked period returns for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub base_date: NaiveDate,
    pub as_of_date: NaiveDate,

    /// Sorted by `return_pct` descending; ties keep table column order.
    pub summaries: Vec<PeriodSummary>,

    /// Instruments skipped because their return could not be computed.
    pub faults: Vec<DivisionFault>,
}

impl PeriodReport {
    /// Names in ranking order.
    pub fn names(&self) -> Vec<&str> {
        self.summaries.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PeriodSummary> {
        self.summaries.iter().find(|s| s.name == name)
    }

    pub fn best(&self) -> Option<&PeriodSummary> {
        self.summaries.first()
    }

    pub fn worst(&self) -> Option<&PeriodSummary> {
        self.summaries.last()
    }
}
