use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A single price data point (date → closing price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Daily closes for one instrument.
///
/// Always strictly increasing by date with finite prices. Built from whatever
/// a provider returned, so the rest of the pipeline never sees the provider's
/// native shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate raw provider points: non-finite prices are dropped, points are
    /// sorted by date and a duplicated date keeps its last reported value.
    pub fn from_points(points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|p| p.price.is_finite())
            .collect();
        // Stable sort keeps provider order within a date, so the last one wins below.
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Closing price on an exact date. Binary search, O(log n).
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].price)
    }
}

/// One named column of a [`PriceTable`]; `None` means no trade on that row's date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl PriceColumn {
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied().flatten()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Date-indexed collection of named price columns.
///
/// `dates` is the sorted union of every column's dates and each column has
/// exactly one slot per date. The table need not be densely filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge named series into one table. Column order follows the input;
    /// empty series are left out.
    pub fn from_series(series: Vec<(String, PriceSeries)>) -> Self {
        let series: Vec<(String, PriceSeries)> =
            series.into_iter().filter(|(_, s)| !s.is_empty()).collect();

        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|(_, s)| s.points().iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .into_iter()
            .map(|(name, s)| {
                let values = dates.iter().map(|d| s.price_on(*d)).collect();
                PriceColumn { name, values }
            })
            .collect();

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&PriceColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// True when the table has no rows, whatever its columns.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Rows whose date lies in the closed interval `[start, end]`.
    /// Columns are kept even when the slice has no rows.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> PriceTable {
        if start > end {
            return self.with_rows(0..0);
        }
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        self.with_rows(lo..hi)
    }

    fn with_rows(&self, rows: std::ops::Range<usize>) -> PriceTable {
        PriceTable {
            dates: self.dates[rows.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| PriceColumn {
                    name: c.name.clone(),
                    values: c.values[rows.clone()].to_vec(),
                })
                .collect(),
        }
    }
}

/// Why an instrument is missing from a fetched table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchFailureKind {
    /// The source answered but had no usable closes for the range.
    NoData,
    /// Every provider errored; holds the last error message.
    Error(String),
}

/// One instrument left out of a fetch. Recorded and logged, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub code: String,
    pub name: String,
    pub kind: FetchFailureKind,
}

/// A fetched category: the table of instruments that produced data plus the
/// ones that did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub table: PriceTable,
    pub failures: Vec<FetchFailure>,
}

/// Cache key: (category key, requested start date).
pub type FetchCacheKey = (String, NaiveDate);

#[derive(Debug, Clone)]
struct FetchCacheEntry {
    outcome: FetchOutcome,
    fetched_at: DateTime<Utc>,
}

/// Session-scoped cache of fetched tables with a time-based expiry.
///
/// Toggling visibility or moving the end date never changes the key, so those
/// interactions are served from here without touching the network.
#[derive(Debug, Clone)]
pub struct FetchCache {
    ttl: chrono::Duration,
    entries: HashMap<FetchCacheKey, FetchCacheEntry>,
}

impl FetchCache {
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Cached fetch for `(category, start)` if it is younger than the TTL at `now`.
    pub fn get(&self, category: &str, start: NaiveDate, now: DateTime<Utc>) -> Option<&FetchOutcome> {
        let entry = self.entries.get(&(category.to_string(), start))?;
        if now - entry.fetched_at < self.ttl {
            Some(&entry.outcome)
        } else {
            None
        }
    }

    pub fn insert(&mut self, category: &str, start: NaiveDate, outcome: FetchOutcome, now: DateTime<Utc>) {
        if self.ttl <= chrono::Duration::zero() {
            return;
        }
        self.entries.insert(
            (category.to_string(), start),
            FetchCacheEntry {
                outcome,
                fetched_at: now,
            },
        );
    }

    /// Drop expired entries. Returns the number removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now - e.fetched_at < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(chrono::Duration::seconds(
            super::settings::DEFAULT_CACHE_TTL_SECS as i64,
        ))
    }
}

/// Result of cutting a table down to the requested window.
///
/// `Empty` means no trading data overlaps the window. It is a normal,
/// user-facing "no data for period" state, distinct from a populated table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlignedWindow {
    Empty,
    Populated(PriceTable),
}

impl AlignedWindow {
    pub fn is_empty(&self) -> bool {
        matches!(self, AlignedWindow::Empty)
    }

    pub fn table(&self) -> Option<&PriceTable> {
        match self {
            AlignedWindow::Empty => None,
            AlignedWindow::Populated(table) => Some(table),
        }
    }
}
