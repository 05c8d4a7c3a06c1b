use chrono::NaiveDate;

use crate::models::price::{AlignedWindow, PriceTable};

/// Cuts a fetched table down to the user's `[start, end]` window.
pub struct WindowService;

impl WindowService {
    pub fn new() -> Self {
        Self
    }

    /// Rows whose date lies in `[start, end]`.
    ///
    /// No overlapping rows (start after the data, end before it, `start > end`,
    /// or a table without rows) gives [`AlignedWindow::Empty`].
    pub fn align(&self, table: &PriceTable, start: NaiveDate, end: NaiveDate) -> AlignedWindow {
        let window = table.slice(start, end);
        if window.is_empty() {
            log::debug!("No rows between {start} and {end}");
            AlignedWindow::Empty
        } else {
            AlignedWindow::Populated(window)
        }
    }
}

impl Default for WindowService {
    fn default() -> Self {
        Self::new()
    }
}
