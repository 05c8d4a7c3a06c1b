use crate::models::price::{AlignedWindow, PriceTable};
use crate::models::summary::{DivisionFault, DivisionFaultKind, PeriodReport, PeriodSummary};

/// Computes period returns over an aligned window.
///
/// `start_price` is each column's value on the window's first row,
/// `current_price` its value on the last row.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Ranked report for an aligned window; `None` for an empty window.
    pub fn summarize_window(&self, window: &AlignedWindow) -> Option<PeriodReport> {
        window.table().and_then(|table| self.summarize(table))
    }

    /// Ranked report for a windowed table; `None` if it has no rows.
    ///
    /// Instruments whose return cannot be computed become [`DivisionFault`]s
    /// and are left out of the ranking.
    pub fn summarize(&self, window: &PriceTable) -> Option<PeriodReport> {
        let base_date = window.first_date()?;
        let as_of_date = window.last_date()?;

        let mut summaries = Vec::with_capacity(window.columns().len());
        let mut faults = Vec::new();

        for column in window.columns() {
            let fault = |kind: DivisionFaultKind| {
                log::warn!("{}: cannot compute period return ({kind})", column.name);
                DivisionFault {
                    name: column.name.clone(),
                    kind,
                }
            };

            let start_price = match column.first() {
                None => {
                    faults.push(fault(DivisionFaultKind::MissingStartPrice));
                    continue;
                }
                Some(p) if p == 0.0 => {
                    faults.push(fault(DivisionFaultKind::ZeroStartPrice));
                    continue;
                }
                Some(p) => p,
            };
            let Some(current_price) = column.last() else {
                faults.push(fault(DivisionFaultKind::MissingCurrentPrice));
                continue;
            };

            summaries.push(PeriodSummary {
                name: column.name.clone(),
                start_price,
                current_price,
                return_pct: period_return(start_price, current_price),
                base_date,
                as_of_date,
            });
        }

        // sort_by is stable: equal returns keep table column order
        summaries.sort_by(|a, b| {
            b.return_pct
                .partial_cmp(&a.return_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Some(PeriodReport {
            base_date,
            as_of_date,
            summaries,
            faults,
        })
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Percentage change from `start` to `current`. Caller guarantees `start != 0`.
pub fn period_return(start: f64, current: f64) -> f64 {
    (current - start) / start * 100.0
}
