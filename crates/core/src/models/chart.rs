use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every normalized series starts here on the base date.
pub const BASELINE: f64 = 100.0;

/// Suggested distance between Y-axis ticks.
pub const AXIS_TICK_INTERVAL: f64 = 20.0;

/// Decimals kept in the exported chart payload.
pub const CHART_DECIMALS: u32 = 2;

/// One instrument rescaled so that its base-date close equals [`BASELINE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    pub name: String,

    /// One slot per chart date; `None` where the instrument did not trade.
    pub values: Vec<Option<f64>>,
}

impl NormalizedSeries {
    /// Values rounded for the chart payload (the renderer shows two decimals).
    pub fn rounded(&self, decimals: u32) -> Vec<Option<f64>> {
        let factor = 10f64.powi(decimals as i32);
        self.values
            .iter()
            .map(|v| v.map(|x| (x * factor).round() / factor))
            .collect()
    }
}

/// Suggested Y-axis range for the trend chart.
///
/// `min <= 90` and `max >= 110` always hold (the 95/105 clamp rounded outward
/// to tens), so the baseline is visible with margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub interval: f64,
    pub baseline: f64,
}

/// Chart-ready payload: shared date axis plus one series per visible instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedChart {
    pub base_date: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<NormalizedSeries>,
    pub axis: AxisRange,
}

impl NormalizedChart {
    pub fn series_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&NormalizedSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    /// Copy with every series rounded to `decimals`.
    pub fn rounded(&self, decimals: u32) -> NormalizedChart {
        NormalizedChart {
            series: self
                .series
                .iter()
                .map(|s| NormalizedSeries {
                    name: s.name.clone(),
                    values: s.rounded(decimals),
                })
                .collect(),
            ..self.clone()
        }
    }
}

/// What the normalizer hands to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartOutcome {
    Ready(NormalizedChart),
    /// Every instrument is toggled off (or none could be normalized):
    /// ask the user to select at least one, do not draw a chart.
    NoVisibleSeries,
}

impl ChartOutcome {
    pub fn chart(&self) -> Option<&NormalizedChart> {
        match self {
            ChartOutcome::Ready(chart) => Some(chart),
            ChartOutcome::NoVisibleSeries => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ChartOutcome::Ready(_))
    }

    pub fn rounded(&self, decimals: u32) -> ChartOutcome {
        match self {
            ChartOutcome::Ready(chart) => ChartOutcome::Ready(chart.rounded(decimals)),
            ChartOutcome::NoVisibleSeries => ChartOutcome::NoVisibleSeries,
        }
    }
}
