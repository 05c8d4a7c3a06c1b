use std::collections::HashSet;

use crate::models::chart::{
    AxisRange, ChartOutcome, NormalizedChart, NormalizedSeries, AXIS_TICK_INTERVAL, BASELINE,
};
use crate::models::price::PriceTable;

/// The axis always shows at least this much below the baseline...
const AXIS_FLOOR: f64 = 95.0;
/// ...and at least this much above it.
const AXIS_CEIL: f64 = 105.0;
/// Extra room around the data as a fraction of its spread.
const AXIS_BUFFER_RATIO: f64 = 0.05;
/// Axis bounds are rounded outward to multiples of this.
const AXIS_STEP: f64 = 10.0;

/// Generates the normalized comparison chart.
///
/// The core computes all the numbers; the frontend only renders. Every
/// selected series is rescaled to 100 on the window's first date so that
/// instruments with very different prices share one axis.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Normalize the visible columns of a windowed table.
    ///
    /// `visible_names` decides which columns appear and in which order (the
    /// caller passes them in ranking order); names not in the table are
    /// ignored. A column with no value or a zero value on the base date
    /// cannot be rescaled and is skipped.
    pub fn normalize(&self, window: &PriceTable, visible_names: &[String]) -> ChartOutcome {
        let Some(base_date) = window.first_date() else {
            return ChartOutcome::NoVisibleSeries;
        };

        let mut seen = HashSet::new();
        let mut series = Vec::new();
        for name in visible_names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let Some(column) = window.column(name) else {
                continue;
            };
            match column.first() {
                Some(base) if base != 0.0 => series.push(NormalizedSeries {
                    name: column.name.clone(),
                    values: column
                        .values
                        .iter()
                        .map(|v| v.map(|x| x / base * BASELINE))
                        .collect(),
                }),
                _ => log::warn!("{name}: no usable base price on {base_date}, not charted"),
            }
        }

        if series.is_empty() {
            return ChartOutcome::NoVisibleSeries;
        }

        let (lo, hi) = series
            .iter()
            .flat_map(|s| s.values.iter().flatten())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });

        ChartOutcome::Ready(NormalizedChart {
            base_date,
            dates: window.dates().to_vec(),
            series,
            axis: Self::axis_range(lo, hi),
        })
    }

    /// Suggested Y-axis range for normalized data spanning `[lo, hi]`.
    ///
    /// Pads by 5% of the spread, clamps so the range covers `[95, 105]`, then
    /// rounds both ends outward to a multiple of 10.
    pub fn axis_range(lo: f64, hi: f64) -> AxisRange {
        let buffer = (hi - lo) * AXIS_BUFFER_RATIO;
        let min = (lo - buffer).min(AXIS_FLOOR);
        let max = (hi + buffer).max(AXIS_CEIL);

        AxisRange {
            min: (min / AXIS_STEP).floor() * AXIS_STEP,
            max: (max / AXIS_STEP).ceil() * AXIS_STEP,
            interval: AXIS_TICK_INTERVAL,
            baseline: BASELINE,
        }
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
