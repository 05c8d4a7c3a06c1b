use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::PricePoint;

/// Narrow interface over an upstream daily-bar source.
///
/// Implementations return raw closes; validation into a
/// [`PriceSeries`](crate::models::price::PriceSeries) happens in the price
/// service, so a source can be swapped without touching the pipeline.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Daily closing prices for `code` between `from` and `to` (inclusive).
    ///
    /// An empty Vec is a valid answer (no trading in range, or unknown code on
    /// sources that do not error for it).
    async fn get_daily_closes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}
