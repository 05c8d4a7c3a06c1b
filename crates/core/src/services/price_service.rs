use chrono::NaiveDate;
use futures::future::join_all;

use crate::errors::CoreError;
use crate::models::instrument::Instrument;
use crate::models::price::{FetchFailure, FetchFailureKind, FetchOutcome, PriceSeries, PriceTable};
use crate::models::settings::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use crate::providers::registry::PriceProviderRegistry;

/// Fetches daily closes for a category of instruments.
///
/// Every instrument is fetched concurrently and independently: a slow or
/// failing instrument never blocks or fails the others. Providers are tried in
/// registry order, falling back to the next one on error.
///
/// Caching is not done here. The session facade keys its
/// [`FetchCache`](crate::models::price::FetchCache) on `(category, start_date)`.
pub struct PriceService {
    registry: PriceProviderRegistry,
    lookback_days: i64,
}

impl PriceService {
    pub fn new(registry: PriceProviderRegistry) -> Self {
        Self::with_lookback(registry, DEFAULT_LOOKBACK_DAYS)
    }

    pub fn with_lookback(registry: PriceProviderRegistry, lookback_days: i64) -> Self {
        Self {
            registry,
            lookback_days: lookback_days.clamp(0, MAX_LOOKBACK_DAYS),
        }
    }

    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }

    /// Check if at least one provider is registered.
    pub fn has_provider(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Names of the registered providers in priority order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// First date fetched for a requested start: `start - lookback_days`,
    /// saturating at the earliest representable date.
    pub fn fetch_start(&self, start: NaiveDate) -> NaiveDate {
        chrono::Duration::try_days(self.lookback_days)
            .and_then(|lookback| start.checked_sub_signed(lookback))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Fetch `[start - lookback, today]` for every instrument and merge the
    /// results into one table in the instruments' order.
    ///
    /// Only an empty provider registry is an error; per-instrument problems
    /// end up in [`FetchOutcome::failures`].
    pub async fn fetch_category(
        &self,
        instruments: &[Instrument],
        start: NaiveDate,
        today: NaiveDate,
    ) -> Result<FetchOutcome, CoreError> {
        if self.registry.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let from = self.fetch_start(start);
        if from > today {
            log::info!("Requested start {start} is in the future; nothing to fetch");
            return Ok(FetchOutcome::default());
        }

        let fetches = instruments.iter().map(|instrument| async move {
            let result = self.fetch_series(&instrument.code, from, today).await;
            (instrument, result)
        });
        let results = join_all(fetches).await;

        let mut columns = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (instrument, result) in results {
            match result {
                Ok(series) if !series.is_empty() => {
                    log::debug!(
                        "[{}] {} fetched {} closes",
                        instrument.code,
                        instrument.name,
                        series.len()
                    );
                    columns.push((instrument.name.clone(), series));
                }
                Ok(_) => {
                    log::warn!(
                        "[{}] {} returned no data for {from}..={today}; leaving it out",
                        instrument.code,
                        instrument.name
                    );
                    failures.push(FetchFailure {
                        code: instrument.code.clone(),
                        name: instrument.name.clone(),
                        kind: FetchFailureKind::NoData,
                    });
                }
                Err(e) => {
                    log::warn!(
                        "[{}] {} failed to fetch: {e}; leaving it out",
                        instrument.code,
                        instrument.name
                    );
                    failures.push(FetchFailure {
                        code: instrument.code.clone(),
                        name: instrument.name.clone(),
                        kind: FetchFailureKind::Error(e.to_string()),
                    });
                }
            }
        }

        Ok(FetchOutcome {
            table: PriceTable::from_series(columns),
            failures,
        })
    }

    /// Fetch one instrument's closes with automatic provider fallback.
    ///
    /// A provider that answers with no usable data does not end the search;
    /// if none has data but at least one answered, the result is an empty
    /// series rather than an error.
    pub async fn fetch_series(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, CoreError> {
        let providers = self.registry.providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut last_error = None;
        let mut answered = false;

        for provider in &providers {
            match provider.get_daily_closes(code, from, to).await {
                Ok(points) => {
                    let raw = points.len();
                    let series = PriceSeries::from_points(points);
                    if series.len() != raw {
                        log::debug!(
                            "[{code}] {} dropped {} invalid or duplicate points",
                            provider.name(),
                            raw - series.len()
                        );
                    }
                    if !series.is_empty() {
                        return Ok(series);
                    }
                    answered = true;
                }
                Err(e) => {
                    log::debug!("[{code}] {} failed: {e}", provider.name());
                    last_error = Some(e);
                    // Try next provider
                }
            }
        }

        if answered {
            return Ok(PriceSeries::default());
        }
        Err(last_error.unwrap_or(CoreError::NoProvider))
    }
}
