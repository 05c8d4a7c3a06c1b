use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use time::OffsetDateTime;

use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::price::PricePoint;

const PROVIDER: &str = "Yahoo Finance";

fn api_error(message: String) -> CoreError {
    CoreError::Api {
        provider: PROVIDER.into(),
        message,
    }
}

/// Yahoo Finance provider for daily equity and ETF closes.
///
/// - **Free**: No API key required.
/// - **Coverage**: Global equities, ETFs, indices. Korean listings use the
///   `.KS` (KOSPI) and `.KQ` (KOSDAQ) suffixes.
///
/// Uses the `yahoo_finance_api` crate. Not WASM-compatible.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        yahoo_finance_api::YahooConnector::new()
            .map(|connector| Self { connector })
            .map_err(|e| api_error(format!("connector setup failed: {e}")))
    }

    /// Midnight UTC of `date`, as the connector expects.
    fn midnight_utc(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let invalid = |e: &dyn std::fmt::Display| api_error(format!("bad date {date}: {e}"));

        let month = time::Month::try_from(date.month() as u8).map_err(|e| invalid(&e))?;
        let day = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| invalid(&e))?;
        Ok(day.midnight().assume_utc())
    }

    fn trading_day(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_daily_closes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        // The upstream end bound is exclusive.
        let start = Self::midnight_utc(from)?;
        let end = Self::midnight_utc(to + chrono::Duration::days(1))?;

        let quotes = self
            .connector
            .get_quote_history(code, start, end)
            .await
            .and_then(|resp| resp.quotes())
            .map_err(|e| api_error(format!("history for {code}: {e}")))?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                let date = Self::trading_day(q.timestamp)?;
                (from..=to).contains(&date).then(|| PricePoint::new(date, q.close))
            })
            .collect())
    }
}
