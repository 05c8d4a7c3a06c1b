use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::price::PricePoint;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// The compact output covers the last 100 trading days; anything reaching
/// further back than this needs the full history.
const COMPACT_WINDOW_DAYS: i64 = 140;

/// Alpha Vantage provider for daily closes.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set in settings as "alphavantage").
/// - **Coverage**: 100k+ global equity symbols.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }

    /// Requests always run through today, so the span of `[from, to]` is the
    /// history depth needed.
    fn output_size(from: NaiveDate, to: NaiveDate) -> &'static str {
        if (to - from).num_days() > COMPACT_WINDOW_DAYS {
            "full"
        } else {
            "compact"
        }
    }

    /// Fetch the daily time series for a symbol.
    async fn fetch_daily_series(
        &self,
        code: &str,
        output_size: &str,
    ) -> Result<HashMap<String, DailyData>, CoreError> {
        let resp: TimeSeriesResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", &code.to_uppercase()),
                ("outputsize", output_size),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse time series for {code}: {e}"),
            })?;

        if let Some(message) = resp.error_message {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{code}: {message}"),
            });
        }

        resp.time_series.ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No time series data for {code}. API limit may be exceeded."),
        })
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyData>>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct DailyData {
    #[serde(rename = "4. close")]
    close: String,
}

/// Turn the date-keyed response map into points within `[from, to]`, sorted by date.
/// Entries with unparseable dates or prices are skipped.
fn points_in_range(
    series: &HashMap<String, DailyData>,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = series
        .iter()
        .filter_map(|(date_str, data)| {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
            if date < from || date > to {
                return None;
            }
            let price: f64 = data.close.parse().ok()?;
            Some(PricePoint::new(date, price))
        })
        .collect();

    points.sort_by_key(|p| p.date);
    points
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_daily_closes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let series = self.fetch_daily_series(code, Self::output_size(from, to)).await?;
        Ok(points_in_range(&series, from, to))
    }
}
