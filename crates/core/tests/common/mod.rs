#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use stock_performance_core::errors::CoreError;
use stock_performance_core::models::price::{PricePoint, PriceSeries, PriceTable};
use stock_performance_core::providers::traits::PriceProvider;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn series(points: &[(NaiveDate, f64)]) -> PriceSeries {
    PriceSeries::from_points(points.iter().map(|(d, p)| PricePoint::new(*d, *p)).collect())
}

pub fn table(columns: &[(&str, &[(NaiveDate, f64)])]) -> PriceTable {
    PriceTable::from_series(
        columns
            .iter()
            .map(|(name, points)| (name.to_string(), series(points)))
            .collect(),
    )
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ═══════════════════════════════════════════════════════════════════
// Mock Price Providers
// ═══════════════════════════════════════════════════════════════════

/// Serves canned closes per code and records every request.
/// Unknown codes fail like an upstream error would.
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    data: HashMap<String, Vec<PricePoint>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(String, NaiveDate, NaiveDate)>>>,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with(mut self, code: &str, points: &[(NaiveDate, f64)]) -> Self {
        self.data.insert(
            code.to_string(),
            points.iter().map(|(d, p)| PricePoint::new(*d, *p)).collect(),
        );
        self
    }

    /// Shared call counter; stays valid after the provider is boxed.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<(String, NaiveDate, NaiveDate)>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_daily_closes(
        &self,
        code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((code.to_string(), from, to));

        let points = self.data.get(code).ok_or_else(|| CoreError::Api {
            provider: self.name.clone(),
            message: format!("unknown symbol {code}"),
        })?;
        Ok(points
            .iter()
            .filter(|p| p.date >= from && p.date <= to)
            .cloned()
            .collect())
    }
}

/// A provider that always fails.
pub struct FailingProvider;

#[async_trait]
impl PriceProvider for FailingProvider {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn get_daily_closes(
        &self,
        code: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Err(CoreError::Api {
            provider: "Failing".into(),
            message: format!("upstream down for {code}"),
        })
    }
}

/// A provider that answers but never has data.
pub struct EmptyProvider;

#[async_trait]
impl PriceProvider for EmptyProvider {
    fn name(&self) -> &str {
        "Empty"
    }

    async fn get_daily_closes(
        &self,
        _code: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Ok(vec![])
    }
}
