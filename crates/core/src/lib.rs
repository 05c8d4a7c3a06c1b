pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use errors::CoreError;
use models::{
    chart::{ChartOutcome, CHART_DECIMALS},
    event::{SessionEvent, ViewState},
    instrument::{Category, InstrumentRegistry},
    price::{FetchCache, FetchFailure, FetchOutcome},
    settings::{AppConfig, Settings},
    summary::PeriodReport,
    visibility::VisibilityState,
};
use providers::registry::PriceProviderRegistry;
use services::{
    analytics_service::AnalyticsService, chart_service::ChartService,
    price_service::PriceService, window_service::WindowService,
};

/// Period summary as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PeriodView {
    /// The selected window has no overlapping trading data.
    NoData,
    Ready(PeriodReport),
}

impl PeriodView {
    pub fn report(&self) -> Option<&PeriodReport> {
        match self {
            PeriodView::NoData => None,
            PeriodView::Ready(report) => Some(report),
        }
    }
}

/// Everything one render pass produces for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub category: String,
    pub category_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Ranked returns, or `NoData` for an empty window.
    pub period: PeriodView,

    /// `None` when there is no period data at all; otherwise either a chart
    /// or the "select at least one instrument" state.
    pub chart: Option<ChartOutcome>,

    /// Visibility flags across all categories.
    pub visibility: BTreeMap<String, bool>,

    /// Instruments of the active category that could not be fetched.
    pub failures: Vec<FetchFailure>,

    /// Whether the prices came from the session cache.
    pub from_cache: bool,
}

impl DashboardView {
    /// Export the whole view as pretty JSON (raw-data dump for display/debugging).
    /// Chart values are rounded to [`CHART_DECIMALS`]; the rest is exact.
    pub fn to_json(&self) -> Result<String, CoreError> {
        let payload = DashboardView {
            chart: self.chart.as_ref().map(|c| c.rounded(CHART_DECIMALS)),
            ..self.clone()
        };
        serde_json::to_string_pretty(&payload).map_err(CoreError::from)
    }
}

/// One user session over the stock performance pipeline.
///
/// Owns the session state (selection, visibility flags, fetch cache) and runs
/// Fetcher → Aligner → Summarizer → Normalizer on [`render`](Self::render).
/// Events only change state; nothing is fetched until the next render, and a
/// render is served from the cache whenever `(category, start_date)` was
/// fetched within the TTL.
#[must_use]
pub struct PerformanceTracker {
    registry: InstrumentRegistry,
    settings: Settings,
    price_service: PriceService,
    window_service: WindowService,
    analytics_service: AnalyticsService,
    chart_service: ChartService,
    cache: FetchCache,
    state: ViewState,
}

impl std::fmt::Debug for PerformanceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceTracker")
            .field("categories", &self.registry.categories().len())
            .field("state", &self.state)
            .field("cached_fetches", &self.cache.len())
            .finish()
    }
}

impl PerformanceTracker {
    /// Start a session with the default providers, year-to-date on the first category.
    pub fn new(config: AppConfig) -> Result<Self, CoreError> {
        let registry = PriceProviderRegistry::new_with_defaults(&config.settings.api_keys);
        let today = Utc::now().date_naive();
        Self::with_providers(config, registry, today)
    }

    /// Start a session with an explicit provider registry and "today".
    pub fn with_providers(
        config: AppConfig,
        providers: PriceProviderRegistry,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        let registry = config.registry();
        let first = registry
            .first()
            .ok_or_else(|| CoreError::Config("at least one category is required".into()))?
            .key
            .clone();
        let visibility = VisibilityState::with_names(registry.all_names());
        let state = ViewState::initial(first, today, visibility);

        Ok(Self {
            price_service: PriceService::with_lookback(providers, config.settings.lookback_days),
            window_service: WindowService::new(),
            analytics_service: AnalyticsService::new(),
            chart_service: ChartService::new(),
            cache: FetchCache::new(config.settings.cache_ttl()),
            settings: config.settings,
            registry,
            state,
        })
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Apply one user interaction. Selecting an unknown category is rejected
    /// and leaves the state untouched.
    ///
    /// Returns whether the event moved the fetch key `(category, start_date)`,
    /// i.e. whether the next render may have to go to the providers.
    pub fn handle(&mut self, event: SessionEvent) -> Result<bool, CoreError> {
        if let SessionEvent::SelectCategory(key) = &event {
            if !self.registry.contains(key) {
                return Err(CoreError::UnknownCategory(key.clone()));
            }
        }

        let before = (self.state.category.clone(), self.state.start_date);
        let may_fetch = event.requires_fetch();
        log::debug!("Session event: {event}");
        self.state = self.state.clone().apply(event);

        let moved = may_fetch && before != (self.state.category.clone(), self.state.start_date);
        if moved {
            log::debug!(
                "Fetch key is now ({}, {})",
                self.state.category,
                self.state.start_date
            );
        }
        Ok(moved)
    }

    /// Apply a `toggle=<name>` query parameter at most once (the key is
    /// removed from `params`). Returns the toggled name.
    pub fn handle_query(&mut self, params: &mut HashMap<String, String>) -> Option<String> {
        self.state.take_toggle_param(params)
    }

    /// Shorthand for [`SessionEvent::Toggle`]. Returns the new visibility.
    pub fn toggle(&mut self, name: &str) -> bool {
        self.state.visibility.toggle(name)
    }

    // ── Render pass ─────────────────────────────────────────────────

    /// Run the pipeline for the current state.
    pub async fn render(&mut self) -> Result<DashboardView, CoreError> {
        self.render_at(Utc::now()).await
    }

    /// Run the pipeline as of `now` (drives cache expiry and the fetch end date).
    pub async fn render_at(&mut self, now: DateTime<Utc>) -> Result<DashboardView, CoreError> {
        let category = self
            .registry
            .category(&self.state.category)
            .ok_or_else(|| CoreError::UnknownCategory(self.state.category.clone()))?
            .clone();
        let start = self.state.start_date;
        let end = self.state.end_date;

        let (outcome, from_cache) = self.fetch(&category, start, now).await?;

        let window = self.window_service.align(&outcome.table, start, end);
        let (period, chart) = match (self.analytics_service.summarize_window(&window), window.table()) {
            (Some(report), Some(table)) => {
                let visible = self.state.visibility.visible_of(report.names());
                let chart = self.chart_service.normalize(table, &visible);
                (PeriodView::Ready(report), Some(chart))
            }
            _ => {
                log::info!("No data for {} between {start} and {end}", category.key);
                (PeriodView::NoData, None)
            }
        };

        Ok(DashboardView {
            category: category.key,
            category_label: category.label,
            start_date: start,
            end_date: end,
            period,
            chart,
            visibility: self.state.visibility.snapshot(),
            failures: outcome.failures,
            from_cache,
        })
    }

    async fn fetch(
        &mut self,
        category: &Category,
        start: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(FetchOutcome, bool), CoreError> {
        if let Some(cached) = self.cache.get(&category.key, start, now) {
            log::debug!("Cache hit for ({}, {start})", category.key);
            return Ok((cached.clone(), true));
        }

        log::info!(
            "Fetching {} instruments for ({}, {start})",
            category.instruments.len(),
            category.key
        );
        let outcome = self
            .price_service
            .fetch_category(&category.instruments, start, now.date_naive())
            .await?;
        self.cache.purge_expired(now);
        self.cache.insert(&category.key, start, outcome.clone(), now);
        Ok((outcome, false))
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn visibility(&self) -> &VisibilityState {
        &self.state.visibility
    }

    #[must_use]
    pub fn is_visible(&self, name: &str) -> bool {
        self.state.visibility.is_visible(name)
    }

    #[must_use]
    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn active_category(&self) -> Option<&Category> {
        self.registry.category(&self.state.category)
    }

    /// Names of the registered price providers in priority order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.price_service.provider_names()
    }

    // ── Cache Management ────────────────────────────────────────────

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Forget every cached fetch; the next render goes to the providers.
    pub fn cache_clear(&mut self) {
        self.cache.clear();
    }
}
