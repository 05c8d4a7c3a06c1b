// ═══════════════════════════════════════════════════════════════════
// Model Tests — series, tables, cache, visibility, events, config
// ═══════════════════════════════════════════════════════════════════

mod common;

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::io::Write;

use common::{d, series, table};
use stock_performance_core::errors::CoreError;
use stock_performance_core::models::chart::NormalizedSeries;
use stock_performance_core::models::event::{SessionEvent, ViewState, TOGGLE_PARAM};
use stock_performance_core::models::instrument::{Category, Instrument, InstrumentRegistry};
use stock_performance_core::models::price::{
    AlignedWindow, FetchCache, FetchOutcome, PricePoint, PriceSeries, PriceTable,
};
use stock_performance_core::models::settings::{AppConfig, Settings, MAX_LOOKBACK_DAYS};
use stock_performance_core::models::visibility::VisibilityState;

// ═══════════════════════════════════════════════════════════════════
//  PriceSeries
// ═══════════════════════════════════════════════════════════════════

mod price_series {
    use super::*;

    #[test]
    fn sorts_by_date() {
        let s = PriceSeries::from_points(vec![
            PricePoint::new(d(2026, 1, 5), 3.0),
            PricePoint::new(d(2026, 1, 2), 1.0),
            PricePoint::new(d(2026, 1, 3), 2.0),
        ]);
        let dates: Vec<_> = s.points().iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2026, 1, 2), d(2026, 1, 3), d(2026, 1, 5)]);
    }

    #[test]
    fn duplicate_date_keeps_last_value() {
        let s = PriceSeries::from_points(vec![
            PricePoint::new(d(2026, 1, 2), 1.0),
            PricePoint::new(d(2026, 1, 2), 1.5),
        ]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.price_on(d(2026, 1, 2)), Some(1.5));
    }

    #[test]
    fn drops_non_finite_prices() {
        let s = PriceSeries::from_points(vec![
            PricePoint::new(d(2026, 1, 2), f64::NAN),
            PricePoint::new(d(2026, 1, 3), f64::INFINITY),
            PricePoint::new(d(2026, 1, 4), 10.0),
        ]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.first_date(), Some(d(2026, 1, 4)));
    }

    #[test]
    fn zero_price_is_kept() {
        let s = series(&[(d(2026, 1, 2), 0.0)]);
        assert_eq!(s.price_on(d(2026, 1, 2)), Some(0.0));
    }

    #[test]
    fn empty_series() {
        let s = PriceSeries::from_points(vec![]);
        assert!(s.is_empty());
        assert_eq!(s.first_date(), None);
        assert_eq!(s.last_date(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PriceTable
// ═══════════════════════════════════════════════════════════════════

mod price_table {
    use super::*;

    #[test]
    fn dates_are_the_union() {
        let t = table(&[
            ("A", &[(d(2026, 1, 2), 1.0), (d(2026, 1, 5), 2.0)]),
            ("B", &[(d(2026, 1, 3), 10.0), (d(2026, 1, 5), 11.0)]),
        ]);
        assert_eq!(t.dates(), &[d(2026, 1, 2), d(2026, 1, 3), d(2026, 1, 5)]);
        assert_eq!(t.column("A").unwrap().values, vec![Some(1.0), None, Some(2.0)]);
        assert_eq!(t.column("B").unwrap().values, vec![None, Some(10.0), Some(11.0)]);
    }

    #[test]
    fn column_order_follows_input() {
        let t = table(&[
            ("Z", &[(d(2026, 1, 2), 1.0)]),
            ("A", &[(d(2026, 1, 2), 1.0)]),
        ]);
        assert_eq!(t.column_names(), vec!["Z", "A"]);
    }

    #[test]
    fn empty_series_are_not_columns() {
        let t = table(&[("A", &[(d(2026, 1, 2), 1.0)]), ("B", &[])]);
        assert_eq!(t.column_names(), vec!["A"]);
        assert!(t.column("B").is_none());
    }

    #[test]
    fn empty_table() {
        let t = PriceTable::empty();
        assert!(t.is_empty());
        assert_eq!(t.row_count(), 0);
        assert!(t.columns().is_empty());
        assert_eq!(t.first_date(), None);
    }

    #[test]
    fn slice_is_closed_interval() {
        let t = table(&[(
            "A",
            &[
                (d(2026, 1, 1), 1.0),
                (d(2026, 1, 2), 2.0),
                (d(2026, 1, 3), 3.0),
                (d(2026, 1, 4), 4.0),
            ],
        )]);
        let s = t.slice(d(2026, 1, 2), d(2026, 1, 3));
        assert_eq!(s.dates(), &[d(2026, 1, 2), d(2026, 1, 3)]);
        assert_eq!(s.column("A").unwrap().values, vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn slice_between_trading_days() {
        let t = table(&[("A", &[(d(2026, 1, 2), 1.0), (d(2026, 1, 9), 2.0)])]);
        let s = t.slice(d(2026, 1, 3), d(2026, 1, 8));
        assert!(s.is_empty());
        assert_eq!(s.column_names(), vec!["A"]);
    }

    #[test]
    fn slice_with_start_after_end_is_empty() {
        let t = table(&[("A", &[(d(2026, 1, 2), 1.0)])]);
        assert!(t.slice(d(2026, 1, 3), d(2026, 1, 1)).is_empty());
    }

    #[test]
    fn column_first_and_last() {
        let t = table(&[
            ("A", &[(d(2026, 1, 2), 1.0), (d(2026, 1, 3), 2.0)]),
            ("B", &[(d(2026, 1, 3), 5.0)]),
        ]);
        let b = t.column("B").unwrap();
        assert_eq!(b.first(), None);
        assert_eq!(b.last(), Some(5.0));
    }

    #[test]
    fn aligned_window_accessors() {
        let t = table(&[("A", &[(d(2026, 1, 2), 1.0)])]);
        let populated = AlignedWindow::Populated(t.clone());
        assert!(!populated.is_empty());
        assert_eq!(populated.table(), Some(&t));
        assert!(AlignedWindow::Empty.is_empty());
        assert!(AlignedWindow::Empty.table().is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  FetchCache
// ═══════════════════════════════════════════════════════════════════

mod fetch_cache {
    use super::*;

    fn outcome() -> FetchOutcome {
        FetchOutcome {
            table: table(&[("A", &[(d(2026, 1, 2), 1.0)])]),
            failures: vec![],
        }
    }

    #[test]
    fn hit_within_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut cache = FetchCache::new(Duration::hours(1));
        cache.insert("stocks", d(2026, 1, 1), outcome(), now);

        assert!(cache.get("stocks", d(2026, 1, 1), now).is_some());
        assert!(cache
            .get("stocks", d(2026, 1, 1), now + Duration::minutes(59))
            .is_some());
    }

    #[test]
    fn miss_after_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut cache = FetchCache::new(Duration::hours(1));
        cache.insert("stocks", d(2026, 1, 1), outcome(), now);

        assert!(cache.get("stocks", d(2026, 1, 1), now + Duration::hours(1)).is_none());
    }

    #[test]
    fn keyed_by_category_and_start() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut cache = FetchCache::new(Duration::hours(1));
        cache.insert("stocks", d(2026, 1, 1), outcome(), now);

        assert!(cache.get("etfs", d(2026, 1, 1), now).is_none());
        assert!(cache.get("stocks", d(2026, 1, 2), now).is_none());
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut cache = FetchCache::new(Duration::zero());
        cache.insert("stocks", d(2026, 1, 1), outcome(), now);
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_expired_removes_only_stale() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut cache = FetchCache::new(Duration::hours(1));
        cache.insert("stocks", d(2026, 1, 1), outcome(), now);
        cache.insert("etfs", d(2026, 1, 1), outcome(), now + Duration::minutes(30));

        let removed = cache.purge_expired(now + Duration::minutes(70));
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache
            .get("etfs", d(2026, 1, 1), now + Duration::minutes(70))
            .is_some());
    }

    #[test]
    fn clear() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        let mut cache = FetchCache::default();
        cache.insert("stocks", d(2026, 1, 1), outcome(), now);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn default_ttl_is_one_hour() {
        assert_eq!(FetchCache::default().ttl(), Duration::hours(1));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  VisibilityState
// ═══════════════════════════════════════════════════════════════════

mod visibility {
    use super::*;

    #[test]
    fn unknown_name_is_visible() {
        let v = VisibilityState::new();
        assert!(v.is_visible("never seen"));
    }

    #[test]
    fn toggle_unseen_hides_it() {
        let mut v = VisibilityState::new();
        assert!(!v.toggle("A"));
        assert!(!v.is_visible("A"));
    }

    #[test]
    fn double_toggle_restores_original() {
        let mut v = VisibilityState::with_names(["A", "B"]);
        v.toggle("B");
        for name in ["A", "B", "C"] {
            let before = v.is_visible(name);
            v.toggle(name);
            v.toggle(name);
            assert_eq!(v.is_visible(name), before, "{name}");
        }
    }

    #[test]
    fn seeded_names_are_visible() {
        let v = VisibilityState::with_names(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(v.snapshot().len(), 2);
        assert!(v.snapshot().values().all(|shown| *shown));
    }

    #[test]
    fn visible_of_filters_in_order() {
        let mut v = VisibilityState::with_names(["A", "B", "C"]);
        v.toggle("B");
        assert_eq!(v.visible_of(["C", "B", "A", "D"]), vec!["C", "A", "D"]);
        assert_eq!(v.hidden_count(), 1);
    }

    #[test]
    fn snapshot_is_sorted() {
        let v = VisibilityState::with_names(["b", "a", "c"]);
        let keys: Vec<_> = v.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  SessionEvent / ViewState
// ═══════════════════════════════════════════════════════════════════

mod view_state {
    use super::*;

    fn state() -> ViewState {
        ViewState::new(
            "stocks",
            d(2026, 1, 1),
            d(2026, 3, 1),
            VisibilityState::with_names(["A", "B"]),
        )
    }

    #[test]
    fn initial_is_year_to_date() {
        let s = ViewState::initial("stocks", d(2026, 10, 18), VisibilityState::new());
        assert_eq!(s.start_date, d(2026, 1, 1));
        assert_eq!(s.end_date, d(2026, 10, 18));
        assert_eq!(s.category, "stocks");
    }

    #[test]
    fn apply_select_category_keeps_visibility() {
        let s = state().apply(SessionEvent::Toggle("A".into()));
        let s = s.apply(SessionEvent::SelectCategory("etfs".into()));
        assert_eq!(s.category, "etfs");
        assert!(!s.visibility.is_visible("A"));

        let s = s.apply(SessionEvent::SelectCategory("stocks".into()));
        assert!(!s.visibility.is_visible("A"));
    }

    #[test]
    fn apply_dates() {
        let s = state()
            .apply(SessionEvent::SetStartDate(d(2025, 6, 1)))
            .apply(SessionEvent::SetEndDate(d(2025, 12, 31)));
        assert_eq!((s.start_date, s.end_date), (d(2025, 6, 1), d(2025, 12, 31)));

        let s = s.apply(SessionEvent::SetDateRange {
            start: d(2024, 1, 1),
            end: d(2024, 2, 1),
        });
        assert_eq!((s.start_date, s.end_date), (d(2024, 1, 1), d(2024, 2, 1)));
    }

    #[test]
    fn date_change_keeps_visibility() {
        let s = state()
            .apply(SessionEvent::Toggle("B".into()))
            .apply(SessionEvent::SetStartDate(d(2025, 1, 1)));
        assert!(!s.visibility.is_visible("B"));
    }

    #[test]
    fn apply_is_pure() {
        let original = state();
        let next = original.clone().apply(SessionEvent::Toggle("A".into()));
        assert!(original.visibility.is_visible("A"));
        assert!(!next.visibility.is_visible("A"));
    }

    #[test]
    fn requires_fetch() {
        assert!(SessionEvent::SelectCategory("x".into()).requires_fetch());
        assert!(SessionEvent::SetStartDate(d(2026, 1, 1)).requires_fetch());
        assert!(SessionEvent::SetDateRange {
            start: d(2026, 1, 1),
            end: d(2026, 2, 1)
        }
        .requires_fetch());
        assert!(!SessionEvent::SetEndDate(d(2026, 1, 1)).requires_fetch());
        assert!(!SessionEvent::Toggle("A".into()).requires_fetch());
    }

    #[test]
    fn toggle_param_is_applied_once() {
        let mut s = state();
        let mut params = HashMap::from([
            (TOGGLE_PARAM.to_string(), "A".to_string()),
            ("other".to_string(), "kept".to_string()),
        ]);

        assert_eq!(s.take_toggle_param(&mut params), Some("A".to_string()));
        assert!(!s.visibility.is_visible("A"));
        assert!(!params.contains_key(TOGGLE_PARAM));
        assert_eq!(params.get("other").map(String::as_str), Some("kept"));

        // Same request again: parameter is gone, nothing toggles back.
        assert_eq!(s.take_toggle_param(&mut params), None);
        assert!(!s.visibility.is_visible("A"));
    }

    #[test]
    fn blank_toggle_param_is_consumed_and_ignored() {
        let mut s = state();
        let mut params = HashMap::from([(TOGGLE_PARAM.to_string(), "  ".to_string())]);
        assert_eq!(s.take_toggle_param(&mut params), None);
        assert!(params.is_empty());
        assert_eq!(s.visibility, state().visibility);
    }

    #[test]
    fn display() {
        assert_eq!(SessionEvent::Toggle("A".into()).to_string(), "Toggle(A)");
        assert_eq!(
            SessionEvent::SetStartDate(d(2026, 1, 1)).to_string(),
            "SetStartDate(2026-01-01)"
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
//  InstrumentRegistry
// ═══════════════════════════════════════════════════════════════════

mod instrument_registry {
    use super::*;

    fn registry() -> InstrumentRegistry {
        InstrumentRegistry::new(vec![
            Category::new(
                "stocks",
                "Individual Stocks",
                vec![Instrument::new("A.KS", "A"), Instrument::new("B.KS", "B")],
            ),
            Category::new(
                "etfs",
                "ETFs",
                vec![Instrument::new("E.KS", "E"), Instrument::new("A2.KS", "A")],
            ),
        ])
    }

    #[test]
    fn lookup_by_key() {
        let r = registry();
        assert_eq!(r.category("etfs").unwrap().label, "ETFs");
        assert!(r.category("bonds").is_none());
        assert!(r.contains("stocks"));
        assert_eq!(r.first().unwrap().key, "stocks");
    }

    #[test]
    fn all_names_spans_categories_without_duplicates() {
        assert_eq!(registry().all_names(), vec!["A", "B", "E"]);
    }

    #[test]
    fn category_names_in_order() {
        let r = registry();
        assert_eq!(r.category("stocks").unwrap().names(), vec!["A", "B"]);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings / AppConfig
// ═══════════════════════════════════════════════════════════════════

mod app_config {
    use super::*;

    const VALID: &str = r#"
        [settings]
        lookback_days = 10
        cache_ttl_secs = 60

        [settings.api_keys]
        alphavantage = "demo"

        [[categories]]
        key = "stocks"
        label = "Individual Stocks"
        instruments = [
            { code = "005930.KS", name = "삼성전자" },
            { code = "000660.KS", name = "SK하이닉스" },
        ]

        [[categories]]
        key = "etfs"
        label = "ETFs"
        instruments = [ { code = "226490.KS", name = "KODEX 코스피" } ]
    "#;

    fn config_err(raw: &str) -> String {
        match AppConfig::from_toml_str(raw) {
            Err(CoreError::Config(msg)) => msg,
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn parses_valid_config() {
        let config = AppConfig::from_toml_str(VALID).unwrap();
        assert_eq!(config.settings.lookback_days, 10);
        assert_eq!(config.settings.cache_ttl_secs, 60);
        assert_eq!(
            config.settings.api_keys.get("alphavantage").map(String::as_str),
            Some("demo")
        );
        assert_eq!(config.categories.len(), 2);
        assert_eq!(
            config.categories[0].instruments[1],
            Instrument::new("000660.KS", "SK하이닉스")
        );
    }

    #[test]
    fn settings_default_when_omitted() {
        let config = AppConfig::from_toml_str(
            r#"
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "C", name = "N" } ]
            "#,
        )
        .unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.lookback_days, 15);
        assert_eq!(config.settings.cache_ttl(), Duration::hours(1));
    }

    #[test]
    fn values_are_trimmed() {
        let config = AppConfig::from_toml_str(
            r#"
            [[categories]]
            key = " k "
            label = "K"
            instruments = [ { code = " C ", name = " N " } ]
            "#,
        )
        .unwrap();
        assert_eq!(config.categories[0].key, "k");
        assert_eq!(config.categories[0].instruments[0], Instrument::new("C", "N"));
    }

    #[test]
    fn builtin_config_loads() {
        let config = AppConfig::builtin().unwrap();
        let registry = config.registry();
        assert!(registry.contains("stocks"));
        assert!(registry.contains("etfs"));
        assert_eq!(registry.category("stocks").unwrap().instruments.len(), 8);
        assert_eq!(registry.category("etfs").unwrap().instruments.len(), 4);
        assert!(registry.all_names().contains(&"삼성전자".to_string()));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();
        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.categories[1].key, "etfs");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from_file(dir.path().join("nope.toml"));
        assert!(matches!(result, Err(CoreError::FileIO(_))));
    }

    #[test]
    fn rejects_no_categories() {
        let msg = config_err("categories = []");
        assert!(msg.contains("at least one category"), "{msg}");
    }

    #[test]
    fn rejects_missing_categories_key() {
        config_err("[settings]\nlookback_days = 3");
    }

    #[test]
    fn rejects_duplicate_category_key() {
        let msg = config_err(
            r#"
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "C", name = "N" } ]
            [[categories]]
            key = "k"
            label = "K2"
            instruments = [ { code = "D", name = "M" } ]
            "#,
        );
        assert!(msg.contains("duplicate category key"), "{msg}");
    }

    #[test]
    fn rejects_empty_category() {
        let msg = config_err(
            r#"
            [[categories]]
            key = "k"
            label = "K"
            instruments = []
            "#,
        );
        assert!(msg.contains("no instruments"), "{msg}");
    }

    #[test]
    fn rejects_blank_instrument_fields() {
        let msg = config_err(
            r#"
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "  ", name = "N" } ]
            "#,
        );
        assert!(msg.contains("empty code or name"), "{msg}");
    }

    #[test]
    fn rejects_duplicate_name_within_category() {
        let msg = config_err(
            r#"
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "C", name = "N" }, { code = "D", name = "N" } ]
            "#,
        );
        assert!(msg.contains("duplicate instrument name"), "{msg}");
    }

    #[test]
    fn same_name_in_two_categories_is_allowed() {
        let config = AppConfig::from_toml_str(
            r#"
            [[categories]]
            key = "a"
            label = "A"
            instruments = [ { code = "C", name = "N" } ]
            [[categories]]
            key = "b"
            label = "B"
            instruments = [ { code = "C2", name = "N" } ]
            "#,
        )
        .unwrap();
        assert_eq!(config.registry().all_names(), vec!["N"]);
    }

    #[test]
    fn rejects_negative_lookback() {
        let msg = config_err(
            r#"
            [settings]
            lookback_days = -1
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "C", name = "N" } ]
            "#,
        );
        assert!(msg.contains("lookback_days"), "{msg}");
    }

    #[test]
    fn rejects_huge_lookback() {
        let msg = config_err(
            r#"
            [settings]
            lookback_days = 100000000
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "C", name = "N" } ]
            "#,
        );
        assert!(msg.contains("lookback_days"), "{msg}");
    }

    #[test]
    fn accepts_lookback_at_the_limit() {
        let raw = format!(
            "[settings]\nlookback_days = {MAX_LOOKBACK_DAYS}\n\
             [[categories]]\nkey = \"k\"\nlabel = \"K\"\n\
             instruments = [ {{ code = \"C\", name = \"N\" }} ]\n"
        );
        let config = AppConfig::from_toml_str(&raw).unwrap();
        assert_eq!(config.settings.lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn rejects_huge_cache_ttl() {
        let msg = config_err(
            r#"
            [settings]
            cache_ttl_secs = 100000000000000000
            [[categories]]
            key = "k"
            label = "K"
            instruments = [ { code = "C", name = "N" } ]
            "#,
        );
        assert!(msg.contains("cache_ttl_secs"), "{msg}");
    }

    #[test]
    fn unrepresentable_ttl_disables_caching() {
        let settings = Settings {
            cache_ttl_secs: u64::MAX,
            ..Settings::default()
        };
        assert_eq!(settings.cache_ttl(), Duration::zero());
    }

    #[test]
    fn rejects_unknown_fields() {
        config_err(
            r#"
            [[categories]]
            key = "k"
            label = "K"
            colour = "red"
            instruments = [ { code = "C", name = "N" } ]
            "#,
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
//  NormalizedSeries
// ═══════════════════════════════════════════════════════════════════

mod normalized_series {
    use super::*;

    #[test]
    fn rounded_to_two_decimals() {
        let s = NormalizedSeries {
            name: "A".into(),
            values: vec![Some(100.0), None, Some(104.5678), Some(99.994)],
        };
        assert_eq!(
            s.rounded(2),
            vec![Some(100.0), None, Some(104.57), Some(99.99)]
        );
    }
}
