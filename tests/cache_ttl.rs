// tests/cache_ttl.rs
use chrono::{TimeZone, Utc};
use intel_orchestrator::intel::{
    Collector, FnCollector, Orchestrator, Reading, SourceCategory, SourceDescriptor, SourceRegistry,
};
use intel_orchestrator::{IntelConfig, ManualClock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counted(calls: Arc<AtomicUsize>) -> Arc<dyn Collector> {
    Arc::new(FnCollector::new(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reading {
            metrics: serde_json::json!({ "index": 0.42 }),
            advisories: vec![],
        })
    }))
}

#[tokio::test]
async fn stale_read_is_served_without_refetch() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut reg = SourceRegistry::new();
    reg.register(
        SourceDescriptor::new("demand", "Demand", SourceCategory::Market, "test"),
        Duration::from_millis(1000),
        counted(calls.clone()),
    )
    .unwrap();

    let orch = Orchestrator::builder(reg).clock(Arc::new(clock.clone())).build();
    orch.run_once().await.unwrap();

    let fresh = orch.latest_intel(None);
    assert_eq!(fresh.len(), 1);
    assert!(!fresh[0].from_cache);
    assert_eq!(fresh[0].cache_age_ms, 0);

    clock.advance_ms(1500);
    let stale = orch.latest_intel(None);
    assert_eq!(stale.len(), 1);
    assert!(stale[0].from_cache, "past TTL must be flagged");
    assert_eq!(stale[0].cache_age_ms, 1500);
    assert_eq!(stale[0].snapshot, fresh[0].snapshot);

    // reads never trigger collection
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expiry_boundary_counts_as_stale() {
    let clock = ManualClock::default();
    let mut reg = SourceRegistry::new();
    reg.register(
        SourceDescriptor::new("x", "X", SourceCategory::Partner, "test"),
        Duration::from_millis(1000),
        counted(Arc::new(AtomicUsize::new(0))),
    )
    .unwrap();
    let orch = Orchestrator::builder(reg).clock(Arc::new(clock.clone())).build();
    orch.run_once().await.unwrap();

    clock.advance_ms(999);
    assert!(!orch.partner_intel()[0].from_cache);
    clock.advance_ms(1);
    assert!(orch.partner_intel()[0].from_cache);
}

#[tokio::test]
async fn category_views_partition_latest_intel() {
    let orch = Orchestrator::from_config(&IntelConfig::default()).unwrap();
    orch.run_once().await.unwrap();

    let all = orch.latest_intel(None);
    assert_eq!(all.len(), orch.registry().len());

    let parts = [
        (SourceCategory::Market, orch.market_intel()),
        (SourceCategory::Operational, orch.operational_intel()),
        (SourceCategory::Compliance, orch.compliance_intel()),
        (SourceCategory::Partner, orch.partner_intel()),
    ];

    let mut seen = HashSet::new();
    for (cat, views) in &parts {
        assert!(!views.is_empty(), "{cat} has no built-in source");
        for v in views {
            assert_eq!(v.snapshot.category, *cat);
            assert!(seen.insert(v.snapshot.source_id.clone()), "source listed twice");
        }
    }
    let all_ids: HashSet<_> = all.iter().map(|v| v.snapshot.source_id.clone()).collect();
    assert_eq!(seen, all_ids);
}

#[tokio::test]
async fn disabled_sources_are_not_registered() {
    let cfg = IntelConfig {
        disabled_sources: vec!["Weather".into(), "traffic".into()],
        ..IntelConfig::default()
    };
    let orch = Orchestrator::from_config(&cfg).unwrap();
    let ids = orch.registry().ids();
    assert!(!ids.iter().any(|i| i == "weather" || i == "traffic"));
    assert_eq!(ids.len(), 6);
}
