//! End-to-end tests of the application context against a mock backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use service_orchestrator::cache::CacheOptions;
use service_orchestrator::registry::ServiceStatus;
use service_orchestrator::session::{Credentials, UserProfile};
use service_orchestrator::{AppContext, ServiceId};

mod common;

fn envelope(data: serde_json::Value) -> String {
    json!({"success": true, "data": data}).to_string()
}

#[tokio::test]
async fn test_health_sweep_tracks_backend_availability() {
    let healthy = Arc::new(AtomicBool::new(false));
    let flag = healthy.clone();
    let addr = common::start_programmable_backend(move |_| {
        let up = flag.load(Ordering::SeqCst);
        async move { Some(if up { (200, "{}".into()) } else { (503, "{}".into()) }) }
    })
    .await;

    let context = AppContext::bootstrap(common::config_for(addr)).await.unwrap();
    let registry = context.registry();

    registry.run_health_checks().await;
    assert_eq!(registry.status(&ServiceId::Api), Some(ServiceStatus::Error));
    assert_eq!(registry.status(&ServiceId::Posts), Some(ServiceStatus::Active));
    let record = registry.record(&ServiceId::Api).unwrap();
    assert_eq!(record.error_count, 1);
    assert!(record.last_health_check.is_some());

    healthy.store(true, Ordering::SeqCst);
    registry.run_health_checks().await;
    assert_eq!(registry.status(&ServiceId::Api), Some(ServiceStatus::Active));

    let report = registry.get_performance_report();
    assert_eq!(report.total_services, ServiceId::BUILTIN.len());
    assert_eq!(report.error_services, 0);

    context.shutdown().await;
}

#[tokio::test]
async fn test_dashboard_tolerates_failed_source() {
    let addr = common::start_programmable_backend(|request| async move {
        let path = request.path.as_str();
        let response = if path.starts_with("/api/admin/analytics/overview") {
            (200, envelope(json!({"users": 42, "posts": 7})))
        } else if path.starts_with("/api/admin/analytics/revenue") {
            (500, r#"{"success":false,"message":"ledger offline"}"#.to_string())
        } else if path.starts_with("/api/admin/analytics/user-growth") {
            (200, envelope(json!({"new_users": 5})))
        } else if path.starts_with("/api/admin/analytics/realtime") {
            (200, envelope(json!({"online": 2})))
        } else {
            (404, "{}".to_string())
        };
        Some(response)
    })
    .await;

    let context = AppContext::bootstrap(common::config_for(addr)).await.unwrap();
    let snapshot = context.dashboard().fetch().await;

    assert_eq!(snapshot.overview, Some(json!({"users": 42, "posts": 7})));
    assert_eq!(snapshot.user_growth, Some(json!({"new_users": 5})));
    assert_eq!(snapshot.realtime, Some(json!({"online": 2})));
    assert_eq!(snapshot.revenue, None);

    // Fetches are attributed to the analytics service
    let metrics = context.registry().metrics(&ServiceId::Analytics).unwrap();
    assert_eq!(metrics.total_requests, 4);
    assert_eq!(metrics.failed_requests, 1);

    assert!(context.cache().has("analytics:overview"));
    assert!(!context.cache().has("analytics:revenue:30d"));

    context.shutdown().await;
}

#[tokio::test]
async fn test_persisted_state_survives_restart() {
    let addr = common::start_mock_backend("{}").await;
    let dir = std::env::temp_dir().join(format!("orchestrator-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();

    let mut config = common::config_for(addr);
    config.cache.persistence_path = Some(dir.join("cache.json").display().to_string());
    config.session.persistence_path = Some(dir.join("session.json").display().to_string());

    let first = AppContext::bootstrap(config.clone()).await.unwrap();
    first.cache().set(
        "profile:u1",
        &json!({"name": "ada"}),
        CacheOptions::ttl(Duration::from_secs(600)).with_tag("users"),
    );
    first.cache().set("short", &1, CacheOptions::ttl(Duration::from_millis(10)));
    first
        .credentials()
        .save(
            Credentials {
                access_token: "persisted".into(),
                refresh_token: None,
            },
            &UserProfile {
                id: "u1".into(),
                username: "ada".into(),
                email: None,
                role: None,
            },
        )
        .unwrap();
    first.shutdown().await;

    tokio::time::sleep(Duration::from_millis(30)).await;

    let second = AppContext::bootstrap(config).await.unwrap();
    assert_eq!(
        second.cache().get::<serde_json::Value>("profile:u1"),
        Some(json!({"name": "ada"}))
    );
    assert!(!second.cache().has("short"));
    assert_eq!(second.cache().invalidate_by_tag("users"), 1);

    // Only the durable copy survives; the session copy starts empty
    assert_eq!(second.credentials().user().map(|u| u.username), Some("ada".to_string()));
    second.shutdown().await;

    let _ = std::fs::remove_dir_all(&dir);
}

fn scratch_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("orchestrator-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn sign_in(context: &AppContext, token: &str) {
    context
        .credentials()
        .save(
            Credentials {
                access_token: token.into(),
                refresh_token: None,
            },
            &UserProfile {
                id: "u1".into(),
                username: "ada".into(),
                email: None,
                role: None,
            },
        )
        .unwrap();
}

#[tokio::test]
async fn test_truncated_cache_file_does_not_block_startup() {
    let addr = common::start_mock_backend("{}").await;
    let dir = scratch_dir();
    let cache_path = dir.join("cache.json");
    std::fs::write(&cache_path, r#"{"cache_feed": "trunc"#).unwrap();

    let mut config = common::config_for(addr);
    config.cache.persistence_path = Some(cache_path.display().to_string());

    let context = AppContext::bootstrap(config.clone())
        .await
        .expect("unreadable cache must not abort bootstrap");
    assert!(context.cache().is_empty());
    assert!(!context.cache().has("feed"));

    // The cache keeps persisting after the reset
    context.cache().set("feed", &json!(["p1"]), CacheOptions::default());
    context.shutdown().await;

    let reopened = AppContext::bootstrap(config).await.unwrap();
    assert_eq!(reopened.cache().get::<serde_json::Value>("feed"), Some(json!(["p1"])));
    reopened.shutdown().await;

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_cache_and_session_can_share_one_file() {
    let addr = common::start_mock_backend("{}").await;
    let dir = scratch_dir();
    let shared = dir.join("state.json").display().to_string();

    let mut config = common::config_for(addr);
    config.cache.persistence_path = Some(shared.clone());
    config.session.persistence_path = Some(shared);

    let first = AppContext::bootstrap(config.clone()).await.unwrap();
    first.cache().set("feed", &json!({"posts": 3}), CacheOptions::default());
    sign_in(&first, "tok");
    first.shutdown().await;

    let second = AppContext::bootstrap(config).await.unwrap();
    assert_eq!(second.cache().get::<serde_json::Value>("feed"), Some(json!({"posts": 3})));
    assert_eq!(second.credentials().access_token().as_deref(), Some("tok"));
    assert_eq!(second.credentials().user().map(|u| u.id), Some("u1".to_string()));

    // Clearing the cache leaves credentials alone
    second.cache().clear();
    assert!(second.credentials().user().is_some());
    second.shutdown().await;

    let _ = std::fs::remove_dir_all(&dir);
}
