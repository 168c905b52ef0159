use super::*;
use restock_watcher::StatusMap;

#[tokio::test]
async fn test_unavailable_twice_sends_nothing() -> anyhow::Result<()> {
    let harness = TestHarness::new(vec![keyword_product("PS5", "https://shop.example.com/ps5")], true)?;
    harness.checker.set("PS5", Scripted::Unavailable);

    let first = harness.monitor().run().await?;
    let second = harness.monitor().run().await?;

    assert_eq!(first.notifications_sent, 0);
    assert_eq!(second.notifications_sent, 0);
    assert!(harness.notifier.sent().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_full_availability_cycle() -> anyhow::Result<()> {
    // 1. Out of stock, 2. back in stock, 3. still in stock, 4. sold out, 5. back again
    let harness = TestHarness::new(vec![keyword_product("PS5", "https://shop.example.com/ps5")], true)?;
    let key = "PS5-https://shop.example.com/ps5";

    harness.checker.set("PS5", Scripted::Unavailable);
    harness.monitor().run().await?;
    assert_eq!(harness.store().load().get(key), Some(&false));
    assert_eq!(harness.notifier.sent().len(), 0);

    harness.checker.set("PS5", Scripted::Available);
    let summary = harness.monitor().run().await?;
    assert_eq!(summary.notifications_sent, 1);
    assert_eq!(harness.store().load().get(key), Some(&true));

    let summary = harness.monitor().run().await?;
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(harness.notifier.sent().len(), 1);

    harness.checker.set("PS5", Scripted::Unavailable);
    harness.monitor().run().await?;
    assert_eq!(harness.store().load().get(key), Some(&false));

    harness.checker.set("PS5", Scripted::Available);
    harness.monitor().run().await?;
    assert_eq!(harness.notifier.sent().len(), 2);

    let (subject, body) = &harness.notifier.sent()[0];
    assert_eq!(subject, "🎉 PS5 is NOW AVAILABLE!");
    assert!(body.contains("URL: https://shop.example.com/ps5"));
    assert!(body.contains("Status: Found: add to cart"));
    Ok(())
}

#[tokio::test]
async fn test_previous_false_then_available_persists_true() -> anyhow::Result<()> {
    let mut product = keyword_product("P", "https://shop.example.com/p");
    product.key = Some("P-url".to_string());
    let harness = TestHarness::new(vec![product], true)?;

    let mut previous = StatusMap::new();
    previous.insert("P-url".to_string(), false);
    assert!(harness.store().save(&previous));

    harness.checker.set("P", Scripted::Available);
    let summary = harness.monitor().run().await?;

    assert_eq!(summary.notifications_sent, 1);
    let mut expected = StatusMap::new();
    expected.insert("P-url".to_string(), true);
    assert_eq!(harness.store().load(), expected);
    Ok(())
}

#[tokio::test]
async fn test_corrupt_status_file_fails_open() -> anyhow::Result<()> {
    let harness = TestHarness::new(vec![keyword_product("PS5", "https://shop.example.com/ps5")], true)?;
    std::fs::write(harness.store().path(), "not json at all")?;

    harness.checker.set("PS5", Scripted::Available);
    let summary = harness.monitor().run().await?;

    assert_eq!(summary.notifications_sent, 1);
    assert!(summary.status_saved);
    Ok(())
}

#[tokio::test]
async fn test_structural_failure_stops_run_and_keeps_old_status() -> anyhow::Result<()> {
    let harness = TestHarness::new(
        vec![
            keyword_product("First", "https://shop.example.com/first"),
            keyword_product("Broken", "https://shop.example.com/broken"),
            keyword_product("Last", "https://shop.example.com/last"),
        ],
        true,
    )?;

    harness.checker.set("First", Scripted::Available);
    harness.checker.set("Broken", Scripted::Structural("action control never appeared".into()));
    harness.checker.set("Last", Scripted::Available);

    let err = harness.monitor().run().await.unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("Broken"));

    assert_eq!(harness.checker.calls(), vec!["First", "Broken"]);
    assert!(!harness.store().path().exists());
    Ok(())
}

#[tokio::test]
async fn test_check_errors_do_not_stop_the_run() -> anyhow::Result<()> {
    let harness = TestHarness::new(
        vec![
            keyword_product("Flaky", "https://shop.example.com/flaky"),
            keyword_product("Good", "https://shop.example.com/good"),
        ],
        true,
    )?;
    harness.checker.set("Flaky", Scripted::Failure("connection reset".into()));
    harness.checker.set("Good", Scripted::Available);

    let summary = harness.monitor().run().await?;

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.notifications_sent, 1);
    let saved = harness.store().load();
    assert_eq!(saved.get("Flaky-https://shop.example.com/flaky"), Some(&false));
    assert_eq!(saved.get("Good-https://shop.example.com/good"), Some(&true));
    Ok(())
}

#[tokio::test]
async fn test_failed_notification_is_not_retried() -> anyhow::Result<()> {
    let harness = TestHarness::new(vec![keyword_product("PS5", "https://shop.example.com/ps5")], false)?;
    harness.checker.set("PS5", Scripted::Available);

    let first = harness.monitor().run().await?;
    assert_eq!(first.notifications_sent, 0);
    assert_eq!(first.notification_failures, 1);

    let second = harness.monitor().run().await?;
    assert_eq!(second.notification_failures, 0);
    assert_eq!(harness.notifier.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_removed_products_are_dropped_from_status() -> anyhow::Result<()> {
    let harness = TestHarness::new(vec![keyword_product("PS5", "https://shop.example.com/ps5")], true)?;

    let mut previous = StatusMap::new();
    previous.insert("Old-https://shop.example.com/old".to_string(), true);
    assert!(harness.store().save(&previous));

    harness.monitor().run().await?;

    let saved = harness.store().load();
    assert_eq!(saved.len(), 1);
    assert!(saved.contains_key("PS5-https://shop.example.com/ps5"));
    Ok(())
}
