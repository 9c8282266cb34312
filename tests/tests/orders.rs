mod utils;
#[allow(unused)]
use utils::*;

use mock_service::MockConfig;
use serde_json::json;
use stampede::orders;
use stampede::prelude::*;
use std::num::NonZeroU32;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn stress_workload_passes() {
    let (service, base_url) = mock(MockConfig::default()).await;
    let workload = orders::stress_workload(&base_url).unwrap();

    let report = LoadTest::new("orders", workload)
        .tiers(&[1, 10])
        .await
        .unwrap();

    assert!(report.passed(), "{report}");
    for tier in report.tiers() {
        assert_eq!(tier.user_results().len(), tier.tier_size());
        for user in tier.user_results() {
            assert_eq!(user.outcomes().len(), 2);
            assert!(user.outcomes().iter().all(|o| o.succeeded));
            assert_eq!(user.outcomes()[1].status, Some(201));
        }
    }
    assert_eq!(service.requests(), 22);
    assert_eq!(service.orders().len(), 2 + 11);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(60_000)]
async fn tiers_reported_in_order() {
    let (_service, base_url) = mock(MockConfig::default()).await;
    let workload = orders::stress_workload(&base_url).unwrap();

    let report = stampede::run(workload, &[1, 10, 100]).await.unwrap();

    let summary = summarize_report(&report);
    assert!(summary.overall_passed);
    let sizes: Vec<_> = summary.per_tier.iter().map(|t| t.tier_size).collect();
    assert_eq!(sizes, vec![1, 10, 100]);
    assert_eq!(summary.per_tier[2].request_count, 200);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn malformed_list_stops_each_user() {
    let (service, base_url) = mock(MockConfig {
        malformed_list: true,
        ..Default::default()
    })
    .await;
    let workload = orders::stress_workload(&base_url).unwrap();

    let report = stampede::run(workload, &[5]).await.unwrap();
    assert!(!report.passed());

    let tier = &report.tiers()[0];
    assert_eq!(tier.failure_count(), 5);
    for user in tier.user_results() {
        assert_eq!(user.outcomes().len(), 1);
        assert_eq!(user.outcomes()[0].error_kind, Some(ErrorKind::Decode));
        assert_eq!(user.outcomes()[0].status, Some(200));
    }
    // The create step never ran.
    assert_eq!(service.requests(), 5);
    assert_eq!(service.orders().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn server_error_is_an_http_status_failure() {
    let (_service, base_url) = mock(MockConfig {
        fail_create: true,
        ..Default::default()
    })
    .await;
    let workload = orders::stress_workload(&base_url).unwrap();

    let report = stampede::run(workload, &[3]).await.unwrap();
    assert!(!report.passed());

    let summary = report.summarize();
    assert_eq!(summary.per_tier[0].errors.get(&ErrorKind::HttpStatus), Some(&3));
    for user in report.tiers()[0].user_results() {
        let outcomes = user.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].succeeded);
        assert_eq!(outcomes[1].status, Some(500));
    }
}

#[tokio::test]
async fn zero_tier_sends_nothing() -> anyhow::Result<()> {
    let (service, base_url) = mock(MockConfig::default()).await;
    let workload = orders::stress_workload(&base_url)?;

    let res = stampede::run(workload, &[1, 0]).await;
    assert!(matches!(res, Err(ConfigError::ZeroTier { index: 1 })));
    assert_eq!(service.requests(), 0);
    Ok(())
}

#[tokio::test]
async fn captured_ids_stay_in_their_path_segment() -> anyhow::Result<()> {
    let (service, base_url) = mock(MockConfig::default()).await;

    // The created order's id looks like a relative path to order 1.
    let workload = HttpWorkload::builder(&base_url)
        .operation(
            orders::create(&Order::new("x/../1", "Item x", 1))
                .decode(Decode::Order)
                .capture("id", "/id"),
        )
        .operation(orders::delete("{id}"))
        .build()?;

    let report = stampede::run(workload, &[1]).await?;
    assert!(report.passed(), "{report}");

    // The delete removed the created order, not order 1.
    assert_eq!(
        service.orders(),
        vec![Order::new("1", "Item 1", 10), Order::new("2", "Item 2", 20)]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn slow_response_times_out() {
    let (_service, base_url) = mock(MockConfig {
        delay: Duration::from_millis(500),
        ..Default::default()
    })
    .await;
    let workload = HttpWorkload::builder(&base_url)
        .operation(orders::list().timeout(Duration::from_millis(100)))
        .build()
        .unwrap();

    let report = stampede::run(workload, &[2]).await.unwrap();
    assert!(!report.passed());
    for user in report.tiers()[0].user_results() {
        assert_eq!(user.outcomes().len(), 1);
        assert_eq!(user.outcomes()[0].error_kind, Some(ErrorKind::Network));
        assert_eq!(user.outcomes()[0].status, None);
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn rate_limited_target_with_success_rate() {
    let (_service, base_url) = mock(MockConfig {
        max_tps: NonZeroU32::new(5),
        ..Default::default()
    })
    .await;
    let workload = std::sync::Arc::new(
        HttpWorkload::builder(&base_url)
            .operation(orders::list())
            .build()
            .unwrap(),
    );

    let strict = LoadTest::shared("strict", workload.clone())
        .tiers(&[50])
        .await
        .unwrap();
    assert!(!strict.passed());
    let tier = &strict.tiers()[0];
    assert!(tier.success_count() < 50);
    assert!(tier
        .user_results()
        .iter()
        .filter(|u| !u.succeeded())
        .all(|u| u.outcomes()[0].status == Some(503)));

    let relaxed = LoadTest::shared("relaxed", workload)
        .tiers(&[50])
        .success_rate(0.0)
        .await
        .unwrap();
    assert!(relaxed.passed());
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn lifecycle_cleans_up_after_itself() {
    let (service, base_url) = mock(MockConfig::default()).await;
    let workload = orders::lifecycle_workload(&base_url).unwrap();

    let report = stampede::run(workload, &[1, 20]).await.unwrap();

    assert!(report.passed(), "{report}");
    for user in report.tiers()[1].user_results() {
        assert_eq!(user.outcomes().len(), 5);
    }
    assert_eq!(service.requests(), 21 * 5);
    assert_eq!(service.orders(), vec![
        Order::new("1", "Item 1", 10),
        Order::new("2", "Item 2", 20),
    ]);
}

#[tokio::test(flavor = "multi_thread")]
#[ntest::timeout(30_000)]
async fn plan_from_toml_runs_end_to_end() {
    let (service, base_url) = mock(MockConfig::default()).await;
    let plan = LoadPlan::from_toml(&format!(
        r#"
        name = "plan"
        base_url = "{base_url}/"
        tiers = [2, 4]

        [[operations]]
        method = "GET"
        path = "/orders/1"
        decode = "order"
        expect_status = 200

        [[operations]]
        method = "PUT"
        path = "/orders/1/increase"
        body = {{ amount = 5 }}
        decode = "order"
        "#
    ))
    .unwrap();

    let workload = HttpWorkload::from_plan(&plan).unwrap();
    let report = LoadTest::with_config(std::sync::Arc::new(workload), plan.load_test_config())
        .await
        .unwrap();

    assert!(report.passed(), "{report}");
    assert_eq!(report.name(), "plan");
    assert_eq!(service.requests(), 12);

    let order = service.orders().into_iter().find(|o| o.id == "1").unwrap();
    assert_eq!(order.amount, 10 + 6 * 5);

    let json = serde_json::to_value(report.summarize()).unwrap();
    assert_eq!(json["overall_passed"], json!(true));
}
