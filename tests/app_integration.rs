use chrono::{Duration, Utc};
use fundrec::core::fund::RiskLevel;
use fundrec::store::Stores;
use std::fs;
use std::sync::Arc;
use tracing::info;

mod test_utils {
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Builds an mfapi.in style payload: newest-first rows, dates as
    /// DD-MM-YYYY, NAVs as strings.
    pub fn scheme_payload(
        scheme_code: u32,
        scheme_name: &str,
        scheme_category: &str,
        days: usize,
        step: f64,
    ) -> String {
        let today = Utc::now().date_naive();
        let data: Vec<_> = (0..days)
            .map(|age| {
                let date = today - Duration::days(age as i64);
                let value = 100.0 + step * (days - 1 - age) as f64;
                json!({"date": date.format("%d-%m-%Y").to_string(), "nav": format!("{value:.4}")})
            })
            .collect();
        json!({
            "meta": {
                "scheme_code": scheme_code,
                "scheme_name": scheme_name,
                "scheme_category": scheme_category,
            },
            "data": data,
        })
        .to_string()
    }

    pub async fn mount_scheme(server: &MockServer, scheme_code: u32, payload: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/mf/{scheme_code}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload))
            .mount(server)
            .await;
    }
}

/// Sync, validate, metrics and recommend driven end to end through the
/// command layer against a mocked provider and an on-disk keyspace.
#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock_provider() {
    let mock_server = wiremock::MockServer::start().await;
    // Six years of daily history, three equity peers with distinct
    // growth and one scheme too young to recommend.
    for (code, name, step, days) in [
        (100001, "Alpha Equity Fund - Direct Plan", 0.02, 2200),
        (100002, "Beta Equity Fund - Direct Plan", 0.08, 2200),
        (100003, "Gamma Equity Fund", 0.05, 2200),
        (100004, "Delta Equity Fund", 0.05, 400),
    ] {
        let payload = test_utils::scheme_payload(code, name, "Equity Scheme - Large Cap", days, step);
        test_utils::mount_scheme(&mock_server, code, &payload).await;
    }

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
funds: [100001, 100002, 100003, 100004]
providers:
  nav:
    base_url: "{}"
data_dir: "{}"
"#,
        mock_server.uri(),
        data_dir.path().display()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");
    let config_path = config_file.path().to_str().unwrap();

    for command in [
        fundrec::AppCommand::Sync,
        fundrec::AppCommand::Validate,
        fundrec::AppCommand::Metrics,
        fundrec::AppCommand::Recommend {
            risk: Some(RiskLevel::High),
            categories: vec![],
        },
    ] {
        let result = fundrec::run_command(command, Some(config_path)).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }

    // Inspect the keyspace the commands wrote.
    let stores = Stores::open(data_dir.path()).expect("Failed to reopen stores");

    let beta = stores.directory.get(100002).await.unwrap().unwrap();
    assert_eq!(beta.display_name, "Beta Equity Fund - Direct Plan");
    assert_eq!(beta.category, "equity");
    assert_eq!(beta.plan_type, "Direct");
    assert!(beta.is_active && beta.eligible_for_reco);

    let delta = stores.directory.get(100004).await.unwrap().unwrap();
    assert!(delta.is_active, "400 points is active");
    assert!(!delta.eligible_for_reco, "400 points is below the reco floor");

    let metrics = stores.metrics.all().await.unwrap();
    info!(count = metrics.len(), "Metrics written");
    assert_eq!(metrics.len(), 3, "only eligible funds get metrics");

    let beta_metrics = stores.metrics.get(100002).await.unwrap().unwrap();
    assert!(beta_metrics.cagr_5y.is_some());
    assert!(
        beta_metrics.norm_cagr_5y > 0.0,
        "steepest growth sits above its peer mean"
    );
}

/// Scenario test for the advisory conversation over computed metrics,
/// persisted sessions included.
#[test_log::test(tokio::test)]
async fn test_advisory_conversation_over_computed_metrics() {
    use fundrec::core::fund::{ExpenseSnapshot, FundRecord};
    use fundrec::core::nav::NavPoint;
    use fundrec::engine::orchestrator::{Orchestrator, TurnOutcome};
    use fundrec::engine::recommender::Recommender;
    use fundrec::engine::session::MemorySessionStore;
    use fundrec::engine::snapshot::QuestionIntent;
    use fundrec::pipeline::MetricsPipeline;

    let stores = Stores::in_memory();
    let start = Utc::now().date_naive() - Duration::days(2200);
    for (fund_id, category, step) in [
        (1, "equity", 0.02),
        (2, "equity", 0.08),
        (3, "equity", 0.05),
        (4, "debt", 0.01),
    ] {
        stores
            .directory
            .upsert(FundRecord::new(fund_id, format!("Fund {fund_id}"), category))
            .await
            .unwrap();
        let points: Vec<NavPoint> = (0..2200)
            .map(|i| NavPoint {
                fund_id,
                date: start + Duration::days(i),
                value: 100.0 + step * i as f64,
            })
            .collect();
        stores.nav.bulk_insert(&points).await.unwrap();
        stores
            .expenses
            .upsert(ExpenseSnapshot {
                fund_id,
                plan_type: "Direct".to_string(),
                as_of_month: "2026-07".to_string(),
                ter: 0.5 + 0.1 * fund_id as f64,
            })
            .await
            .unwrap();
    }

    MetricsPipeline::new(stores.clone(), None).run(None).await.unwrap();

    // Scenario: the debt category has a single member, so every z-score
    // and therefore its composite score is exactly zero.
    let debt = Recommender::new(stores.clone())
        .rank(&["debt".to_string()])
        .await
        .unwrap();
    assert_eq!(debt.len(), 1);
    assert_eq!(debt[0].score, 0.0);

    let orchestrator = Orchestrator::new(
        Recommender::new(stores),
        Arc::new(MemorySessionStore::new()),
    );

    let outcome = orchestrator.handle_turn("s", "I need some advice").await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Question(QuestionIntent::AskRiskPreference)
    );

    let outcome = orchestrator.handle_turn("s", "high risk").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Question(QuestionIntent::AskTimeHorizon));

    let outcome = orchestrator.handle_turn("s", "10 years").await.unwrap();
    let TurnOutcome::Recommendations(funds) = outcome else {
        panic!("expected recommendations, got {outcome:?}");
    };
    assert!(funds.len() <= 5);
    assert!(funds.iter().all(|f| f.category == "equity"));
    assert!(funds.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(funds[0].fund_id, 2, "steepest growth ranks first");

    // Follow-ups are served from the stored list.
    let outcome = orchestrator.handle_turn("s", "compare 1 and 2").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Comparison { .. }));
    let outcome = orchestrator.handle_turn("s", "explain 1").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Explanation(_)));
}
