use sqlgate_core::cache::BoundedCache;
use sqlgate_core::executor::SqliteExecutor;
use sqlgate_core::gateway::Gateway;
use sqlgate_core::grammar::GrammarConstraint;
use sqlgate_core::harness::{Harness, EXECUTES_WITHOUT_ERROR, REFUSED_SAFELY};
use sqlgate_core::model::EvalOutcome;
use sqlgate_core::providers::llm::fake::{FakeProvider, FakeReply};
use sqlgate_scenarios::default_scenarios;
use sqlgate_scenarios::registry::{
    GRAMMAR_CONFORMANCE, RESULT_PROPERTY_TYPES, SAFETY_INJECTION, SEMANTIC_DETACHED_OVER_500K,
};
use std::sync::Arc;
use std::time::Duration;

const SEED: &str = "
INSERT INTO pp_complete (date, price, postcode1, postcode2, type, is_new, duration, street, town, district, county) VALUES
 ('2021-03-01', 725000, 'SW1A', '1AA', 'detached', 0, 'freehold', 'Mall', 'London', 'Westminster', 'Greater London'),
 ('2021-04-12', 410000, 'OX1', '2JD', 'detached', 1, 'freehold', 'High St', 'Oxford', 'Oxford', 'Oxfordshire'),
 ('2022-01-20', 910000, 'BA1', '1LZ', 'detached', 0, 'freehold', 'Royal Cres', 'Bath', 'Bath', 'Somerset'),
 ('2021-07-07', 330000, 'M1', '4BT', 'semi-detached', 0, 'freehold', 'Oak Rd', 'Manchester', 'Manchester', 'Greater Manchester'),
 ('2022-02-02', 280000, 'LS1', '5AB', 'terraced', 0, 'freehold', 'Mill Ln', 'Leeds', 'Leeds', 'West Yorkshire'),
 ('2022-05-05', 295000, 'LS2', '7QQ', 'terraced', 1, 'leasehold', 'Kirk St', 'Leeds', 'Leeds', 'West Yorkshire'),
 ('2020-11-30', 210000, 'B1', '1BB', 'flat', 0, 'leasehold', 'Canal Wk', 'Birmingham', 'Birmingham', 'West Midlands'),
 ('2023-06-15', 1500000, 'EC1', '9XY', 'other', 0, 'freehold', 'Quay', 'London', 'City', 'Greater London');
";

fn store() -> Arc<SqliteExecutor> {
    let db = SqliteExecutor::memory().unwrap();
    db.init_schema().unwrap();
    db.execute_batch(SEED).unwrap();
    Arc::new(db)
}

fn harness(provider: FakeProvider) -> Harness {
    let gateway = Gateway::new(
        Arc::new(provider),
        Arc::new(BoundedCache::new(64, Duration::from_secs(600))),
        GrammarConstraint::price_paid(),
    );
    Harness::new(Arc::new(gateway), store(), default_scenarios()).unwrap()
}

fn failed(o: &EvalOutcome) -> Vec<&str> {
    o.failed_assertions().map(|a| a.name.as_str()).collect()
}

const TYPES_BY_COUNT: &str =
    "SELECT type, count(*) AS c FROM pp_complete GROUP BY type ORDER BY c DESC";

#[tokio::test]
async fn test_semantic_scenario_passes_with_reference_sql() {
    let h = harness(FakeProvider::always(
        "SELECT count(*) FROM pp_complete WHERE type = 'detached' AND price > 500000",
    ));
    let o = h.run_scenario(SEMANTIC_DETACHED_OVER_500K).await.unwrap();

    assert!(o.overall_passed, "failed: {:?}", failed(&o));
    assert_eq!(o.row_count, 1);
    assert_eq!(o.assertions.len(), 5);
    assert!(o.assertion(EXECUTES_WITHOUT_ERROR).unwrap().passed);
}

#[tokio::test]
async fn test_semantic_scenario_flags_the_missing_filter_only() {
    let h = harness(FakeProvider::always(
        "SELECT COUNT(*) FROM pp_complete WHERE price > 500000",
    ));
    let o = h.run_scenario(SEMANTIC_DETACHED_OVER_500K).await.unwrap();

    assert!(!o.overall_passed);
    assert_eq!(failed(&o), vec!["filters type = 'detached'"]);
}

#[tokio::test]
async fn test_grammar_scenario_passes_on_known_columns() {
    let h = harness(FakeProvider::always(
        "SELECT county, avg(price) AS avg_price FROM pp_complete \
         WHERE type = 'semi-detached' GROUP BY county ORDER BY avg_price DESC",
    ));
    let o = h.run_scenario(GRAMMAR_CONFORMANCE).await.unwrap();
    assert!(o.overall_passed, "failed: {:?}", failed(&o));
}

#[tokio::test]
async fn test_grammar_scenario_rejects_invented_column() {
    let h = harness(FakeProvider::always(
        "SELECT county, avg(bedrooms) FROM pp_complete GROUP BY county",
    ));
    let o = h.run_scenario(GRAMMAR_CONFORMANCE).await.unwrap();

    assert!(!o.overall_passed);
    assert!(failed(&o).contains(&"only known columns"));
    // sqlite rejects the column too
    assert!(o.execution_error.is_some());
    assert!(failed(&o).contains(&EXECUTES_WITHOUT_ERROR));
}

#[tokio::test]
async fn test_property_types_all_five_present() {
    let h = harness(FakeProvider::always(TYPES_BY_COUNT));
    let o = h.run_scenario(RESULT_PROPERTY_TYPES).await.unwrap();

    assert!(o.overall_passed, "failed: {:?}", failed(&o));
    assert_eq!(o.row_count, 5);
    // 2 sql + 6 result + terminal
    assert_eq!(o.assertions.len(), 9);
}

#[tokio::test]
async fn test_property_types_four_rows_fail() {
    let h = harness(FakeProvider::always(
        "SELECT type, count(*) AS c FROM pp_complete WHERE type <> 'other' GROUP BY type",
    ));
    let o = h.run_scenario(RESULT_PROPERTY_TYPES).await.unwrap();

    assert!(!o.overall_passed);
    assert_eq!(o.row_count, 4);
    let f = failed(&o);
    assert!(f.contains(&"returns exactly 5 rows"));
    assert!(f.contains(&"all five property types present"));
    assert!(!f.contains(&"all counts positive"));
}

#[tokio::test]
async fn test_property_types_six_rows_fail() {
    let h = harness(FakeProvider::always(
        "SELECT type, count(*) AS c FROM pp_complete GROUP BY type \
         UNION ALL SELECT 'bungalow', 1",
    ));
    let o = h.run_scenario(RESULT_PROPERTY_TYPES).await.unwrap();

    assert!(!o.overall_passed);
    assert_eq!(o.row_count, 6);
    assert_eq!(failed(&o), vec!["returns exactly 5 rows"]);
}

#[tokio::test]
async fn test_property_types_empty_table_skips_result_predicates() {
    let gateway = Gateway::new(
        Arc::new(FakeProvider::always(TYPES_BY_COUNT)),
        Arc::new(BoundedCache::new(8, Duration::from_secs(600))),
        GrammarConstraint::price_paid(),
    );
    let empty = SqliteExecutor::memory().unwrap();
    empty.init_schema().unwrap();
    let h = Harness::new(Arc::new(gateway), Arc::new(empty), default_scenarios()).unwrap();

    let o = h.run_scenario(RESULT_PROPERTY_TYPES).await.unwrap();
    assert_eq!(o.row_count, 0);
    assert!(o.execution_error.is_none());
    assert_eq!(failed(&o).len(), 6);
    assert!(o.assertion(EXECUTES_WITHOUT_ERROR).unwrap().passed);
}

#[tokio::test]
async fn test_injection_refusal_is_a_pass() {
    let h = harness(FakeProvider::refusing());
    let o = h.run_scenario(SAFETY_INJECTION).await.unwrap();

    assert!(o.overall_passed);
    assert!(o.generated_sql.is_none());
    assert!(o.generation_error.is_some());
    assert!(o.assertion(REFUSED_SAFELY).unwrap().passed);
}

#[tokio::test]
async fn test_injection_chained_drop_fails() {
    let h = harness(FakeProvider::always(
        "SELECT price FROM pp_complete; DROP TABLE pp_complete;",
    ));
    let o = h.run_scenario(SAFETY_INJECTION).await.unwrap();

    assert!(!o.overall_passed);
    let f = failed(&o);
    assert!(f.contains(&"no destructive keywords"));
    assert!(f.contains(&"at most one statement terminator"));
}

#[tokio::test]
async fn test_injection_safe_select_passes() {
    let h = harness(FakeProvider::new(|q| {
        assert!(q.contains("DROP TABLE"), "raw question is forwarded untouched");
        FakeReply::Sql(
            "SELECT street, town, price FROM pp_complete ORDER BY price DESC LIMIT 10".into(),
        )
    }));
    let o = h.run_scenario(SAFETY_INJECTION).await.unwrap();

    assert!(o.overall_passed, "failed: {:?}", failed(&o));
    assert_eq!(o.row_count, 8);
}

#[tokio::test]
async fn test_run_all_in_registry_order() {
    let h = Arc::new(harness(FakeProvider::new(|q| {
        if q.contains("500000") {
            FakeReply::Sql(
                "SELECT count(*) FROM pp_complete WHERE type = 'detached' AND price > 500000"
                    .into(),
            )
        } else if q.contains("property types") {
            FakeReply::Sql(TYPES_BY_COUNT.into())
        } else if q.contains("DROP") {
            FakeReply::NoToolCall
        } else {
            FakeReply::Sql(
                "SELECT county, avg(price) FROM pp_complete GROUP BY county".into(),
            )
        }
    })));

    let outcomes = h.run_all(2).await.unwrap();
    let ids: Vec<_> = outcomes.iter().map(|o| o.scenario_id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            GRAMMAR_CONFORMANCE,
            SEMANTIC_DETACHED_OVER_500K,
            SAFETY_INJECTION,
            RESULT_PROPERTY_TYPES
        ]
    );
    assert!(outcomes.iter().all(|o| o.overall_passed));
}
