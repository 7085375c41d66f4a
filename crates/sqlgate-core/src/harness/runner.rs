use super::{EXECUTES_WITHOUT_ERROR, REFUSED_SAFELY};
use crate::errors::ExecutionFailure;
use crate::executor::QueryExecutor;
use crate::gateway::Gateway;
use crate::model::{AssertionResult, EvalOutcome, EvalScenario, Row};
use std::time::Instant;

/// Single-shot run of one scenario. Generation and execution failures are
/// folded into the outcome; nothing here is retried.
pub async fn run(gateway: &Gateway, executor: &dyn QueryExecutor, s: &EvalScenario) -> EvalOutcome {
    let start = Instant::now();
    let generated = gateway.generate(s.query).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let mut outcome = EvalOutcome {
        scenario_id: s.id.to_string(),
        name: s.name.to_string(),
        category: s.category,
        query: s.query.to_string(),
        generated_sql: None,
        generation_error: None,
        execution_error: None,
        cached: false,
        row_count: 0,
        duration_ms,
        assertions: Vec::new(),
        overall_passed: false,
    };

    let sql = match generated {
        Ok(g) => {
            outcome.cached = g.cached;
            outcome.generated_sql = Some(g.sql.clone());
            Some(g.sql)
        }
        Err(e) => {
            tracing::info!(event = "generation_failed", scenario = s.id, error = %e);
            outcome.generation_error = Some(e.to_string());
            None
        }
    };

    if sql.is_none() && s.generation_failure_is_pass {
        outcome.assertions = refusal_results(s);
        outcome.overall_passed = all_passed(&outcome.assertions);
        return outcome;
    }

    let rows = match sql.as_deref() {
        Some(sql) => match executor.run(sql).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::info!(event = "execution_failed", scenario = s.id, error = %e);
                outcome.execution_error = Some(ExecutionFailure::from(e).to_string());
                None
            }
        },
        None => None,
    };
    outcome.row_count = rows.as_ref().map(Vec::len).unwrap_or(0);

    outcome.assertions = score(s, sql.as_deref(), rows.as_deref(), outcome.execution_error.is_some());
    outcome.overall_passed = all_passed(&outcome.assertions);
    outcome
}

/// Scores a non-refusal run. `sql` is `None` when generation failed; `rows`
/// is `None` when nothing was executed or execution failed.
pub fn score(
    s: &EvalScenario,
    sql: Option<&str>,
    rows: Option<&[Row]>,
    execution_failed: bool,
) -> Vec<AssertionResult> {
    let mut out = Vec::new();

    for (name, predicate) in s.sql_assertions() {
        let passed = sql.map(predicate).unwrap_or(false);
        out.push(result(name, passed));
    }

    // predicates may assume at least one row
    let non_empty = rows.filter(|r| !r.is_empty());
    for (name, predicate) in s.result_assertions() {
        let passed = non_empty.map(predicate).unwrap_or(false);
        out.push(result(name, passed));
    }

    out.push(result(
        EXECUTES_WITHOUT_ERROR,
        sql.is_some() && !execution_failed,
    ));
    out
}

fn refusal_results(s: &EvalScenario) -> Vec<AssertionResult> {
    s.sql_assertions()
        .map(|(name, _)| result(name, true))
        .chain([result(REFUSED_SAFELY, true), result(EXECUTES_WITHOUT_ERROR, true)])
        .collect()
}

pub fn all_passed(results: &[AssertionResult]) -> bool {
    results.iter().all(|r| r.passed)
}

fn result(name: &str, passed: bool) -> AssertionResult {
    AssertionResult {
        name: name.to_string(),
        passed,
    }
}
