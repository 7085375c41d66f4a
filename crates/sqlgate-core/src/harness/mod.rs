pub mod runner;

use crate::errors::HarnessError;
use crate::executor::QueryExecutor;
use crate::gateway::Gateway;
use crate::model::{EvalOutcome, EvalScenario, ScenarioSummary};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const REFUSED_SAFELY: &str = "refused safely";
pub const EXECUTES_WITHOUT_ERROR: &str = "executes without error";

/// Runs registered scenarios through the gateway and the executor.
pub struct Harness {
    gateway: Arc<Gateway>,
    executor: Arc<dyn QueryExecutor>,
    scenarios: Vec<EvalScenario>,
}

impl Harness {
    pub fn new(
        gateway: Arc<Gateway>,
        executor: Arc<dyn QueryExecutor>,
        scenarios: Vec<EvalScenario>,
    ) -> Result<Self, HarnessError> {
        let mut seen = HashSet::new();
        for s in &scenarios {
            if !seen.insert(s.id) {
                return Err(HarnessError::DuplicateScenario(s.id.to_string()));
            }
        }
        Ok(Self {
            gateway,
            executor,
            scenarios,
        })
    }

    pub fn scenarios(&self) -> &[EvalScenario] {
        &self.scenarios
    }

    pub fn list_scenarios(&self) -> Vec<ScenarioSummary> {
        self.scenarios.iter().map(summarize).collect()
    }

    pub async fn run_scenario(&self, id: &str) -> Result<EvalOutcome, HarnessError> {
        let scenario = self
            .scenarios
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| HarnessError::NotFound(id.to_string()))?;

        let outcome = runner::run(&self.gateway, self.executor.as_ref(), scenario).await;
        tracing::info!(
            event = "scenario_finished",
            scenario = scenario.id,
            passed = outcome.overall_passed,
            cached = outcome.cached,
            duration_ms = outcome.duration_ms
        );
        Ok(outcome)
    }

    /// Runs every registered scenario, at most `parallel` at a time. Outcomes
    /// come back in registry order.
    pub async fn run_all(self: &Arc<Self>, parallel: usize) -> anyhow::Result<Vec<EvalOutcome>> {
        let sem = Arc::new(Semaphore::new(parallel.max(1)));
        let mut handles = Vec::with_capacity(self.scenarios.len());

        for s in &self.scenarios {
            let permit = sem.clone().acquire_owned().await?;
            let this = Arc::clone(self);
            let id = s.id;
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                this.run_scenario(id).await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for h in handles {
            outcomes.push(h.await??);
        }
        Ok(outcomes)
    }
}

/// Listing view of a scenario; needs no gateway or executor.
pub fn summarize(s: &EvalScenario) -> ScenarioSummary {
    let assertions = s
        .sql_assertions()
        .map(|(name, _)| name.to_string())
        .chain(s.result_assertions().map(|(name, _)| name.to_string()))
        .chain(std::iter::once(EXECUTES_WITHOUT_ERROR.to_string()))
        .collect();
    ScenarioSummary {
        id: s.id.to_string(),
        name: s.name.to_string(),
        description: s.description.to_string(),
        category: s.category,
        query: s.query.to_string(),
        assertions,
    }
}
