use crate::model::EvalOutcome;
use serde_json::json;
use std::path::Path;

pub fn render(outcomes: &[EvalOutcome]) -> anyhow::Result<String> {
    let passed = outcomes.iter().filter(|o| o.overall_passed).count();
    let doc = json!({
        "schema_version": 1,
        "summary": {
            "total": outcomes.len(),
            "passed": passed,
            "failed": outcomes.len() - passed,
        },
        "outcomes": outcomes,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn write_json(outcomes: &[EvalOutcome], out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, render(outcomes)?)?;
    Ok(())
}
