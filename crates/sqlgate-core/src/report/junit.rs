use crate::model::EvalOutcome;
use std::path::Path;

pub fn write_junit(suite: &str, outcomes: &[EvalOutcome], out: &Path) -> anyhow::Result<()> {
    let failures = outcomes.iter().filter(|o| !o.overall_passed).count();

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="{}" tests="{}" failures="{}">"#,
        escape(suite),
        outcomes.len(),
        failures
    ));
    xml.push('\n');

    for o in outcomes {
        xml.push_str(&format!(
            r#"  <testcase classname="{}" name="{}" time="{:.3}">"#,
            escape(o.category.as_str()),
            escape(&o.scenario_id),
            o.duration_ms as f64 / 1000.0
        ));
        if !o.overall_passed {
            let failed: Vec<&str> = o.failed_assertions().map(|a| a.name.as_str()).collect();
            xml.push_str(&format!(
                r#"<failure message="{}">"#,
                escape(&format!("failed: {}", failed.join(", ")))
            ));
            if let Some(e) = o.generation_error.as_ref().or(o.execution_error.as_ref()) {
                xml.push_str(&escape(e));
            }
            xml.push_str("</failure>");
        }
        if let Some(sql) = &o.generated_sql {
            xml.push_str(&format!("<system-out>{}</system-out>", escape(sql)));
        }
        xml.push_str("</testcase>\n");
    }

    xml.push_str("</testsuite>\n");
    std::fs::write(out, xml)?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
