use crate::model::{EvalOutcome, ScenarioSummary};

/// Listing goes to stdout; it is the command's output.
pub fn print_scenarios(scenarios: &[ScenarioSummary]) {
    for s in scenarios {
        println!("{:<28} [{}] {}", s.id, s.category, s.name);
        println!("    {}", s.description);
        println!("    Query: \"{}\"", s.query);
        for a in &s.assertions {
            println!("      - {}", a);
        }
    }
}

pub fn print_summary(outcomes: &[EvalOutcome]) {
    let mut pass = 0;
    let mut fail = 0;

    eprintln!("\nRunning {} scenarios...", outcomes.len());

    for o in outcomes {
        let duration = format!("({:.1}s)", o.duration_ms as f64 / 1000.0);
        let cached = if o.cached { " [cached]" } else { "" };

        if o.overall_passed {
            pass += 1;
            eprintln!("✅ {:<28} PASS  {}{}", o.scenario_id, duration, cached);
            if o.generation_error.is_some() {
                eprintln!("    (refused: {})", o.generation_error.as_deref().unwrap_or(""));
            }
            continue;
        }

        fail += 1;
        eprintln!("❌ {:<28} FAIL  {}{}", o.scenario_id, duration, cached);
        let display_query = if o.query.len() > 100 {
            format!("{}...", o.query.chars().take(100).collect::<String>())
        } else {
            o.query.clone()
        };
        eprintln!("      Query: \"{}\"", display_query);
        if let Some(sql) = &o.generated_sql {
            eprintln!("      SQL: {}", sql.trim());
        }
        if let Some(e) = &o.generation_error {
            eprintln!("      Generation error: {}", e);
        }
        if let Some(e) = &o.execution_error {
            eprintln!("      Execution error: {}", e);
        }
        eprintln!("      Rows: {}", o.row_count);
        for a in o.failed_assertions() {
            eprintln!("      → {}", a.name);
        }
    }

    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprintln!("Summary: {} passed, {} failed", pass, fail);
}
