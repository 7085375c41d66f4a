use super::{build_harness, config_failure, exit_codes, prepare};
use crate::cli::args::{OutputFormat, RunArgs};
use sqlgate_core::errors::HarnessError;
use sqlgate_core::model::EvalOutcome;
use sqlgate_core::report::{console, json, junit};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub async fn cmd_run(args: RunArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let Some(cfg) = prepare(config, &args.backend) else {
        return Ok(exit_codes::CONFIG_ERROR);
    };

    let harness = match build_harness(&cfg) {
        Ok(h) => Arc::new(h),
        Err(e) if config_failure(&e) => {
            eprintln!("{e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
        Err(e) => return Err(e),
    };

    let per_scenario = Duration::from_secs(cfg.run.timeout_seconds);
    tracing::info!(
        event = "run_started",
        scenario = args.id.as_deref().unwrap_or("*"),
        all = args.all,
        timeout_secs = cfg.run.timeout_seconds
    );
    let outcomes: Vec<EvalOutcome> = match &args.id {
        Some(id) => {
            match tokio::time::timeout(per_scenario, harness.run_scenario(id)).await {
                Ok(Ok(o)) => vec![o],
                Ok(Err(e @ HarnessError::NotFound(_))) => {
                    eprintln!("{e} (see `sqlgate scenarios`)");
                    return Ok(exit_codes::CONFIG_ERROR);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    eprintln!("scenario {id} timed out after {}s", per_scenario.as_secs());
                    return Ok(exit_codes::TEST_FAILED);
                }
            }
        }
        None => {
            let parallel = args.parallel.unwrap_or(cfg.run.parallel).max(1);
            // a full batch gets each scenario's allowance back to back
            let batch = per_scenario * harness.scenarios().len().max(1) as u32;
            match tokio::time::timeout(batch, harness.run_all(parallel)).await {
                Ok(res) => res?,
                Err(_) => {
                    eprintln!("run --all timed out after {}s", batch.as_secs());
                    return Ok(exit_codes::TEST_FAILED);
                }
            }
        }
    };

    if let Some(path) = &args.junit {
        junit::write_junit("sqlgate", &outcomes, path)?;
        eprintln!("wrote file: {}", path.display());
    }

    match args.format {
        OutputFormat::Json => println!("{}", json::render(&outcomes)?),
        OutputFormat::Text => console::print_summary(&outcomes),
    }

    Ok(decide_exit_code(&outcomes))
}

fn decide_exit_code(outcomes: &[EvalOutcome]) -> i32 {
    if outcomes.iter().all(|o| o.overall_passed) {
        exit_codes::OK
    } else {
        exit_codes::TEST_FAILED
    }
}
