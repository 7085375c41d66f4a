use super::{build_gateway, config_failure, exit_codes, prepare};
use crate::cli::args::GenerateArgs;
use std::path::Path;
use std::time::Duration;

pub async fn cmd_generate(args: GenerateArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let Some(cfg) = prepare(config, &args.backend) else {
        return Ok(exit_codes::CONFIG_ERROR);
    };

    let gateway = match build_gateway(&cfg) {
        Ok(g) => g,
        Err(e) if config_failure(&e) => {
            eprintln!("{e}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
        Err(e) => return Err(e),
    };

    let deadline = Duration::from_secs(cfg.run.timeout_seconds);
    match tokio::time::timeout(deadline, gateway.generate(&args.question)).await {
        Ok(Ok(generated)) => {
            println!("{}", generated.sql.trim());
            Ok(exit_codes::OK)
        }
        Ok(Err(failure)) => {
            eprintln!("generation failed: {failure}");
            Ok(exit_codes::TEST_FAILED)
        }
        Err(_) => {
            eprintln!("generation timed out after {}s", deadline.as_secs());
            Ok(exit_codes::TEST_FAILED)
        }
    }
}
