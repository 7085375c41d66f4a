use super::exit_codes;
use crate::cli::args::{OutputFormat, ScenariosArgs};
use sqlgate_core::harness::summarize;
use sqlgate_core::model::ScenarioSummary;
use sqlgate_core::report::console;

pub fn cmd_scenarios(args: ScenariosArgs) -> anyhow::Result<i32> {
    let list: Vec<ScenarioSummary> = sqlgate_scenarios::default_scenarios()
        .iter()
        .map(summarize)
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
        OutputFormat::Text => console::print_scenarios(&list),
    }
    Ok(exit_codes::OK)
}
