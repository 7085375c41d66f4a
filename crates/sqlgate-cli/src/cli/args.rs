use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqlgate",
    version,
    about = "Grammar-constrained text-to-SQL gateway with an evaluation harness"
)]
pub struct Cli {
    /// YAML config; defaults apply when omitted
    #[arg(long, global = true, env = "SQLGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the registered evaluation scenarios
    Scenarios(ScenariosArgs),
    /// Run one scenario, or all of them
    Run(RunArgs),
    /// Translate a single question into SQL
    Generate(GenerateArgs),
    /// Create the pp_complete schema in a SQLite file
    InitDb(InitDbArgs),
    /// Print the sqlgate version
    Version,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderChoice {
    Openai,
    Replay,
}

/// Overrides for the configured provider and store.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct BackendArgs {
    #[arg(long, value_enum)]
    pub provider: Option<ProviderChoice>,

    /// JSONL of recorded {"query", "sql"} pairs (implies --provider replay)
    #[arg(long)]
    pub replay_file: Option<PathBuf>,

    /// SQLite store to query (implies the sqlite executor)
    #[arg(long)]
    pub db: Option<PathBuf>,

    #[arg(long)]
    pub model: Option<String>,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ScenariosArgs {
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone, Debug)]
pub struct RunArgs {
    /// Scenario id (see `sqlgate scenarios`)
    #[arg(conflicts_with = "all", required_unless_present = "all")]
    pub id: Option<String>,

    #[arg(long)]
    pub all: bool,

    #[arg(long)]
    pub junit: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Max scenarios in flight with --all
    #[arg(long)]
    pub parallel: Option<usize>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GenerateArgs {
    pub question: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(clap::Args, Clone, Debug)]
pub struct InitDbArgs {
    #[arg(long, default_value = "pp_complete.db")]
    pub db: PathBuf,

    /// Also write a sample sqlgate.yaml here (skipped if it exists)
    #[arg(long)]
    pub write_config: Option<PathBuf>,
}
