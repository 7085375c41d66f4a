use super::args::*;
use anyhow::Context;
use sqlgate_core::cache::BoundedCache;
use sqlgate_core::config::{self, AppConfig, ExecutorKind, ProviderKind};
use sqlgate_core::errors::ConfigError;
use sqlgate_core::executor::{ClickHouseExecutor, QueryExecutor, SqliteExecutor};
use sqlgate_core::gateway::Gateway;
use sqlgate_core::grammar::GrammarConstraint;
use sqlgate_core::harness::Harness;
use sqlgate_core::providers::llm::openai::OpenAiGrammarProvider;
use sqlgate_core::providers::llm::GenerationProvider;
use sqlgate_core::providers::replay::ReplayProvider;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub mod generate;
pub mod init_db;
pub mod run;
pub mod scenarios;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const TEST_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.config.as_deref();
    match cli.cmd {
        Command::Scenarios(args) => scenarios::cmd_scenarios(args),
        Command::Run(args) => run::cmd_run(args, config).await,
        Command::Generate(args) => generate::cmd_generate(args, config).await,
        Command::InitDb(args) => init_db::cmd_init_db(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Loads the config, applies the command-line overrides and installs
/// logging. Errors are reported here; `None` means exit with CONFIG_ERROR.
pub(crate) fn prepare(path: Option<&Path>, backend: &BackendArgs) -> Option<AppConfig> {
    let loaded = config::load_config(path).and_then(|cfg| apply_backend(cfg, backend));
    match loaded {
        Ok(cfg) => {
            crate::init_logging(&cfg.log_level);
            Some(cfg)
        }
        Err(e) => {
            eprintln!("{e}");
            None
        }
    }
}

/// Folds command-line overrides into the loaded config and re-validates.
pub(crate) fn apply_backend(mut cfg: AppConfig, b: &BackendArgs) -> Result<AppConfig, ConfigError> {
    if let Some(path) = &b.replay_file {
        cfg.provider.kind = ProviderKind::Replay;
        cfg.provider.replay_file = Some(path.clone());
    }
    match b.provider {
        Some(ProviderChoice::Openai) => cfg.provider.kind = ProviderKind::Openai,
        Some(ProviderChoice::Replay) => cfg.provider.kind = ProviderKind::Replay,
        None => {}
    }
    if let Some(db) = &b.db {
        cfg.executor.kind = ExecutorKind::Sqlite;
        cfg.executor.sqlite_path = db.clone();
    }
    if let Some(model) = &b.model {
        cfg.provider.model = model.clone();
    }
    config::validate(&cfg)?;
    Ok(cfg)
}

pub(crate) fn build_provider(cfg: &AppConfig) -> anyhow::Result<Arc<dyn GenerationProvider>> {
    let p = &cfg.provider;
    match p.kind {
        ProviderKind::Openai => {
            let key = std::env::var(&p.api_key_env).map_err(|_| {
                ConfigError(format!("provider openai requires {} to be set", p.api_key_env))
            })?;
            Ok(Arc::new(OpenAiGrammarProvider::with_base_url(
                p.model.clone(),
                key,
                p.base_url.clone(),
            )))
        }
        ProviderKind::Replay => {
            let path = p
                .replay_file
                .as_ref()
                .ok_or_else(|| ConfigError("provider.kind=replay requires provider.replay_file".into()))?;
            Ok(Arc::new(ReplayProvider::from_path(path)?))
        }
    }
}

pub(crate) fn build_executor(cfg: &AppConfig) -> anyhow::Result<Arc<dyn QueryExecutor>> {
    let e = &cfg.executor;
    match e.kind {
        ExecutorKind::Sqlite => {
            if !e.sqlite_path.exists() {
                return Err(ConfigError(format!(
                    "sqlite store {} not found (create it with `sqlgate init-db`)",
                    e.sqlite_path.display()
                ))
                .into());
            }
            Ok(Arc::new(SqliteExecutor::open(&e.sqlite_path)?))
        }
        ExecutorKind::Clickhouse => Ok(Arc::new(
            ClickHouseExecutor::new(e.clickhouse_url.clone())
                .with_credentials(e.clickhouse_user.clone(), e.clickhouse_password.clone())
                .with_database(e.clickhouse_database.clone()),
        )),
    }
}

pub(crate) fn build_gateway(cfg: &AppConfig) -> anyhow::Result<Gateway> {
    let grammar = match &cfg.grammar_file {
        Some(path) => GrammarConstraint::from_file(path)
            .with_context(|| format!("failed to load grammar {}", path.display()))?,
        None => GrammarConstraint::price_paid(),
    };
    let ttl = Duration::from_secs(cfg.cache.ttl_seconds);
    // moka sweeps a little after the logical expiry; liveness is checked on read
    let cache = BoundedCache::new(cfg.cache.max_entries, ttl.checked_mul(2).unwrap_or(ttl));
    let provider = build_provider(cfg)?;

    tracing::info!(
        event = "gateway_ready",
        provider = provider.provider_name(),
        grammar = %grammar.name,
        ttl_secs = cfg.cache.ttl_seconds
    );
    Ok(Gateway::new(provider, Arc::new(cache), grammar).with_ttl(ttl))
}

pub(crate) fn build_harness(cfg: &AppConfig) -> anyhow::Result<Harness> {
    let gateway = build_gateway(cfg)?;
    let executor = build_executor(cfg)?;
    tracing::info!(event = "executor_ready", executor = executor.executor_name());
    let harness = Harness::new(
        Arc::new(gateway),
        executor,
        sqlgate_scenarios::default_scenarios(),
    )?;
    Ok(harness)
}

/// Wiring errors that stem from configuration map to exit code 2; anything
/// else propagates as fatal.
pub(crate) fn config_failure(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ConfigError>().is_some()
}
