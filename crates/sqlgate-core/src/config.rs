use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub executor: ExecutorSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar_file: Option<PathBuf>,
    pub run: RunSettings,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            cache: CacheSettings::default(),
            executor: ExecutorSettings::default(),
            grammar_file: None,
            run: RunSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Openai,
    Replay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_file: Option<PathBuf>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Openai,
            model: "gpt-5".to_string(),
            base_url: crate::providers::llm::openai::DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            replay_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
    pub max_entries: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: crate::gateway::DEFAULT_TTL_SECS,
            max_entries: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    Sqlite,
    Clickhouse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    pub kind: ExecutorKind,
    pub sqlite_path: PathBuf,
    pub clickhouse_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clickhouse_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clickhouse_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clickhouse_database: Option<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::Sqlite,
            sqlite_path: PathBuf::from("pp_complete.db"),
            clickhouse_url: "http://localhost:8123".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            clickhouse_database: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub parallel: usize,
    /// Deadline for one scenario (generation plus execution).
    pub timeout_seconds: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            parallel: 4,
            timeout_seconds: 60,
        }
    }
}

/// Reads the YAML file (if any), then applies `SQLGATE_*` overrides from the
/// process environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match path {
        Some(p) => parse_file(p)?,
        None => AppConfig::default(),
    };
    apply_env(&mut cfg, |k| std::env::var(k).ok());
    validate(&cfg)?;
    Ok(cfg)
}

fn parse_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_str(&raw, path)
}

fn parse_str(raw: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let mut ignored = Vec::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);
    let mut cfg: AppConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored.push(p.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML {}: {}", path.display(), e)))?;

    if !ignored.is_empty() {
        tracing::warn!(
            event = "config_unknown_fields",
            file = %path.display(),
            fields = ?ignored
        );
    }

    let base = path.parent().unwrap_or(Path::new("."));
    resolve_relative(&mut cfg.grammar_file, base);
    resolve_relative(&mut cfg.provider.replay_file, base);
    if cfg.executor.sqlite_path.is_relative() {
        cfg.executor.sqlite_path = base.join(&cfg.executor.sqlite_path);
    }
    Ok(cfg)
}

fn resolve_relative(p: &mut Option<PathBuf>, base: &Path) {
    if let Some(path) = p.as_mut() {
        if path.is_relative() {
            *path = base.join(&*path);
        }
    }
}

pub fn apply_env<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SQLGATE_LOG") {
        cfg.log_level = v;
    }
    if let Some(v) = lookup("SQLGATE_MODEL") {
        cfg.provider.model = v;
    }
    if let Some(v) = lookup("SQLGATE_BASE_URL") {
        cfg.provider.base_url = v;
    }
    if let Some(n) = lookup("SQLGATE_CACHE_TTL_SECS").and_then(|v| v.parse().ok()) {
        cfg.cache.ttl_seconds = n;
    }
    if let Some(n) = lookup("SQLGATE_CACHE_ENTRIES").and_then(|v| v.parse().ok()) {
        cfg.cache.max_entries = n;
    }
    if let Some(n) = lookup("SQLGATE_PARALLEL").and_then(|v| v.parse().ok()) {
        cfg.run.parallel = n;
    }
    if let Some(n) = lookup("SQLGATE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        cfg.run.timeout_seconds = n;
    }
    if let Some(v) = lookup("SQLGATE_CLICKHOUSE_URL") {
        cfg.executor.clickhouse_url = v;
    }
    if let Some(v) = lookup("SQLGATE_CLICKHOUSE_USER") {
        cfg.executor.clickhouse_user = Some(v);
    }
    if let Some(v) = lookup("SQLGATE_CLICKHOUSE_PASSWORD") {
        cfg.executor.clickhouse_password = Some(v);
    }
}

/// Longest generation TTL the config accepts (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

pub fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.cache.ttl_seconds == 0 {
        return Err(ConfigError("cache.ttl_seconds must be > 0".into()));
    }
    if cfg.cache.ttl_seconds > MAX_TTL_SECS {
        return Err(ConfigError(format!(
            "cache.ttl_seconds must be <= {} (got {})",
            MAX_TTL_SECS, cfg.cache.ttl_seconds
        )));
    }
    if cfg.cache.max_entries == 0 {
        return Err(ConfigError("cache.max_entries must be > 0".into()));
    }
    if cfg.run.parallel == 0 {
        return Err(ConfigError("run.parallel must be > 0".into()));
    }
    if cfg.provider.kind == ProviderKind::Replay && cfg.provider.replay_file.is_none() {
        return Err(ConfigError(
            "provider.kind=replay requires provider.replay_file".into(),
        ));
    }
    Ok(())
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))
}

pub const SAMPLE_CONFIG: &str = r#"provider:
  kind: openai
  model: gpt-5
  api_key_env: OPENAI_API_KEY
cache:
  ttl_seconds: 120
  max_entries: 1024
executor:
  kind: sqlite
  sqlite_path: pp_complete.db
run:
  parallel: 4
  timeout_seconds: 60
log_level: info
"#;
