use thiserror::Error;

/// Why the gateway could not hand back usable SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("provider returned no qualifying tool invocation")]
    NoToolInvocation,
    #[error("generated text does not start with {expected}: {preview:?}")]
    DisallowedStatement {
        expected: &'static str,
        preview: String,
    },
    #[error("provider call failed: {0}")]
    Provider(String),
}

/// The store rejected or failed the SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution failed: {0}")]
pub struct ExecutionFailure(pub String);

impl From<anyhow::Error> for ExecutionFailure {
    fn from(e: anyhow::Error) -> Self {
        ExecutionFailure(format!("{:#}", e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("scenario not found: {0}")]
    NotFound(String),
    #[error("duplicate scenario id: {0}")]
    DuplicateScenario(String),
}

#[derive(Debug, Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
