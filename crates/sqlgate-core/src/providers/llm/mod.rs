use crate::grammar::GrammarConstraint;
use async_trait::async_trait;

/// Everything a provider receives on a cache miss.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub instructions: &'a str,
    pub query: &'a str,
    pub grammar: &'a GrammarConstraint,
}

/// The single structured tool call a provider produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub text: String,
}

/// Text-to-SQL backend.
///
/// Implementations must request at most one tool invocation per call and
/// return `Ok(None)` when the model answered without a qualifying one.
/// Transport failures are `Err`.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn invoke(&self, req: &GenerationRequest<'_>) -> anyhow::Result<Option<ToolInvocation>>;
    fn provider_name(&self) -> &'static str;
}

pub mod fake;
pub mod openai;
