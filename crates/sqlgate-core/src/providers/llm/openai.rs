use super::{GenerationProvider, GenerationRequest, ToolInvocation};
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Responses API client that exposes the grammar as a custom tool.
pub struct OpenAiGrammarProvider {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl OpenAiGrammarProvider {
    pub fn new(model: String, api_key: String) -> Self {
        Self::with_base_url(model, api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(model: String, api_key: String, base_url: String) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn request_body(&self, req: &GenerationRequest<'_>) -> serde_json::Value {
        json!({
            "model": self.model,
            "instructions": req.instructions,
            "input": req.query,
            "text": { "format": { "type": "text" } },
            "tools": [{
                "type": "custom",
                "name": req.grammar.name,
                "description": req.grammar.description,
                "format": {
                    "type": "grammar",
                    "syntax": req.grammar.syntax,
                    "definition": req.grammar.definition,
                }
            }],
            // at most one invocation per call
            "parallel_tool_calls": false,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGrammarProvider {
    async fn invoke(&self, req: &GenerationRequest<'_>) -> anyhow::Result<Option<ToolInvocation>> {
        let url = format!("{}/responses", self.base_url);
        let body = self.request_body(req);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI responses API error ({}): {}", status, error_text);
        }

        let json: serde_json::Value = resp.json().await?;
        let invocation = first_tool_invocation(&json, &req.grammar.name);
        tracing::debug!(
            event = "provider_response",
            provider = "openai",
            model = %self.model,
            tool_call = invocation.is_some()
        );
        Ok(invocation)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Picks the first `custom_tool_call` addressed to `tool_name` from a
/// Responses API payload. Reasoning items and plain messages are skipped.
pub fn first_tool_invocation(json: &serde_json::Value, tool_name: &str) -> Option<ToolInvocation> {
    json.get("output")?
        .as_array()?
        .iter()
        .filter(|item| item.get("type").and_then(|t| t.as_str()) == Some("custom_tool_call"))
        .filter(|item| item.get("name").and_then(|n| n.as_str()) == Some(tool_name))
        .find_map(|item| {
            item.get("input")
                .and_then(|i| i.as_str())
                .map(|text| ToolInvocation {
                    tool_name: tool_name.to_string(),
                    text: text.to_string(),
                })
        })
}
