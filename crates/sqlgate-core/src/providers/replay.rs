use crate::cache::key::normalize;
use crate::providers::llm::{GenerationProvider, GenerationRequest, ToolInvocation};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    query: String,
    #[serde(default)]
    sql: Option<String>,
}

/// Serves recorded generations from a JSONL file, one
/// `{"query": "...", "sql": "..."}` object per line. A `null` sql records a
/// refusal. Lookups use the same normalization as the gateway cache.
#[derive(Clone)]
pub struct ReplayProvider {
    records: Arc<HashMap<String, Option<String>>>,
}

impl ReplayProvider {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "failed to open replay file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;
        let reader = std::io::BufReader::new(file);

        let mut records = HashMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let rec: ReplayRecord = serde_json::from_str(&line)
                .map_err(|e| anyhow::anyhow!("line {}: parse error: {}", i + 1, e))?;
            let key = normalize(&rec.query);
            if records.insert(key, rec.sql).is_some() {
                anyhow::bail!("line {}: duplicate query '{}'", i + 1, rec.query);
            }
        }

        Ok(Self {
            records: Arc::new(records),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl GenerationProvider for ReplayProvider {
    async fn invoke(&self, req: &GenerationRequest<'_>) -> anyhow::Result<Option<ToolInvocation>> {
        match self.records.get(&normalize(req.query)) {
            Some(Some(sql)) => Ok(Some(ToolInvocation {
                tool_name: req.grammar.name.clone(),
                text: sql.clone(),
            })),
            Some(None) => Ok(None),
            None => anyhow::bail!("no recorded generation for query '{}'", req.query),
        }
    }

    fn provider_name(&self) -> &'static str {
        "replay"
    }
}
