use super::{GenerationProvider, GenerationRequest, ToolInvocation};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = dyn Fn(&str) -> FakeReply + Send + Sync;

/// What the fake answers for a given query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeReply {
    Sql(String),
    NoToolCall,
    Error(String),
}

/// Deterministic provider for tests; counts invocations.
pub struct FakeProvider {
    responder: Box<Responder>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> FakeReply + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(sql: &str) -> Self {
        let sql = sql.to_string();
        Self::new(move |_| FakeReply::Sql(sql.clone()))
    }

    pub fn refusing() -> Self {
        Self::new(|_| FakeReply::NoToolCall)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn invoke(&self, req: &GenerationRequest<'_>) -> anyhow::Result<Option<ToolInvocation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (self.responder)(req.query) {
            FakeReply::Sql(text) => Ok(Some(ToolInvocation {
                tool_name: req.grammar.name.clone(),
                text,
            })),
            FakeReply::NoToolCall => Ok(None),
            FakeReply::Error(msg) => Err(anyhow::anyhow!(msg)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
