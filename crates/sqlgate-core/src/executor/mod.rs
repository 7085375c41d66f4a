use crate::model::Row;
use async_trait::async_trait;

pub mod clickhouse;
pub mod sqlite;

pub use clickhouse::ClickHouseExecutor;
pub use sqlite::SqliteExecutor;

/// Runs generated SQL against the analytical store.
///
/// Rows must keep the column order of the query's projection list. Malformed
/// SQL and store-side faults are `Err`.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run(&self, sql: &str) -> anyhow::Result<Vec<Row>>;
    fn executor_name(&self) -> &'static str;
}
