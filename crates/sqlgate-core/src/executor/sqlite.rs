use super::QueryExecutor;
use crate::model::{Row, Scalar};
use anyhow::Context;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Schema of the price-paid table as the local store keeps it.
pub const PP_COMPLETE_DDL: &str = "
CREATE TABLE IF NOT EXISTS pp_complete (
    date TEXT NOT NULL,
    price INTEGER NOT NULL,
    postcode1 TEXT,
    postcode2 TEXT,
    type TEXT NOT NULL,
    is_new INTEGER NOT NULL DEFAULT 0,
    duration TEXT,
    addr1 TEXT,
    addr2 TEXT,
    street TEXT,
    locality TEXT,
    town TEXT,
    district TEXT,
    county TEXT
);
CREATE INDEX IF NOT EXISTS idx_pp_complete_type ON pp_complete(type);
";

/// Single shared SQLite handle; queries run on the blocking pool.
#[derive(Clone)]
pub struct SqliteExecutor {
    pub conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        self.execute_batch(PP_COMPLETE_DDL)
    }

    /// Runs trusted setup SQL (fixtures, DDL). Never used for generated SQL.
    pub fn execute_batch(&self, sql: &str) -> anyhow::Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))?;
        conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn run(&self, sql: &str) -> anyhow::Result<Vec<Row>> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))?;
            query_rows(&conn, &sql)
        })
        .await?
    }

    fn executor_name(&self) -> &'static str {
        "sqlite"
    }
}

fn query_rows(conn: &Connection, sql: &str) -> anyhow::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let mut row = Row::new();
        for (i, name) in names.iter().enumerate() {
            row.push(name.clone(), scalar(r.get_ref(i)?));
        }
        out.push(row);
    }
    Ok(out)
}

fn scalar(v: ValueRef<'_>) -> Scalar {
    match v {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(i) => Scalar::Int(i),
        ValueRef::Real(f) => Scalar::Float(f),
        ValueRef::Text(t) => Scalar::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Scalar::Text(hex::encode(b)),
    }
}
