use super::QueryExecutor;
use crate::model::{Row, Scalar};
use async_trait::async_trait;

/// ClickHouse over its HTTP interface.
///
/// Results are requested as `JSONCompact`, whose `meta` array carries the
/// projection order that the row arrays follow.
pub struct ClickHouseExecutor {
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub client: reqwest::Client,
}

impl ClickHouseExecutor {
    pub fn new(url: String) -> Self {
        Self {
            url,
            user: None,
            password: None,
            database: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.user = user;
        self.password = password;
        self
    }

    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }
}

#[async_trait]
impl QueryExecutor for ClickHouseExecutor {
    async fn run(&self, sql: &str) -> anyhow::Result<Vec<Row>> {
        let body = format!("{} FORMAT JSONCompact", strip_terminator(sql));

        let mut req = self.client.post(&self.url).body(body);
        if let Some(db) = &self.database {
            req = req.query(&[("database", db)]);
        }
        if let Some(user) = &self.user {
            req = req.header("X-ClickHouse-User", user);
        }
        if let Some(pw) = &self.password {
            req = req.header("X-ClickHouse-Key", pw);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("ClickHouse error ({}): {}", status, error_text.trim());
        }

        let json: serde_json::Value = resp.json().await?;
        parse_json_compact(&json)
    }

    fn executor_name(&self) -> &'static str {
        "clickhouse"
    }
}

fn strip_terminator(sql: &str) -> &str {
    sql.trim().trim_end_matches(';').trim_end()
}

pub fn parse_json_compact(json: &serde_json::Value) -> anyhow::Result<Vec<Row>> {
    let names: Vec<&str> = json
        .get("meta")
        .and_then(|m| m.as_array())
        .ok_or_else(|| anyhow::anyhow!("ClickHouse response missing meta"))?
        .iter()
        .map(|c| c.get("name").and_then(|n| n.as_str()).unwrap_or(""))
        .collect();

    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("ClickHouse response missing data"))?;

    let mut rows = Vec::with_capacity(data.len());
    for (i, values) in data.iter().enumerate() {
        let values = values
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("ClickHouse row {} is not an array", i))?;
        if values.len() != names.len() {
            anyhow::bail!(
                "ClickHouse row {} has {} values for {} columns",
                i,
                values.len(),
                names.len()
            );
        }
        let mut row = Row::new();
        for (name, v) in names.iter().zip(values) {
            row.push(*name, scalar(v));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn scalar(v: &serde_json::Value) -> Scalar {
    match v {
        serde_json::Value::Null => Scalar::Null,
        serde_json::Value::Bool(b) => Scalar::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .unwrap_or_else(|| Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
        serde_json::Value::String(s) => Scalar::Text(s.clone()),
        other => Scalar::Text(other.to_string()),
    }
}
