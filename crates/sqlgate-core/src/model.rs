use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar cell returned by an executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the cell. Text is parsed because some stores (ClickHouse
    /// 64-bit integers over JSON) quote large integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One result row. Columns keep the order of the query's projection list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<(String, Scalar)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Scalar) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Scalar) {
        self.columns.push((name.into(), value));
    }

    /// Looks up a column by name (case-insensitive, first match wins).
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.columns.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Output of a successful `Gateway::generate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub cached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grammar,
    Semantic,
    Safety,
    Result,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Semantic => "semantic",
            Category::Safety => "safety",
            Category::Result => "result",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type SqlPredicate = fn(&str) -> bool;
pub type RowsPredicate = fn(&[Row]) -> bool;

/// A named check attached to a scenario.
#[derive(Clone)]
pub enum Assertion {
    /// Applied to the generated SQL text.
    Sql {
        name: &'static str,
        predicate: SqlPredicate,
    },
    /// Applied to the full, non-empty row set.
    Rows {
        name: &'static str,
        predicate: RowsPredicate,
    },
}

impl Assertion {
    pub fn sql(name: &'static str, predicate: SqlPredicate) -> Self {
        Assertion::Sql { name, predicate }
    }

    pub fn rows(name: &'static str, predicate: RowsPredicate) -> Self {
        Assertion::Rows { name, predicate }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Assertion::Sql { name, .. } | Assertion::Rows { name, .. } => name,
        }
    }

    pub fn is_sql(&self) -> bool {
        matches!(self, Assertion::Sql { .. })
    }
}

impl fmt::Debug for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_sql() { "sql" } else { "rows" };
        write!(f, "Assertion({}: {})", kind, self.name())
    }
}

#[derive(Debug, Clone)]
pub struct EvalScenario {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub query: &'static str,
    pub assertions: Vec<Assertion>,
    /// Refusing to generate counts as a pass (adversarial scenarios).
    pub generation_failure_is_pass: bool,
}

impl EvalScenario {
    pub fn sql_assertions(&self) -> impl Iterator<Item = (&'static str, SqlPredicate)> + '_ {
        self.assertions.iter().filter_map(|a| match a {
            Assertion::Sql { name, predicate } => Some((*name, *predicate)),
            Assertion::Rows { .. } => None,
        })
    }

    pub fn result_assertions(&self) -> impl Iterator<Item = (&'static str, RowsPredicate)> + '_ {
        self.assertions.iter().filter_map(|a| match a {
            Assertion::Rows { name, predicate } => Some((*name, *predicate)),
            Assertion::Sql { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub query: String,
    pub assertions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub name: String,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub scenario_id: String,
    pub name: String,
    pub category: Category,
    pub query: String,
    pub generated_sql: Option<String>,
    pub generation_error: Option<String>,
    pub execution_error: Option<String>,
    #[serde(default)]
    pub cached: bool,
    pub row_count: usize,
    pub duration_ms: u64,
    pub assertions: Vec<AssertionResult>,
    pub overall_passed: bool,
}

impl EvalOutcome {
    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionResult> {
        self.assertions.iter().filter(|a| !a.passed)
    }

    pub fn assertion(&self, name: &str) -> Option<&AssertionResult> {
        self.assertions.iter().find(|a| a.name == name)
    }
}
