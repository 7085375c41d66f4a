use crate::cache::key::sha256_hex;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Token-level shape of acceptable output, handed verbatim to the provider.
///
/// The gateway and harness never look inside `definition`; only its hash is
/// used, to scope cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarConstraint {
    pub name: String,
    pub syntax: String,
    pub definition: String,
    pub description: String,
}

impl GrammarConstraint {
    pub fn new(
        name: impl Into<String>,
        syntax: impl Into<String>,
        definition: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            syntax: syntax.into(),
            definition: definition.into(),
            description: description.into(),
        }
    }

    /// The bundled grammar over the `pp_complete` price-paid table.
    pub fn price_paid() -> Arc<Self> {
        Arc::new(Self::new(
            "sql_grammar",
            "lark",
            PRICE_PAID_GRAMMAR,
            PRICE_PAID_TOOL_DESCRIPTION,
        ))
    }

    /// Loads a grammar definition from disk, keeping the bundled tool name and
    /// description.
    pub fn from_file(path: &Path) -> anyhow::Result<Arc<Self>> {
        let definition = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file {}", path.display()))?;
        if definition.trim().is_empty() {
            anyhow::bail!("config error: grammar file {} is empty", path.display());
        }
        let syntax = match path.extension().and_then(|e| e.to_str()) {
            Some("regex") => "regex",
            _ => "lark",
        };
        Ok(Arc::new(Self::new(
            "sql_grammar",
            syntax,
            definition,
            PRICE_PAID_TOOL_DESCRIPTION,
        )))
    }

    pub fn fingerprint(&self) -> String {
        sha256_hex(&format!("{}\n{}\n{}", self.name, self.syntax, self.definition))
    }
}

const PRICE_PAID_TOOL_DESCRIPTION: &str = "Executes read-only ClickHouse queries \
limited to SELECT statements over the pp_complete table. YOU MUST REASON HEAVILY \
ABOUT THE QUERY AND MAKE SURE IT OBEYS THE GRAMMAR.";

pub const PRICE_PAID_GRAMMAR: &str = r#"
start: select_statement

select_statement: "SELECT" SP select_list SP "FROM" SP table (SP where_clause)? (SP group_clause)? (SP order_clause)? (SP limit_clause)? ";"?

select_list: select_item ("," SP select_item)*
select_item: (expr | aggregate) (SP "AS" SP IDENTIFIER)?
aggregate: AGG_FN "(" (column | "*")? ")"
AGG_FN: "count" | "sum" | "avg" | "min" | "max" | "uniq"
expr: "DISTINCT" SP column | column

table: "pp_complete"

where_clause: "WHERE" SP condition (SP "AND" SP condition)*
condition: column SP OP SP value
OP: "=" | "!=" | ">" | "<" | ">=" | "<="

group_clause: "GROUP BY" SP column ("," SP column)*
order_clause: "ORDER BY" SP (column | IDENTIFIER | aggregate) (SP ("ASC" | "DESC"))?
limit_clause: "LIMIT" SP NUMBER

column: "date" | "price" | "postcode1" | "postcode2" | "type" | "is_new"
      | "duration" | "addr1" | "addr2" | "street" | "locality" | "town"
      | "district" | "county"

value: NUMBER | STRING | "today()" | "toDate(" STRING ")"

IDENTIFIER: /[a-z_][a-z0-9_]*/
NUMBER: /[0-9]+/
STRING: /'[^';]*'/
SP: " "
"#;
