//! DDL synthesis.
//!
//! Emits one `CREATE FOREIGN TABLE` per reflected source object. The
//! statement text is deterministic for the same reflected metadata; every
//! identifier goes through [`tether_sql::Ident`] and every option value
//! through [`tether_sql::Lit`].

use std::fmt::Write;

use tether_sql::{Lit, quote_ident, quote_qualified};

/// A column ready for rendering: defaults have already been through the
/// rewriter and are plain destination-side SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedColumn {
    pub name: String,
    pub type_name: String,
    pub default: Option<String>,
}

/// Synthesize the `CREATE FOREIGN TABLE` statement binding a source object
/// to a destination foreign table.
///
/// Columns appear in source order with the type string exactly as the
/// source catalog formatted it. The trailing `OPTIONS` clause routes the
/// wrapper to the source schema and object name.
pub fn create_foreign_table(
    local_schema: &str,
    server: &str,
    remote_schema: &str,
    name: &str,
    columns: &[RenderedColumn],
) -> String {
    let mut sql = String::new();
    let _ = write!(
        sql,
        "CREATE FOREIGN TABLE {} (",
        quote_qualified(local_schema, name)
    );
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        let _ = write!(sql, "\n    {} {}", quote_ident(&col.name), col.type_name);
        if let Some(default) = &col.default {
            let _ = write!(sql, " DEFAULT {}", default);
        }
    }
    let _ = write!(
        sql,
        "\n) SERVER {} OPTIONS (schema_name {}, table_name {})",
        quote_ident(server),
        Lit(remote_schema),
        Lit(name),
    );
    sql
}
