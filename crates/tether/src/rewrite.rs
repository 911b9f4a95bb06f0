//! Default-expression rewriting.
//!
//! Sequence-backed defaults cannot cross the foreign-data boundary: the
//! destination has no copy of the source's sequence. A recognized
//! `nextval` default is resolved to its owning `(schema, name)` on the
//! source side and rewritten to call the sequence-fetch shim installed in
//! the destination schema. Everything else is carried over as literal text.

use tokio_postgres::GenericClient;

use crate::bootstrap::SHIM_FUNCTION;
use crate::conn::TracedConn;
use crate::schema::DefaultExpr;
use crate::{Error, Result};

// regclass resolution honors the source's search path, so an unqualified
// relation name from a default expression resolves the same way it would
// at insert time.
const RESOLVE_SEQUENCE: &str = "\
SELECT n.nspname, c.relname
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE c.oid = $1::text::regclass";

/// Resolve a relation name from a `nextval` default to the `(schema, name)`
/// of the sequence it denotes, via the source catalog.
pub async fn resolve_sequence<C: GenericClient>(
    src: &TracedConn<'_, C>,
    relation: &str,
) -> Result<(String, String)> {
    let row = src
        .query_opt(RESOLVE_SEQUENCE, &[&relation])
        .await?
        .ok_or_else(|| Error::UnknownSequence {
            relation: relation.to_string(),
        })?;
    Ok((row.get(0), row.get(1)))
}

/// Render the shim invocation for a resolved sequence.
pub fn shim_call(local_schema: &str, seq_schema: &str, seq_name: &str) -> String {
    format!(
        "{}({}, {})",
        tether_sql::quote_qualified(local_schema, SHIM_FUNCTION),
        tether_sql::Lit(seq_schema),
        tether_sql::Lit(seq_name),
    )
}

/// Produce the destination-side default text for a classified default.
pub async fn rewrite_default<C: GenericClient>(
    src: &TracedConn<'_, C>,
    local_schema: &str,
    default: &DefaultExpr,
) -> Result<String> {
    match default {
        DefaultExpr::Verbatim(text) => Ok(text.clone()),
        DefaultExpr::SequenceNextval { relation } => {
            let (seq_schema, seq_name) = resolve_sequence(src, relation).await?;
            Ok(shim_call(local_schema, &seq_schema, &seq_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shim_call_rendering() {
        assert_eq!(
            shim_call("public", "public", "t_id_seq"),
            "\"public\".\"remote_nextval\"('public', 't_id_seq')"
        );
    }

    #[test]
    fn test_shim_call_escapes_arguments() {
        assert_eq!(
            shim_call("mirror", "odd'schema", "se'q"),
            "\"mirror\".\"remote_nextval\"('odd''schema', 'se''q')"
        );
    }
}
