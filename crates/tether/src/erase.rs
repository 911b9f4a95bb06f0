//! Destination schema erasure.
//!
//! The destination schema is rebuilt from scratch on every run: leftover
//! objects would collide by name with the newly synthesized foreign
//! tables, so erasure is unconditional and precedes recreation.

use tokio_postgres::GenericClient;

use tether_sql::quote_qualified;

use crate::conn::TracedConn;
use crate::schema::ObjectKind;
use crate::{Result, reflect};

/// Render the kind-appropriate drop statement for one object.
pub fn drop_statement(schema: &str, name: &str, kind: ObjectKind) -> String {
    format!(
        "DROP {} {}",
        kind.drop_keyword(),
        quote_qualified(schema, name)
    )
}

/// Drop every object in the destination schema, returning how many were
/// dropped.
///
/// Enumeration reuses the catalog reflector, so an object of an
/// unsupported kind aborts the run before anything else is touched.
pub async fn erase_schema<C: GenericClient>(
    dst: &TracedConn<'_, C>,
    schema: &str,
) -> Result<usize> {
    let objects = reflect::list_objects(dst, schema).await?;
    for (name, kind) in &objects {
        dst.execute(&drop_statement(schema, name, *kind), &[])
            .await?;
    }
    Ok(objects.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_statement_per_kind() {
        assert_eq!(
            drop_statement("public", "t", ObjectKind::Table),
            "DROP TABLE \"public\".\"t\""
        );
        assert_eq!(
            drop_statement("public", "v", ObjectKind::View),
            "DROP VIEW \"public\".\"v\""
        );
        assert_eq!(
            drop_statement("public", "mv", ObjectKind::MaterializedView),
            "DROP MATERIALIZED VIEW \"public\".\"mv\""
        );
        assert_eq!(
            drop_statement("public", "ft", ObjectKind::ForeignTable),
            "DROP FOREIGN TABLE \"public\".\"ft\""
        );
    }

    #[test]
    fn test_drop_statement_quotes_names() {
        assert_eq!(
            drop_statement("my schema", "od\"d", ObjectKind::Table),
            "DROP TABLE \"my schema\".\"od\"\"d\""
        );
    }
}
