//! Catalog reflection.
//!
//! Reads `pg_class` / `pg_attribute` to reconstruct the schema objects of
//! one schema. Used against the source to learn what to mirror, and against
//! the destination to learn what to erase.

use tokio_postgres::GenericClient;

use crate::conn::TracedConn;
use crate::schema::{ColumnDef, DefaultExpr, ObjectKind, ReflectedObject};
use crate::Result;

/// Source-side tables owned by extensions rather than by the application;
/// the extension mirrored on the destination provides its own copies.
const EXTENSION_OWNED: &[&str] = &[
    "spatial_ref_sys",
    "geography_columns",
    "geometry_columns",
    "raster_columns",
    "raster_overviews",
];

// 'p' (partitioned table) is deliberately included so that an unsupported
// kind aborts the run instead of being silently skipped.
const LIST_OBJECTS: &str = "\
SELECT c.relname, c.relkind::text
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
  AND c.relkind = ANY (ARRAY['r', 'p', 'v', 'm', 'f'])
ORDER BY c.relname";

const LIST_COLUMNS: &str = "\
SELECT a.attname,
       pg_catalog.format_type(a.atttypid, a.atttypmod),
       pg_catalog.pg_get_expr(d.adbin, d.adrelid)
FROM pg_catalog.pg_attribute a
JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_catalog.pg_attrdef d
  ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE n.nspname = $1
  AND c.relname = $2
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum";

/// List the objects of a schema as `(name, kind)` pairs, ordered by name.
///
/// Extension-owned tables are excluded. A relkind outside the four
/// supported kinds fails the run.
pub async fn list_objects<C: GenericClient>(
    db: &TracedConn<'_, C>,
    schema: &str,
) -> Result<Vec<(String, ObjectKind)>> {
    let rows = db.query(LIST_OBJECTS, &[&schema]).await?;
    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get(0);
        let relkind: String = row.get(1);
        if EXTENSION_OWNED.contains(&name.as_str()) {
            continue;
        }
        let kind = ObjectKind::from_relkind(&relkind, schema, &name)?;
        objects.push((name, kind));
    }
    Ok(objects)
}

/// Reflect the columns of one object, in physical attribute order.
///
/// Dropped and system columns are excluded; defaults are classified via
/// [`DefaultExpr::parse`].
pub async fn columns<C: GenericClient>(
    db: &TracedConn<'_, C>,
    schema: &str,
    name: &str,
) -> Result<Vec<ColumnDef>> {
    let rows = db.query(LIST_COLUMNS, &[&schema, &name]).await?;
    Ok(rows
        .into_iter()
        .map(|row| ColumnDef {
            name: row.get(0),
            type_name: row.get(1),
            default: row
                .get::<_, Option<String>>(2)
                .map(|raw| DefaultExpr::parse(&raw)),
        })
        .collect())
}

/// Whether an object passes the allow-list: no list means everything is
/// selected, otherwise only the named objects are.
fn selected(only: Option<&[String]>, name: &str) -> bool {
    match only {
        Some(only) => only.iter().any(|o| o == name),
        None => true,
    }
}

/// Reflect every mirrorable object of a schema, with its columns.
///
/// When `only` is set, objects whose name is not in the list are silently
/// skipped.
pub async fn reflect_schema<C: GenericClient>(
    db: &TracedConn<'_, C>,
    schema: &str,
    only: Option<&[String]>,
) -> Result<Vec<ReflectedObject>> {
    let mut objects = Vec::new();
    for (name, kind) in list_objects(db, schema).await? {
        if !selected(only, &name) {
            continue;
        }
        let columns = columns(db, schema, &name).await?;
        objects.push(ReflectedObject {
            name,
            kind,
            columns,
        });
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_without_list_keeps_everything() {
        assert!(selected(None, "t"));
        assert!(selected(None, "anything"));
    }

    #[test]
    fn test_selected_keeps_exactly_the_named_objects() {
        let only = vec!["t".to_string(), "audit_log".to_string()];
        assert!(selected(Some(&only), "t"));
        assert!(selected(Some(&only), "audit_log"));
        assert!(!selected(Some(&only), "other"));
        // Exact match, not prefix or case-folded.
        assert!(!selected(Some(&only), "t2"));
        assert!(!selected(Some(&only), "T"));
    }

    #[test]
    fn test_selected_empty_list_keeps_nothing() {
        let only: Vec<String> = Vec::new();
        assert!(!selected(Some(&only), "t"));
    }
}
