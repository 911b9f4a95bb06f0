//! Reflected schema types.
//!
//! Everything here is rebuilt from a live catalog query on every run and
//! never persisted.

use crate::{Error, Result};

/// The kind of a relation, as reported by `pg_class.relkind`.
///
/// These are the only kinds the importer knows how to mirror and drop; any
/// other relkind reaching [`ObjectKind::from_relkind`] is a fatal error
/// rather than a silent skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    MaterializedView,
    ForeignTable,
}

impl ObjectKind {
    /// Parse a `pg_class.relkind` value, with the owning object named for
    /// error context.
    pub fn from_relkind(relkind: &str, schema: &str, name: &str) -> Result<Self> {
        match relkind {
            "r" => Ok(ObjectKind::Table),
            "v" => Ok(ObjectKind::View),
            "m" => Ok(ObjectKind::MaterializedView),
            "f" => Ok(ObjectKind::ForeignTable),
            other => Err(Error::UnexpectedRelkind {
                relkind: other.to_string(),
                schema: schema.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// The object-kind keyword used in `DROP <keyword> ...`.
    pub fn drop_keyword(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED VIEW",
            ObjectKind::ForeignTable => "FOREIGN TABLE",
        }
    }
}

/// A column default expression, classified at reflection time.
///
/// Exactly one shape is recognized as sequence-backed: a default whose text
/// starts with `nextval('<qualified-name>'::regclass)`. Everything else,
/// including expressions that merely reference a sequence indirectly, is
/// carried over verbatim, and will surface as a destination-side SQL error
/// at execution time if the expression cannot run there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultExpr {
    /// Carried into the destination DDL as literal text.
    Verbatim(String),
    /// `nextval` on the named relation; resolved against the source catalog
    /// and rewritten to a sequence-fetch shim call.
    SequenceNextval {
        /// The relation text as it appeared inside `nextval('...')`,
        /// e.g. `public.t_id_seq`.
        relation: String,
    },
}

impl DefaultExpr {
    /// Classify a raw default expression from `pg_get_expr`.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("nextval('")
            && let Some(quote) = rest.find('\'')
            && rest[quote..].starts_with("'::regclass)")
        {
            let relation = &rest[..quote];
            if !relation.is_empty() {
                return DefaultExpr::SequenceNextval {
                    relation: relation.to_string(),
                };
            }
        }
        DefaultExpr::Verbatim(raw.to_string())
    }
}

/// A reflected column: name, the type string exactly as `format_type`
/// reported it, and the classified default (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: String,
    pub default: Option<DefaultExpr>,
}

/// A schema object reflected from the source catalog, columns in physical
/// attribute order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedObject {
    pub name: String,
    pub kind: ObjectKind,
    pub columns: Vec<ColumnDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_relkind_recognized() {
        assert_eq!(
            ObjectKind::from_relkind("r", "public", "t").unwrap(),
            ObjectKind::Table
        );
        assert_eq!(
            ObjectKind::from_relkind("v", "public", "t").unwrap(),
            ObjectKind::View
        );
        assert_eq!(
            ObjectKind::from_relkind("m", "public", "t").unwrap(),
            ObjectKind::MaterializedView
        );
        assert_eq!(
            ObjectKind::from_relkind("f", "public", "t").unwrap(),
            ObjectKind::ForeignTable
        );
    }

    #[test]
    fn test_from_relkind_unknown_is_fatal() {
        let err = ObjectKind::from_relkind("p", "public", "events").unwrap_err();
        match err {
            Error::UnexpectedRelkind {
                relkind,
                schema,
                name,
            } => {
                assert_eq!(relkind, "p");
                assert_eq!(schema, "public");
                assert_eq!(name, "events");
            }
            other => panic!("expected UnexpectedRelkind, got {other:?}"),
        }
    }

    #[test]
    fn test_drop_keyword() {
        assert_eq!(ObjectKind::Table.drop_keyword(), "TABLE");
        assert_eq!(
            ObjectKind::MaterializedView.drop_keyword(),
            "MATERIALIZED VIEW"
        );
        assert_eq!(ObjectKind::ForeignTable.drop_keyword(), "FOREIGN TABLE");
    }

    #[test]
    fn test_default_parse_nextval() {
        assert_eq!(
            DefaultExpr::parse("nextval('public.t_id_seq'::regclass)"),
            DefaultExpr::SequenceNextval {
                relation: "public.t_id_seq".into()
            }
        );
        // Unqualified sequence names are resolved later against the catalog.
        assert_eq!(
            DefaultExpr::parse("nextval('t_id_seq'::regclass)"),
            DefaultExpr::SequenceNextval {
                relation: "t_id_seq".into()
            }
        );
    }

    #[test]
    fn test_default_parse_is_prefix_match() {
        // serial defaults sometimes carry trailing casts; the prefix still
        // identifies the sequence.
        assert_eq!(
            DefaultExpr::parse("nextval('s.q'::regclass)::integer"),
            DefaultExpr::SequenceNextval {
                relation: "s.q".into()
            }
        );
    }

    #[test]
    fn test_default_parse_verbatim() {
        for raw in [
            "now()",
            "0",
            "'-'::text",
            "CURRENT_TIMESTAMP",
            // References a sequence, but not in the recognized shape.
            "(nextval(('x'::text)::regclass))",
            "nextval(my_seq_name())",
            "nextval(''::regclass)",
        ] {
            assert_eq!(DefaultExpr::parse(raw), DefaultExpr::Verbatim(raw.into()));
        }
    }
}
