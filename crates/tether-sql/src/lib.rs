//! SQL text helpers for tether.
//!
//! DDL statements cannot take bind parameters, so every identifier and
//! string value that ends up inside generated statement text goes through
//! the wrappers in this crate.

use std::fmt;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use tether_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use tether_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Escape a string literal for SQL.
pub fn escape_string(s: &str) -> String {
    format!("{}", Lit(s))
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes identifiers to avoid issues with reserved keywords like
/// `user`, `order`, `table`, `group`, etc. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Quote a schema-qualified name (`"schema"."name"`).
pub fn quote_qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", Ident(schema), Ident(name))
}

/// Escape a value for inclusion in a libpq conninfo string.
///
/// Conninfo values containing spaces, quotes or backslashes must be wrapped
/// in single quotes, with backslash and single quote escaped by a backslash.
///
/// # Example
/// ```
/// assert_eq!(tether_sql::conninfo_value("plain"), "plain");
/// assert_eq!(tether_sql::conninfo_value("p a'ss"), r"'p a\'ss'");
/// ```
pub fn conninfo_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quoting {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Derive the foreign-server name for a remote host and database.
///
/// Server names must be stable across runs so a re-import alters the
/// existing server instead of accumulating duplicates. Characters that are
/// awkward in an identifier are folded to underscores.
///
/// # Example
/// ```
/// assert_eq!(
///     tether_sql::server_name("db.example.com", "appdata"),
///     "tether_db_example_com_appdata"
/// );
/// ```
pub fn server_name(host: &str, database: &str) -> String {
    let mut name = String::with_capacity(host.len() + database.len() + 8);
    name.push_str("tether_");
    for c in host.chars().chain(std::iter::once('_')).chain(database.chars()) {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else {
            name.push('_');
        }
    }
    // Postgres truncates identifiers at 63 bytes; do it ourselves so the
    // name we later look up matches what the server was created as.
    const PG_IDENT_MAX: usize = 63;
    if name.len() > PG_IDENT_MAX {
        name.truncate(PG_IDENT_MAX);
    }
    name
}

#[cfg(test)]
mod tests;
