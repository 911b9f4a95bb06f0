//! Destination provisioning.
//!
//! Ensures the cross-database extensions exist, creates or updates the
//! foreign-server definition and user mapping, and installs the
//! sequence-fetch shim. Everything here is idempotent: a re-run alters the
//! existing server and mapping instead of duplicating them.

use tokio_postgres::GenericClient;

use tether_sql::{Lit, conninfo_value, quote_ident, quote_qualified};

use crate::config::Endpoint;
use crate::conn::TracedConn;
use crate::Result;

/// Name of the sequence-fetch shim function installed in the destination
/// schema. Inserts into the mirrored foreign tables obtain their default
/// key values by calling this function, which round-trips to the source
/// over dblink.
pub const SHIM_FUNCTION: &str = "remote_nextval";

/// Extensions the destination always needs: the wrapper itself and the
/// cross-database query capability the shim is built on.
const REQUIRED_EXTENSIONS: &[&str] = &["postgres_fdw", "dblink"];

/// Extensions mirrored across only if the source uses them, paired with a
/// type whose presence betrays the extension even when `pg_extension` has
/// no entry (dumps restored without extension machinery).
const MIRRORED_EXTENSIONS: &[(&str, &str)] = &[("postgis", "geometry"), ("hstore", "hstore")];

/// Ensure the destination schema itself exists; the shim function and the
/// foreign tables are created inside it.
pub async fn ensure_schema<C: GenericClient>(dst: &TracedConn<'_, C>, schema: &str) -> Result<()> {
    dst.execute(
        &format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)),
        &[],
    )
    .await?;
    Ok(())
}

/// Install required extensions locally, plus any mirrored extension
/// detected on the source side.
pub async fn ensure_extensions<S: GenericClient, D: GenericClient>(
    dst: &TracedConn<'_, D>,
    src: &TracedConn<'_, S>,
) -> Result<()> {
    for name in REQUIRED_EXTENSIONS {
        create_extension(dst, name).await?;
    }
    for (name, type_probe) in MIRRORED_EXTENSIONS {
        if source_has_extension(src, name, type_probe).await? {
            tracing::info!(extension = name, "mirroring source extension");
            create_extension(dst, name).await?;
        }
    }
    Ok(())
}

async fn create_extension<C: GenericClient>(dst: &TracedConn<'_, C>, name: &str) -> Result<()> {
    dst.execute(
        &format!("CREATE EXTENSION IF NOT EXISTS {}", quote_ident(name)),
        &[],
    )
    .await?;
    Ok(())
}

/// Detect an extension on the source, via its catalog entry or via the
/// fallback presence-of-type heuristic.
async fn source_has_extension<C: GenericClient>(
    src: &TracedConn<'_, C>,
    name: &str,
    type_probe: &str,
) -> Result<bool> {
    let by_catalog = src
        .query_opt(
            "SELECT 1 FROM pg_catalog.pg_extension WHERE extname = $1",
            &[&name],
        )
        .await?;
    if by_catalog.is_some() {
        return Ok(true);
    }
    let by_type = src
        .query_opt(
            "SELECT 1 FROM pg_catalog.pg_type WHERE typname = $1",
            &[&type_probe],
        )
        .await?;
    Ok(by_type.is_some())
}

/// Render the options clause shared by server create and alter, with `SET`
/// prefixes when altering.
fn server_options(remote: &Endpoint, read_only: bool, alter: bool) -> String {
    let set = if alter { "SET " } else { "" };
    let updatable = if read_only { "false" } else { "true" };
    format!(
        "{set}host {}, {set}dbname {}, {set}port {}, {set}updatable {}",
        Lit(&remote.host),
        Lit(&remote.database),
        Lit(remote.port.to_string()),
        Lit(updatable),
    )
}

pub fn create_server_sql(server: &str, remote: &Endpoint, read_only: bool) -> String {
    format!(
        "CREATE SERVER {} FOREIGN DATA WRAPPER postgres_fdw OPTIONS ({})",
        quote_ident(server),
        server_options(remote, read_only, false),
    )
}

pub fn alter_server_sql(server: &str, remote: &Endpoint, read_only: bool) -> String {
    format!(
        "ALTER SERVER {} OPTIONS ({})",
        quote_ident(server),
        server_options(remote, read_only, true),
    )
}

/// Create the foreign server for the remote endpoint, or update its
/// options if a server of that name already exists. Returns the server
/// name, derived deterministically from the remote host and database.
pub async fn ensure_server<C: GenericClient>(
    dst: &TracedConn<'_, C>,
    remote: &Endpoint,
    read_only: bool,
) -> Result<String> {
    let server = tether_sql::server_name(&remote.host, &remote.database);
    let exists = dst
        .query_opt(
            "SELECT 1 FROM pg_catalog.pg_foreign_server WHERE srvname = $1",
            &[&server],
        )
        .await?
        .is_some();
    let sql = if exists {
        alter_server_sql(&server, remote, read_only)
    } else {
        create_server_sql(&server, remote, read_only)
    };
    dst.execute(&sql, &[]).await?;
    Ok(server)
}

fn mapping_options(remote: &Endpoint, alter: bool) -> String {
    let set = if alter { "SET " } else { "" };
    format!(
        "{set}user {}, {set}password {}",
        Lit(&remote.user),
        Lit(&remote.password),
    )
}

pub fn create_user_mapping_sql(local_user: &str, server: &str, remote: &Endpoint) -> String {
    format!(
        "CREATE USER MAPPING FOR {} SERVER {} OPTIONS ({})",
        quote_ident(local_user),
        quote_ident(server),
        mapping_options(remote, false),
    )
}

pub fn alter_user_mapping_sql(local_user: &str, server: &str, remote: &Endpoint) -> String {
    format!(
        "ALTER USER MAPPING FOR {} SERVER {} OPTIONS ({})",
        quote_ident(local_user),
        quote_ident(server),
        mapping_options(remote, true),
    )
}

/// Create or update the user mapping carrying the remote credentials for
/// the local role.
pub async fn ensure_user_mapping<C: GenericClient>(
    dst: &TracedConn<'_, C>,
    local_user: &str,
    server: &str,
    remote: &Endpoint,
) -> Result<()> {
    let exists = dst
        .query_opt(
            "SELECT 1 FROM pg_catalog.pg_user_mappings WHERE srvname = $1 AND usename = $2",
            &[&server, &local_user],
        )
        .await?
        .is_some();
    let sql = if exists {
        alter_user_mapping_sql(local_user, server, remote)
    } else {
        create_user_mapping_sql(local_user, server, remote)
    };
    dst.execute(&sql, &[]).await?;
    Ok(())
}

/// Pick a dollar-quote tag that does not occur inside the body it will
/// wrap, so a hostile credential cannot terminate the quoting early.
fn dollar_tag(body: &str) -> String {
    let mut tag = String::from("tether");
    while body.contains(&format!("${tag}$")) {
        tag.push('_');
    }
    tag
}

/// Render the shim function definition.
///
/// The function opens a short-lived dblink connection back to the source,
/// using embedded conninfo-escaped credentials, and returns the next value
/// of the named sequence. The body is dollar-quoted so the embedded
/// conninfo literal survives passwords containing quotes; the quote tag is
/// derived so the conninfo cannot contain it.
pub fn shim_sql(local_schema: &str, remote: &Endpoint) -> String {
    let conninfo = format!(
        "host={} port={} dbname={} user={} password={}",
        conninfo_value(&remote.host),
        remote.port,
        conninfo_value(&remote.database),
        conninfo_value(&remote.user),
        conninfo_value(&remote.password),
    );
    let conninfo = Lit(&conninfo).to_string();
    let tag = dollar_tag(&conninfo);
    format!(
        "CREATE OR REPLACE FUNCTION {}(seq_schema text, seq_name text)\n\
         RETURNS bigint\n\
         LANGUAGE sql VOLATILE\n\
         AS ${tag}$\n\
         SELECT v FROM dblink(\n\
             {conninfo},\n\
             format('SELECT nextval(%L)', quote_ident(seq_schema) || '.' || quote_ident(seq_name))\n\
         ) AS t(v bigint)\n\
         ${tag}$",
        quote_qualified(local_schema, SHIM_FUNCTION),
    )
}

/// Install (or replace) the sequence-fetch shim in the destination schema.
pub async fn create_shim<C: GenericClient>(
    dst: &TracedConn<'_, C>,
    local_schema: &str,
    remote: &Endpoint,
) -> Result<()> {
    dst.execute(&shim_sql(local_schema, remote), &[]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> Endpoint {
        Endpoint {
            host: "dbhost".into(),
            port: 5432,
            database: "appdata".into(),
            user: "reader".into(),
            password: "pw".into(),
            schema: "public".into(),
        }
    }

    #[test]
    fn test_create_server_sql() {
        assert_eq!(
            create_server_sql("tether_dbhost_appdata", &remote(), false),
            "CREATE SERVER \"tether_dbhost_appdata\" FOREIGN DATA WRAPPER postgres_fdw \
             OPTIONS (host 'dbhost', dbname 'appdata', port '5432', updatable 'true')"
        );
    }

    #[test]
    fn test_create_server_sql_read_only() {
        let sql = create_server_sql("srv", &remote(), true);
        assert!(sql.ends_with("updatable 'false')"));
    }

    #[test]
    fn test_alter_server_sql_sets_every_option() {
        assert_eq!(
            alter_server_sql("srv", &remote(), false),
            "ALTER SERVER \"srv\" OPTIONS (SET host 'dbhost', SET dbname 'appdata', \
             SET port '5432', SET updatable 'true')"
        );
    }

    #[test]
    fn test_user_mapping_sql() {
        assert_eq!(
            create_user_mapping_sql("localrole", "srv", &remote()),
            "CREATE USER MAPPING FOR \"localrole\" SERVER \"srv\" \
             OPTIONS (user 'reader', password 'pw')"
        );
        assert_eq!(
            alter_user_mapping_sql("localrole", "srv", &remote()),
            "ALTER USER MAPPING FOR \"localrole\" SERVER \"srv\" \
             OPTIONS (SET user 'reader', SET password 'pw')"
        );
    }

    #[test]
    fn test_mapping_sql_escapes_password() {
        let mut ep = remote();
        ep.password = "p'w".into();
        let sql = create_user_mapping_sql("localrole", "srv", &ep);
        assert!(sql.ends_with("password 'p''w')"));
    }

    #[test]
    fn test_dollar_tag_avoids_body_collisions() {
        assert_eq!(dollar_tag("password=pw"), "tether");
        assert_eq!(dollar_tag("a $tether$ b"), "tether_");
        assert_eq!(dollar_tag("$tether$ and $tether_$"), "tether__");
    }

    #[test]
    fn test_shim_sql_survives_tag_in_credential() {
        let mut ep = remote();
        ep.password = "x$tether$y".into();
        let sql = shim_sql("public", &ep);
        // The body still carries the hostile password, wrapped by a tag
        // that does not occur inside it.
        assert!(sql.contains("x$tether$y"));
        assert!(sql.contains("AS $tether_$"));
        assert!(sql.ends_with("$tether_$"));
    }

    #[test]
    fn test_shim_sql_embeds_escaped_conninfo() {
        let mut ep = remote();
        ep.password = "se cr'et".into();
        let sql = shim_sql("public", &ep);
        assert!(sql.starts_with(
            "CREATE OR REPLACE FUNCTION \"public\".\"remote_nextval\"(seq_schema text, seq_name text)"
        ));
        // conninfo escaping first (backslash), then SQL literal escaping
        // (doubled quote).
        assert!(sql.contains("password=''se cr\\''et''"));
        assert!(sql.contains("RETURNS bigint"));
        assert!(sql.contains("dblink("));
    }
}
