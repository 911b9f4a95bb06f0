//! The import pipeline.

use tokio_postgres::{Client, GenericClient};

use crate::conn::TracedConn;
use crate::{Config, Result, bootstrap, conn, ddl, erase, reflect, rewrite};

/// What a run did, for the caller's summary output.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Name of the foreign server the tables are bound to.
    pub server: String,
    /// Objects dropped from the destination schema.
    pub dropped: usize,
    /// Foreign tables created in the destination schema.
    pub created: usize,
}

/// Run one import.
///
/// Opens one connection per side, held for the whole run. Every
/// destination mutation happens inside a single transaction committed at
/// the very end; any failure rolls it back on drop. The source connection
/// only ever reads catalog metadata.
pub async fn run(config: &Config) -> Result<Summary> {
    let src_client = conn::connect(&config.remote).await?;
    let mut dst_client = conn::connect(&config.local).await?;

    let summary = mirror(&src_client, &mut dst_client, config).await;

    // Release in reverse acquisition order.
    drop(dst_client);
    drop(src_client);

    summary
}

async fn mirror(src_client: &Client, dst_client: &mut Client, config: &Config) -> Result<Summary> {
    let tx = dst_client.transaction().await?;
    let src = TracedConn::new(src_client);
    let dst = TracedConn::new(&tx);

    bootstrap::ensure_extensions(&dst, &src).await?;
    let server = bootstrap::ensure_server(&dst, &config.remote, config.options.read_only).await?;
    bootstrap::ensure_user_mapping(&dst, &config.local.user, &server, &config.remote).await?;

    if config.options.mapping_only {
        tx.commit().await?;
        return Ok(Summary {
            server,
            dropped: 0,
            created: 0,
        });
    }

    bootstrap::ensure_schema(&dst, &config.local.schema).await?;
    bootstrap::create_shim(&dst, &config.local.schema, &config.remote).await?;

    let objects = reflect::reflect_schema(
        &src,
        &config.remote.schema,
        config.options.only.as_deref(),
    )
    .await?;
    tracing::info!(
        schema = %config.remote.schema,
        objects = objects.len(),
        "reflected source schema"
    );

    let dropped = erase::erase_schema(&dst, &config.local.schema).await?;
    tracing::info!(
        schema = %config.local.schema,
        dropped,
        "erased destination schema"
    );

    let mut created = 0;
    for object in &objects {
        create_one(&src, &dst, config, &server, object).await?;
        created += 1;
    }

    tx.commit().await?;
    Ok(Summary {
        server,
        dropped,
        created,
    })
}

async fn create_one<S: GenericClient, D: GenericClient>(
    src: &TracedConn<'_, S>,
    dst: &TracedConn<'_, D>,
    config: &Config,
    server: &str,
    object: &crate::ReflectedObject,
) -> Result<()> {
    let mut columns = Vec::with_capacity(object.columns.len());
    for col in &object.columns {
        let default = match &col.default {
            Some(d) => Some(rewrite::rewrite_default(src, &config.local.schema, d).await?),
            None => None,
        };
        columns.push(ddl::RenderedColumn {
            name: col.name.clone(),
            type_name: col.type_name.clone(),
            default,
        });
    }
    let sql = ddl::create_foreign_table(
        &config.local.schema,
        server,
        &config.remote.schema,
        &object.name,
        &columns,
    );
    dst.execute(&sql, &[]).await?;
    tracing::info!(object = %object.name, kind = ?object.kind, "created foreign table");
    Ok(())
}
