use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("unexpected relkind {relkind:?} for {schema}.{name}")]
    UnexpectedRelkind {
        relkind: String,
        schema: String,
        name: String,
    },

    #[error("sequence {relation:?} not found on the source side")]
    UnknownSequence { relation: String },
}
