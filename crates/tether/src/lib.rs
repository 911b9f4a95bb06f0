//! Mirror a remote Postgres schema into a local database.
//!
//! tether reflects the schema objects of a remote database (tables, views,
//! materialized views, foreign tables) and recreates each of them locally as
//! a `postgres_fdw` foreign table, so the local database can transparently
//! query the remote data (and write it, unless marked read-only).
//!
//! `postgres_fdw` cannot proxy a remote sequence, so sequence-backed column
//! defaults (`nextval(...)`) are rewritten to call a `dblink`-based shim
//! function installed in the destination schema; the shim fetches the next
//! value from the source's sequence on demand, keeping generated keys in
//! step with the source counter.
//!
//! The import is a single linear pass:
//!
//! 1. bootstrap extensions, foreign server, user mapping, shim function
//! 2. reflect the remote schema's objects and columns
//! 3. erase the destination schema
//! 4. synthesize and execute one `CREATE FOREIGN TABLE` per object
//! 5. commit (a single destination transaction covers steps 1-4)
//!
//! A failure anywhere aborts the run; the destination transaction rolls
//! back on drop, leaving the local database untouched.

pub mod bootstrap;
pub mod config;
mod conn;
pub mod ddl;
pub mod erase;
mod error;
pub mod reflect;
pub mod rewrite;
pub mod schema;

mod mirror;

pub use config::{Config, Endpoint, Options};
pub use conn::{TracedConn, connect};
pub use error::Error;
pub use mirror::{Summary, run};
pub use schema::{ColumnDef, DefaultExpr, ObjectKind, ReflectedObject};

/// Result type for tether operations.
pub type Result<T> = std::result::Result<T, Error>;
