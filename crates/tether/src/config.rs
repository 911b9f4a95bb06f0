//! Run configuration.
//!
//! All connection and behavior state is carried explicitly in [`Config`],
//! passed into each operation; there are no process-wide globals.

use tether_sql::conninfo_value;

/// One side of the import: everything needed to reach a database and the
/// schema to operate on within it.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub schema: String,
}

impl Endpoint {
    /// Render this endpoint as a libpq conninfo string.
    ///
    /// Used both to open our own connections and, for the remote side, as
    /// the connection string embedded in the sequence-fetch shim. Values
    /// are escaped per conninfo rules.
    pub fn conninfo(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            conninfo_value(&self.host),
            self.port,
            conninfo_value(&self.database),
            conninfo_value(&self.user),
            conninfo_value(&self.password),
        )
    }
}

/// Behavior switches for a run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Mark the foreign server as not updatable; destination-side writes
    /// will be rejected by postgres_fdw.
    pub read_only: bool,
    /// When set, only source objects whose name appears here are mirrored.
    pub only: Option<Vec<String>>,
    /// Provision the foreign server and user mapping, then exit without
    /// touching schema objects.
    pub mapping_only: bool,
}

/// Full configuration for one import run.
#[derive(Debug, Clone)]
pub struct Config {
    /// The destination database (foreign tables are created here).
    pub local: Endpoint,
    /// The source database (catalog metadata is read from here).
    pub remote: Endpoint,
    pub options: Options,
}
