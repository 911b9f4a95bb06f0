//! tether CLI.
//!
//! Connects to the remote and local databases, mirrors the remote schema
//! as postgres_fdw foreign tables, and exits. Non-zero exit on any
//! failure; the destination transaction rolls back in that case.

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use tether::{Config, Endpoint, Options};

/// Mirror a remote Postgres schema into a local database as foreign tables.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about)]
struct Cli {
    /// Local (destination) database host
    #[arg(long, default_value = "localhost")]
    local_host: String,

    /// Local database port
    #[arg(long, default_value_t = 5432)]
    local_port: u16,

    /// Local database name
    #[arg(long)]
    local_db: String,

    /// Local database user (the user mapping is created for this role)
    #[arg(long)]
    local_user: String,

    /// Local database password
    #[arg(long, default_value = "")]
    local_password: String,

    /// Local schema to (re)create the foreign tables in
    #[arg(long, default_value = "public")]
    local_schema: String,

    /// Remote (source) database host
    #[arg(long)]
    remote_host: String,

    /// Remote database port
    #[arg(long, default_value_t = 5432)]
    remote_port: u16,

    /// Remote database name
    #[arg(long)]
    remote_db: String,

    /// Remote database user
    #[arg(long)]
    remote_user: String,

    /// Remote database password
    #[arg(long, default_value = "")]
    remote_password: String,

    /// Remote schema to mirror
    #[arg(long, default_value = "public")]
    remote_schema: String,

    /// Mark the foreign server as not updatable (rejects local writes)
    #[arg(long)]
    read_only: bool,

    /// Comma-separated list of object names to mirror; everything else is
    /// skipped
    #[arg(long, value_delimiter = ',')]
    tables: Option<Vec<String>>,

    /// Echo every statement before execution
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Only create/update the foreign server and user mapping, then exit
    #[arg(long)]
    mapping_only: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            local: Endpoint {
                host: self.local_host,
                port: self.local_port,
                database: self.local_db,
                user: self.local_user,
                password: self.local_password,
                schema: self.local_schema,
            },
            remote: Endpoint {
                host: self.remote_host,
                port: self.remote_port,
                database: self.remote_db,
                user: self.remote_user,
                password: self.remote_password,
                schema: self.remote_schema,
            },
            options: Options {
                read_only: self.read_only,
                only: self.tables,
                mapping_only: self.mapping_only,
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    // --verbose drops the default level to debug, which makes the
    // statement spans from TracedConn visible; span-open events carry the
    // statement text.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(if verbose {
            FmtSpan::NEW
        } else {
            FmtSpan::NONE
        })
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mapping_only = cli.mapping_only;
    let config = cli.into_config();

    match tether::run(&config).await {
        Ok(summary) => {
            if mapping_only {
                println!(
                    "{} user mapping for server {}",
                    "updated".green(),
                    summary.server.bold(),
                );
            } else {
                println!(
                    "{} {} foreign table(s) on server {} ({} object(s) dropped)",
                    "created".green(),
                    summary.created,
                    summary.server.bold(),
                    summary.dropped,
                );
            }
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
