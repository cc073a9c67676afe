use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "eve", author, version, about = "Deterministic evidence pipeline for electricity-market and parliamentary data", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Canonicalize source streams and seal the results into the vault
    Build {
        /// Comma-separated bidding-zone codes, e.g. SE3,SE4
        #[arg(long, value_delimiter = ',')]
        zones: Vec<String>,
        /// First year of the build window
        #[arg(long)]
        from: i32,
        /// Last year of the build window
        #[arg(long)]
        to: i32,
        /// Emit canonical files and manifests without touching the vault
        #[arg(long)]
        skip_vault: bool,
        /// Supersede an existing seal whose root hash differs
        #[arg(long)]
        force_reseal: bool,
        /// Directory holding the decoded source archive
        #[arg(long, default_value = "data/sources")]
        source_root: PathBuf,
        /// Directory receiving canonical timeseries files
        #[arg(long, default_value = "data/timeseries")]
        timeseries_root: PathBuf,
        /// Directory holding the two vault chains
        #[arg(long, default_value = "data/vault")]
        vault_root: PathBuf,
        /// Method registry lock file
        #[arg(long, default_value = "method_registry.lock.json")]
        registry: PathBuf,
        /// Override the UTC build date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        build_date: Option<chrono::NaiveDate>,
    },
    /// Reconstruct summary statistics and provenance over a window
    Query {
        /// Bidding-zone code
        #[arg(long)]
        zone: String,
        /// Window start, YYYY-MM-DD
        #[arg(long)]
        from: chrono::NaiveDate,
        /// Window end, YYYY-MM-DD
        #[arg(long)]
        to: chrono::NaiveDate,
        /// Print the full result envelope as JSON
        #[arg(long)]
        json: bool,
        #[arg(long, default_value = "data/timeseries")]
        timeseries_root: PathBuf,
        /// Directory of monthly flow run directories, when available
        #[arg(long)]
        flows_root: Option<PathBuf>,
        #[arg(long, default_value = "data/vault")]
        vault_root: PathBuf,
        #[arg(long, default_value = "method_registry.lock.json")]
        registry: PathBuf,
    },
    /// Run the golden property suite against a staged fixture tree
    Golden {},
}
