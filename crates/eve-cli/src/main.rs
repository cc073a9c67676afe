use clap::Parser;
use tracing_subscriber::FmtSubscriber;

use eve_cli::cli::{Cli, Commands};
use eve_cli::commands::{build, golden, query};

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: logging already initialized");
    }

    let result = match &cli.command {
        Commands::Build {
            zones,
            from,
            to,
            skip_vault,
            force_reseal,
            source_root,
            timeseries_root,
            vault_root,
            registry,
            build_date,
        } => build::handle(&build::BuildArgs {
            zones: zones.clone(),
            from: *from,
            to: *to,
            skip_vault: *skip_vault,
            force_reseal: *force_reseal,
            source_root: source_root.clone(),
            timeseries_root: timeseries_root.clone(),
            vault_root: vault_root.clone(),
            registry: registry.clone(),
            build_date: *build_date,
        }),
        Commands::Query {
            zone,
            from,
            to,
            json,
            timeseries_root,
            flows_root,
            vault_root,
            registry,
        } => query::handle(&query::QueryArgs {
            zone: zone.clone(),
            from: *from,
            to: *to,
            json: *json,
            timeseries_root: timeseries_root.clone(),
            flows_root: flows_root.clone(),
            vault_root: vault_root.clone(),
            registry: registry.clone(),
        }),
        Commands::Golden {} => golden::handle(),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
