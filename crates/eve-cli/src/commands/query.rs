use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;

use eve_core::MethodRegistry;
use eve_query::{QueryEngine, QueryEnvelope};
use eve_vault::DATASET_VAULT_FILE;

pub struct QueryArgs {
    pub zone: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub json: bool,
    pub timeseries_root: PathBuf,
    pub flows_root: Option<PathBuf>,
    pub vault_root: PathBuf,
    pub registry: PathBuf,
}

pub fn handle(args: &QueryArgs) -> Result<()> {
    let registry = MethodRegistry::load(&args.registry)?;
    let vault_path = args.vault_root.join(DATASET_VAULT_FILE);
    let engine = QueryEngine::new(
        &registry,
        &args.timeseries_root,
        args.flows_root.as_deref(),
        &vault_path,
    );
    let envelope = engine.run(&args.zone, args.from, args.to)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print_summary(&envelope);
    }
    Ok(())
}

fn fmt(value: Option<f64>) -> String {
    value.map_or("-".to_string(), |v| format!("{v:.2}"))
}

fn print_summary(envelope: &QueryEnvelope) {
    println!(
        "{} {} .. {} ({} hours)",
        envelope.zone, envelope.from, envelope.to, envelope.hours
    );
    println!(
        "spot EUR/MWh      mean {}  min {}  max {}  median {}",
        fmt(envelope.spot.mean),
        fmt(envelope.spot.min),
        fmt(envelope.spot.max),
        fmt(envelope.spot.median)
    );
    println!(
        "temperature C     mean {}  min {}  max {}",
        fmt(envelope.temp.mean),
        fmt(envelope.temp.min),
        fmt(envelope.temp.max)
    );
    println!(
        "production CO2    mean {}  consumption CO2 mean {}",
        fmt(envelope.production_co2.mean),
        fmt(envelope.consumption_co2.mean)
    );
    println!(
        "generation mix MW total {}  net import {}",
        fmt(envelope.generation_mix.total_gen_mw),
        fmt(envelope.generation_mix.net_import_mw)
    );
    if envelope.bottleneck.available {
        println!(
            "bottleneck        mean {}  min {}  max {}  (+{} / -{} / ={} hours)",
            fmt(envelope.bottleneck.mean),
            fmt(envelope.bottleneck.min),
            fmt(envelope.bottleneck.max),
            envelope.bottleneck.hours_positive,
            envelope.bottleneck.hours_negative,
            envelope.bottleneck.hours_zero
        );
    } else {
        println!("bottleneck        unavailable");
    }
    if envelope.flows.available {
        println!("flows net MWh     {}", envelope.flows.net_total_mwh);
        for flow in &envelope.flows.top_inbound {
            println!("  in  {:<10} {:.2}", flow.border, flow.mwh);
        }
        for flow in &envelope.flows.top_outbound {
            println!("  out {:<10} {:.2}", flow.border, flow.mwh);
        }
    }
    for warning in &envelope.methodology_warnings {
        println!("warning: {warning}");
    }
    println!("dataset  {}", envelope.provenance.dataset_eve_id);
    println!("registry {}", envelope.provenance.registry_hash);
    if let Some(vault) = &envelope.provenance.vault {
        println!(
            "vault    event {} chain {} root {}",
            vault.event_index, vault.chain_hash, vault.root_hash
        );
    }
    println!("rebuild  {}", envelope.rebuild_command);
}
