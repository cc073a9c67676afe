use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use eve_canon::{build_manifest, write_manifest, Canonicalizer};
use eve_core::MethodRegistry;
use eve_vault::dataset::{seal_dataset, SealOutcome};
use eve_vault::DATASET_VAULT_FILE;

pub struct BuildArgs {
    pub zones: Vec<String>,
    pub from: i32,
    pub to: i32,
    pub skip_vault: bool,
    pub force_reseal: bool,
    pub source_root: PathBuf,
    pub timeseries_root: PathBuf,
    pub vault_root: PathBuf,
    pub registry: PathBuf,
    pub build_date: Option<NaiveDate>,
}

/// Canonicalize and seal each requested zone. Zones are independent: each
/// one is emitted, manifested, and vault-appended to completion before the
/// next starts, and a failure in one halts only that zone.
pub fn handle(args: &BuildArgs) -> Result<()> {
    if args.zones.is_empty() {
        bail!("no zones given; pass --zones SE3,SE4,...");
    }
    if args.from > args.to {
        bail!("--from {} is after --to {}", args.from, args.to);
    }
    let registry = MethodRegistry::load(&args.registry)?;
    for zone in &args.zones {
        registry.require_zone(zone)?;
    }
    let build_date = args.build_date.unwrap_or_else(|| Utc::now().date_naive());
    let vault_path = args.vault_root.join(DATASET_VAULT_FILE);

    let mut canonicalizer =
        Canonicalizer::new(&registry, &args.source_root, &args.timeseries_root);
    let mut failed: Vec<String> = Vec::new();

    for zone in &args.zones {
        info!(zone, from = args.from, to = args.to, "building zone");
        let outcome: Result<()> = (|| {
            let build = canonicalizer.build_zone(zone, args.from, args.to, build_date)?;
            let zone_dir = args.timeseries_root.join(zone);
            let manifest = build_manifest(&zone_dir, &build, &registry, Utc::now())?;
            write_manifest(&zone_dir, &manifest)?;
            println!(
                "{zone}: {} rows in {} files, root {}",
                manifest.total_rows, manifest.total_files, manifest.root_hash
            );
            if args.skip_vault {
                return Ok(());
            }
            let manifest_ref = format!("{zone}/{}", eve_canon::manifest::MANIFEST_FILE);
            match seal_dataset(&vault_path, &manifest, &manifest_ref, args.force_reseal)? {
                SealOutcome::Appended(record) => {
                    println!(
                        "{zone}: sealed as event {} ({})",
                        record.event_index, record.chain_hash
                    );
                }
                SealOutcome::Unchanged(record) => {
                    println!(
                        "{zone}: already sealed at event {} with identical root hash",
                        record.event_index
                    );
                }
            }
            Ok(())
        })();
        if let Err(err) = outcome {
            error!(zone, "zone build halted: {err}");
            failed.push(format!("{zone}: {err}"));
        }
    }

    if !failed.is_empty() {
        bail!("{} zone(s) failed: {}", failed.len(), failed.join("; "));
    }
    Ok(())
}
