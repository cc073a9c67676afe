//! # eve-canon: Canonical timeseries emission
//!
//! Turns decoded source streams into the locked 24-field row schema, one
//! NDJSON file per zone-month, plus the manifest that content-addresses a
//! finished zone build. Downstream, the vault seals manifests and the
//! query engine reads the emitted files; neither ever mutates them.

pub mod build;
pub mod emission;
pub mod manifest;
pub mod row;

pub use build::{dataset_id, Canonicalizer, ZoneBuild};
pub use manifest::{build_manifest, load_manifest, write_manifest, FileDigest, Manifest};
pub use row::{CanonicalRow, FuelClass, FIELD_COUNT, FIELD_ORDER};
