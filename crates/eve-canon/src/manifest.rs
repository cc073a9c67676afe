//! Per-zone build manifests and the root hash over emitted files.
//!
//! The root hash is SHA-256 over the concatenation of per-file SHA-256
//! hex digests in ascending filename order, no delimiter. The manifest is
//! pretty-printed with two-space indent; the indent is part of the
//! content-addressing surface, so it is never reformatted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use eve_core::hash::{sha256_file, sha256_hex};
use eve_core::{EveError, EveResult, MethodRegistry};

use crate::build::ZoneBuild;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const COMPANION_FILE: &str = "manifest.sha256";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDigest {
    pub file: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub dataset_eve_id: String,
    pub methodology_version: String,
    pub emission_scope: String,
    pub zone: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub build_timestamp_utc: DateTime<Utc>,
    pub root_hash: String,
    pub total_rows: u64,
    pub total_files: u64,
    pub source_refs: Vec<String>,
    pub files: Vec<FileDigest>,
}

/// Root hash over an ordered digest list.
pub fn root_hash(digests: &[FileDigest]) -> String {
    let concat: String = digests.iter().map(|d| d.sha256.as_str()).collect();
    sha256_hex(concat.as_bytes())
}

/// Hash every emitted file of a zone build, ascending filename order.
pub fn digest_files(zone_dir: &Path, files: &[String]) -> EveResult<Vec<FileDigest>> {
    let mut names: Vec<String> = files.to_vec();
    names.sort();
    let mut digests = Vec::with_capacity(names.len());
    for name in names {
        let path = zone_dir.join(&name);
        if !path.is_file() {
            return Err(EveError::Validation(format!(
                "emitted file missing before sealing: {}",
                path.display()
            )));
        }
        digests.push(FileDigest {
            sha256: sha256_file(&path)?,
            file: name,
        });
    }
    Ok(digests)
}

/// Build the manifest for a finished zone.
pub fn build_manifest(
    zone_dir: &Path,
    build: &ZoneBuild,
    registry: &MethodRegistry,
    build_timestamp_utc: DateTime<Utc>,
) -> EveResult<Manifest> {
    let files = digest_files(zone_dir, &build.files)?;
    Ok(Manifest {
        dataset_eve_id: build.dataset_eve_id.clone(),
        methodology_version: registry.methodology_version.clone(),
        emission_scope: registry.emission_scope.clone(),
        zone: build.zone.clone(),
        period_start: build.period_start,
        period_end: build.period_end,
        build_timestamp_utc,
        root_hash: root_hash(&files),
        total_rows: build.total_rows,
        total_files: files.len() as u64,
        source_refs: build.source_refs.clone(),
        files,
    })
}

/// Write the manifest and its sibling SHA-256 companion. Returns the
/// manifest path.
pub fn write_manifest(zone_dir: &Path, manifest: &Manifest) -> EveResult<PathBuf> {
    let path = zone_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json)?;

    let mut companion = String::new();
    for digest in &manifest.files {
        companion.push_str(&format!("{}  {}\n", digest.sha256, digest.file));
    }
    fs::write(zone_dir.join(COMPANION_FILE), companion)?;
    Ok(path)
}

pub fn load_manifest(path: &Path) -> EveResult<Manifest> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(file: &str, body: &str) -> FileDigest {
        FileDigest {
            file: file.to_string(),
            sha256: sha256_hex(body.as_bytes()),
        }
    }

    #[test]
    fn root_hash_concatenates_without_delimiter() {
        let digests = vec![digest("2024-01.ndjson", "a"), digest("2024-02.ndjson", "b")];
        let concat = format!("{}{}", digests[0].sha256, digests[1].sha256);
        assert_eq!(root_hash(&digests), sha256_hex(concat.as_bytes()));
    }

    #[test]
    fn digest_files_orders_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2024-02.ndjson"), "b\n").unwrap();
        fs::write(dir.path().join("2024-01.ndjson"), "a\n").unwrap();
        let digests = digest_files(
            dir.path(),
            &["2024-02.ndjson".into(), "2024-01.ndjson".into()],
        )
        .unwrap();
        assert_eq!(digests[0].file, "2024-01.ndjson");
        assert_eq!(digests[1].file, "2024-02.ndjson");
    }

    #[test]
    fn missing_emitted_file_fails_sealing() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_files(dir.path(), &["2024-01.ndjson".into()]).unwrap_err();
        assert!(matches!(err, EveError::Validation(_)));
    }

    #[test]
    fn companion_file_lists_hash_name_pairs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2024-01.ndjson"), "a\n").unwrap();
        let manifest = Manifest {
            dataset_eve_id: "v2:SE3:20240201".into(),
            methodology_version: "v2".into(),
            emission_scope: "direct-combustion".into(),
            zone: "SE3".into(),
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            build_timestamp_utc: Utc::now(),
            root_hash: "r".into(),
            total_rows: 1,
            total_files: 1,
            source_refs: vec!["entsoe:A44".into()],
            files: digest_files(dir.path(), &["2024-01.ndjson".into()]).unwrap(),
        };
        write_manifest(dir.path(), &manifest).unwrap();
        let companion = fs::read_to_string(dir.path().join(COMPANION_FILE)).unwrap();
        assert!(companion.ends_with('\n'));
        let line = companion.lines().next().unwrap();
        assert_eq!(line.split("  ").nth(1), Some("2024-01.ndjson"));
        assert_eq!(line.split("  ").next().unwrap().len(), 64);

        let loaded = load_manifest(&dir.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(loaded.files, manifest.files);
    }
}
