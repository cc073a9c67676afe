//! SHA-256 digests and the stable serialization used for every hashed surface.
//!
//! All content addressing in the pipeline (file hashes, root hashes, event
//! hashes, chain hashes, the registry hash, query hashes) goes through this
//! module so that the byte surface being hashed is defined in exactly one
//! place. Payloads are serialized with recursively sorted object keys and no
//! insignificant whitespace; any ordering or whitespace drift would silently
//! invalidate chain verification.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{EveError, EveResult};

/// Lowercase hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    to_hex(&hasher.finalize())
}

/// Lowercase hex SHA-256 of a file, streamed.
pub fn sha256_file(path: &Path) -> EveResult<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Serialize a value as canonical JSON: object keys sorted recursively,
/// compact separators, `null` preserved for missing optionals.
pub fn canonical_json<T: Serialize>(value: &T) -> EveResult<String> {
    let tree = serde_json::to_value(value)?;
    let mut out = String::new();
    write_canonical(&tree, &mut out);
    Ok(out)
}

/// SHA-256 over the canonical JSON of a value.
pub fn hash_canonical<T: Serialize>(value: &T) -> EveResult<String> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => {
            // Scalars already have a single serde_json rendering.
            out.push_str(&other.to_string());
        }
    }
}

/// First `n` hex characters of the SHA-256 of `input`.
pub fn short_hash(input: &str, n: usize) -> String {
    let mut digest = sha256_hex(input.as_bytes());
    digest.truncate(n);
    digest
}

/// Hash of a computation identity `(zone, from, to, methodology_version)`.
///
/// Separate from dataset identity (what was built) and artifact identity
/// (what was rendered).
pub fn query_hash(zone: &str, from: &str, to: &str, methodology_version: &str) -> String {
    sha256_hex(format!("{zone}|{from}|{to}|{methodology_version}").as_bytes())
}

/// Guard against malformed digests entering the chain.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}
