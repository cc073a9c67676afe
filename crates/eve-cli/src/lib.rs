//! # eve-cli: Command-line interface
//!
//! User-facing entry points over the evidence pipeline:
//!
//! ```text
//! eve
//! ├── build     # canonicalize + manifest + vault-seal, zone by zone
//! ├── query     # window statistics with full provenance
//! └── golden    # self-contained property suite (exit 1 on violation)
//! ```
//!
//! Commands return exit 0 on success and 1 on any failure, with the last
//! stderr line carrying a single structured `error: ...` message.

pub mod cli;
pub mod commands;
