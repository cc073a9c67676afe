//! # eve-core: Evidence-pipeline core
//!
//! Shared substrate for the EVE pipeline: the unified error type, the
//! locked method registry and emission-factor table, canonical rounding,
//! and the SHA-256/stable-serialization helpers that every hashed surface
//! (file hashes, root hashes, chain hashes, query hashes) goes through.
//!
//! Nothing in this crate performs I/O against source archives or the
//! vault; it only defines the contracts the other crates build on.

pub mod error;
pub mod factors;
pub mod hash;
pub mod registry;
pub mod round;

pub use error::{EveError, EveResult};
pub use registry::MethodRegistry;
