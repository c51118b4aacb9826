//! Pure domain logic for the presup quoting engine.
//!
//! This crate has no I/O: the db and api layers load rows, feed them into
//! these functions, and persist the results. Everything here is total over
//! well-typed input, so the api layer can treat any failure as a bug.

pub mod economics;
pub mod emission;
pub mod error;
pub mod margin;
pub mod modules;
pub mod offer;
pub mod quote_state;
pub mod types;

pub use error::CoreError;
