//! Core data models for resumable.
//!
//! - `Value` / `Params` / `Record`: what gets checkpointed
//! - `Config`: TOML defaults for loader, saver and exporter options
//! - `ResumableError`: everything that can go wrong

mod config;
mod error;
mod value;

pub use config::*;
pub use error::*;
pub use value::*;
