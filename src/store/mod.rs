//! On-disk formats.
//!
//! Provides:
//! - `record`: compressed `.pgz` records, atomic saves, temp-file recovery
//! - `arrays`: `.npz` / `.npy` / `.txt` readers
//! - `export`: plain-text export of parameters

mod arrays;
mod export;
mod record;

pub use arrays::{parse_table, read_npy, read_npz, read_table, write_table};
pub use export::*;
pub use record::*;
