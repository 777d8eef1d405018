//! resumable - Checkpoint naming, persistence and resume for scientific data scripts.
//!
//! ## Layout
//!
//! - **naming**: split filenames, try candidate suffixes, suggest input and
//!   save locations
//! - **store**: compressed `.pgz` records, `.npz`/`.npy`/`.txt` readers, text export
//! - **checkpoint**: the progress protocol (`load_progress` / `save_progress`)
//!
//! ## Progress protocol
//!
//! A script calls `load_progress` with its input path and fresh parameters.
//! Depending on the mode and what exists on disk it gets back one of
//! `Skip`, `Continue`, `Restart` or `Empty`, plus merged parameters. When
//! done it calls `save_progress`, which writes the checkpoint atomically.

pub mod checkpoint;
pub mod models;
pub mod naming;
pub mod store;

// Re-exports for convenience
pub use checkpoint::{
    load_progress, merge_params, save_progress, LoadOptions, Precedence, Progress, ProgressMode,
    ProgressStatus, SaveOptions,
};
pub use models::{Config, Params, Record, ResumableError, Result, Value};
pub use naming::{match_suffix, split_name, suggest_location, Location, LocationState, SplitName};
pub use store::{export_record, export_text, load_record, recover_partial_writes, save_record};
