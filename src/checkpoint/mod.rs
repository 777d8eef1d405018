//! Checkpoint module for resumable runs.
//!
//! Provides:
//! - `load_progress`: resolve, decide status, load and merge parameters
//! - `save_progress`: resolve the save path and persist parameters
//! - `merge_params`: precedence merge of loaded and fresh parameters

mod options;
mod progress;

pub use options::*;
pub use progress::*;
