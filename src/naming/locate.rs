//! Locating inputs and checkpoints from a basename.

use super::split::{normalize, split_name, with_suffix};
use crate::models::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suffixes tried by [`match_suffix`], in order.
pub const CANDIDATE_SUFFIXES: [&str; 4] = ["pgz", "npz", "npy", "txt"];

/// Find the file behind a basename.
///
/// Tries `base.pgz`, `base.npz`, `base.npy`, `base.txt` in that order, then
/// `base` itself. Returns `None` when nothing exists.
pub fn match_suffix(base: &Path) -> Option<PathBuf> {
    CANDIDATE_SUFFIXES
        .iter()
        .map(|sfx| with_suffix(base, sfx))
        .find(|p| p.exists())
        .or_else(|| base.exists().then(|| base.to_path_buf()))
}

/// Whether a save-side file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationState {
    /// No checkpoint yet; `save` is the un-suffixed candidate
    New,
    /// `save` points at an existing file
    Exists,
}

impl fmt::Display for LocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::Exists => f.write_str("exists"),
        }
    }
}

/// Suggested input and save locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Resolved input, `None` if nothing matched
    pub input: Option<PathBuf>,
    pub save: PathBuf,
    pub state: LocationState,
}

/// Suggest where the input lives and where its progress is saved.
///
/// `save` may be a file base or a directory; a directory is turned into
/// `<dir>/<input stem>`.
pub fn suggest_location(input: &Path, save: &Path) -> Result<Location> {
    let split = split_name(input, false)?;

    let input = if input.exists() {
        Some(input.to_path_buf())
    } else {
        match_suffix(&split.base())
    };

    let save = if save.is_dir() {
        normalize(&save.join(&split.stem))
    } else {
        save.to_path_buf()
    };

    let found = match_suffix(&save).or_else(|| {
        if split.suffix.is_empty() {
            return None;
        }
        let declared = with_suffix(&save, &split.suffix);
        declared.exists().then_some(declared)
    });

    let location = match found {
        Some(dst) => {
            info!(save = %dst.display(), "Progress exists");
            Location {
                input,
                save: dst,
                state: LocationState::Exists,
            }
        }
        None => {
            info!(save = %save.display(), "Progress is new");
            Location {
                input,
                save,
                state: LocationState::New,
            }
        }
    };

    Ok(location)
}
