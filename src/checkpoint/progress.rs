//! Loading and saving run progress.
//!
//! Flow of `load_progress`:
//! 1. Suggest input and save locations
//! 2. Decide: skip, continue from the save, restart from the input, or empty
//! 3. Drop rejected keys, merge loaded and fresh parameters

use super::options::{LoadOptions, Precedence, ProgressMode, ProgressStatus, SaveOptions};
use crate::models::{Params, Record, ResumableError, Result};
use crate::naming::suggest_location;
use crate::store::{load_record, record_path, save_record};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run parameters together with where they came from and where they go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    /// Resolved raw input, if any
    pub input: Option<PathBuf>,
    /// Save location (file or un-suffixed base)
    pub save: Option<PathBuf>,
    pub params: Params,
}

impl Progress {
    pub fn new(params: Params) -> Self {
        Self {
            input: None,
            save: None,
            params,
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = Some(input.into());
        self
    }
}

impl From<Record> for Progress {
    fn from(record: Record) -> Self {
        Self {
            input: record.input,
            save: record.save,
            params: record.params,
        }
    }
}

/// Merge loaded and fresh parameters.
///
/// The lower-precedence map is the base; every key of the higher-precedence
/// map overwrites it, except `excepted` keys already present in the base.
pub fn merge_params(
    loaded: Params,
    fresh: Params,
    precedence: Precedence,
    excepted: &BTreeSet<String>,
) -> Params {
    let (mut merged, overrides) = match precedence {
        Precedence::NewWins => (loaded, fresh),
        Precedence::SavedWins => (fresh, loaded),
    };

    for (key, value) in overrides {
        if excepted.contains(&key) && merged.contains_key(&key) {
            continue;
        }
        merged.insert(key, value);
    }
    merged
}

/// Load progress for `input`, merging it with the fresh `params`.
///
/// Returns `Skip` without reading anything when the mode is `StartOnly` and a
/// checkpoint exists. Falling back to the raw input always yields `Restart`.
/// When neither file exists the call fails with `NotFound`, unless
/// `allow_empty` is set, in which case `params` come back untouched as `Empty`.
pub fn load_progress(
    input: &Path,
    params: Params,
    options: &LoadOptions,
) -> Result<(ProgressStatus, Progress)> {
    let location = suggest_location(input, &options.save)?;
    let save = location.save;

    let mut progress = Progress {
        input: location.input,
        save: Some(save.clone()),
        params,
    };

    let save_exists = save.exists();
    let raw_input = progress.input.clone().filter(|p| p.exists());

    let (status, record) = if options.mode == ProgressMode::StartOnly && save_exists {
        info!(save = %save.display(), "Skip, progress exists");
        return Ok((ProgressStatus::Skip, progress));
    } else if options.mode == ProgressMode::ResumeOrStart && save_exists {
        let record = load_record(&save)?;
        info!(save = %save.display(), "Continue, progress loaded");
        (ProgressStatus::Continue, record)
    } else if let Some(raw) = raw_input {
        let record = load_record(&raw)?;
        info!(input = %raw.display(), "Restart, input loaded");
        (ProgressStatus::Restart, record)
    } else if options.allow_empty {
        info!(save = %save.display(), "Empty, no input or progress on disk");
        return Ok((ProgressStatus::Empty, progress));
    } else {
        return Err(ResumableError::NotFound {
            input: progress.input.or_else(|| Some(input.to_path_buf())),
            save,
        });
    };

    if let Some(previous) = &record.save {
        debug!(previous = %previous.display(), "Record carried a save location");
    }

    let mut loaded = record.params;
    for key in &options.rejected {
        loaded.remove(key);
    }

    let fresh = std::mem::take(&mut progress.params);
    let mut merged = merge_params(loaded, fresh, options.precedence, &options.excepted);
    merged.retain(|key, _| !options.rejected.contains(key));
    progress.params = merged;

    Ok((status, progress))
}

/// Save progress. Returns the written path, which always ends in `.pgz`.
///
/// The target is `save_as`, else `progress.save`, else a location suggested
/// from `progress.input` inside `options.fallback_dir`. Rejected keys are
/// removed from `progress` itself before writing.
pub fn save_progress(
    progress: &mut Progress,
    save_as: Option<&Path>,
    options: &SaveOptions,
) -> Result<PathBuf> {
    let target = if let Some(path) = save_as {
        info!(save = %path.display(), "Save as");
        path.to_path_buf()
    } else if let Some(path) = &progress.save {
        info!(save = %path.display(), "Save to");
        path.clone()
    } else if let Some(input) = &progress.input {
        let location = suggest_location(input, &options.fallback_dir)?;
        info!(save = %location.save.display(), "Save to suggested location");
        location.save
    } else {
        return Err(ResumableError::SaveLocationUnknown);
    };

    for key in &options.rejected {
        progress.params.remove(key);
    }

    let record = Record {
        input: progress.input.clone(),
        save: Some(record_path(&target)),
        params: std::mem::take(&mut progress.params),
    };
    let written = save_record(&target, &record);
    progress.params = record.params;

    let written = written?;
    progress.save = Some(written.clone());
    Ok(written)
}
