//! Progress modes, statuses and options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// How an existing checkpoint is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    /// Only start if no checkpoint exists yet
    StartOnly,
    /// Continue from a checkpoint, start over from the input if there is none
    #[default]
    ResumeOrStart,
    /// Always start over from the input
    ForceRestart,
}

impl ProgressMode {
    pub fn code(self) -> u8 {
        match self {
            Self::StartOnly => 0,
            Self::ResumeOrStart => 1,
            Self::ForceRestart => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::StartOnly),
            1 => Some(Self::ResumeOrStart),
            2 => Some(Self::ForceRestart),
            _ => None,
        }
    }
}

/// Outcome of `load_progress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Checkpoint exists and the mode forbids touching it
    Skip,
    /// Resumed from the checkpoint
    Continue,
    /// Started over from the raw input
    Restart,
    /// Nothing on disk; caller supplies the initial state
    Empty,
}

impl ProgressStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Skip => 0,
            Self::Continue => 1,
            Self::Restart => 2,
            Self::Empty => 3,
        }
    }

    /// Whether the caller has work to do.
    pub fn should_run(self) -> bool {
        self != Self::Skip
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Skip => "skip",
            Self::Continue => "continue",
            Self::Restart => "restart",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}

/// Which side wins when loaded and fresh parameters share a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Freshly supplied parameters override loaded ones
    #[default]
    NewWins,
    /// Loaded parameters override freshly supplied ones
    SavedWins,
}

/// Options for `load_progress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Save file base or directory
    pub save: PathBuf,
    pub mode: ProgressMode,
    /// Keys dropped from the loaded record and the result
    pub rejected: BTreeSet<String>,
    pub precedence: Precedence,
    /// Keys that keep the lower-precedence value when both sides have them
    pub excepted: BTreeSet<String>,
    /// Return `Empty` instead of failing when nothing exists
    pub allow_empty: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            save: PathBuf::from("."),
            mode: ProgressMode::default(),
            rejected: BTreeSet::new(),
            precedence: Precedence::default(),
            excepted: BTreeSet::new(),
            allow_empty: false,
        }
    }
}

impl LoadOptions {
    pub fn with_save(mut self, save: impl Into<PathBuf>) -> Self {
        self.save = save.into();
        self
    }

    pub fn with_mode(mut self, mode: ProgressMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn reject(mut self, key: impl Into<String>) -> Self {
        self.rejected.insert(key.into());
        self
    }

    pub fn except(mut self, key: impl Into<String>) -> Self {
        self.excepted.insert(key.into());
        self
    }

    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

/// Options for `save_progress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    /// Keys removed from the progress before writing
    pub rejected: BTreeSet<String>,
    /// Directory used when the save path has to be suggested from the input
    pub fallback_dir: PathBuf,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            rejected: BTreeSet::new(),
            fallback_dir: PathBuf::from("."),
        }
    }
}

impl SaveOptions {
    pub fn reject(mut self, key: impl Into<String>) -> Self {
        self.rejected.insert(key.into());
        self
    }

    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes() {
        for code in 0..3 {
            assert_eq!(ProgressMode::from_code(code).unwrap().code(), code);
        }
        assert_eq!(ProgressMode::from_code(3), None);
        assert_eq!(ProgressMode::default(), ProgressMode::ResumeOrStart);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ProgressStatus::Skip.code(), 0);
        assert_eq!(ProgressStatus::Continue.code(), 1);
        assert_eq!(ProgressStatus::Restart.code(), 2);
        assert_eq!(ProgressStatus::Empty.code(), 3);
        assert!(!ProgressStatus::Skip.should_run());
        assert!(ProgressStatus::Empty.should_run());
    }

    #[test]
    fn test_load_options_builder() {
        let opts = LoadOptions::default()
            .with_save("out")
            .with_mode(ProgressMode::ForceRestart)
            .with_precedence(Precedence::SavedWins)
            .reject("scratch")
            .except("seed")
            .allow_empty(true);
        assert_eq!(opts.save, PathBuf::from("out"));
        assert_eq!(opts.mode, ProgressMode::ForceRestart);
        assert_eq!(opts.precedence, Precedence::SavedWins);
        assert!(opts.rejected.contains("scratch"));
        assert!(opts.excepted.contains("seed"));
        assert!(opts.allow_empty);
    }
}
