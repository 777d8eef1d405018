//! Filename splitting and lexical path normalization.

use crate::models::{ResumableError, Result};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// A path split into directory, stem and declared suffix.
///
/// The stem ends at the first `.` of the final component, so
/// `runs/b.tar.gz` splits into `runs`, `b` and `tar.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName {
    /// Parent directory (empty when the path has none)
    pub dir: PathBuf,
    pub stem: String,
    /// Everything after the first `.`, empty if there is none
    pub suffix: String,
}

impl SplitName {
    /// `dir/stem`, the base that suffixes get appended to.
    pub fn base(&self) -> PathBuf {
        self.dir.join(&self.stem)
    }
}

/// Split `path` into directory, stem and suffix.
///
/// The path is normalized first; with `absolute` it is also made absolute
/// against the current directory.
pub fn split_name(path: &Path, absolute: bool) -> Result<SplitName> {
    let path = if absolute {
        let cwd = std::env::current_dir()
            .map_err(|e| ResumableError::io("resolving current directory", e))?;
        normalize(&cwd.join(path))
    } else {
        normalize(path)
    };

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let last = path
        .components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default();

    let (stem, suffix) = match last.split_once('.') {
        Some((stem, suffix)) => (stem.to_string(), suffix.to_string()),
        None => (last, String::new()),
    };

    Ok(SplitName { dir, stem, suffix })
}

/// Lexically normalize a path: drop `.` components and fold `name/..`.
///
/// Leading `..` components are kept, and `..` directly under the root is
/// dropped. An empty result becomes `.`. The filesystem is never consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(comp),
            },
            _ => parts.push(comp),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Append `.suffix` to a path without replacing any existing extension.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
