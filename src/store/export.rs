//! Plain-text export of run parameters.
//!
//! Layout of the output directory:
//! - `inf`: `fnm=`/`sav=` lines for a record's locations, then one
//!   `key=value` line per scalar (and per array of < 2 elements)
//! - `<key>`: one tab-delimited file per 1-D or 2-D array

use super::arrays::write_table;
use crate::models::{format_float, Params, Record, ResumableError, Result, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Name of the scalar summary file.
pub const INFO_FILE: &str = "inf";

/// Output directory for `whr`: its parent joined with the file name up to
/// the first `.`.
pub fn export_dir(whr: &Path) -> PathBuf {
    let parent = whr.parent().unwrap_or_else(|| Path::new(""));
    let head = whr
        .file_name()
        .map(|n| n.to_string_lossy().split('.').next().unwrap_or_default().to_string())
        .unwrap_or_default();
    parent.join(head)
}

/// Whether `key` names a single file inside the export directory.
fn is_plain_name(key: &str) -> bool {
    let mut components = Path::new(key).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Export `params` as text next to `whr`. Keys in `rejected` are skipped.
///
/// Arrays of three or more dimensions, and arrays whose key is not a plain
/// file name, are skipped with a warning. Returns the output directory.
pub fn export_text(whr: &Path, params: &Params, rejected: &BTreeSet<String>) -> Result<PathBuf> {
    write_export(whr, String::new(), params, rejected)
}

/// Export a whole record: its `fnm`/`sav` locations go to `inf` ahead of
/// the parameters, unless rejected.
pub fn export_record(whr: &Path, record: &Record, rejected: &BTreeSet<String>) -> Result<PathBuf> {
    let mut info = String::new();
    for (key, path) in [("fnm", &record.input), ("sav", &record.save)] {
        if let Some(path) = path.as_ref().filter(|_| !rejected.contains(key)) {
            info.push_str(&format!("{key}={}\n", path.display()));
        }
    }
    write_export(whr, info, &record.params, rejected)
}

fn write_export(
    whr: &Path,
    mut info: String,
    params: &Params,
    rejected: &BTreeSet<String>,
) -> Result<PathBuf> {
    let out = export_dir(whr);
    fs::create_dir_all(&out).map_err(|e| ResumableError::io("creating export directory", e))?;

    for (key, value) in params {
        if rejected.contains(key) {
            continue;
        }
        match value {
            Value::Array(a) if a.len() < 2 => {
                let v = a.iter().next().map_or_else(|| "[]".to_string(), |v| format_float(*v));
                info.push_str(&format!("{key}={v}\n"));
            }
            Value::Array(_) if !is_plain_name(key) => {
                warn!(key = %key, "Not exported, key is not a file name");
            }
            Value::Array(a) if a.ndim() < 3 => {
                write_table(&out.join(key), a)?;
                debug!(key = %key, shape = ?a.shape(), "Exported array");
            }
            Value::Array(a) => {
                warn!(key = %key, ndim = a.ndim(), "Not exported");
            }
            scalar => info.push_str(&format!("{key}={scalar}\n")),
        }
    }

    fs::write(out.join(INFO_FILE), info)
        .map_err(|e| ResumableError::io("writing export info", e))?;

    Ok(out)
}
