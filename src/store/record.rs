//! Compressed record files (`.pgz`) and format dispatch on load.
//!
//! - Records are gzip-compressed JSON
//! - Writes go to a temp file in the target directory, then rename
//! - A crash mid-write leaves only a `.part` temp file, never a torn record

use super::arrays;
use crate::models::{Record, ResumableError, Result};
use crate::naming::with_suffix;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix of record files.
pub const RECORD_SUFFIX: &str = "pgz";

const PART_SUFFIX: &str = ".part";

/// Path a record will be written to: `.pgz` is appended unless present.
pub fn record_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(".pgz") {
        path.to_path_buf()
    } else {
        with_suffix(path, RECORD_SUFFIX)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Write a record, replacing any existing file. Returns the written path.
pub fn save_record(path: &Path, record: &Record) -> Result<PathBuf> {
    let target = record_path(path);
    let dir = parent_dir(&target);
    fs::create_dir_all(dir).map_err(|e| ResumableError::io("creating save directory", e))?;

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ResumableError::Internal(format!("Save path has no file name: {}", target.display()))
        })?;

    let temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(PART_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| ResumableError::io("creating temp record", e))?;

    {
        let writer = BufWriter::new(temp.as_file());
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, record)
            .map_err(|e| ResumableError::Internal(format!("Serializing record: {e}")))?;
        let mut writer = encoder
            .finish()
            .map_err(|e| ResumableError::io("compressing record", e))?;
        writer
            .flush()
            .map_err(|e| ResumableError::io("flushing record", e))?;
    }

    temp.as_file()
        .sync_all()
        .map_err(|e| ResumableError::io("syncing record", e))?;

    // Atomic rename
    temp.persist(&target)
        .map_err(|e| ResumableError::io("renaming record", e.error))?;

    debug!(path = %target.display(), params = record.params.len(), "Record saved");
    Ok(target)
}

/// Pick the file to read for `path`: `path.pgz`, then `path.npz`, then `path`.
fn resolve_record_file(path: &Path) -> PathBuf {
    [RECORD_SUFFIX, "npz"]
        .iter()
        .map(|sfx| with_suffix(path, sfx))
        .find(|p| p.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Load a record from a `.pgz`, `.npz`, `.npy` or `.txt` file.
///
/// Array files yield a record with only `params` set.
pub fn load_record(path: &Path) -> Result<Record> {
    let path = resolve_record_file(path);
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let record = match ext.as_str() {
        "npz" => Record::from_params(arrays::read_npz(&path)?),
        "npy" => Record::from_params(arrays::read_npy(&path)?),
        "txt" => Record::from_params(arrays::read_table(&path)?),
        _ => read_pgz(&path)?,
    };

    debug!(path = %path.display(), params = record.params.len(), "Record loaded");
    Ok(record)
}

fn read_pgz(path: &Path) -> Result<Record> {
    let file = File::open(path)
        .map_err(|e| ResumableError::io(format!("opening record {}", path.display()), e))?;
    let decoder = GzDecoder::new(BufReader::new(file));
    serde_json::from_reader(decoder)
        .map_err(|e| ResumableError::Parse(format!("Invalid record {}: {e}", path.display())))
}

/// Remove temp files left behind by interrupted saves in `dir`.
///
/// Returns the removed paths.
pub fn recover_partial_writes(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/.*.{RECORD_SUFFIX}.*{PART_SUFFIX}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let partial: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| ResumableError::Internal(format!("Invalid glob pattern: {e}")))?
        .filter_map(|r| r.ok())
        .collect();

    for path in &partial {
        warn!(path = %path.display(), "Removing partially written record");
        fs::remove_file(path)
            .map_err(|e| ResumableError::io("removing partial record", e))?;
    }

    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Params, Value};
    use tempfile::TempDir;

    fn sample_record() -> Record {
        let mut params = Params::new();
        params.insert("count".to_string(), Value::from(7));
        params.insert("note".to_string(), Value::from("first pass"));
        params.insert("cut".to_string(), Value::from(0.25));
        params.insert("done".to_string(), Value::from(false));
        params.insert("xs".to_string(), Value::from(vec![1.0, 2.0, 3.0]));
        Record {
            input: Some(PathBuf::from("raw/run.txt")),
            save: None,
            params,
        }
    }

    #[test]
    fn test_record_path() {
        assert_eq!(record_path(Path::new("out/run")), PathBuf::from("out/run.pgz"));
        assert_eq!(record_path(Path::new("out/run.pgz")), PathBuf::from("out/run.pgz"));
        assert_eq!(record_path(Path::new("run.txt")), PathBuf::from("run.txt.pgz"));
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let record = sample_record();

        let written = save_record(&temp_dir.path().join("run"), &record).unwrap();
        assert_eq!(written, temp_dir.path().join("run.pgz"));

        // Both the suffixed and the bare base resolve to the same file
        assert_eq!(load_record(&written).unwrap(), record);
        assert_eq!(load_record(&temp_dir.path().join("run")).unwrap(), record);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.pgz");

        save_record(&path, &sample_record()).unwrap();
        let mut second = sample_record();
        second.params.insert("count".to_string(), Value::from(8));
        save_record(&path, &second).unwrap();

        assert_eq!(load_record(&path).unwrap().params["count"], Value::from(8));
        assert!(recover_partial_writes(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/deeper/run");
        let written = save_record(&path, &sample_record()).unwrap();
        assert!(written.exists());
    }

    #[test]
    fn test_load_corrupt_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.pgz");
        fs::write(&path, b"definitely not gzip").unwrap();

        let err = load_record(&path).unwrap_err();
        assert!(matches!(err, ResumableError::Parse(_)));
    }

    #[test]
    fn test_load_missing_record() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_record(&temp_dir.path().join("nothing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_recover_partial_writes() {
        let temp_dir = TempDir::new().unwrap();
        let stale = temp_dir.path().join(".run.pgz.a1b2c3.part");
        fs::write(&stale, b"half a record").unwrap();
        let keep = temp_dir.path().join("run.pgz");
        fs::write(&keep, b"x").unwrap();

        let removed = recover_partial_writes(temp_dir.path()).unwrap();
        assert_eq!(removed, vec![stale.clone()]);
        assert!(!stale.exists());
        assert!(keep.exists());
    }
}
