//! NumPy archives, single arrays and plain numeric tables.
//!
//! All of these load as parameter maps of `Value::Array`. Every numeric and
//! boolean dtype NumPy writes is widened to `f64`: booleans become `0.0`/`1.0`,
//! and 64-bit integers above 2^53 in magnitude lose precision.

use crate::models::{format_float, Params, ResumableError, Result, Value};
use crate::naming::split_name;
use ndarray::{Array1, Array2, ArrayD, Axis};
use ndarray_npy::{NpzReader, ReadNpyExt, ReadNpzError, ReadableElement};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

fn array_err(path: &Path, e: impl std::fmt::Display) -> ResumableError {
    ResumableError::Array(format!("{}: {e}", path.display()))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| ResumableError::io(format!("opening {}", path.display()), e))
}

/// Key for a single-array file: its stem.
fn stem_key(path: &Path) -> Result<String> {
    Ok(split_name(path, false)?.stem)
}

/// Element types that load and widen to `f64`.
trait Widen: ReadableElement + Copy {
    fn widen(self) -> f64;
}

macro_rules! impl_widen {
    ($($t:ty),*) => {
        $(impl Widen for $t {
            fn widen(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_widen!(f32, i8, i16, i32, i64, u8, u16, u32, u64);

impl Widen for bool {
    fn widen(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

fn npz_as<T: Widen, R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Option<ArrayD<f64>> {
    let array: std::result::Result<ArrayD<T>, _> = npz.by_name(name);
    array.ok().map(|a| a.mapv(Widen::widen))
}

fn npy_as<T: Widen>(path: &Path) -> Option<ArrayD<f64>> {
    let file = File::open(path).ok()?;
    ArrayD::<T>::read_npy(file).ok().map(|a| a.mapv(Widen::widen))
}

fn read_npz_member<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    name: &str,
) -> std::result::Result<ArrayD<f64>, ReadNpzError> {
    let floats: std::result::Result<ArrayD<f64>, _> = npz.by_name(name);
    let err = match floats {
        Ok(array) => return Ok(array),
        Err(err) => err,
    };

    let readers: [fn(&mut NpzReader<R>, &str) -> Option<ArrayD<f64>>; 10] = [
        npz_as::<i64, R>,
        npz_as::<f32, R>,
        npz_as::<i32, R>,
        npz_as::<i16, R>,
        npz_as::<i8, R>,
        npz_as::<u64, R>,
        npz_as::<u32, R>,
        npz_as::<u16, R>,
        npz_as::<u8, R>,
        npz_as::<bool, R>,
    ];
    readers
        .iter()
        .find_map(|read| read(&mut *npz, name))
        .ok_or(err)
}

/// Read every array of an `.npz` archive, one parameter per member.
pub fn read_npz(path: &Path) -> Result<Params> {
    let mut npz = NpzReader::new(open(path)?).map_err(|e| array_err(path, e))?;
    let names = npz.names().map_err(|e| array_err(path, e))?;

    let mut params = Params::new();
    for name in names {
        let array = read_npz_member(&mut npz, &name).map_err(|e| array_err(path, e))?;
        let key = name.strip_suffix(".npy").unwrap_or(&name).to_string();
        params.insert(key, Value::Array(array));
    }
    Ok(params)
}

/// Read a single `.npy` array, keyed by the file stem.
pub fn read_npy(path: &Path) -> Result<Params> {
    let err = match ArrayD::<f64>::read_npy(open(path)?) {
        Ok(array) => return keyed_by_stem(path, array),
        Err(err) => err,
    };

    let readers: [fn(&Path) -> Option<ArrayD<f64>>; 10] = [
        npy_as::<i64>,
        npy_as::<f32>,
        npy_as::<i32>,
        npy_as::<i16>,
        npy_as::<i8>,
        npy_as::<u64>,
        npy_as::<u32>,
        npy_as::<u16>,
        npy_as::<u8>,
        npy_as::<bool>,
    ];
    let array = readers
        .iter()
        .find_map(|read| read(path))
        .ok_or_else(|| array_err(path, err))?;
    keyed_by_stem(path, array)
}

fn keyed_by_stem(path: &Path, array: ArrayD<f64>) -> Result<Params> {
    let mut params = Params::new();
    params.insert(stem_key(path)?, Value::Array(array));
    Ok(params)
}

/// Parse a whitespace-delimited numeric table.
///
/// Blank lines and `#` comments are ignored. A single row or a single column
/// gives a 1-D array, anything else a 2-D array.
pub fn parse_table(text: &str) -> std::result::Result<ArrayD<f64>, String> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| format!("Line {}: {e}", line_num + 1))?;
        rows.push(row);
    }

    if rows.len() <= 1 || rows.iter().all(|r| r.len() == 1) {
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        return Ok(Array1::from(flat).into_dyn());
    }

    let width = rows[0].len();
    if let Some(pos) = rows.iter().position(|r| r.len() != width) {
        return Err(format!(
            "Row {} has {} columns, expected {width}",
            pos + 1,
            rows[pos].len()
        ));
    }

    let height = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((height, width), flat)
        .map(|a| a.into_dyn())
        .map_err(|e| e.to_string())
}

/// Read a numeric text table, keyed by the file stem.
pub fn read_table(path: &Path) -> Result<Params> {
    let text = fs::read_to_string(path)
        .map_err(|e| ResumableError::io(format!("reading {}", path.display()), e))?;
    let array = parse_table(&text)
        .map_err(|e| ResumableError::Parse(format!("{}: {e}", path.display())))?;
    keyed_by_stem(path, array)
}

/// Write a 1-D or 2-D array as tab-delimited text, one row per line.
pub fn write_table(path: &Path, array: &ArrayD<f64>) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| ResumableError::io(format!("creating {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);

    let write_err = |e| ResumableError::io(format!("writing {}", path.display()), e);
    match array.ndim() {
        0 | 1 => {
            for v in array.iter() {
                writeln!(writer, "{}", format_float(*v)).map_err(write_err)?;
            }
        }
        2 => {
            for row in array.axis_iter(Axis(0)) {
                let cells: Vec<String> = row.iter().map(|v| format_float(*v)).collect();
                writeln!(writer, "{}", cells.join("\t")).map_err(write_err)?;
            }
        }
        n => {
            return Err(ResumableError::Internal(format!(
                "Cannot write {n}-D array as a table"
            )))
        }
    }

    writer.flush().map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::{write_npy, NpzWriter};
    use tempfile::TempDir;

    #[test]
    fn test_read_npz() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run.npz");
        {
            let mut npz = NpzWriter::new_compressed(File::create(&path).unwrap());
            npz.add_array("a", &array![1.0f64, 2.0, 3.0]).unwrap();
            npz.add_array("grid", &array![[1.0f64, 2.0], [3.0, 4.0]]).unwrap();
            npz.add_array("ids", &array![4i64, 5]).unwrap();
            npz.finish().unwrap();
        }

        let params = read_npz(&path).unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params["a"], Value::from(vec![1.0, 2.0, 3.0]));
        assert_eq!(params["grid"].as_array().unwrap().shape(), &[2, 2]);
        assert_eq!(params["ids"], Value::from(vec![4.0, 5.0]));
    }

    #[test]
    fn test_read_npy_keyed_by_stem() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("signal.npy");
        write_npy(&path, &Array1::from(vec![0.5f64, 1.5])).unwrap();

        let params = read_npy(&path).unwrap();
        assert_eq!(params["signal"], Value::from(vec![0.5, 1.5]));
    }

    #[test]
    fn test_read_npz_narrow_dtypes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mixed.npz");
        {
            let mut npz = NpzWriter::new(File::create(&path).unwrap());
            npz.add_array("weights", &array![0.5f32, 1.25]).unwrap();
            npz.add_array("counts", &array![1i32, -2, 3]).unwrap();
            npz.add_array("pixels", &array![[0u8, 255], [7, 8]]).unwrap();
            npz.add_array("mask", &array![true, false, true]).unwrap();
            npz.finish().unwrap();
        }

        let params = read_npz(&path).unwrap();
        assert_eq!(params["weights"], Value::from(vec![0.5, 1.25]));
        assert_eq!(params["counts"], Value::from(vec![1.0, -2.0, 3.0]));
        let pixels = params["pixels"].as_array().unwrap();
        assert_eq!(pixels.shape(), &[2, 2]);
        assert_eq!(pixels.as_slice().unwrap(), &[0.0, 255.0, 7.0, 8.0]);
        assert_eq!(params["mask"], Value::from(vec![1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_read_npy_narrow_dtypes() {
        let temp_dir = TempDir::new().unwrap();

        let ints = temp_dir.path().join("steps.npy");
        write_npy(&ints, &Array1::from(vec![3i32, 4])).unwrap();
        assert_eq!(read_npy(&ints).unwrap()["steps"], Value::from(vec![3.0, 4.0]));

        let halfs = temp_dir.path().join("scale.npy");
        write_npy(&halfs, &Array1::from(vec![0.25f32])).unwrap();
        assert_eq!(read_npy(&halfs).unwrap()["scale"], Value::from(vec![0.25]));

        let flags = temp_dir.path().join("flags.npy");
        write_npy(&flags, &Array1::from(vec![false, true])).unwrap();
        assert_eq!(read_npy(&flags).unwrap()["flags"], Value::from(vec![0.0, 1.0]));
    }

    #[test]
    fn test_read_npy_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.npy");
        fs::write(&path, b"not numpy").unwrap();
        assert!(matches!(read_npy(&path).unwrap_err(), ResumableError::Array(_)));
    }

    #[test]
    fn test_parse_table_shapes() {
        let column = parse_table("1\n2\n3\n").unwrap();
        assert_eq!(column.shape(), &[3]);

        let row = parse_table("1 2 3\n").unwrap();
        assert_eq!(row.shape(), &[3]);

        let grid = parse_table("# header\n1\t2\n3 4\n\n").unwrap();
        assert_eq!(grid.shape(), &[2, 2]);
        assert_eq!(grid.as_slice().unwrap(), &[1.0, 2.0, 3.0, 4.0]);

        let empty = parse_table("").unwrap();
        assert_eq!(empty.shape(), &[0]);
    }

    #[test]
    fn test_parse_table_errors() {
        assert!(parse_table("1 2\n3\n").unwrap_err().contains("Row 2"));
        assert!(parse_table("1\n2 3\n").unwrap_err().contains("Row 2"));
        assert!(parse_table("1 x\n").unwrap_err().contains("Line 1"));
    }

    #[test]
    fn test_write_then_read_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("grid.txt");
        let grid = array![[1.0f64, 2.5], [3.0, 4.0]].into_dyn();
        write_table(&path, &grid).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1.0\t2.5\n3.0\t4.0\n");
        assert_eq!(read_table(&path).unwrap()["grid"], Value::Array(grid));
    }
}
