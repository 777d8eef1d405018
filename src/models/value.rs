//! Parameter values and records.
//!
//! Run parameters are an open key → value mapping. Values are a closed set of
//! kinds so that records stay serializable without a schema.

use ndarray::{Array1, ArrayD, IxDyn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A single run parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    Bool(bool),
    Text(String),
    /// N-dimensional numeric data
    Array(#[serde(with = "array_repr")] ArrayD<f64>),
}

/// On-disk form of a float. JSON has no NaN or infinities, so those are
/// written as the strings `NaN`, `inf` and `-inf`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireFloat {
    Number(f64),
    Special(String),
}

impl From<f64> for WireFloat {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Self::Number(v)
        } else if v.is_nan() {
            Self::Special("NaN".to_string())
        } else if v > 0.0 {
            Self::Special("inf".to_string())
        } else {
            Self::Special("-inf".to_string())
        }
    }
}

impl WireFloat {
    fn into_f64(self) -> std::result::Result<f64, String> {
        match self {
            Self::Number(v) => Ok(v),
            Self::Special(s) => s
                .parse::<f64>()
                .ok()
                .filter(|v| !v.is_finite())
                .ok_or_else(|| format!("invalid float `{s}`")),
        }
    }
}

mod float_repr {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(
        v: &f64,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        WireFloat::from(*v).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<f64, D::Error> {
        WireFloat::deserialize(deserializer)?
            .into_f64()
            .map_err(D::Error::custom)
    }
}

/// Arrays are stored as a row-major `data` list plus their `shape`.
#[derive(Serialize, Deserialize)]
struct WireArray {
    shape: Vec<usize>,
    data: Vec<WireFloat>,
}

mod array_repr {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S: Serializer>(
        array: &ArrayD<f64>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        WireArray {
            shape: array.shape().to_vec(),
            data: array.iter().map(|v| WireFloat::from(*v)).collect(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<ArrayD<f64>, D::Error> {
        let wire = WireArray::deserialize(deserializer)?;
        let data = wire
            .data
            .into_iter()
            .map(WireFloat::into_f64)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(D::Error::custom)?;
        ArrayD::from_shape_vec(IxDyn(&wire.shape), data).map_err(D::Error::custom)
    }
}

/// Run parameters, ordered by key.
pub type Params = BTreeMap<String, Value>;

impl Value {
    /// Build a 1-D array value.
    pub fn vector(data: Vec<f64>) -> Self {
        Self::Array(Array1::from(data).into_dyn())
    }

    /// Returns true for every kind except `Array`.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Array(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// Render a float the way text exports expect: always with a decimal point.
pub(crate) fn format_float(v: f64) -> String {
    format!("{v:?}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Array(a) => {
                let items: Vec<String> = a.iter().map(|v| format_float(*v)).collect();
                write!(f, "[{}]", items.join(" "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(v: ArrayD<f64>) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::vector(v)
    }
}

/// A checkpoint as it lives on disk.
///
/// The input and save locations are explicit fields rather than entries in
/// `params`; on disk they keep the short names `fnm` and `sav`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Raw input the run was started from
    #[serde(rename = "fnm", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,

    /// Where the record was saved
    #[serde(rename = "sav", default, skip_serializing_if = "Option::is_none")]
    pub save: Option<PathBuf>,

    /// Run parameters
    #[serde(default)]
    pub params: Params,
}

impl Record {
    /// Record holding only parameters, as read from array files.
    pub fn from_params(params: Params) -> Self {
        Self {
            input: None,
            save: None,
            params,
        }
    }
}
