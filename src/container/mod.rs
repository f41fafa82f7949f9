//! Narrow adapter over hierarchical containers.
//!
//! A container is a tree of groups addressed by absolute, slash-separated
//! paths (`/`, `/annotations`, `/annotations/ids`). Groups carry named
//! attributes; leaves are typed N-dimensional datasets. The store only needs
//! a handful of operations on top of that, collected in [`Container`].
//!
//! Two implementations ship with the crate:
//! - [`FsBackend`]: a directory tree on the local filesystem
//! - [`MemoryBackend`]: an in-process tree, for tests and benchmarks
//!
//! # Paths
//!
//! Paths are normalized before use: repeated and trailing slashes are
//! dropped and a missing leading slash is implied, so `annotations/` and
//! `/annotations` name the same group. `.` and `..` components are rejected.

mod fs;
mod memory;

pub use fs::{FsBackend, FsContainer};
pub use memory::{MemoryBackend, MemoryContainer};

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Element type of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Float32,
    Uint64,
    String,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Float32 => "float32",
            DataType::Uint64 => "uint64",
            DataType::String => "string",
        })
    }
}

/// The elements of a dataset, flattened in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetValues {
    Float32(Vec<f32>),
    Uint64(Vec<u64>),
    String(Vec<String>),
}

impl DatasetValues {
    pub fn data_type(&self) -> DataType {
        match self {
            DatasetValues::Float32(_) => DataType::Float32,
            DatasetValues::Uint64(_) => DataType::Uint64,
            DatasetValues::String(_) => DataType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DatasetValues::Float32(v) => v.len(),
            DatasetValues::Uint64(v) => v.len(),
            DatasetValues::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Floats(Vec<f32>),
}

/// A dense N-dimensional array with its dimensions, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct MdArray<T> {
    dims: Vec<usize>,
    data: Vec<T>,
}

impl<T> MdArray<T> {
    /// Creates an array from its dimensions and row-major elements.
    ///
    /// # Errors
    /// Returns [`StoreError::ShapeMismatch`] if the element count does not
    /// match the product of `dims`.
    pub fn new(path: &str, dims: Vec<usize>, data: Vec<T>) -> Result<Self, StoreError> {
        check_element_count(path, dims, data.len()).map(|dims| Self { dims, data })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of the first dimension (0 for a scalar).
    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Number of elements per row.
    pub fn row_len(&self) -> usize {
        self.dims.iter().skip(1).product()
    }

    /// Returns the `i`-th row. Panics if `i >= rows()`.
    pub fn row(&self, i: usize) -> &[T] {
        let len = self.row_len();
        &self.data[i * len..(i + 1) * len]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

/// Operations the annotation store needs from an open container.
///
/// Implementors provide the untyped primitives; the typed accessors used by
/// the reader and writer are provided on top of them.
pub trait Container {
    /// Returns true if the object at `path` exists and has attribute `name`.
    fn has_attr(&self, path: &str, name: &str) -> Result<bool, StoreError>;

    /// Reads attribute `name` of the object at `path`.
    ///
    /// Fails with [`StoreError::AttributeMissing`] if it is absent.
    fn attr(&self, path: &str, name: &str) -> Result<AttrValue, StoreError>;

    /// Writes attribute `name` of the existing object at `path`.
    fn set_attr(&mut self, path: &str, name: &str, value: AttrValue) -> Result<(), StoreError>;

    /// Reads a dataset. Fails with [`StoreError::DatasetMissing`] if `path`
    /// does not resolve to a dataset.
    fn read_dataset(&self, path: &str) -> Result<(Vec<usize>, DatasetValues), StoreError>;

    /// Creates or replaces a dataset, creating missing parent groups.
    fn write_dataset(
        &mut self,
        path: &str,
        dims: Vec<usize>,
        values: DatasetValues,
    ) -> Result<(), StoreError>;

    /// Creates a group and its parents. Existing groups are left alone.
    fn create_group(&mut self, path: &str) -> Result<(), StoreError>;

    /// Removes the object at `path` and everything below it. Removing a
    /// missing object succeeds.
    fn delete(&mut self, path: &str) -> Result<(), StoreError>;

    /// Returns true if a group or dataset exists at `path`.
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    fn get_string_attr(&self, path: &str, name: &str) -> Result<String, StoreError> {
        match self.attr(path, name)? {
            AttrValue::Text(text) => Ok(text),
            AttrValue::Floats(_) => Err(attr_type_error(path, name, "a string")),
        }
    }

    fn get_f32_array_attr(&self, path: &str, name: &str) -> Result<Vec<f32>, StoreError> {
        match self.attr(path, name)? {
            AttrValue::Floats(values) => Ok(values),
            AttrValue::Text(_) => Err(attr_type_error(path, name, "a float array")),
        }
    }

    fn set_string_attr(&mut self, path: &str, name: &str, value: &str) -> Result<(), StoreError> {
        self.set_attr(path, name, AttrValue::Text(value.to_string()))
    }

    fn set_f32_array_attr(
        &mut self,
        path: &str,
        name: &str,
        values: &[f32],
    ) -> Result<(), StoreError> {
        self.set_attr(path, name, AttrValue::Floats(values.to_vec()))
    }

    fn read_f32_md(&self, path: &str) -> Result<MdArray<f32>, StoreError> {
        match self.read_dataset(path)? {
            (dims, DatasetValues::Float32(data)) => MdArray::new(path, dims, data),
            (_, other) => Err(dataset_type_error(path, DataType::Float32, other.data_type())),
        }
    }

    fn read_u64_md(&self, path: &str) -> Result<MdArray<u64>, StoreError> {
        match self.read_dataset(path)? {
            (dims, DatasetValues::Uint64(data)) => MdArray::new(path, dims, data),
            (_, other) => Err(dataset_type_error(path, DataType::Uint64, other.data_type())),
        }
    }

    fn read_string_array(&self, path: &str) -> Result<Vec<String>, StoreError> {
        match self.read_dataset(path)? {
            (_, DatasetValues::String(data)) => Ok(data),
            (_, other) => Err(dataset_type_error(path, DataType::String, other.data_type())),
        }
    }

    fn write_f32_matrix(&mut self, path: &str, rows: &[[f32; 3]]) -> Result<(), StoreError> {
        let data = rows.iter().flatten().copied().collect();
        self.write_dataset(path, vec![rows.len(), 3], DatasetValues::Float32(data))
    }

    fn write_u64_array(&mut self, path: &str, values: &[u64]) -> Result<(), StoreError> {
        self.write_dataset(
            path,
            vec![values.len()],
            DatasetValues::Uint64(values.to_vec()),
        )
    }

    fn write_u64_matrix(&mut self, path: &str, rows: &[[u64; 2]]) -> Result<(), StoreError> {
        let data = rows.iter().flatten().copied().collect();
        self.write_dataset(path, vec![rows.len(), 2], DatasetValues::Uint64(data))
    }

    fn write_string_array(&mut self, path: &str, values: &[String]) -> Result<(), StoreError> {
        self.write_dataset(
            path,
            vec![values.len()],
            DatasetValues::String(values.to_vec()),
        )
    }
}

/// Opens containers by location.
///
/// Handles are scoped: the store opens one per `read` or `write` call and
/// drops it on every exit path.
pub trait Backend {
    type Handle: Container;

    /// Opens an existing container for reading.
    fn open_read(&self, path: &Path) -> Result<Self::Handle, StoreError>;

    /// Opens a container for reading and writing, creating it if missing.
    fn open_read_write(&self, path: &Path) -> Result<Self::Handle, StoreError>;
}

/// Splits a container path into its components, validating each one.
pub fn path_components(path: &str) -> Result<Vec<&str>, StoreError> {
    let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    if components.iter().any(|c| *c == "." || *c == "..") {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(components)
}

/// Normalizes a container path to `/a/b` form (`/` for the root).
pub fn normalize_path(path: &str) -> Result<String, StoreError> {
    Ok(format!("/{}", path_components(path)?.join("/")))
}

/// Number of elements of a dataset with dimensions `dims`.
///
/// Fails with [`StoreError::ShapeMismatch`] if the product, or the product of
/// the trailing dimensions, does not fit in `usize`.
pub fn element_count(path: &str, dims: &[usize]) -> Result<usize, StoreError> {
    let overflow = || StoreError::ShapeMismatch {
        path: path.to_string(),
        expected: "dimensions with an addressable element count".to_string(),
        found: dims.to_vec(),
    };
    let row_len = dims
        .iter()
        .skip(1)
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(overflow)?;
    dims.first()
        .map_or(Some(row_len), |&rows| rows.checked_mul(row_len))
        .ok_or_else(overflow)
}

/// Returns `dims` if it describes exactly `len` elements.
pub(crate) fn check_element_count(
    path: &str,
    dims: Vec<usize>,
    len: usize,
) -> Result<Vec<usize>, StoreError> {
    if element_count(path, &dims)? != len {
        return Err(StoreError::ShapeMismatch {
            path: path.to_string(),
            expected: format!("{} elements", len),
            found: dims,
        });
    }
    Ok(dims)
}

/// Joins a child name onto a group path.
pub fn join_path(group: &str, name: &str) -> String {
    let group = group.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    format!("{}/{}", group, name)
}

fn attr_type_error(path: &str, name: &str, expected: &str) -> StoreError {
    StoreError::Format {
        path: path.to_string(),
        message: format!("attribute '{}' is not {}", name, expected),
    }
}

fn dataset_type_error(path: &str, expected: DataType, found: DataType) -> StoreError {
    StoreError::Format {
        path: path.to_string(),
        message: format!("expected {} dataset, found {}", expected, found),
    }
}

pub(crate) fn read_only_error(path: &str) -> StoreError {
    StoreError::ContainerIo {
        path: path.into(),
        source: std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "container is open read-only",
        ),
    }
}
