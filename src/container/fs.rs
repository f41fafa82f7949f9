//! Directory-backed container.
//!
//! # Layout
//!
//! - A group is a directory. Its attributes live in `attributes.json`, a
//!   JSON object with sorted keys.
//! - A dataset is a directory holding `dataset.json`
//!   (`{"dataType": "float32", "dimensions": [N, 3]}`, dimensions row-major)
//!   and a `data` file with the elements in big-endian byte order. Strings
//!   are stored as a big-endian `u32` byte length followed by UTF-8 bytes.
//!
//! Output is deterministic: writing the same values twice produces
//! byte-identical files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    check_element_count, element_count, path_components, read_only_error, AttrValue, Backend,
    Container, DataType, DatasetValues,
};
use crate::error::StoreError;

const ATTRIBUTES_FILE: &str = "attributes.json";
const DATASET_FILE: &str = "dataset.json";
const DATA_FILE: &str = "data";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetHeader {
    data_type: DataType,
    dimensions: Vec<usize>,
}

/// Opens [`FsContainer`]s rooted at a directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsBackend;

impl Backend for FsBackend {
    type Handle = FsContainer;

    fn open_read(&self, path: &Path) -> Result<FsContainer, StoreError> {
        let meta = fs::metadata(path).map_err(|source| StoreError::ContainerIo {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(not_a_container(path));
        }
        Ok(FsContainer {
            root: path.to_path_buf(),
            writable: false,
        })
    }

    fn open_read_write(&self, path: &Path) -> Result<FsContainer, StoreError> {
        if path.exists() && !path.is_dir() {
            return Err(not_a_container(path));
        }
        fs::create_dir_all(path).map_err(|source| StoreError::ContainerIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(FsContainer {
            root: path.to_path_buf(),
            writable: true,
        })
    }
}

/// An open directory container.
#[derive(Debug)]
pub struct FsContainer {
    root: PathBuf,
    writable: bool,
}

impl FsContainer {
    /// The directory this container is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let mut dir = self.root.clone();
        for component in path_components(path)? {
            if matches!(component, ATTRIBUTES_FILE | DATASET_FILE | DATA_FILE) {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
            dir.push(component);
        }
        Ok(dir)
    }

    fn check_writable(&self, path: &str) -> Result<(), StoreError> {
        if self.writable {
            Ok(())
        } else {
            Err(read_only_error(path))
        }
    }

    fn load_attrs(&self, dir: &Path) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        let file = dir.join(ATTRIBUTES_FILE);
        if !file.is_file() {
            return Ok(BTreeMap::new());
        }
        let bytes = fs::read(&file).map_err(|source| io_error(&file, source))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Format {
            path: file.display().to_string(),
            message: format!("invalid attributes: {}", e),
        })
    }

    fn load_header(&self, path: &str, dir: &Path) -> Result<DatasetHeader, StoreError> {
        let file = dir.join(DATASET_FILE);
        if !file.is_file() {
            return Err(StoreError::DatasetMissing(path.to_string()));
        }
        let bytes = fs::read(&file).map_err(|source| io_error(&file, source))?;
        serde_json::from_slice(&bytes).map_err(|e| format_error(path, format!("invalid dataset header: {}", e)))
    }
}

impl Container for FsContainer {
    fn has_attr(&self, path: &str, name: &str) -> Result<bool, StoreError> {
        let dir = self.resolve(path)?;
        Ok(self.load_attrs(&dir)?.contains_key(name))
    }

    fn attr(&self, path: &str, name: &str) -> Result<AttrValue, StoreError> {
        let dir = self.resolve(path)?;
        let value = self
            .load_attrs(&dir)?
            .remove(name)
            .ok_or_else(|| StoreError::AttributeMissing {
                path: path.to_string(),
                name: name.to_string(),
            })?;

        match value {
            serde_json::Value::String(text) => Ok(AttrValue::Text(text)),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_f64().map(|v| v as f32))
                .collect::<Option<Vec<f32>>>()
                .map(AttrValue::Floats)
                .ok_or_else(|| {
                    format_error(path, format!("attribute '{}' is not a number array", name))
                }),
            _ => Err(format_error(
                path,
                format!("attribute '{}' has an unsupported type", name),
            )),
        }
    }

    fn set_attr(&mut self, path: &str, name: &str, value: AttrValue) -> Result<(), StoreError> {
        self.check_writable(path)?;
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(StoreError::DatasetMissing(path.to_string()));
        }

        let mut attrs = self.load_attrs(&dir)?;
        let json = match value {
            AttrValue::Text(text) => serde_json::Value::String(text),
            AttrValue::Floats(values) => serde_json::Value::Array(
                values
                    .into_iter()
                    .map(|v| serde_json::Value::from(f64::from(v)))
                    .collect(),
            ),
        };
        attrs.insert(name.to_string(), json);

        let file = dir.join(ATTRIBUTES_FILE);
        let bytes = serde_json::to_vec_pretty(&attrs)?;
        fs::write(&file, bytes).map_err(|source| io_error(&file, source))
    }

    fn read_dataset(&self, path: &str) -> Result<(Vec<usize>, DatasetValues), StoreError> {
        let dir = self.resolve(path)?;
        let header = self.load_header(path, &dir)?;
        let count = element_count(path, &header.dimensions)?;

        let file = dir.join(DATA_FILE);
        let bytes = fs::read(&file).map_err(|source| io_error(&file, source))?;

        let values = match header.data_type {
            DataType::Float32 => {
                DatasetValues::Float32(decode_fixed(path, &bytes, count, f32::from_be_bytes)?)
            }
            DataType::Uint64 => {
                DatasetValues::Uint64(decode_fixed(path, &bytes, count, u64::from_be_bytes)?)
            }
            DataType::String => DatasetValues::String(decode_strings(path, &bytes, count)?),
        };
        Ok((header.dimensions, values))
    }

    fn write_dataset(
        &mut self,
        path: &str,
        dims: Vec<usize>,
        values: DatasetValues,
    ) -> Result<(), StoreError> {
        self.check_writable(path)?;
        let dir = self.resolve(path)?;
        if dir == self.root {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        if dir.is_dir() && !dir.join(DATASET_FILE).is_file() {
            return Err(format_error(path, "a group exists at this path".to_string()));
        }
        let dims = check_element_count(path, dims, values.len())?;
        let data = encode(path, &values)?;

        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;

        let header = DatasetHeader {
            data_type: values.data_type(),
            dimensions: dims,
        };
        let header_file = dir.join(DATASET_FILE);
        fs::write(&header_file, serde_json::to_vec_pretty(&header)?)
            .map_err(|source| io_error(&header_file, source))?;

        let data_file = dir.join(DATA_FILE);
        fs::write(&data_file, data).map_err(|source| io_error(&data_file, source))
    }

    fn create_group(&mut self, path: &str) -> Result<(), StoreError> {
        self.check_writable(path)?;
        let dir = self.resolve(path)?;
        if dir.join(DATASET_FILE).is_file() {
            return Err(format_error(path, "a dataset exists at this path".to_string()));
        }
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        self.check_writable(path)?;
        let dir = self.resolve(path)?;
        if dir == self.root {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        if !dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&dir).map_err(|source| io_error(&dir, source))
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.resolve(path)?.is_dir())
    }
}

// ============================================================================
// Element encoding
// ============================================================================

fn encode(path: &str, values: &DatasetValues) -> Result<Vec<u8>, StoreError> {
    Ok(match values {
        DatasetValues::Float32(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
        DatasetValues::Uint64(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
        DatasetValues::String(v) => {
            let mut bytes = Vec::new();
            for s in v {
                bytes.extend_from_slice(&string_len_prefix(path, s.len())?);
                bytes.extend_from_slice(s.as_bytes());
            }
            bytes
        }
    })
}

fn string_len_prefix(path: &str, len: usize) -> Result<[u8; 4], StoreError> {
    u32::try_from(len).map(u32::to_be_bytes).map_err(|_| {
        format_error(
            path,
            format!("string of {} bytes exceeds the u32 length prefix", len),
        )
    })
}

fn decode_fixed<T, const N: usize>(
    path: &str,
    bytes: &[u8],
    count: usize,
    from_be: fn([u8; N]) -> T,
) -> Result<Vec<T>, StoreError> {
    let expected = count
        .checked_mul(N)
        .ok_or_else(|| format_error(path, format!("{} elements overflow the data size", count)))?;
    if bytes.len() != expected {
        return Err(format_error(
            path,
            format!("expected {} bytes of data, found {}", expected, bytes.len()),
        ));
    }
    Ok(bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut buf = [0u8; N];
            buf.copy_from_slice(chunk);
            from_be(buf)
        })
        .collect())
}

fn decode_strings(path: &str, bytes: &[u8], count: usize) -> Result<Vec<String>, StoreError> {
    let truncated = || format_error(path, "truncated string data".to_string());

    // every string takes at least its 4-byte length prefix
    let mut out = Vec::with_capacity(count.min(bytes.len() / 4));
    let mut rest = bytes;
    for _ in 0..count {
        if rest.len() < 4 {
            return Err(truncated());
        }
        let (len_bytes, tail) = rest.split_at(4);
        let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
        if tail.len() < len {
            return Err(truncated());
        }
        let (text, tail) = tail.split_at(len);
        let text = String::from_utf8(text.to_vec())
            .map_err(|_| format_error(path, "string data is not valid UTF-8".to_string()))?;
        out.push(text);
        rest = tail;
    }
    if !rest.is_empty() {
        return Err(format_error(path, "trailing bytes after string data".to_string()));
    }
    Ok(out)
}

fn not_a_container(path: &Path) -> StoreError {
    StoreError::Format {
        path: path.display().to_string(),
        message: "not a container directory".to_string(),
    }
}

fn format_error(path: &str, message: String) -> StoreError {
    StoreError::Format {
        path: path.to_string(),
        message,
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::ContainerIo {
        path: path.to_path_buf(),
        source,
    }
}
