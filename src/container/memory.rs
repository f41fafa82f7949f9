//! In-memory container backend.
//!
//! [`MemoryBackend`] keeps a tree per container location behind a shared
//! lock. Handles opened from the same backend (or a clone of it) see each
//! other's writes, so a test can write through one store and read through
//! another exactly as it would with files on disk.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{
    check_element_count, path_components, read_only_error, AttrValue, Backend, Container,
    DatasetValues,
};
use crate::error::StoreError;

#[derive(Clone, Debug)]
enum Node {
    Group {
        attrs: BTreeMap<String, AttrValue>,
        children: BTreeMap<String, Node>,
    },
    Dataset {
        dims: Vec<usize>,
        values: DatasetValues,
    },
}

impl Node {
    fn group() -> Self {
        Node::Group {
            attrs: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }
}

type Files = HashMap<PathBuf, Node>;

/// Opens [`MemoryContainer`]s held in process memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    files: Arc<Mutex<Files>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a container exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        lock(&self.files).contains_key(path)
    }
}

impl Backend for MemoryBackend {
    type Handle = MemoryContainer;

    fn open_read(&self, path: &Path) -> Result<MemoryContainer, StoreError> {
        if !self.contains(path) {
            return Err(StoreError::ContainerIo {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such container"),
            });
        }
        Ok(MemoryContainer {
            files: Arc::clone(&self.files),
            key: path.to_path_buf(),
            writable: false,
        })
    }

    fn open_read_write(&self, path: &Path) -> Result<MemoryContainer, StoreError> {
        lock(&self.files)
            .entry(path.to_path_buf())
            .or_insert_with(Node::group);
        Ok(MemoryContainer {
            files: Arc::clone(&self.files),
            key: path.to_path_buf(),
            writable: true,
        })
    }
}

/// An open in-memory container.
#[derive(Debug)]
pub struct MemoryContainer {
    files: Arc<Mutex<Files>>,
    key: PathBuf,
    writable: bool,
}

impl MemoryContainer {
    fn with_root<T>(&self, f: impl FnOnce(&Node) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let files = lock(&self.files);
        match files.get(&self.key) {
            Some(root) => f(root),
            None => Err(vanished(&self.key)),
        }
    }

    fn with_root_mut<T>(
        &mut self,
        path: &str,
        f: impl FnOnce(&mut Node) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if !self.writable {
            return Err(read_only_error(path));
        }
        let mut files = lock(&self.files);
        match files.get_mut(&self.key) {
            Some(root) => f(root),
            None => Err(vanished(&self.key)),
        }
    }
}

impl Container for MemoryContainer {
    fn has_attr(&self, path: &str, name: &str) -> Result<bool, StoreError> {
        let components = path_components(path)?;
        self.with_root(|root| {
            Ok(match find(root, &components) {
                Some(Node::Group { attrs, .. }) => attrs.contains_key(name),
                _ => false,
            })
        })
    }

    fn attr(&self, path: &str, name: &str) -> Result<AttrValue, StoreError> {
        let components = path_components(path)?;
        self.with_root(|root| match find(root, &components) {
            Some(Node::Group { attrs, .. }) => {
                attrs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| StoreError::AttributeMissing {
                        path: path.to_string(),
                        name: name.to_string(),
                    })
            }
            _ => Err(StoreError::AttributeMissing {
                path: path.to_string(),
                name: name.to_string(),
            }),
        })
    }

    fn set_attr(&mut self, path: &str, name: &str, value: AttrValue) -> Result<(), StoreError> {
        let components = path_components(path)?;
        self.with_root_mut(path, |root| match find_mut(root, &components) {
            Some(Node::Group { attrs, .. }) => {
                attrs.insert(name.to_string(), value);
                Ok(())
            }
            _ => Err(StoreError::DatasetMissing(path.to_string())),
        })
    }

    fn read_dataset(&self, path: &str) -> Result<(Vec<usize>, DatasetValues), StoreError> {
        let components = path_components(path)?;
        self.with_root(|root| match find(root, &components) {
            Some(Node::Dataset { dims, values }) => Ok((dims.clone(), values.clone())),
            _ => Err(StoreError::DatasetMissing(path.to_string())),
        })
    }

    fn write_dataset(
        &mut self,
        path: &str,
        dims: Vec<usize>,
        values: DatasetValues,
    ) -> Result<(), StoreError> {
        let components = path_components(path)?;
        let (name, parents) = components
            .split_last()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        let dims = check_element_count(path, dims, values.len())?;

        self.with_root_mut(path, |root| {
            let children = ensure_group(root, parents, path)?;
            if let Some(Node::Group { .. }) = children.get(*name) {
                return Err(StoreError::Format {
                    path: path.to_string(),
                    message: "a group exists at this path".to_string(),
                });
            }
            children.insert(name.to_string(), Node::Dataset { dims, values });
            Ok(())
        })
    }

    fn create_group(&mut self, path: &str) -> Result<(), StoreError> {
        let components = path_components(path)?;
        self.with_root_mut(path, |root| ensure_group(root, &components, path).map(|_| ()))
    }

    fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        let components = path_components(path)?;
        let (name, parents) = components
            .split_last()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
        self.with_root_mut(path, |root| {
            if let Some(Node::Group { children, .. }) = find_mut(root, parents) {
                children.remove(*name);
            }
            Ok(())
        })
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let components = path_components(path)?;
        self.with_root(|root| Ok(find(root, &components).is_some()))
    }
}

fn lock(files: &Mutex<Files>) -> MutexGuard<'_, Files> {
    files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn find<'a>(mut node: &'a Node, components: &[&str]) -> Option<&'a Node> {
    for component in components {
        node = match node {
            Node::Group { children, .. } => children.get(*component)?,
            Node::Dataset { .. } => return None,
        };
    }
    Some(node)
}

fn find_mut<'a>(mut node: &'a mut Node, components: &[&str]) -> Option<&'a mut Node> {
    for component in components {
        node = match node {
            Node::Group { children, .. } => children.get_mut(*component)?,
            Node::Dataset { .. } => return None,
        };
    }
    Some(node)
}

/// Walks to the group at `components`, creating missing groups, and returns
/// its children.
fn ensure_group<'a>(
    mut node: &'a mut Node,
    components: &[&str],
    path: &str,
) -> Result<&'a mut BTreeMap<String, Node>, StoreError> {
    for component in components {
        node = match node {
            Node::Group { children, .. } => children
                .entry(component.to_string())
                .or_insert_with(Node::group),
            Node::Dataset { .. } => return Err(dataset_in_the_way(path)),
        };
    }
    match node {
        Node::Group { children, .. } => Ok(children),
        Node::Dataset { .. } => Err(dataset_in_the_way(path)),
    }
}

fn dataset_in_the_way(path: &str) -> StoreError {
    StoreError::Format {
        path: path.to_string(),
        message: "a dataset exists where a group is expected".to_string(),
    }
}

fn vanished(key: &Path) -> StoreError {
    StoreError::ContainerIo {
        path: key.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "container was removed"),
    }
}
