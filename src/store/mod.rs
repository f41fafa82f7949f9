//! The annotation store: loads and saves an [`Annotations`] registry at a
//! container location.
//!
//! A store holds no open container between calls. Every [`read`] and
//! [`write`] opens a handle through its [`Backend`], detects the schema
//! version of what is there, and drops the handle before returning.
//!
//! Files of every readable version are loaded; writes always produce the
//! current version. Writing a registry back to a legacy file migrates it in
//! place.
//!
//! ```no_run
//! use synstore::model::{Annotation, Annotations, Position};
//! use synstore::AnnotationsStore;
//!
//! # fn main() -> Result<(), synstore::StoreError> {
//! let store = AnnotationsStore::new("sample.n5");
//!
//! let mut annotations = store.read()?;
//! annotations.add(Annotation::synapse(100u64, Position::new(1.0, 2.0, 3.0)))?;
//! store.write(&annotations)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`read`]: AnnotationsStore::read
//! [`write`]: AnnotationsStore::write

mod reader;
mod writer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::container::{normalize_path, Backend, FsBackend};
use crate::error::StoreError;
use crate::format::{detect_format, FormatInfo, SchemaVersion};
use crate::id_service::{self, IdService};
use crate::model::Annotations;

/// Group holding the annotation datasets unless configured otherwise.
pub const DEFAULT_GROUP: &str = "/annotations";

/// Reads and writes annotations at one container location.
pub struct AnnotationsStore<B = FsBackend> {
    backend: B,
    path: PathBuf,
    group: String,
    ids: Arc<dyn IdService>,
}

impl AnnotationsStore<FsBackend> {
    /// A store for the directory container at `path`, using the default
    /// group and the process-wide id service.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_backend(FsBackend, path)
    }
}

impl<B: Backend> AnnotationsStore<B> {
    /// A store for the container at `path` opened through `backend`.
    pub fn with_backend(backend: B, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            group: DEFAULT_GROUP.to_string(),
            ids: id_service::global(),
        }
    }

    /// Sets the group holding the annotation datasets.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets the id service notified of every id read.
    pub fn with_id_service(mut self, ids: Arc<dyn IdService>) -> Self {
        self.ids = ids;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn group_path(&self) -> Result<String, StoreError> {
        normalize_path(&self.group)
    }

    /// Detects the schema version and offset of the container.
    pub fn format_info(&self) -> Result<FormatInfo, StoreError> {
        let group = self.group_path()?;
        let container = self.backend.open_read(&self.path)?;
        detect_format(&container, &group)
    }

    /// Loads every annotation in the container.
    ///
    /// Each id read is reported to the store's id service.
    ///
    /// # Errors
    /// Fails if the container cannot be opened, has an unsupported version,
    /// or holds malformed or inconsistent data. Missing datasets are not an
    /// error; they yield fewer (or no) annotations.
    pub fn read(&self) -> Result<Annotations, StoreError> {
        let group = self.group_path()?;
        let container = self.backend.open_read(&self.path)?;
        let info = detect_format(&container, &group)?;

        let annotations = reader::read_annotations(&container, &group, &info, self.ids.as_ref())?;
        tracing::info!(
            "read {} annotations from {} (file format {})",
            annotations.len(),
            self.path.display(),
            info.version
        );
        Ok(annotations)
    }

    /// Replaces the stored annotations with `annotations`.
    ///
    /// The container is created if missing. An existing group offset is
    /// applied to the written locations and kept; a legacy container is
    /// migrated to the current version.
    ///
    /// # Errors
    /// Fails with [`StoreError::UnsupportedVersion`] if the container holds
    /// a version this crate cannot read, leaving it untouched.
    pub fn write(&self, annotations: &Annotations) -> Result<(), StoreError> {
        let group = self.group_path()?;
        let mut container = self.backend.open_read_write(&self.path)?;
        let info = detect_format(&container, &group)?;
        if let SchemaVersion::Unsupported(raw) = &info.version {
            return Err(StoreError::UnsupportedVersion(raw.clone()));
        }

        writer::write_annotations(&mut container, &group, &info, annotations)?;
        tracing::info!(
            "wrote {} annotations to {}",
            annotations.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Rewrites the container in the current version.
    ///
    /// Returns the version found before the rewrite.
    pub fn migrate(&self) -> Result<SchemaVersion, StoreError> {
        let source = self.format_info()?.version;
        let annotations = self.read()?;
        self.write(&annotations)?;
        Ok(source)
    }
}
