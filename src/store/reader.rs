//! Version-dispatching loader.
//!
//! `V0_0` files keep one set of datasets per annotation kind at the root
//! (`synapse_locations`, `synapse_ids`, `synapse_comments`, ...) plus a root
//! `pre_post_partners` matrix. `V0_1`/`V0_2` files keep a single combined set
//! under the annotation group, with a per-row `types` dataset and comments
//! keyed by target id.
//!
//! A missing primary dataset (locations, ids, types) skips that batch; a
//! missing comments or partners dataset is ignored. Every other failure
//! aborts the read.

use std::collections::HashMap;

use crate::container::{join_path, Container, MdArray};
use crate::error::StoreError;
use crate::format::{FormatInfo, SchemaVersion};
use crate::id_service::IdService;
use crate::model::{load_position, Annotation, AnnotationId, AnnotationKind, Annotations, Offset};

const LEGACY_PARTNERS: &str = "pre_post_partners";
const PARTNERS: &str = "presynaptic_site/partners";

/// Loads all annotations of a container whose format has been detected.
pub(crate) fn read_annotations<C: Container + ?Sized>(
    container: &C,
    group: &str,
    info: &FormatInfo,
    ids: &dyn IdService,
) -> Result<Annotations, StoreError> {
    let mut reader = Reader {
        container,
        offset: info.offset,
        ids,
        annotations: Annotations::new(),
    };

    match &info.version {
        SchemaVersion::V0_0 => {
            for kind in AnnotationKind::ALL {
                reader.read_legacy_kind(kind)?;
            }
            reader.read_partners(&join_path("/", LEGACY_PARTNERS))?;
        }
        SchemaVersion::V0_1 | SchemaVersion::V0_2 => {
            reader.read_grouped(group)?;
            reader.read_partners(&join_path(group, PARTNERS))?;
        }
        SchemaVersion::Unsupported(raw) => {
            return Err(StoreError::UnsupportedVersion(raw.clone()));
        }
    }

    Ok(reader.annotations)
}

/// Dataset paths of the legacy per-kind layout.
pub(crate) fn legacy_dataset_paths(kind: AnnotationKind) -> [String; 3] {
    ["locations", "ids", "comments"]
        .map(|suffix| join_path("/", &format!("{}_{}", kind.as_str(), suffix)))
}

/// Path of the legacy partners matrix.
pub(crate) fn legacy_partners_path() -> String {
    join_path("/", LEGACY_PARTNERS)
}

struct Reader<'a, C: ?Sized> {
    container: &'a C,
    offset: Offset,
    ids: &'a dyn IdService,
    annotations: Annotations,
}

impl<C: Container + ?Sized> Reader<'_, C> {
    fn read_legacy_kind(&mut self, kind: AnnotationKind) -> Result<(), StoreError> {
        let [locations_path, ids_path, comments_path] = legacy_dataset_paths(kind);

        let Some((locations, ids)) = self.read_primary(&locations_path, &ids_path)? else {
            tracing::info!("container does not contain (valid) annotations for {}", kind);
            return Ok(());
        };

        // comments are row-aligned with ids
        let comments = match optional(self.container.read_string_array(&comments_path))? {
            Some(list) => {
                if list.len() != ids.len() {
                    return Err(StoreError::ShapeMismatch {
                        path: comments_path,
                        expected: format!("[{}]", ids.len()),
                        found: vec![list.len()],
                    });
                }
                ids.iter().copied().zip(list).collect()
            }
            None => {
                tracing::info!("container does not contain comments for {}", kind);
                HashMap::new()
            }
        };

        let kinds = vec![kind; ids.len()];
        self.add_batch(&locations, &ids, &kinds, comments)
    }

    fn read_grouped(&mut self, group: &str) -> Result<(), StoreError> {
        let locations_path = join_path(group, "locations");
        let ids_path = join_path(group, "ids");
        let types_path = join_path(group, "types");

        let primary = match self.read_primary(&locations_path, &ids_path)? {
            Some(primary) => optional(self.container.read_string_array(&types_path))?
                .map(|types| (primary, types)),
            None => None,
        };
        let Some(((locations, ids), types)) = primary else {
            tracing::info!("container does not contain (valid) annotations");
            return Ok(());
        };

        if types.len() != ids.len() {
            return Err(StoreError::ShapeMismatch {
                path: types_path,
                expected: format!("[{}]", ids.len()),
                found: vec![types.len()],
            });
        }
        let kinds = types
            .iter()
            .map(|tag| tag.parse::<AnnotationKind>())
            .collect::<Result<Vec<_>, _>>()?;

        let comments = self.read_comment_targets(group)?;
        self.add_batch(&locations, &ids, &kinds, comments)
    }

    /// Reads `comments/comments` keyed by `comments/target_ids`.
    fn read_comment_targets(&self, group: &str) -> Result<HashMap<u64, String>, StoreError> {
        let comments_path = join_path(group, "comments/comments");
        let targets_path = join_path(group, "comments/target_ids");

        let Some(comments) = optional(self.container.read_string_array(&comments_path))? else {
            tracing::info!("container does not contain comments");
            return Ok(HashMap::new());
        };
        let Some(targets) = optional(self.container.read_u64_md(&targets_path))? else {
            tracing::info!("container has comments but no comment targets");
            return Ok(HashMap::new());
        };

        let targets = check_ids(&targets_path, targets)?;
        if targets.len() != comments.len() {
            return Err(StoreError::ShapeMismatch {
                path: targets_path,
                expected: format!("[{}]", comments.len()),
                found: vec![targets.len()],
            });
        }
        Ok(targets.into_iter().zip(comments).collect())
    }

    /// Reads and shape-checks a locations/ids pair; `None` if either is missing.
    fn read_primary(
        &self,
        locations_path: &str,
        ids_path: &str,
    ) -> Result<Option<(MdArray<f32>, Vec<u64>)>, StoreError> {
        let Some(locations) = optional(self.container.read_f32_md(locations_path))? else {
            return Ok(None);
        };
        let Some(ids) = optional(self.container.read_u64_md(ids_path))? else {
            return Ok(None);
        };

        check_matrix(locations_path, &locations, 3)?;
        let ids = check_ids(ids_path, ids)?;
        if ids.len() != locations.rows() {
            return Err(StoreError::ShapeMismatch {
                path: ids_path.to_string(),
                expected: format!("[{}]", locations.rows()),
                found: vec![ids.len()],
            });
        }
        Ok(Some((locations, ids)))
    }

    fn add_batch(
        &mut self,
        locations: &MdArray<f32>,
        ids: &[u64],
        kinds: &[AnnotationKind],
        mut comments: HashMap<u64, String>,
    ) -> Result<(), StoreError> {
        for (i, (&id, &kind)) in ids.iter().zip(kinds).enumerate() {
            let row = locations.row(i);
            let position = load_position([row[0], row[1], row[2]], &self.offset);
            let comment = comments.remove(&id).unwrap_or_default();

            self.ids.invalidate(id);
            self.annotations
                .add(Annotation::new(id, kind, position).with_comment(comment))?;
        }
        tracing::debug!("read {} annotations", ids.len());
        Ok(())
    }

    fn read_partners(&mut self, path: &str) -> Result<(), StoreError> {
        let Some(partners) = optional(self.container.read_u64_md(path))? else {
            tracing::debug!("container does not contain partners at {}", path);
            return Ok(());
        };
        check_matrix(path, &partners, 2)?;

        for i in 0..partners.rows() {
            let row = partners.row(i);
            self.annotations
                .link_partners(AnnotationId(row[0]), AnnotationId(row[1]))?;
        }
        tracing::debug!("linked {} partner pairs", partners.rows());
        Ok(())
    }
}

/// Maps a missing dataset to `None`, keeping every other error.
fn optional<T>(result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::DatasetMissing(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Requires `[N][inner]`. An empty dataset of any shape counts as zero rows.
fn check_matrix<T>(path: &str, array: &MdArray<T>, inner: usize) -> Result<(), StoreError> {
    if array.as_slice().is_empty() && array.rows() == 0 {
        return Ok(());
    }
    if array.rank() != 2 || array.dims()[1] != inner {
        return Err(StoreError::ShapeMismatch {
            path: path.to_string(),
            expected: format!("[N][{}]", inner),
            found: array.dims().to_vec(),
        });
    }
    Ok(())
}

/// Requires `[N]` or `[N][1]`.
fn check_ids(path: &str, array: MdArray<u64>) -> Result<Vec<u64>, StoreError> {
    if array.rank() == 0 || array.rank() > 2 || array.row_len() != 1 {
        return Err(StoreError::ShapeMismatch {
            path: path.to_string(),
            expected: "[N]".to_string(),
            found: array.dims().to_vec(),
        });
    }
    Ok(array.into_vec())
}
