//! Writes the current layout.
//!
//! The writer always emits `file_format = "0.2"` with every dataset under
//! the annotation group:
//!
//! ```text
//! /                                    file_format
//! <group>/                             offset (kept if present)
//! <group>/locations                    float32 [N][3]  (z, y, x)
//! <group>/ids                          uint64  [N]
//! <group>/types                        string  [N]
//! <group>/comments/comments            string  [M]
//! <group>/comments/target_ids          uint64  [M]
//! <group>/presynaptic_site/partners    uint64  [P][2]  (pre, post)
//! ```
//!
//! Annotations are flattened in two traversals: one to count, one to fill
//! buffers allocated at their final size.

use crate::container::{join_path, Container};
use crate::error::StoreError;
use crate::format::{FormatInfo, SchemaVersion, CURRENT_FILE_FORMAT, FILE_FORMAT_ATTR, OFFSET_ATTR};
use crate::model::{store_position, Annotation, AnnotationKind, AnnotationVisitor, Annotations, Offset};

use super::reader::{legacy_dataset_paths, legacy_partners_path};

#[derive(Debug, Default)]
struct Counter {
    annotations: usize,
    comments: usize,
    partners: usize,
}

impl AnnotationVisitor for Counter {
    fn visit_annotation(&mut self, annotation: &Annotation) {
        self.annotations += 1;
        if annotation.has_comment() {
            self.comments += 1;
        }
    }

    fn visit_presynaptic_site(&mut self, _site: &Annotation, partner: Option<&Annotation>) {
        if partner.is_some() {
            self.partners += 1;
        }
    }
}

struct Packer {
    offset: Offset,
    locations: Vec<[f32; 3]>,
    ids: Vec<u64>,
    types: Vec<String>,
    comments: Vec<String>,
    comment_targets: Vec<u64>,
    partners: Vec<[u64; 2]>,
}

impl Packer {
    fn new(offset: Offset, counts: &Counter) -> Self {
        Self {
            offset,
            locations: Vec::with_capacity(counts.annotations),
            ids: Vec::with_capacity(counts.annotations),
            types: Vec::with_capacity(counts.annotations),
            comments: Vec::with_capacity(counts.comments),
            comment_targets: Vec::with_capacity(counts.comments),
            partners: Vec::with_capacity(counts.partners),
        }
    }
}

impl AnnotationVisitor for Packer {
    fn visit_annotation(&mut self, annotation: &Annotation) {
        let id = annotation.id().as_u64();
        self.locations
            .push(store_position(&annotation.position, &self.offset));
        self.ids.push(id);
        if annotation.has_comment() {
            self.comments.push(annotation.comment.clone());
            self.comment_targets.push(id);
        }
    }

    fn visit_synapse(&mut self, _synapse: &Annotation) {
        self.types.push(AnnotationKind::Synapse.as_str().to_string());
    }

    fn visit_presynaptic_site(&mut self, site: &Annotation, partner: Option<&Annotation>) {
        self.types
            .push(AnnotationKind::PreSynapticSite.as_str().to_string());
        if let Some(partner) = partner {
            self.partners
                .push([site.id().as_u64(), partner.id().as_u64()]);
        }
    }

    fn visit_postsynaptic_site(&mut self, _site: &Annotation, _partner: Option<&Annotation>) {
        self.types
            .push(AnnotationKind::PostSynapticSite.as_str().to_string());
    }
}

/// Replaces the annotation datasets of `container` with `annotations`.
///
/// `info` describes the container as found before writing: its offset is
/// subtracted from every location, and a legacy source has its root
/// datasets removed once the new ones are in place.
pub(crate) fn write_annotations<C: Container + ?Sized>(
    container: &mut C,
    group: &str,
    info: &FormatInfo,
    annotations: &Annotations,
) -> Result<(), StoreError> {
    let mut counter = Counter::default();
    annotations.visit(&mut counter);

    let mut packer = Packer::new(info.offset, &counter);
    annotations.visit(&mut packer);

    container.create_group(group)?;
    container.create_group(&join_path(group, "comments"))?;
    container.create_group(&join_path(group, "presynaptic_site"))?;

    container.set_string_attr("/", FILE_FORMAT_ATTR, CURRENT_FILE_FORMAT)?;
    if container.has_attr(group, OFFSET_ATTR)? {
        container.set_f32_array_attr(group, OFFSET_ATTR, &info.offset.to_zyx())?;
    }

    container.write_f32_matrix(&join_path(group, "locations"), &packer.locations)?;
    container.write_u64_array(&join_path(group, "ids"), &packer.ids)?;
    container.write_string_array(&join_path(group, "types"), &packer.types)?;
    container.write_string_array(&join_path(group, "comments/comments"), &packer.comments)?;
    container.write_u64_array(
        &join_path(group, "comments/target_ids"),
        &packer.comment_targets,
    )?;
    container.write_u64_matrix(
        &join_path(group, "presynaptic_site/partners"),
        &packer.partners,
    )?;

    tracing::debug!(
        "wrote {} annotations ({} comments, {} partner pairs) to {}",
        counter.annotations,
        counter.comments,
        counter.partners,
        group
    );

    if info.version == SchemaVersion::V0_0 {
        remove_legacy_datasets(container);
    }

    Ok(())
}

/// Best-effort removal of the per-kind root datasets of a legacy file.
fn remove_legacy_datasets<C: Container + ?Sized>(container: &mut C) {
    let paths = AnnotationKind::ALL
        .into_iter()
        .flat_map(legacy_dataset_paths)
        .chain(std::iter::once(legacy_partners_path()));

    for path in paths {
        if let Err(e) = container.delete(&path) {
            tracing::warn!("could not remove legacy dataset {}: {}", path, e);
        }
    }
    tracing::info!("migrated legacy annotations to file format {}", CURRENT_FILE_FORMAT);
}
