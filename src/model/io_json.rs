//! JSON interchange for annotations.
//!
//! A flat, human-readable dump of an [`Annotations`] registry. This is useful
//! for:
//! - Inspecting the contents of a container without container tooling
//! - Moving annotations between containers with different group layouts
//! - Hand-writing small fixtures
//!
//! Positions are written in `(x, y, z)` order with no offset applied, i.e.
//! exactly as they are held in memory. Partner links are read from the
//! presynaptic side; the `partner` field of postsynaptic records is written
//! for readability and ignored on import.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Annotation, AnnotationId, AnnotationKind, Annotations, Position};
use crate::error::StoreError;

// ============================================================================
// JSON Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonDocument {
    annotations: Vec<JsonAnnotation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonAnnotation {
    id: u64,
    kind: String,
    /// `[x, y, z]`
    position: [f32; 3],

    #[serde(default, skip_serializing_if = "String::is_empty")]
    comment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    partner: Option<u64>,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads annotations from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the records
/// violate registry invariants (duplicate ids, bad partner links).
pub fn read_annotations_json(path: &Path) -> Result<Annotations, StoreError> {
    let file = File::open(path).map_err(StoreError::Io)?;
    let reader = BufReader::new(file);

    let doc: JsonDocument =
        serde_json::from_reader(reader).map_err(|source| StoreError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    json_to_annotations(doc)
}

/// Writes annotations to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_annotations_json(path: &Path, annotations: &Annotations) -> Result<(), StoreError> {
    let file = File::create(path).map_err(StoreError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &annotations_to_json(annotations)).map_err(|source| {
        StoreError::JsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads annotations from a JSON string.
pub fn from_json_str(json: &str) -> Result<Annotations, StoreError> {
    let doc: JsonDocument = serde_json::from_str(json)?;
    json_to_annotations(doc)
}

/// Writes annotations to a JSON string.
pub fn to_json_string(annotations: &Annotations) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(&annotations_to_json(
        annotations,
    ))?)
}

// ============================================================================
// Conversion
// ============================================================================

fn json_to_annotations(doc: JsonDocument) -> Result<Annotations, StoreError> {
    let mut annotations = Annotations::with_capacity(doc.annotations.len());
    let mut pairs = Vec::new();

    for record in doc.annotations {
        let kind: AnnotationKind = record.kind.parse()?;
        if kind == AnnotationKind::PreSynapticSite {
            if let Some(partner) = record.partner {
                pairs.push((AnnotationId(record.id), AnnotationId(partner)));
            }
        }
        annotations.add(
            Annotation::new(record.id, kind, Position::from_xyz(record.position))
                .with_comment(record.comment),
        )?;
    }

    for (pre, post) in pairs {
        annotations.link_partners(pre, post)?;
    }

    Ok(annotations)
}

fn annotations_to_json(annotations: &Annotations) -> JsonDocument {
    JsonDocument {
        annotations: annotations
            .iter()
            .map(|ann| JsonAnnotation {
                id: ann.id().as_u64(),
                kind: ann.kind().as_str().to_string(),
                position: ann.position.to_xyz(),
                comment: ann.comment.clone(),
                partner: ann.partner().map(|p| p.as_u64()),
            })
            .collect(),
    }
}
