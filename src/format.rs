//! Schema version detection.
//!
//! The root attribute `file_format` names the layout family of a container:
//!
//! | `file_format`      | version          | datasets live    |
//! |--------------------|------------------|------------------|
//! | absent or `0.0`    | [`SchemaVersion::V0_0`] | at the root |
//! | `0.1` up to `0.2`  | [`SchemaVersion::V0_1`] / [`SchemaVersion::V0_2`] | under the group |
//! | anything else      | [`SchemaVersion::Unsupported`] | (not readable) |
//!
//! The annotation group may carry an `offset` attribute in `(z, y, x)`
//! order that shifts every stored location.

use std::fmt;

use crate::container::Container;
use crate::error::StoreError;
use crate::model::Offset;

/// Root attribute holding the schema version.
pub const FILE_FORMAT_ATTR: &str = "file_format";

/// Group attribute holding the location offset, `(z, y, x)`.
pub const OFFSET_ATTR: &str = "offset";

/// The version string the writer emits.
pub const CURRENT_FILE_FORMAT: &str = "0.2";

/// A layout family of the on-disk schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Legacy: per-kind datasets at the root, no version attribute.
    V0_0,
    /// Combined datasets under the annotation group.
    V0_1,
    /// Same layout as `V0_1`; the version written by this crate.
    V0_2,
    /// A `file_format` value this crate cannot read, verbatim.
    Unsupported(String),
}

impl SchemaVersion {
    /// Classifies a `file_format` attribute value.
    pub fn from_attr(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v == 0.0 => SchemaVersion::V0_0,
            Ok(v) if (0.1..0.2).contains(&v) => SchemaVersion::V0_1,
            Ok(v) if v == 0.2 => SchemaVersion::V0_2,
            _ => SchemaVersion::Unsupported(trimmed.to_string()),
        }
    }

    /// Returns true for versions whose datasets live under the group.
    pub fn is_grouped(&self) -> bool {
        matches!(self, SchemaVersion::V0_1 | SchemaVersion::V0_2)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V0_0 => f.write_str("0.0"),
            SchemaVersion::V0_1 => f.write_str("0.1"),
            SchemaVersion::V0_2 => f.write_str("0.2"),
            SchemaVersion::Unsupported(raw) => write!(f, "{} (unsupported)", raw),
        }
    }
}

/// What [`detect_format`] found in a container.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatInfo {
    pub version: SchemaVersion,
    /// Location offset, zero when the group has no `offset` attribute.
    pub offset: Offset,
    /// Whether the group carries an `offset` attribute.
    pub has_offset: bool,
}

/// Reads the schema version and the group offset of a container.
///
/// # Errors
/// Returns an error if the attributes exist but cannot be read, or if the
/// offset attribute does not have exactly three components.
pub fn detect_format<C: Container + ?Sized>(
    container: &C,
    group: &str,
) -> Result<FormatInfo, StoreError> {
    let version = if container.has_attr("/", FILE_FORMAT_ATTR)? {
        SchemaVersion::from_attr(&container.get_string_attr("/", FILE_FORMAT_ATTR)?)
    } else {
        SchemaVersion::V0_0
    };

    let (offset, has_offset) = if container.has_attr(group, OFFSET_ATTR)? {
        let zyx = container.get_f32_array_attr(group, OFFSET_ATTR)?;
        match <[f32; 3]>::try_from(zyx.as_slice()) {
            Ok(zyx) => (Offset::from_zyx(zyx), true),
            Err(_) => {
                return Err(StoreError::Format {
                    path: group.to_string(),
                    message: format!(
                        "attribute '{}' must have 3 components, found {}",
                        OFFSET_ATTR,
                        zyx.len()
                    ),
                })
            }
        }
    } else {
        (Offset::ZERO, false)
    };

    tracing::debug!(
        "detected file format {} (offset {:?}) in group {}",
        version,
        offset,
        group
    );

    Ok(FormatInfo {
        version,
        offset,
        has_offset,
    })
}
