//! A single annotation and its kind.

use std::fmt;
use std::str::FromStr;

use super::coord::Position;
use super::ids::AnnotationId;
use crate::error::StoreError;

/// The kind of an annotation.
///
/// The string forms are the tags stored in the `types` dataset and used as
/// dataset name prefixes in legacy files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnnotationKind {
    Synapse,
    PreSynapticSite,
    PostSynapticSite,
}

impl AnnotationKind {
    /// All kinds, in the order legacy files are read.
    pub const ALL: [AnnotationKind; 3] = [
        AnnotationKind::Synapse,
        AnnotationKind::PreSynapticSite,
        AnnotationKind::PostSynapticSite,
    ];

    /// The on-disk tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Synapse => "synapse",
            AnnotationKind::PreSynapticSite => "presynaptic_site",
            AnnotationKind::PostSynapticSite => "postsynaptic_site",
        }
    }
}

impl FromStr for AnnotationKind {
    type Err = StoreError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "synapse" => Ok(AnnotationKind::Synapse),
            "presynaptic_site" => Ok(AnnotationKind::PreSynapticSite),
            "postsynaptic_site" => Ok(AnnotationKind::PostSynapticSite),
            other => Err(StoreError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point annotation: a synapse, or one side of a synaptic pairing.
///
/// `id` and `kind` are fixed at construction. The partner link of pre- and
/// postsynaptic sites is managed by [`Annotations`](super::Annotations) so
/// that both sides always agree.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    kind: AnnotationKind,

    /// Location in world coordinates.
    pub position: Position,

    /// Free-form comment; empty when the annotation has none.
    pub comment: String,

    pub(crate) partner: Option<AnnotationId>,
}

impl Annotation {
    /// Creates an annotation of the given kind with an empty comment.
    pub fn new(id: impl Into<AnnotationId>, kind: AnnotationKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            comment: String::new(),
            partner: None,
        }
    }

    /// Creates a synapse.
    pub fn synapse(id: impl Into<AnnotationId>, position: Position) -> Self {
        Self::new(id, AnnotationKind::Synapse, position)
    }

    /// Creates a presynaptic site without a partner.
    pub fn presynaptic_site(id: impl Into<AnnotationId>, position: Position) -> Self {
        Self::new(id, AnnotationKind::PreSynapticSite, position)
    }

    /// Creates a postsynaptic site without a partner.
    pub fn postsynaptic_site(id: impl Into<AnnotationId>, position: Position) -> Self {
        Self::new(id, AnnotationKind::PostSynapticSite, position)
    }

    /// Sets the comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// The linked partner's id, for pre- and postsynaptic sites.
    pub fn partner(&self) -> Option<AnnotationId> {
        self.partner
    }

    /// Returns true if the comment is non-empty.
    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }
}
