//! In-memory annotation model.
//!
//! This module defines the typed representation that every store reads into
//! and writes from: annotations with an id, a position and a comment, tagged
//! with one of three kinds, owned by an [`Annotations`] registry.
//!
//! # Design Principles
//!
//! 1. **One axis order**: positions are always `(x, y, z)` in memory. The
//!    `(z, y, x)` on-disk order is confined to [`coord`].
//!
//! 2. **Ids as weak references**: a partner link is the partner's
//!    [`AnnotationId`], resolved through the registry. There are no owning
//!    cycles.
//!
//! 3. **Symmetric pairs**: partner links can only be changed through the
//!    registry, which updates both sides at once.
//!
//! # Example
//!
//! ```
//! use synstore::model::{Annotation, AnnotationId, Annotations, Position};
//!
//! let mut annotations = Annotations::new();
//! annotations.add(Annotation::presynaptic_site(1u64, Position::new(0.0, 0.0, 0.0)))?;
//! annotations.add(Annotation::postsynaptic_site(2u64, Position::new(1.0, 1.0, 1.0)))?;
//! annotations.link_partners(AnnotationId(1), AnnotationId(2))?;
//!
//! assert_eq!(annotations.partner_of(AnnotationId(2)).map(|a| a.id()), Some(AnnotationId(1)));
//! # Ok::<(), synstore::StoreError>(())
//! ```

mod annotation;
mod annotations;
pub mod coord;
mod ids;
pub mod io_json;

// Re-export core types for convenient access
pub use annotation::{Annotation, AnnotationKind};
pub use annotations::{AnnotationVisitor, Annotations};
pub use coord::{load_position, store_position, Offset, Position};
pub use ids::AnnotationId;
