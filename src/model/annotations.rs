//! The annotation registry.
//!
//! [`Annotations`] owns every annotation of a store in insertion order and
//! indexes them by id. Partner links between pre- and postsynaptic sites are
//! stored as ids on both sides and only changed through the registry, which
//! keeps them symmetric.

use std::collections::HashMap;

use super::annotation::{Annotation, AnnotationKind};
use super::ids::AnnotationId;
use crate::error::StoreError;

/// Callbacks for a single traversal of an [`Annotations`] registry.
///
/// For each annotation, `visit_annotation` is called first with the common
/// part, then exactly one of the per-kind methods. All methods default to
/// doing nothing.
pub trait AnnotationVisitor {
    fn visit_annotation(&mut self, _annotation: &Annotation) {}

    fn visit_synapse(&mut self, _synapse: &Annotation) {}

    fn visit_presynaptic_site(&mut self, _site: &Annotation, _partner: Option<&Annotation>) {}

    fn visit_postsynaptic_site(&mut self, _site: &Annotation, _partner: Option<&Annotation>) {}
}

/// All annotations of a store, in insertion order, with O(1) lookup by id.
#[derive(Clone, Debug, Default)]
pub struct Annotations {
    items: Vec<Annotation>,
    index: HashMap<AnnotationId, usize>,
}

impl Annotations {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with room for `capacity` annotations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Appends an annotation.
    ///
    /// Partner links are not carried in: an added site starts unpaired and is
    /// paired with [`link_partners`](Self::link_partners).
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateId`] if the id is already present.
    pub fn add(&mut self, mut annotation: Annotation) -> Result<(), StoreError> {
        let id = annotation.id();
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        annotation.partner = None;
        self.index.insert(id, self.items.len());
        self.items.push(annotation);
        Ok(())
    }

    /// Removes an annotation, unlinking its partner first.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let idx = *self.index.get(&id)?;
        self.unlink_partner(id);
        self.index.remove(&id);
        let removed = self.items.remove(idx);
        for ann in &self.items[idx..] {
            if let Some(slot) = self.index.get_mut(&ann.id()) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn get_by_id(&self, id: AnnotationId) -> Option<&Annotation> {
        self.index.get(&id).map(|&idx| &self.items[idx])
    }

    /// Mutable access for editing position and comment.
    pub fn get_by_id_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        match self.index.get(&id) {
            Some(&idx) => Some(&mut self.items[idx]),
            None => None,
        }
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    /// Returns the partner of the annotation with the given id, if linked.
    pub fn partner_of(&self, id: AnnotationId) -> Option<&Annotation> {
        self.get_by_id(id)
            .and_then(|ann| ann.partner())
            .and_then(|partner| self.get_by_id(partner))
    }

    /// Links a presynaptic site with a postsynaptic site.
    ///
    /// Any previous partner of either site is unlinked first.
    ///
    /// # Errors
    /// - [`StoreError::DanglingPartner`] if either id is not in the registry.
    /// - [`StoreError::PartnerKindMismatch`] if `pre` is not a presynaptic
    ///   site or `post` is not a postsynaptic site.
    pub fn link_partners(
        &mut self,
        pre: AnnotationId,
        post: AnnotationId,
    ) -> Result<(), StoreError> {
        let (pre_idx, post_idx) = match (self.index.get(&pre), self.index.get(&post)) {
            (Some(&a), Some(&b)) => (a, b),
            _ => return Err(StoreError::DanglingPartner { pre, post }),
        };

        if self.items[pre_idx].kind() != AnnotationKind::PreSynapticSite
            || self.items[post_idx].kind() != AnnotationKind::PostSynapticSite
        {
            return Err(StoreError::PartnerKindMismatch { pre, post });
        }

        self.unlink_partner(pre);
        self.unlink_partner(post);
        self.items[pre_idx].partner = Some(post);
        self.items[post_idx].partner = Some(pre);
        Ok(())
    }

    /// Clears the partner link of `id` on both sides.
    ///
    /// Returns the former partner's id.
    pub fn unlink_partner(&mut self, id: AnnotationId) -> Option<AnnotationId> {
        let idx = *self.index.get(&id)?;
        let partner = self.items[idx].partner.take()?;
        if let Some(&partner_idx) = self.index.get(&partner) {
            if self.items[partner_idx].partner == Some(id) {
                self.items[partner_idx].partner = None;
            }
        }
        Some(partner)
    }

    /// Walks all annotations in insertion order, dispatching on kind.
    pub fn visit<V: AnnotationVisitor + ?Sized>(&self, visitor: &mut V) {
        for ann in &self.items {
            visitor.visit_annotation(ann);
            match ann.kind() {
                AnnotationKind::Synapse => visitor.visit_synapse(ann),
                AnnotationKind::PreSynapticSite => {
                    let partner = ann.partner().and_then(|p| self.get_by_id(p));
                    visitor.visit_presynaptic_site(ann, partner);
                }
                AnnotationKind::PostSynapticSite => {
                    let partner = ann.partner().and_then(|p| self.get_by_id(p));
                    visitor.visit_postsynaptic_site(ann, partner);
                }
            }
        }
    }
}

impl PartialEq for Annotations {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
