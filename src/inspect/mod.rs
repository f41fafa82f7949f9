//! Annotation statistics.
//!
//! Summarizes a registry by kind, comment and pairing state, and reports the
//! spatial extent of its positions.

mod report;

pub use report::{Bounds, FormatSection, InspectReport, PairingSection, SummarySection};

use crate::format::FormatInfo;
use crate::model::{Annotation, AnnotationVisitor, Annotations};

/// Builds the report for a registry.
pub fn inspect_annotations(annotations: &Annotations) -> InspectReport {
    let mut collector = Collector::default();
    annotations.visit(&mut collector);

    InspectReport {
        format: None,
        summary: collector.summary,
        pairing: collector.pairing,
        bounds: collector.bounds,
        non_finite: collector.non_finite,
    }
}

impl InspectReport {
    /// Attaches the schema details of the container the annotations came from.
    pub fn with_format(mut self, info: &FormatInfo) -> Self {
        self.format = Some(FormatSection {
            file_format: info.version.to_string(),
            offset: info
                .has_offset
                .then(|| [info.offset.x, info.offset.y, info.offset.z]),
        });
        self
    }
}

#[derive(Default)]
struct Collector {
    summary: SummarySection,
    pairing: PairingSection,
    bounds: Option<Bounds>,
    non_finite: usize,
}

impl AnnotationVisitor for Collector {
    fn visit_annotation(&mut self, annotation: &Annotation) {
        self.summary.annotations += 1;
        if annotation.has_comment() {
            self.summary.commented += 1;
        }

        if !annotation.position.is_finite() {
            self.non_finite += 1;
            return;
        }
        let xyz = annotation.position.to_xyz();
        let bounds = self.bounds.get_or_insert(Bounds { min: xyz, max: xyz });
        for axis in 0..3 {
            bounds.min[axis] = bounds.min[axis].min(xyz[axis]);
            bounds.max[axis] = bounds.max[axis].max(xyz[axis]);
        }
    }

    fn visit_synapse(&mut self, _synapse: &Annotation) {
        self.summary.synapses += 1;
    }

    fn visit_presynaptic_site(&mut self, _site: &Annotation, partner: Option<&Annotation>) {
        self.summary.presynaptic_sites += 1;
        // pairs are counted once, from the presynaptic side
        match partner {
            Some(_) => self.pairing.linked_pairs += 1,
            None => self.pairing.unpaired_presynaptic += 1,
        }
    }

    fn visit_postsynaptic_site(&mut self, _site: &Annotation, partner: Option<&Annotation>) {
        self.summary.postsynaptic_sites += 1;
        if partner.is_none() {
            self.pairing.unpaired_postsynaptic += 1;
        }
    }
}
