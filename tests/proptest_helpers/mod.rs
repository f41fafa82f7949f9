#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use synstore::model::{Annotation, AnnotationId, AnnotationKind, Annotations, Position};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

fn arb_kind() -> impl Strategy<Value = AnnotationKind> {
    prop_oneof![
        Just(AnnotationKind::Synapse),
        Just(AnnotationKind::PreSynapticSite),
        Just(AnnotationKind::PostSynapticSite),
    ]
}

/// Integral coordinates keep offset arithmetic exact in `f32`.
fn arb_coord() -> impl Strategy<Value = f32> {
    (-100_000i32..100_000).prop_map(|v| v as f32)
}

pub fn arb_position() -> impl Strategy<Value = Position> {
    (arb_coord(), arb_coord(), arb_coord()).prop_map(|(x, y, z)| Position::new(x, y, z))
}

fn arb_comment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just(String::new()),
        1 => "[a-zA-Z0-9 _.,!?éü-]{1,24}",
    ]
}

/// A registry of up to `max_annotations` annotations with unique ids, with
/// some pre/post sites linked in pairs.
pub fn arb_annotations(max_annotations: usize) -> BoxedStrategy<Annotations> {
    let records = prop::collection::vec(
        (0u64..1_000_000, arb_kind(), arb_position(), arb_comment()),
        0..=max_annotations,
    );

    (records, any::<u64>())
        .prop_map(|(records, pairing_seed)| {
            let mut annotations = Annotations::new();
            let mut seen = BTreeSet::new();
            for (id, kind, position, comment) in records {
                if !seen.insert(id) {
                    continue;
                }
                annotations
                    .add(Annotation::new(id, kind, position).with_comment(comment))
                    .expect("unique ids");
            }

            let pre: Vec<AnnotationId> = ids_of(&annotations, AnnotationKind::PreSynapticSite);
            let post: Vec<AnnotationId> = ids_of(&annotations, AnnotationKind::PostSynapticSite);
            for (i, (p, q)) in pre.iter().zip(post.iter()).enumerate() {
                if (pairing_seed >> (i % 64)) & 1 == 1 {
                    annotations.link_partners(*p, *q).expect("valid pair");
                }
            }
            annotations
        })
        .boxed()
}

fn ids_of(annotations: &Annotations, kind: AnnotationKind) -> Vec<AnnotationId> {
    annotations
        .iter()
        .filter(|a| a.kind() == kind)
        .map(|a| a.id())
        .collect()
}
