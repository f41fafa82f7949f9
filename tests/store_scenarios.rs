use synstore::container::Container;
use synstore::format::SchemaVersion;
use synstore::model::{Annotation, AnnotationId, AnnotationKind, Annotations, Position};
use synstore::StoreError;

mod common;

#[test]
fn single_synapse_writes_current_layout() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("single.n5");

    let mut annotations = Annotations::new();
    annotations
        .add(Annotation::synapse(7u64, Position::new(10.0, 20.0, 30.0)))
        .unwrap();
    common::fs_store(&path).write(&annotations).unwrap();

    let c = common::open_ro(&path);
    assert_eq!(c.get_string_attr("/", "file_format").unwrap(), "0.2");
    assert_eq!(
        c.read_f32_md("/annotations/locations").unwrap().as_slice(),
        &[30.0, 20.0, 10.0]
    );
    assert_eq!(c.read_u64_md("/annotations/ids").unwrap().as_slice(), &[7]);
    assert_eq!(
        c.read_string_array("/annotations/types").unwrap(),
        vec!["synapse"]
    );
    assert!(c
        .read_string_array("/annotations/comments/comments")
        .unwrap()
        .is_empty());
    assert!(c
        .read_u64_md("/annotations/comments/target_ids")
        .unwrap()
        .as_slice()
        .is_empty());
    assert_eq!(
        c.read_u64_md("/annotations/presynaptic_site/partners")
            .unwrap()
            .rows(),
        0
    );
}

#[test]
fn paired_sites_follow_insertion_order() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("paired.n5");

    let mut annotations = Annotations::new();
    annotations
        .add(Annotation::presynaptic_site(1u64, Position::new(0.0, 0.0, 0.0)))
        .unwrap();
    annotations
        .add(Annotation::postsynaptic_site(2u64, Position::new(1.0, 1.0, 1.0)))
        .unwrap();
    annotations
        .link_partners(AnnotationId(1), AnnotationId(2))
        .unwrap();
    common::fs_store(&path).write(&annotations).unwrap();

    let c = common::open_ro(&path);
    assert_eq!(
        c.read_string_array("/annotations/types").unwrap(),
        vec!["presynaptic_site", "postsynaptic_site"]
    );
    let partners = c
        .read_u64_md("/annotations/presynaptic_site/partners")
        .unwrap();
    assert_eq!(partners.dims(), &[1, 2]);
    assert_eq!(partners.as_slice(), &[1, 2]);
}

#[test]
fn comments_are_keyed_by_target_id() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("commented.n5");

    let mut annotations = Annotations::new();
    annotations
        .add(Annotation::synapse(5u64, Position::new(0.0, 0.0, 0.0)).with_comment("hello"))
        .unwrap();
    common::fs_store(&path).write(&annotations).unwrap();

    let c = common::open_ro(&path);
    assert_eq!(
        c.read_string_array("/annotations/comments/comments")
            .unwrap(),
        vec!["hello"]
    );
    assert_eq!(
        c.read_u64_md("/annotations/comments/target_ids")
            .unwrap()
            .as_slice(),
        &[5]
    );
}

#[test]
fn legacy_container_is_migrated_on_write() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("legacy.n5");
    {
        let mut c = common::open_rw(&path);
        c.write_f32_matrix("/synapse_locations", &[[3.0, 2.0, 1.0]])
            .unwrap();
        c.write_u64_array("/synapse_ids", &[9]).unwrap();
        c.write_string_array("/synapse_comments", &["x".to_string()])
            .unwrap();
    }

    let store = common::fs_store(&path);
    assert_eq!(store.format_info().unwrap().version, SchemaVersion::V0_0);

    let annotations = store.read().unwrap();
    assert_eq!(annotations.len(), 1);
    let synapse = annotations.get_by_id(AnnotationId(9)).unwrap();
    assert_eq!(synapse.position, Position::new(1.0, 2.0, 3.0));
    assert_eq!(synapse.comment, "x");

    store.write(&annotations).unwrap();

    let c = common::open_ro(&path);
    assert_eq!(c.get_string_attr("/", "file_format").unwrap(), "0.2");
    assert_eq!(
        c.read_f32_md("/annotations/locations").unwrap().as_slice(),
        &[3.0, 2.0, 1.0]
    );
    assert_eq!(c.read_u64_md("/annotations/ids").unwrap().as_slice(), &[9]);
    assert_eq!(
        c.read_string_array("/annotations/comments/comments")
            .unwrap(),
        vec!["x"]
    );
    for tag in ["synapse", "presynaptic_site", "postsynaptic_site"] {
        for suffix in ["locations", "ids", "comments"] {
            let legacy = format!("/{}_{}", tag, suffix);
            assert!(!c.exists(&legacy).unwrap(), "{} should be gone", legacy);
        }
    }
    assert!(!c.exists("/pre_post_partners").unwrap());
}

#[test]
fn legacy_pairs_survive_migration() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("legacy_pairs.n5");
    common::write_legacy_container(&path);

    let store = common::fs_store(&path);
    assert_eq!(store.migrate().unwrap(), SchemaVersion::V0_0);

    let annotations = store.read().unwrap();
    assert_eq!(annotations.len(), 3);
    assert_eq!(
        annotations.partner_of(AnnotationId(1)).map(|a| a.id()),
        Some(AnnotationId(2))
    );
    assert_eq!(
        annotations.partner_of(AnnotationId(2)).map(|a| a.kind()),
        Some(AnnotationKind::PreSynapticSite)
    );
}

#[test]
fn offset_is_applied_on_read_and_removed_on_write() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("offset.n5");
    {
        let mut c = common::open_rw(&path);
        c.set_string_attr("/", "file_format", "0.2").unwrap();
        c.create_group("/annotations").unwrap();
        c.set_f32_array_attr("/annotations", "offset", &[100.0, 200.0, 300.0])
            .unwrap();
        c.write_f32_matrix("/annotations/locations", &[[1.0, 2.0, 3.0]])
            .unwrap();
        c.write_u64_array("/annotations/ids", &[0]).unwrap();
        c.write_string_array("/annotations/types", &["synapse".to_string()])
            .unwrap();
    }

    let store = common::fs_store(&path);
    let annotations = store.read().unwrap();
    assert_eq!(
        annotations.get_by_id(AnnotationId(0)).unwrap().position,
        Position::new(303.0, 202.0, 101.0)
    );

    store.write(&annotations).unwrap();
    let c = common::open_ro(&path);
    assert_eq!(
        c.read_f32_md("/annotations/locations").unwrap().as_slice(),
        &[1.0, 2.0, 3.0]
    );
    assert_eq!(
        c.get_f32_array_attr("/annotations", "offset").unwrap(),
        vec![100.0, 200.0, 300.0]
    );
}

#[test]
fn unknown_kind_fails_the_read() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("mystery.n5");
    {
        let mut c = common::open_rw(&path);
        c.set_string_attr("/", "file_format", "0.2").unwrap();
        c.write_f32_matrix("/annotations/locations", &[[0.0, 0.0, 0.0]])
            .unwrap();
        c.write_u64_array("/annotations/ids", &[1]).unwrap();
        c.write_string_array("/annotations/types", &["mystery".to_string()])
            .unwrap();
    }

    let err = common::fs_store(&path).read().unwrap_err();
    assert!(matches!(err, StoreError::UnknownKind(ref tag) if tag == "mystery"));
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("future.n5");
    {
        let mut c = common::open_rw(&path);
        c.set_string_attr("/", "file_format", "0.3").unwrap();
    }

    let store = common::fs_store(&path);
    assert!(matches!(
        store.read(),
        Err(StoreError::UnsupportedVersion(ref v)) if v == "0.3"
    ));
    assert!(matches!(
        store.write(&common::sample_annotations()),
        Err(StoreError::UnsupportedVersion(_))
    ));
}

#[test]
fn round_trip_preserves_everything() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("roundtrip.n5");
    let store = common::fs_store(&path);

    store.write(&common::sample_annotations()).unwrap();
    let loaded = store.read().unwrap();

    assert_eq!(loaded, common::sample_annotations());
    assert_eq!(
        loaded.get_by_id(AnnotationId(1)).unwrap().comment,
        "pre"
    );
}

#[test]
fn rewriting_is_byte_identical() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("stable.n5");
    let store = common::fs_store(&path);

    store.write(&common::sample_annotations()).unwrap();
    let first = common::snapshot(&path);

    let loaded = store.read().unwrap();
    store.write(&loaded).unwrap();
    let second = common::snapshot(&path);

    assert_eq!(first, second);
}

#[test]
fn missing_datasets_read_as_empty() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("empty.n5");
    {
        let mut c = common::open_rw(&path);
        c.set_string_attr("/", "file_format", "0.2").unwrap();
    }

    assert!(common::fs_store(&path).read().unwrap().is_empty());
}

#[test]
fn reading_a_missing_container_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = common::fs_store(&dir.path().join("absent.n5"))
        .read()
        .unwrap_err();
    assert!(matches!(err, StoreError::ContainerIo { .. }));
}

#[test]
fn read_raises_the_id_floor() {
    use std::sync::Arc;
    use synstore::id_service::{IdService, LocalIdService};

    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("ids.n5");
    common::fs_store(&path)
        .write(&common::sample_annotations())
        .unwrap();

    let ids = Arc::new(LocalIdService::new());
    synstore::AnnotationsStore::new(&path)
        .with_id_service(Arc::clone(&ids) as Arc<dyn IdService>)
        .read()
        .unwrap();

    assert_eq!(ids.next(), 8);
}

#[test]
fn comments_without_targets_are_ignored() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("orphan_comments.n5");
    common::fs_store(&path)
        .write(&common::sample_annotations())
        .unwrap();
    {
        let mut c = common::open_rw(&path);
        c.delete("/annotations/comments/target_ids").unwrap();
    }

    let loaded = common::fs_store(&path).read().unwrap();
    assert_eq!(loaded.len(), 3);
    assert!(loaded.iter().all(|a| a.comment.is_empty()));
}

#[test]
fn malformed_dataset_header_is_an_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("malformed.n5");
    let header = path.join("annotations").join("ids").join("dataset.json");

    for dimensions in ["[4294967296,4294967296,2]", "[4611686018427387904]"] {
        common::fs_store(&path)
            .write(&common::sample_annotations())
            .unwrap();
        std::fs::write(
            &header,
            format!(r#"{{"dataType":"uint64","dimensions":{}}}"#, dimensions),
        )
        .unwrap();

        let err = common::fs_store(&path).read().unwrap_err();
        assert!(
            matches!(
                err,
                StoreError::ShapeMismatch { .. } | StoreError::Format { .. }
            ),
            "unexpected error for {}: {:?}",
            dimensions,
            err
        );
    }
}
