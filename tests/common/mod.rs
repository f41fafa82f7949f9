#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use synstore::container::{Backend, Container, FsBackend, FsContainer};
use synstore::id_service::{IdService, LocalIdService};
use synstore::model::{Annotation, AnnotationId, Annotations, Position};
use synstore::AnnotationsStore;

/// A store on a directory container with its own id service.
pub fn fs_store(path: &Path) -> AnnotationsStore {
    AnnotationsStore::new(path).with_id_service(Arc::new(LocalIdService::new()) as Arc<dyn IdService>)
}

pub fn open_rw(path: &Path) -> FsContainer {
    FsBackend.open_read_write(path).expect("open container")
}

pub fn open_ro(path: &Path) -> FsContainer {
    FsBackend.open_read(path).expect("open container")
}

/// A synapse, a commented presynaptic site and its postsynaptic partner.
pub fn sample_annotations() -> Annotations {
    let mut annotations = Annotations::new();
    annotations
        .add(Annotation::synapse(7u64, Position::new(10.0, 20.0, 30.0)))
        .expect("add synapse");
    annotations
        .add(Annotation::presynaptic_site(1u64, Position::new(0.0, 0.0, 0.0)).with_comment("pre"))
        .expect("add pre");
    annotations
        .add(Annotation::postsynaptic_site(2u64, Position::new(1.0, 1.0, 1.0)))
        .expect("add post");
    annotations
        .link_partners(AnnotationId(1), AnnotationId(2))
        .expect("link");
    annotations
}

/// Writes a legacy container holding one commented synapse and a linked
/// pre/post pair.
pub fn write_legacy_container(path: &Path) {
    let mut c = open_rw(path);
    c.write_f32_matrix("/synapse_locations", &[[3.0, 2.0, 1.0]])
        .unwrap();
    c.write_u64_array("/synapse_ids", &[9]).unwrap();
    c.write_string_array("/synapse_comments", &["x".to_string()])
        .unwrap();
    c.write_f32_matrix("/presynaptic_site_locations", &[[0.0, 0.0, 0.0]])
        .unwrap();
    c.write_u64_array("/presynaptic_site_ids", &[1]).unwrap();
    c.write_string_array("/presynaptic_site_comments", &[String::new()])
        .unwrap();
    c.write_f32_matrix("/postsynaptic_site_locations", &[[1.0, 1.0, 1.0]])
        .unwrap();
    c.write_u64_array("/postsynaptic_site_ids", &[2]).unwrap();
    c.write_string_array("/postsynaptic_site_comments", &[String::new()])
        .unwrap();
    c.write_u64_matrix("/pre_post_partners", &[[1, 2]]).unwrap();
}

/// Every file below `root`, keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    collect(root, root, &mut files);
    files
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<String, Vec<u8>>) {
    for entry in fs::read_dir(dir).expect("read dir") {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path
                .strip_prefix(root)
                .expect("relative path")
                .to_string_lossy()
                .into_owned();
            files.insert(rel, fs::read(&path).expect("read file"));
        }
    }
}
