#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use nvtrees::TreePair;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("NVTREES_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set NVTREES_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path, expected, actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n").trim_end().to_string()
}

pub fn pair(text: &str) -> TreePair {
    text.parse()
        .unwrap_or_else(|err| panic!("bad fixture {:?}: {}", text, err))
}

pub fn seeded_pair(seed: u64, leaves: usize, colors: usize) -> TreePair {
    let mut rng = StdRng::seed_from_u64(seed);
    TreePair::random_with(leaves, colors, &mut rng).expect("random pair")
}

pub fn canon(pair: &TreePair) -> String {
    pair.canonical_string().expect("reduction succeeds")
}
