// Test entry point for synchronization tests
// Shared tree helpers live here, scenarios in the submodules

mod driver_tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mirrorsync::sync::SyncEvent;

/// Relative path -> file bytes, `None` for directories
pub type Snapshot = BTreeMap<PathBuf, Option<Vec<u8>>>;

/// Recursively record every entry under `root`.
pub fn snapshot(root: &Path) -> Snapshot {
    let mut out = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            if path.is_dir() {
                out.insert(relative, None);
                pending.push(path);
            } else {
                out.insert(relative, Some(fs::read(&path).unwrap()));
            }
        }
    }

    out
}

/// Create `relative` (and its parents) under `root` with `content`.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Only the events that changed the replica.
pub fn mutations(events: &[SyncEvent]) -> Vec<SyncEvent> {
    events.iter().filter(|e| e.is_mutation()).cloned().collect()
}
