// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! `detect_changes(root, before_checksums, after_checksums)` (spec.md §4.3).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Compare two checksum snapshots (as produced by `checksum_tree`) and
/// report per-path `Created`/`Modified`/`Deleted` entries, sorted by path.
pub fn detect_changes(before: &BTreeMap<PathBuf, String>, after: &BTreeMap<PathBuf, String>) -> Vec<FileChange> {
    let mut changes = Vec::new();
    for (path, after_sum) in after {
        match before.get(path) {
            None => changes.push(FileChange { path: path.clone(), kind: ChangeKind::Created }),
            Some(before_sum) if before_sum != after_sum => {
                changes.push(FileChange { path: path.clone(), kind: ChangeKind::Modified })
            }
            Some(_) => {}
        }
    }
    for path in before.keys() {
        if !after.contains_key(path) {
            changes.push(FileChange { path: path.clone(), kind: ChangeKind::Deleted });
        }
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<PathBuf, String> {
        pairs.iter().map(|(p, s)| (PathBuf::from(p), s.to_string())).collect()
    }

    #[test]
    fn detects_created_modified_and_deleted() {
        let before = map(&[("a.py", "hash_a"), ("b.py", "hash_b"), ("c.py", "hash_c")]);
        let after = map(&[("a.py", "hash_a"), ("b.py", "hash_b_changed"), ("d.py", "hash_d")]);

        let changes = detect_changes(&before, &after);
        assert_eq!(changes.len(), 3);
        assert!(changes.contains(&FileChange { path: "b.py".into(), kind: ChangeKind::Modified }));
        assert!(changes.contains(&FileChange { path: "c.py".into(), kind: ChangeKind::Deleted }));
        assert!(changes.contains(&FileChange { path: "d.py".into(), kind: ChangeKind::Created }));
    }

    #[test]
    fn identical_snapshots_yield_no_changes() {
        let snap = map(&[("a.py", "h1")]);
        assert!(detect_changes(&snap, &snap).is_empty());
    }

    #[test]
    fn empty_before_marks_everything_created() {
        let before = BTreeMap::new();
        let after = map(&[("a.py", "h1"), ("b.py", "h2")]);
        let changes = detect_changes(&before, &after);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Created));
    }
}
