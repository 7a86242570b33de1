// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! MD5 checksums over source files (spec.md §4.3 `detect_changes`). MD5 is
//! used here, not as a security primitive, because it is what the original
//! decomposer pipeline standardized on for cheap change detection.

use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Compute an MD5 hex digest for a single file's contents.
pub fn checksum_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Md5::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Walk `root` recursively and checksum every file whose extension matches
/// `extension` (without the leading dot, e.g. `"py"`). Returns a map keyed
/// by path relative to `root`.
pub fn checksum_tree(root: &Path, extension: &str) -> std::io::Result<BTreeMap<PathBuf, String>> {
    let mut out = BTreeMap::new();
    walk(root, root, extension, &mut out)?;
    Ok(out)
}

fn walk(root: &Path, dir: &Path, extension: &str, out: &mut BTreeMap<PathBuf, String>) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, extension, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            out.insert(relative, checksum_file(&path)?);
        }
    }
    Ok(())
}
