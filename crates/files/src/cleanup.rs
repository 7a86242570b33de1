// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! `cleanup_backups(max_age_days)` (spec.md §4.3).

use nomad_core::Clock;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Remove every `*.bak` file under `backups_dir` whose modification time is
/// older than `max_age_days`. Returns the number of files removed. A file
/// whose mtime can't be read is skipped and logged, not fatal.
pub fn cleanup_backups(backups_dir: &Path, max_age_days: u64, clock: &Arc<dyn Clock>) -> usize {
    if !backups_dir.exists() {
        return 0;
    }
    let threshold = clock.now_utc() - chrono::Duration::days(max_age_days as i64);
    let mut removed = 0;
    let entries = match std::fs::read_dir(backups_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(?backups_dir, error = %e, "cleanup_backups: could not read directory");
            return 0;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("bak") {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(e) => {
                warn!(?path, error = %e, "cleanup_backups: could not read mtime, skipping");
                continue;
            }
        };
        let age: chrono::DateTime<chrono::Utc> = modified.into();
        if age < threshold {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(?path, error = %e, "cleanup_backups: failed to remove stale backup");
            } else {
                removed += 1;
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use nomad_core::SystemClock;

    #[test]
    fn removes_only_stale_bak_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fresh = dir.path().join("fresh.bak");
        let stale = dir.path().join("stale.bak");
        let not_bak = dir.path().join("keepme.json");
        std::fs::write(&fresh, b"x").expect("write");
        std::fs::write(&stale, b"x").expect("write");
        std::fs::write(&not_bak, b"x").expect("write");

        let old_time = FileTime::from_unix_time(0, 0);
        filetime::set_file_mtime(&stale, old_time).expect("set mtime");

        let removed = cleanup_backups(dir.path(), 30, &(Arc::new(SystemClock) as Arc<dyn Clock>));
        assert_eq!(removed, 1);
        assert!(fresh.exists());
        assert!(!stale.exists());
        assert!(not_bak.exists());
    }

    #[test]
    fn missing_directory_is_a_noop() {
        let removed = cleanup_backups(Path::new("/nonexistent/backups"), 30, &(Arc::new(SystemClock) as Arc<dyn Clock>));
        assert_eq!(removed, 0);
    }
}
