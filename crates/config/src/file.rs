// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Optional `nomad.toml` for non-secret defaults (spec.md "AMBIENT STACK" §10.3).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileDefaults {
    pub poll_interval_secs: u64,
    pub cooldown_secs: u64,
    pub cooldown_prune_after_secs: u64,
    pub engine_timeout_minutes: u64,
    pub board_http_timeout_secs: u64,
    pub git_timeout_secs: u64,
    pub max_retries: u32,
    pub engine_max_retries: u32,
    pub max_history: usize,
}

impl Default for FileDefaults {
    fn default() -> Self {
        FileDefaults {
            poll_interval_secs: 60,
            cooldown_secs: 120,
            cooldown_prune_after_secs: 3600,
            engine_timeout_minutes: 30,
            board_http_timeout_secs: 60,
            git_timeout_secs: 30,
            max_retries: 3,
            engine_max_retries: 2,
            max_history: 100,
        }
    }
}

impl FileDefaults {
    pub fn load(path: &Path) -> Result<FileDefaults, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseFile {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_spec_constants() {
        let d = FileDefaults::default();
        assert_eq!(d.poll_interval_secs, 60);
        assert_eq!(d.cooldown_secs, 120);
        assert_eq!(d.engine_timeout_minutes, 30);
        assert_eq!(d.max_retries, 3);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut custom = FileDefaults::default();
        custom.poll_interval_secs = 30;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nomad.toml");
        std::fs::File::create(&path)
            .expect("create")
            .write_all(custom.to_toml_string().as_bytes())
            .expect("write");
        let loaded = FileDefaults::load(&path).expect("load");
        assert_eq!(loaded, custom);
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let result = FileDefaults::load(Path::new("/nonexistent/nomad.toml"));
        assert!(result.is_err());
    }
}
