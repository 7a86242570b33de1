// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Fields common to every operation record (spec.md §3).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

crate::define_id! {
    /// Identifies one attempt of a `CopyOperation`, `CommitOperation`,
    /// `EngineInvocation`, etc.
    pub struct OperationId;
}

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

impl OperationId {
    /// Generate the next id in-process. Monotonic, not globally unique across
    /// restarts — operation records have process lifetime only (spec.md §3).
    pub fn next(prefix: &str) -> OperationId {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        OperationId::new(format!("{prefix}-{seq}"))
    }
}

/// Generic success/failure outcome shared by operation records that don't
/// need a richer result enum of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOutcome {
    Success,
    Failed,
    Skipped,
}
