// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use nomad_core::define_id;
use serde::{Deserialize, Serialize};
use std::time::Duration;

define_id! {
    /// Identifies one attempt to spawn the code-generation CLI, returned to
    /// callers so they can later `cancel(invocation_id)` it.
    pub struct InvocationId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationResult {
    Success,
    Failed,
    Timeout,
    Cancelled,
}

/// Immutable audit record of one attempt (spec.md §4.5). One
/// `EngineInvocation` is appended per attempt, including retried attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInvocation {
    pub invocation_id: String,
    pub ticket_id: String,
    pub page_id: String,
    pub attempt: u32,
    pub pid: Option<u32>,
    pub result: InvocationResult,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
}
