// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The engine invoker itself (spec.md §4.5), grounded on
//! `original_source/clients/claude_engine_invoker.py`'s
//! `ClaudeEngineInvoker._execute_claude_command` (timeout → SIGTERM → wait
//! → SIGKILL) and `invoke_claude_engine` (retry loop), generalized to the
//! CLI argument-variant fallback spec.md §6 adds ("claude
//! [--dangerously-skip-permissions] [--auto-approve] -p <prompt>").

use crate::error::EngineError;
use crate::invocation::{EngineInvocation, InvocationId, InvocationResult};
use crate::process_group::{kill_group, spawn_in_new_group, terminate_group};
use nomad_core::BoundedHistory;
use nomad_retry::{backoff_delay, random_jitter, BackoffConfig};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::time::timeout as tokio_timeout;
use tracing::{info, warn};

/// Kill-switch grace period between SIGTERM and SIGKILL (spec.md §4.5).
const KILL_GRACE: Duration = Duration::from_secs(5);

/// A process that exits nonzero this fast is assumed to have rejected its
/// argument set outright (e.g. unsupported flag) rather than having done
/// real work and failed; the invoker falls back to the next, less
/// permissive variant instead of spending the retry budget on it. Decided
/// here since spec.md leaves "fail to launch" undefined for a CLI that
/// still runs and exits promptly — see DESIGN.md.
const LAUNCH_REJECTION_THRESHOLD: Duration = Duration::from_secs(5);

/// Successive flag sets tried from most to least permissive (spec.md §6).
fn argument_variants(prompt: &str) -> Vec<Vec<String>> {
    vec![
        vec!["--dangerously-skip-permissions".to_string(), "-p".to_string(), prompt.to_string()],
        vec!["--auto-approve".to_string(), "-p".to_string(), prompt.to_string()],
        vec!["-p".to_string(), prompt.to_string()],
    ]
}

pub struct EngineInvoker {
    program: String,
    project_root: PathBuf,
    timeout: Duration,
    backoff: BackoffConfig,
    history: BoundedHistory<EngineInvocation>,
    cancelled: Arc<Mutex<HashSet<String>>>,
    active_pids: Arc<Mutex<std::collections::HashMap<String, u32>>>,
}

impl EngineInvoker {
    pub fn new(program: impl Into<String>, project_root: PathBuf, timeout: Duration, backoff: BackoffConfig, max_history: usize) -> Self {
        EngineInvoker {
            program: program.into(),
            project_root,
            timeout,
            backoff,
            history: BoundedHistory::new(max_history),
            cancelled: Arc::new(Mutex::new(HashSet::new())),
            active_pids: Arc::new(Mutex::new(std::collections::HashMap::new())),
        }
    }

    pub fn history(&self) -> Vec<EngineInvocation> {
        self.history.snapshot()
    }

    /// Invoke the code-generation CLI with `prompt`, retrying per
    /// spec.md §4.5 on timeout/nonzero exit and falling back across
    /// argument variants on launch rejection. Returns the final
    /// `InvocationId` and its terminal record.
    pub async fn invoke(&self, ticket_id: &str, page_id: &str, prompt: &str) -> (InvocationId, EngineInvocation) {
        let invocation_id = InvocationId::new(format!("{ticket_id}-{}", nomad_core::OperationId::next("eng")));
        let variants = argument_variants(prompt);

        let mut attempt = 0;
        loop {
            let record = match self
                .run_with_variant_fallback(&invocation_id, ticket_id, page_id, attempt, &variants)
                .await
            {
                Ok(record) => {
                    self.history.push(record.clone());
                    return (invocation_id, record);
                }
                Err(record) => record,
            };
            self.history.push(record.clone());

            let retryable = matches!(record.result, InvocationResult::Timeout)
                || (record.result == InvocationResult::Failed
                    && !matches!(&record.error, Some(msg) if msg.contains("command not found")));
            if !retryable || attempt >= self.backoff.max_retries {
                return (invocation_id, record);
            }
            tokio::time::sleep(backoff_delay(attempt, random_jitter())).await;
            attempt += 1;
        }
    }

    /// Signal cancellation for `invocation_id`: SIGTERM, wait, SIGKILL.
    pub fn cancel(&self, invocation_id: &InvocationId) -> Result<(), EngineError> {
        self.cancelled.lock().insert(invocation_id.as_str().to_string());
        let pid = self.active_pids.lock().get(invocation_id.as_str()).copied();
        match pid {
            Some(pid) => {
                terminate_group(pid);
                Ok(())
            }
            None => Err(EngineError::UnknownInvocation(invocation_id.as_str().to_string())),
        }
    }

    #[allow(clippy::expect_used)]
    async fn run_with_variant_fallback(
        &self,
        invocation_id: &InvocationId,
        ticket_id: &str,
        page_id: &str,
        attempt: u32,
        variants: &[Vec<String>],
    ) -> Result<EngineInvocation, EngineInvocation> {
        let mut last = None;
        for args in variants {
            match self.run_once(invocation_id, ticket_id, page_id, attempt, args).await {
                Ok(record) => return Ok(record),
                Err(record)
                    if record.result == InvocationResult::Failed
                        && record.duration < LAUNCH_REJECTION_THRESHOLD
                        && !matches!(&record.error, Some(msg) if msg.contains("command not found")) =>
                {
                    warn!(ticket_id, ?args, "argument variant rejected quickly, trying next variant");
                    last = Some(record);
                    continue;
                }
                Err(record) => return Err(record),
            }
        }
        Err(last.expect("argument_variants() never returns an empty list"))
    }

    async fn run_once(
        &self,
        invocation_id: &InvocationId,
        ticket_id: &str,
        page_id: &str,
        attempt: u32,
        args: &[String],
    ) -> Result<EngineInvocation, EngineInvocation> {
        if self.cancelled.lock().contains(invocation_id.as_str()) {
            return Err(self.finish(invocation_id, ticket_id, page_id, attempt, None, InvocationResult::Cancelled, None, String::new(), String::new(), Some("cancelled before launch".to_string()), Duration::ZERO));
        }

        let started = Instant::now();
        let mut child = match spawn_in_new_group(&self.program, args, &self.project_root) {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.finish(invocation_id, ticket_id, page_id, attempt, None, InvocationResult::Failed, None, String::new(), String::new(), Some(EngineError::CommandNotFound(self.program.clone()).to_string()), started.elapsed()));
            }
            Err(e) => {
                return Err(self.finish(invocation_id, ticket_id, page_id, attempt, None, InvocationResult::Failed, None, String::new(), String::new(), Some(e.to_string()), started.elapsed()));
            }
        };

        let pid = child.id();
        if let Some(pid) = pid {
            self.active_pids.lock().insert(invocation_id.as_str().to_string(), pid);
        }

        info!(ticket_id, page_id, pid, "engine invocation started");

        let wait_result = tokio_timeout(self.timeout, wait_with_output(&mut child)).await;
        self.active_pids.lock().remove(invocation_id.as_str());

        match wait_result {
            Ok(Ok((status, stdout, stderr))) => {
                let duration = started.elapsed();
                if status.success() {
                    Ok(self.finish(invocation_id, ticket_id, page_id, attempt, pid, InvocationResult::Success, status.code(), stdout, stderr, None, duration))
                } else {
                    Err(self.finish(invocation_id, ticket_id, page_id, attempt, pid, InvocationResult::Failed, status.code(), stdout, stderr, Some(EngineError::NonZeroExit(status.code().unwrap_or(-1)).to_string()), duration))
                }
            }
            Ok(Err(e)) => {
                Err(self.finish(invocation_id, ticket_id, page_id, attempt, pid, InvocationResult::Failed, None, String::new(), String::new(), Some(e.to_string()), started.elapsed()))
            }
            Err(_) => {
                if let Some(pid) = pid {
                    terminate_group(pid);
                    if tokio_timeout(KILL_GRACE, child.wait()).await.is_err() {
                        kill_group(pid);
                        let _ = child.wait().await;
                    }
                }
                let duration = started.elapsed();
                warn!(ticket_id, page_id, ?duration, "engine invocation timed out");
                Err(self.finish(invocation_id, ticket_id, page_id, attempt, pid, InvocationResult::Timeout, None, String::new(), String::new(), Some(format!("timed out after {:?}", self.timeout)), duration))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        invocation_id: &InvocationId,
        ticket_id: &str,
        page_id: &str,
        attempt: u32,
        pid: Option<u32>,
        result: InvocationResult,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        error: Option<String>,
        duration: Duration,
    ) -> EngineInvocation {
        EngineInvocation {
            invocation_id: invocation_id.as_str().to_string(),
            ticket_id: ticket_id.to_string(),
            page_id: page_id.to_string(),
            attempt,
            pid,
            result,
            exit_code,
            duration,
            stdout,
            stderr,
            error,
        }
    }
}

async fn wait_with_output(child: &mut tokio::process::Child) -> std::io::Result<(std::process::ExitStatus, String, String)> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();

    // Drain both pipes concurrently so a chatty stderr can't fill its pipe
    // buffer and block the process while we're only reading stdout.
    let read_stdout = async {
        if let Some(out) = stdout.as_mut() {
            out.read_to_string(&mut stdout_buf).await.ok();
        }
    };
    let read_stderr = async {
        if let Some(err) = stderr.as_mut() {
            err.read_to_string(&mut stderr_buf).await.ok();
        }
    };
    tokio::join!(read_stdout, read_stderr);

    let status = child.wait().await?;
    Ok((status, stdout_buf, stderr_buf))
}

#[cfg(test)]
#[path = "invoker_tests.rs"]
mod tests;
