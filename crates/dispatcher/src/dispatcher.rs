// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The top-level scheduler itself (C10, spec.md §4.10), grounded on
//! `original_source/src/core/processors/multi_status_processor.py`'s
//! `MultiStatusProcessor.process_all_statuses`/`run_continuous` (per-status
//! handler dispatch table, cooldown tracking, sleep-with-shutdown-poll loop).

use crate::cooldown::CooldownTracker;
use crate::decomposer::{canonical_output_path, per_ticket_output_is_ready, run_decomposer, DecomposeOutcome};
use crate::priority::priority_order;
use crate::stats::Counters;
use nomad_board::{task_from_page, BoardClient, BoardTransport};
use nomad_core::{Clock, Status, Task};
use nomad_engine::EngineInvoker;
use nomad_feedback::{FeedbackChannel, ProcessingStage};
use nomad_refine::RefinementPool;
use nomad_statemachine::transition;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

const PREPARING_TASKS_RECENCY: Duration = Duration::from_secs(10 * 60);
const CONTINUOUS_POLL_INTERVAL: Duration = Duration::from_secs(60);
const SHUTDOWN_POLL_GRANULARITY: Duration = Duration::from_secs(5);
const SUCCESS_RATE_LOG_EVERY: u64 = 10;

/// Outcome tally for one `run_cycle`, used by one-shot CLI modes to decide
/// their exit code (spec.md §7: nonzero iff zero successes and at least one
/// failure).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub successes: usize,
    pub failures: usize,
}

impl CycleReport {
    fn record(&mut self, success: bool) {
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    fn merge(&mut self, other: CycleReport) {
        self.successes += other.successes;
        self.failures += other.failures;
    }

    pub fn is_failure(&self) -> bool {
        self.successes == 0 && self.failures > 0
    }
}

pub struct Dispatcher<T: BoardTransport> {
    board: Arc<BoardClient<T>>,
    feedback: Arc<FeedbackChannel<T>>,
    refine_pool: RefinementPool<T>,
    invoker: EngineInvoker,
    decomposer_program: String,
    decomposer_timeout: Duration,
    repo_root: PathBuf,
    tasks_dir: PathBuf,
    project_root: PathBuf,
    watch_extension: String,
    cooldown: CooldownTracker,
    counters: Counters,
    clock: Arc<dyn Clock>,
    shutting_down: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl<T: BoardTransport> Dispatcher<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        board: Arc<BoardClient<T>>,
        feedback: Arc<FeedbackChannel<T>>,
        refine_pool: RefinementPool<T>,
        invoker: EngineInvoker,
        decomposer_program: impl Into<String>,
        decomposer_timeout: Duration,
        repo_root: PathBuf,
        tasks_dir: PathBuf,
        project_root: PathBuf,
        watch_extension: impl Into<String>,
        clock: Arc<dyn Clock>,
        shutting_down: Arc<dyn Fn() -> bool + Send + Sync>,
    ) -> Self {
        Dispatcher {
            board,
            feedback,
            refine_pool,
            invoker,
            decomposer_program: decomposer_program.into(),
            decomposer_timeout,
            repo_root,
            tasks_dir,
            project_root,
            watch_extension: watch_extension.into(),
            cooldown: CooldownTracker::with_defaults(clock.clone()),
            counters: Counters::new(),
            clock,
            shutting_down,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// One full pass over every processed status, per spec.md §4.10 steps 1-4.
    pub async fn run_cycle(&self) -> CycleReport {
        self.counters.record_cycle();
        self.cooldown.prune();

        let mut tasks_by_status: HashMap<Status, Vec<Task>> = HashMap::new();
        let mut counts: HashMap<Status, usize> = HashMap::new();
        for &status in Status::all_processed() {
            match self.board.query_by_status_cached(status.label()).await {
                Ok(pages) => {
                    let tasks: Vec<Task> = pages.iter().map(task_from_page).collect();
                    counts.insert(status, tasks.len());
                    tasks_by_status.insert(status, tasks);
                }
                Err(e) => {
                    error!(%status, error = %e, "failed to query status; aborting this cycle");
                    return CycleReport::default();
                }
            }
        }

        let mut report = CycleReport::default();
        for status in priority_order(&counts) {
            let tasks = tasks_by_status.remove(&status).unwrap_or_default();
            let outcome = self.dispatch_status(status, tasks).await;
            report.merge(outcome);
        }
        report
    }

    /// One-shot `--refine`: query and process only the `To Refine` bucket.
    pub async fn run_refine_only(&self) -> CycleReport {
        self.run_single_status(Status::ToRefine).await
    }

    /// One-shot `--prepare`: query and process only the `Prepare Tasks`
    /// bucket (a single ticket per spec.md §4.10 step 3).
    pub async fn run_prepare_only(&self) -> CycleReport {
        self.run_single_status(Status::PrepareTasks).await
    }

    /// One-shot `--queued`: query and process only the `Queued to run`
    /// bucket.
    pub async fn run_queued_only(&self) -> CycleReport {
        self.run_single_status(Status::QueuedToRun).await
    }

    async fn run_single_status(&self, status: Status) -> CycleReport {
        self.counters.record_cycle();
        self.cooldown.prune();
        match self.board.query_by_status_cached(status.label()).await {
            Ok(pages) => {
                let tasks: Vec<Task> = pages.iter().map(task_from_page).collect();
                self.dispatch_status(status, tasks).await
            }
            Err(e) => {
                error!(%status, error = %e, "failed to query status; aborting this pass");
                CycleReport::default()
            }
        }
    }

    async fn dispatch_status(&self, status: Status, tasks: Vec<Task>) -> CycleReport {
        let pending: Vec<Task> = tasks.into_iter().filter(|t| !self.cooldown.is_cooling_down(t.page_id.as_str())).collect();
        match status {
            Status::ToRefine => self.handle_to_refine(pending).await,
            Status::Refined => self.handle_refined(pending).await,
            Status::PrepareTasks => self.handle_prepare_tasks(pending).await,
            Status::PreparingTasks => self.handle_preparing_tasks(pending).await,
            Status::ReadyToRun => self.handle_ready_to_run(pending).await,
            Status::QueuedToRun => self.handle_queued_to_run(pending).await,
            Status::Failed => {
                if !pending.is_empty() {
                    info!(count = pending.len(), "tasks currently in Failed status (no automatic retry)");
                }
                CycleReport::default()
            }
            Status::InProgress | Status::Done | Status::Unknown => CycleReport::default(),
        }
    }

    async fn handle_to_refine(&self, tasks: Vec<Task>) -> CycleReport {
        if tasks.is_empty() {
            return CycleReport::default();
        }
        let shutting_down = self.shutting_down.clone();
        let cancelled: Box<dyn Fn() -> bool + Sync> = Box::new(move || shutting_down());
        let outcomes = self.refine_pool.refine_all(tasks, cancelled.as_ref()).await;

        let mut report = CycleReport::default();
        for (page_id, outcome) in outcomes {
            self.cooldown.mark(&page_id);
            match outcome {
                nomad_refine::RefineOutcome::Completed => {
                    self.counters.record_success();
                    report.record(true);
                }
                nomad_refine::RefineOutcome::Failed(reason) => {
                    warn!(page_id, reason, "refinement failed");
                    self.counters.record_failure();
                    report.record(false);
                }
                nomad_refine::RefineOutcome::Aborted | nomad_refine::RefineOutcome::Skipped(_) => {}
            }
        }
        report
    }

    async fn handle_refined(&self, tasks: Vec<Task>) -> CycleReport {
        let mut report = CycleReport::default();
        for task in tasks {
            let page_id = task.page_id.as_str().to_string();
            match transition(&self.board, &page_id, Status::Refined, Status::PrepareTasks, true).await {
                Ok(_) => {
                    self.cooldown.mark(&page_id);
                    let outcome = self.run_prepare_tasks_pipeline(&task).await;
                    report.record(outcome);
                }
                Err(e) => {
                    error!(page_id, error = %e, "failed to transition Refined task to Prepare Tasks");
                    report.record(false);
                }
            }
        }
        report
    }

    /// The `Prepare Tasks` status bucket: pick one ticket to avoid
    /// contention on the decomposer's singleton output file (spec.md §4.10
    /// step 3, and the REDESIGN-FLAGS note on why only one is picked).
    async fn handle_prepare_tasks(&self, mut tasks: Vec<Task>) -> CycleReport {
        let mut report = CycleReport::default();
        let Some(task) = tasks.pop() else {
            return report;
        };
        let success = self.run_prepare_tasks_pipeline(&task).await;
        report.record(success);
        report
    }

    async fn run_prepare_tasks_pipeline(&self, task: &Task) -> bool {
        let page_id = task.page_id.as_str();
        let ticket_id = task.ticket_id.as_str();

        if let Err(e) = transition(&self.board, page_id, Status::PrepareTasks, Status::PreparingTasks, true).await {
            error!(page_id, error = %e, "failed to transition to Preparing Tasks");
            return false;
        }
        self.cooldown.mark(page_id);
        let _ = self.feedback.stage_started(page_id, ProcessingStage::Preparing).await;

        let markdown_path = self.tasks_dir.join("refined").join(format!("{ticket_id}.md"));
        let outcome = run_decomposer(&self.decomposer_program, &markdown_path, &self.project_root, self.decomposer_timeout);

        let success = match outcome {
            Ok(DecomposeOutcome::Success) => self.finish_prepare_tasks(page_id, ticket_id).await,
            Ok(DecomposeOutcome::Failed(reason)) => {
                let _ = self.feedback.error(page_id, ProcessingStage::Preparing, &reason, None).await;
                false
            }
            Err(e) => {
                let _ = self.feedback.error(page_id, ProcessingStage::Preparing, &e.to_string(), None).await;
                false
            }
        };

        if success {
            self.counters.record_success();
            let _ = transition(&self.board, page_id, Status::PreparingTasks, Status::ReadyToRun, true).await;
        } else {
            self.counters.record_failure();
            let _ = transition(&self.board, page_id, Status::PreparingTasks, Status::Failed, false).await;
        }
        let _ = self.feedback.stage_completed(page_id, ProcessingStage::Preparing).await;
        success
    }

    async fn finish_prepare_tasks(&self, page_id: &str, ticket_id: &str) -> bool {
        let _ = self.feedback.stage_started(page_id, ProcessingStage::Copying).await;
        let per_ticket_path = self.tasks_dir.join("tasks").join(format!("{ticket_id}.json"));
        if let Err(e) = persist_per_ticket_output(&canonical_output_path(&self.project_root), &per_ticket_path) {
            error!(page_id, error = %e, "failed to persist per-ticket decomposition output");
            return false;
        }

        let file_reference = serde_json::json!({
            "Tasks": {
                "files": [{
                    "name": format!("{ticket_id}.json"),
                    "external": { "url": format!("file://{}", per_ticket_path.display()) },
                }]
            }
        });
        if let Err(e) = self.board.patch_properties(page_id, file_reference).await {
            error!(page_id, error = %e, "failed to upload file reference onto page");
            return false;
        }
        true
    }

    async fn handle_preparing_tasks(&self, tasks: Vec<Task>) -> CycleReport {
        let mut report = CycleReport::default();
        let canonical = canonical_output_path(&self.project_root);
        for task in tasks {
            let page_id = task.page_id.as_str();
            let per_ticket_path = self.tasks_dir.join("tasks").join(format!("{}.json", task.ticket_id.as_str()));
            let ready = per_ticket_output_is_ready(&per_ticket_path, &canonical, PREPARING_TASKS_RECENCY, file_age);
            if !ready {
                continue;
            }
            match transition(&self.board, page_id, Status::PreparingTasks, Status::ReadyToRun, true).await {
                Ok(_) => {
                    self.cooldown.mark(page_id);
                    report.record(true);
                }
                Err(e) => {
                    error!(page_id, error = %e, "failed to transition completed Preparing Tasks task");
                    report.record(false);
                }
            }
        }
        report
    }

    async fn handle_ready_to_run(&self, tasks: Vec<Task>) -> CycleReport {
        let mut report = CycleReport::default();
        for task in tasks {
            let page_id = task.page_id.as_str();
            match transition(&self.board, page_id, Status::ReadyToRun, Status::QueuedToRun, true).await {
                Ok(_) => {
                    self.cooldown.mark(page_id);
                    report.record(true);
                }
                Err(e) => {
                    error!(page_id, error = %e, "failed to queue Ready to run task");
                    report.record(false);
                }
            }
        }
        report
    }

    async fn handle_queued_to_run(&self, tasks: Vec<Task>) -> CycleReport {
        if tasks.is_empty() {
            return CycleReport::default();
        }
        let outcomes = nomad_runner::run_queue(
            &self.board,
            &self.feedback,
            &self.invoker,
            &self.repo_root,
            &self.tasks_dir,
            &self.project_root,
            &self.watch_extension,
            &self.clock,
            tasks,
        )
        .await;

        let mut report = CycleReport::default();
        for (page_id, outcome) in outcomes {
            self.cooldown.mark(&page_id);
            match outcome {
                nomad_runner::RunOutcome::Done => {
                    self.counters.record_success();
                    report.record(true);
                }
                nomad_runner::RunOutcome::Failed(reason) => {
                    warn!(page_id, reason, "queued run failed");
                    self.counters.record_failure();
                    report.record(false);
                }
                nomad_runner::RunOutcome::Skipped(_) => {}
            }
        }
        report
    }

    /// Continuous mode (spec.md §4.10 step 5): run a cycle, sleep 60 s in 5 s
    /// slices checking `shutting_down`, log a rolling success rate every 10
    /// cycles.
    pub async fn run_continuous(&self) {
        loop {
            if (self.shutting_down)() {
                return;
            }
            self.run_cycle().await;
            if self.counters.cycles() % SUCCESS_RATE_LOG_EVERY == 0 {
                let snapshot = self.counters.snapshot();
                info!(
                    cycles = snapshot.cycles,
                    processed = snapshot.processed,
                    success_rate = snapshot.success_rate(),
                    "rolling success rate"
                );
            }
            if !self.sleep_until_shutdown_or_elapsed(CONTINUOUS_POLL_INTERVAL).await {
                return;
            }
        }
    }

    /// Sleep up to `total`, in `SHUTDOWN_POLL_GRANULARITY` slices, returning
    /// `false` as soon as `shutting_down` flips so the caller can exit early.
    async fn sleep_until_shutdown_or_elapsed(&self, total: Duration) -> bool {
        let mut remaining = total;
        while !remaining.is_zero() {
            if (self.shutting_down)() {
                return false;
            }
            let slice = remaining.min(SHUTDOWN_POLL_GRANULARITY);
            sleep(slice).await;
            remaining -= slice;
        }
        !(self.shutting_down)()
    }
}

fn persist_per_ticket_output(canonical: &Path, destination: &Path) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(canonical, destination)?;
    Ok(())
}

fn file_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    std::time::SystemTime::now().duration_since(modified).ok()
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
