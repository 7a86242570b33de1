// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Lifecycle states and the legal transition graph (spec.md §4.1).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A task's position in the fixed lifecycle, or `Unknown` for any value the
/// board reports that isn't one of the defined states (spec.md §3, invariant b).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    ToRefine,
    Refined,
    PrepareTasks,
    PreparingTasks,
    ReadyToRun,
    QueuedToRun,
    InProgress,
    Done,
    Failed,
    Unknown,
}

impl Status {
    /// The board's literal property value for each state, used for filters,
    /// updates, and feedback lines. `Unknown` has no board value: it is never
    /// written, only observed.
    pub fn label(self) -> &'static str {
        match self {
            Status::ToRefine => "To Refine",
            Status::Refined => "Refined",
            Status::PrepareTasks => "Prepare Tasks",
            Status::PreparingTasks => "Preparing Tasks",
            Status::ReadyToRun => "Ready to run",
            Status::QueuedToRun => "Queued to run",
            Status::InProgress => "In progress",
            Status::Done => "Done",
            Status::Failed => "Failed",
            Status::Unknown => "Unknown",
        }
    }

    /// Parse a raw board value, per invariant (b): anything unrecognized
    /// becomes `Unknown` rather than an error.
    pub fn from_label(raw: &str) -> Status {
        match raw {
            "To Refine" => Status::ToRefine,
            "Refined" => Status::Refined,
            "Prepare Tasks" => Status::PrepareTasks,
            "Preparing Tasks" => Status::PreparingTasks,
            "Ready to run" => Status::ReadyToRun,
            "Queued to run" => Status::QueuedToRun,
            "In progress" => Status::InProgress,
            "Done" => Status::Done,
            "Failed" => Status::Failed,
            _ => Status::Unknown,
        }
    }

    /// States the dispatcher actively processes (excludes `Done`, `Unknown`).
    pub fn all_processed() -> &'static [Status] {
        &[
            Status::Failed,
            Status::ToRefine,
            Status::Refined,
            Status::PrepareTasks,
            Status::PreparingTasks,
            Status::ReadyToRun,
            Status::QueuedToRun,
        ]
    }

    /// Direct successors allowed from this state (spec.md §4.1 table).
    /// `Failed` is reachable from every state but is listed explicitly for
    /// clarity rather than special-cased at call sites.
    pub fn legal_next(self) -> &'static [Status] {
        match self {
            Status::ToRefine => &[Status::Refined, Status::Failed],
            Status::Refined => &[Status::PrepareTasks, Status::Failed],
            Status::PrepareTasks => &[Status::PreparingTasks, Status::Failed],
            Status::PreparingTasks => &[Status::ReadyToRun, Status::Failed],
            Status::ReadyToRun => &[Status::QueuedToRun, Status::Failed],
            Status::QueuedToRun => &[Status::InProgress, Status::Failed],
            Status::InProgress => &[Status::Done, Status::Failed],
            Status::Done | Status::Failed | Status::Unknown => &[],
        }
    }

    /// Is `to` reachable from `self` by zero or more legal forward
    /// transitions? Used for the downstream-acceptance rule (spec.md §4.1)
    /// and batch rollback validation.
    pub fn can_reach(self, to: Status) -> bool {
        if self == to {
            return true;
        }
        self.legal_next().iter().any(|&next| next.can_reach(to))
    }

    /// True if `from -> self` is a direct legal edge.
    pub fn is_direct_transition(from: Status, to: Status) -> bool {
        from.legal_next().contains(&to)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
