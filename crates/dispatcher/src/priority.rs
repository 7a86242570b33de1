// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Cycle priority ordering (spec.md §4.10 step 2): `Failed | Queued to run |
//! Ready to run` first when non-empty, then `To Refine | Prepare Tasks |
//! Preparing Tasks | Refined`; any other non-empty status last.

use nomad_core::Status;
use std::collections::HashMap;

const TIER_ONE: [Status; 3] = [Status::Failed, Status::QueuedToRun, Status::ReadyToRun];
const TIER_TWO: [Status; 4] = [Status::ToRefine, Status::PrepareTasks, Status::PreparingTasks, Status::Refined];

/// Order the statuses with a non-zero count per spec.md §4.10 step 2. Any
/// status outside the two named tiers (in practice only reachable if the
/// board reports an unrecognized value) sorts last, by label, for a
/// deterministic order across runs.
pub fn priority_order(counts: &HashMap<Status, usize>) -> Vec<Status> {
    let mut order = Vec::new();
    for &status in TIER_ONE.iter().chain(TIER_TWO.iter()) {
        if counts.get(&status).copied().unwrap_or(0) > 0 {
            order.push(status);
        }
    }

    let mut others: Vec<Status> = counts
        .iter()
        .filter(|(status, &count)| count > 0 && !TIER_ONE.contains(status) && !TIER_TWO.contains(status))
        .map(|(status, _)| *status)
        .collect();
    others.sort_by_key(|s| s.label());
    order.extend(others);
    order
}
