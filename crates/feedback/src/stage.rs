// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing stages for feedback updates (spec.md §4.6), grounded on
/// `original_source/core/managers/feedback_manager.py`'s `ProcessingStage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStage {
    Refining,
    Preparing,
    Processing,
    Copying,
    Finalizing,
    StatusTransition,
    ErrorHandling,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessingStage::Refining => "REFINING",
            ProcessingStage::Preparing => "PREPARING",
            ProcessingStage::Processing => "PROCESSING",
            ProcessingStage::Copying => "COPYING",
            ProcessingStage::Finalizing => "FINALIZING",
            ProcessingStage::StatusTransition => "STATUS_TRANSITION",
            ProcessingStage::ErrorHandling => "ERROR_HANDLING",
        };
        write!(f, "{label}")
    }
}
