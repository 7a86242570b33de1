// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Status Machine (C7, spec.md §4.9): single and batch transitions over
//! the lifecycle graph defined by `nomad_core::Status`, with
//! downstream-acceptance no-ops and unvalidated rollback.

mod batch;
mod error;
mod transition;

pub use batch::{batch_transition, rollback, BatchResult};
pub use error::TransitionError;
pub use transition::{transition, TransitionOutcome};
