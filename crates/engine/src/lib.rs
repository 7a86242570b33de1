// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Engine Invoker (C5): launches the external code-generation CLI as a
//! process-group child with a wall-clock timeout, cancellation, retry, and
//! audit history (spec.md §4.5).

mod error;
mod invocation;
mod invoker;
mod process_group;

pub use error::EngineError;
pub use invocation::{EngineInvocation, InvocationId, InvocationResult};
pub use invoker::EngineInvoker;
