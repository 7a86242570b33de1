// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Board Client (C1) and Property Codec (C2): a typed, retrying wrapper
//! over the board's HTTP API (spec.md §4.2), agnostic to which of the
//! three physical shapes the provider uses for the Status property.

mod blocks;
mod cache;
mod client;
mod error;
mod page_codec;
mod status_codec;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use blocks::{chunk_blocks, classify_children, is_leaf, parse_markdown_blocks};
pub use client::{BoardClient, QueryPage};
pub use error::BoardError;
pub use page_codec::task_from_page;
pub use status_codec::{extract_status_value, status_filter, status_update_payload, StatusPropertyShape};
pub use transport::{BoardTransport, HttpTransport, Method, RawResponse};
