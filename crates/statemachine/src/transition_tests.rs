// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use super::*;
use nomad_board::fake::FakeTransport;
use nomad_core::SystemClock;
use nomad_retry::BackoffConfig;
use std::sync::Arc;

fn board(transport: FakeTransport) -> BoardClient<FakeTransport> {
    BoardClient::new(transport, "db", BackoffConfig::default(), Arc::new(SystemClock))
}

#[tokio::test]
async fn applies_transition_from_expected_status() {
    let transport = FakeTransport::new("select");
    transport.insert_page("p1", "To Refine", "select");
    let board = board(transport);

    let outcome = transition(&board, "p1", Status::ToRefine, Status::Refined, true).await.unwrap();
    assert_eq!(outcome, TransitionOutcome::Applied);

    let page = board.get_page("p1").await.unwrap();
    assert_eq!(board.read_status(&page).as_deref(), Some("Refined"));
}

#[tokio::test]
async fn already_at_target_is_a_noop() {
    let transport = FakeTransport::new("select");
    transport.insert_page("p1", "Refined", "select");
    let board = board(transport);

    let outcome = transition(&board, "p1", Status::ToRefine, Status::Refined, true).await.unwrap();
    assert_eq!(outcome, TransitionOutcome::NoOp);
}

#[tokio::test]
async fn accepts_noop_when_page_already_advanced_downstream() {
    let transport = FakeTransport::new("select");
    transport.insert_page("p1", "Preparing Tasks", "select");
    let board = board(transport);

    let outcome = transition(&board, "p1", Status::Refined, Status::PrepareTasks, true).await.unwrap();
    assert_eq!(outcome, TransitionOutcome::NoOp);
}

#[tokio::test]
async fn refuses_transition_to_an_unreachable_status() {
    // "To Refine" precedes "In progress" in the lifecycle graph, so it is
    // not reachable forward from "In progress" -- the page has diverged,
    // not merely advanced.
    let transport = FakeTransport::new("select");
    transport.insert_page("p1", "To Refine", "select");
    let board = board(transport);

    let result = transition(&board, "p1", Status::InProgress, Status::Done, true).await;
    assert!(matches!(result, Err(TransitionError::Refused { .. })));
}

#[tokio::test]
async fn unvalidated_transition_applies_even_against_the_graph() {
    let transport = FakeTransport::new("select");
    transport.insert_page("p1", "Failed", "select");
    let board = board(transport);

    let outcome = transition(&board, "p1", Status::Failed, Status::ToRefine, false).await.unwrap();
    assert_eq!(outcome, TransitionOutcome::Applied);
    let page = board.get_page("p1").await.unwrap();
    assert_eq!(board.read_status(&page).as_deref(), Some("To Refine"));
}
