// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use super::*;
use nomad_board::fake::FakeTransport;
use nomad_core::SystemClock;
use nomad_retry::BackoffConfig;

fn channel(transport: FakeTransport) -> FeedbackChannel<FakeTransport> {
    channel_with_backoff(transport, BackoffConfig::default())
}

fn channel_with_backoff(transport: FakeTransport, backoff: BackoffConfig) -> FeedbackChannel<FakeTransport> {
    let board = Arc::new(BoardClient::new(transport, "db", backoff, Arc::new(SystemClock)));
    FeedbackChannel::new(board, Arc::new(SystemClock))
}

fn feedback_of(page: &Value) -> String {
    read_feedback_text(page)
}

#[tokio::test]
async fn appends_first_entry_to_empty_page() {
    let transport = FakeTransport::new("select");
    transport.insert_page("page-1", "To Refine", "select");
    let ch = channel(transport);

    ch.append("page-1", ProcessingStage::Refining, "started", None, None).await.unwrap();

    let page = ch.board.get_page("page-1").await.unwrap();
    let text = feedback_of(&page);
    assert!(text.contains("REFINING: started"));
}

#[tokio::test]
async fn appends_second_entry_after_first() {
    let transport = FakeTransport::new("select");
    transport.insert_page("page-1", "To Refine", "select");
    let ch = channel(transport);

    ch.append("page-1", ProcessingStage::Refining, "started", None, None).await.unwrap();
    ch.append("page-1", ProcessingStage::Refining, "finished", None, None).await.unwrap();

    let page = ch.board.get_page("page-1").await.unwrap();
    let text = feedback_of(&page);
    assert!(text.contains("started"));
    assert!(text.contains("finished"));
    assert!(text.contains("\n\n"));
}

#[tokio::test]
async fn convenience_wrappers_format_expected_messages() {
    let transport = FakeTransport::new("select");
    transport.insert_page("page-1", "To Refine", "select");
    let ch = channel(transport);

    ch.stage_started("page-1", ProcessingStage::Preparing).await.unwrap();
    ch.stage_completed("page-1", ProcessingStage::Preparing).await.unwrap();
    ch.error("page-1", ProcessingStage::Processing, "boom", Some("ctx")).await.unwrap();
    ch.status_transition("page-1", "To Refine", "Refined", true, None).await.unwrap();

    let page = ch.board.get_page("page-1").await.unwrap();
    let text = feedback_of(&page);
    assert!(text.contains("Stage PREPARING started"));
    assert!(text.contains("Stage PREPARING completed"));
    assert!(text.contains("Error in PROCESSING"));
    assert!(text.contains("Error: boom"));
    assert!(text.contains("Status transition: To Refine -> Refined"));
}

#[tokio::test]
async fn retries_on_transient_failure_then_succeeds() {
    let transport = FakeTransport::new("select");
    transport.insert_page("page-1", "To Refine", "select");
    transport.inject_failure_sequence("/pages/page-1", vec![429]);
    let ch = channel(transport);

    ch.append("page-1", ProcessingStage::Refining, "started", None, None).await.unwrap();

    let page = ch.board.get_page("page-1").await.unwrap();
    assert!(feedback_of(&page).contains("started"));
}

#[tokio::test]
async fn gives_up_after_exhausting_retries() {
    let transport = FakeTransport::new("select");
    transport.insert_page("page-1", "To Refine", "select");
    transport.inject_failure_sequence("/pages/page-1", vec![500, 500, 500, 500, 500]);
    let ch = channel_with_backoff(transport, BackoffConfig { max_retries: 1 });

    let result = ch.append("page-1", ProcessingStage::Refining, "started", None, None).await;
    assert!(result.is_err());
}
