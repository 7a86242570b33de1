use super::*;
use nomad_board::fake::FakeTransport;
use nomad_core::{Clock, FakeClock, PageId, TicketId};
use nomad_engine::EngineInvoker;
use nomad_feedback::FeedbackChannel;
use nomad_retry::BackoffConfig;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use std::sync::Arc;

fn init_git_repo(dir: &std::path::Path) {
    let run = |args: &[&str]| {
        let status = Command::new("git").args(args).current_dir(dir).status().expect("git available");
        assert!(status.success());
    };
    run(&["init", "-q"]);
    run(&["config", "user.email", "nomad@example.com"]);
    run(&["config", "user.name", "nomad"]);
    std::fs::write(dir.join("README.md"), b"hello").expect("write");
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "initial commit"]);
}

fn write_engine_script(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("engine.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

fn board_with_queued_task(page_id: &str) -> BoardClient<FakeTransport> {
    let transport = FakeTransport::new("select");
    transport.insert_page(page_id, Status::QueuedToRun.label(), "select");
    BoardClient::new(transport, "db", BackoffConfig { max_retries: 1 }, Arc::new(FakeClock::new(chrono::Utc::now())) as Arc<dyn Clock>)
}

fn task(page_id: &str, commit: bool) -> Task {
    let mut t = Task::new(PageId::new(page_id), "Add widget", Status::QueuedToRun, TicketId::new("NOMAD-1"));
    t.commit = commit;
    t
}

#[tokio::test]
async fn successful_run_transitions_queued_task_to_done() {
    let page_id = "page-1";
    let board = board_with_queued_task(page_id);
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(chrono::Utc::now()));
    let feedback = FeedbackChannel::new(Arc::new(BoardClient::new(FakeTransport::new("select"), "db", BackoffConfig { max_retries: 1 }, clock.clone())), clock.clone());

    let tasks_dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tasks_dir.path().join("tasks")).expect("mkdir");
    std::fs::write(tasks_dir.path().join("tasks/NOMAD-1.json"), r#"{"tasks":[{"title":"Implement widget"}]}"#).expect("write");

    let project_root = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(project_root.path().join("src")).expect("mkdir src");
    std::fs::create_dir_all(project_root.path().join(".taskmaster/tasks")).expect("mkdir taskmaster");
    init_git_repo(project_root.path());

    let script = write_engine_script(project_root.path(), "echo 'fn widget() {}' > src/widget.rs; exit 0");
    let invoker = EngineInvoker::new(script.to_string_lossy().to_string(), project_root.path().to_path_buf(), std::time::Duration::from_secs(5), BackoffConfig { max_retries: 1 }, 10);

    let outcomes = run_queue(&board, &feedback, &invoker, project_root.path(), tasks_dir.path(), project_root.path(), "rs", &clock, vec![task(page_id, true)]).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].0, page_id);
    assert_eq!(outcomes[0].1, RunOutcome::Done);

    let final_page = board.get_page(page_id).await.expect("get_page");
    assert_eq!(board.read_status(&final_page), Some(Status::Done.label().to_string()));

    let summary_path = tasks_dir.path().join("summary/NOMAD-1.md");
    let summary = std::fs::read_to_string(&summary_path).expect("summary written to tasks_dir, not project_root");
    assert!(summary.contains("Untracked: src/widget.rs"), "change list should be git-status-derived:\n{summary}");
}

#[tokio::test]
async fn missing_task_file_fails_without_invoking_engine() {
    let page_id = "page-2";
    let board = board_with_queued_task(page_id);
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(chrono::Utc::now()));
    let feedback = FeedbackChannel::new(Arc::new(BoardClient::new(FakeTransport::new("select"), "db", BackoffConfig { max_retries: 1 }, clock.clone())), clock.clone());

    let tasks_dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tasks_dir.path().join("tasks")).expect("mkdir");

    let project_root = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(project_root.path().join("src")).expect("mkdir src");
    init_git_repo(project_root.path());

    let script = write_engine_script(project_root.path(), "exit 0");
    let invoker = EngineInvoker::new(script.to_string_lossy().to_string(), project_root.path().to_path_buf(), std::time::Duration::from_secs(5), BackoffConfig { max_retries: 1 }, 10);

    let outcomes = run_queue(&board, &feedback, &invoker, project_root.path(), tasks_dir.path(), project_root.path(), "rs", &clock, vec![task(page_id, false)]).await;

    assert!(matches!(outcomes[0].1, RunOutcome::Failed(_)));
    let final_page = board.get_page(page_id).await.expect("get_page");
    assert_eq!(board.read_status(&final_page), Some(Status::Failed.label().to_string()));
}

#[tokio::test]
async fn engine_failure_transitions_task_to_failed() {
    let page_id = "page-3";
    let board = board_with_queued_task(page_id);
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(chrono::Utc::now()));
    let feedback = FeedbackChannel::new(Arc::new(BoardClient::new(FakeTransport::new("select"), "db", BackoffConfig { max_retries: 1 }, clock.clone())), clock.clone());

    let tasks_dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tasks_dir.path().join("tasks")).expect("mkdir");
    std::fs::write(tasks_dir.path().join("tasks/NOMAD-1.json"), r#"{"tasks":[]}"#).expect("write");

    let project_root = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(project_root.path().join("src")).expect("mkdir src");
    std::fs::create_dir_all(project_root.path().join(".taskmaster/tasks")).expect("mkdir taskmaster");
    init_git_repo(project_root.path());

    let script = write_engine_script(project_root.path(), "exit 1");
    let invoker = EngineInvoker::new(script.to_string_lossy().to_string(), project_root.path().to_path_buf(), std::time::Duration::from_secs(5), BackoffConfig { max_retries: 0 }, 10);

    let outcomes = run_queue(&board, &feedback, &invoker, project_root.path(), tasks_dir.path(), project_root.path(), "rs", &clock, vec![task(page_id, false)]).await;

    assert!(matches!(outcomes[0].1, RunOutcome::Failed(_)));
    let final_page = board.get_page(page_id).await.expect("get_page");
    assert_eq!(board.read_status(&final_page), Some(Status::Failed.label().to_string()));
}

#[tokio::test]
async fn a_task_already_in_progress_skips_the_rest_of_the_queue() {
    let first = "page-4";
    let second = "page-5";
    let transport = FakeTransport::new("select");
    transport.insert_page(first, Status::InProgress.label(), "select");
    transport.insert_page(second, Status::QueuedToRun.label(), "select");
    let board = BoardClient::new(transport, "db", BackoffConfig { max_retries: 1 }, Arc::new(FakeClock::new(chrono::Utc::now())) as Arc<dyn Clock>);

    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(chrono::Utc::now()));
    let feedback = FeedbackChannel::new(Arc::new(BoardClient::new(FakeTransport::new("select"), "db", BackoffConfig { max_retries: 1 }, clock.clone())), clock.clone());

    let tasks_dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tasks_dir.path().join("tasks")).expect("mkdir");

    let project_root = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(project_root.path().join("src")).expect("mkdir src");
    init_git_repo(project_root.path());

    let script = write_engine_script(project_root.path(), "exit 0");
    let invoker = EngineInvoker::new(script.to_string_lossy().to_string(), project_root.path().to_path_buf(), std::time::Duration::from_secs(5), BackoffConfig { max_retries: 0 }, 10);

    let outcomes = run_queue(&board, &feedback, &invoker, project_root.path(), tasks_dir.path(), project_root.path(), "rs", &clock, vec![task(second, false)]).await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].1, RunOutcome::Skipped(_)));
}
