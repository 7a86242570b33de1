use super::*;
use std::os::unix::fs::PermissionsExt;

fn write_script(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

#[tokio::test]
async fn successful_invocation_records_exit_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_script(dir.path(), "ok.sh", "echo hello; exit 0");
    let invoker = EngineInvoker::new(
        script.to_string_lossy().to_string(),
        dir.path().to_path_buf(),
        Duration::from_secs(5),
        BackoffConfig { max_retries: 0 },
        10,
    );

    let (_, record) = invoker.invoke("T-1", "page-1", "do the thing").await;
    assert_eq!(record.result, InvocationResult::Success);
    assert_eq!(record.exit_code, Some(0));
    assert!(record.stdout.contains("hello"));
}

#[tokio::test]
async fn nonzero_exit_retries_up_to_budget() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_script(dir.path(), "fail.sh", "exit 1");
    let invoker = EngineInvoker::new(
        script.to_string_lossy().to_string(),
        dir.path().to_path_buf(),
        Duration::from_secs(30),
        BackoffConfig { max_retries: 1 },
        10,
    );

    let (_, record) = invoker.invoke("T-2", "page-2", "prompt").await;
    assert_eq!(record.result, InvocationResult::Failed);
    // one initial attempt + one retry = 2 history entries
    assert_eq!(invoker.history().len(), 2);
}

#[tokio::test]
async fn command_not_found_is_not_retried() {
    let dir = tempfile::tempdir().expect("tempdir");
    let invoker = EngineInvoker::new(
        "/nonexistent/definitely-not-a-binary".to_string(),
        dir.path().to_path_buf(),
        Duration::from_secs(5),
        BackoffConfig { max_retries: 3 },
        10,
    );

    let (_, record) = invoker.invoke("T-3", "page-3", "prompt").await;
    assert_eq!(record.result, InvocationResult::Failed);
    assert_eq!(invoker.history().len(), 1);
    assert!(record.error.unwrap().contains("command not found"));
}

#[tokio::test]
async fn timeout_terminates_the_process() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_script(dir.path(), "hang.sh", "sleep 30");
    let invoker = EngineInvoker::new(
        script.to_string_lossy().to_string(),
        dir.path().to_path_buf(),
        Duration::from_millis(200),
        BackoffConfig { max_retries: 0 },
        10,
    );

    let (_, record) = invoker.invoke("T-4", "page-4", "prompt").await;
    assert_eq!(record.result, InvocationResult::Timeout);
}

#[tokio::test]
async fn history_is_capped_at_configured_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = write_script(dir.path(), "ok.sh", "exit 0");
    let invoker = EngineInvoker::new(
        script.to_string_lossy().to_string(),
        dir.path().to_path_buf(),
        Duration::from_secs(5),
        BackoffConfig { max_retries: 0 },
        2,
    );

    for i in 0..5 {
        invoker.invoke(&format!("T-{i}"), "page", "prompt").await;
    }
    assert_eq!(invoker.history().len(), 2);
}
