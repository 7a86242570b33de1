use super::*;
use nomad_dispatcher::CycleReport;

#[test]
fn report_exit_code_is_zero_when_nothing_failed() {
    assert_eq!(report_exit_code(CycleReport { successes: 0, failures: 0 }), 0);
    assert_eq!(report_exit_code(CycleReport { successes: 3, failures: 0 }), 0);
    assert_eq!(report_exit_code(CycleReport { successes: 1, failures: 2 }), 0);
}

#[test]
fn report_exit_code_is_nonzero_when_everything_failed() {
    assert_eq!(report_exit_code(CycleReport { successes: 0, failures: 1 }), 1);
}

#[test]
fn config_create_refuses_to_overwrite_existing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let guard = CwdGuard::enter(dir.path());
    std::fs::write("nomad.toml", "stale").expect("seed file");

    let err = config_create().expect_err("should refuse to overwrite");
    assert!(err.to_string().contains("already exists"));
    drop(guard);
}

#[test]
fn config_create_writes_file_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let guard = CwdGuard::enter(dir.path());

    config_create().expect("config_create");
    let written = std::fs::read_to_string("nomad.toml").expect("read nomad.toml");
    assert_eq!(written, FileDefaults::default().to_toml_string());
    drop(guard);
}

/// Serializes tests that change the process cwd, since it's global state.
struct CwdGuard {
    previous: PathBuf,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl CwdGuard {
    fn enter(dir: &std::path::Path) -> Self {
        static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
        let lock = CWD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::env::current_dir().expect("current_dir");
        std::env::set_current_dir(dir).expect("set_current_dir");
        Self { previous, _lock: lock }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}
