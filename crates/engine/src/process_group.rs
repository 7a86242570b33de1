// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Process-group spawn/signal helpers (spec.md §4.5: "create a new process
//! group on POSIX so the entire subtree can be signalled"), grounded on
//! `original_source/clients/claude_engine_invoker.py`'s
//! `preexec_fn=os.setsid` / `os.killpg`.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Spawn `program` with `args` in `cwd`, detached into its own process
/// group so a later signal reaches every descendant it forks.
pub fn spawn_in_new_group(program: &str, args: &[String], cwd: &std::path::Path) -> std::io::Result<Child> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // SAFETY: setsid() only affects the child after fork, before exec; it
    // takes no pointers and cannot race with the parent's memory.
    unsafe {
        command.pre_exec(|| {
            nix::unistd::setsid().map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
            Ok(())
        });
    }

    command.spawn()
}

/// Send `signal` to the process group led by `pid`.
pub fn signal_group(pid: u32, sig: Signal) {
    let pgid = Pid::from_raw(pid as i32);
    // Negative pid addresses the whole process group in killpg semantics.
    let _ = signal::kill(Pid::from_raw(-pgid.as_raw()), sig);
}

pub fn terminate_group(pid: u32) {
    signal_group(pid, Signal::SIGTERM);
}

pub fn kill_group(pid: u32) {
    signal_group(pid, Signal::SIGKILL);
}
