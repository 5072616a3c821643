//! Built-in units
//!
//! Thin filesystem and CLI clients, one per category. Anything heavier
//! (REST uploaders, chat announcers) registers its own factory through
//! [`crate::PluginRegistry`].

pub mod announce;
pub mod deploy;
pub mod directory;
pub mod github;
pub mod syft;

use std::path::Path;
use std::process::{Command, Output, Stdio};

/// Run a command line through the platform shell, capturing output
pub(crate) fn run_shell(
    command: &str,
    cwd: &Path,
    envs: &[(String, String)],
) -> std::io::Result<Output> {
    let shell = if cfg!(windows) { "cmd" } else { "sh" };
    let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

    let mut cmd = Command::new(shell);
    cmd.arg(shell_arg).arg(command);
    cmd.current_dir(cwd);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.output()
}

/// Pick the most useful failure text out of a process output
pub(crate) fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}
