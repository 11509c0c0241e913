//! Detached subprocess helpers used by provider `execute` implementations

use crate::error::ProviderError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Spawn `program` without waiting for it
///
/// The child gets its own process group and null stdio. No handle is kept;
/// the runtime reaps it when it exits.
pub fn spawn_detached<I, S>(program: &str, args: I, envs: &[(&str, &str)]) -> Result<(), ProviderError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    ensure_runtime()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);
    #[cfg(unix)]
    command.process_group(0);

    let child = command
        .spawn()
        .map_err(|e| ProviderError::command(program, e))?;
    debug!("Spawned {} (pid {:?})", program, child.id());
    Ok(())
}

/// Run a shell command line detached
pub fn spawn_shell(command_line: &str, envs: &[(&str, &str)]) -> Result<(), ProviderError> {
    spawn_detached("sh", ["-c", command_line], envs)
}

/// Write `text` to the system clipboard
///
/// Uses `wl-copy` under Wayland and `xclip` otherwise. The copy runs as a
/// background task; failures there are logged.
pub fn copy_to_clipboard(text: &str) -> Result<(), ProviderError> {
    let handle = ensure_runtime()?;

    let (program, args): (&str, &[&str]) = if std::env::var_os("WAYLAND_DISPLAY").is_some() {
        ("wl-copy", &[])
    } else {
        ("xclip", &["-selection", "clipboard"])
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ProviderError::command(program, e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ProviderError::command(program, "stdin not captured"))?;
    let text = text.to_string();

    handle.spawn(async move {
        if let Err(e) = stdin.write_all(text.as_bytes()).await {
            warn!("Failed to write to {}: {}", program, e);
        }
        drop(stdin);
        if let Err(e) = child.wait().await {
            warn!("{} did not exit cleanly: {}", program, e);
        }
    });

    Ok(())
}

fn ensure_runtime() -> Result<Handle, ProviderError> {
    Handle::try_current().map_err(|e| ProviderError::Runtime(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_requires_runtime() {
        let result = spawn_detached("true", Vec::<String>::new(), &[]);
        assert!(matches!(result, Err(ProviderError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_spawn_missing_program_is_command_error() {
        let result = spawn_detached("loupe-definitely-missing-binary", ["x"], &[]);
        assert!(matches!(result, Err(ProviderError::Command { .. })));
    }

    #[tokio::test]
    async fn test_spawn_shell_does_not_wait() {
        let started = std::time::Instant::now();
        spawn_shell("sleep 2", &[]).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }
}
