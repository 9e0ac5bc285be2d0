//! Rebuild command run after each durable write.

use crate::error::ServerError;
use std::path::Path;
use tokio::process::Command;

const OUTPUT_TAIL_CHARS: usize = 500;

/// Run `command` through the platform shell in `dir`; a non-zero exit is
/// an error carrying the tail of its output
pub async fn run_rebuild(command: &str, dir: &Path) -> Result<(), ServerError> {
    tracing::info!(command, dir = %dir.display(), "Running rebuild");

    let output = shell(command)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| ServerError::Rebuild(format!("failed to start '{}': {}", command, e)))?;

    if output.status.success() {
        tracing::info!(command, "Rebuild finished");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stderr.trim().is_empty() { stdout } else { stderr };

    Err(ServerError::Rebuild(format!(
        "'{}' exited with {}: {}",
        command,
        output.status,
        tail(text.trim(), OUTPUT_TAIL_CHARS)
    )))
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

fn tail(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    match text.char_indices().nth(count - max) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("abc", 10), "abc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rebuild_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();

        assert!(run_rebuild("true", dir.path()).await.is_ok());

        let err = run_rebuild("echo 'build broke' >&2; exit 3", dir.path())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("build broke"), "{}", message);
    }
}
