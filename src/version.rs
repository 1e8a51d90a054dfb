//! Tool version resolution for the manifest's `meta` block.
//!
//! First available wins:
//!
//! ```text
//! --tool-version flag  →  meta.tool_version  →  stdout of meta.version_command
//! ```

use crate::config::MetaConfig;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Failed to run version command `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("Version command `{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Version command `{0}` printed nothing")]
    Empty(String),
    #[error("No version command configured")]
    NoCommand,
}

pub fn resolve_tool_version(
    cli_override: Option<&str>,
    meta: &MetaConfig,
) -> Result<String, VersionError> {
    if let Some(version) = cli_override.or(meta.tool_version.as_deref()) {
        return Ok(version.to_string());
    }
    run_version_command(&meta.version_command)
}

/// Run a command and return its trimmed stdout.
pub fn run_version_command(command: &[String]) -> Result<String, VersionError> {
    let (program, args) = command.split_first().ok_or(VersionError::NoCommand)?;
    let display = command.join(" ");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| VersionError::Spawn {
            command: display.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(VersionError::Failed {
            command: display,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if version.is_empty() {
        return Err(VersionError::Empty(display));
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn cli_override_wins() {
        let meta = MetaConfig {
            tool_version: Some("from-config".into()),
            version_command: command(&["false"]),
        };
        assert_eq!(
            resolve_tool_version(Some("from-cli"), &meta).unwrap(),
            "from-cli"
        );
    }

    #[test]
    fn config_version_skips_command() {
        let meta = MetaConfig {
            tool_version: Some("0.4.0".into()),
            version_command: command(&["/nonexistent/never-run"]),
        };
        assert_eq!(resolve_tool_version(None, &meta).unwrap(), "0.4.0");
    }

    #[test]
    fn empty_command_is_error() {
        assert!(matches!(
            run_version_command(&[]),
            Err(VersionError::NoCommand)
        ));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let result = run_version_command(&command(&["/nonexistent/nbgallery-probe"]));
        assert!(matches!(result, Err(VersionError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_trimmed() {
        let result = run_version_command(&command(&["sh", "-c", "echo '  0.5.1  '"]));
        assert_eq!(result.unwrap(), "0.5.1");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_error() {
        let result = run_version_command(&command(&["sh", "-c", "echo boom >&2; exit 3"]));
        assert!(matches!(result, Err(VersionError::Failed { stderr, .. }) if stderr == "boom"));
    }

    #[cfg(unix)]
    #[test]
    fn blank_output_is_error() {
        let result = run_version_command(&command(&["sh", "-c", "echo"]));
        assert!(matches!(result, Err(VersionError::Empty(_))));
    }
}
