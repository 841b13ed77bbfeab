//! SQL build trigger: runs dbt as a child process.
//!
//! The only contract is "run to completion or fail". Output lines are
//! forwarded to the run log; a non-zero exit becomes a `Transform` error
//! carrying the tail of stderr.

use crate::context::RunContext;
use crate::data::DataError;
use std::path::PathBuf;
use std::process::Command;

/// A transformation step run after the external tables exist.
pub trait TransformTool {
    fn run(&self, ctx: &RunContext) -> Result<(), DataError>;
}

/// `dbt build --project-dir <dir> --profiles-dir <dir>` (or any configured command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtCommand {
    /// Program and leading arguments, e.g. `["dbt", "build"]`.
    pub command: Vec<String>,
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

impl DbtCommand {
    pub fn new(
        command: Vec<String>,
        project_dir: impl Into<PathBuf>,
        profiles_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command,
            project_dir: project_dir.into(),
            profiles_dir: profiles_dir.into(),
        }
    }

    fn build_command(&self) -> Result<Command, DataError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| DataError::Transform("empty transform command".into()))?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg("--project-dir")
            .arg(&self.project_dir)
            .arg("--profiles-dir")
            .arg(&self.profiles_dir)
            .current_dir(&self.project_dir);
        Ok(cmd)
    }
}

impl TransformTool for DbtCommand {
    fn run(&self, ctx: &RunContext) -> Result<(), DataError> {
        let mut cmd = self.build_command()?;
        tracing::info!(
            parent: ctx.span(),
            command = %self.command.join(" "),
            project_dir = %self.project_dir.display(),
            "running transform"
        );

        let output = cmd
            .output()
            .map_err(|e| {
                DataError::Transform(format!("failed to start `{}`: {e}", self.command.join(" ")))
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::info!(parent: ctx.span(), "{line}");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            tracing::warn!(parent: ctx.span(), "{line}");
        }

        if !output.status.success() {
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(DataError::Transform(format!(
                "{} exited with {}: {}",
                self.command.join(" "),
                output.status,
                tail.join(" | ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        let dbt = DbtCommand::new(vec![], ".", ".");
        let err = dbt.run(&RunContext::detached()).unwrap_err();
        assert!(matches!(err, DataError::Transform(_)));
    }

    #[test]
    fn missing_program_is_a_transform_error() {
        let dbt = DbtCommand::new(vec!["feargreed-no-such-binary".into()], ".", ".");
        assert!(matches!(
            dbt.run(&RunContext::detached()),
            Err(DataError::Transform(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let dbt = DbtCommand::new(
            vec!["sh".into(), "-c".into(), "echo built".into()],
            dir.path(),
            dir.path(),
        );
        assert!(dbt.run(&RunContext::detached()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_fails_with_stderr_tail() {
        let dir = tempfile::tempdir().unwrap();
        let dbt = DbtCommand::new(
            vec!["sh".into(), "-c".into(), "echo model failed >&2; exit 3".into()],
            dir.path(),
            dir.path(),
        );
        let err = dbt.run(&RunContext::detached()).unwrap_err();
        assert!(err.to_string().contains("model failed"), "{err}");
    }
}
