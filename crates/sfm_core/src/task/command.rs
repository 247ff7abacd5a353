//! Structured external command and the executor seam.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{Command, ExitStatus};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// A program plus its ordered argument list.
///
/// Spawned directly, never through a shell, so path components with
/// spaces or shell metacharacters need no quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append a `--flag value` pair.
    pub fn flag(self, name: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(name).arg(value)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Shell-like rendering for logs. Not meant to be executed.
    pub fn render(&self) -> String {
        let mut parts = vec![quote_for_display(&self.program)];
        parts.extend(
            self.args
                .iter()
                .map(|a| quote_for_display(&a.to_string_lossy())),
        );
        parts.join(" ")
    }

    /// Build the `std::process::Command` for this spec.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for CommandSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let mut state = serializer.serialize_struct("CommandSpec", 2)?;
        state.serialize_field("program", &self.program)?;
        state.serialize_field("args", &args)?;
        state.end()
    }
}

fn quote_for_display(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '%' | '+' | ',')
        });
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Exit information of a finished process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, or `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Runs a [`CommandSpec`] to completion.
///
/// The runner only ever talks to processes through this trait.
pub trait CommandExecutor: Send + Sync {
    /// Run the command, blocking until it exits.
    ///
    /// `Err` means the process could not be started.
    fn run(&self, command: &CommandSpec) -> io::Result<CommandStatus>;
}

/// Spawns real processes with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn run(&self, command: &CommandSpec) -> io::Result<CommandStatus> {
        tracing::debug!("Spawning: {}", command.render());
        let status = command.to_command().status()?;
        Ok(status.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_quotes_paths_with_spaces() {
        let cmd = CommandSpec::new("colmap")
            .arg("feature_extractor")
            .flag("--image_path", "/data/my scan/images");
        assert_eq!(
            cmd.render(),
            "colmap feature_extractor --image_path '/data/my scan/images'"
        );
    }

    #[test]
    fn args_are_kept_verbatim() {
        let cmd = CommandSpec::new("ffmpeg").flag("-i", "it's a \"clip\".mp4");
        assert_eq!(cmd.args()[1], OsString::from("it's a \"clip\".mp4"));
        assert!(cmd.render().contains(r"'it'\''s a"));
    }

    #[test]
    fn serializes_args_as_strings() {
        let cmd = CommandSpec::new("glomap").arg("mapper");
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"program":"glomap","args":["mapper"]}"#);
    }

    #[test]
    fn status_success_only_for_zero() {
        assert!(CommandStatus::exited(0).success());
        assert!(!CommandStatus::exited(2).success());
        assert!(!CommandStatus { code: None }.success());
        assert_eq!(CommandStatus { code: None }.describe(), "terminated by signal");
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_reports_exit_codes() {
        let ok = SystemExecutor.run(&CommandSpec::new("true")).unwrap();
        let failed = SystemExecutor.run(&CommandSpec::new("false")).unwrap();
        assert!(ok.success());
        assert_eq!(failed.code, Some(1));
    }

    #[test]
    fn system_executor_surfaces_missing_program() {
        let result = SystemExecutor.run(&CommandSpec::new("definitely-not-a-real-tool-4821"));
        assert!(result.is_err());
    }
}
