//! # External Build Step
//!
//! A descriptor may name a compile step with `buildcmd`, e.g.
//!
//! ```text
//! solution: Acme.sln
//! buildcmd: dotnet build {} -c Release
//! ```
//!
//! The `solution` value (empty if absent) replaces the first `{}` in the
//! template. The first whitespace-separated token is the program, the rest
//! are its arguments; double quotes group an argument containing spaces.
//!
//! The command runs in the descriptor's directory, either blocking with the
//! child's output inherited ([`BuildMode::Blocking`]) or with stdout piped
//! and forwarded line by line to a [`ProgressSink`] ([`BuildMode::Streaming`]).
//!
//! The exit code is not checked. A failed build shows up later as a missing
//! target or include file. Only a command that cannot be started at all is an
//! error.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use log::{info, warn};

use crate::descriptor::{self, Descriptor};
use crate::error::{Error, Result};

/// Where the solution value is inserted into the command template
pub const INSERTION_POINT: &str = "{}";

/// How the build command is run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Wait for the command, output goes straight to the terminal
    #[default]
    Blocking,
    /// Read stdout line by line and hand each line to a progress sink
    Streaming,
}

/// Receives build output lines in streaming mode
pub trait ProgressSink {
    fn line(&mut self, line: &str);
}

impl<F: FnMut(&str)> ProgressSink for F {
    fn line(&mut self, line: &str) {
        self(line)
    }
}

/// Forwards build output to the `log` facade at info level
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn line(&mut self, line: &str) {
        info!("[build] {}", line);
    }
}

/// A build command split into program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    program: String,
    args: Vec<String>,
}

impl BuildCommand {
    /// Insert the solution into the template and split the result
    pub fn from_template(template: &str, solution: &str) -> Result<Self> {
        let command = template.replacen(INSERTION_POINT, solution, 1);
        let mut tokens = split_args(&command).into_iter();

        let program = tokens.next().ok_or_else(|| Error::ExternalProcess {
            command: template.to_string(),
            message: "build command is empty".to_string(),
        })?;

        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command in `dir` and return its exit status
    pub fn run(
        &self,
        dir: &Path,
        mode: BuildMode,
        sink: &mut dyn ProgressSink,
    ) -> Result<ExitStatus> {
        info!("Running build command: {}", self);

        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(dir);

        let status = match mode {
            BuildMode::Blocking => command.status().map_err(|e| self.spawn_error(e))?,
            BuildMode::Streaming => {
                let mut child = command
                    .stdout(Stdio::piped())
                    .spawn()
                    .map_err(|e| self.spawn_error(e))?;

                let forwarded = match child.stdout.take() {
                    Some(stdout) => forward_lines(stdout, sink),
                    None => Ok(()),
                };
                // Reap the child even when reading its output failed.
                let status = child.wait()?;
                forwarded?;
                status
            }
        };

        if !status.success() {
            warn!(
                "Build command '{}' exited with {}; continuing with packaging",
                self, status
            );
        }

        Ok(status)
    }

    fn spawn_error(&self, error: std::io::Error) -> Error {
        Error::ExternalProcess {
            command: self.to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Hand every line of `source` to the sink, without line terminators
fn forward_lines<R: Read>(source: R, sink: &mut dyn ProgressSink) -> std::io::Result<()> {
    let mut reader = BufReader::new(source);
    let mut buffer = Vec::new();
    while reader.read_until(b'\n', &mut buffer)? > 0 {
        let line = String::from_utf8_lossy(&buffer);
        sink.line(line.trim_end_matches(['\r', '\n']));
        buffer.clear();
    }
    Ok(())
}

/// Run the descriptor's build command, if it has one
pub fn invoke(
    descriptor: &Descriptor,
    root: &Path,
    mode: BuildMode,
    sink: &mut dyn ProgressSink,
) -> Result<Option<ExitStatus>> {
    let Some(template) = descriptor.get(descriptor::BUILD_COMMAND) else {
        return Ok(None);
    };
    let solution = descriptor.get(descriptor::SOLUTION).unwrap_or("");

    let command = BuildCommand::from_template(template, solution)?;
    command.run(root, mode, sink).map(Some)
}

/// Split on whitespace, keeping double-quoted runs together
fn split_args(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in command.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_template_inserts_solution() {
        let command =
            BuildCommand::from_template("msbuild {} /p:Configuration=Release", "Acme.sln").unwrap();

        assert_eq!(command.program(), "msbuild");
        assert_eq!(command.args(), ["Acme.sln", "/p:Configuration=Release"]);
    }

    #[test]
    fn test_from_template_without_solution() {
        let command = BuildCommand::from_template("make {} all", "").unwrap();
        assert_eq!(command.program(), "make");
        assert_eq!(command.args(), ["all"]);
    }

    #[test]
    fn test_from_template_single_insertion_point() {
        let command = BuildCommand::from_template("tool {} {}", "x").unwrap();
        assert_eq!(command.args(), ["x", "{}"]);
    }

    #[test]
    fn test_from_template_empty_is_error() {
        let result = BuildCommand::from_template("   ", "");
        assert!(matches!(result, Err(Error::ExternalProcess { .. })));
    }

    #[test]
    fn test_split_args_quotes() {
        assert_eq!(
            split_args(r#"sh -c "echo one; echo two"  tail"#),
            vec!["sh", "-c", "echo one; echo two", "tail"]
        );
        assert_eq!(split_args(r#"a "" b"#), vec!["a", "", "b"]);
        assert!(split_args("").is_empty());
    }

    #[test]
    fn test_display() {
        let command = BuildCommand::from_template("cargo build --release", "").unwrap();
        assert_eq!(command.to_string(), "cargo build --release");
    }

    #[test]
    fn test_invoke_without_build_command_is_noop() {
        let descriptor = Descriptor::parse("name: acme").unwrap();
        let mut seen = 0;
        let mut sink = |_: &str| seen += 1;
        let status = invoke(
            &descriptor,
            Path::new("."),
            BuildMode::Streaming,
            &mut sink,
        )
        .unwrap();
        assert!(status.is_none());
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_spawn_failure_is_external_process_error() {
        let command = BuildCommand::from_template("build-tools-no-such-program-42", "").unwrap();
        let result = command.run(Path::new("."), BuildMode::Blocking, &mut LogSink);
        assert!(matches!(result, Err(Error::ExternalProcess { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_forwards_each_line() {
        let temp = tempfile::TempDir::new().unwrap();
        let command = BuildCommand::from_template(r#"sh -c "echo one; echo two""#, "").unwrap();

        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());
        let status = command
            .run(temp.path(), BuildMode::Streaming, &mut sink)
            .unwrap();

        assert!(status.success());
        assert_eq!(lines, vec!["one", "two"]);
    }

    /// Yields one line, then fails like a broken pipe
    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "pipe closed",
                ));
            }
            self.served = true;
            let line = b"compiling\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_forward_lines_stops_on_read_error() {
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());

        let result = forward_lines(FailingReader { served: false }, &mut sink);

        assert_eq!(
            result.unwrap_err().kind(),
            std::io::ErrorKind::BrokenPipe
        );
        assert_eq!(lines, vec!["compiling"]);
    }

    #[test]
    fn test_forward_lines_strips_crlf() {
        let mut lines = Vec::new();
        let mut sink = |line: &str| lines.push(line.to_string());

        forward_lines(&b"one\r\ntwo"[..], &mut sink).unwrap();

        assert_eq!(lines, vec!["one", "two"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_not_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let command = BuildCommand::from_template(r#"sh -c "exit 3""#, "").unwrap();

        let status = command
            .run(temp.path(), BuildMode::Blocking, &mut LogSink)
            .unwrap();

        assert_eq!(status.code(), Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_descriptor_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let descriptor =
            Descriptor::parse("solution: built.txt\nbuildcmd: touch {}").unwrap();

        invoke(&descriptor, temp.path(), BuildMode::Blocking, &mut LogSink).unwrap();

        assert!(temp.path().join("built.txt").exists());
    }
}
