//! Process runner abstraction
//!
//! The flashing tool is the only way the core touches hardware, so it is
//! reached through [`ToolRunner`]. [`ProcessRunner`] spawns the real tool;
//! tests swap in a runner that records the arguments and replays canned
//! results.

use crate::tool::FlashTool;
use std::io;

/// What a finished tool invocation reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// A run that exited with status 0
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited with `code` and wrote `stderr`
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the flashing tool with a given argument list
pub trait ToolRunner {
    /// Run the tool to completion
    ///
    /// Blocks until the process exits. An `Err` means the process could not
    /// be started or waited on; a non-zero exit is an `Ok` output.
    fn invoke(&mut self, args: &[String]) -> io::Result<ToolOutput>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &mut R {
    fn invoke(&mut self, args: &[String]) -> io::Result<ToolOutput> {
        (**self).invoke(args)
    }
}

impl<R: ToolRunner + ?Sized> ToolRunner for Box<R> {
    fn invoke(&mut self, args: &[String]) -> io::Result<ToolOutput> {
        (**self).invoke(args)
    }
}

/// Spawns the located tool as a child process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    tool: FlashTool,
}

impl ProcessRunner {
    pub fn new(tool: FlashTool) -> Self {
        Self { tool }
    }
}

impl ToolRunner for ProcessRunner {
    fn invoke(&mut self, args: &[String]) -> io::Result<ToolOutput> {
        log::debug!("Running: {} {}", self.tool, args.join(" "));

        let output = self.tool.command().args(args).output()?;
        let result = ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        log::trace!("Tool stdout:\n{}", result.stdout);
        log::debug!("Tool exited with {:?}", result.exit_code);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status() {
        assert!(ToolOutput::success("done").is_success());
        assert!(!ToolOutput::failure(2, "boom").is_success());
        assert!(!ToolOutput::default().is_success());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let tool = FlashTool::Executable("/nonexistent/idflasher-test/esptool.py".into());
        let mut runner = ProcessRunner::new(tool);
        let err = runner.invoke(&["version".to_string()]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
