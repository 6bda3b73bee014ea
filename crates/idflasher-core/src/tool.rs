//! Locating the esptool executable
//!
//! esptool ships as `esptool.exe` on Windows and as the `esptool.py` script
//! elsewhere. When neither is on `PATH` the tool is assumed to be installed as
//! a Python module and is run through the interpreter instead, so a missing
//! binary is only discovered when the first flash is attempted.

use once_cell::sync::OnceCell;
use std::env;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Executable name looked up on `PATH`
#[cfg(windows)]
pub const TOOL_EXECUTABLE: &str = "esptool.exe";
/// Executable name looked up on `PATH`
#[cfg(not(windows))]
pub const TOOL_EXECUTABLE: &str = "esptool.py";

#[cfg(windows)]
const PYTHON: &str = "python";
#[cfg(not(windows))]
const PYTHON: &str = "python3";

/// Module name used for the launcher fallback
const TOOL_MODULE: &str = "esptool";

/// How to start the flashing tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashTool {
    /// A standalone executable
    Executable(PathBuf),
    /// A launcher program plus the arguments that select the tool
    Launcher { program: String, args: Vec<String> },
}

impl FlashTool {
    /// Resolve the tool from the current `PATH`
    pub fn locate() -> Self {
        Self::locate_in(env::var_os("PATH").as_deref(), TOOL_EXECUTABLE)
    }

    /// Resolve `executable` from an explicit search path
    ///
    /// Directories are searched in order and the first regular file named
    /// `executable` wins. Without a match the module launcher is returned.
    pub fn locate_in(search_path: Option<&OsStr>, executable: &str) -> Self {
        if let Some(found) = search_path.and_then(|p| find_in_path(p, executable)) {
            log::debug!("Found {} at {}", executable, found.display());
            return FlashTool::Executable(found);
        }

        log::warn!(
            "{} not found on PATH, falling back to `{} -m {}`",
            executable,
            PYTHON,
            TOOL_MODULE
        );
        Self::module_launcher()
    }

    /// The process-wide tool, resolved on first use
    pub fn system() -> &'static FlashTool {
        static TOOL: OnceCell<FlashTool> = OnceCell::new();
        TOOL.get_or_init(Self::locate)
    }

    /// Run esptool as a Python module
    pub fn module_launcher() -> Self {
        FlashTool::Launcher {
            program: PYTHON.to_string(),
            args: vec!["-m".to_string(), TOOL_MODULE.to_string()],
        }
    }

    /// Build a command with the program and any launcher arguments filled in
    pub fn command(&self) -> Command {
        match self {
            FlashTool::Executable(path) => Command::new(path),
            FlashTool::Launcher { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
        }
    }
}

impl fmt::Display for FlashTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashTool::Executable(path) => write!(f, "{}", path.display()),
            FlashTool::Launcher { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

fn find_in_path(search_path: &OsStr, executable: &str) -> Option<PathBuf> {
    env::split_paths(search_path)
        .map(|dir| dir.join(executable))
        .find(|candidate| is_file(candidate))
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;

    fn join(dirs: &[&Path]) -> OsString {
        env::join_paths(dirs).unwrap()
    }

    #[test]
    fn test_first_match_in_path_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        fs::write(first.path().join("esptool.py"), b"").unwrap();
        fs::write(second.path().join("esptool.py"), b"").unwrap();

        let path = join(&[empty.path(), second.path(), first.path()]);
        let tool = FlashTool::locate_in(Some(path.as_os_str()), "esptool.py");
        assert_eq!(
            tool,
            FlashTool::Executable(second.path().join("esptool.py"))
        );
    }

    #[test]
    fn test_directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("esptool.py")).unwrap();

        let path = join(&[dir.path()]);
        let tool = FlashTool::locate_in(Some(path.as_os_str()), "esptool.py");
        assert_eq!(tool, FlashTool::module_launcher());
    }

    #[test]
    fn test_fallback_without_path() {
        assert_eq!(
            FlashTool::locate_in(None, "esptool.py"),
            FlashTool::module_launcher()
        );
    }

    #[test]
    fn test_display() {
        let tool = FlashTool::module_launcher();
        assert_eq!(tool.to_string(), format!("{} -m esptool", PYTHON));

        let tool = FlashTool::Executable(PathBuf::from("/usr/bin/esptool.py"));
        assert_eq!(tool.to_string(), "/usr/bin/esptool.py");
    }

    #[test]
    fn test_system_is_resolved_once() {
        let a = FlashTool::system();
        let b = FlashTool::system();
        assert!(std::ptr::eq(a, b));
    }
}
