// src/invoke.rs
//
// Blocking invocation of the external simulation tool.
//
// The tool is an opaque executable: we hand it a generated script, collect
// everything it prints into an accumulating log file, and wait for it to
// exit. The import and simulate phases share one log; import truncates it,
// simulate appends, so the import phase's final line stays readable for
// metadata extraction in between.
//
// The child runs with its own `current_dir` and absolute script/log paths.
// The parent's working directory is never touched, so independent test
// cases can run in parallel from one process.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::Command;

/// Supported simulation tools. Currently exactly one: the OpenModelica
/// compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Omc,
}

impl Tool {
    /// Parse a tool by name.
    pub fn from_name(name: &str) -> Result<Self, InvokeError> {
        match name {
            "omc" => Ok(Tool::Omc),
            other => Err(InvokeError::UnknownTool {
                name: other.to_string(),
            }),
        }
    }

    /// Canonical tool name, also the template subdirectory name.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Omc => "omc",
        }
    }

    /// Executable name for the current platform.
    pub fn executable_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name())
        } else {
            self.name().to_string()
        }
    }

    /// Value for the SIMULATION_BINARY placeholder: how the generated
    /// simulate script invokes the compiled model executable.
    pub fn simulation_binary(&self, model: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", model)
        } else {
            format!("./{}", model)
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How to open the log file for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Start a fresh log (import phase).
    Truncate,
    /// Append to the existing log (simulate phase).
    Append,
}

/// Run `<tool executable> <script>` in `workdir`, sending the child's
/// stdout and stderr to `log`.
///
/// Blocks until the child exits; there is no timeout, so a hung tool hangs
/// the pipeline. A nonzero exit status is fatal.
pub fn run_script(
    tool: Tool,
    script: &Path,
    log: &Path,
    mode: LogMode,
    workdir: &Path,
) -> Result<(), InvokeError> {
    let log_file = open_log(log, mode)?;
    let log_for_stderr = log_file.try_clone().map_err(|e| InvokeError::Log {
        path: log.display().to_string(),
        source: e.to_string(),
    })?;

    let status = Command::new(tool.executable_name())
        .arg(script)
        .current_dir(workdir)
        .stdout(log_file)
        .stderr(log_for_stderr)
        .status()
        .map_err(|e| InvokeError::Spawn {
            tool,
            source: e.to_string(),
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(InvokeError::ToolFailed {
            tool,
            script: script.display().to_string(),
            status: status.code(),
        })
    }
}

fn open_log(log: &Path, mode: LogMode) -> Result<File, InvokeError> {
    let result = match mode {
        LogMode::Truncate => File::create(log),
        LogMode::Append => OpenOptions::new().create(true).append(true).open(log),
    };
    result.map_err(|e| InvokeError::Log {
        path: log.display().to_string(),
        source: e.to_string(),
    })
}

/// Errors from tool invocation.
#[derive(Debug, Clone)]
pub enum InvokeError {
    UnknownTool {
        name: String,
    },
    Log {
        path: String,
        source: String,
    },
    Spawn {
        tool: Tool,
        source: String,
    },
    ToolFailed {
        tool: Tool,
        script: String,
        status: Option<i32>,
    },
}

impl std::fmt::Display for InvokeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvokeError::UnknownTool { name } => {
                write!(f, "Unknown simulation tool '{}' (supported: omc)", name)
            }
            InvokeError::Log { path, source } => {
                write!(f, "Cannot open tool log '{}': {}", path, source)
            }
            InvokeError::Spawn { tool, source } => {
                write!(f, "Failed to start simulation tool '{}': {}", tool, source)
            }
            InvokeError::ToolFailed {
                tool,
                script,
                status,
            } => match status {
                Some(code) => write!(
                    f,
                    "Simulation tool '{}' exited with status {} on script {}",
                    tool, code, script
                ),
                None => write!(
                    f,
                    "Simulation tool '{}' was terminated by a signal on script {}",
                    tool, script
                ),
            },
        }
    }
}

impl std::error::Error for InvokeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_from_name() {
        assert_eq!(Tool::from_name("omc").expect("known tool"), Tool::Omc);
        assert!(matches!(
            Tool::from_name("dymola"),
            Err(InvokeError::UnknownTool { .. })
        ));
    }

    #[test]
    fn test_executable_name_platform_suffix() {
        let exe = Tool::Omc.executable_name();
        if cfg!(windows) {
            assert_eq!(exe, "omc.exe");
        } else {
            assert_eq!(exe, "omc");
        }
    }

    #[test]
    fn test_simulation_binary_platform_form() {
        let bin = Tool::Omc.simulation_binary("MyModel");
        if cfg!(windows) {
            assert_eq!(bin, "MyModel.exe");
        } else {
            assert_eq!(bin, "./MyModel");
        }
    }

    #[test]
    fn test_log_open_failure_in_missing_directory() {
        let result = open_log(Path::new("/nonexistent-dir/log.txt"), LogMode::Truncate);
        assert!(matches!(result, Err(InvokeError::Log { .. })));
    }
}
