// src/workspace.rs
//
// Working-directory ownership for one test case.
//
// The workspace holds generated scripts, the tool log and the tool's CSV
// output. Cleanup is destructive (recursive delete, no backup), so it is
// gated twice: it only ever touches a directory this run created, and by
// default it asks for interactive confirmation first. A directory that
// pre-existed is never deleted, whatever the caller asks for.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Confirmation attempts before giving up on an unintelligible answer.
const MAX_CONFIRMATION_ASKS: u32 = 5;

/// How cleanup decides whether to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Ask a yes/no question on stdin before deleting.
    Confirm,
    /// Delete without asking.
    Force,
}

/// What cleanup actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The directory was deleted.
    Deleted,
    /// The user answered no; the directory was kept.
    Kept,
    /// The directory pre-existed this run; deletion refused.
    RefusedForeign,
}

/// A test case's working directory, with ownership tracking.
#[derive(Debug, Clone)]
pub struct Workspace {
    path: PathBuf,
    created: bool,
}

impl Workspace {
    /// Ensure `path` exists, recording whether this call created it.
    pub fn ensure(path: &Path) -> io::Result<Self> {
        let created = if path.exists() {
            false
        } else {
            fs::create_dir_all(path)?;
            true
        };
        Ok(Self {
            path: path.to_path_buf(),
            created,
        })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `ensure` created the directory (as opposed to finding it).
    pub fn created_by_this_run(&self) -> bool {
        self.created
    }

    /// Delete the workspace, subject to ownership and confirmation.
    ///
    /// A pre-existing directory is refused unconditionally. With
    /// [`CleanupMode::Confirm`] the question is asked on stdin; answering
    /// no keeps the directory. Deletion is irreversible.
    pub fn cleanup(&self, mode: CleanupMode) -> Result<CleanupOutcome, WorkspaceError> {
        if !self.created {
            println!(
                "\nThe result folder \n\n\t{}\n\nwas not created by this program. Will not clean up.",
                self.path.display()
            );
            return Ok(CleanupOutcome::RefusedForeign);
        }

        if mode == CleanupMode::Confirm {
            let question = format!(
                "\nDo you want to delete the folder \n\n\t{}\n\nand all its subfolders?",
                self.path.display()
            );
            let stdin = io::stdin();
            let do_delete = ask_confirmation(&question, MAX_CONFIRMATION_ASKS, stdin.lock())?;
            if !do_delete {
                return Ok(CleanupOutcome::Kept);
            }
        }

        fs::remove_dir_all(&self.path).map_err(|e| WorkspaceError::Io {
            path: self.path.display().to_string(),
            source: e.to_string(),
        })?;
        Ok(CleanupOutcome::Deleted)
    }
}

/// Ask a yes/no question, reading answers from `input`.
///
/// Re-asks on anything other than `yes` or `no` (trimmed, lowercased), up
/// to `max_asks` attempts. Exhausting the budget without a valid answer is
/// an error, not a default.
pub fn ask_confirmation<R: BufRead>(
    question: &str,
    max_asks: u32,
    mut input: R,
) -> Result<bool, WorkspaceError> {
    for _ in 0..max_asks {
        print!("{} [yes|no] ", question);
        let _ = io::stdout().flush();

        let mut answer = String::new();
        let read = input.read_line(&mut answer).map_err(|e| WorkspaceError::Io {
            path: "<stdin>".to_string(),
            source: e.to_string(),
        })?;
        if read == 0 {
            // Input exhausted; keep asking would loop on EOF.
            break;
        }

        match answer.trim().to_lowercase().as_str() {
            "yes" => return Ok(true),
            "no" => return Ok(false),
            _ => continue,
        }
    }

    Err(WorkspaceError::NoValidAnswer {
        question: question.to_string(),
    })
}

/// Errors from workspace management.
#[derive(Debug, Clone)]
pub enum WorkspaceError {
    Io { path: String, source: String },
    NoValidAnswer { question: String },
}

impl std::fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceError::Io { path, source } => {
                write!(f, "Workspace I/O error on '{}': {}", path, source)
            }
            WorkspaceError::NoValidAnswer { question } => {
                write!(f, "Answer to question \"{}\" not understood.", question)
            }
        }
    }
}

impl std::error::Error for WorkspaceError {}
