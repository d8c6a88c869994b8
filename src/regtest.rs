// src/regtest.rs
//
// Regression test orchestration for one model inside a larger package.
//
// A RegressionTest generates tool-compatible scripts to import and
// simulate the model with CSV output, runs the external tool for both
// phases, and compares the produced CSV against a reference result,
// possibly only on a subset of columns. Phases chain through one log
// file: the import phase's final output line carries the default
// simulation options the simulate script is parameterized with.
//
// Execution is synchronous and sequential; a failure in the import phase
// aborts before simulate, and a simulate failure leaves whatever partial
// output the tool wrote for manual inspection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::compare::{compare_results, CompareError, ComparisonReport};
use crate::invoke::{run_script, InvokeError, LogMode, Tool};
use crate::metadata::{extract_simulation_metadata, MetadataError, SimulationMetadata};
use crate::template::{
    check_rendered, render_file, TemplateError, IMPORT_TOKENS, SIMULATE_TOKENS,
};
use crate::workspace::{CleanupMode, CleanupOutcome, Workspace, WorkspaceError};

/// Default decimal precision for comparisons.
pub const DEFAULT_PRECISION: u32 = 7;

/// Regression test for one model in a package, bound to one simulation
/// tool and one working directory.
///
/// Package and result paths are absolutized at construction and immutable
/// afterwards; the only mutable state is whether the working directory
/// was created by this run (tracked by the [`Workspace`]).
#[derive(Debug)]
pub struct RegressionTest {
    package_folder: PathBuf,
    model_in_package: String,
    result_folder: PathBuf,
    tool: Tool,
    template_folder: PathBuf,
    workspace: Option<Workspace>,
}

impl RegressionTest {
    /// Create a test case.
    ///
    /// `package_folder` holds the package containing the model to test;
    /// `model_in_package` is the model's name within it; `result_folder`
    /// is where generated scripts, the tool log and the tool's output
    /// land. Relative paths are resolved against the current directory
    /// once, here.
    pub fn new(
        package_folder: &Path,
        model_in_package: &str,
        result_folder: &Path,
        tool: Tool,
    ) -> std::io::Result<Self> {
        Ok(Self {
            package_folder: absolutize(package_folder)?,
            model_in_package: model_in_package.to_string(),
            result_folder: absolutize(result_folder)?,
            tool,
            template_folder: default_template_folder(),
            workspace: None,
        })
    }

    /// Override the template folder (tests, custom tool setups).
    pub fn with_template_folder(mut self, folder: &Path) -> Self {
        self.template_folder = folder.to_path_buf();
        self
    }

    /// The model under test.
    pub fn model(&self) -> &str {
        &self.model_in_package
    }

    /// The working directory for this test case.
    pub fn result_folder(&self) -> &Path {
        &self.result_folder
    }

    /// Path the external tool writes the simulation result to.
    pub fn simulation_result_path(&self) -> PathBuf {
        self.result_folder
            .join(format!("{}_res.csv", self.model_in_package))
    }

    /// Import and simulate the model, then compare the produced CSV
    /// against `reference_result` along the validated columns.
    ///
    /// `validated_cols` empty means the intersection of both headers.
    /// Values are equal when they differ by less than `10^(-precision)`.
    /// On success a `run_report.json` summarizing the run is written into
    /// the working directory.
    pub fn compare_result(
        &mut self,
        reference_result: &Path,
        precision: u32,
        validated_cols: &[String],
    ) -> Result<ComparisonReport, RegtestError> {
        println!("\nTesting model {}", self.model_in_package);

        let metadata = self.import_and_simulate()?;
        let simulation_result = self.simulation_result_path();

        println!(
            "Comparing simulation result {} and reference {}",
            simulation_result.display(),
            reference_result.display()
        );

        let report = compare_results(
            reference_result,
            &simulation_result,
            precision,
            validated_cols,
        )?;

        self.write_run_report(&metadata, &report)?;
        Ok(report)
    }

    /// Run the import and simulate phases without comparing.
    ///
    /// Returns the simulation metadata extracted from the import log.
    pub fn import_and_simulate(&mut self) -> Result<SimulationMetadata, RegtestError> {
        println!(
            "Simulating model {} using the simulation tool: {}",
            self.model_in_package, self.tool
        );

        let workspace = Workspace::ensure(&self.result_folder).map_err(|e| RegtestError::Io {
            path: self.result_folder.display().to_string(),
            source: e.to_string(),
        })?;
        self.workspace = Some(workspace);

        let import_script = self.result_folder.join("model_import.mos");
        let simulate_script = self.result_folder.join("model_simulate.mos");
        let log = self.log_path();

        // Import phase: render, run, harvest the options quintuple.
        let mut subs = BTreeMap::new();
        subs.insert(
            "PACKAGE_FOLDER".to_string(),
            path_for_script(&self.package_folder),
        );
        subs.insert(
            "RESULT_FOLDER".to_string(),
            path_for_script(&self.result_folder),
        );
        subs.insert(
            "MODEL_IN_PACKAGE".to_string(),
            self.model_in_package.clone(),
        );

        render_file(
            &self.template_path("model_import.mos.template"),
            &import_script,
            &subs,
        )?;
        check_rendered(&import_script, IMPORT_TOKENS)?;

        run_script(
            self.tool,
            &import_script,
            &log,
            LogMode::Truncate,
            &self.result_folder,
        )?;

        let log_text = fs::read_to_string(&log).map_err(|e| RegtestError::Io {
            path: log.display().to_string(),
            source: e.to_string(),
        })?;
        let metadata = extract_simulation_metadata(&log_text)?;

        // Simulate phase: parameterized by the extracted options.
        subs.insert(
            "SIMULATION_BINARY".to_string(),
            self.tool.simulation_binary(&self.model_in_package),
        );
        subs.insert("START_TIME".to_string(), metadata.start_time.clone());
        subs.insert("STOP_TIME".to_string(), metadata.stop_time.clone());
        subs.insert("TOLERANCE".to_string(), metadata.tolerance.clone());
        subs.insert("NUM_INTERVALS".to_string(), metadata.num_intervals.clone());

        render_file(
            &self.template_path("model_simulate.mos.template"),
            &simulate_script,
            &subs,
        )?;
        check_rendered(&simulate_script, SIMULATE_TOKENS)?;

        run_script(
            self.tool,
            &simulate_script,
            &log,
            LogMode::Append,
            &self.result_folder,
        )?;

        Ok(metadata)
    }

    /// Delete the working directory if this run created it.
    ///
    /// A pre-existing directory is left untouched regardless of `mode`;
    /// so is the case where the pipeline never ran.
    pub fn cleanup(&self, mode: CleanupMode) -> Result<CleanupOutcome, RegtestError> {
        match &self.workspace {
            Some(ws) => Ok(ws.cleanup(mode)?),
            None => {
                println!(
                    "\nThe result folder \n\n\t{}\n\nwas not created by this program. Will not clean up.",
                    self.result_folder.display()
                );
                Ok(CleanupOutcome::RefusedForeign)
            }
        }
    }

    /// Path of the accumulating tool log.
    pub fn log_path(&self) -> PathBuf {
        self.result_folder
            .join(format!("{}_output.txt", self.tool.name()))
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.template_folder.join(self.tool.name()).join(name)
    }

    fn write_run_report(
        &self,
        metadata: &SimulationMetadata,
        comparison: &ComparisonReport,
    ) -> Result<(), RegtestError> {
        let report = RunReport {
            model: self.model_in_package.clone(),
            tool: self.tool.name().to_string(),
            package_folder: self.package_folder.display().to_string(),
            result_folder: self.result_folder.display().to_string(),
            start_time: metadata.start_time.clone(),
            stop_time: metadata.stop_time.clone(),
            tolerance: metadata.tolerance.clone(),
            num_intervals: metadata.num_intervals.clone(),
            interval: metadata.interval.clone(),
            comparison: comparison.clone(),
        };

        let path = self.result_folder.join("run_report.json");
        let file = File::create(&path).map_err(|e| RegtestError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &report).map_err(|e| RegtestError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        writer.flush().map_err(|e| RegtestError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        Ok(())
    }
}

/// JSON summary of one completed regression run, written into the
/// working directory alongside the tool's own output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub model: String,
    pub tool: String,
    pub package_folder: String,
    pub result_folder: String,
    pub start_time: String,
    pub stop_time: String,
    pub tolerance: String,
    pub num_intervals: String,
    pub interval: String,
    pub comparison: ComparisonReport,
}

fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn default_template_folder() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Generated scripts use forward slashes on every platform; the tool's
/// scripting language treats backslashes as escapes.
fn path_for_script(path: &Path) -> String {
    let s = path.display().to_string();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s
    }
}

/// Top-level error for the regression pipeline.
#[derive(Debug)]
pub enum RegtestError {
    Io { path: String, source: String },
    Template(TemplateError),
    Invoke(InvokeError),
    Metadata(MetadataError),
    Compare(CompareError),
    Workspace(WorkspaceError),
}

impl std::fmt::Display for RegtestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegtestError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path, source)
            }
            RegtestError::Template(e) => e.fmt(f),
            RegtestError::Invoke(e) => e.fmt(f),
            RegtestError::Metadata(e) => e.fmt(f),
            RegtestError::Compare(e) => e.fmt(f),
            RegtestError::Workspace(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for RegtestError {}

impl From<TemplateError> for RegtestError {
    fn from(e: TemplateError) -> Self {
        RegtestError::Template(e)
    }
}

impl From<InvokeError> for RegtestError {
    fn from(e: InvokeError) -> Self {
        RegtestError::Invoke(e)
    }
}

impl From<MetadataError> for RegtestError {
    fn from(e: MetadataError) -> Self {
        RegtestError::Metadata(e)
    }
}

impl From<CompareError> for RegtestError {
    fn from(e: CompareError) -> Self {
        RegtestError::Compare(e)
    }
}

impl From<WorkspaceError> for RegtestError {
    fn from(e: WorkspaceError) -> Self {
        RegtestError::Workspace(e)
    }
}
