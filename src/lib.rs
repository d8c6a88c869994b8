//! moregtest core library.
//!
//! A simple regression testing pipeline for Modelica-style simulation
//! models: generate tool-compatible import/simulate scripts from
//! templates, run the external simulation tool against them, and compare
//! its tabular CSV output against a reference result within a numeric
//! tolerance. The binary (`src/main.rs`) is just a thin CLI over the
//! comparator.
//!
//! # Architecture
//!
//! The pipeline is built leaf-first from small, separately testable
//! components:
//!
//! - **Templater** (`template`): whole-file placeholder substitution
//!   producing the import and simulate scripts.
//!
//! - **Invoker** (`invoke`): blocking subprocess runs of the external
//!   tool with combined output captured to an accumulating log.
//!
//! - **Metadata Extractor** (`metadata`): parses the import log's final
//!   line into the simulation-options quintuple that parameterizes the
//!   simulate script. The one deliberately narrow, fragile integration
//!   point.
//!
//! - **Comparator** (`compare`): column-wise element-wise comparison of
//!   two CSV datasets at a decimal-precision-derived threshold.
//!
//! - **Workspace** (`workspace`): working-directory ownership and gated
//!   destructive cleanup.
//!
//! - **RegressionTest** (`regtest`): the orchestration tying the phases
//!   together for one model.

pub mod compare;
pub mod invoke;
pub mod metadata;
pub mod regtest;
pub mod template;
pub mod workspace;

// --- Re-exports for ergonomic external use ---------------------------------

pub use compare::{compare_results, ComparisonReport, Dataset};
pub use invoke::Tool;
pub use metadata::{extract_simulation_metadata, SimulationMetadata};
pub use regtest::{RegressionTest, RegtestError, DEFAULT_PRECISION};
pub use workspace::{CleanupMode, CleanupOutcome, Workspace};
