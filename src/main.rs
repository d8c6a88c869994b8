// src/main.rs
//
// Thin CLI entrypoint for moregtest.
//
// The core pipeline lives in the library; the binary only exposes the
// comparator for ad-hoc use:
//
//     moregtest compare <reference.csv> <result.csv> \
//         [--precision 7] [--validated-cols a,b,c]
//
// Exit code 0 on a passing comparison, 1 with the error printed on any
// failure (including a tolerance violation).

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use moregtest::{compare_results, DEFAULT_PRECISION};

#[derive(Debug, Parser)]
#[command(
    name = "moregtest",
    about = "Regression testing for simulation models: compare simulation CSV results within a numeric tolerance",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare a produced result CSV against a reference CSV.
    Compare {
        /// Reference result file (comma-delimited, with header).
        reference: PathBuf,

        /// Produced result file to validate against the reference.
        result: PathBuf,

        /// Decimal precision: values are equal when they differ by less
        /// than 10^(-precision).
        #[arg(long, default_value_t = DEFAULT_PRECISION)]
        precision: u32,

        /// Comma-separated column names to validate.
        /// If omitted, the intersection of both headers is used.
        #[arg(long, value_delimiter = ',')]
        validated_cols: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Compare {
            reference,
            result,
            precision,
            validated_cols,
        } => {
            let report = compare_results(&reference, &result, precision, &validated_cols)
                .context("comparison failed")?;
            println!(
                "OK: {} column(s) within 10^-{} over {} row(s)",
                report.compared_cols.len(),
                report.precision,
                report.rows
            );
        }
    }

    Ok(())
}
