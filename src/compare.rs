// src/compare.rs
//
// Column-wise numeric comparison of simulation results.
//
// Both sides are comma-delimited files with a header row; every cell in a
// compared column must parse as f64. Columns are compared element-wise by
// row position — there is no join key, no interpolation and no resampling,
// so misaligned time grids are the caller's problem to fix upstream.
//
// The set of compared columns is either an explicit caller-supplied list
// or the intersection of the two headers. The intersection is a set:
// membership drives the check, iteration order carries no meaning (the
// BTreeMap backing just makes it deterministic).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A loaded tabular dataset: named columns of f64 with a shared implicit
/// row index.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: BTreeMap<String, Vec<f64>>,
    rows: usize,
}

impl Dataset {
    /// Load a comma-delimited file with a header row.
    pub fn from_csv_file(path: &Path) -> Result<Self, CompareError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| CompareError::Io {
                path: path.display().to_string(),
                source: e.to_string(),
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| CompareError::Parse {
                path: path.display().to_string(),
                source: e.to_string(),
            })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut columns: BTreeMap<String, Vec<f64>> =
            headers.iter().map(|h| (h.clone(), Vec::new())).collect();
        let mut rows = 0usize;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| CompareError::Parse {
                path: path.display().to_string(),
                source: e.to_string(),
            })?;
            for (col_idx, cell) in record.iter().enumerate() {
                let header = match headers.get(col_idx) {
                    Some(h) => h,
                    // Extra unheadered cells: csv reports ragged rows as
                    // errors already, this is unreachable in practice.
                    None => continue,
                };
                let value: f64 = cell.parse().map_err(|_| CompareError::BadNumber {
                    path: path.display().to_string(),
                    column: header.clone(),
                    row: row_idx,
                    cell: cell.to_string(),
                })?;
                if let Some(col) = columns.get_mut(header) {
                    col.push(value);
                }
            }
            rows += 1;
        }

        Ok(Self { columns, rows })
    }

    /// Number of data rows (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column names, sorted.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Sorted intersection of this dataset's column names with another's.
    pub fn common_columns(&self, other: &Dataset) -> Vec<String> {
        self.columns
            .keys()
            .filter(|k| other.columns.contains_key(*k))
            .cloned()
            .collect()
    }
}

/// Summary of a successful comparison, suitable for the JSON run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Columns actually checked.
    pub compared_cols: Vec<String>,
    /// Rows compared per column.
    pub rows: usize,
    /// Decimal precision the comparison was run at.
    pub precision: u32,
}

/// Compare the produced dataset against the reference dataset.
///
/// `validated_cols` non-empty selects exactly those columns (each must
/// exist in both files); empty falls back to the header intersection. An
/// empty intersection with no explicit list compares nothing and succeeds
/// trivially — a documented edge case and a known source of false passes,
/// so the report's `compared_cols` makes it visible.
///
/// Two values match when `|result - reference| < 10^(-precision)`, with
/// the one exception that a NaN pair counts as equal. The first violation
/// aborts the comparison, naming the column, row and both values.
pub fn compare_results(
    reference: &Path,
    result: &Path,
    precision: u32,
    validated_cols: &[String],
) -> Result<ComparisonReport, CompareError> {
    let ref_data = Dataset::from_csv_file(reference)?;
    let result_data = Dataset::from_csv_file(result)?;

    let cols: Vec<String> = if validated_cols.is_empty() {
        ref_data.common_columns(&result_data)
    } else {
        validated_cols.to_vec()
    };

    let threshold = 10f64.powi(-(precision as i32));
    let mut rows_compared = 0usize;

    for col in &cols {
        println!("Comparing column \"{}\"", col);

        let ref_col = ref_data
            .column(col)
            .ok_or_else(|| CompareError::MissingColumn {
                column: col.clone(),
                path: reference.display().to_string(),
            })?;
        let result_col = result_data
            .column(col)
            .ok_or_else(|| CompareError::MissingColumn {
                column: col.clone(),
                path: result.display().to_string(),
            })?;

        if ref_col.len() != result_col.len() {
            return Err(CompareError::RowCountMismatch {
                column: col.clone(),
                reference_rows: ref_col.len(),
                result_rows: result_col.len(),
            });
        }

        for (row, (actual, expected)) in result_col.iter().zip(ref_col.iter()).enumerate() {
            if actual.is_nan() && expected.is_nan() {
                continue;
            }
            if !((actual - expected).abs() < threshold) {
                return Err(CompareError::Exceeded {
                    column: col.clone(),
                    row,
                    actual: *actual,
                    expected: *expected,
                    threshold,
                });
            }
        }
        rows_compared = ref_col.len();
    }

    Ok(ComparisonReport {
        compared_cols: cols,
        rows: rows_compared,
        precision,
    })
}

/// Errors from dataset loading and comparison.
#[derive(Debug, Clone)]
pub enum CompareError {
    Io {
        path: String,
        source: String,
    },
    Parse {
        path: String,
        source: String,
    },
    BadNumber {
        path: String,
        column: String,
        row: usize,
        cell: String,
    },
    MissingColumn {
        column: String,
        path: String,
    },
    RowCountMismatch {
        column: String,
        reference_rows: usize,
        result_rows: usize,
    },
    /// A value pair differed by at least the precision threshold.
    Exceeded {
        column: String,
        row: usize,
        actual: f64,
        expected: f64,
        threshold: f64,
    },
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareError::Io { path, source } => {
                write!(f, "Cannot read result file '{}': {}", path, source)
            }
            CompareError::Parse { path, source } => {
                write!(f, "Cannot parse result file '{}': {}", path, source)
            }
            CompareError::BadNumber {
                path,
                column,
                row,
                cell,
            } => write!(
                f,
                "Non-numeric cell '{}' in column \"{}\", row {} of '{}'",
                cell, column, row, path
            ),
            CompareError::MissingColumn { column, path } => {
                write!(f, "Column \"{}\" not present in '{}'", column, path)
            }
            CompareError::RowCountMismatch {
                column,
                reference_rows,
                result_rows,
            } => write!(
                f,
                "Column \"{}\" has {} rows in the reference but {} in the result",
                column, reference_rows, result_rows
            ),
            CompareError::Exceeded {
                column,
                row,
                actual,
                expected,
                threshold,
            } => write!(
                f,
                "Column \"{}\" deviates at row {}: result {} vs reference {} (threshold {:e})",
                column, row, actual, expected, threshold
            ),
        }
    }
}

impl std::error::Error for CompareError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write csv fixture");
        path
    }

    #[test]
    fn test_dataset_loads_columns_and_rows() {
        let dir = tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "a.csv", "time,y\n0.0,1.0\n0.5,2.0\n1.0,3.0\n");

        let data = Dataset::from_csv_file(&path).expect("load");
        assert_eq!(data.rows(), 3);
        assert_eq!(data.column_names(), vec!["time", "y"]);
        assert_eq!(data.column("y").expect("column y"), &[1.0, 2.0, 3.0]);
        assert!(data.column("z").is_none());
    }

    #[test]
    fn test_dataset_rejects_non_numeric_cell() {
        let dir = tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "bad.csv", "time,y\n0.0,oops\n");

        let result = Dataset::from_csv_file(&path);
        match result {
            Err(CompareError::BadNumber { column, row, cell, .. }) => {
                assert_eq!(column, "y");
                assert_eq!(row, 0);
                assert_eq!(cell, "oops");
            }
            other => panic!("expected BadNumber, got {:?}", other),
        }
    }

    #[test]
    fn test_self_comparison_succeeds_at_any_precision() {
        let dir = tempdir().expect("tempdir");
        let path = write_csv(dir.path(), "a.csv", "time,y\n0.0,1.0\n0.5,2.0\n");

        for precision in [0, 7, 12] {
            let report = compare_results(&path, &path, precision, &[]).expect("self compare");
            assert_eq!(report.compared_cols, vec!["time", "y"]);
            assert_eq!(report.rows, 2);
        }
    }

    #[test]
    fn test_epsilon_difference_pass_fail_boundary() {
        let dir = tempdir().expect("tempdir");
        // y differs by exactly 1e-4 in the second row.
        let reference = write_csv(dir.path(), "ref.csv", "y\n1.0\n2.0\n");
        let produced = write_csv(dir.path(), "res.csv", "y\n1.0\n2.0001\n");

        // 10^-3 > 1e-4: passes.
        compare_results(&reference, &produced, 3, &[]).expect("coarse precision should pass");

        // 10^-4 <= 1e-4: fails naming column y.
        let result = compare_results(&reference, &produced, 4, &[]);
        match result {
            Err(CompareError::Exceeded { column, row, .. }) => {
                assert_eq!(column, "y");
                assert_eq!(row, 1);
            }
            other => panic!("expected Exceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_columns_ignore_other_differences() {
        let dir = tempdir().expect("tempdir");
        let reference = write_csv(dir.path(), "ref.csv", "a,b\n1.0,10.0\n");
        let produced = write_csv(dir.path(), "res.csv", "a,b\n1.0,99.0\n");

        // b differs wildly, but only a is validated.
        let report = compare_results(&reference, &produced, 7, &["a".to_string()])
            .expect("validated subset should pass");
        assert_eq!(report.compared_cols, vec!["a"]);

        assert!(compare_results(&reference, &produced, 7, &[]).is_err());
    }

    #[test]
    fn test_explicit_missing_column_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let reference = write_csv(dir.path(), "ref.csv", "a\n1.0\n");
        let produced = write_csv(dir.path(), "res.csv", "a\n1.0\n");

        let result = compare_results(&reference, &produced, 7, &["ghost".to_string()]);
        assert!(matches!(result, Err(CompareError::MissingColumn { .. })));
    }

    #[test]
    fn test_disjoint_headers_trivially_succeed() {
        let dir = tempdir().expect("tempdir");
        let reference = write_csv(dir.path(), "ref.csv", "a\n1.0\n");
        let produced = write_csv(dir.path(), "res.csv", "b\n2.0\n");

        // No overlap, no explicit list: compares nothing, reports it.
        let report = compare_results(&reference, &produced, 7, &[]).expect("trivial pass");
        assert!(report.compared_cols.is_empty());
    }

    #[test]
    fn test_row_count_mismatch_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let reference = write_csv(dir.path(), "ref.csv", "y\n1.0\n2.0\n");
        let produced = write_csv(dir.path(), "res.csv", "y\n1.0\n");

        let result = compare_results(&reference, &produced, 7, &[]);
        assert!(matches!(result, Err(CompareError::RowCountMismatch { .. })));
    }

    #[test]
    fn test_nan_pairs_compare_equal() {
        let dir = tempdir().expect("tempdir");
        let reference = write_csv(dir.path(), "ref.csv", "y\nNaN\n2.0\n");
        let produced = write_csv(dir.path(), "res.csv", "y\nNaN\n2.0\n");

        compare_results(&reference, &produced, 7, &[]).expect("NaN == NaN");

        // NaN against a number still fails.
        let mixed = write_csv(dir.path(), "mixed.csv", "y\n1.0\n2.0\n");
        assert!(compare_results(&reference, &mixed, 7, &[]).is_err());
    }

    #[test]
    fn test_end_to_end_precision_scenario() {
        let dir = tempdir().expect("tempdir");
        let reference = write_csv(dir.path(), "ref.csv", "y\n1.0\n2.0\n3.0\n");
        let produced = write_csv(dir.path(), "res.csv", "y\n1.00000001\n2.0\n3.0\n");

        compare_results(&reference, &produced, 7, &[]).expect("precision 7 should pass");

        let result = compare_results(&reference, &produced, 9, &[]);
        match result {
            Err(CompareError::Exceeded { column, .. }) => assert_eq!(column, "y"),
            other => panic!("expected Exceeded on y, got {:?}", other),
        }
    }
}
