// src/metadata.rs
//
// Extraction of simulation metadata from the import-phase tool log.
//
// After the import script runs, the tool prints the model's default
// simulation options as its final output line, a parenthesized quintuple:
//
//     (0.0,1.0,1e-06,500,0.002)
//
// in the fixed order start time, stop time, tolerance, number of
// intervals, interval size. This is an undocumented external-tool output
// convention and the principal fragility point of the whole pipeline, so
// the parsing lives behind this one narrow function. Any failure here is
// a fatal setup error, never retryable.

/// Default simulation options recovered from the import log.
///
/// Fields stay strings: they are injected verbatim into the simulate
/// template, and reformatting them through a float round-trip could change
/// what the tool sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationMetadata {
    pub start_time: String,
    pub stop_time: String,
    pub tolerance: String,
    pub num_intervals: String,
    pub interval: String,
}

/// Parse the last non-empty line of `log_text` as a simulation-options
/// quintuple.
///
/// Strips one leading '(' and one trailing ')', splits on ',' and trims
/// each field. Exactly five fields are required; anything else is a
/// [`MetadataError::MalformedLine`].
pub fn extract_simulation_metadata(log_text: &str) -> Result<SimulationMetadata, MetadataError> {
    let line = log_text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or(MetadataError::EmptyLog)?
        .trim();

    let inner = line.strip_prefix('(').unwrap_or(line);
    let inner = inner.strip_suffix(')').unwrap_or(inner);

    let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return Err(MetadataError::MalformedLine {
            line: line.to_string(),
            fields: fields.len(),
        });
    }

    Ok(SimulationMetadata {
        start_time: fields[0].to_string(),
        stop_time: fields[1].to_string(),
        tolerance: fields[2].to_string(),
        num_intervals: fields[3].to_string(),
        interval: fields[4].to_string(),
    })
}

/// Errors from metadata extraction.
#[derive(Debug, Clone)]
pub enum MetadataError {
    /// The log contained no non-empty line.
    EmptyLog,
    /// The final line did not split into exactly five fields.
    MalformedLine { line: String, fields: usize },
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::EmptyLog => {
                write!(f, "Import log is empty; no simulation options to extract")
            }
            MetadataError::MalformedLine { line, fields } => {
                write!(
                    f,
                    "Import log's final line '{}' has {} comma-separated fields, expected 5",
                    line, fields
                )
            }
        }
    }
}

impl std::error::Error for MetadataError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_well_formed_quintuple() {
        let log = "Loading package...\nbuildModel done\n(0.0,1.0,1e-06,500,0.002)\n";
        let meta = extract_simulation_metadata(log).expect("should parse");
        assert_eq!(meta.start_time, "0.0");
        assert_eq!(meta.stop_time, "1.0");
        assert_eq!(meta.tolerance, "1e-06");
        assert_eq!(meta.num_intervals, "500");
        assert_eq!(meta.interval, "0.002");
    }

    #[test]
    fn test_extract_skips_trailing_blank_lines() {
        let log = "(1.5, 2.5, 1e-08, 1000, 0.001)\n\n   \n";
        let meta = extract_simulation_metadata(log).expect("should parse");
        assert_eq!(meta.start_time, "1.5");
        assert_eq!(meta.num_intervals, "1000");
    }

    #[test]
    fn test_extract_trims_field_whitespace() {
        let meta = extract_simulation_metadata("( 0.0 , 10.0 , 1e-06 , 500 , 0.02 )")
            .expect("should parse");
        assert_eq!(meta.stop_time, "10.0");
        assert_eq!(meta.interval, "0.02");
    }

    #[test]
    fn test_extract_wrong_field_count_fails() {
        let result = extract_simulation_metadata("(0.0,1.0,1e-06,500)");
        match result {
            Err(MetadataError::MalformedLine { fields, .. }) => assert_eq!(fields, 4),
            other => panic!("expected MalformedLine, got {:?}", other),
        }

        let result = extract_simulation_metadata("(0.0,1.0,1e-06,500,0.002,extra)");
        match result {
            Err(MetadataError::MalformedLine { fields, .. }) => assert_eq!(fields, 6),
            other => panic!("expected MalformedLine, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_plain_text_final_line_fails() {
        let result = extract_simulation_metadata("Error: model not found\n");
        assert!(matches!(
            result,
            Err(MetadataError::MalformedLine { fields: 1, .. })
        ));
    }

    #[test]
    fn test_extract_empty_log_fails() {
        assert!(matches!(
            extract_simulation_metadata(""),
            Err(MetadataError::EmptyLog)
        ));
        assert!(matches!(
            extract_simulation_metadata("\n \n"),
            Err(MetadataError::EmptyLog)
        ));
    }
}
