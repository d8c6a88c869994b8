// src/template.rs
//
// Script templating for generated simulation tool scripts.
//
// A template is an ordinary text file containing literal placeholder
// tokens (e.g. PACKAGE_FOLDER). Rendering is a whole-file substitution:
// read everything, replace each token with its value, truncate and
// rewrite the destination. There is no pattern language and no escaping;
// overlapping tokens are avoided by construction of the token inventory.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Placeholder tokens consumed by the import-phase template.
pub const IMPORT_TOKENS: &[&str] = &["PACKAGE_FOLDER", "RESULT_FOLDER", "MODEL_IN_PACKAGE"];

/// Placeholder tokens consumed by the simulate-phase template.
pub const SIMULATE_TOKENS: &[&str] = &[
    "SIMULATION_BINARY",
    "START_TIME",
    "STOP_TIME",
    "TOLERANCE",
    "NUM_INTERVALS",
];

/// Render a template file into `dest`, replacing every occurrence of each
/// key in `substitutions` with its value.
///
/// Substitutions are applied in map iteration order (sorted, since the map
/// is a `BTreeMap`); a later replacement does not re-scan text produced by
/// an earlier one. Tokens absent from the map are left in place untouched —
/// callers that need full coverage check with [`unreplaced_tokens`]
/// afterwards.
pub fn render_file(
    template: &Path,
    dest: &Path,
    substitutions: &BTreeMap<String, String>,
) -> Result<(), TemplateError> {
    let mut contents = fs::read_to_string(template).map_err(|e| TemplateError::Io {
        path: template.display().to_string(),
        source: e.to_string(),
    })?;

    for (token, value) in substitutions {
        contents = contents.replace(token.as_str(), value);
    }

    fs::write(dest, contents).map_err(|e| TemplateError::Io {
        path: dest.display().to_string(),
        source: e.to_string(),
    })
}

/// Return the subset of `known` tokens still present in `content`.
///
/// Used after rendering to catch an incomplete substitution map before the
/// external tool fails on a script that still contains raw placeholders.
pub fn unreplaced_tokens(content: &str, known: &[&str]) -> Vec<String> {
    known
        .iter()
        .filter(|t| content.contains(**t))
        .map(|t| (*t).to_string())
        .collect()
}

/// Check a rendered script file for leftover tokens from `known`.
///
/// Non-empty leftovers are a hard error: the script would be handed to the
/// external tool with raw placeholders in it.
pub fn check_rendered(script: &Path, known: &[&str]) -> Result<(), TemplateError> {
    let contents = fs::read_to_string(script).map_err(|e| TemplateError::Io {
        path: script.display().to_string(),
        source: e.to_string(),
    })?;

    let leftover = unreplaced_tokens(&contents, known);
    if leftover.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::UnreplacedTokens {
            path: script.display().to_string(),
            tokens: leftover,
        })
    }
}

/// Errors from template rendering.
#[derive(Debug, Clone)]
pub enum TemplateError {
    Io { path: String, source: String },
    UnreplacedTokens { path: String, tokens: Vec<String> },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::Io { path, source } => {
                write!(f, "Template I/O error on '{}': {}", path, source)
            }
            TemplateError::UnreplacedTokens { path, tokens } => {
                write!(
                    f,
                    "Rendered script '{}' still contains placeholder tokens: {}",
                    path,
                    tokens.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn subs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let dir = tempdir().expect("tempdir");
        let template = dir.path().join("script.mos.template");
        let dest = dir.path().join("script.mos");
        std::fs::write(
            &template,
            "loadFile(\"PACKAGE_FOLDER/package.mo\");\ncd(\"RESULT_FOLDER\");\nbuildModel(MODEL_IN_PACKAGE);\n// MODEL_IN_PACKAGE again\n",
        )
        .expect("write template");

        let map = subs(&[
            ("PACKAGE_FOLDER", "/tmp/pkg"),
            ("RESULT_FOLDER", "/tmp/out"),
            ("MODEL_IN_PACKAGE", "MyLib.MyModel"),
        ]);
        render_file(&template, &dest, &map).expect("render");

        let rendered = std::fs::read_to_string(&dest).expect("read rendered");
        for token in IMPORT_TOKENS {
            assert!(!rendered.contains(token), "token {} survived", token);
        }
        assert!(rendered.contains("/tmp/pkg/package.mo"));
        assert!(rendered.contains("cd(\"/tmp/out\")"));
        assert_eq!(rendered.matches("MyLib.MyModel").count(), 2);
    }

    #[test]
    fn test_render_missing_template_is_io_error() {
        let dir = tempdir().expect("tempdir");
        let result = render_file(
            &dir.path().join("nope.template"),
            &dir.path().join("out.mos"),
            &BTreeMap::new(),
        );
        assert!(matches!(result, Err(TemplateError::Io { .. })));
    }

    #[test]
    fn test_render_leaves_unknown_tokens_in_place() {
        let dir = tempdir().expect("tempdir");
        let template = dir.path().join("t");
        let dest = dir.path().join("d");
        std::fs::write(&template, "simulate(SIMULATION_BINARY, START_TIME)").expect("write");

        let map = subs(&[("START_TIME", "0.0")]);
        render_file(&template, &dest, &map).expect("render");

        let rendered = std::fs::read_to_string(&dest).expect("read");
        assert!(rendered.contains("SIMULATION_BINARY"));
        assert!(rendered.contains("0.0"));
    }

    #[test]
    fn test_unreplaced_tokens_reports_only_present_ones() {
        let leftover = unreplaced_tokens("run SIMULATION_BINARY at START_TIME", SIMULATE_TOKENS);
        assert_eq!(leftover, vec!["SIMULATION_BINARY", "START_TIME"]);
        assert!(unreplaced_tokens("nothing here", SIMULATE_TOKENS).is_empty());
    }

    #[test]
    fn test_check_rendered_rejects_incomplete_script() {
        let dir = tempdir().expect("tempdir");
        let script = dir.path().join("script.mos");
        std::fs::write(&script, "cd(\"RESULT_FOLDER\");").expect("write");

        let result = check_rendered(&script, IMPORT_TOKENS);
        match result {
            Err(TemplateError::UnreplacedTokens { tokens, .. }) => {
                assert_eq!(tokens, vec!["RESULT_FOLDER"]);
            }
            other => panic!("expected UnreplacedTokens, got {:?}", other),
        }
    }
}
