//! Golden-file test harness for mdo.
//!
//! Discovers `.input.ts` files under `tests/fixtures/`, runs the mdo pipeline
//! (parse → desugar → codegen), and compares the output against the
//! corresponding `.expected.ts` file. Outputs are compared as syntax trees, so
//! layout and redundant parentheses in the expected files do not matter.
//!
//! Set `MDO_UPDATE_FIXTURES=1` to overwrite expected files with actual output.

use std::path::{Path, PathBuf};

use mdo_test::{desugar_source, mentions_identifier, reparse_emitted, run_pipeline, same_program};
use swc_common::EqIgnoreSpan;

fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR is crates/mdo_test/, so go up two levels to workspace root.
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
}

fn collect_input_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir(dir)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".input.ts"))
        })
        .collect();
    files.sort();
    files
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut result = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                result.extend(walkdir(&path));
            } else {
                result.push(path);
            }
        }
    }
    result
}

fn test_name(fixtures: &Path, input_path: &Path) -> String {
    input_path
        .strip_prefix(fixtures)
        .unwrap_or(input_path)
        .display()
        .to_string()
}

#[test]
fn golden_file_tests() {
    let fixtures = fixtures_dir();
    let input_files = collect_input_files(&fixtures);

    assert!(
        !input_files.is_empty(),
        "No test fixtures found in {}",
        fixtures.display()
    );

    let update_mode = std::env::var("MDO_UPDATE_FIXTURES").is_ok();
    let mut failures = Vec::new();

    for input_path in &input_files {
        let expected_path = PathBuf::from(
            input_path
                .to_str()
                .unwrap()
                .replace(".input.ts", ".expected.ts"),
        );
        let test_name = test_name(&fixtures, input_path);

        let source = match std::fs::read_to_string(input_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: failed to read input: {e}"));
                continue;
            }
        };

        let filename = input_path.display().to_string();
        let actual = match run_pipeline(&source, &filename) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e:#}"));
                continue;
            }
        };

        if update_mode {
            if let Err(e) = std::fs::write(&expected_path, &actual) {
                failures.push(format!("{test_name}: failed to write expected: {e}"));
            }
            continue;
        }

        let expected = match std::fs::read_to_string(&expected_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!(
                    "{test_name}: failed to read {}: {e}",
                    expected_path.display()
                ));
                continue;
            }
        };

        match same_program(&actual, &expected) {
            Ok(true) => {}
            Ok(false) => failures.push(format!(
                "{test_name}: output mismatch\n--- expected ---\n{}\n--- actual ---\n{}",
                expected.trim(),
                actual.trim()
            )),
            Err(e) => failures.push(format!(
                "{test_name}: output does not reparse: {e:#}\n--- output ---\n{}",
                actual.trim()
            )),
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} golden test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn expanded_fixtures_leave_no_entry_calls() {
    let fixtures = fixtures_dir();
    let mut failures = Vec::new();

    for input_path in collect_input_files(&fixtures) {
        let test_name = test_name(&fixtures, &input_path);
        let source = std::fs::read_to_string(&input_path).unwrap();

        match desugar_source(&source, &test_name) {
            Ok(module) => {
                for leftover in ["$do", "$inject_return"] {
                    if mentions_identifier(&module, leftover) {
                        failures.push(format!("{test_name}: `{leftover}` survived expansion"));
                    }
                }
            }
            Err(e) => failures.push(format!("{test_name}: pipeline failed: {e:#}")),
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} fixture(s) kept entry calls:\n\n{}",
            failures.len(),
            failures.join("\n")
        );
    }
}

#[test]
fn emitted_text_reparses_to_the_expanded_tree() {
    let fixtures = fixtures_dir();
    let mut failures = Vec::new();

    for input_path in collect_input_files(&fixtures) {
        let test_name = test_name(&fixtures, &input_path);
        let source = std::fs::read_to_string(&input_path).unwrap();

        let expanded = desugar_source(&source, &test_name);
        let reparsed = reparse_emitted(&source, &test_name);
        match (expanded, reparsed) {
            (Ok(expanded), Ok(reparsed)) => {
                if !reparsed.body.eq_ignore_span(&expanded.body) {
                    failures.push(format!(
                        "{test_name}: emitted text regroups\n{}",
                        run_pipeline(&source, &test_name).unwrap_or_default().trim()
                    ));
                }
            }
            (Err(e), _) | (_, Err(e)) => failures.push(format!("{test_name}: pipeline failed: {e:#}")),
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} fixture(s) changed shape through codegen:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn rejected_sources_report_every_error() {
    let source = "\
const a = $do(List);
const b = $do(List, () => {
  x <- m;
  return x;
  List.return(x);
});
";
    let err = desugar_source(source, "rejected.ts").unwrap_err();
    let errors = err
        .downcast_ref::<mdo_desugar::DesugarErrors>()
        .expect("desugar errors");
    assert_eq!(errors.0.len(), 2, "{errors}");
}
