/*
 * diagnostics_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Tests for error reporting against source files.
 */

use hconf::{Config, Error, Kind};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

#[test]
fn test_broken_fixture_reports_line() {
    let mut config = Config::new();
    config.read_str("previous = 1;").unwrap();

    let err = config.read_file(fixture_path("broken.cfg")).unwrap_err();
    let Error::Parse {
        file,
        line,
        message,
        location,
    } = &err
    else {
        panic!("expected a parse error, got {err:?}");
    };
    assert!(file.ends_with("broken.cfg"));
    assert_eq!(*line, 5);
    assert_eq!(message, "expected value, found ';'");
    assert_eq!(location.unwrap().line(), 5);
    assert_eq!(err.code(), "H-1-2");
    assert_eq!(err.to_string(), format!("{}:5: expected value, found ';'", file));

    // The document is untouched.
    assert_eq!(config.lookup_i32("previous").unwrap(), 1);
    assert!(config.try_lookup("limits").is_none());
}

#[test]
fn test_diagnostic_with_source_snippet() {
    let mut config = Config::new();
    let err = config.read_file(fixture_path("broken.cfg")).unwrap_err();
    let text = err.to_diagnostic().to_text(Some(config.sources()));

    assert!(text.contains("[H-1-2] Parse Error"), "got:\n{text}");
    assert!(text.contains("broken.cfg"), "got:\n{text}");
    assert!(text.contains("min = ;"), "got:\n{text}");
    assert!(text.contains("expected value, found ';'"), "got:\n{text}");
}

#[test]
fn test_snippet_after_earlier_reads() {
    let mut config = Config::new();
    for _ in 0..50 {
        config.read_str("previous = 1;").unwrap();
    }
    let err = config.read_file(fixture_path("broken.cfg")).unwrap_err();
    assert_eq!(config.sources().len(), 2);

    let text = err.to_diagnostic().to_text(Some(config.sources()));
    assert!(text.contains("min = ;"), "got:\n{text}");
    assert!(!text.contains("previous"), "got:\n{text}");
}

#[test]
fn test_diagnostic_without_sources() {
    let mut config = Config::new();
    let err = config
        .read_str_named("a = 1;\nb = \"open", "app.cfg")
        .unwrap_err();
    assert!(matches!(err, Error::Lexical { line: 2, .. }));

    let text = err.to_diagnostic().to_text(None);
    assert!(text.starts_with("Error [H-1-1]: Lexical Error\n"), "got:\n{text}");
    assert!(text.contains("unterminated string"));
    assert!(text.contains("in app.cfg at line 2"));
}

#[test]
fn test_diagnostic_json() {
    let mut config = Config::new();
    config.read_str("port = \"80\";").unwrap();
    let err = config.lookup_i32("port").unwrap_err();
    assert!(matches!(
        err,
        Error::Type {
            expected: Kind::Int,
            actual: Kind::String,
            ..
        }
    ));

    let json = err.to_diagnostic().to_json();
    assert_eq!(json["kind"], "error");
    assert_eq!(json["code"], "H-2-1");
    assert_eq!(json["title"], "Type Mismatch");
    assert!(json["hints"][0].as_str().unwrap().contains("auto-convert"));
}

#[test]
fn test_tree_error_codes() {
    let mut config = Config::new();
    config.read_str("g = { a = 1; }; l = [1];").unwrap();
    let g = config.lookup("g").unwrap();
    let l = config.lookup("l").unwrap();

    let not_found = config.lookup("g.b").unwrap_err();
    assert_eq!(not_found.code(), "H-2-3");

    let conflict = config.add_value(g, "a", 2).unwrap_err();
    assert!(matches!(conflict, Error::NameConflict { .. }));
    let text = conflict.to_diagnostic().to_text(None);
    assert!(text.contains("overrides"), "got:\n{text}");

    let mismatch = config.push_value(l, "two").unwrap_err();
    assert!(matches!(
        mismatch,
        Error::ArrayKindConflict {
            expected: Some(Kind::Int),
            actual: Kind::String,
            ..
        }
    ));
}
