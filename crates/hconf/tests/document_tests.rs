/*
 * document_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end tests for reading, editing and writing documents.
 */

use hconf::{Config, Error, Format, Kind, NodeId, Options, Value};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

fn load(name: &str) -> Config {
    let mut config = Config::new();
    config
        .read_file(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e));
    config
}

fn parse(text: &str) -> Config {
    let mut config = Config::new();
    config.read_str(text).unwrap();
    config
}

/// One line per setting: path, kind, and for scalars format and value.
fn outline(config: &Config) -> Vec<String> {
    let mut lines = Vec::new();
    walk(config, config.root(), &mut lines);
    lines
}

fn walk(config: &Config, id: NodeId, lines: &mut Vec<String>) {
    for child in config.children(id).unwrap() {
        let path = config.path(child).unwrap();
        let kind = config.kind(child).unwrap();
        match config.value(child) {
            Ok(value) => lines.push(format!(
                "{} {} {:?} {:?}",
                path,
                kind,
                config.format(child).unwrap(),
                value
            )),
            Err(_) => lines.push(format!("{} {}", path, kind)),
        }
        walk(config, child, lines);
    }
}

/// Write `config` and read the text back into a document with the same layout.
fn reparse(config: &Config) -> Config {
    let text = config.write_string().unwrap();
    let mut again = Config::builder()
        .options(config.options())
        .tab_width(config.tab_width())
        .float_precision(config.float_precision())
        .build();
    again
        .read_str(&text)
        .unwrap_or_else(|e| panic!("written text does not parse: {}\n{}", e, text));
    again
}

#[test]
fn test_read_example_fixture() {
    let config = load("example.cfg");

    assert_eq!(config.lookup_str("name").unwrap(), "Books, Movies & More");
    assert_eq!(
        config.lookup_str("inventory.books[1].title").unwrap(),
        "Snow Crash"
    );
    assert_eq!(config.lookup_i32("inventory.movies[2].qty").unwrap(), 20);
    assert_eq!(config.lookup_i32("hours.fri.close").unwrap(), 20);
    assert_eq!(config.lookup_f64("misc.pi").unwrap(), 3.141592654);
    assert_eq!(config.lookup_i64("misc.bigint").unwrap(), i64::MAX);
    assert_eq!(config.lookup_str("misc.columns[2]").unwrap(), "MI");

    let bitmask = config.lookup("misc.bitmask").unwrap();
    assert_eq!(config.format(bitmask).unwrap(), Format::Hex);
    let umask = config.lookup("misc.umask").unwrap();
    assert_eq!(config.format(umask).unwrap(), Format::Octal);
    assert_eq!(config.get_i32(umask).unwrap(), 0o27);
    assert_eq!(config.lookup_i32("misc.flags").unwrap(), 10);

    let empty = config.lookup("misc.empty_array").unwrap();
    assert_eq!(config.kind(empty).unwrap(), Kind::Array);
    assert_eq!(config.len(empty).unwrap(), 0);

    let sat = config.lookup("hours.sat").unwrap();
    assert_eq!(config.source_line(sat), Some(41));
    assert!(config.source_file(sat).unwrap().ends_with("example.cfg"));
}

#[test]
fn test_example_round_trip() {
    let mut config = load("example.cfg");
    config.set_float_precision(17);
    let again = reparse(&config);
    assert_eq!(outline(&again), outline(&config));
    assert_eq!(again.write_string().unwrap(), config.write_string().unwrap());
}

/// A document using every kind, format and nesting shape.
fn built_document() -> Config {
    let mut config = Config::new();
    let root = config.root();

    config.add_value(root, "title", "tab\there \"quoted\" \\ \u{1}").unwrap();
    let version = config.add_value(root, "version", -5i64).unwrap();
    config.set_format(version, Format::Hex).unwrap();
    config.add_value(root, "ratio", -2.25).unwrap();
    config.add_value(root, "large", 1e10).unwrap();
    config.add_value(root, "enabled", true).unwrap();
    let mask = config.add_value(root, "mask", -5).unwrap();
    config.set_format(mask, Format::Hex).unwrap();
    let mode = config.add_value(root, "mode", 0o755).unwrap();
    config.set_format(mode, Format::Octal).unwrap();

    let sizes = config.add(root, Some("sizes"), Kind::Array).unwrap();
    for v in [1, 2, 3] {
        let e = config.push_value(sizes, v).unwrap();
        config.set_format(e, Format::Binary).unwrap();
    }

    let grp = config.add(root, Some("wild*card-name"), Kind::Group).unwrap();
    config.add(grp, Some("nothing"), Kind::Group).unwrap();
    config.add(grp, Some("no_items"), Kind::List).unwrap();
    config.add(grp, Some("no_values"), Kind::Array).unwrap();
    let list = config.add(grp, Some("mixed"), Kind::List).unwrap();
    config.push_value(list, "text").unwrap();
    let inner = config.add(list, None, Kind::Group).unwrap();
    config.add_value(inner, "depth", 3).unwrap();
    let nested = config.add(list, None, Kind::List).unwrap();
    config.push_value(nested, 7i64).unwrap();
    let floats = config.add(list, None, Kind::Array).unwrap();
    config.push_value(floats, 0.5).unwrap();

    config
}

#[test]
fn test_round_trip_of_built_tree() {
    let config = built_document();
    let again = reparse(&config);
    assert_eq!(outline(&again), outline(&config));
    assert_eq!(again.lookup_i64("version").unwrap(), -5);
    assert_eq!(again.lookup_i32("mask").unwrap(), -5);
    assert_eq!(
        again.lookup_str("title").unwrap(),
        "tab\there \"quoted\" \\ \u{1}"
    );
}

#[test]
fn test_round_trip_with_other_layouts() {
    let mut config = built_document();
    config.set_options(Options::COLON_ASSIGNMENT_FOR_NON_GROUPS | Options::ALLOW_SCIENTIFIC_NOTATION);
    config.set_tab_width(0);
    let again = reparse(&config);
    assert_eq!(outline(&again), outline(&config));
}

#[test]
fn test_write_is_idempotent() {
    let config = built_document();
    let first = config.write_string().unwrap();
    let second = reparse(&config).write_string().unwrap();
    assert_eq!(second, first);
}

#[test]
fn test_format_preservation() {
    let mut config = Config::new();
    let root = config.root();
    let id = config.add(root, Some("color"), Kind::Int).unwrap();
    config.set_format(id, Format::Hex).unwrap();
    config.set_i32(id, 255).unwrap();

    let text = config.write_string().unwrap();
    assert_eq!(text, "color = 0xFF;\n");

    let again = reparse(&config);
    let id = again.lookup("color").unwrap();
    assert_eq!(again.format(id).unwrap(), Format::Hex);
    assert_eq!(again.get_i32(id).unwrap(), 255);
}

#[test]
fn test_signed_octal_literals() {
    let config = parse("a = 017; b = -017;");
    for (path, expected) in [("a", 15), ("b", -15)] {
        let id = config.lookup(path).unwrap();
        assert_eq!(config.get_i32(id).unwrap(), expected);
        assert_eq!(config.format(id).unwrap(), Format::Octal);
    }

    let again = reparse(&config);
    assert_eq!(again.lookup_i32("b").unwrap(), -15);
    assert_eq!(again.format(again.lookup("b").unwrap()).unwrap(), Format::Octal);
}

#[test]
fn test_byte_escapes_are_utf8() {
    let config = parse("s = \"caf\\xC3\\xA9\";");
    assert_eq!(config.lookup_str("s").unwrap(), "caf\u{e9}");
    assert_eq!(config.write_string().unwrap(), "s = \"caf\u{e9}\";\n");
}

#[test]
fn test_array_homogeneity() {
    let mut config = parse("arr = [1, 2];");
    config.set_option(Options::AUTO_CONVERT, true);
    let arr = config.lookup("arr").unwrap();

    let err = config.push_value(arr, "three").unwrap_err();
    assert!(matches!(
        err,
        Error::ArrayKindConflict {
            expected: Some(Kind::Int),
            actual: Kind::String,
            ..
        }
    ));
    assert!(matches!(
        config.push_value(arr, 3.0),
        Err(Error::ArrayKindConflict { .. })
    ));
    assert!(matches!(
        config.add(arr, None, Kind::Group),
        Err(Error::ArrayKindConflict { .. })
    ));
    assert_eq!(config.len(arr).unwrap(), 2);

    config.push_value(arr, 3).unwrap();
    assert_eq!(config.lookup_i32("arr[2]").unwrap(), 3);
}

#[test]
fn test_group_uniqueness() {
    let mut config = parse("a = 1; x = 2; b = 3;");
    let root = config.root();

    let err = config.add_value(root, "x", "again").unwrap_err();
    assert!(matches!(err, Error::NameConflict { ref name, .. } if name == "x"));
    assert_eq!(config.lookup_i32("x").unwrap(), 2);

    config.set_option(Options::ALLOW_OVERRIDES, true);
    let x = config.add_value(root, "x", "again").unwrap();
    assert_eq!(config.index(x).unwrap(), Some(1));
    assert_eq!(config.lookup_str("x").unwrap(), "again");
    assert_eq!(config.len(root).unwrap(), 3);
}

#[test]
fn test_copy_fidelity() {
    let source = parse("src = { a = 1; b = (2, \"x\", true); };");
    let src = source.lookup("src").unwrap();
    let before = source.write_string().unwrap();

    let mut dest = Config::new();
    let root = dest.root();
    dest.merge(root, &source, src).unwrap();
    assert_eq!(
        outline(&dest),
        vec![
            "a int Decimal Int(1)",
            "b list",
            "b[0] int Decimal Int(2)",
            "b[1] string Decimal String(\"x\")",
            "b[2] bool Decimal Bool(true)",
        ]
    );

    let mut whole = Config::new();
    let root = whole.root();
    let copied = whole.copy(root, &source, src).unwrap();
    assert_eq!(whole.path(copied).unwrap(), "src");
    assert_eq!(whole.write_string().unwrap(), before);
    assert_eq!(source.write_string().unwrap(), before);
}

#[test]
fn test_copy_keeps_integer_format() {
    let source = parse("n = 0x10; big = 017L;");
    let mut dest = parse("target = ();");
    let target = dest.lookup("target").unwrap();
    for name in ["n", "big"] {
        let id = source.lookup(name).unwrap();
        dest.copy(target, &source, id).unwrap();
    }
    let n = dest.lookup("target[0]").unwrap();
    let big = dest.lookup("target[1]").unwrap();
    assert_eq!(dest.name(n).unwrap(), None);
    assert_eq!(dest.format(n).unwrap(), Format::Hex);
    assert_eq!(dest.format(big).unwrap(), Format::Octal);
    assert_eq!(dest.get_i64(big).unwrap(), 15);
}

#[test]
fn test_copy_destination_rules() {
    let mut config = parse("arr = [1]; n = 2; g = {}; l = ();");
    let n = config.lookup("n").unwrap();
    let arr = config.lookup("arr").unwrap();
    let g = config.lookup("g").unwrap();
    let l = config.lookup("l").unwrap();

    assert!(matches!(
        config.copy_within(arr, n),
        Err(Error::InvalidDestination { kind: Kind::Array, .. })
    ));
    assert!(matches!(
        config.copy_within(n, arr),
        Err(Error::InvalidDestination { kind: Kind::Int, .. })
    ));
    let root = config.root();
    let element = config.lookup("arr[0]").unwrap();
    assert!(matches!(
        config.copy_within(g, element),
        Err(Error::MissingName { .. })
    ));
    assert!(matches!(
        config.copy_within(root, n),
        Err(Error::NameConflict { .. })
    ));
    config.copy_within(l, element).unwrap();
    config.copy_within(g, n).unwrap();
    assert_eq!(config.lookup_i32("l[0]").unwrap(), 1);
    assert_eq!(config.lookup_i32("g.n").unwrap(), 2);
}

#[test]
fn test_copy_into_own_descendant() {
    let mut config = parse("g = { l = (); x = 1; };");
    let g = config.lookup("g").unwrap();
    let l = config.lookup("g.l").unwrap();
    config.copy_within(l, g).unwrap();

    assert_eq!(config.lookup_i32("g.l[0].x").unwrap(), 1);
    assert_eq!(config.len(config.lookup("g.l[0].l").unwrap()).unwrap(), 0);
}

#[test]
fn test_path_resolution() {
    let config = parse("grp = { arr = [10, 20, 30]; };");

    let id = config.lookup("grp.arr[1]").unwrap();
    assert_eq!(config.kind(id).unwrap(), Kind::Int);
    assert_eq!(config.value(id).unwrap(), &Value::Int(20));

    let err = config.lookup("grp.arr[5]").unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound { ref path, ref segment } if path == "grp.arr[5]" && segment == "[5]"
    ));
    assert!(config.try_lookup("grp.arr[5]").is_none());
    assert_eq!(config.try_lookup_i32("grp/arr[2]"), Some(30));

    let grp = config.lookup("grp").unwrap();
    assert_eq!(config.lookup_from(grp, "arr[0]").unwrap(), config.lookup("grp.arr[0]").unwrap());
}

#[test]
fn test_coercion_toggle() {
    let mut config = parse("n = 42;");
    let n = config.lookup("n").unwrap();

    assert!(matches!(
        config.get_f64(n),
        Err(Error::Type {
            expected: Kind::Float,
            actual: Kind::Int,
            ..
        })
    ));

    config.set_option(Options::AUTO_CONVERT, true);
    assert_eq!(config.get_f64(n).unwrap(), 42.0);
    assert!(matches!(config.get_str(n), Err(Error::Type { .. })));
}

#[test]
fn test_remove_and_stale_handles() {
    let mut config = parse("a = 1; g = { b = 2; c = [1, 2]; }; d = 3;");
    let root = config.root();
    let c = config.lookup("g.c").unwrap();
    let g = config.lookup("g").unwrap();

    config.remove(g, "c").unwrap();
    assert!(matches!(config.len(c), Err(Error::StaleNode)));
    assert!(matches!(
        config.remove(g, "c"),
        Err(Error::NotFound { ref segment, .. }) if segment == "c"
    ));

    config.remove(root, 0usize).unwrap();
    assert_eq!(outline(&config)[0], "g group");

    config.remove_node(g).unwrap();
    assert!(matches!(config.remove_node(root), Err(Error::RootRemoval)));
    assert_eq!(config.write_string().unwrap(), "d = 3;\n");
}

#[test]
fn test_handles_from_other_documents_are_rejected() {
    let one = parse("a = 1;");
    let two = parse("a = 1;");
    let a = one.lookup("a").unwrap();
    assert!(matches!(two.get(a), Err(Error::StaleNode)));
}

#[test]
fn test_writer_layout() {
    let mut config = parse(
        r#"
        name = "demo";
        window = { size = [640, 480]; flags = 0x1F; panes = ("left", 2.5); };
        "#,
    );
    config.set_option(Options::OPEN_BRACE_ON_SEPARATE_LINE, false);
    config.set_tab_width(4);
    insta::assert_snapshot!(config.write_string().unwrap(), @r#"
    name = "demo";
    window : {
        size = [ 640, 480 ];
        flags = 0x1F;
        panes = ( "left", 2.5 );
    };
    "#);
}
