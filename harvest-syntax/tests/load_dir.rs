use std::fs;

use harvester_core::CancellationToken;
use harvester_syntax::{SourceModule, SyntaxError};
use tempfile::TempDir;

fn write(dir: &TempDir, relative: &str, text: &str) {
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn test_loads_nested_modules() {
    let src = TempDir::new().unwrap();
    write(&src, "lib.rs", "mod orders;\n#[marker] pub struct Root;\n");
    write(
        &src,
        "orders/mod.rs",
        "use crate::markers::Tracked;\n#[Tracked] pub struct Order;\n",
    );
    write(&src, "orders/lines.rs", "#[derive(Clone)] pub enum Line { A }\n");
    write(&src, "notes.txt", "not rust");

    let module = SourceModule::load_dir("shop", src.path(), &CancellationToken::new()).unwrap();

    assert_eq!(module.name(), "shop");
    assert_eq!(module.trees().len(), 3);

    let mut names: Vec<String> = module.contexts().map(|ctx| ctx.qualified_name()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "shop::Root",
            "shop::orders",
            "shop::orders::Order",
            "shop::orders::lines::Line",
        ]
    );

    let order = module
        .contexts()
        .find(|ctx| ctx.node().ident == "Order")
        .unwrap();
    assert_eq!(order.resolve_path("Tracked"), "shop::markers::Tracked");
}

#[test]
fn test_parse_error_names_file() {
    let src = TempDir::new().unwrap();
    write(&src, "lib.rs", "pub struct ;\n");

    let err = SourceModule::load_dir("shop", src.path(), &CancellationToken::new()).unwrap_err();
    match err {
        SyntaxError::Parse { path, line, .. } => {
            assert!(path.ends_with("lib.rs"));
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cancelled_load() {
    let src = TempDir::new().unwrap();
    write(&src, "lib.rs", "pub struct A;\n");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = SourceModule::load_dir("shop", src.path(), &cancel).unwrap_err();
    assert!(matches!(err, SyntaxError::Cancelled(_)));
}

#[test]
fn test_missing_dir_is_io_error() {
    let src = TempDir::new().unwrap();
    let missing = src.path().join("nope");

    let err = SourceModule::load_dir("shop", &missing, &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, SyntaxError::Io { .. }));
}
