use crate::execution::config::AnalysisConfigBuilder;
use crate::execution::executor::{AnalysisExecutor, AnalysisResult};
use crate::parsing::syntax::Position;
use crate::project::layout::OutputLayout;
use crate::project::roots::SourceRoots;
use crate::project::source::PathFileSource;
use crate::report::{Category, FactRow, MemoryReportSink, ParquetReportSink, ReportKind, ReportSink};
use crate::resolution::PlatformTypes;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use testing::TestSourceTree;

fn analyze(root: &Path, threads: usize, sink: &dyn ReportSink) -> AnalysisResult {
    let roots = SourceRoots::new([root]).unwrap();
    let source = PathFileSource::from_roots(&roots, false);
    let executor = AnalysisExecutor::new(AnalysisConfigBuilder::build(threads)).unwrap();
    executor
        .execute(roots, &source, Box::new(PlatformTypes::jdk()), sink)
        .unwrap()
}

fn analyze_in_memory(root: &Path, threads: usize) -> MemoryReportSink {
    let sink = MemoryReportSink::new();
    let result = analyze(root, threads, &sink);
    assert_eq!(result.extraction_failures(), 0);
    sink
}

fn source(tree: &TestSourceTree, relative: &str) -> PathBuf {
    tree.root().canonicalize().unwrap().join(relative)
}

fn type_names(rows: &[FactRow]) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| match row {
            FactRow::Type { type_name, .. } => Some(type_name.as_str()),
            _ => None,
        })
        .collect()
}

fn error_nodes(rows: &[FactRow]) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| match row {
            FactRow::Error { node, .. } => Some(node.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_field_of_sibling_type() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::with_files(
        temp_dir.path(),
        &[
            ("pkg/Foo.java", "package pkg;\npublic class Foo {}\n"),
            ("pkg/Bar.java", "package pkg;\npublic class Bar {\n  Foo f;\n}\n"),
        ],
    );

    let sink = analyze_in_memory(tree.root(), 2);
    let bar = source(&tree, "pkg/Bar.java");
    let rows = sink.rows(&bar, ReportKind::Types);

    assert_eq!(
        rows,
        [FactRow::Type {
            position: Position::new(3, 7),
            type_name: "pkg.Foo".to_string(),
        }]
    );
    assert_eq!(
        type_names(&sink.rows(&bar, ReportKind::Definitions)),
        ["pkg.Bar"]
    );
}

#[test]
fn test_static_call_on_sibling_type() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::with_files(
        temp_dir.path(),
        &[
            (
                "pkg/Foo.java",
                "package pkg;\npublic class Foo {\n  public static void doThing(int v) {}\n}\n",
            ),
            (
                "pkg/Bar.java",
                "package pkg;\npublic class Bar {\n  void run() { Foo.doThing(1); }\n}\n",
            ),
        ],
    );

    let sink = analyze_in_memory(tree.root(), 2);
    let calls = sink.rows_in(&source(&tree, "pkg/Bar.java"), ReportKind::Lines, Category::Regular);

    let method_calls: Vec<&FactRow> = calls
        .iter()
        .filter(|row| matches!(row, FactRow::Call { method: Some(_), .. }))
        .collect();
    assert_eq!(method_calls.len(), 1);
    assert_eq!(
        method_calls[0],
        &FactRow::Call {
            position: Position::new(3, 20),
            owner: "pkg.Foo".to_string(),
            method: Some("doThing".to_string()),
            argument_types: Some("int".to_string()),
            reference: Some(Position::new(3, 22)),
        }
    );
}

#[test]
fn test_unknown_type_is_a_single_error() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::with_files(
        temp_dir.path(),
        &[("pkg/Bar.java", "package pkg;\npublic class Bar {\n  Missing m;\n}\n")],
    );

    let sink = analyze_in_memory(tree.root(), 1);
    let rows = sink.rows(&source(&tree, "pkg/Bar.java"), ReportKind::Types);

    assert!(type_names(&rows).is_empty());
    assert_eq!(error_nodes(&rows), ["Unresolved symbol m"]);
}

#[test]
fn test_inner_reference_falls_back_to_enclosing_type() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::with_files(
        temp_dir.path(),
        &[
            ("a/b/C.java", "package a.b;\npublic class C {}\n"),
            ("pkg/Use.java", "package pkg;\nclass Use {\n  void f(a.b.C c) {}\n}\n"),
        ],
    );

    let sink = analyze_in_memory(tree.root(), 1);
    let use_file = source(&tree, "pkg/Use.java");

    let packages = sink.rows_in(&use_file, ReportKind::Types, Category::Packages);
    assert_eq!(
        packages[0],
        FactRow::Package {
            position: Position::new(3, 10),
            package: "a.b".to_string(),
            type_name: "a.b.C".to_string(),
        }
    );
    assert_eq!(packages.len(), 2);
    assert_eq!(type_names(&sink.rows(&use_file, ReportKind::Types)), ["a.b.C"]);
    assert!(sink.rows_in(&use_file, ReportKind::Types, Category::Errors).is_empty());
}

#[test]
fn test_inner_reference_stops_at_first_resolvable_ancestor() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::with_files(
        temp_dir.path(),
        &[
            ("a/B.java", "package a;\npublic class B {}\n"),
            ("pkg/Use.java", "package pkg;\nclass Use {\n  void f(a.B.C c) {}\n}\n"),
        ],
    );

    let sink = analyze_in_memory(tree.root(), 1);
    let use_file = source(&tree, "pkg/Use.java");

    assert_eq!(
        sink.rows_in(&use_file, ReportKind::Types, Category::Packages),
        [FactRow::Package {
            position: Position::new(3, 10),
            package: "a".to_string(),
            type_name: "a.B".to_string(),
        }]
    );
    assert_eq!(type_names(&sink.rows(&use_file, ReportKind::Types)), ["a.B"]);

    // `a.B.C` itself has no enclosing type to fall back to
    let errors = sink.rows_in(&use_file, ReportKind::Types, Category::Errors);
    assert_eq!(error_nodes(&errors), ["Bad symbol a.B.C"]);
}

#[test]
fn test_fixture_project() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::new(temp_dir.path(), Some("shop"));
    assert_eq!(tree.java_files().len(), 3);

    let sink = analyze_in_memory(tree.root(), 2);

    let order = source(&tree, "com/shop/model/Order.java");
    assert_eq!(
        type_names(&sink.rows(&order, ReportKind::Definitions)),
        ["com.shop.model.Order", "com.shop.model.Order.Status"]
    );

    let checkout = source(&tree, "com/shop/service/Checkout.java");
    let types = sink.rows(&checkout, ReportKind::Types);
    assert!(error_nodes(&types).contains(&"Unresolved symbol ledger"));
    assert!(type_names(&types).contains(&"com.shop.model.Order.Status"));
    assert!(type_names(&types).contains(&"com.shop.model.Item"));

    let lines = sink.rows_in(&checkout, ReportKind::Lines, Category::Regular);
    assert!(lines.iter().any(|row| matches!(
        row,
        FactRow::Call { owner, method: Some(method), argument_types: Some(args), .. }
            if owner == "com.shop.model.Order" && method == "add" && args == "com.shop.model.Item"
    )));
}

#[test]
fn test_thread_count_does_not_change_facts() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::new(temp_dir.path(), Some("shop"));
    tree.write(
        "com/shop/service/Audit.java",
        "package com.shop.service;\nclass Audit {\n  Checkout checkout;\n  Unknown unknown;\n}\n",
    );

    let single = analyze_in_memory(tree.root(), 1).snapshot();
    let parallel = analyze_in_memory(tree.root(), 4).snapshot();

    assert!(!single.is_empty());
    assert_eq!(single, parallel);
}

#[test]
fn test_parse_failure_leaves_other_files_intact() {
    let temp_dir = TempDir::new().unwrap();
    let tree = TestSourceTree::with_files(
        temp_dir.path(),
        &[
            ("pkg/Foo.java", "package pkg;\npublic class Foo {}\n"),
            ("pkg/Bar.java", "package pkg;\npublic class Bar {\n  Foo f;\n}\n"),
            ("pkg/Broken.java", "package pkg;\npublic class Broken {\n"),
        ],
    );

    let sink = MemoryReportSink::new();
    let result = analyze(tree.root(), 2, &sink);

    assert_eq!(result.errored_files.len(), 1);
    assert_eq!(result.files_extracted(), 2);
    assert_eq!(
        type_names(&sink.rows(&source(&tree, "pkg/Bar.java"), ReportKind::Types)),
        ["pkg.Foo"]
    );
    assert!(sink.rows(&source(&tree, "pkg/Broken.java"), ReportKind::Types).is_empty());
}

#[test]
fn test_parquet_reports_mirror_source_tree() {
    let temp_dir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let tree = TestSourceTree::new(temp_dir.path(), Some("shop"));

    let layout = OutputLayout::single_output([tree.root().to_path_buf()], output.path());
    let result = analyze(tree.root(), 2, &ParquetReportSink::new(layout));
    assert_eq!(result.extraction_failures(), 0);

    let written: Vec<PathBuf> = walkdir::WalkDir::new(output.path())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(output.path())
                .ok()
                .map(Path::to_path_buf)
        })
        .collect();

    for expected in [
        "com/shop/model/Item.java.def.parquet",
        "com/shop/model/Order.java.def.parquet",
        "com/shop/service/Checkout.java.types.parquet",
        "com/shop/service/Checkout.java.types.errors.parquet",
        "com/shop/service/Checkout.java.lines.parquet",
    ] {
        assert!(
            written.contains(&PathBuf::from(expected)),
            "missing {expected} in {written:?}"
        );
    }
    assert!(!written.contains(&PathBuf::from("com/shop/model/Item.java.types.errors.parquet")));
    assert!(written.iter().all(|path| path.extension().is_some_and(|ext| ext == "parquet")));
}
