use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use golo_parser::batch;
use golo_parser::span::Span;
use golo_parser::{
    Ast, DumpOptions, NodeId, ParseErrorKind, ParseLimits, Visitor, Walk, parse_source,
};

const FIXTURES: &str = "tests/fixtures/for-parsing";

/// Find all .golo files in the fixture directory
fn find_fixtures() -> Vec<PathBuf> {
    let files = batch::discover(Path::new(FIXTURES)).unwrap();
    assert!(!files.is_empty(), "No fixtures found in {}", FIXTURES);
    files
}

/// Set GOLO_TEST_TRACE to see every parsed tree
fn should_trace() -> bool {
    env::var_os("GOLO_TEST_TRACE").is_some()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

#[test]
fn test_every_fixture_parses() {
    let options = DumpOptions::with_prefix("% ");
    let mut failures = Vec::new();

    for path in find_fixtures() {
        if should_trace() {
            println!();
            println!(">>> Parsing: {}", path.display());
        }

        match parse_source(&read(&path)) {
            Ok(ast) => {
                if should_trace() {
                    for line in ast.dump(ast.root(), &options) {
                        println!("{}", line);
                    }
                }
            }
            Err(e) => failures.push(format!("{}: {}", path.display(), e)),
        }
    }

    assert!(failures.is_empty(), "Failed to parse:\n{}", failures.join("\n"));
}

#[test]
fn test_dump_is_deterministic() {
    let options = DumpOptions::with_prefix("% ").spans(true);

    for path in find_fixtures() {
        let source = read(&path);
        let first = parse_source(&source).unwrap();
        let second = parse_source(&source).unwrap();

        let lines: Vec<String> = first.dump(first.root(), &options).collect();
        let again: Vec<String> = first.dump(first.root(), &options).collect();
        let other: Vec<String> = second.dump(second.root(), &options).collect();

        assert_eq!(lines, again, "{}", path.display());
        assert_eq!(lines, other, "{}", path.display());
        assert_eq!(lines.len(), first.len(), "one line per node in {}", path.display());
        assert!(lines.iter().all(|line| line.starts_with("% ")));
    }
}

/// Checks that children nest inside their parent and follow each other in order
struct SpanChecker {
    errors: Vec<String>,
}

impl Visitor for SpanChecker {
    fn enter(&mut self, ast: &Ast, id: NodeId) -> Walk {
        let span = ast.span(id);
        let mut previous: Option<Span> = None;

        for child in ast.children(id) {
            let child_span = ast.span(child);
            if !span.contains(&child_span) {
                self.errors.push(format!(
                    "{} {} does not contain {} {}",
                    ast.kind(id).name(),
                    span,
                    ast.kind(child).name(),
                    child_span
                ));
            }
            if let Some(prev) = previous {
                if !prev.precedes(&child_span) {
                    self.errors.push(format!(
                        "{} {} overlaps its previous sibling {}",
                        ast.kind(child).name(),
                        child_span,
                        prev
                    ));
                }
            }
            previous = Some(child_span);
        }
        Walk::Continue
    }
}

#[test]
fn test_spans_nest_and_follow_source_order() {
    for path in find_fixtures() {
        let source = read(&path);
        let ast = parse_source(&source).unwrap();

        let root_span = ast.span(ast.root());
        assert_eq!(root_span.start.offset, 0);
        assert_eq!(root_span.end.offset, source.len());

        let mut checker = SpanChecker { errors: Vec::new() };
        ast.accept(ast.root(), &mut checker);
        assert!(
            checker.errors.is_empty(),
            "{}:\n{}",
            path.display(),
            checker.errors.join("\n")
        );
    }
}

#[test]
fn test_missing_final_brace_fails_at_end_of_input() {
    let source = read(Path::new(FIXTURES).join("hello-world.golo").as_path());
    let cut = source.rfind('}').unwrap();
    let truncated = &source[..cut];

    let err = parse_source(truncated).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEndOfInput);
    assert_eq!(err.offset, truncated.len());
    assert_eq!(err.found.as_deref(), Some("end of file"));
    assert!(err.expected.contains(&"'}'"));
}

#[test]
fn test_every_prefix_parses_or_fails_cleanly() {
    for path in find_fixtures() {
        let source = read(&path);
        for end in (0..source.len()).filter(|i| source.is_char_boundary(*i)) {
            if let Err(err) = parse_source(&source[..end]) {
                assert!(err.offset <= end, "{} at {}: {}", path.display(), end, err);
                assert!(err.line >= 1 && err.column >= 1);
            }
        }
    }
}

#[test]
fn test_parallel_batch_matches_sequential() {
    let files = find_fixtures();
    let limits = ParseLimits::default();
    let results = batch::parse_files(&files, &limits, 4).unwrap();

    assert_eq!(results.len(), files.len());
    for (file, path) in results.iter().zip(&files) {
        assert_eq!(&file.path, path);
        let parallel = file.result.as_ref().unwrap().to_string();
        let sequential = parse_source(&read(path)).unwrap().to_string();
        assert_eq!(parallel, sequential, "{}", path.display());
    }
}

#[test]
fn test_failure_reports_position_and_expectations() {
    let err = parse_source("module broken\n\nfunction main = |args| {\n  let = 1\n}\n").unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!((err.line, err.column), (4, 7));
    assert_eq!(err.found.as_deref(), Some("'='"));
    assert_eq!(err.expected, vec!["variable name"]);
    assert_eq!(
        err.to_string(),
        "Parse error at 4:7: Expected variable name, found '='"
    );
}

#[test]
fn test_lexical_gap_is_reported() {
    let err = parse_source("module m\nfunction f = -> 1 @ 2\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::LexicalGap);
    assert_eq!(err.line, 2);
}

#[test]
fn test_deep_nesting_hits_recursion_limit() {
    let mut source = String::from("module m\nfunction f = {\n");
    for _ in 0..100 {
        source.push_str("if true {\n");
    }
    for _ in 0..100 {
        source.push_str("}\n");
    }
    source.push_str("}\n");

    let err = parse_source(&source).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::RecursionLimitExceeded);

    let relaxed = ParseLimits::default().with_nesting_depth(2_000);
    assert!(golo_parser::parse_source_with_limits(&source, &relaxed).is_ok());
}

#[test]
fn test_deleting_a_closing_delimiter_is_rejected() {
    for path in find_fixtures() {
        let source = read(&path);
        let closers = source
            .char_indices()
            .filter(|(_, c)| matches!(c, '}' | ')' | ']'));

        for (at, c) in closers {
            let mut corrupted = source.clone();
            corrupted.remove(at);

            let err = match parse_source(&corrupted) {
                Ok(_) => panic!("{}: still parses without '{}' at {}", path.display(), c, at),
                Err(err) => err,
            };
            assert!(
                matches!(
                    err.kind,
                    ParseErrorKind::UnexpectedToken | ParseErrorKind::UnexpectedEndOfInput
                ),
                "{}: removing '{}' at {} gave {:?}",
                path.display(),
                c,
                at,
                err.kind
            );
        }
    }
}
