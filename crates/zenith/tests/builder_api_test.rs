//! Integration tests for the SyntaxBuilder API

use zenith::{
    SyntaxBuilder, ZenithError,
    config::{AppConfig, CheckLevel, OutputConfig, OutputFormat, ParserConfig},
};

const SOURCE: &str = "\
signed Int
  function add(a: Int, b: Int) => Int
    sum := a + b
  end add
end Int
";

fn builder_with_output(format: OutputFormat, positions: bool) -> SyntaxBuilder {
    SyntaxBuilder::new(AppConfig::new(
        ParserConfig::default(),
        OutputConfig::new(format, positions),
    ))
}

#[test]
fn test_builder_api_exists() {
    let builder = SyntaxBuilder::default();
    assert_eq!(builder.config().output().format(), OutputFormat::Sexp);
}

#[test]
fn test_parse_and_render_sexp() {
    let builder = SyntaxBuilder::default();
    let tree = builder.parse(SOURCE).expect("Failed to parse");
    let sexp = builder.render(&tree).expect("Failed to render");

    assert!(sexp.starts_with("(source_file (number_definition name: (identifier) definitions: (function_definition"));
    assert!(sexp.ends_with(")\n"));
}

#[test]
fn test_render_tree_with_positions() {
    let builder = builder_with_output(OutputFormat::Tree, true);
    let tree = builder.parse("float F\nend F\n").expect("Failed to parse");

    assert_eq!(
        builder.render(&tree).expect("Failed to render"),
        "(source_file [0, 0] - [2, 0]\n  (number_definition [0, 0] - [2, 0]\n    name: (identifier [0, 6] - [0, 7])\n    endName: (identifier [1, 4] - [1, 5])))\n"
    );
}

#[test]
fn test_render_tokens() {
    let builder = builder_with_output(OutputFormat::Tokens, true);
    let listing = builder.render_tokens("x++\n").expect("Failed to tokenize");

    assert_eq!(
        listing,
        "[0, 0] - [0, 1] identifier \"x\"\n[0, 1] - [0, 3] ++ \"++\"\n[0, 3] - [1, 0] newline \"\\n\"\n"
    );
}

#[test]
fn test_render_tokens_of_unparsable_source() {
    let builder = SyntaxBuilder::default();
    assert!(builder.render_tokens("end end end").is_ok());
    assert!(builder.parse("end end end").is_err());
}

#[test]
fn test_parse_error_keeps_source() {
    let source = "function f()\n  x := \nend f\n";
    let err = SyntaxBuilder::default().parse(source).unwrap_err();

    match err {
        ZenithError::Parse { err, src } => {
            assert_eq!(src, source);
            assert!(!err.diagnostics().is_empty());
        }
        other => panic!("Expected parse error, got {other:?}"),
    }
}

#[test]
fn test_parser_config_controls_validation() {
    let source = "function f()\nend g\n";
    assert!(SyntaxBuilder::default().parse(source).is_err());

    let lenient = SyntaxBuilder::new(AppConfig::new(
        ParserConfig::new(CheckLevel::Warning, CheckLevel::Warning),
        OutputConfig::default(),
    ));
    let tree = lenient.parse(source).expect("end name is only a warning");
    assert_eq!(tree.warnings().len(), 1);
}
