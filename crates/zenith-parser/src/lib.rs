//! # Zenith Parser
//!
//! Lexer, parser and language handle for the Zenith grammar. This crate
//! turns source text into a typed, span-carrying syntax tree and offers a
//! generic node view of it that prints as tree-sitter style S-expressions.
//!
//! ## Usage
//!
//! ```
//! # use zenith_parser::{parse, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = "\
//! function square(x: Int) => Int
//!   result := x * x
//! end square
//! ";
//!
//!     let tree = parse(source)?;
//!     assert!(tree.to_sexp().starts_with("(source_file (function_definition"));
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
pub mod language;
mod lexer;
mod parser;
pub mod span;
mod syntax;
pub mod tokens;
pub mod validate;

pub use language::{ABI_VERSION, Field, Language, LanguageError, NodeKind, language};
pub use lexer::tokenize;
pub use parser::build_source_file;
pub use span::{Span, Spanned};
pub use syntax::{SyntaxNode, SyntaxTree, lower_source_file};
pub use validate::{CheckLevel, ValidateConfig};

use log::{debug, info};

use error::ParseError;

/// Parses Zenith source with a language handle and validation settings.
#[derive(Debug, Clone)]
pub struct Parser {
    language: &'static Language,
    config: ValidateConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_config(ValidateConfig::default())
    }

    pub fn with_config(config: ValidateConfig) -> Self {
        Self {
            language: language(),
            config,
        }
    }

    pub fn language(&self) -> &'static Language {
        self.language
    }

    /// Attach a language handle, rejecting one whose ABI version this
    /// parser cannot read. On error the current handle is kept.
    pub fn set_language(&mut self, language: &'static Language) -> Result<(), LanguageError> {
        language.check_compatibility()?;
        self.language = language;
        Ok(())
    }

    pub fn config(&self) -> ValidateConfig {
        self.config
    }

    pub fn set_config(&mut self, config: ValidateConfig) {
        self.config = config;
    }

    /// Parse source text into a syntax tree.
    ///
    /// Runs the whole pipeline:
    ///
    /// 1. **Tokenize** - Convert source text to tokens
    /// 2. **Parse** - Build the typed tree from the significant tokens
    /// 3. **Validate** - End names and duplicate definitions
    ///
    /// Each phase reports every problem it finds before failing. Validation
    /// findings below error level come back as [`SyntaxTree::warnings`].
    pub fn parse<'src>(&self, source: &'src str) -> Result<SyntaxTree<'src>, ParseError> {
        let tokens: Vec<_> = tokenize(source)?
            .into_iter()
            .filter(|token| !token.is_trivia())
            .collect();
        debug!(tokens = tokens.len(); "Tokenized source");

        let file = build_source_file(&tokens)?;
        let warnings = validate::validate(&file, self.config)?;

        info!(
            language = self.language.name(),
            definitions = file.definitions.len(),
            warnings = warnings.len();
            "Parsed source"
        );
        Ok(SyntaxTree::new(source, file, warnings))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse source text with the default language and validation settings.
///
/// # Example
///
/// ```
/// # use zenith_parser::parse;
/// let tree = parse("signed Int\nend Int\n").unwrap();
/// assert_eq!(
///     tree.to_sexp(),
///     "(source_file (number_definition name: (identifier) endName: (identifier)))"
/// );
/// ```
pub fn parse(source: &str) -> Result<SyntaxTree<'_>, ParseError> {
    Parser::new().parse(source)
}
