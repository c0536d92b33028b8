//! Zenith - parse and inspect source files of the Zenith language.
//!
//! This crate wraps [`zenith_parser`] with configuration and printing. Sources
//! are parsed into a [`SyntaxTree`] and printed as an S-expression, an
//! indented tree, or a token listing.

pub mod config;

mod error;

pub use zenith_parser::{Language, SyntaxNode, SyntaxTree, language};

pub use error::ZenithError;

use std::fmt::Write as _;

use log::{debug, info, trace, warn};

use zenith_parser::{Parser, span::LineIndex, tokenize};

use config::{AppConfig, OutputFormat};

/// Builder for parsing and printing Zenith sources.
///
/// # Examples
///
/// ```rust
/// use zenith::{SyntaxBuilder, config::AppConfig};
///
/// let source = "signed Int\nend Int\n";
///
/// // With custom config
/// let builder = SyntaxBuilder::new(AppConfig::default());
///
/// // Parse source to a syntax tree
/// let tree = builder.parse(source)
///     .expect("Failed to parse");
///
/// // Print it in the configured format
/// let sexp = builder.render(&tree)
///     .expect("Failed to render");
/// assert_eq!(sexp, "(source_file (number_definition name: (identifier) endName: (identifier)))");
///
/// // Or use default config
/// let builder = SyntaxBuilder::default();
/// ```
#[derive(Debug, Default)]
pub struct SyntaxBuilder {
    config: AppConfig,
}

impl SyntaxBuilder {
    /// Create a new syntax builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including parser and output settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse source code into a syntax tree.
    ///
    /// This performs lexing, parsing and validation. Validation findings
    /// configured below error level are kept on the returned tree.
    ///
    /// # Arguments
    ///
    /// * `source` - Zenith source code as a string
    ///
    /// # Errors
    ///
    /// Returns `ZenithError` for lexical errors, syntax errors, validation
    /// errors, or an incompatible language handle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zenith::{SyntaxBuilder, config::AppConfig};
    ///
    /// let builder = SyntaxBuilder::new(AppConfig::default());
    /// let tree = builder.parse("function main()\nend main\n")
    ///     .expect("Failed to parse source");
    /// assert_eq!(tree.source_file().definitions.len(), 1);
    /// ```
    pub fn parse<'src>(&self, source: &'src str) -> Result<SyntaxTree<'src>, ZenithError> {
        info!("Parsing source");

        let mut parser = Parser::with_config(self.config.parser().validate_config());
        parser.set_language(language())?;

        let tree = parser
            .parse(source)
            .map_err(|err| ZenithError::new_parse_error(err, source))?;

        for warning in tree.warnings() {
            warn!(code:? = warning.code(); "{}", warning.message());
        }
        debug!(warnings = tree.warnings().len(); "Source parsed successfully");
        trace!(file:? = tree.source_file(); "Parsed source file");

        Ok(tree)
    }

    /// Print a syntax tree in the configured [`OutputFormat`].
    ///
    /// # Errors
    ///
    /// Only [`OutputFormat::Tokens`] can fail, see [`Self::render_tokens`].
    pub fn render(&self, tree: &SyntaxTree<'_>) -> Result<String, ZenithError> {
        let output = self.config.output();
        info!(format:% = output.format(); "Rendering syntax tree");

        match output.format() {
            OutputFormat::Sexp => {
                let mut sexp = tree.to_sexp();
                sexp.push('\n');
                Ok(sexp)
            }
            OutputFormat::Tree => Ok(tree.render_tree(output.positions())),
            OutputFormat::Tokens => self.render_tokens(tree.source()),
        }
    }

    /// List the significant tokens of `source`, one per line, as the token
    /// kind followed by the quoted text.
    ///
    /// Only lexing runs, so this works on files the parser rejects.
    ///
    /// # Errors
    ///
    /// Returns `ZenithError::Parse` when the source contains characters that
    /// are not part of any token.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zenith::SyntaxBuilder;
    ///
    /// let listing = SyntaxBuilder::default().render_tokens("end x").unwrap();
    /// assert_eq!(listing, "end \"end\"\nidentifier \"x\"\n");
    /// ```
    pub fn render_tokens(&self, source: &str) -> Result<String, ZenithError> {
        let tokens = tokenize(source).map_err(|err| ZenithError::new_parse_error(err, source))?;
        let index = self
            .config
            .output()
            .positions()
            .then(|| LineIndex::new(source));

        let mut out = String::new();
        for token in tokens.iter().filter(|token| !token.is_trivia()) {
            if let Some(index) = &index {
                let (start, end) = index.points(token.span);
                let _ = write!(out, "{start} - {end} ");
            }
            let _ = writeln!(
                out,
                "{} {:?}",
                token.kind_name(),
                &source[token.span.range()]
            );
        }

        debug!(tokens = tokens.len(); "Tokens rendered");
        Ok(out)
    }
}
