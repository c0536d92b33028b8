//! Configuration types for parsing and printing Zenith sources.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file. Every section and field is optional.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining parser and output settings.
//! - [`ParserConfig`] - How strictly validation findings are reported.
//! - [`OutputConfig`] - Which [`OutputFormat`] is printed and whether positions are shown.
//!
//! # Example
//!
//! ```
//! # use zenith::config::{AppConfig, CheckLevel, OutputFormat};
//! let config = AppConfig::default();
//! assert_eq!(config.parser().end_names(), CheckLevel::Error);
//! assert_eq!(config.output().format(), OutputFormat::Sexp);
//! ```

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

pub use zenith_parser::CheckLevel;
use zenith_parser::ValidateConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Parser configuration section.
    #[serde(default)]
    parser: ParserConfig,

    /// Output configuration section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    ///
    /// # Arguments
    ///
    /// * `parser` - Validation settings.
    /// * `output` - Output format settings.
    pub fn new(parser: ParserConfig, output: OutputConfig) -> Self {
        Self { parser, output }
    }

    /// Returns the parser configuration.
    pub fn parser(&self) -> &ParserConfig {
        &self.parser
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Mutable access to the output section, used to apply command-line overrides.
    pub fn output_mut(&mut self) -> &mut OutputConfig {
        &mut self.output
    }
}

/// Validation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// Level for an `end` name that differs from the definition name.
    #[serde(default)]
    end_names: CheckLevel,

    /// Level for two definitions with the same name in one scope.
    #[serde(default = "default_duplicate_definitions")]
    duplicate_definitions: CheckLevel,
}

fn default_duplicate_definitions() -> CheckLevel {
    CheckLevel::Warning
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            end_names: CheckLevel::default(),
            duplicate_definitions: default_duplicate_definitions(),
        }
    }
}

impl ParserConfig {
    /// Creates a new [`ParserConfig`] with the given check levels.
    pub fn new(end_names: CheckLevel, duplicate_definitions: CheckLevel) -> Self {
        Self {
            end_names,
            duplicate_definitions,
        }
    }

    /// Returns the level of the end name check.
    pub fn end_names(&self) -> CheckLevel {
        self.end_names
    }

    /// Returns the level of the duplicate definition check.
    pub fn duplicate_definitions(&self) -> CheckLevel {
        self.duplicate_definitions
    }

    /// Settings in the form the parser consumes.
    pub fn validate_config(&self) -> ValidateConfig {
        ValidateConfig {
            end_names: self.end_names,
            duplicate_definitions: self.duplicate_definitions,
        }
    }
}

/// How a parsed file is printed.
///
/// - `Sexp` - One-line S-expression of the named nodes (default)
/// - `Tree` - Indented tree, one node per line
/// - `Tokens` - One significant token per line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Sexp,
    Tree,
    Tokens,
}

impl FromStr for OutputFormat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sexp" => Ok(Self::Sexp),
            "tree" => Ok(Self::Tree),
            "tokens" => Ok(Self::Tokens),
            _ => Err("Unsupported output format"),
        }
    }
}

impl From<OutputFormat> for &'static str {
    fn from(val: OutputFormat) -> Self {
        match val {
            OutputFormat::Sexp => "sexp",
            OutputFormat::Tree => "tree",
            OutputFormat::Tokens => "tokens",
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

/// Output settings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OutputConfig {
    /// Printed [`OutputFormat`].
    #[serde(default)]
    format: OutputFormat,

    /// Append `[row, column] - [row, column]` ranges to tree and token output.
    #[serde(default)]
    positions: bool,
}

impl OutputConfig {
    /// Creates a new [`OutputConfig`].
    pub fn new(format: OutputFormat, positions: bool) -> Self {
        Self { format, positions }
    }

    /// Returns the output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Returns whether positions are printed.
    pub fn positions(&self) -> bool {
        self.positions
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    pub fn set_positions(&mut self, positions: bool) {
        self.positions = positions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("empty config");

        assert_eq!(config.parser().end_names(), CheckLevel::Error);
        assert_eq!(config.parser().duplicate_definitions(), CheckLevel::Warning);
        assert_eq!(config.output().format(), OutputFormat::Sexp);
        assert!(!config.output().positions());
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [parser]
            end_names = "warning"

            [output]
            format = "tree"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.parser().end_names(), CheckLevel::Warning);
        assert_eq!(config.parser().duplicate_definitions(), CheckLevel::Warning);
        assert_eq!(config.output().format(), OutputFormat::Tree);
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[parser]\nend_names = \"loud\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_config_conversion() {
        let config = ParserConfig::new(CheckLevel::Off, CheckLevel::Error);
        assert_eq!(
            config.validate_config(),
            ValidateConfig {
                end_names: CheckLevel::Off,
                duplicate_definitions: CheckLevel::Error,
            }
        );
        assert_eq!(
            ParserConfig::default().validate_config(),
            ValidateConfig::default()
        );
    }

    #[test]
    fn test_parser_section_yields_parser_levels() {
        let section: ParserConfig =
            toml::from_str("duplicate_definitions = \"off\"").expect("valid section");
        let level: zenith_parser::CheckLevel = section.duplicate_definitions();
        assert_eq!(level, zenith_parser::CheckLevel::Off);
        assert_eq!(section.validate_config().duplicate_definitions, level);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("tokens".parse::<OutputFormat>(), Ok(OutputFormat::Tokens));
        assert!("json".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Tree.to_string(), "tree");
        assert_eq!("off".parse::<CheckLevel>(), Ok(CheckLevel::Off));
    }
}
