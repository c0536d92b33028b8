//! Error and diagnostic system for the Zenith parser.
//!
//! The system is built around [`Diagnostic`]: one error or warning with an
//! optional [`ErrorCode`], labeled source spans and help text. A failed
//! phase returns every diagnostic it collected wrapped in a [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use zenith_parser::error::{Diagnostic, ErrorCode};
//! # use zenith_parser::Span;
//! let diag = Diagnostic::error("`end` name `Sqr` does not match function `square`")
//!     .with_code(ErrorCode::E200)
//!     .with_label(Span::new(40..43), "expected `square`")
//!     .with_secondary_label(Span::new(9..15), "function declared here")
//!     .with_help("write `end square`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
