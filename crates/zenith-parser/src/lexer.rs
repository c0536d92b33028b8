//! Lexical analyzer for Zenith source text.
//!
//! The lexer converts source text into a stream of [`Token`]s. Identifiers
//! are lexed first and then looked up in the keyword table, so `endpoint` is
//! an identifier while `end` is a keyword. Spaces, tabs and escaped newlines
//! are emitted as trivia tokens; a bare `\n` is significant and becomes
//! [`Token::Newline`].
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use log::trace;
use winnow::{
    Parser as _,
    ascii::{digit0, digit1},
    combinator::{alt, opt},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors as context so the lexer can report a code,
/// help text and the exact span of the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// Start of the offending text.
    start: usize,
    /// End of the offending text.
    end: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// Characters skipped between tokens (everything `\s` matches except `\n`).
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0B' | '\x0C')
}

/// Parse an escaped newline: `\`, optional whitespace, then a newline.
///
/// Like the pattern `\\\s*\n`, the whitespace run may itself contain
/// newlines; the token ends at the last newline of the run.
fn line_continuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();
    '\\'.parse_next(input)?;

    let checkpoint = input.checkpoint();
    let run: &str = take_while(0.., char::is_whitespace).parse_next(input)?;

    match run.rfind('\n') {
        Some(last_newline) => {
            input.reset(&checkpoint);
            let _ = input.next_slice(last_newline + 1);
            Ok(Token::LineContinuation)
        }
        None => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &checkpoint,
            LexerDiagnostic {
                code: ErrorCode::E002,
                message: "stray backslash",
                help: Some("a `\\` continues the line and must be the last character on it"),
                start,
                end: start + 1,
            },
        ))),
    }
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_blank)
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Optional exponent of a float literal: `[Ee]\d+` (no sign).
fn exponent<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    (one_of(['e', 'E']), digit1).take().parse_next(input)
}

/// Parse float and integer literals.
///
/// Floats follow `(\d+\.\d*|\d*\.\d+)([Ee]\d+)?`, integers `\d+`. An
/// exponent without a decimal point does not make a float: `1e5` lexes as
/// the integer `1` followed by the identifier `e5`.
fn number<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        (digit1, '.', digit0, opt(exponent))
            .take()
            .map(Token::FloatLiteral),
        ('.', digit1, opt(exponent))
            .take()
            .map(Token::FloatLiteral),
        digit1.map(Token::IntegerLiteral),
    ))
    .parse_next(input)
}

/// Parse identifiers and reclassify reserved words as keywords
fn identifier_or_keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .map(|word: &'a str| Token::keyword(word).unwrap_or(Token::Identifier(word)))
        .parse_next(input)
}

/// Parse multi-character operators (order matters - longest first)
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("=>").value(Token::FatArrow),
        literal(":=").value(Token::ColonEquals),
        literal("::").value(Token::DoubleColon),
        literal("==").value(Token::EqualsEquals),
        literal("!=").value(Token::NotEquals),
        literal("<=").value(Token::LessEqual),
        literal(">=").value(Token::GreaterEqual),
        literal("++").value(Token::PlusPlus),
        literal("--").value(Token::MinusMinus),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        alt((
            ':'.value(Token::Colon),
            '='.value(Token::Equals),
            '<'.value(Token::Less),
            '>'.value(Token::Greater),
            '|'.value(Token::Pipe),
            '^'.value(Token::Caret),
            '&'.value(Token::Ampersand),
            '+'.value(Token::Plus),
            '-'.value(Token::Minus),
            '*'.value(Token::Star),
            '/'.value(Token::Slash),
            '%'.value(Token::Percent),
            '~'.value(Token::Tilde),
            '.'.value(Token::Dot),
        )),
        alt((
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            ','.value(Token::Comma),
        )),
    ))
    .parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        whitespace,
        newline,
        line_continuation,
        number,                // Must come before `.`
        identifier_or_keyword, // Must come before single chars
        multi_char_operator,   // Must come before single char operators
        single_char_token,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();

    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            let checkpoint = input.checkpoint();
            let token_start = input.current_token_start();

            match positioned_token(&mut input) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    let diagnostic = self.convert_err_mode(e, token_start);
                    self.diagnostics.emit(diagnostic);

                    // Resume one character after the start of the failed token.
                    input.reset(&checkpoint);
                    let _ = input.next_token();
                }
            }
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        trace!(tokens = self.tokens.len(); "Tokenized source");
        self.diagnostics.finish().map(|_| self.tokens)
    }

    /// Convert a winnow error into a diagnostic.
    ///
    /// Uses the attached `LexerDiagnostic` if there is one and otherwise
    /// reports the character at `error_pos` as unexpected (E001).
    fn convert_err_mode(
        &self,
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
            end,
        }) = context_error.context().next()
        {
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(Span::new(*start..*end), code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let ch = self.source[error_pos..].chars().next().unwrap_or('\0');
        let span = Span::new(error_pos..error_pos + ch.len_utf8());
        Diagnostic::error(format!("unexpected character `{}`", ch.escape_debug()))
            .with_code(ErrorCode::E001)
            .with_label(span, ErrorCode::E001.description())
    }
}

/// Tokenize Zenith source, collecting every lexical error.
///
/// The returned stream contains trivia ([`Token::is_trivia`]) so that it
/// covers the whole input; the parser expects trivia to be filtered out.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully lexed
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new(input);
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to lex: {input}");
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected, "input: {input}");
        assert_eq!(positioned.span, Span::new(0..input.len()), "input: {input}");
    }

    fn significant(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("Should tokenize")
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    #[test]
    fn test_keywords() {
        test_single_token("function", Token::Function);
        test_single_token("end", Token::End);
        test_single_token("signed", Token::Signed);
        test_single_token("unsigned", Token::Unsigned);
        test_single_token("float", Token::Float);
        test_single_token("not", Token::Not);
        test_single_token("and", Token::And);
        test_single_token("or", Token::Or);
    }

    #[test]
    fn test_identifiers() {
        test_single_token("hello", Token::Identifier("hello"));
        test_single_token("_private", Token::Identifier("_private"));
        test_single_token("var123", Token::Identifier("var123"));
        test_single_token("CamelCase", Token::Identifier("CamelCase"));
    }

    #[test]
    fn test_keyword_word_boundaries() {
        test_single_token("endpoint", Token::Identifier("endpoint"));
        test_single_token("functional", Token::Identifier("functional"));
        test_single_token("floats", Token::Identifier("floats"));
        test_single_token("end_", Token::Identifier("end_"));
        test_single_token("order", Token::Identifier("order"));

        assert_eq!(
            significant("end square"),
            vec![Token::End, Token::Identifier("square")]
        );
    }

    #[test]
    fn test_integer_literals() {
        test_single_token("0", Token::IntegerLiteral("0"));
        test_single_token("42", Token::IntegerLiteral("42"));
        test_single_token("007", Token::IntegerLiteral("007"));
    }

    #[test]
    fn test_float_literals() {
        test_single_token("1.0", Token::FloatLiteral("1.0"));
        test_single_token("5.", Token::FloatLiteral("5."));
        test_single_token(".25", Token::FloatLiteral(".25"));
        test_single_token("2.5e10", Token::FloatLiteral("2.5e10"));
        test_single_token("1.E3", Token::FloatLiteral("1.E3"));
        test_single_token(".5e2", Token::FloatLiteral(".5e2"));
    }

    #[test]
    fn test_exponent_requires_decimal_point_and_digits() {
        assert_eq!(
            significant("1e5"),
            vec![Token::IntegerLiteral("1"), Token::Identifier("e5")]
        );
        // Signed exponents are not part of the literal.
        assert_eq!(
            significant("1.5e-3"),
            vec![
                Token::FloatLiteral("1.5"),
                Token::Identifier("e"),
                Token::Minus,
                Token::IntegerLiteral("3"),
            ]
        );
    }

    #[test]
    fn test_dot_versus_float() {
        assert_eq!(
            significant("a.b"),
            vec![Token::Identifier("a"), Token::Dot, Token::Identifier("b")]
        );
        assert_eq!(
            significant("a.5"),
            vec![Token::Identifier("a"), Token::FloatLiteral(".5")]
        );
    }

    #[test]
    fn test_operators() {
        test_single_token("=>", Token::FatArrow);
        test_single_token(":=", Token::ColonEquals);
        test_single_token("::", Token::DoubleColon);
        test_single_token(":", Token::Colon);
        test_single_token("==", Token::EqualsEquals);
        test_single_token("!=", Token::NotEquals);
        test_single_token("=", Token::Equals);
        test_single_token("<=", Token::LessEqual);
        test_single_token("<", Token::Less);
        test_single_token(">=", Token::GreaterEqual);
        test_single_token(">", Token::Greater);
        test_single_token("|", Token::Pipe);
        test_single_token("^", Token::Caret);
        test_single_token("&", Token::Ampersand);
        test_single_token("++", Token::PlusPlus);
        test_single_token("--", Token::MinusMinus);
        test_single_token("+", Token::Plus);
        test_single_token("-", Token::Minus);
        test_single_token("*", Token::Star);
        test_single_token("/", Token::Slash);
        test_single_token("%", Token::Percent);
        test_single_token("~", Token::Tilde);
        test_single_token(".", Token::Dot);
    }

    #[test]
    fn test_punctuation() {
        test_single_token("(", Token::LeftParen);
        test_single_token(")", Token::RightParen);
        test_single_token("[", Token::LeftBracket);
        test_single_token("]", Token::RightBracket);
        test_single_token(",", Token::Comma);
    }

    #[test]
    fn test_newline_is_significant() {
        assert_eq!(
            significant("a\r\nb"),
            vec![
                Token::Identifier("a"),
                Token::Newline,
                Token::Identifier("b")
            ]
        );
    }

    #[test]
    fn test_line_continuation() {
        test_single_token("\\\n", Token::LineContinuation);
        test_single_token("\\  \t\r\n", Token::LineContinuation);

        // The token ends at the last newline of the whitespace run.
        let tokens = tokenize("x \\ \n\n  y").expect("Should tokenize");
        let kinds: Vec<_> = tokens.iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Identifier("x"),
                Token::Whitespace,
                Token::LineContinuation,
                Token::Whitespace,
                Token::Identifier("y"),
            ]
        );
        assert_eq!(tokens[2].span, Span::new(2..6));
    }

    #[test]
    fn test_stray_backslash() {
        let err = tokenize("a \\ b\n").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);

        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E002));
        assert_eq!(diag.primary_span(), Some(Span::new(2..3)));
    }

    #[test]
    fn test_unexpected_characters_are_all_reported() {
        let err = tokenize("a $ b @ c").unwrap_err();
        let diags = err.diagnostics();

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].code(), Some(ErrorCode::E001));
        assert_eq!(diags[0].message(), "unexpected character `$`");
        assert_eq!(diags[0].primary_span(), Some(Span::new(2..3)));
        assert_eq!(diags[1].primary_span(), Some(Span::new(6..7)));
    }

    #[test]
    fn test_lone_bang_is_unexpected() {
        let err = tokenize("!x").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_multibyte_unexpected_character() {
        let err = tokenize("x = é\n").unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.primary_span(), Some(Span::new(4..6)));
    }

    #[test]
    fn test_function_header() {
        assert_eq!(
            significant("function add(a : i32, b := 1) => i32\n"),
            vec![
                Token::Function,
                Token::Identifier("add"),
                Token::LeftParen,
                Token::Identifier("a"),
                Token::Colon,
                Token::Identifier("i32"),
                Token::Comma,
                Token::Identifier("b"),
                Token::ColonEquals,
                Token::IntegerLiteral("1"),
                Token::RightParen,
                Token::FatArrow,
                Token::Identifier("i32"),
                Token::Newline,
            ]
        );
    }

    proptest! {
        #[test]
        fn tokens_tile_the_input(source in "[a-z0-9_ .:=<>+*\\-()\\[\\],\n\\\\]{0,64}") {
            if let Ok(tokens) = tokenize(&source) {
                let mut expected_start = 0;
                for token in &tokens {
                    prop_assert_eq!(token.span.start(), expected_start);
                    prop_assert!(!token.span.is_empty());
                    expected_start = token.span.end();
                }
                prop_assert_eq!(expected_start, source.len());
            }
        }

        #[test]
        fn tokenize_never_panics(source in "\\PC{0,64}") {
            let _ = tokenize(&source);
        }
    }
}
