use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for the Zenith language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'src> {
    // Keywords
    Function,
    End,
    Signed,
    Unsigned,
    Float,
    Not,
    And,
    Or,

    // Literals
    Identifier(&'src str),
    IntegerLiteral(&'src str),
    FloatLiteral(&'src str),

    // Operators
    FatArrow,     // =>
    ColonEquals,  // :=
    DoubleColon,  // ::
    Colon,        // :
    EqualsEquals, // ==
    NotEquals,    // !=
    Equals,       // =
    LessEqual,    // <=
    Less,         // <
    GreaterEqual, // >=
    Greater,      // >
    Pipe,         // |
    Caret,        // ^
    Ampersand,    // &
    PlusPlus,     // ++
    MinusMinus,   // --
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Tilde,        // ~
    Dot,          // .

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,

    Newline,

    // Extras
    Whitespace,
    LineContinuation, // \ followed by a newline
}

impl Token<'_> {
    /// Extras that may appear between any two tokens and carry no meaning.
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::LineContinuation)
    }

    /// Grammar name of the token class. Literal and trivia tokens use their
    /// rule name, every other token is named by its own text.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Identifier(_) => "identifier",
            Token::IntegerLiteral(_) => "integer_literal",
            Token::FloatLiteral(_) => "float_literal",
            Token::Newline => "newline",
            Token::Whitespace => "whitespace",
            Token::LineContinuation => "line_continuation",
            Token::Function => "function",
            Token::End => "end",
            Token::Signed => "signed",
            Token::Unsigned => "unsigned",
            Token::Float => "float",
            Token::Not => "not",
            Token::And => "and",
            Token::Or => "or",
            Token::FatArrow => "=>",
            Token::ColonEquals => ":=",
            Token::DoubleColon => "::",
            Token::Colon => ":",
            Token::EqualsEquals => "==",
            Token::NotEquals => "!=",
            Token::Equals => "=",
            Token::LessEqual => "<=",
            Token::Less => "<",
            Token::GreaterEqual => ">=",
            Token::Greater => ">",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Ampersand => "&",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Tilde => "~",
            Token::Dot => ".",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Comma => ",",
        }
    }

    /// Keyword lookup used after an identifier has been lexed.
    pub(crate) fn keyword(word: &str) -> Option<Token<'static>> {
        Some(match word {
            "function" => Token::Function,
            "end" => Token::End,
            "signed" => Token::Signed,
            "unsigned" => Token::Unsigned,
            "float" => Token::Float,
            "not" => Token::Not,
            "and" => Token::And,
            "or" => Token::Or,
            _ => return None,
        })
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Function => write!(f, "function"),
            Token::End => write!(f, "end"),
            Token::Signed => write!(f, "signed"),
            Token::Unsigned => write!(f, "unsigned"),
            Token::Float => write!(f, "float"),
            Token::Not => write!(f, "not"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),

            Token::Identifier(text) | Token::IntegerLiteral(text) | Token::FloatLiteral(text) => {
                write!(f, "{text}")
            }

            Token::FatArrow => write!(f, "=>"),
            Token::ColonEquals => write!(f, ":="),
            Token::DoubleColon => write!(f, "::"),
            Token::Colon => write!(f, ":"),
            Token::EqualsEquals => write!(f, "=="),
            Token::NotEquals => write!(f, "!="),
            Token::Equals => write!(f, "="),
            Token::LessEqual => write!(f, "<="),
            Token::Less => write!(f, "<"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Greater => write!(f, ">"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::Ampersand => write!(f, "&"),
            Token::PlusPlus => write!(f, "++"),
            Token::MinusMinus => write!(f, "--"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Tilde => write!(f, "~"),
            Token::Dot => write!(f, "."),

            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),

            Token::Newline => write!(f, "\\n"),
            Token::Whitespace => write!(f, " "),
            Token::LineContinuation => write!(f, "\\\\n"),
        }
    }
}
