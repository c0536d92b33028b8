//! Typed syntax tree for Zenith source files.
//!
//! Leaf values (identifiers, literal text, operators) are wrapped in
//! [`Spanned`]; composite nodes carry the span of everything they cover,
//! including the newline that terminates a definition or statement.
//! Identifier and literal text borrows from the source.

use std::fmt;

use crate::span::{Span, Spanned};

/// An identifier with its location.
pub type Name<'src> = Spanned<&'src str>;

/// How a line-terminated construct ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// A `\n` token.
    Newline(Span),
    /// End of input standing in for the final newline (`eof_tok`).
    EndOfInput,
}

impl Terminator {
    pub fn span(&self) -> Option<Span> {
        match self {
            Terminator::Newline(span) => Some(*span),
            Terminator::EndOfInput => None,
        }
    }

    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Terminator::EndOfInput)
    }
}

/// Root of the tree: every top-level definition in file order.
#[derive(Debug, Clone)]
pub struct SourceFile<'src> {
    pub definitions: Vec<Definition<'src>>,
    /// Always the whole input, `0..source.len()`.
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Definition<'src> {
    Number(NumberDefinition<'src>),
    Function(FunctionDefinition<'src>),
}

impl<'src> Definition<'src> {
    pub fn name(&self) -> &Name<'src> {
        match self {
            Definition::Number(number) => &number.name,
            Definition::Function(function) => &function.name,
        }
    }

    pub fn end_name(&self) -> &Name<'src> {
        match self {
            Definition::Number(number) => &number.end_name,
            Definition::Function(function) => &function.end_name,
        }
    }

    pub fn terminator(&self) -> Terminator {
        match self {
            Definition::Number(number) => number.terminator,
            Definition::Function(function) => function.terminator,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Definition::Number(number) => number.span,
            Definition::Function(function) => function.span,
        }
    }

    /// Word used for this kind of definition in messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Definition::Number(number) => number.kind.as_str(),
            Definition::Function(_) => "function",
        }
    }
}

/// The keyword that opens a number type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Signed,
    Unsigned,
    Float,
}

impl NumberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberKind::Signed => "signed",
            NumberKind::Unsigned => "unsigned",
            NumberKind::Float => "float",
        }
    }
}

/// `signed|unsigned|float Name` ... `end Name`, holding nested definitions.
#[derive(Debug, Clone)]
pub struct NumberDefinition<'src> {
    pub kind: Spanned<NumberKind>,
    pub name: Name<'src>,
    pub definitions: Vec<Definition<'src>>,
    pub end_name: Name<'src>,
    pub terminator: Terminator,
    pub span: Span,
}

/// `function name(params) => spec` ... `end name`.
#[derive(Debug, Clone)]
pub struct FunctionDefinition<'src> {
    pub name: Name<'src>,
    pub params: Parameters<'src>,
    pub return_spec: Option<ReturnSpec<'src>>,
    pub body: Vec<Statement<'src>>,
    pub end_name: Name<'src>,
    pub terminator: Terminator,
    pub span: Span,
}

/// Parenthesized parameter list of a function definition.
#[derive(Debug, Clone)]
pub struct Parameters<'src> {
    pub items: Vec<CreateInstance<'src>>,
    pub span: Span,
}

/// What follows `=>` in a function header: a bare type, or a named result.
#[derive(Debug, Clone)]
pub enum ReturnSpec<'src> {
    Type(TypeRef<'src>),
    Named(PatternAndType<'src>),
}

impl ReturnSpec<'_> {
    pub fn span(&self) -> Span {
        match self {
            ReturnSpec::Type(ty) => ty.span(),
            ReturnSpec::Named(binding) => binding.span,
        }
    }
}

/// `pattern : Type [= init]` or `pattern := value`.
#[derive(Debug, Clone)]
pub enum CreateInstance<'src> {
    Typed {
        binding: PatternAndType<'src>,
        init: Option<Expr<'src>>,
        span: Span,
    },
    Inferred {
        pattern: Pattern<'src>,
        value: Expr<'src>,
        span: Span,
    },
}

impl<'src> CreateInstance<'src> {
    pub fn pattern(&self) -> &Pattern<'src> {
        match self {
            CreateInstance::Typed { binding, .. } => &binding.pattern,
            CreateInstance::Inferred { pattern, .. } => pattern,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            CreateInstance::Typed { span, .. } | CreateInstance::Inferred { span, .. } => *span,
        }
    }
}

/// `pattern : Type`.
#[derive(Debug, Clone)]
pub struct PatternAndType<'src> {
    pub pattern: Pattern<'src>,
    pub ty: TypeRef<'src>,
    pub span: Span,
}

/// Binding position; currently always a (possibly qualified) name.
#[derive(Debug, Clone)]
pub struct Pattern<'src>(pub QualifiedName<'src>);

impl Pattern<'_> {
    pub fn span(&self) -> Span {
        self.0.span
    }
}

/// Type position; currently always a (possibly qualified) name.
#[derive(Debug, Clone)]
pub struct TypeRef<'src>(pub QualifiedName<'src>);

impl TypeRef<'_> {
    pub fn span(&self) -> Span {
        self.0.span
    }
}

/// `ns::ns::name` with optional `::<template args>`.
#[derive(Debug, Clone)]
pub struct QualifiedName<'src> {
    pub namespaces: Vec<Name<'src>>,
    pub name: Name<'src>,
    pub template_params: Option<Arguments<'src>>,
    pub span: Span,
}

impl QualifiedName<'_> {
    /// True for a single identifier with no namespaces or template arguments.
    pub fn is_simple(&self) -> bool {
        self.namespaces.is_empty() && self.template_params.is_none()
    }
}

/// Argument list of a call `( ... )` or template instantiation `< ... >`.
#[derive(Debug, Clone)]
pub struct Arguments<'src> {
    pub items: Vec<Argument<'src>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Argument<'src> {
    Positional(Expr<'src>),
    Keyword(Kwarg<'src>),
}

impl Argument<'_> {
    pub fn span(&self) -> Span {
        match self {
            Argument::Positional(expr) => expr.span(),
            Argument::Keyword(kwarg) => kwarg.span,
        }
    }
}

/// `pattern = value` inside an argument list.
#[derive(Debug, Clone)]
pub struct Kwarg<'src> {
    pub pattern: Pattern<'src>,
    pub value: Expr<'src>,
    pub span: Span,
}

/// Binding power of prefix operators.
pub const UNARY_PRECEDENCE: u8 = 10;

/// Binding power of `[]`, `.` and call suffixes.
pub const POSTFIX_PRECEDENCE: u8 = 11;

/// Deepest expression tree the parser builds. Every operator, parenthesis,
/// postfix suffix and argument list adds a level.
pub const MAX_EXPRESSION_DEPTH: usize = 128;

/// Deepest chain of number definitions nested inside each other.
pub const MAX_DEFINITION_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "not",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Binary operators, all left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    BitOr,
    BitXor,
    BitAnd,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Higher binds tighter; ranges from 1 (`or`) to 9 (`*`).
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::NotEq => 3,
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => 4,
            BinaryOp::BitOr => 5,
            BinaryOp::BitXor => 6,
            BinaryOp::BitAnd => 7,
            BinaryOp::Add | BinaryOp::Sub => 8,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 9,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr<'src> {
    Name(QualifiedName<'src>),
    Integer(Spanned<&'src str>),
    Float(Spanned<&'src str>),
    Paren {
        inner: Box<Expr<'src>>,
        span: Span,
    },
    Unary {
        op: Spanned<UnaryOp>,
        operand: Box<Expr<'src>>,
        span: Span,
    },
    Binary {
        lhs: Box<Expr<'src>>,
        op: Spanned<BinaryOp>,
        rhs: Box<Expr<'src>>,
        span: Span,
    },
    Index {
        target: Box<Expr<'src>>,
        index: Box<Expr<'src>>,
        span: Span,
    },
    Member {
        target: Box<Expr<'src>>,
        member: Name<'src>,
        span: Span,
    },
    Call(CallExpr<'src>),
}

impl Expr<'_> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name(name) => name.span,
            Expr::Integer(text) | Expr::Float(text) => text.span(),
            Expr::Paren { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Index { span, .. }
            | Expr::Member { span, .. } => *span,
            Expr::Call(call) => call.span,
        }
    }

    /// Value of an integer literal, if it fits in a `u64`.
    pub fn integer_value(&self) -> Option<u64> {
        match self {
            Expr::Integer(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// Value of a float literal.
    pub fn float_value(&self) -> Option<f64> {
        match self {
            Expr::Float(text) => text.parse().ok(),
            _ => None,
        }
    }
}

/// `callee(args)`.
#[derive(Debug, Clone)]
pub struct CallExpr<'src> {
    pub callee: Box<Expr<'src>>,
    pub args: Arguments<'src>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Increment,
    Decrement,
}

impl IncDecOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncDecOp::Increment => "++",
            IncDecOp::Decrement => "--",
        }
    }
}

/// A line in a function body.
#[derive(Debug, Clone)]
pub enum Statement<'src> {
    CreateInstance {
        instance: CreateInstance<'src>,
        terminator: Terminator,
        span: Span,
    },
    ModifyInstance {
        pattern: Pattern<'src>,
        value: Expr<'src>,
        terminator: Terminator,
        span: Span,
    },
    FunctionCall {
        call: CallExpr<'src>,
        terminator: Terminator,
        span: Span,
    },
    IncDec {
        target: QualifiedName<'src>,
        op: Spanned<IncDecOp>,
        terminator: Terminator,
        span: Span,
    },
}

impl Statement<'_> {
    pub fn span(&self) -> Span {
        match self {
            Statement::CreateInstance { span, .. }
            | Statement::ModifyInstance { span, .. }
            | Statement::FunctionCall { span, .. }
            | Statement::IncDec { span, .. } => *span,
        }
    }

    pub fn terminator(&self) -> Terminator {
        match self {
            Statement::CreateInstance { terminator, .. }
            | Statement::ModifyInstance { terminator, .. }
            | Statement::FunctionCall { terminator, .. }
            | Statement::IncDec { terminator, .. } => *terminator,
        }
    }
}

// Display renders expressions in a canonical form: every unary and binary
// expression is parenthesized and source parentheses are dropped.

impl fmt::Display for QualifiedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for namespace in &self.namespaces {
            write!(f, "{namespace}::")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(params) = &self.template_params {
            write!(f, "::<{params}>")?;
        }
        Ok(())
    }
}

impl fmt::Display for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match item {
                Argument::Positional(expr) => write!(f, "{expr}")?,
                Argument::Keyword(kwarg) => write!(f, "{} = {}", kwarg.pattern.0, kwarg.value)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(name) => write!(f, "{name}"),
            Expr::Integer(text) | Expr::Float(text) => write!(f, "{text}"),
            Expr::Paren { inner, .. } => write!(f, "{inner}"),
            Expr::Unary { op, operand, .. } => match op.inner() {
                UnaryOp::Not => write!(f, "(not {operand})"),
                other => write!(f, "({}{operand})", other.as_str()),
            },
            Expr::Binary { lhs, op, rhs, .. } => write!(f, "({lhs} {} {rhs})", op.as_str()),
            Expr::Index { target, index, .. } => write!(f, "{target}[{index}]"),
            Expr::Member { target, member, .. } => write!(f, "{target}.{member}"),
            Expr::Call(call) => write!(f, "{}({})", call.callee, call.args),
        }
    }
}
