use log::{debug, trace};
use winnow::{
    ModalResult, Parser as _,
    combinator::repeat,
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{
        Argument, Arguments, BinaryOp, CallExpr, CreateInstance, Definition, Expr,
        FunctionDefinition, IncDecOp, Kwarg, MAX_DEFINITION_DEPTH, MAX_EXPRESSION_DEPTH, Name,
        NumberDefinition, NumberKind, Parameters, Pattern, PatternAndType, QualifiedName,
        ReturnSpec, SourceFile, Statement, Terminator, TypeRef, UNARY_PRECEDENCE, UnaryOp,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

#[derive(Debug, Clone)]
pub(crate) enum Context {
    /// What the parser expected at the failure position
    Label(&'static str),
    /// Enclosing construct, reported as help
    Construct(&'static str),
    /// Nesting limit hit while parsing `what`
    TooDeep { what: &'static str, limit: usize },
}

type Input<'t, 'src> = TokenSlice<'t, PositionedToken<'src>>;
type IResult<O> = ModalResult<O, ContextError<Context>>;

/// Run `f`, turning any backtrack into a cut once the construct is committed.
fn cut_err<'t, 'src, O, F>(input: &mut Input<'t, 'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'t, 'src>) -> IResult<O>,
{
    f(input).map_err(ErrMode::cut)
}

/// Backtrack error at the current position.
fn expected<O>(input: &Input<'_, '_>, label: &'static str) -> IResult<O> {
    Err(ErrMode::Backtrack(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        Context::Label(label),
    )))
}

/// Cut error for input nested deeper than `limit` levels.
fn too_deep<O>(input: &Input<'_, '_>, what: &'static str, limit: usize) -> IResult<O> {
    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        Context::TooDeep { what, limit },
    )))
}

/// Tag errors from `result` with the construct being parsed.
fn within<O>(input: &Input<'_, '_>, construct: &'static str, result: IResult<O>) -> IResult<O> {
    result.map_err(|err| {
        err.map(|e| e.add_context(input, &input.checkpoint(), Context::Construct(construct)))
    })
}

fn peek<'t, 'src>(input: &mut Input<'t, 'src>) -> Option<&'t PositionedToken<'src>> {
    let checkpoint = input.checkpoint();
    let token = input.next_token();
    input.reset(&checkpoint);
    token
}

fn at(input: &mut Input<'_, '_>, kind: Token<'static>) -> bool {
    peek(input).is_some_and(|token| token.token == kind)
}

fn eat(input: &mut Input<'_, '_>, kind: Token<'static>) -> bool {
    let found = at(input, kind);
    if found {
        let _ = input.next_token();
    }
    found
}

fn expect<'t, 'src>(
    input: &mut Input<'t, 'src>,
    kind: Token<'static>,
    label: &'static str,
) -> IResult<&'t PositionedToken<'src>> {
    any.verify(|token: &PositionedToken<'_>| token.token == kind)
        .context(Context::Label(label))
        .parse_next(input)
}

fn newline(input: &mut Input<'_, '_>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| matches!(token.token, Token::Newline))
        .void()
        .parse_next(input)
}

/// Blank lines; accepted wherever a definition or statement may start.
fn newlines0(input: &mut Input<'_, '_>) -> IResult<()> {
    repeat(0.., newline).parse_next(input)
}

/// `"\n"` or end of input (`eof_tok`).
fn terminator(input: &mut Input<'_, '_>) -> IResult<Terminator> {
    match peek(input) {
        None => Ok(Terminator::EndOfInput),
        Some(token) if matches!(token.token, Token::Newline) => {
            let _ = input.next_token();
            Ok(Terminator::Newline(token.span))
        }
        Some(_) => expected(input, "end of line"),
    }
}

/// Span of a line-terminated construct: its content plus the newline, if any.
fn line_span(content: Span, terminator: Terminator) -> Span {
    terminator
        .span()
        .map_or(content, |newline| content.union(newline))
}

fn identifier<'src>(input: &mut Input<'_, 'src>) -> IResult<Name<'src>> {
    any.verify_map(|token: &PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(name, token.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

/// `ns::ns::name` with an optional `::<args>` suffix, plus its height.
///
/// The name sits `depth` levels into an expression; template arguments are
/// one level deeper.
fn qualified_name<'src>(
    input: &mut Input<'_, 'src>,
    depth: usize,
) -> IResult<(QualifiedName<'src>, usize)> {
    let mut name = identifier(input)?;
    let mut namespaces = Vec::new();
    let mut template_params = None;
    let mut args_height = 0;

    while eat(input, Token::DoubleColon) {
        if at(input, Token::Less) {
            let (params, height) = template_parameters(input, depth + 1)?;
            template_params = Some(params);
            args_height = height;
            break;
        }
        let next = identifier(input).map_err(ErrMode::cut)?;
        namespaces.push(std::mem::replace(&mut name, next));
    }

    let start = namespaces.first().map_or(name.span(), |ns| ns.span());
    let end = template_params
        .as_ref()
        .map_or(name.span(), |params| params.span);

    let name = QualifiedName {
        namespaces,
        name,
        template_params,
        span: start.union(end),
    };
    Ok((name, args_height + 1))
}

/// A qualified name heading a statement, parameter or return spec.
fn binding_name<'src>(input: &mut Input<'_, 'src>) -> IResult<QualifiedName<'src>> {
    qualified_name(input, 1).map(|(name, _)| name)
}

fn pattern<'src>(input: &mut Input<'_, 'src>) -> IResult<Pattern<'src>> {
    binding_name.map(Pattern).parse_next(input)
}

fn type_ref<'src>(input: &mut Input<'_, 'src>) -> IResult<TypeRef<'src>> {
    binding_name
        .map(TypeRef)
        .context(Context::Label("type"))
        .parse_next(input)
}

/// Comma separated items between already-consumed open and `close`:
/// `newlines* (item (, newlines* item)* ,? newlines*)?`
fn separated_items<'t, 'src, O, F>(
    input: &mut Input<'t, 'src>,
    close: Token<'static>,
    mut item: F,
) -> IResult<Vec<O>>
where
    F: FnMut(&mut Input<'t, 'src>) -> IResult<O>,
{
    let mut items = Vec::new();
    newlines0(input)?;
    if at(input, close) {
        return Ok(items);
    }

    loop {
        items.push(item(input)?);
        if !eat(input, Token::Comma) {
            newlines0(input)?;
            break;
        }
        newlines0(input)?;
        if at(input, close) {
            break;
        }
    }

    Ok(items)
}

/// Split arguments from their heights; the list is as tall as its tallest item.
fn tallest<'src>(items: Vec<(Argument<'src>, usize)>) -> (Vec<Argument<'src>>, usize) {
    let height = items.iter().map(|(_, height)| *height).max().unwrap_or(0);
    (items.into_iter().map(|(item, _)| item).collect(), height)
}

/// `< args >`, each argument at `depth`.
fn template_parameters<'src>(
    input: &mut Input<'_, 'src>,
    depth: usize,
) -> IResult<(Arguments<'src>, usize)> {
    let open = expect(input, Token::Less, "`<`")?;
    cut_err(input, |input| {
        let items =
            separated_items(input, Token::Greater, |input| argument(input, true, depth))?;
        let close = expect(input, Token::Greater, "`,` or `>`")?;
        let (items, height) = tallest(items);
        let args = Arguments {
            items,
            span: open.span.union(close.span),
        };
        Ok((args, height))
    })
}

/// `( args )`, each argument at `depth`.
fn call_arguments<'src>(
    input: &mut Input<'_, 'src>,
    depth: usize,
) -> IResult<(Arguments<'src>, usize)> {
    let open = expect(input, Token::LeftParen, "`(`")?;
    cut_err(input, |input| {
        let items =
            separated_items(input, Token::RightParen, |input| argument(input, false, depth))?;
        let close = expect(input, Token::RightParen, "`,` or `)`")?;
        let (items, height) = tallest(items);
        let args = Arguments {
            items,
            span: open.span.union(close.span),
        };
        Ok((args, height))
    })
}

/// `pattern = expr` or a positional expression.
///
/// The leading expression is parsed once; a bare name followed by `=` turns
/// into the keyword's pattern.
fn argument<'src>(
    input: &mut Input<'_, 'src>,
    in_template: bool,
    depth: usize,
) -> IResult<(Argument<'src>, usize)> {
    let (first, height) = expression_bp(input, 1, in_template, depth)?;

    match first {
        Expr::Name(name) if eat(input, Token::Equals) => {
            let pattern = Pattern(name);
            let (value, value_height) = expression_bp(input, 1, in_template, depth)?;
            let span = pattern.span().union(value.span());
            let kwarg = Kwarg {
                pattern,
                value,
                span,
            };
            Ok((Argument::Keyword(kwarg), height.max(value_height)))
        }
        positional => Ok((Argument::Positional(positional), height)),
    }
}

fn binary_operator(token: Token<'_>) -> Option<BinaryOp> {
    Some(match token {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::EqualsEquals => BinaryOp::Eq,
        Token::NotEquals => BinaryOp::NotEq,
        Token::Less => BinaryOp::Less,
        Token::LessEqual => BinaryOp::LessEq,
        Token::Greater => BinaryOp::Greater,
        Token::GreaterEqual => BinaryOp::GreaterEq,
        Token::Pipe => BinaryOp::BitOr,
        Token::Caret => BinaryOp::BitXor,
        Token::Ampersand => BinaryOp::BitAnd,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        _ => return None,
    })
}

fn unary_operator(token: Token<'_>) -> Option<UnaryOp> {
    Some(match token {
        Token::Plus => UnaryOp::Plus,
        Token::Minus => UnaryOp::Minus,
        Token::Not => UnaryOp::Not,
        Token::Tilde => UnaryOp::BitNot,
        _ => return None,
    })
}

/// Parse a full expression rooted `depth` levels below its statement.
pub(crate) fn expression<'src>(input: &mut Input<'_, 'src>, depth: usize) -> IResult<Expr<'src>> {
    expression_bp(input, 1, false, depth).map(|(expr, _)| expr)
}

/// Precedence climbing. Only binary operators binding at least
/// `min_precedence` are consumed; postfix suffixes always bind.
///
/// With `in_template` set, `>` and `>=` end the expression so they can close
/// a template parameter list. Parentheses, brackets and call arguments clear
/// the flag again.
///
/// Returns the expression with its height. The root sits at `depth`, and no
/// node may end up below [`MAX_EXPRESSION_DEPTH`].
fn expression_bp<'src>(
    input: &mut Input<'_, 'src>,
    min_precedence: u8,
    in_template: bool,
    depth: usize,
) -> IResult<(Expr<'src>, usize)> {
    let (lhs, height) = prefix_expression(input, in_template, depth)?;
    expression_suffix(input, lhs, height, min_precedence, in_template, depth)
}

/// Postfix suffixes and binary operators following an already parsed `lhs`.
fn expression_suffix<'src>(
    input: &mut Input<'_, 'src>,
    mut lhs: Expr<'src>,
    mut height: usize,
    min_precedence: u8,
    in_template: bool,
    depth: usize,
) -> IResult<(Expr<'src>, usize)> {
    while let Some(next) = peek(input) {
        let (expr, child_height) = match next.token {
            Token::LeftBracket => {
                let _ = input.next_token();
                let (index, index_height) = expression_bp(input, 1, false, depth + 1)?;
                let close = expect(input, Token::RightBracket, "`]`")?;
                let span = lhs.span().union(close.span);
                let expr = Expr::Index {
                    target: Box::new(lhs),
                    index: Box::new(index),
                    span,
                };
                (expr, index_height)
            }
            Token::Dot => {
                let _ = input.next_token();
                let member = identifier(input)?;
                let span = lhs.span().union(member.span());
                let expr = Expr::Member {
                    target: Box::new(lhs),
                    member,
                    span,
                };
                (expr, 1)
            }
            Token::LeftParen => {
                let (args, args_height) = call_arguments(input, depth + 1)?;
                let span = lhs.span().union(args.span);
                let expr = Expr::Call(CallExpr {
                    callee: Box::new(lhs),
                    args,
                    span,
                });
                (expr, args_height)
            }
            token => {
                let Some(op) = binary_operator(token) else {
                    break;
                };
                if in_template && matches!(op, BinaryOp::Greater | BinaryOp::GreaterEq) {
                    break;
                }
                if op.precedence() < min_precedence {
                    break;
                }
                let _ = input.next_token();
                let (rhs, rhs_height) =
                    expression_bp(input, op.precedence() + 1, in_template, depth + 1)?;
                let span = lhs.span().union(rhs.span());
                let expr = Expr::Binary {
                    lhs: Box::new(lhs),
                    op: Spanned::new(op, next.span),
                    rhs: Box::new(rhs),
                    span,
                };
                (expr, rhs_height)
            }
        };

        // The old `lhs` moved one level down.
        height = height.max(child_height) + 1;
        if depth + height - 1 > MAX_EXPRESSION_DEPTH {
            return too_deep(input, "expression", MAX_EXPRESSION_DEPTH);
        }
        lhs = expr;
    }

    Ok((lhs, height))
}

/// Literals, names, parenthesized expressions and prefix operators.
fn prefix_expression<'src>(
    input: &mut Input<'_, 'src>,
    in_template: bool,
    depth: usize,
) -> IResult<(Expr<'src>, usize)> {
    if depth > MAX_EXPRESSION_DEPTH {
        return too_deep(input, "expression", MAX_EXPRESSION_DEPTH);
    }
    let Some(next) = peek(input) else {
        return expected(input, "expression");
    };

    if let Some(op) = unary_operator(next.token) {
        let _ = input.next_token();
        let (operand, height) = expression_bp(input, UNARY_PRECEDENCE, in_template, depth + 1)?;
        let span = next.span.union(operand.span());
        let expr = Expr::Unary {
            op: Spanned::new(op, next.span),
            operand: Box::new(operand),
            span,
        };
        return Ok((expr, height + 1));
    }

    match next.token {
        Token::Identifier(_) => {
            let (name, height) = qualified_name(input, depth)?;
            Ok((Expr::Name(name), height))
        }
        Token::IntegerLiteral(text) => {
            let _ = input.next_token();
            Ok((Expr::Integer(Spanned::new(text, next.span)), 1))
        }
        Token::FloatLiteral(text) => {
            let _ = input.next_token();
            Ok((Expr::Float(Spanned::new(text, next.span)), 1))
        }
        Token::LeftParen => {
            let _ = input.next_token();
            let (inner, height) = expression_bp(input, 1, false, depth + 1)?;
            let close = expect(input, Token::RightParen, "`)`")?;
            let expr = Expr::Paren {
                inner: Box::new(inner),
                span: next.span.union(close.span),
            };
            Ok((expr, height + 1))
        }
        _ => expected(input, "expression"),
    }
}

/// `pattern : Type [= expr]` or `pattern := expr`.
fn create_instance<'src>(input: &mut Input<'_, 'src>) -> IResult<CreateInstance<'src>> {
    let pattern = pattern(input)?;
    create_instance_after(input, pattern)
}

/// The `: Type [= expr]` or `:= expr` rest of a create-instance.
fn create_instance_after<'src>(
    input: &mut Input<'_, 'src>,
    pattern: Pattern<'src>,
) -> IResult<CreateInstance<'src>> {
    if eat(input, Token::Colon) {
        let ty = type_ref(input)?;
        let binding = PatternAndType {
            span: pattern.span().union(ty.span()),
            pattern,
            ty,
        };
        let init = if eat(input, Token::Equals) {
            Some(expression(input, 1)?)
        } else {
            None
        };
        let span = init
            .as_ref()
            .map_or(binding.span, |init| binding.span.union(init.span()));
        return Ok(CreateInstance::Typed {
            binding,
            init,
            span,
        });
    }

    if eat(input, Token::ColonEquals) {
        let value = expression(input, 1)?;
        let span = pattern.span().union(value.span());
        return Ok(CreateInstance::Inferred {
            pattern,
            value,
            span,
        });
    }

    expected(input, "`:` or `:=`")
}

/// One line of a function body.
///
/// A leading name is parsed once and then either becomes the statement's
/// target or the head of a call expression.
fn statement<'src>(input: &mut Input<'_, 'src>) -> IResult<Statement<'src>> {
    let start = input.checkpoint();

    let expr = if matches!(peek(input).map(|t| t.token), Some(Token::Identifier(_))) {
        let (target, height) = qualified_name(input, 1)?;

        match peek(input).map(|t| t.token) {
            Some(Token::Colon | Token::ColonEquals) => {
                let instance = create_instance_after(input, Pattern(target))?;
                let terminator = terminator(input)?;
                return Ok(Statement::CreateInstance {
                    span: line_span(instance.span(), terminator),
                    instance,
                    terminator,
                });
            }
            Some(Token::Equals) => {
                let _ = input.next_token();
                let value = expression(input, 1)?;
                let terminator = terminator(input)?;
                return Ok(Statement::ModifyInstance {
                    span: line_span(target.span.union(value.span()), terminator),
                    pattern: Pattern(target),
                    value,
                    terminator,
                });
            }
            Some(Token::PlusPlus | Token::MinusMinus) => {
                let Some(token) = input.next_token() else {
                    return expected(input, "`++` or `--`");
                };
                let op = match token.token {
                    Token::PlusPlus => IncDecOp::Increment,
                    _ => IncDecOp::Decrement,
                };
                let terminator = terminator(input)?;
                return Ok(Statement::IncDec {
                    span: line_span(target.span.union(token.span), terminator),
                    target,
                    op: Spanned::new(op, token.span),
                    terminator,
                });
            }
            _ => expression_suffix(input, Expr::Name(target), height, 1, false, 1)?.0,
        }
    } else {
        expression(input, 1)?
    };

    match expr {
        Expr::Call(call) => {
            let terminator = terminator(input)?;
            Ok(Statement::FunctionCall {
                span: line_span(call.span, terminator),
                call,
                terminator,
            })
        }
        _ => {
            input.reset(&start);
            expected(input, "statement")
        }
    }
}

/// `end name` plus its terminator.
fn definition_end<'src>(input: &mut Input<'_, 'src>) -> IResult<(Name<'src>, Terminator)> {
    expect(input, Token::End, "`end`")?;
    let end_name = identifier(input)?;
    let terminator = terminator(input)?;
    Ok((end_name, terminator))
}

fn number_kind(input: &mut Input<'_, '_>) -> IResult<Spanned<NumberKind>> {
    any.verify_map(|token: &PositionedToken<'_>| {
        let kind = match token.token {
            Token::Signed => NumberKind::Signed,
            Token::Unsigned => NumberKind::Unsigned,
            Token::Float => NumberKind::Float,
            _ => return None,
        };
        Some(Spanned::new(kind, token.span))
    })
    .context(Context::Label("`signed`, `unsigned` or `float`"))
    .parse_next(input)
}

/// `signed|unsigned|float Name NL definitions* end Name NL`, nested `depth`
/// definitions deep.
fn number_definition<'src>(
    input: &mut Input<'_, 'src>,
    depth: usize,
) -> IResult<NumberDefinition<'src>> {
    let kind = number_kind(input)?;

    let result = cut_err(input, |input| {
        let name = identifier(input)?;
        terminator(input)?;

        let mut definitions = Vec::new();
        loop {
            newlines0(input)?;
            if peek(input).is_none_or(|t| matches!(t.token, Token::End)) {
                break;
            }
            definitions.push(definition(input, depth + 1)?);
        }

        let (end_name, terminator) = definition_end(input)?;
        Ok(NumberDefinition {
            span: line_span(kind.span().union(end_name.span()), terminator),
            kind,
            name,
            definitions,
            end_name,
            terminator,
        })
    });
    within(input, "number definition", result)
}

/// `function name(params) [=> spec] NL statements* end name NL`
fn function_definition<'src>(input: &mut Input<'_, 'src>) -> IResult<FunctionDefinition<'src>> {
    let keyword = expect(input, Token::Function, "`function`")?;

    let result = cut_err(input, |input| {
        let name = identifier(input)?;

        let open = expect(input, Token::LeftParen, "`(`")?;
        let items = separated_items(input, Token::RightParen, create_instance)?;
        let close = expect(input, Token::RightParen, "`,` or `)`")?;
        let params = Parameters {
            items,
            span: open.span.union(close.span),
        };

        let return_spec = if eat(input, Token::FatArrow) {
            Some(return_spec(input)?)
        } else {
            None
        };
        terminator(input)?;

        let mut body = Vec::new();
        loop {
            newlines0(input)?;
            if peek(input).is_none_or(|t| matches!(t.token, Token::End)) {
                break;
            }
            body.push(statement(input)?);
        }

        let (end_name, terminator) = definition_end(input)?;
        Ok(FunctionDefinition {
            span: line_span(keyword.span.union(end_name.span()), terminator),
            name,
            params,
            return_spec,
            body,
            end_name,
            terminator,
        })
    });
    within(input, "function definition", result)
}

/// `Type` or `pattern : Type` after `=>`.
fn return_spec<'src>(input: &mut Input<'_, 'src>) -> IResult<ReturnSpec<'src>> {
    let name = binding_name
        .context(Context::Label("return type"))
        .parse_next(input)?;

    if eat(input, Token::Colon) {
        let pattern = Pattern(name);
        let ty = type_ref(input)?;
        return Ok(ReturnSpec::Named(PatternAndType {
            span: pattern.span().union(ty.span()),
            pattern,
            ty,
        }));
    }

    Ok(ReturnSpec::Type(TypeRef(name)))
}

fn definition<'src>(input: &mut Input<'_, 'src>, depth: usize) -> IResult<Definition<'src>> {
    if depth > MAX_DEFINITION_DEPTH {
        return too_deep(input, "definition", MAX_DEFINITION_DEPTH);
    }
    match peek(input).map(|t| t.token) {
        Some(Token::Function) => function_definition
            .map(Definition::Function)
            .parse_next(input),
        Some(Token::Signed | Token::Unsigned | Token::Float) => {
            number_definition(input, depth).map(Definition::Number)
        }
        _ => expected(input, "`function`, `signed`, `unsigned` or `float`"),
    }
}

fn starts_definition(token: Token<'_>) -> bool {
    matches!(
        token,
        Token::Function | Token::Signed | Token::Unsigned | Token::Float
    )
}

/// Skip past a failed definition to the next definition keyword that starts a line.
fn recover(input: &mut Input<'_, '_>) {
    let _ = input.next_token();
    let mut line_start = false;
    while let Some(next) = peek(input) {
        if line_start && starts_definition(next.token) {
            break;
        }
        line_start = matches!(next.token, Token::Newline);
        let _ = input.next_token();
    }
}

fn describe(token: Token<'_>) -> String {
    match token {
        Token::Newline => "end of line".to_string(),
        Token::Identifier(name) => format!("identifier `{name}`"),
        other => format!("`{other}`"),
    }
}

/// Convert a winnow error into a diagnostic pointing at the token where
/// parsing stopped (`current_remaining` tokens before the end).
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let mut expected = None;
    let mut construct = None;
    let mut too_deep = None;
    if let ErrMode::Backtrack(e) | ErrMode::Cut(e) = &error {
        for ctx in e.context() {
            match ctx {
                Context::Label(label) => {
                    expected.get_or_insert(*label);
                }
                Context::Construct(name) => {
                    construct.get_or_insert(*name);
                }
                Context::TooDeep { what, limit } => {
                    too_deep.get_or_insert((*what, *limit));
                }
            }
        }
    }
    let expected = expected.unwrap_or("a token");

    let position = tokens.len() - current_remaining;
    let end = tokens.last().map_or(0, |token| token.span.end());
    let diagnostic = match (too_deep, tokens.get(position)) {
        (Some((what, limit)), found) => {
            let span = found.map_or(Span::empty(end), |token| token.span);
            Diagnostic::error(format!("{what} nested too deeply"))
                .with_code(ErrorCode::E102)
                .with_label(span, format!("more than {limit} levels deep"))
        }
        (None, Some(found)) => Diagnostic::error(format!(
            "expected {expected}, found {}",
            describe(found.token)
        ))
        .with_code(ErrorCode::E100)
        .with_label(found.span, "unexpected token"),
        (None, None) => {
            Diagnostic::error(format!("unexpected end of input, expected {expected}"))
                .with_code(ErrorCode::E101)
                .with_label(Span::empty(end), "input ends here")
        }
    };

    match construct {
        Some(construct) => diagnostic.with_help(format!("while parsing a {construct}")),
        None => diagnostic,
    }
}

/// Build the syntax tree for a file from trivia-free tokens.
///
/// A definition that fails to parse is reported and skipped, and parsing
/// resumes at the next line starting with a definition keyword, so one call
/// reports every broken definition.
pub fn build_source_file<'src>(
    tokens: &[PositionedToken<'src>],
) -> Result<SourceFile<'src>, ParseError> {
    let mut input = TokenSlice::new(tokens);
    let mut definitions = Vec::new();
    let mut diagnostics = DiagnosticCollector::new();

    loop {
        if let Err(err) = newlines0(&mut input) {
            diagnostics.emit(convert_error(err, tokens, input.eof_offset()));
            break;
        }
        if input.eof_offset() == 0 {
            break;
        }

        let start = input.checkpoint();
        match definition(&mut input, 1) {
            Ok(definition) => {
                trace!(name = *definition.name().inner(); "Parsed definition");
                definitions.push(definition);
            }
            Err(err) => {
                diagnostics.emit(convert_error(err, tokens, input.eof_offset()));
                input.reset(&start);
                recover(&mut input);
                trace!(remaining = input.eof_offset(); "Recovered after parse error");
            }
        }
    }

    diagnostics.finish()?;

    let end = tokens.last().map_or(0, |token| token.span.end());
    debug!(definitions = definitions.len(); "Built source file");
    Ok(SourceFile {
        definitions,
        span: Span::new(0..end),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn significant(input: &str) -> Vec<PositionedToken<'_>> {
        tokenize(input)
            .expect("Failed to tokenize input")
            .into_iter()
            .filter(|t| !t.is_trivia())
            .collect()
    }

    /// Parse `input` as one expression and render it in canonical form.
    fn expr(input: &str) -> String {
        let tokens = significant(input);
        let mut token_slice = TokenSlice::new(&tokens);
        let parsed = expression(&mut token_slice, 1).expect("expression should parse");
        assert_eq!(token_slice.eof_offset(), 0, "unconsumed tokens in {input:?}");
        parsed.to_string()
    }

    #[test]
    fn test_multiplicative_binds_tighter() {
        assert_eq!(expr("a + b * c"), "(a + (b * c))");
        assert_eq!(expr("a * b + c"), "((a * b) + c)");
        assert_eq!(expr("a % b / c"), "((a % b) / c)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(expr("a - b - c"), "((a - b) - c)");
        assert_eq!(expr("a or b or c"), "((a or b) or c)");
        assert_eq!(expr("a < b < c"), "((a < b) < c)");
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(expr("a or b and c"), "(a or (b and c))");
        assert_eq!(expr("a and b == c"), "(a and (b == c))");
        assert_eq!(expr("a != b <= c"), "(a != (b <= c))");
        assert_eq!(expr("a >= b | c"), "(a >= (b | c))");
        assert_eq!(expr("a | b ^ c & d"), "(a | (b ^ (c & d)))");
        assert_eq!(expr("a & b + c"), "(a & (b + c))");
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(expr("-a * b"), "((-a) * b)");
        assert_eq!(expr("not a and b"), "((not a) and b)");
        assert_eq!(expr("- -a"), "(-(-a))");
        assert_eq!(expr("~a.b"), "(~a.b)");
        assert_eq!(expr("+1.5"), "(+1.5)");
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(expr("a.b[c](d).e"), "a.b[c](d).e");
        assert_eq!(expr("f()()"), "f()()");
        assert_eq!(expr("m[i + 1][j]"), "m[(i + 1)][j]");
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(expr("(a + b) * c"), "((a + b) * c)");
        assert_eq!(expr("(f)(x)"), "f(x)");
    }

    #[test]
    fn test_call_arguments() {
        assert_eq!(expr("f(a, b = 1 + 2)"), "f(a, b = (1 + 2))");
        assert_eq!(expr("f(\n  a,\n  b,\n)"), "f(a, b)");
        assert_eq!(expr("f(\n)"), "f()");
        assert_eq!(expr("f(a == b)"), "f((a == b))");
    }

    #[test]
    fn test_qualified_names() {
        assert_eq!(expr("std::math::pi"), "std::math::pi");
        assert_eq!(expr("f::<N>(x)"), "f::<N>(x)");
        assert_eq!(expr("Array::<T, size = 4>"), "Array::<T, size = 4>");
    }

    #[test]
    fn test_greater_than_inside_template() {
        assert_eq!(expr("T::<(a > b)>"), "T::<(a > b)>");
        assert_eq!(expr("T::<f(a > b)>"), "T::<f((a > b))>");
        assert_eq!(expr("T::<a < b>"), "T::<(a < b)>");
        assert_eq!(expr("x::<N> > 3"), "(x::<N> > 3)");
    }

    #[test]
    fn test_literals() {
        let tokens = significant("42");
        let mut token_slice = TokenSlice::new(&tokens);
        let parsed = expression(&mut token_slice, 1).expect("literal");
        assert_eq!(parsed.integer_value(), Some(42));

        let tokens = significant(".5e2");
        let mut token_slice = TokenSlice::new(&tokens);
        let parsed = expression(&mut token_slice, 1).expect("literal");
        assert_eq!(parsed.float_value(), Some(50.0));
    }

    #[test]
    fn test_binary_spans() {
        let tokens = significant("a + bc * 2");
        let mut token_slice = TokenSlice::new(&tokens);
        let parsed = expression(&mut token_slice, 1).expect("expression");
        assert_eq!(parsed.span(), Span::new(0..10));

        let Expr::Binary { op, rhs, .. } = parsed else {
            panic!("expected binary expression");
        };
        assert_eq!(*op.inner(), BinaryOp::Add);
        assert_eq!(op.span(), Span::new(2..3));
        assert_eq!(rhs.span(), Span::new(4..10));
    }

    #[test]
    fn test_missing_operand_is_error() {
        let tokens = significant("a +");
        let mut token_slice = TokenSlice::new(&tokens);
        assert!(expression(&mut token_slice, 1).is_err());
    }
}
