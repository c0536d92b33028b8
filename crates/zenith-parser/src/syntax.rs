//! Generic node view of a parsed file.
//!
//! [`SyntaxNode`] mirrors the node shape of the grammar: one node per named,
//! visible rule, with children optionally tagged by a [`Field`]. Hidden rules
//! (`_expr`, `_statement`, ...) are inlined into their parent and anonymous
//! tokens (keywords, operators, punctuation) are left out, so
//! [`SyntaxNode::to_sexp`] prints the same shape as tree-sitter's S-expressions.

use std::fmt::Write as _;

use crate::{
    ast::{
        Argument, Arguments, CallExpr, CreateInstance, Definition, Expr, FunctionDefinition,
        NumberDefinition, Pattern, PatternAndType, QualifiedName, ReturnSpec, SourceFile,
        Statement, Terminator, TypeRef,
    },
    error::Diagnostic,
    language::{Field, NodeKind},
    span::{LineIndex, Span},
};

/// A named node with its byte range and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    span: Span,
    children: Vec<(Option<Field>, SyntaxNode)>,
}

impl SyntaxNode {
    fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    fn push(&mut self, field: Option<Field>, child: SyntaxNode) {
        self.children.push((field, child));
    }

    fn with(mut self, field: Option<Field>, child: SyntaxNode) -> Self {
        self.push(field, child);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Numeric symbol id of [`Self::kind`] in the language tables.
    pub fn kind_id(&self) -> u16 {
        self.kind.id()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Source text covered by this node.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.range()]
    }

    /// Every node in the view is named, so this is every child.
    pub fn named_children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().map(|(_, child)| child)
    }

    pub fn named_child_count(&self) -> usize {
        self.children.len()
    }

    pub fn named_child(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index).map(|(_, child)| child)
    }

    /// First child stored under `field`.
    pub fn child_by_field(&self, field: Field) -> Option<&SyntaxNode> {
        self.children_by_field(field).next()
    }

    /// First child stored under the field called `name`.
    pub fn child_by_field_name(&self, name: &str) -> Option<&SyntaxNode> {
        self.children
            .iter()
            .find(|(field, _)| field.is_some_and(|field| field.as_str() == name))
            .map(|(_, child)| child)
    }

    /// All children stored under `field`, in order.
    pub fn children_by_field(&self, field: Field) -> impl Iterator<Item = &SyntaxNode> {
        self.children
            .iter()
            .filter(move |(f, _)| *f == Some(field))
            .map(|(_, child)| child)
    }

    /// Field of the child at `index`.
    pub fn field_name_for_child(&self, index: usize) -> Option<&'static str> {
        self.children
            .get(index)
            .and_then(|(field, _)| field.map(|field| field.as_str()))
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn descendant_count(&self) -> usize {
        1 + self
            .named_children()
            .map(SyntaxNode::descendant_count)
            .sum::<usize>()
    }

    /// Single-line S-expression, e.g. `(source_file (function_definition name: (identifier) ...))`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.kind.as_str());
        for (field, child) in &self.children {
            out.push(' ');
            if let Some(field) = field {
                out.push_str(field.as_str());
                out.push_str(": ");
            }
            child.write_sexp(out);
        }
        out.push(')');
    }

    /// Indented rendering with one node per line, optionally followed by its
    /// zero-based `[row, column] - [row, column]` range.
    pub fn render_tree(&self, source: &str, positions: bool) -> String {
        let index = positions.then(|| LineIndex::new(source));
        let mut out = String::new();
        self.write_tree(&mut out, 0, None, index.as_ref());
        out.push('\n');
        out
    }

    fn write_tree(
        &self,
        out: &mut String,
        depth: usize,
        field: Option<Field>,
        index: Option<&LineIndex>,
    ) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        if let Some(field) = field {
            let _ = write!(out, "{field}: ");
        }
        let _ = write!(out, "({}", self.kind);
        if let Some(index) = index {
            let (start, end) = index.points(self.span);
            let _ = write!(out, " {start} - {end}");
        }
        for (field, child) in &self.children {
            out.push('\n');
            child.write_tree(out, depth + 1, *field, index);
        }
        out.push(')');
    }
}

/// A successfully parsed file together with any warnings from validation.
#[derive(Debug, Clone)]
pub struct SyntaxTree<'src> {
    source: &'src str,
    file: SourceFile<'src>,
    warnings: Vec<Diagnostic>,
}

impl<'src> SyntaxTree<'src> {
    pub(crate) fn new(source: &'src str, file: SourceFile<'src>, warnings: Vec<Diagnostic>) -> Self {
        Self {
            source,
            file,
            warnings,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// The typed tree.
    pub fn source_file(&self) -> &SourceFile<'src> {
        &self.file
    }

    /// Consume the tree, keeping the typed root.
    pub fn into_source_file(self) -> SourceFile<'src> {
        self.file
    }

    /// Diagnostics below error severity reported while validating.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Generic node view of the whole file.
    pub fn root_node(&self) -> SyntaxNode {
        lower_source_file(&self.file)
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    pub fn render_tree(&self, positions: bool) -> String {
        self.root_node().render_tree(self.source, positions)
    }
}

/// Build the node view for a typed tree.
pub fn lower_source_file(file: &SourceFile<'_>) -> SyntaxNode {
    let lowering = Lowering {
        end_of_input: file.span.end(),
    };
    let mut root = SyntaxNode::new(NodeKind::SourceFile, file.span);
    for definition in &file.definitions {
        root.push(None, lowering.definition(definition));
    }
    root
}

struct Lowering {
    /// Offset of the zero-width `eof_tok` node.
    end_of_input: usize,
}

impl Lowering {
    fn terminate(&self, node: &mut SyntaxNode, terminator: Terminator) {
        if terminator.is_end_of_input() {
            let eof = Span::empty(self.end_of_input);
            node.span = node.span.union(eof);
            node.push(None, SyntaxNode::new(NodeKind::EofTok, eof));
        }
    }

    fn identifier(&self, span: Span) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Identifier, span)
    }

    fn definition(&self, definition: &Definition<'_>) -> SyntaxNode {
        match definition {
            Definition::Number(number) => self.number_definition(number),
            Definition::Function(function) => self.function_definition(function),
        }
    }

    fn number_definition(&self, number: &NumberDefinition<'_>) -> SyntaxNode {
        let mut node = SyntaxNode::new(NodeKind::NumberDefinition, number.span)
            .with(Some(Field::Name), self.identifier(number.name.span()));
        for definition in &number.definitions {
            node.push(Some(Field::Definitions), self.definition(definition));
        }
        node.push(Some(Field::EndName), self.identifier(number.end_name.span()));
        self.terminate(&mut node, number.terminator);
        node
    }

    fn function_definition(&self, function: &FunctionDefinition<'_>) -> SyntaxNode {
        let mut params =
            SyntaxNode::new(NodeKind::FunctionDefinitionParameters, function.params.span);
        for param in &function.params.items {
            params.push(None, self.create_instance(param));
        }

        let mut node = SyntaxNode::new(NodeKind::FunctionDefinition, function.span)
            .with(Some(Field::Name), self.identifier(function.name.span()))
            .with(Some(Field::Params), params);

        if let Some(spec) = &function.return_spec {
            let spec = match spec {
                ReturnSpec::Type(ty) => self.type_ref(ty),
                ReturnSpec::Named(binding) => self.pattern_and_type(binding),
            };
            node.push(Some(Field::ReturnSpec), spec);
        }

        for statement in &function.body {
            node.push(None, self.statement(statement));
        }

        node.push(Some(Field::EndName), self.identifier(function.end_name.span()));
        self.terminate(&mut node, function.terminator);
        node
    }

    fn create_instance(&self, instance: &CreateInstance<'_>) -> SyntaxNode {
        let node = SyntaxNode::new(NodeKind::CreateInstance, instance.span());
        match instance {
            CreateInstance::Typed { binding, init, .. } => {
                let node = node.with(None, self.pattern_and_type(binding));
                match init {
                    Some(init) => node.with(None, self.expr(init)),
                    None => node,
                }
            }
            CreateInstance::Inferred { pattern, value, .. } => node
                .with(None, self.pattern(pattern))
                .with(None, self.expr(value)),
        }
    }

    fn pattern_and_type(&self, binding: &PatternAndType<'_>) -> SyntaxNode {
        SyntaxNode::new(NodeKind::PatternAndType, binding.span)
            .with(Some(Field::Pattern), self.pattern(&binding.pattern))
            .with(Some(Field::Type), self.type_ref(&binding.ty))
    }

    fn pattern(&self, pattern: &Pattern<'_>) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Pattern, pattern.span()).with(None, self.qualified_name(&pattern.0))
    }

    fn type_ref(&self, ty: &TypeRef<'_>) -> SyntaxNode {
        SyntaxNode::new(NodeKind::Type, ty.span()).with(None, self.qualified_name(&ty.0))
    }

    fn qualified_name(&self, name: &QualifiedName<'_>) -> SyntaxNode {
        let mut node = SyntaxNode::new(NodeKind::IdentifierWNamespace, name.span);
        for namespace in &name.namespaces {
            node.push(Some(Field::Namespaces), self.identifier(namespace.span()));
        }
        node.push(Some(Field::Name), self.identifier(name.name.span()));
        if let Some(params) = &name.template_params {
            node.push(
                Some(Field::TemplateParams),
                self.arguments(NodeKind::TemplateInstantiationParameters, params),
            );
        }
        node
    }

    fn arguments(&self, kind: NodeKind, args: &Arguments<'_>) -> SyntaxNode {
        let mut node = SyntaxNode::new(kind, args.span);
        for arg in &args.items {
            let value = match arg {
                Argument::Positional(expr) => self.expr(expr),
                Argument::Keyword(kwarg) => SyntaxNode::new(NodeKind::Kwarg, kwarg.span)
                    .with(None, self.pattern(&kwarg.pattern))
                    .with(None, self.expr(&kwarg.value)),
            };
            node.push(None, SyntaxNode::new(NodeKind::ArgOrKwarg, arg.span()).with(None, value));
        }
        node
    }

    fn call(&self, call: &CallExpr<'_>) -> SyntaxNode {
        SyntaxNode::new(NodeKind::FunctionCallExpr, call.span)
            .with(Some(Field::Lhs), self.expr(&call.callee))
            .with(
                None,
                self.arguments(NodeKind::FunctionCallParameters, &call.args),
            )
    }

    fn expr(&self, expr: &Expr<'_>) -> SyntaxNode {
        let span = expr.span();
        let primary = SyntaxNode::new(NodeKind::PrimaryExpr, span);
        let postfix = SyntaxNode::new(NodeKind::PostfixExpr, span);

        match expr {
            Expr::Name(name) => primary.with(None, self.qualified_name(name)),
            Expr::Integer(text) => {
                primary.with(None, SyntaxNode::new(NodeKind::IntegerLiteral, text.span()))
            }
            Expr::Float(text) => {
                primary.with(None, SyntaxNode::new(NodeKind::FloatLiteral, text.span()))
            }
            Expr::Paren { inner, .. } => primary.with(None, self.expr(inner)),
            Expr::Unary { operand, .. } => SyntaxNode::new(NodeKind::UnaryExpr, span)
                .with(Some(Field::SubExpr), self.expr(operand)),
            Expr::Binary { lhs, rhs, .. } => SyntaxNode::new(NodeKind::BinaryExpr, span)
                .with(Some(Field::Lhs), self.expr(lhs))
                .with(Some(Field::Rhs), self.expr(rhs)),
            Expr::Index { target, index, .. } => postfix.with(
                None,
                SyntaxNode::new(NodeKind::ArrayAccessExpr, span)
                    .with(Some(Field::Lhs), self.expr(target))
                    .with(None, self.expr(index)),
            ),
            Expr::Member { target, member, .. } => postfix.with(
                None,
                SyntaxNode::new(NodeKind::MemberAccessExpr, span)
                    .with(Some(Field::Lhs), self.expr(target))
                    .with(None, self.identifier(member.span())),
            ),
            Expr::Call(call) => postfix.with(None, self.call(call)),
        }
    }

    fn statement(&self, statement: &Statement<'_>) -> SyntaxNode {
        let (mut node, terminator) = match statement {
            Statement::CreateInstance {
                instance,
                terminator,
                span,
            } => (
                SyntaxNode::new(NodeKind::CreateInstanceStatement, *span)
                    .with(None, self.create_instance(instance)),
                *terminator,
            ),
            Statement::ModifyInstance {
                pattern,
                value,
                terminator,
                span,
            } => (
                SyntaxNode::new(NodeKind::ModifyInstanceStatement, *span)
                    .with(None, self.pattern(pattern))
                    .with(None, self.expr(value)),
                *terminator,
            ),
            Statement::FunctionCall {
                call,
                terminator,
                span,
            } => (
                SyntaxNode::new(NodeKind::FunctionCallStatement, *span).with(None, self.call(call)),
                *terminator,
            ),
            Statement::IncDec {
                target,
                terminator,
                span,
                ..
            } => (
                SyntaxNode::new(NodeKind::IncDecStatement, *span)
                    .with(None, self.qualified_name(target)),
                *terminator,
            ),
        };
        self.terminate(&mut node, terminator);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn sexp(source: &str) -> String {
        parse(source).expect("source should parse").to_sexp()
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(sexp(""), "(source_file)");
        assert_eq!(sexp("\n\n"), "(source_file)");
    }

    #[test]
    fn test_number_definition_sexp() {
        assert_eq!(
            sexp("signed Int\nend Int\n"),
            "(source_file (number_definition name: (identifier) endName: (identifier)))"
        );
    }

    #[test]
    fn test_eof_tok_node() {
        let tree = parse("unsigned U8\nend U8").expect("parses");
        let root = tree.root_node();
        let definition = root.named_child(0).expect("definition");

        assert_eq!(
            root.to_sexp(),
            "(source_file (number_definition name: (identifier) endName: (identifier) (eof_tok)))"
        );
        let eof = definition
            .named_children()
            .last()
            .expect("eof node");
        assert_eq!(eof.kind(), NodeKind::EofTok);
        assert!(eof.span().is_empty());
        assert_eq!(eof.span().start(), 18);
    }

    #[test]
    fn test_function_fields() {
        let source = "function add(a: Int, b: Int) => Int\n  c := a + b\nend add\n";
        let tree = parse(source).expect("parses");
        let root = tree.root_node();
        let function = root.named_child(0).expect("function");

        assert_eq!(function.kind(), NodeKind::FunctionDefinition);
        let name = function.child_by_field(Field::Name).expect("name");
        assert_eq!(name.text(source), "add");
        let params = function.child_by_field(Field::Params).expect("params");
        assert_eq!(params.named_child_count(), 2);
        assert_eq!(params.text(source), "(a: Int, b: Int)");
        let spec = function.child_by_field_name("returnSpec").expect("return spec");
        assert_eq!(spec.kind(), NodeKind::Type);
        let end_name = function.child_by_field(Field::EndName).expect("end name");
        assert_eq!(end_name.text(source), "add");
        assert_eq!(function.field_name_for_child(0), Some("name"));
    }

    #[test]
    fn test_expression_shapes() {
        assert_eq!(
            sexp("function f()\n  x := -a.b[1]\nend f\n"),
            "(source_file (function_definition name: (identifier) \
             params: (function_definition_parameters) \
             (create_instance_statement (create_instance \
             (pattern (identifier_w_namespace name: (identifier))) \
             (unary_expr subExpr: (postfix_expr (array_access_expr \
             lhs: (postfix_expr (member_access_expr \
             lhs: (primary_expr (identifier_w_namespace name: (identifier))) (identifier))) \
             (primary_expr (integer_literal))))))) \
             endName: (identifier)))"
        );
    }

    #[test]
    fn test_call_statement_and_kwargs() {
        assert_eq!(
            sexp("function f()\n  g(1, y = 2.5)\nend f\n"),
            "(source_file (function_definition name: (identifier) \
             params: (function_definition_parameters) \
             (function_call_statement (function_call_expr \
             lhs: (primary_expr (identifier_w_namespace name: (identifier))) \
             (function_call_parameters \
             (arg_or_kwarg (primary_expr (integer_literal))) \
             (arg_or_kwarg (kwarg (pattern (identifier_w_namespace name: (identifier))) \
             (primary_expr (float_literal))))))) \
             endName: (identifier)))"
        );
    }

    #[test]
    fn test_namespaces_and_template_params() {
        let source = "function f()\n  v : std::Vec::<T> = 0\nend f\n";
        let tree = parse(source).expect("parses");
        let root = tree.root_node();
        let statement = root
            .named_child(0)
            .and_then(|f| f.named_child(2))
            .expect("statement");
        assert_eq!(statement.kind(), NodeKind::CreateInstanceStatement);

        let ty = statement
            .named_child(0)
            .and_then(|c| c.named_child(0))
            .and_then(|b| b.child_by_field(Field::Type))
            .and_then(|t| t.named_child(0))
            .expect("type name");
        assert_eq!(ty.kind(), NodeKind::IdentifierWNamespace);
        assert_eq!(ty.children_by_field(Field::Namespaces).count(), 1);
        assert_eq!(ty.child_by_field(Field::Name).expect("name").text(source), "Vec");
        let params = ty.child_by_field(Field::TemplateParams).expect("template params");
        assert_eq!(params.text(source), "<T>");
    }

    #[test]
    fn test_render_tree_with_positions() {
        let source = "float F\nend F\n";
        let rendered = parse(source).expect("parses").render_tree(true);
        assert_eq!(
            rendered,
            "(source_file [0, 0] - [2, 0]\n\
             \x20 (number_definition [0, 0] - [2, 0]\n\
             \x20   name: (identifier [0, 6] - [0, 7])\n\
             \x20   endName: (identifier [1, 4] - [1, 5])))\n"
        );
    }

    #[test]
    fn test_render_tree_without_positions() {
        let rendered = parse("float F\nend F\n").expect("parses").render_tree(false);
        assert_eq!(
            rendered,
            "(source_file\n  (number_definition\n    name: (identifier)\n    endName: (identifier)))\n"
        );
    }

    #[test]
    fn test_descendant_count() {
        let tree = parse("signed S\nend S\n").expect("parses");
        assert_eq!(tree.root_node().descendant_count(), 4);
    }
}
