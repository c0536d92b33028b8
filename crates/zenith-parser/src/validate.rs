//! Validation of parsed files using the visitor pattern
//!
//! A read-only traversal over the typed tree that runs after a successful
//! parse. The grammar itself accepts both of these, so each check has a
//! configurable [`CheckLevel`].
//!
//! ## Validations Performed
//!
//! - **End names** (E200): the identifier after `end` must repeat the name of
//!   the definition it closes
//! - **Duplicate definitions** (E201): names must be unique within one scope;
//!   each number definition opens a new scope for its nested definitions

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    ast::{
        Argument, Arguments, CallExpr, CreateInstance, Definition, Expr, FunctionDefinition,
        Name, NumberDefinition, Pattern, QualifiedName, ReturnSpec, SourceFile, Statement,
        TypeRef,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError, Severity},
    span::Span,
};

/// Visitor trait for traversing the typed syntax tree.
///
/// Default implementations perform the recursive traversal so implementors
/// override only the methods they care about.
pub trait Visitor<'src> {
    fn visit_source_file(&mut self, file: &SourceFile<'src>) {
        self.visit_definitions(&file.definitions);
    }

    /// Visit the definitions of one scope
    fn visit_definitions(&mut self, definitions: &[Definition<'src>]) {
        for definition in definitions {
            self.visit_definition(definition);
        }
    }

    fn visit_definition(&mut self, definition: &Definition<'src>) {
        match definition {
            Definition::Number(number) => self.visit_number_definition(number),
            Definition::Function(function) => self.visit_function_definition(function),
        }
    }

    fn visit_number_definition(&mut self, number: &NumberDefinition<'src>) {
        self.visit_definitions(&number.definitions);
    }

    fn visit_function_definition(&mut self, function: &FunctionDefinition<'src>) {
        for param in &function.params.items {
            self.visit_create_instance(param);
        }
        match &function.return_spec {
            Some(ReturnSpec::Type(ty)) => self.visit_type(ty),
            Some(ReturnSpec::Named(binding)) => {
                self.visit_pattern(&binding.pattern);
                self.visit_type(&binding.ty);
            }
            None => {}
        }
        for statement in &function.body {
            self.visit_statement(statement);
        }
    }

    fn visit_statement(&mut self, statement: &Statement<'src>) {
        match statement {
            Statement::CreateInstance { instance, .. } => self.visit_create_instance(instance),
            Statement::ModifyInstance { pattern, value, .. } => {
                self.visit_pattern(pattern);
                self.visit_expr(value);
            }
            Statement::FunctionCall { call, .. } => self.visit_call(call),
            Statement::IncDec { target, .. } => self.visit_qualified_name(target),
        }
    }

    fn visit_create_instance(&mut self, instance: &CreateInstance<'src>) {
        match instance {
            CreateInstance::Typed { binding, init, .. } => {
                self.visit_pattern(&binding.pattern);
                self.visit_type(&binding.ty);
                if let Some(init) = init {
                    self.visit_expr(init);
                }
            }
            CreateInstance::Inferred { pattern, value, .. } => {
                self.visit_pattern(pattern);
                self.visit_expr(value);
            }
        }
    }

    fn visit_pattern(&mut self, pattern: &Pattern<'src>) {
        self.visit_qualified_name(&pattern.0);
    }

    fn visit_type(&mut self, ty: &TypeRef<'src>) {
        self.visit_qualified_name(&ty.0);
    }

    fn visit_qualified_name(&mut self, name: &QualifiedName<'src>) {
        if let Some(params) = &name.template_params {
            self.visit_arguments(params);
        }
    }

    fn visit_arguments(&mut self, args: &Arguments<'src>) {
        for arg in &args.items {
            match arg {
                Argument::Positional(expr) => self.visit_expr(expr),
                Argument::Keyword(kwarg) => {
                    self.visit_pattern(&kwarg.pattern);
                    self.visit_expr(&kwarg.value);
                }
            }
        }
    }

    fn visit_call(&mut self, call: &CallExpr<'src>) {
        self.visit_expr(&call.callee);
        self.visit_arguments(&call.args);
    }

    fn visit_expr(&mut self, expr: &Expr<'src>) {
        match expr {
            Expr::Name(name) => self.visit_qualified_name(name),
            Expr::Integer(_) | Expr::Float(_) => {}
            Expr::Paren { inner, .. } => self.visit_expr(inner),
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
            Expr::Index { target, index, .. } => {
                self.visit_expr(target);
                self.visit_expr(index);
            }
            Expr::Member { target, .. } => self.visit_expr(target),
            Expr::Call(call) => self.visit_call(call),
        }
    }
}

/// How a validation check reports what it finds.
///
/// The names match external configuration strings (snake_case).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckLevel {
    /// Findings fail the parse
    #[default]
    Error,
    /// Findings are returned as warnings
    Warning,
    /// The check is skipped
    Off,
}

impl FromStr for CheckLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "off" => Ok(Self::Off),
            _ => Err("Unsupported check level"),
        }
    }
}

impl From<CheckLevel> for &'static str {
    fn from(val: CheckLevel) -> Self {
        match val {
            CheckLevel::Error => "error",
            CheckLevel::Warning => "warning",
            CheckLevel::Off => "off",
        }
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'static str = (*self).into();
        write!(f, "{s}")
    }
}

impl CheckLevel {
    /// Severity of reported diagnostics, or `None` when the check is disabled.
    pub fn severity(&self) -> Option<Severity> {
        match self {
            CheckLevel::Error => Some(Severity::Error),
            CheckLevel::Warning => Some(Severity::Warning),
            CheckLevel::Off => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateConfig {
    pub end_names: CheckLevel,
    pub duplicate_definitions: CheckLevel,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            end_names: CheckLevel::Error,
            duplicate_definitions: CheckLevel::Warning,
        }
    }
}

/// Checks end names and duplicate definitions.
///
/// Keeps one name registry per scope (`Vec<IndexMap<&str, Span>>`): the file
/// is the outermost scope and every number definition pushes another.
pub struct Validator<'src> {
    config: ValidateConfig,
    scopes: Vec<IndexMap<&'src str, Span>>,
    diagnostics: DiagnosticCollector,
}

impl<'src> Validator<'src> {
    pub fn new(config: ValidateConfig) -> Self {
        Self {
            config,
            scopes: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Errors if any check at error level failed, otherwise the warnings.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        self.diagnostics.finish()
    }

    fn check_end_name(&mut self, definition: &Definition<'src>) {
        let Some(severity) = self.config.end_names.severity() else {
            return;
        };
        let name = definition.name();
        let end_name = definition.end_name();
        if name.inner() == end_name.inner() {
            return;
        }

        self.diagnostics.emit(
            Diagnostic::with_severity(
                severity,
                format!(
                    "`end` name `{end_name}` does not match {} `{name}`",
                    definition.describe()
                ),
            )
            .with_code(ErrorCode::E200)
            .with_label(end_name.span(), format!("expected `{name}`"))
            .with_secondary_label(name.span(), format!("{} declared here", definition.describe()))
            .with_help(format!("write `end {name}`")),
        );
    }

    fn register(&mut self, name: &Name<'src>) {
        let Some(severity) = self.config.duplicate_definitions.severity() else {
            return;
        };
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if let Some(first) = scope.get(name.inner()) {
            let first = *first;
            self.diagnostics.emit(
                Diagnostic::with_severity(severity, format!("duplicate definition `{name}`"))
                    .with_code(ErrorCode::E201)
                    .with_label(name.span(), "redefined here")
                    .with_secondary_label(first, "first defined here")
                    .with_help("rename one of the definitions"),
            );
        } else {
            scope.insert(*name.inner(), name.span());
        }
    }
}

impl<'src> Visitor<'src> for Validator<'src> {
    fn visit_definitions(&mut self, definitions: &[Definition<'src>]) {
        self.scopes.push(IndexMap::new());
        for definition in definitions {
            self.register(definition.name());
            self.visit_definition(definition);
        }
        if let Some(scope) = self.scopes.pop() {
            debug!(names = scope.len(); "Closed definition scope");
        }
    }

    fn visit_definition(&mut self, definition: &Definition<'src>) {
        self.check_end_name(definition);
        if let Definition::Number(number) = definition {
            self.visit_definitions(&number.definitions);
        }
    }
}

/// Run every validation over `file`.
///
/// Returns the warnings when no check at error level failed.
pub fn validate(file: &SourceFile<'_>, config: ValidateConfig) -> Result<Vec<Diagnostic>, ParseError> {
    let mut validator = Validator::new(config);
    validator.visit_source_file(file);
    validator.finish()
}
