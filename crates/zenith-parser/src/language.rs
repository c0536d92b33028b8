//! The Zenith language handle.
//!
//! [`language()`] hands out a `'static` [`Language`] describing the grammar:
//! its name, ABI version, the node kinds a syntax tree can contain, the
//! field names that label children, and the reserved words. The handle is a
//! plain static, so loading it cannot fail and it is shared freely between
//! threads.
//!
//! Symbol ids index one table: the visible named kinds come first (in
//! [`NodeKind`] order), then the hidden rules, then the anonymous tokens.
//! Field ids start at 1, with 0 meaning "no field".

use std::fmt;

use thiserror::Error;

/// ABI version of the node-kind and field tables produced by this crate.
pub const ABI_VERSION: u32 = 1;

/// Oldest table layout a [`Parser`](crate::Parser) still accepts.
pub const MIN_COMPATIBLE_ABI_VERSION: u32 = 1;

/// Errors from attaching a [`Language`] to a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error(
        "incompatible language version {version}; expected a version between {min} and {max}"
    )]
    Version { version: u32, min: u32, max: u32 },
}

/// Named, visible node kinds of the Zenith grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SourceFile,
    NumberDefinition,
    FunctionDefinition,
    FunctionDefinitionParameters,
    CreateInstance,
    PatternAndType,
    PrimaryExpr,
    UnaryExpr,
    BinaryExpr,
    PostfixExpr,
    ArrayAccessExpr,
    MemberAccessExpr,
    FunctionCallExpr,
    FunctionCallParameters,
    ArgOrKwarg,
    Kwarg,
    Type,
    CreateInstanceStatement,
    ModifyInstanceStatement,
    FunctionCallStatement,
    IncDecStatement,
    Pattern,
    IdentifierWNamespace,
    TemplateInstantiationParameters,
    Identifier,
    FloatLiteral,
    IntegerLiteral,
    EofTok,
}

impl NodeKind {
    pub const ALL: [NodeKind; 28] = [
        NodeKind::SourceFile,
        NodeKind::NumberDefinition,
        NodeKind::FunctionDefinition,
        NodeKind::FunctionDefinitionParameters,
        NodeKind::CreateInstance,
        NodeKind::PatternAndType,
        NodeKind::PrimaryExpr,
        NodeKind::UnaryExpr,
        NodeKind::BinaryExpr,
        NodeKind::PostfixExpr,
        NodeKind::ArrayAccessExpr,
        NodeKind::MemberAccessExpr,
        NodeKind::FunctionCallExpr,
        NodeKind::FunctionCallParameters,
        NodeKind::ArgOrKwarg,
        NodeKind::Kwarg,
        NodeKind::Type,
        NodeKind::CreateInstanceStatement,
        NodeKind::ModifyInstanceStatement,
        NodeKind::FunctionCallStatement,
        NodeKind::IncDecStatement,
        NodeKind::Pattern,
        NodeKind::IdentifierWNamespace,
        NodeKind::TemplateInstantiationParameters,
        NodeKind::Identifier,
        NodeKind::FloatLiteral,
        NodeKind::IntegerLiteral,
        NodeKind::EofTok,
    ];

    /// The grammar's name for this kind, as printed in S-expressions.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::SourceFile => "source_file",
            NodeKind::NumberDefinition => "number_definition",
            NodeKind::FunctionDefinition => "function_definition",
            NodeKind::FunctionDefinitionParameters => "function_definition_parameters",
            NodeKind::CreateInstance => "create_instance",
            NodeKind::PatternAndType => "pattern_and_type",
            NodeKind::PrimaryExpr => "primary_expr",
            NodeKind::UnaryExpr => "unary_expr",
            NodeKind::BinaryExpr => "binary_expr",
            NodeKind::PostfixExpr => "postfix_expr",
            NodeKind::ArrayAccessExpr => "array_access_expr",
            NodeKind::MemberAccessExpr => "member_access_expr",
            NodeKind::FunctionCallExpr => "function_call_expr",
            NodeKind::FunctionCallParameters => "function_call_parameters",
            NodeKind::ArgOrKwarg => "arg_or_kwarg",
            NodeKind::Kwarg => "kwarg",
            NodeKind::Type => "type",
            NodeKind::CreateInstanceStatement => "create_instance_statement",
            NodeKind::ModifyInstanceStatement => "modify_instance_statement",
            NodeKind::FunctionCallStatement => "function_call_statement",
            NodeKind::IncDecStatement => "inc_dec_statement",
            NodeKind::Pattern => "pattern",
            NodeKind::IdentifierWNamespace => "identifier_w_namespace",
            NodeKind::TemplateInstantiationParameters => "template_instantiation_parameters",
            NodeKind::Identifier => "identifier",
            NodeKind::FloatLiteral => "float_literal",
            NodeKind::IntegerLiteral => "integer_literal",
            NodeKind::EofTok => "eof_tok",
        }
    }

    /// Symbol id of this kind in the [`Language`] tables.
    pub fn id(&self) -> u16 {
        *self as u16
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field names that label children in the syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Definitions,
    EndName,
    Lhs,
    Name,
    Namespaces,
    Op,
    Params,
    Pattern,
    ReturnSpec,
    Rhs,
    SubExpr,
    TemplateParams,
    Type,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Definitions => "definitions",
            Field::EndName => "endName",
            Field::Lhs => "lhs",
            Field::Name => "name",
            Field::Namespaces => "namespaces",
            Field::Op => "op",
            Field::Params => "params",
            Field::Pattern => "pattern",
            Field::ReturnSpec => "returnSpec",
            Field::Rhs => "rhs",
            Field::SubExpr => "subExpr",
            Field::TemplateParams => "templateParams",
            Field::Type => "type",
        }
    }

    /// Field id in the [`Language`] tables (never 0).
    pub fn id(&self) -> u16 {
        *self as u16 + 1
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct SymbolInfo {
    name: &'static str,
    named: bool,
    visible: bool,
}

const fn named(name: &'static str) -> SymbolInfo {
    SymbolInfo {
        name,
        named: true,
        visible: true,
    }
}

const fn hidden(name: &'static str) -> SymbolInfo {
    SymbolInfo {
        name,
        named: true,
        visible: false,
    }
}

const fn anonymous(name: &'static str) -> SymbolInfo {
    SymbolInfo {
        name,
        named: false,
        visible: true,
    }
}

static SYMBOLS: [SymbolInfo; 69] = [
    named("source_file"),
    named("number_definition"),
    named("function_definition"),
    named("function_definition_parameters"),
    named("create_instance"),
    named("pattern_and_type"),
    named("primary_expr"),
    named("unary_expr"),
    named("binary_expr"),
    named("postfix_expr"),
    named("array_access_expr"),
    named("member_access_expr"),
    named("function_call_expr"),
    named("function_call_parameters"),
    named("arg_or_kwarg"),
    named("kwarg"),
    named("type"),
    named("create_instance_statement"),
    named("modify_instance_statement"),
    named("function_call_statement"),
    named("inc_dec_statement"),
    named("pattern"),
    named("identifier_w_namespace"),
    named("template_instantiation_parameters"),
    named("identifier"),
    named("float_literal"),
    named("integer_literal"),
    named("eof_tok"),
    hidden("_definition"),
    hidden("_type_definition"),
    hidden("_expr"),
    hidden("_statement"),
    anonymous("function"),
    anonymous("end"),
    anonymous("signed"),
    anonymous("unsigned"),
    anonymous("float"),
    anonymous("not"),
    anonymous("and"),
    anonymous("or"),
    anonymous("=>"),
    anonymous(":="),
    anonymous("::"),
    anonymous(":"),
    anonymous("=="),
    anonymous("!="),
    anonymous("="),
    anonymous("<="),
    anonymous("<"),
    anonymous(">="),
    anonymous(">"),
    anonymous("|"),
    anonymous("^"),
    anonymous("&"),
    anonymous("++"),
    anonymous("--"),
    anonymous("+"),
    anonymous("-"),
    anonymous("*"),
    anonymous("/"),
    anonymous("%"),
    anonymous("~"),
    anonymous("."),
    anonymous("("),
    anonymous(")"),
    anonymous("["),
    anonymous("]"),
    anonymous(","),
    anonymous("\n"),
];

static FIELDS: [&str; 13] = [
    "definitions",
    "endName",
    "lhs",
    "name",
    "namespaces",
    "op",
    "params",
    "pattern",
    "returnSpec",
    "rhs",
    "subExpr",
    "templateParams",
    "type",
];

static KEYWORDS: [&str; 8] = [
    "function", "end", "signed", "unsigned", "float", "not", "and", "or",
];

static ZENITH: Language = Language {
    name: "zenith",
    abi_version: ABI_VERSION,
    symbols: &SYMBOLS,
    fields: &FIELDS,
    keywords: &KEYWORDS,
};

/// Get the [`Language`] handle for Zenith.
///
/// ```
/// let language = zenith_parser::language();
/// assert_eq!(language.name(), "zenith");
/// ```
pub fn language() -> &'static Language {
    &ZENITH
}

/// Descriptor of a grammar: everything a consumer needs to interpret the
/// node kinds and fields of trees produced for it.
#[derive(Debug)]
pub struct Language {
    name: &'static str,
    abi_version: u32,
    symbols: &'static [SymbolInfo],
    fields: &'static [&'static str],
    keywords: &'static [&'static str],
}

impl Language {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// Whether a parser built against [`ABI_VERSION`] can use this language.
    pub fn check_compatibility(&self) -> Result<(), LanguageError> {
        if (MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION).contains(&self.abi_version) {
            Ok(())
        } else {
            Err(LanguageError::Version {
                version: self.abi_version,
                min: MIN_COMPATIBLE_ABI_VERSION,
                max: ABI_VERSION,
            })
        }
    }

    /// Total number of symbols: named, hidden and anonymous.
    pub fn node_kind_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn node_kind_for_id(&self, id: u16) -> Option<&'static str> {
        self.symbols.get(usize::from(id)).map(|symbol| symbol.name)
    }

    /// Look up a symbol id by name; `named` distinguishes `float` the
    /// keyword from a named rule that happens to share its spelling.
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        self.symbols
            .iter()
            .position(|symbol| symbol.name == kind && symbol.named == named)
            .and_then(|index| u16::try_from(index).ok())
    }

    pub fn node_kind_is_named(&self, id: u16) -> bool {
        self.symbols
            .get(usize::from(id))
            .is_some_and(|symbol| symbol.named)
    }

    /// Hidden rules such as `_expr` never appear as nodes.
    pub fn node_kind_is_visible(&self, id: u16) -> bool {
        self.symbols
            .get(usize::from(id))
            .is_some_and(|symbol| symbol.visible)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_name_for_id(&self, id: u16) -> Option<&'static str> {
        usize::from(id)
            .checked_sub(1)
            .and_then(|index| self.fields.get(index).copied())
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<u16> {
        self.fields
            .iter()
            .position(|field| *field == name)
            .and_then(|index| u16::try_from(index + 1).ok())
    }

    /// Words that lex as keywords and can never be identifiers.
    pub fn keywords(&self) -> &'static [&'static str] {
        self.keywords
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(&word)
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.abi_version == other.abi_version
    }
}

#[cfg(test)]
impl Language {
    /// A copy of the Zenith handle claiming another ABI version.
    pub(crate) fn with_abi_version(abi_version: u32) -> Self {
        Self {
            name: ZENITH.name,
            abi_version,
            symbols: ZENITH.symbols,
            fields: ZENITH.fields,
            keywords: ZENITH.keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Token;

    #[test]
    fn test_can_load_grammar() {
        let language = language();
        assert_eq!(language.name(), "zenith");
        assert!(language.check_compatibility().is_ok());
    }

    #[test]
    fn test_node_kind_ids_match_table() {
        let language = language();
        for kind in NodeKind::ALL {
            assert_eq!(language.node_kind_for_id(kind.id()), Some(kind.as_str()));
            assert_eq!(language.id_for_node_kind(kind.as_str(), true), Some(kind.id()));
            assert!(language.node_kind_is_named(kind.id()));
            assert!(language.node_kind_is_visible(kind.id()));
        }
    }

    #[test]
    fn test_hidden_and_anonymous_kinds() {
        let language = language();

        let expr = language.id_for_node_kind("_expr", true).unwrap();
        assert!(!language.node_kind_is_visible(expr));

        let keyword = language.id_for_node_kind("float", false).unwrap();
        assert!(!language.node_kind_is_named(keyword));
        assert_ne!(
            Some(keyword),
            language.id_for_node_kind("float_literal", true)
        );

        assert_eq!(language.id_for_node_kind("missing", true), None);
        assert_eq!(language.node_kind_for_id(1000), None);
        assert_eq!(language.node_kind_count(), 69);
    }

    #[test]
    fn test_field_ids_round_trip() {
        let language = language();
        assert_eq!(language.field_count(), 13);
        assert_eq!(language.field_name_for_id(0), None);

        for field in [
            Field::Definitions,
            Field::EndName,
            Field::Lhs,
            Field::Name,
            Field::Namespaces,
            Field::Op,
            Field::Params,
            Field::Pattern,
            Field::ReturnSpec,
            Field::Rhs,
            Field::SubExpr,
            Field::TemplateParams,
            Field::Type,
        ] {
            assert_eq!(language.field_name_for_id(field.id()), Some(field.as_str()));
            assert_eq!(language.field_id_for_name(field.as_str()), Some(field.id()));
        }
    }

    #[test]
    fn test_keywords_agree_with_lexer() {
        let language = language();
        for word in language.keywords() {
            assert!(Token::keyword(word).is_some(), "{word} is not lexed as a keyword");
        }
        assert!(language.is_keyword("end"));
        assert!(!language.is_keyword("endName"));
    }

    #[test]
    fn test_incompatible_version_is_rejected() {
        let future = Language::with_abi_version(ABI_VERSION + 1);
        assert_eq!(
            future.check_compatibility(),
            Err(LanguageError::Version {
                version: ABI_VERSION + 1,
                min: MIN_COMPATIBLE_ABI_VERSION,
                max: ABI_VERSION,
            })
        );
    }
}
