//! Abstract Syntax Tree types for DMDL model definitions.
//!
//! ```text
//! item = { code : LONG; name : TEXT; };
//! projective priced = { price : DECIMAL; };
//! priced_item = item + priced;
//! joined order_item = item -> { code -> code; } % code
//!                   + order -> { item_code -> code; } % code;
//! summarized item_total = order_item => { any code -> code; sum price -> total; } % code;
//! ```

use dmdl_core::Span;
use std::fmt;

// =============================================================================
// Names, descriptions and attributes
// =============================================================================

/// Name with span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: String,
    pub span: Span,
}

impl Name {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Qualified name: `owner.member`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub qualifier: Name,
    pub name: Name,
    pub span: Span,
}

impl QualifiedName {
    pub fn new(qualifier: Name, name: Name) -> Self {
        let span = qualifier.span.merge(name.span);
        Self {
            qualifier,
            name,
            span,
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.qualifier, self.name)
    }
}

/// Description (documentation string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub value: String,
    pub span: Span,
}

impl Description {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }
}

/// Attribute usage: `@namespace.name(key = value, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Dotted attribute name, e.g. `directio.csv.field`.
    pub name: Name,
    pub elements: Vec<AttributeElement>,
    pub span: Span,
}

impl Attribute {
    pub fn new(name: Name) -> Self {
        let span = name.span;
        Self {
            name,
            elements: Vec::new(),
            span,
        }
    }

    #[must_use]
    pub fn with_element(mut self, element: AttributeElement) -> Self {
        self.span = self.span.merge(element.span);
        self.elements.push(element);
        self
    }

    /// Finds an element by its key.
    pub fn element(&self, key: &str) -> Option<&AttributeElement> {
        self.elements.iter().find(|e| e.name.value == key)
    }
}

/// Attribute element: `key = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeElement {
    pub name: Name,
    pub value: AttributeValue,
    pub span: Span,
}

impl AttributeElement {
    pub fn new(name: Name, value: AttributeValue) -> Self {
        let span = name.span.merge(value.span());
        Self { name, value, span }
    }
}

/// Attribute value.
///
/// The same shape doubles as the expression of a property reference:
/// `owner.name`, `{ a, b }` or `{ "k" : a, ... }`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Name(Name),
    QualifiedName(QualifiedName),
    Literal(Literal),
    Array(Vec<AttributeValue>, Span),
    Map(Vec<MapEntry>, Span),
}

impl AttributeValue {
    pub fn span(&self) -> Span {
        match self {
            Self::Name(name) => name.span,
            Self::QualifiedName(name) => name.span,
            Self::Literal(literal) => literal.span,
            Self::Array(_, span) | Self::Map(_, span) => *span,
        }
    }
}

/// Map entry inside an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Literal,
    pub value: AttributeValue,
    pub span: Span,
}

impl MapEntry {
    pub fn new(key: Literal, value: AttributeValue) -> Self {
        let span = key.span.merge(value.span());
        Self { key, value, span }
    }
}

/// Kind of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Integer,
    Decimal,
    Boolean,
}

/// Literal value. `value` holds the unquoted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: String,
    pub span: Span,
}

impl Literal {
    pub fn new(kind: LiteralKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::new(LiteralKind::String, value, span)
    }

    /// Returns the string value if this is a string literal.
    pub fn as_string(&self) -> Option<&str> {
        match self.kind {
            LiteralKind::String => Some(&self.value),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LiteralKind::String => write!(f, "\"{}\"", self.value),
            _ => f.write_str(&self.value),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

/// Kind of a collection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// `{ T }`
    List,
    /// `{ : T }`
    Map,
}

/// Type as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxType {
    /// Named type: `INT`, `TEXT`, `DECIMAL`.
    Named(Name),
    /// Collection type: `{INT}` or `{:INT}`.
    Collection {
        kind: CollectionKind,
        element: Box<SyntaxType>,
        span: Span,
    },
}

impl SyntaxType {
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        Self::Named(Name::new(name, span))
    }

    pub fn collection(kind: CollectionKind, element: SyntaxType, span: Span) -> Self {
        Self::Collection {
            kind,
            element: Box::new(element),
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Named(name) => name.span,
            Self::Collection { span, .. } => *span,
        }
    }
}

impl fmt::Display for SyntaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Collection {
                kind: CollectionKind::List,
                element,
                ..
            } => write!(f, "{{{element}}}"),
            Self::Collection {
                kind: CollectionKind::Map,
                element,
                ..
            } => write!(f, "{{:{element}}}"),
        }
    }
}

// =============================================================================
// Record expressions
// =============================================================================

/// Kind of a property definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `name : TYPE;`
    Normal,
    /// `name : {TYPE} = expression;`, a grouped view over other properties.
    Reference,
}

/// Property definition inside a record definition.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub description: Option<Description>,
    pub attributes: Vec<Attribute>,
    pub name: Name,
    pub kind: PropertyKind,
    /// Required for normal properties; may be omitted for references
    /// that inherit their type from a parent model.
    pub ty: Option<SyntaxType>,
    /// Only meaningful for references. `None` declares a stub.
    pub expression: Option<AttributeValue>,
    pub span: Span,
}

impl PropertyDefinition {
    /// Creates a normal property `name : ty;`.
    pub fn normal(name: Name, ty: SyntaxType) -> Self {
        let span = name.span.merge(ty.span());
        Self {
            description: None,
            attributes: Vec::new(),
            name,
            kind: PropertyKind::Normal,
            ty: Some(ty),
            expression: None,
            span,
        }
    }

    /// Creates a property reference without type or expression.
    pub fn reference(name: Name) -> Self {
        let span = name.span;
        Self {
            description: None,
            attributes: Vec::new(),
            name,
            kind: PropertyKind::Reference,
            ty: None,
            expression: None,
            span,
        }
    }

    #[must_use]
    pub fn with_type(mut self, ty: SyntaxType) -> Self {
        self.span = self.span.merge(ty.span());
        self.ty = Some(ty);
        self
    }

    #[must_use]
    pub fn with_expression(mut self, expression: AttributeValue) -> Self {
        self.span = self.span.merge(expression.span());
        self.expression = Some(expression);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Inline field list: `{ a : INT; b : TEXT; }`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefinition {
    pub properties: Vec<PropertyDefinition>,
    pub span: Span,
}

impl RecordDefinition {
    pub fn new(properties: Vec<PropertyDefinition>, span: Span) -> Self {
        Self { properties, span }
    }
}

/// Reference to another model by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    pub name: Name,
    pub span: Span,
}

impl ModelReference {
    pub fn new(name: Name) -> Self {
        let span = name.span;
        Self { name, span }
    }
}

/// A term of a record or projective union.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordTerm {
    Reference(ModelReference),
    Definition(RecordDefinition),
}

impl RecordTerm {
    pub fn span(&self) -> Span {
        match self {
            Self::Reference(reference) => reference.span,
            Self::Definition(definition) => definition.span,
        }
    }
}

// =============================================================================
// Join and summarize expressions
// =============================================================================

/// `source -> target;` inside a join mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMapping {
    pub description: Option<Description>,
    pub attributes: Vec<Attribute>,
    pub source: Name,
    pub target: Name,
    pub span: Span,
}

impl PropertyMapping {
    pub fn new(source: Name, target: Name) -> Self {
        let span = source.span.merge(target.span);
        Self {
            description: None,
            attributes: Vec::new(),
            source,
            target,
            span,
        }
    }
}

/// Explicit property mapping of a join term.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMapping {
    pub properties: Vec<PropertyMapping>,
    pub span: Span,
}

/// `% a, b` grouping clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    pub properties: Vec<Name>,
    pub span: Span,
}

/// A term of a joined model: `source -> { mapping } % grouping`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTerm {
    pub reference: ModelReference,
    pub mapping: Option<ModelMapping>,
    pub grouping: Option<Grouping>,
    pub span: Span,
}

/// `aggregator source -> target;` inside a summarize folding.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFolding {
    pub description: Option<Description>,
    pub attributes: Vec<Attribute>,
    pub aggregator: Name,
    pub source: Name,
    pub target: Name,
    pub span: Span,
}

impl PropertyFolding {
    pub fn new(aggregator: Name, source: Name, target: Name) -> Self {
        let span = aggregator.span.merge(target.span);
        Self {
            description: None,
            attributes: Vec::new(),
            aggregator,
            source,
            target,
            span,
        }
    }
}

/// Folding list of a summarize term.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFolding {
    pub properties: Vec<PropertyFolding>,
    pub span: Span,
}

/// A term of a summarized model: `source => { folding } % grouping`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizeTerm {
    pub reference: ModelReference,
    pub folding: ModelFolding,
    pub grouping: Option<Grouping>,
    pub span: Span,
}

// =============================================================================
// Model definitions
// =============================================================================

/// `a + b + c`; a single term is a union of one.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionExpression<T> {
    pub terms: Vec<T>,
    pub span: Span,
}

impl<T> UnionExpression<T> {
    pub fn new(terms: Vec<T>, span: Span) -> Self {
        Self { terms, span }
    }
}

/// Kind of a model definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Record,
    Projective,
    Joined,
    Summarized,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Record => "record",
            Self::Projective => "projective",
            Self::Joined => "joined",
            Self::Summarized => "summarized",
        };
        f.write_str(keyword)
    }
}

/// Right-hand side of a model definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelExpression {
    Record(UnionExpression<RecordTerm>),
    Projective(UnionExpression<RecordTerm>),
    Joined(UnionExpression<JoinTerm>),
    Summarized(UnionExpression<SummarizeTerm>),
}

impl ModelExpression {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Record(_) => ModelKind::Record,
            Self::Projective(_) => ModelKind::Projective,
            Self::Joined(_) => ModelKind::Joined,
            Self::Summarized(_) => ModelKind::Summarized,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Record(union) | Self::Projective(union) => union.span,
            Self::Joined(union) => union.span,
            Self::Summarized(union) => union.span,
        }
    }
}

/// Model definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub description: Option<Description>,
    pub attributes: Vec<Attribute>,
    pub name: Name,
    pub expression: ModelExpression,
    pub span: Span,
}

impl ModelDefinition {
    pub fn new(name: Name, expression: ModelExpression) -> Self {
        let span = name.span.merge(expression.span());
        Self {
            description: None,
            attributes: Vec::new(),
            name,
            expression,
            span,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn kind(&self) -> ModelKind {
        self.expression.kind()
    }

    /// Returns every model this definition refers to, directly or as the
    /// source of a join or summarize term, in source order without duplicates.
    pub fn referenced_models(&self) -> Vec<&Name> {
        let candidates: Vec<&Name> = match &self.expression {
            ModelExpression::Record(union) | ModelExpression::Projective(union) => union
                .terms
                .iter()
                .filter_map(|term| match term {
                    RecordTerm::Reference(reference) => Some(&reference.name),
                    RecordTerm::Definition(_) => None,
                })
                .collect(),
            ModelExpression::Joined(union) => {
                union.terms.iter().map(|t| &t.reference.name).collect()
            }
            ModelExpression::Summarized(union) => {
                union.terms.iter().map(|t| &t.reference.name).collect()
            }
        };
        let mut results: Vec<&Name> = Vec::with_capacity(candidates.len());
        for name in candidates {
            if results.iter().all(|seen| seen.value != name.value) {
                results.push(name);
            }
        }
        results
    }
}
