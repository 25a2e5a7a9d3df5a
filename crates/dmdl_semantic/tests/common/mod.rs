//! AST builders shared by the integration tests.

#![allow(dead_code)]

use dmdl_core::Span;
use dmdl_semantic::{
    AttributeDriver, AttributeDriverRegistry, DeclarationSymbol, DmdlAnalyzer, DmdlSemantics,
    ModelDeclaration, SemanticError, TypeResolver,
};
use dmdl_syntax::*;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn name(value: &str) -> Name {
    Name::new(value, Span::default())
}

pub fn ty(keyword: &str) -> SyntaxType {
    SyntaxType::named(keyword, Span::default())
}

pub fn list_of(keyword: &str) -> SyntaxType {
    SyntaxType::collection(CollectionKind::List, ty(keyword), Span::default())
}

pub fn map_of(keyword: &str) -> SyntaxType {
    SyntaxType::collection(CollectionKind::Map, ty(keyword), Span::default())
}

pub fn prop(property: &str, keyword: &str) -> PropertyDefinition {
    PropertyDefinition::normal(name(property), ty(keyword))
}

pub fn reference(property: &str) -> PropertyDefinition {
    PropertyDefinition::reference(name(property))
}

pub fn names(values: &[&str]) -> AttributeValue {
    AttributeValue::Array(
        values.iter().map(|v| AttributeValue::Name(name(v))).collect(),
        Span::default(),
    )
}

pub fn string_map(entries: &[(&str, &str)]) -> AttributeValue {
    AttributeValue::Map(
        entries
            .iter()
            .map(|(key, value)| {
                MapEntry::new(
                    Literal::string(*key, Span::default()),
                    AttributeValue::Name(name(value)),
                )
            })
            .collect(),
        Span::default(),
    )
}

pub fn selector(owner: &str, member: &str) -> AttributeValue {
    AttributeValue::QualifiedName(QualifiedName::new(name(owner), name(member)))
}

pub fn attribute(value: &str) -> Attribute {
    Attribute::new(name(value))
}

pub fn description(text: &str) -> Description {
    Description::new(text, Span::default())
}

pub fn fields(properties: Vec<PropertyDefinition>) -> RecordTerm {
    RecordTerm::Definition(RecordDefinition::new(properties, Span::default()))
}

pub fn model_ref(model: &str) -> RecordTerm {
    RecordTerm::Reference(ModelReference::new(name(model)))
}

pub fn record(model: &str, terms: Vec<RecordTerm>) -> ModelDefinition {
    ModelDefinition::new(
        name(model),
        ModelExpression::Record(UnionExpression::new(terms, Span::default())),
    )
}

pub fn projective(model: &str, terms: Vec<RecordTerm>) -> ModelDefinition {
    ModelDefinition::new(
        name(model),
        ModelExpression::Projective(UnionExpression::new(terms, Span::default())),
    )
}

fn grouping(keys: &[&str]) -> Option<Grouping> {
    if keys.is_empty() {
        return None;
    }
    Some(Grouping {
        properties: keys.iter().map(|k| name(k)).collect(),
        span: Span::default(),
    })
}

/// `source -> { a -> b; ... } % keys`; `None` mapping copies every property.
pub fn join_term(source: &str, mapping: Option<&[(&str, &str)]>, keys: &[&str]) -> JoinTerm {
    JoinTerm {
        reference: ModelReference::new(name(source)),
        mapping: mapping.map(|pairs| ModelMapping {
            properties: pairs
                .iter()
                .map(|(from, to)| PropertyMapping::new(name(from), name(to)))
                .collect(),
            span: Span::default(),
        }),
        grouping: grouping(keys),
        span: Span::default(),
    }
}

pub fn joined(model: &str, terms: Vec<JoinTerm>) -> ModelDefinition {
    ModelDefinition::new(
        name(model),
        ModelExpression::Joined(UnionExpression::new(terms, Span::default())),
    )
}

/// `source => { aggregator from -> to; ... } % keys`
pub fn summarize_term(
    source: &str,
    foldings: &[(&str, &str, &str)],
    keys: &[&str],
) -> SummarizeTerm {
    SummarizeTerm {
        reference: ModelReference::new(name(source)),
        folding: ModelFolding {
            properties: foldings
                .iter()
                .map(|(aggregator, from, to)| {
                    PropertyFolding::new(name(aggregator), name(from), name(to))
                })
                .collect(),
            span: Span::default(),
        },
        grouping: grouping(keys),
        span: Span::default(),
    }
}

pub fn summarized(model: &str, terms: Vec<SummarizeTerm>) -> ModelDefinition {
    ModelDefinition::new(
        name(model),
        ModelExpression::Summarized(UnionExpression::new(terms, Span::default())),
    )
}

pub fn analyzer(models: Vec<ModelDefinition>) -> DmdlAnalyzer {
    init_tracing();
    let mut analyzer = DmdlAnalyzer::default();
    for model in models {
        analyzer.add_model(model);
    }
    analyzer
}

/// Accepts one attribute name without doing anything.
pub struct Ignore(pub &'static str);

impl AttributeDriver for Ignore {
    fn target_name(&self) -> &str {
        self.0
    }

    fn process(&self, _: &mut DmdlSemantics, _: &DeclarationSymbol, _: &Attribute) {}
}

/// Like [`analyzer`], with no-op drivers for `attributes`.
pub fn analyzer_accepting(
    attributes: &[&'static str],
    models: Vec<ModelDefinition>,
) -> DmdlAnalyzer {
    init_tracing();
    let mut drivers = AttributeDriverRegistry::new();
    for &name in attributes {
        drivers.register(Ignore(name));
    }
    let mut analyzer = DmdlAnalyzer::new(TypeResolver::with_defaults(), drivers);
    for model in models {
        analyzer.add_model(model);
    }
    analyzer
}

/// Codes of the error diagnostics, in report order.
pub fn error_codes(error: &SemanticError) -> Vec<&str> {
    error.errors().map(|d| d.code.as_str()).collect()
}

/// One `name : TYPE` line per property, then `name = {TYPE}` per reference.
pub fn render(model: &ModelDeclaration) -> String {
    let mut lines: Vec<String> = model
        .properties()
        .map(|p| format!("{} : {}", p.name, p.ty))
        .collect();
    lines.extend(model.references().map(|r| format!("{} = {}", r.name, r.ty())));
    lines.join("\n")
}
