mod common;

use common::*;
use dmdl_core::{codes, Diagnostic};
use dmdl_semantic::{
    AttributeDriver, AttributeDriverRegistry, DeclarationSymbol, DmdlAnalyzer, DmdlSemantics,
    Phase, TypeResolver,
};
use dmdl_syntax::Attribute;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct Recorder {
    tag: &'static str,
    log: Log,
}

impl AttributeDriver for Recorder {
    fn target_name(&self) -> &str {
        "trace"
    }

    fn process(&self, _: &mut DmdlSemantics, declaration: &DeclarationSymbol, _: &Attribute) {
        self.log.push(format!("{} process {declaration}", self.tag));
    }

    fn verify(&self, _: &mut DmdlSemantics, declaration: &DeclarationSymbol, _: &Attribute) {
        self.log.push(format!("{} verify {declaration}", self.tag));
    }
}

#[derive(Debug, PartialEq)]
struct Tagged;

/// `@tag` attaches [`Tagged`] to its declaration.
struct Tag;

impl AttributeDriver for Tag {
    fn target_name(&self) -> &str {
        "tag"
    }

    fn process(&self, world: &mut DmdlSemantics, declaration: &DeclarationSymbol, _: &Attribute) {
        match declaration {
            DeclarationSymbol::Model(model) => {
                if let Some(model) = world.find_model_mut(model.name()) {
                    model.traits_mut().extensions.put(Tagged);
                }
            }
            DeclarationSymbol::Member(member) => {
                if let Some(member) = world.find_member_mut(member) {
                    member.traits_mut().put(Tagged);
                }
            }
        }
    }
}

/// `@checked` requires the model to be tagged as well.
struct Checked;

impl AttributeDriver for Checked {
    fn target_name(&self) -> &str {
        "checked"
    }

    fn process(&self, _: &mut DmdlSemantics, _: &DeclarationSymbol, _: &Attribute) {}

    fn verify(
        &self,
        world: &mut DmdlSemantics,
        declaration: &DeclarationSymbol,
        attribute: &Attribute,
    ) {
        let tagged = world
            .find_model(declaration.model().name())
            .is_some_and(|model| model.traits().extensions.contains::<Tagged>());
        if !tagged {
            world.report(
                Diagnostic::error(codes::INVALID_ATTRIBUTE, "invalid attribute")
                    .with_span(attribute.span, format!("`{declaration}` is not tagged")),
            );
        }
    }
}

fn with_drivers(drivers: AttributeDriverRegistry) -> DmdlAnalyzer {
    init_tracing();
    DmdlAnalyzer::new(TypeResolver::with_defaults(), drivers)
}

// =============================================================================
// Dependencies
// =============================================================================

#[test]
fn test_cycle_is_reported_for_each_model() {
    let mut analyzer = analyzer(vec![
        record("a", vec![model_ref("b"), fields(vec![prop("x", "INT")])]),
        record("b", vec![model_ref("a"), fields(vec![prop("y", "INT")])]),
    ]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error.phase(), Phase::SymbolResolution);

    let rendered: Vec<_> = error.errors().map(ToString::to_string).collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    error[E0102]: cyclic model dependency (0..0: `a` depends on itself through [a -> b])
    error[E0102]: cyclic model dependency (0..0: `b` depends on itself through [a -> b])
    ");

    let world = analyzer.world();
    assert!(world.find_model("a").unwrap().members().is_empty());
    assert!(world.find_model("b").unwrap().members().is_empty());
}

#[test]
fn test_self_reference_is_a_cycle() {
    let mut analyzer = analyzer(vec![record(
        "a",
        vec![model_ref("a"), fields(vec![prop("x", "INT")])],
    )]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error_codes(&error), vec![codes::CYCLIC_DEPENDENCY]);
}

#[test]
fn test_cycle_skips_every_model() {
    let mut analyzer = analyzer(vec![
        record("unrelated", vec![fields(vec![prop("z", "INT")])]),
        record("a", vec![model_ref("b")]),
        record("b", vec![model_ref("a")]),
    ]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error.errors().count(), 2);
    assert!(analyzer.world().find_model("unrelated").unwrap().members().is_empty());
}

#[test]
fn test_empty_input_resolves() {
    let mut analyzer = analyzer(Vec::new());
    let world = analyzer.resolve().unwrap();
    assert_eq!(world.model_count(), 0);
    assert!(world.diagnostics().is_empty());
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn test_attribute_drivers_run_in_order() {
    let log = Log::default();
    let mut drivers = AttributeDriverRegistry::new();
    drivers.register(Recorder {
        tag: "first",
        log: log.clone(),
    });
    drivers.register(Recorder {
        tag: "second",
        log: log.clone(),
    });
    let mut analyzer = with_drivers(drivers);
    analyzer.add_model(
        record(
            "a",
            vec![fields(vec![
                prop("x", "INT").with_attribute(attribute("trace")),
                prop("y", "INT"),
            ])],
        )
        .with_attribute(attribute("trace")),
    );

    analyzer.resolve().unwrap();
    insta::assert_snapshot!(log.entries().join("\n"), @r"
    first process a
    second process a
    first process a.x
    second process a.x
    first verify a
    second verify a
    first verify a.x
    second verify a.x
    ");
}

#[test]
fn test_process_attaches_traits() {
    let mut drivers = AttributeDriverRegistry::new();
    drivers.register(Tag);
    let mut analyzer = with_drivers(drivers);
    analyzer.add_model(
        record("a", vec![fields(vec![prop("x", "INT").with_attribute(attribute("tag"))])])
            .with_attribute(attribute("tag")),
    );

    let world = analyzer.resolve().unwrap();
    let a = world.find_model("a").unwrap();
    assert_eq!(a.traits().extensions.get::<Tagged>(), Some(&Tagged));
    let x = a.members().get("x").unwrap();
    assert!(x.traits().contains::<Tagged>());
}

#[test]
fn test_unknown_attribute_is_reported_once() {
    let log = Log::default();
    let mut drivers = AttributeDriverRegistry::new();
    drivers.register(Recorder {
        tag: "only",
        log: log.clone(),
    });
    let mut analyzer = with_drivers(drivers);
    analyzer.add_model(
        record("a", vec![fields(vec![prop("x", "INT").with_attribute(attribute("nope"))])])
            .with_attribute(attribute("trace")),
    );

    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error.phase(), Phase::AttributeResolution);
    assert_eq!(error_codes(&error), vec![codes::UNKNOWN_ATTRIBUTE]);
    // verification never starts
    assert_eq!(log.entries(), vec!["only process a"]);
}

#[test]
fn test_verify_sees_processed_traits() {
    let mut drivers = AttributeDriverRegistry::new();
    drivers.register(Tag);
    drivers.register(Checked);
    let mut analyzer = with_drivers(drivers);
    analyzer.add_model(
        record("good", vec![fields(vec![prop("x", "INT")])])
            .with_attribute(attribute("checked"))
            .with_attribute(attribute("tag")),
    );
    analyzer.add_model(
        record("bad", vec![fields(vec![prop("x", "INT")])]).with_attribute(attribute("checked")),
    );

    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error.phase(), Phase::AttributeVerification);
    let messages: Vec<_> = error
        .errors()
        .flat_map(|d| d.labels.iter().map(|l| l.message.as_str()))
        .collect();
    assert_eq!(messages, vec!["`bad` is not tagged"]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_error_summarizes_phase() {
    use miette::Diagnostic as _;

    let mut analyzer = analyzer(vec![record(
        "a",
        vec![fields(vec![prop("x", "VARCHAR"), prop("y", "CHAR")])],
    )]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(
        error.to_string(),
        "DMDL analysis was stopped by 2 error(s) during symbol resolution"
    );
    assert_eq!(error.related().map(Iterator::count), Some(2));
    assert_eq!(error.code().map(|c| c.to_string()).as_deref(), Some("dmdl::analysis_failed"));
}

#[test]
fn test_world_survives_failed_resolution() {
    let mut analyzer = analyzer(vec![
        record("ok", vec![fields(vec![prop("x", "INT")])]),
        record("broken", vec![model_ref("ok"), fields(vec![prop("x", "TEXT")])]),
    ]);
    assert!(analyzer.resolve().is_err());

    let world = analyzer.into_world();
    assert_eq!(world.find_model("ok").unwrap().properties().count(), 1);
    assert!(world.find_model("broken").unwrap().find_property("x").is_some());
    assert!(world.has_errors());
}
