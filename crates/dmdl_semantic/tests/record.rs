mod common;

use common::*;
use dmdl_core::codes;
use dmdl_semantic::{BasicTypeKind, ModelSymbol, Phase, Type};

#[test]
fn test_projection_union() {
    let mut analyzer = analyzer(vec![
        projective("foo", vec![fields(vec![prop("name", "TEXT")])]),
        record("bar", vec![model_ref("foo"), fields(vec![prop("age", "INT")])]),
    ]);
    let world = analyzer.resolve().unwrap();
    assert!(world.diagnostics().is_empty());

    let bar = world.find_model("bar").unwrap();
    insta::assert_snapshot!(render(bar), @r"
    name : TEXT
    age : INT
    ");
    let projections = &bar.traits().projections.as_ref().unwrap().projections;
    assert_eq!(projections, &vec![ModelSymbol::new("foo")]);
}

#[test]
fn test_references_trait_lists_every_model_term() {
    let mut analyzer = analyzer(vec![
        projective("a", vec![fields(vec![prop("x", "INT")])]),
        record("b", vec![fields(vec![prop("y", "INT")])]),
        record("c", vec![model_ref("a"), model_ref("b")]),
    ]);
    let world = analyzer.resolve().unwrap();
    let traits = world.find_model("c").unwrap().traits();

    let references = &traits.references.as_ref().unwrap().references;
    assert_eq!(references, &vec![ModelSymbol::new("a"), ModelSymbol::new("b")]);
    let projections = &traits.projections.as_ref().unwrap().projections;
    assert_eq!(projections, &vec![ModelSymbol::new("a")]);
}

#[test]
fn test_same_type_collision_keeps_first_declaration() {
    let mut analyzer = analyzer_accepting(
        &["first", "second"],
        vec![record(
            "c",
            vec![
                fields(vec![prop("x", "INT").with_attribute(attribute("first"))]),
                fields(vec![
                    prop("x", "INT").with_attribute(attribute("second")),
                    prop("y", "TEXT"),
                ]),
            ],
        )],
    );

    let world = analyzer.resolve().unwrap();
    let c = world.find_model("c").unwrap();
    assert_eq!(c.properties().count(), 2);
    let x = c.find_property("x").unwrap();
    let attributes: Vec<_> = x.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(attributes, vec!["first"]);
}

#[test]
fn test_different_type_collision_is_reported_once() {
    let mut analyzer = analyzer(vec![record(
        "c",
        vec![
            fields(vec![prop("x", "INT")]),
            fields(vec![prop("x", "TEXT")]),
        ],
    )]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error.phase(), Phase::SymbolResolution);
    assert_eq!(error_codes(&error), vec![codes::INCONSISTENT_TYPE]);

    let c = analyzer.world().find_model("c").unwrap();
    assert_eq!(c.properties().count(), 1);
    assert_eq!(
        c.find_property("x").unwrap().ty,
        Type::basic(BasicTypeKind::Int)
    );
}

#[test]
fn test_model_reference_collision_with_different_type() {
    let mut analyzer = analyzer(vec![
        record("a", vec![fields(vec![prop("x", "INT")])]),
        record("b", vec![fields(vec![prop("x", "LONG")])]),
        record("c", vec![model_ref("a"), model_ref("b")]),
    ]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error_codes(&error), vec![codes::INCONSISTENT_TYPE]);
}

#[test]
fn test_duplicate_property_in_one_block() {
    let mut analyzer = analyzer(vec![record(
        "c",
        vec![fields(vec![prop("x", "INT"), prop("x", "INT")])],
    )]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error_codes(&error), vec![codes::DUPLICATE_PROPERTY]);
}

#[test]
fn test_unknown_type_skips_property() {
    let mut analyzer = analyzer(vec![record(
        "c",
        vec![fields(vec![prop("x", "VARCHAR"), prop("y", "date")])],
    )]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error_codes(&error), vec![codes::UNKNOWN_TYPE]);

    let c = analyzer.world().find_model("c").unwrap();
    assert!(c.find_property("x").is_none());
    assert_eq!(
        c.find_property("y").unwrap().ty,
        Type::basic(BasicTypeKind::Date)
    );
}

#[test]
fn test_unknown_model_reference() {
    let mut analyzer = analyzer(vec![record(
        "c",
        vec![model_ref("missing"), fields(vec![prop("x", "INT")])],
    )]);
    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error_codes(&error), vec![codes::UNKNOWN_MODEL]);
}

#[test]
fn test_duplicate_model_keeps_first_declaration() {
    let first = record("item", vec![fields(vec![prop("a", "INT")])]);
    let second = record("item", vec![fields(vec![prop("b", "TEXT")])]);
    let mut analyzer = analyzer(vec![first.clone(), second]);

    let error = analyzer.resolve().unwrap_err();
    assert_eq!(error.phase(), Phase::Registration);
    assert_eq!(error_codes(&error), vec![codes::DUPLICATE_MODEL]);

    let world = analyzer.world();
    assert_eq!(world.model_count(), 1);
    assert_eq!(world.find_model("item").unwrap().definition(), &first);
}

#[test]
fn test_registration_order_does_not_matter() {
    let models = || {
        vec![
            record("derived", vec![model_ref("base"), fields(vec![prop("z", "TEXT")])]),
            record("unrelated", vec![fields(vec![prop("u", "BOOLEAN")])]),
            record("base", vec![fields(vec![prop("x", "INT"), prop("y", "LONG")])]),
        ]
    };

    let mut forward = analyzer(models());
    let mut reversed = analyzer(models().into_iter().rev().collect());
    let forward = forward.resolve().unwrap();
    let reversed = reversed.resolve().unwrap();

    for model in ["base", "derived", "unrelated"] {
        assert_eq!(
            render(forward.find_model(model).unwrap()),
            render(reversed.find_model(model).unwrap()),
        );
    }
    insta::assert_snapshot!(render(forward.find_model("derived").unwrap()), @r"
    x : INT
    y : LONG
    z : TEXT
    ");
}
