//! Property reference resolution.
//!
//! Explicit references come from reference-kind properties of inline
//! property lists. Implicit references are inherited from every unioned
//! model that declares them and are merged across parents.

use super::ModelResolver;
use crate::declaration::{
    MemberDeclaration, ModelDeclaration, PropertyReferenceDeclaration, ReferenceContainer,
    ReferenceKind,
};
use crate::symbol::PropertySymbol;
use crate::types::Type;
use dmdl_core::{codes, Span};
use dmdl_syntax::{
    AttributeValue, Description, MapEntry, PropertyDefinition, PropertyKind, QualifiedName,
    RecordTerm, UnionExpression,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// Explicitly declared shape of a reference: `{T}` or `{:T}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReferenceType {
    kind: ReferenceKind,
    element: Type,
}

impl<'a> ModelResolver<'a> {
    pub(super) fn resolve_property_references(&mut self, union: &UnionExpression<RecordTerm>) {
        let world = self.world();
        let mut parents: Vec<(&'a ModelDeclaration, Span)> = Vec::new();
        for term in &union.terms {
            if let RecordTerm::Reference(reference) = term {
                if let Some(parent) = world.find_model(reference.name.as_str()) {
                    parents.push((parent, reference.span));
                }
            }
        }

        for term in &union.terms {
            if let RecordTerm::Definition(definition) = term {
                for property in &definition.properties {
                    if property.kind == PropertyKind::Reference {
                        self.define_reference(property, &parents);
                    }
                }
            }
        }

        self.inherit_references(&parents);
    }

    // =========================================================================
    // Explicit references
    // =========================================================================

    fn define_reference(
        &mut self,
        property: &PropertyDefinition,
        parents: &[(&'a ModelDeclaration, Span)],
    ) {
        debug!(model = %self.symbol, reference = %property.name, "resolving property reference");
        if self.members.contains(property.name.as_str()) {
            let message = format!("`{}` is already declared in `{}`", property.name, self.symbol);
            self.error(
                codes::DUPLICATE_PROPERTY,
                "duplicate property",
                property.name.span,
                message,
            );
            return;
        }

        let explicit = match &property.ty {
            None => inherited_type(parents, property.name.as_str()),
            Some(syntax) => {
                let Some(ty) = self.ctx.types.resolve(syntax) else {
                    let message = format!("type `{syntax}` cannot be resolved");
                    self.error(codes::UNKNOWN_TYPE, "unknown type", syntax.span(), message);
                    return;
                };
                match ty {
                    Type::Collection { kind, element } if element.as_basic().is_some() => {
                        Some(ReferenceType {
                            kind: kind.into(),
                            element: *element,
                        })
                    }
                    other => {
                        let message = format!(
                            "`{}` must be a list or map of a basic type, not `{other}`",
                            property.name
                        );
                        self.error(
                            codes::INVALID_REFERENCE_TYPE,
                            "invalid reference type",
                            syntax.span(),
                            message,
                        );
                        return;
                    }
                }
            }
        };

        match &property.expression {
            None => {
                let Some(explicit) = explicit else {
                    let message = format!("`{}` needs a type", property.name);
                    self.error(
                        codes::MISSING_REFERENCE_TYPE,
                        "missing reference type",
                        property.name.span,
                        message,
                    );
                    return;
                };
                let description = property
                    .description
                    .clone()
                    .or_else(|| inherited_description(parents, property.name.as_str()));
                let declaration = PropertyReferenceDeclaration::new(
                    self.symbol.clone(),
                    property.name.clone(),
                    explicit.element,
                    ReferenceContainer::Stub(explicit.kind),
                    property.span,
                )
                .with_description(description)
                .with_attributes(property.attributes.clone());
                self.declare(MemberDeclaration::Reference(declaration));
            }
            Some(AttributeValue::QualifiedName(selector)) => {
                self.select_reference(property, selector, explicit.as_ref(), parents);
            }
            Some(AttributeValue::Array(elements, span)) => {
                self.list_reference(property, elements, *span, explicit.as_ref(), parents);
            }
            Some(AttributeValue::Map(entries, span)) => {
                self.map_reference(property, entries, *span, explicit.as_ref(), parents);
            }
            Some(other) => {
                let message = format!(
                    "`{}` must be `Model.reference`, a list of properties or a map of properties",
                    property.name
                );
                self.error(
                    codes::INVALID_REFERENCE_EXPRESSION,
                    "invalid reference expression",
                    other.span(),
                    message,
                );
            }
        }
    }

    /// `name = Parent.reference;`
    fn select_reference(
        &mut self,
        property: &PropertyDefinition,
        selector: &QualifiedName,
        explicit: Option<&ReferenceType>,
        parents: &[(&'a ModelDeclaration, Span)],
    ) {
        let owner_name = selector.qualifier.as_str();
        let Some(&(owner, _)) = parents.iter().find(|(p, _)| p.name().as_str() == owner_name)
        else {
            let names: Vec<_> = parents.iter().map(|(p, _)| p.name().as_str()).collect();
            let message = format!(
                "`{selector}` must select a reference of a unioned model ({})",
                names.join(", ")
            );
            self.error(
                codes::IRRELEVANT_SELECTOR_TARGET,
                "irrelevant selector target",
                selector.span,
                message,
            );
            return;
        };
        let target = selector.name.as_str();
        let Some(reference) = owner.find_reference(target) else {
            let (code, title) = if owner.members().contains(target) {
                (codes::INVALID_SELECTOR_TARGET, "invalid selector target")
            } else {
                (codes::MISSING_SELECTOR_TARGET, "missing selector target")
            };
            let message = format!("`{owner_name}` has no property reference `{target}`");
            self.error(code, title, selector.span, message);
            return;
        };
        if !self.check_reference_type(
            property,
            explicit,
            reference.reference.kind(),
            &reference.element_type,
        ) {
            return;
        }
        if reference.reference.is_stub() {
            let message = format!("`{selector}` does not list any properties yet");
            self.error(
                codes::STUB_SELECTOR_TARGET,
                "stub selector target",
                selector.span,
                message,
            );
            return;
        }
        let Some(container) = self.remap_onto_self(&reference.reference, selector.span) else {
            return;
        };
        let attributes = if property.attributes.is_empty() {
            reference.attributes.clone()
        } else {
            property.attributes.clone()
        };
        let declaration = PropertyReferenceDeclaration::new(
            self.symbol.clone(),
            property.name.clone(),
            reference.element_type.clone(),
            container,
            property.span,
        )
        .with_description(
            property
                .description
                .clone()
                .or_else(|| reference.description.clone()),
        )
        .with_attributes(attributes);
        self.declare(MemberDeclaration::Reference(declaration));
    }

    /// `name = { a, b, c };`
    fn list_reference(
        &mut self,
        property: &PropertyDefinition,
        elements: &[AttributeValue],
        span: Span,
        explicit: Option<&ReferenceType>,
        parents: &[(&'a ModelDeclaration, Span)],
    ) {
        if elements.is_empty() && explicit.is_none() {
            self.require_explicit_type(property, span);
            return;
        }
        let mut element_type = explicit.map(|t| t.element.clone());
        let mut symbols = Vec::with_capacity(elements.len());
        for element in elements {
            let Some((symbol, ty)) = self.find_element(property, element, element_type.as_ref())
            else {
                return;
            };
            element_type = Some(ty);
            symbols.push(symbol);
        }
        self.declare_explicit(
            property,
            explicit,
            element_type,
            ReferenceContainer::List(symbols),
            parents,
        );
    }

    /// `name = { "key" : a, ... };`
    fn map_reference(
        &mut self,
        property: &PropertyDefinition,
        entries: &[MapEntry],
        span: Span,
        explicit: Option<&ReferenceType>,
        parents: &[(&'a ModelDeclaration, Span)],
    ) {
        if entries.is_empty() && explicit.is_none() {
            self.require_explicit_type(property, span);
            return;
        }
        let mut element_type = explicit.map(|t| t.element.clone());
        let mut symbols = IndexMap::with_capacity(entries.len());
        for entry in entries {
            let Some(key) = entry.key.as_string() else {
                let message = format!("map key `{}` must be a string", entry.key);
                self.error(
                    codes::INVALID_MAP_KEY,
                    "invalid map key",
                    entry.key.span,
                    message,
                );
                return;
            };
            if symbols.contains_key(key) {
                let message = format!("map key \"{key}\" appears more than once");
                self.error(
                    codes::DUPLICATE_MAP_KEY,
                    "duplicate map key",
                    entry.key.span,
                    message,
                );
                return;
            }
            let Some((symbol, ty)) =
                self.find_element(property, &entry.value, element_type.as_ref())
            else {
                return;
            };
            element_type = Some(ty);
            symbols.insert(key.to_string(), symbol);
        }
        self.declare_explicit(
            property,
            explicit,
            element_type,
            ReferenceContainer::Map(symbols),
            parents,
        );
    }

    fn declare_explicit(
        &mut self,
        property: &PropertyDefinition,
        explicit: Option<&ReferenceType>,
        element_type: Option<Type>,
        container: ReferenceContainer,
        parents: &[(&'a ModelDeclaration, Span)],
    ) {
        // an empty body always comes with an explicit type
        let Some(element_type) = element_type else {
            self.require_explicit_type(property, property.span);
            return;
        };
        if !self.check_reference_type(property, explicit, container.kind(), &element_type) {
            return;
        }
        let description = property
            .description
            .clone()
            .or_else(|| inherited_description(parents, property.name.as_str()));
        let declaration = PropertyReferenceDeclaration::new(
            self.symbol.clone(),
            property.name.clone(),
            element_type,
            container,
            property.span,
        )
        .with_description(description)
        .with_attributes(property.attributes.clone());
        self.declare(MemberDeclaration::Reference(declaration));
    }

    /// Resolves one element of a list or map body against this model's
    /// own properties.
    fn find_element(
        &mut self,
        property: &PropertyDefinition,
        element: &AttributeValue,
        expected: Option<&Type>,
    ) -> Option<(PropertySymbol, Type)> {
        let AttributeValue::Name(name) = element else {
            let message = format!("elements of `{}` must be property names", property.name);
            self.error(
                codes::INVALID_REFERENCE_EXPRESSION,
                "invalid reference expression",
                element.span(),
                message,
            );
            return None;
        };
        let Some(declaration) = self.members.property(name.as_str()) else {
            let message = format!(
                "`{}` refers to `{name}`, which is not a property of `{}`",
                property.name, self.symbol
            );
            self.error(
                codes::MISSING_REFERENCE_ELEMENT,
                "missing reference element",
                name.span,
                message,
            );
            return None;
        };
        if let Some(expected) = expected {
            if !expected.is_same(&declaration.ty) {
                let message = format!(
                    "`{name}` is `{}`, but `{}` holds `{expected}`",
                    declaration.ty, property.name
                );
                self.error(
                    codes::INVALID_REFERENCE_ELEMENT,
                    "invalid reference element",
                    name.span,
                    message,
                );
                return None;
            }
        }
        Some((declaration.symbol(), declaration.ty.clone()))
    }

    fn require_explicit_type(&mut self, property: &PropertyDefinition, span: Span) {
        let message = format!("`{}` has an empty body and needs a type", property.name);
        self.error(
            codes::MISSING_REFERENCE_TYPE,
            "missing reference type",
            span,
            message,
        );
    }

    /// Checks a resolved shape against the declared type, if any.
    fn check_reference_type(
        &mut self,
        property: &PropertyDefinition,
        explicit: Option<&ReferenceType>,
        kind: ReferenceKind,
        element: &Type,
    ) -> bool {
        let Some(explicit) = explicit else {
            return true;
        };
        if explicit.kind == kind && explicit.element.is_same(element) {
            return true;
        }
        let declared = Type::collection(explicit.kind.collection_kind(), explicit.element.clone());
        let actual = Type::collection(kind.collection_kind(), element.clone());
        let message = format!(
            "`{}` is declared as `{declared}` but refers to `{actual}`",
            property.name
        );
        self.error(
            codes::INCONSISTENT_REFERENCE_TYPE,
            "inconsistent reference type",
            property.name.span,
            message,
        );
        false
    }

    /// Points every member of `container` at this model's same-named property.
    fn remap_onto_self(
        &mut self,
        container: &ReferenceContainer,
        span: Span,
    ) -> Option<ReferenceContainer> {
        let members = &self.members;
        match container.remap(|source| members.property(source.name()).map(|p| p.symbol())) {
            Ok(remapped) => Some(remapped),
            Err(missing) => {
                let message = format!(
                    "`{missing}` has no counterpart property in `{}`",
                    self.symbol
                );
                self.error(
                    codes::MISSING_REFERENCE_ELEMENT,
                    "missing reference element",
                    span,
                    message,
                );
                None
            }
        }
    }

    // =========================================================================
    // Implicit references
    // =========================================================================

    fn inherit_references(&mut self, parents: &[(&'a ModelDeclaration, Span)]) {
        let mut candidates: IndexMap<&str, (&'a PropertyReferenceDeclaration, Span)> =
            IndexMap::new();
        for &(parent, span) in parents {
            for reference in parent.references() {
                let name = reference.name.as_str();
                if let Some(member) = self.members.get(name) {
                    if member.as_reference().is_none() {
                        let message = format!(
                            "`{}` inherits reference `{name}`, but `{name}` is already a property",
                            self.symbol
                        );
                        self.error(codes::DUPLICATE_PROPERTY, "duplicate property", span, message);
                    }
                    trace!(reference = %reference.symbol(), "explicitly declared, skipped");
                    continue;
                }
                let Some(&(conflict, _)) = candidates.get(name) else {
                    candidates.insert(name, (reference, span));
                    continue;
                };
                if conflict.reference.kind() != reference.reference.kind()
                    || !conflict.element_type.is_same(&reference.element_type)
                {
                    let message = format!(
                        "`{}` inherits reference `{name}` as both `{}` and `{}`",
                        self.symbol,
                        conflict.ty(),
                        reference.ty()
                    );
                    self.error(
                        codes::INCONSISTENT_TYPE,
                        "inconsistent property type",
                        span,
                        message,
                    );
                    continue;
                }
                if !conflict.reference.is_stub()
                    && !reference.reference.is_stub()
                    && !conflict.reference.is_equivalent(&reference.reference)
                {
                    let message = format!(
                        "`{}` and `{}` both declare reference `{name}` with different members",
                        conflict.owner, reference.owner
                    );
                    self.error(
                        codes::AMBIGUOUS_REFERENCE_PARENT,
                        "ambiguous reference parent",
                        span,
                        message,
                    );
                    continue;
                }
                if conflict.reference.is_stub() {
                    candidates.insert(name, (reference, span));
                }
            }
        }

        for (reference, span) in candidates.into_values() {
            debug!(
                model = %self.symbol,
                reference = %reference.symbol(),
                "inheriting property reference"
            );
            let Some(container) = self.remap_onto_self(&reference.reference, span) else {
                continue;
            };
            let declaration = PropertyReferenceDeclaration::new(
                self.symbol.clone(),
                reference.name.clone(),
                reference.element_type.clone(),
                container,
                span,
            )
            .with_description(reference.description.clone())
            .with_attributes(reference.attributes.clone());
            self.declare(MemberDeclaration::Reference(declaration));
        }
    }
}

/// The shape every parent agrees on for reference `name`, if any.
fn inherited_type(parents: &[(&ModelDeclaration, Span)], name: &str) -> Option<ReferenceType> {
    let mut result: Option<ReferenceType> = None;
    for (parent, _) in parents {
        let Some(reference) = parent.find_reference(name) else {
            continue;
        };
        let candidate = ReferenceType {
            kind: reference.reference.kind(),
            element: reference.element_type.clone(),
        };
        match &result {
            None => result = Some(candidate),
            Some(current) if *current == candidate => {}
            Some(_) => return None,
        }
    }
    result
}

/// The description every parent agrees on for reference `name`, if all of
/// them have one.
fn inherited_description(
    parents: &[(&ModelDeclaration, Span)],
    name: &str,
) -> Option<Description> {
    let mut result: Option<&Description> = None;
    for (parent, _) in parents {
        let Some(reference) = parent.find_reference(name) else {
            continue;
        };
        let description = reference.description.as_ref()?;
        match result {
            None => result = Some(description),
            Some(current) if current.value == description.value => {}
            Some(_) => return None,
        }
    }
    result.cloned()
}
