//! Record and projection resolution: unions of model references and inline
//! property lists.

use super::ModelResolver;
use crate::declaration::{MemberDeclaration, PropertyDeclaration};
use crate::symbol::ModelSymbol;
use crate::traits::{ProjectionsTrait, ReferencesTrait};
use dmdl_core::codes;
use dmdl_syntax::{
    ModelKind, ModelReference, PropertyKind, RecordDefinition, RecordTerm, UnionExpression,
};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

impl ModelResolver<'_> {
    pub(super) fn resolve_record(&mut self, union: &UnionExpression<RecordTerm>) {
        let mut references = Vec::new();
        let mut projections = Vec::new();
        for term in &union.terms {
            match term {
                RecordTerm::Reference(reference) => {
                    if let Some(projective) = self.union_model(reference) {
                        let symbol = ModelSymbol::new(reference.name.as_str());
                        if projective {
                            projections.push(symbol.clone());
                        }
                        references.push(symbol);
                    }
                }
                RecordTerm::Definition(definition) => self.union_definition(definition),
            }
        }
        debug!(model = %self.symbol, ?references, ?projections, "record terms resolved");
        self.traits.references = Some(ReferencesTrait {
            span: union.span,
            references,
        });
        self.traits.projections = Some(ProjectionsTrait {
            span: union.span,
            projections,
        });

        if self.has_error() {
            return;
        }
        self.resolve_property_references(union);

        if self.model.kind() != ModelKind::Record || self.has_error() {
            return;
        }
        let stubs: Vec<_> = self
            .members
            .references()
            .filter(|r| r.reference.is_stub())
            .map(|r| (r.name.clone(), r.span))
            .collect();
        for (name, span) in stubs {
            let message = format!(
                "`{}.{}` must list the properties it refers to",
                self.symbol, name
            );
            self.error(
                codes::MISSING_REFERENCE_BODY,
                "missing reference body",
                span,
                message,
            );
        }
    }

    /// Copies the properties of a referenced model. Returns whether that model
    /// is projective, or `None` if it is not declared.
    fn union_model(&mut self, reference: &ModelReference) -> Option<bool> {
        debug!(model = %self.symbol, reference = %reference.name, "processing model reference");
        let Some(source) = self.world().find_model(reference.name.as_str()) else {
            let message = format!("model `{}` is not declared", reference.name);
            self.error(
                codes::UNKNOWN_MODEL,
                "unknown model",
                reference.name.span,
                message,
            );
            return None;
        };
        for property in source.properties() {
            if let Some(other) = self.members.property(property.name.as_str()) {
                trace!(property = %property.symbol(), "property is duplicated");
                if !property.ty.is_same(&other.ty) {
                    let message = format!(
                        "`{}` is already declared in `{}` as `{}`, but `{}` declares it as `{}`",
                        property.name, self.symbol, other.ty, reference.name, property.ty
                    );
                    self.error(
                        codes::INCONSISTENT_TYPE,
                        "inconsistent property type",
                        reference.span,
                        message,
                    );
                }
                continue;
            }
            let copy = PropertyDeclaration::new(
                self.symbol.clone(),
                property.name.clone(),
                property.ty.clone(),
                reference.span,
            )
            .with_description(property.description.clone())
            .with_attributes(property.attributes.clone());
            self.declare(MemberDeclaration::Property(copy));
        }
        Some(source.kind() == ModelKind::Projective)
    }

    /// Declares the normal properties of an inline property list.
    fn union_definition(&mut self, definition: &RecordDefinition) {
        let mut seen = FxHashSet::default();
        for property in &definition.properties {
            // references are resolved once every plain property is known
            if property.kind == PropertyKind::Reference {
                continue;
            }
            if !seen.insert(property.name.as_str()) {
                let message = format!("`{}` is declared twice in this block", property.name);
                self.error(
                    codes::DUPLICATE_PROPERTY,
                    "duplicate property",
                    property.name.span,
                    message,
                );
                continue;
            }
            let Some(syntax) = &property.ty else {
                let message = format!("`{}` has no type", property.name);
                self.error(
                    codes::UNKNOWN_TYPE,
                    "unknown type",
                    property.name.span,
                    message,
                );
                continue;
            };
            let Some(ty) = self.ctx.types.resolve(syntax) else {
                let message = format!("type `{syntax}` cannot be resolved");
                self.error(codes::UNKNOWN_TYPE, "unknown type", syntax.span(), message);
                continue;
            };
            if let Some(other) = self.members.property(property.name.as_str()) {
                trace!(property = %property.name, "property is duplicated");
                if !ty.is_same(&other.ty) {
                    let message = format!(
                        "`{}` is already declared in `{}` as `{}`",
                        property.name, self.symbol, other.ty
                    );
                    self.error(
                        codes::INCONSISTENT_TYPE,
                        "inconsistent property type",
                        property.name.span,
                        message,
                    );
                }
                continue;
            }
            let declaration = PropertyDeclaration::new(
                self.symbol.clone(),
                property.name.clone(),
                ty,
                property.span,
            )
            .with_description(property.description.clone())
            .with_attributes(property.attributes.clone());
            self.declare(MemberDeclaration::Property(declaration));
        }
    }
}
