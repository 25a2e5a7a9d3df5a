//! Joined and summarized models.
//!
//! Both reduce a union of terms into one property set. Each term contributes
//! mapping factors and grouping keys; terms must agree on their grouping keys.

use super::ModelResolver;
use crate::declaration::{MemberDeclaration, ModelDeclaration, PropertyDeclaration};
use crate::options::ExcessTermPolicy;
use crate::symbol::PropertySymbol;
use crate::traits::{JoinTrait, MappingFactor, ReduceTerm, SummarizeTrait};
use crate::types::{MappingKind, Type};
use dmdl_core::{codes, Span};
use dmdl_syntax::{Grouping, JoinTerm, ModelReference, SummarizeTerm, UnionExpression};
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// A resolved term plus where each grouping key was written.
struct PendingTerm {
    term: ReduceTerm,
    grouping_spans: Vec<Span>,
}

impl<'a> ModelResolver<'a> {
    // =========================================================================
    // Join
    // =========================================================================

    pub(super) fn resolve_joined(&mut self, union: &UnionExpression<JoinTerm>) {
        let limit = self.ctx.options.max_join_terms;
        if union.terms.len() > limit {
            let message = format!(
                "`{}` joins {} models, at most {limit} are allowed",
                self.symbol,
                union.terms.len()
            );
            self.error(
                codes::TOO_MANY_JOIN_TERMS,
                "too many join terms",
                union.span,
                message,
            );
            if self.ctx.options.excess_join_terms == ExcessTermPolicy::Reject {
                return;
            }
        }

        let mut terms = Vec::with_capacity(union.terms.len());
        for term in &union.terms {
            debug!(model = %self.symbol, source = %term.reference.name, "resolving joined term");
            let Some(source) = self.source_model(&term.reference) else {
                continue;
            };
            let (properties, mappings) = self.join_properties(source, term);
            let (grouping, grouping_spans) =
                self.resolve_grouping(&properties, term.grouping.as_ref());
            terms.push(PendingTerm {
                term: ReduceTerm {
                    source: source.symbol(),
                    mappings,
                    grouping,
                    span: term.span,
                },
                grouping_spans,
            });
        }

        if !self.has_error() && self.check_join_terms(&terms) {
            self.traits.join = Some(JoinTrait {
                span: union.span,
                terms: terms.into_iter().map(|t| t.term).collect(),
            });
        }
        // joined models never inherit property references
    }

    /// Declares the properties a join term contributes and returns the
    /// term's own property names with its mapping factors.
    fn join_properties(
        &mut self,
        source: &'a ModelDeclaration,
        term: &JoinTerm,
    ) -> (IndexSet<String>, Vec<MappingFactor>) {
        let source_symbol = source.symbol();
        let mut properties = IndexSet::new();
        let mut mappings = Vec::new();
        match &term.mapping {
            None => {
                for property in source.properties() {
                    let target = property.name.as_str();
                    if self.members.property(target).is_some() {
                        trace!(property = %property.symbol(), "property is duplicated");
                    } else {
                        let copy = PropertyDeclaration::new(
                            self.symbol.clone(),
                            property.name.clone(),
                            property.ty.clone(),
                            term.reference.span,
                        )
                        .with_description(property.description.clone())
                        .with_attributes(property.attributes.clone());
                        if !self.declare(MemberDeclaration::Property(copy)) {
                            continue;
                        }
                    }
                    properties.insert(target.to_string());
                    mappings.push(MappingFactor {
                        kind: MappingKind::Any,
                        source: property.symbol(),
                        target: self.symbol.property(target),
                    });
                }
            }
            Some(mapping) => {
                let mut seen = FxHashSet::default();
                for entry in &mapping.properties {
                    let target = entry.target.as_str();
                    if !seen.insert(target) {
                        let message = format!("`{target}` is mapped twice in this join term");
                        self.error(
                            codes::DUPLICATE_MAPPING_TARGET,
                            "duplicate mapping target",
                            entry.span,
                            message,
                        );
                        continue;
                    }
                    let Some(origin) = source.find_property(entry.source.as_str()) else {
                        let message = format!(
                            "`{}` is not a property of `{}`",
                            entry.source, source_symbol
                        );
                        self.error(
                            codes::UNKNOWN_PROPERTY,
                            "unknown property",
                            entry.source.span,
                            message,
                        );
                        continue;
                    };
                    if self.members.property(target).is_some() {
                        trace!(property = %entry.target, "property is duplicated");
                    } else {
                        let declaration = PropertyDeclaration::new(
                            self.symbol.clone(),
                            entry.target.clone(),
                            origin.ty.clone(),
                            entry.span,
                        )
                        .with_description(entry.description.clone())
                        .with_attributes(entry.attributes.clone());
                        if !self.declare(MemberDeclaration::Property(declaration)) {
                            continue;
                        }
                    }
                    properties.insert(target.to_string());
                    mappings.push(MappingFactor {
                        kind: MappingKind::Any,
                        source: origin.symbol(),
                        target: self.symbol.property(target),
                    });
                }
            }
        }
        (properties, mappings)
    }

    fn check_join_terms(&mut self, terms: &[PendingTerm]) -> bool {
        if !self.check_grouping(terms) {
            return false;
        }
        let mut green = true;
        let mut targets = FxHashSet::default();
        for pending in terms {
            let term = &pending.term;
            let keys: FxHashSet<&str> = term.grouping.iter().map(PropertySymbol::name).collect();
            for factor in &term.mappings {
                let name = factor.target.name();
                if !targets.insert(name) && !keys.contains(name) {
                    let message = format!(
                        "`{name}` is provided by more than one join term but is not a grouping key"
                    );
                    self.error(
                        codes::DUPLICATE_JOIN_GROUPING_PROPERTY,
                        "duplicate join property",
                        term.span,
                        message,
                    );
                    green = false;
                }
            }
        }
        green
    }

    // =========================================================================
    // Summarize
    // =========================================================================

    pub(super) fn resolve_summarized(&mut self, union: &UnionExpression<SummarizeTerm>) {
        let mut terms = Vec::with_capacity(union.terms.len());
        for term in &union.terms {
            debug!(
                model = %self.symbol,
                source = %term.reference.name,
                "resolving summarized term"
            );
            let Some(source) = self.source_model(&term.reference) else {
                continue;
            };
            let (properties, mappings) = self.fold_properties(source, term);
            let (grouping, grouping_spans) =
                self.resolve_grouping(&properties, term.grouping.as_ref());
            terms.push(PendingTerm {
                term: ReduceTerm {
                    source: source.symbol(),
                    mappings,
                    grouping,
                    span: term.span,
                },
                grouping_spans,
            });
        }

        if self.check_summarize_terms(&terms, union.span) && !self.has_error() {
            self.traits.summarize = Some(SummarizeTrait {
                span: union.span,
                terms: terms.into_iter().map(|t| t.term).collect(),
            });
        }
        // summarized models never inherit property references
    }

    fn fold_properties(
        &mut self,
        source: &'a ModelDeclaration,
        term: &SummarizeTerm,
    ) -> (IndexSet<String>, Vec<MappingFactor>) {
        let source_symbol = source.symbol();
        let mut properties = IndexSet::new();
        let mut mappings = Vec::new();
        for folding in &term.folding.properties {
            let Some(origin) = source.find_property(folding.source.as_str()) else {
                let message = format!(
                    "`{}` is not a property of `{}`",
                    folding.source, source_symbol
                );
                self.error(
                    codes::UNKNOWN_PROPERTY,
                    "unknown property",
                    folding.source.span,
                    message,
                );
                continue;
            };
            let Some(kind) = MappingKind::from_keyword(folding.aggregator.as_str()) else {
                let message = format!(
                    "`{}` is not an aggregate function (any, sum, max, min, count)",
                    folding.aggregator
                );
                self.error(
                    codes::UNKNOWN_AGGREGATE_FUNCTION,
                    "unknown aggregate function",
                    folding.aggregator.span,
                    message,
                );
                continue;
            };
            let Some(ty) = origin.ty.map(kind) else {
                let message = format!(
                    "`{kind}` cannot be applied to `{} : {}`",
                    folding.source, origin.ty
                );
                self.error(
                    codes::INCONSISTENT_AGGREGATE_FUNCTION,
                    "inconsistent aggregate function",
                    folding.span,
                    message,
                );
                continue;
            };
            let target = folding.target.as_str();
            if self.members.contains(target) {
                let message = format!("`{target}` is already declared in `{}`", self.symbol);
                self.error(
                    codes::DUPLICATE_PROPERTY,
                    "duplicate property",
                    folding.target.span,
                    message,
                );
                continue;
            }
            let declaration = PropertyDeclaration::new(
                self.symbol.clone(),
                folding.target.clone(),
                ty,
                folding.span,
            )
            .with_description(folding.description.clone())
            .with_attributes(folding.attributes.clone());
            if !self.declare(MemberDeclaration::Property(declaration)) {
                continue;
            }
            properties.insert(target.to_string());
            mappings.push(MappingFactor {
                kind,
                source: origin.symbol(),
                target: self.symbol.property(target),
            });
        }
        (properties, mappings)
    }

    fn check_summarize_terms(&mut self, terms: &[PendingTerm], span: Span) -> bool {
        if !self.check_grouping(terms) {
            return false;
        }
        if terms.len() != 1 {
            let message = format!(
                "`{}` summarizes {} models, only one is supported",
                self.symbol,
                terms.len()
            );
            self.error(
                codes::TOO_MANY_SUMMARIZE_TERMS,
                "too many summarize terms",
                span,
                message,
            );
            return false;
        }
        true
    }

    // =========================================================================
    // Shared
    // =========================================================================

    fn source_model(&mut self, reference: &ModelReference) -> Option<&'a ModelDeclaration> {
        let source = self.world().find_model(reference.name.as_str());
        if source.is_none() {
            let message = format!("model `{}` is not declared", reference.name);
            self.error(
                codes::UNKNOWN_MODEL,
                "unknown model",
                reference.span,
                message,
            );
        }
        source
    }

    /// Resolves grouping keys against the term's own properties.
    fn resolve_grouping(
        &mut self,
        properties: &IndexSet<String>,
        grouping: Option<&Grouping>,
    ) -> (Vec<PropertySymbol>, Vec<Span>) {
        let mut symbols = Vec::new();
        let mut spans = Vec::new();
        let Some(grouping) = grouping else {
            return (symbols, spans);
        };
        for name in &grouping.properties {
            if !properties.contains(name.as_str()) {
                let message = format!("`{name}` is not a property of this term");
                self.error(
                    codes::UNKNOWN_PROPERTY,
                    "unknown property",
                    name.span,
                    message,
                );
                continue;
            }
            symbols.push(self.symbol.property(name.as_str()));
            spans.push(name.span);
        }
        (symbols, spans)
    }

    /// Every term must group by the same number of keys, and the source
    /// types of the keys must line up position by position.
    fn check_grouping(&mut self, terms: &[PendingTerm]) -> bool {
        let Some((first, rest)) = terms.split_first() else {
            return false;
        };
        let first_sources = self.grouping_sources(&first.term);
        let mut green = true;
        for next in rest {
            if first.term.grouping.len() != next.term.grouping.len() {
                let message = format!(
                    "each term of `{}` must have the same number of grouping properties",
                    self.symbol
                );
                self.error(
                    codes::INCONSISTENT_GROUPING_COUNT,
                    "inconsistent grouping count",
                    next.term.span,
                    message,
                );
                return false;
            }
            let next_sources = self.grouping_sources(&next.term);
            for (index, (left, right)) in first_sources.iter().zip(&next_sources).enumerate() {
                let compatible = match (left, right) {
                    (Some(left), Some(right)) => left.is_same(right),
                    _ => false,
                };
                if compatible {
                    continue;
                }
                let key = &next.term.grouping[index];
                let message = match (left, right) {
                    (Some(left), Some(right)) => format!(
                        "grouping property `{}` is `{}`, but the first term groups by `{}`",
                        key.name(),
                        right,
                        left
                    ),
                    _ => format!("grouping property `{}` has no source", key.name()),
                };
                let span = next
                    .grouping_spans
                    .get(index)
                    .copied()
                    .unwrap_or(next.term.span);
                self.error(
                    codes::INCONSISTENT_GROUPING_TYPE,
                    "inconsistent grouping type",
                    span,
                    message,
                );
                green = false;
            }
        }
        green
    }

    /// The type of the source-side property behind each grouping key.
    fn grouping_sources(&self, term: &ReduceTerm) -> Vec<Option<Type>> {
        let reverse: FxHashMap<&PropertySymbol, &PropertySymbol> = term
            .mappings
            .iter()
            .map(|factor| (&factor.target, &factor.source))
            .collect();
        term.grouping
            .iter()
            .map(|key| {
                let source = reverse.get(key).copied().unwrap_or(key);
                self.property_type(source).cloned()
            })
            .collect()
    }
}
