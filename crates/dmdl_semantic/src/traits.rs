//! Traits attached to declarations after resolution.

use crate::symbol::{ModelSymbol, PropertySymbol};
use crate::types::MappingKind;
use dmdl_core::Span;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;

/// Models a record or projection unions in, in term order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencesTrait {
    pub span: Span,
    pub references: Vec<ModelSymbol>,
}

/// The subset of referenced models that are projective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionsTrait {
    pub span: Span,
    pub projections: Vec<ModelSymbol>,
}

/// Resolved terms of a joined model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTrait {
    pub span: Span,
    pub terms: Vec<ReduceTerm>,
}

/// Resolved terms of a summarized model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeTrait {
    pub span: Span,
    pub terms: Vec<ReduceTerm>,
}

/// Source property to target property, tagged with how values are folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFactor {
    pub kind: MappingKind,
    pub source: PropertySymbol,
    pub target: PropertySymbol,
}

/// One term of a join or summarize expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceTerm {
    pub source: ModelSymbol,
    pub mappings: Vec<MappingFactor>,
    /// Grouping keys, as properties of the reduced model.
    pub grouping: Vec<PropertySymbol>,
    pub span: Span,
}

/// Type-keyed values attribute drivers attach to a declaration.
#[derive(Default)]
pub struct TraitMap {
    entries: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl TraitMap {
    /// Stores `value`, replacing any previous value of the same type.
    pub fn put<T: Any + Send + Sync>(&mut self, value: T) {
        self.entries.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TraitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraitMap")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Traits of a model.
#[derive(Debug, Default)]
pub struct Traits {
    pub references: Option<ReferencesTrait>,
    pub projections: Option<ProjectionsTrait>,
    pub join: Option<JoinTrait>,
    pub summarize: Option<SummarizeTrait>,
    pub extensions: TraitMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Namespace(&'static str);

    #[test]
    fn test_trait_map_is_type_keyed() {
        let mut map = TraitMap::default();
        assert!(map.get::<Namespace>().is_none());

        map.put(Namespace("csv"));
        map.put(42_u32);
        assert_eq!(map.get::<Namespace>(), Some(&Namespace("csv")));
        assert_eq!(map.get::<u32>(), Some(&42));

        map.put(Namespace("tsv"));
        assert_eq!(map.len(), 2);
        if let Some(ns) = map.get_mut::<Namespace>() {
            ns.0 = "json";
        }
        assert_eq!(map.get::<Namespace>(), Some(&Namespace("json")));
    }
}
