//! Semantic declarations: models, properties, and property references.

use crate::symbol::{ModelSymbol, PropertySymbol};
use crate::traits::{TraitMap, Traits};
use crate::types::Type;
use dmdl_core::Span;
use dmdl_syntax::{Attribute, CollectionKind, Description, ModelDefinition, ModelKind, Name};
use indexmap::IndexMap;
use std::fmt;

// =============================================================================
// Properties
// =============================================================================

/// A resolved property of a model.
#[derive(Debug)]
pub struct PropertyDeclaration {
    pub owner: ModelSymbol,
    pub name: Name,
    pub ty: Type,
    pub description: Option<Description>,
    pub attributes: Vec<Attribute>,
    /// Where the property came from: its own definition, or the term that
    /// contributed it.
    pub span: Span,
    pub traits: TraitMap,
}

impl PropertyDeclaration {
    pub fn new(owner: ModelSymbol, name: Name, ty: Type, span: Span) -> Self {
        Self {
            owner,
            name,
            ty,
            description: None,
            attributes: Vec::new(),
            span,
            traits: TraitMap::default(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<Description>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn symbol(&self) -> PropertySymbol {
        self.owner.property(self.name.as_str())
    }
}

// =============================================================================
// Property references
// =============================================================================

/// Shape of a property reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    List,
    Map,
}

impl ReferenceKind {
    pub fn collection_kind(self) -> CollectionKind {
        match self {
            Self::List => CollectionKind::List,
            Self::Map => CollectionKind::Map,
        }
    }
}

impl From<CollectionKind> for ReferenceKind {
    fn from(kind: CollectionKind) -> Self {
        match kind {
            CollectionKind::List => Self::List,
            CollectionKind::Map => Self::Map,
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
        }
    }
}

/// Members a property reference points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceContainer {
    List(Vec<PropertySymbol>),
    Map(IndexMap<String, PropertySymbol>),
    /// Declared without a member list yet.
    Stub(ReferenceKind),
}

impl ReferenceContainer {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Self::List(_) => ReferenceKind::List,
            Self::Map(_) => ReferenceKind::Map,
            Self::Stub(kind) => *kind,
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub(_))
    }

    /// Returns every referenced property in declaration order.
    pub fn all_references(&self) -> Vec<&PropertySymbol> {
        match self {
            Self::List(symbols) => symbols.iter().collect(),
            Self::Map(entries) => entries.values().collect(),
            Self::Stub(_) => Vec::new(),
        }
    }

    /// Rewrites every referenced symbol through `mapping`.
    ///
    /// Returns the first symbol `mapping` has no destination for.
    pub fn remap<F>(&self, mut mapping: F) -> Result<Self, PropertySymbol>
    where
        F: FnMut(&PropertySymbol) -> Option<PropertySymbol>,
    {
        let mut apply = |symbol: &PropertySymbol| mapping(symbol).ok_or_else(|| symbol.clone());
        match self {
            Self::List(symbols) => symbols
                .iter()
                .map(&mut apply)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Self::Map(entries) => entries
                .iter()
                .map(|(key, symbol)| apply(symbol).map(|s| (key.clone(), s)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Self::Map),
            Self::Stub(kind) => Ok(Self::Stub(*kind)),
        }
    }

    /// Returns true if both containers reference the same property names in
    /// the same shape, regardless of owner. Stubs are never equivalent.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.name() == y.name())
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, x)| b.get(key).is_some_and(|y| x.name() == y.name()))
            }
            _ => false,
        }
    }
}

/// A named, typed view over other properties of the same model.
#[derive(Debug)]
pub struct PropertyReferenceDeclaration {
    pub owner: ModelSymbol,
    pub name: Name,
    /// Type of each referenced element.
    pub element_type: Type,
    pub reference: ReferenceContainer,
    pub description: Option<Description>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
    pub traits: TraitMap,
}

impl PropertyReferenceDeclaration {
    pub fn new(
        owner: ModelSymbol,
        name: Name,
        element_type: Type,
        reference: ReferenceContainer,
        span: Span,
    ) -> Self {
        Self {
            owner,
            name,
            element_type,
            reference,
            description: None,
            attributes: Vec::new(),
            span,
            traits: TraitMap::default(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<Description>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn symbol(&self) -> PropertySymbol {
        self.owner.property(self.name.as_str())
    }

    /// Returns the collection type this reference exposes.
    pub fn ty(&self) -> Type {
        Type::collection(
            self.reference.kind().collection_kind(),
            self.element_type.clone(),
        )
    }
}

// =============================================================================
// Members
// =============================================================================

/// A member of a model.
#[derive(Debug)]
pub enum MemberDeclaration {
    Property(PropertyDeclaration),
    Reference(PropertyReferenceDeclaration),
}

impl MemberDeclaration {
    pub fn name(&self) -> &Name {
        match self {
            Self::Property(p) => &p.name,
            Self::Reference(r) => &r.name,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Self::Property(p) => &p.attributes,
            Self::Reference(r) => &r.attributes,
        }
    }

    pub fn traits(&self) -> &TraitMap {
        match self {
            Self::Property(p) => &p.traits,
            Self::Reference(r) => &r.traits,
        }
    }

    pub fn traits_mut(&mut self) -> &mut TraitMap {
        match self {
            Self::Property(p) => &mut p.traits,
            Self::Reference(r) => &mut r.traits,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyDeclaration> {
        match self {
            Self::Property(p) => Some(p),
            Self::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&PropertyReferenceDeclaration> {
        match self {
            Self::Property(_) => None,
            Self::Reference(r) => Some(r),
        }
    }
}

/// Ordered members of a model, unique by name across properties and
/// property references.
#[derive(Debug, Default)]
pub struct Members {
    entries: IndexMap<String, MemberDeclaration>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&MemberDeclaration> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MemberDeclaration> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.get(name).and_then(MemberDeclaration::as_property)
    }

    pub fn reference(&self, name: &str) -> Option<&PropertyReferenceDeclaration> {
        self.get(name).and_then(MemberDeclaration::as_reference)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberDeclaration> {
        self.entries.values()
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDeclaration> {
        self.iter().filter_map(MemberDeclaration::as_property)
    }

    pub fn references(&self) -> impl Iterator<Item = &PropertyReferenceDeclaration> {
        self.iter().filter_map(MemberDeclaration::as_reference)
    }

    /// Declares a member. Returns it back if the name is already taken.
    pub fn declare(&mut self, member: MemberDeclaration) -> Result<(), MemberDeclaration> {
        let name = member.name().value.clone();
        if self.entries.contains_key(&name) {
            return Err(member);
        }
        self.entries.insert(name, member);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Models
// =============================================================================

/// A declared model.
///
/// Created empty at registration; members and traits are filled in once,
/// by the resolution phase, including whatever was resolved before an error.
#[derive(Debug)]
pub struct ModelDeclaration {
    definition: ModelDefinition,
    members: Members,
    traits: Traits,
}

impl ModelDeclaration {
    pub(crate) fn new(definition: ModelDefinition) -> Self {
        Self {
            definition,
            members: Members::new(),
            traits: Traits::default(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.definition.name
    }

    pub fn kind(&self) -> ModelKind {
        self.definition.kind()
    }

    pub fn description(&self) -> Option<&Description> {
        self.definition.description.as_ref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.definition.attributes
    }

    pub fn span(&self) -> Span {
        self.definition.span
    }

    /// The definition this model was declared from.
    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    pub fn symbol(&self) -> ModelSymbol {
        ModelSymbol::new(self.definition.name.as_str())
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut Members {
        &mut self.members
    }

    pub fn traits(&self) -> &Traits {
        &self.traits
    }

    pub fn traits_mut(&mut self) -> &mut Traits {
        &mut self.traits
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.members.property(name)
    }

    pub fn find_reference(&self, name: &str) -> Option<&PropertyReferenceDeclaration> {
        self.members.reference(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDeclaration> {
        self.members.properties()
    }

    pub fn references(&self) -> impl Iterator<Item = &PropertyReferenceDeclaration> {
        self.members.references()
    }

    /// Installs the outcome of resolving this model.
    pub(crate) fn commit(&mut self, members: Members, traits: Traits) {
        self.members = members;
        let extensions = std::mem::take(&mut self.traits.extensions);
        self.traits = traits;
        self.traits.extensions = extensions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BasicTypeKind;

    fn name(value: &str) -> Name {
        Name::new(value, Span::default())
    }

    fn property(owner: &ModelSymbol, value: &str) -> MemberDeclaration {
        MemberDeclaration::Property(PropertyDeclaration::new(
            owner.clone(),
            name(value),
            BasicTypeKind::Int.into(),
            Span::default(),
        ))
    }

    #[test]
    fn test_members_reject_duplicate_names() {
        let owner = ModelSymbol::new("m");
        let mut members = Members::new();
        assert!(members.declare(property(&owner, "a")).is_ok());
        assert!(members.declare(property(&owner, "b")).is_ok());
        assert!(members.declare(property(&owner, "a")).is_err());

        let names: Vec<_> = members.iter().map(|m| m.name().as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_remap_reports_missing_destination() {
        let parent = ModelSymbol::new("parent");
        let child = ModelSymbol::new("child");
        let container =
            ReferenceContainer::List(vec![parent.property("a"), parent.property("b")]);

        let remapped = container
            .remap(|s| Some(child.property(s.name())))
            .unwrap();
        assert_eq!(
            remapped,
            ReferenceContainer::List(vec![child.property("a"), child.property("b")])
        );

        let missing = container.remap(|s| (s.name() == "a").then(|| child.property("a")));
        assert_eq!(missing, Err(parent.property("b")));
    }

    #[test]
    fn test_equivalence_ignores_owner() {
        let a = ModelSymbol::new("a");
        let b = ModelSymbol::new("b");
        let left = ReferenceContainer::List(vec![a.property("x"), a.property("y")]);
        let right = ReferenceContainer::List(vec![b.property("x"), b.property("y")]);
        let reversed = ReferenceContainer::List(vec![b.property("y"), b.property("x")]);
        assert!(left.is_equivalent(&right));
        assert!(!left.is_equivalent(&reversed));
        assert!(!left.is_equivalent(&ReferenceContainer::Stub(ReferenceKind::List)));

        let map_a: IndexMap<_, _> = [("k".to_string(), a.property("x"))].into_iter().collect();
        let map_b: IndexMap<_, _> = [("k".to_string(), b.property("x"))].into_iter().collect();
        assert!(ReferenceContainer::Map(map_a).is_equivalent(&ReferenceContainer::Map(map_b)));
    }
}
