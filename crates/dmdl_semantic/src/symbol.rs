//! Name-based handles to declarations.
//!
//! Symbols are lookup keys into [`DmdlSemantics`], never live references, so
//! a model can name another model before that one has been resolved.

use crate::declaration::{ModelDeclaration, PropertyDeclaration, PropertyReferenceDeclaration};
use crate::world::DmdlSemantics;
use std::fmt;

/// Handle to a model declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelSymbol {
    name: String,
}

impl ModelSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a symbol for a property owned by this model.
    pub fn property(&self, name: impl Into<String>) -> PropertySymbol {
        PropertySymbol::new(self.clone(), name)
    }

    /// Looks up the declaration in `world`.
    pub fn find<'w>(&self, world: &'w DmdlSemantics) -> Option<&'w ModelDeclaration> {
        world.find_model(&self.name)
    }
}

impl fmt::Display for ModelSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Handle to a property (or property reference) of a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertySymbol {
    owner: ModelSymbol,
    name: String,
}

impl PropertySymbol {
    pub fn new(owner: ModelSymbol, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }

    pub fn owner(&self) -> &ModelSymbol {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the property declaration in `world`.
    pub fn find<'w>(&self, world: &'w DmdlSemantics) -> Option<&'w PropertyDeclaration> {
        world.find_property(self)
    }

    /// Looks up the property reference declaration in `world`.
    pub fn find_reference<'w>(
        &self,
        world: &'w DmdlSemantics,
    ) -> Option<&'w PropertyReferenceDeclaration> {
        world.find_reference(self)
    }
}

impl fmt::Display for PropertySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}
