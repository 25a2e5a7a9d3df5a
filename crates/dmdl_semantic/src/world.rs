//! The semantic world: every declared model plus collected diagnostics.

use crate::declaration::{
    MemberDeclaration, ModelDeclaration, PropertyDeclaration, PropertyReferenceDeclaration,
};
use crate::symbol::PropertySymbol;
use dmdl_core::{Diagnostic, DiagnosticBag};
use dmdl_syntax::ModelDefinition;
use rustc_hash::FxHashMap;

/// Root of the analyzed DMDL semantics.
///
/// Models are kept in declaration order and looked up by name. Models are
/// never removed once declared. Not safe to mutate from several callers at once.
#[derive(Debug, Default)]
pub struct DmdlSemantics {
    models: Vec<ModelDeclaration>,
    index: FxHashMap<String, usize>,
    diagnostics: DiagnosticBag,
}

impl DmdlSemantics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a model. Returns `None` if the name is already declared, in
    /// which case the existing declaration is left untouched.
    pub fn declare_model(&mut self, definition: ModelDefinition) -> Option<&ModelDeclaration> {
        let name = definition.name.value.clone();
        if self.index.contains_key(&name) {
            return None;
        }
        let id = self.models.len();
        self.models.push(ModelDeclaration::new(definition));
        self.index.insert(name, id);
        self.models.get(id)
    }

    pub fn find_model(&self, name: &str) -> Option<&ModelDeclaration> {
        self.index.get(name).and_then(|&id| self.models.get(id))
    }

    pub fn find_model_mut(&mut self, name: &str) -> Option<&mut ModelDeclaration> {
        match self.index.get(name) {
            Some(&id) => self.models.get_mut(id),
            None => None,
        }
    }

    pub fn find_member(&self, symbol: &PropertySymbol) -> Option<&MemberDeclaration> {
        self.find_model(symbol.owner().name())
            .and_then(|model| model.members().get(symbol.name()))
    }

    pub fn find_member_mut(&mut self, symbol: &PropertySymbol) -> Option<&mut MemberDeclaration> {
        self.find_model_mut(symbol.owner().name())
            .and_then(|model| model.members_mut().get_mut(symbol.name()))
    }

    pub fn find_property(&self, symbol: &PropertySymbol) -> Option<&PropertyDeclaration> {
        self.find_member(symbol)
            .and_then(MemberDeclaration::as_property)
    }

    pub fn find_reference(&self, symbol: &PropertySymbol) -> Option<&PropertyReferenceDeclaration> {
        self.find_member(symbol)
            .and_then(MemberDeclaration::as_reference)
    }

    /// Returns every declared model in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDeclaration> {
        self.models.iter()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticBag {
        &mut self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}
