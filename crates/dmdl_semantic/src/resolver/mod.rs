//! Per-model symbol resolution.
//!
//! A [`ModelResolver`] reads the world immutably and builds the model's
//! members, traits and diagnostics on the side. The analyzer commits the
//! outcome once the resolver is done, so a model's own members are always
//! looked up locally and every other model through the world.

mod record;
mod reduce;
mod reference;

use crate::declaration::{MemberDeclaration, Members, ModelDeclaration};
use crate::driver::TypeResolver;
use crate::options::AnalyzerOptions;
use crate::symbol::{ModelSymbol, PropertySymbol};
use crate::traits::Traits;
use crate::types::Type;
use crate::world::DmdlSemantics;
use dmdl_core::{codes, DiagnosticBag, Span};
use dmdl_syntax::ModelExpression;
use tracing::debug;

/// Shared, read-only inputs of symbol resolution.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub world: &'a DmdlSemantics,
    pub types: &'a TypeResolver,
    pub options: &'a AnalyzerOptions,
}

/// Outcome of resolving one model.
pub(crate) struct Resolution {
    pub members: Members,
    pub traits: Traits,
    pub diagnostics: DiagnosticBag,
}

pub(crate) struct ModelResolver<'a> {
    ctx: Context<'a>,
    model: &'a ModelDeclaration,
    symbol: ModelSymbol,
    members: Members,
    traits: Traits,
    diagnostics: DiagnosticBag,
}

impl<'a> ModelResolver<'a> {
    pub fn new(ctx: Context<'a>, model: &'a ModelDeclaration) -> Self {
        Self {
            ctx,
            model,
            symbol: model.symbol(),
            members: Members::new(),
            traits: Traits::default(),
            diagnostics: DiagnosticBag::new(),
        }
    }

    pub fn resolve(mut self) -> Resolution {
        let model = self.model;
        debug!(model = %self.symbol, kind = %model.kind(), "resolving model definition");
        match &model.definition().expression {
            ModelExpression::Record(union) | ModelExpression::Projective(union) => {
                self.resolve_record(union);
            }
            ModelExpression::Joined(union) => self.resolve_joined(union),
            ModelExpression::Summarized(union) => self.resolve_summarized(union),
        }
        Resolution {
            members: self.members,
            traits: self.traits,
            diagnostics: self.diagnostics,
        }
    }

    fn world(&self) -> &'a DmdlSemantics {
        self.ctx.world
    }

    /// True if this run has an error anywhere, not just in this model.
    fn has_error(&self) -> bool {
        self.ctx.world.has_errors() || self.diagnostics.has_errors()
    }

    fn error(&mut self, code: &str, title: &str, span: Span, message: impl Into<String>) {
        self.diagnostics.error(code, title, span, message);
    }

    /// Declares a member, reporting a name collision instead.
    fn declare(&mut self, member: MemberDeclaration) -> bool {
        match self.members.declare(member) {
            Ok(()) => true,
            Err(rejected) => {
                let name = rejected.name();
                let message = format!("`{}` is already declared in `{}`", name, self.symbol);
                self.error(codes::DUPLICATE_PROPERTY, "duplicate property", name.span, message);
                false
            }
        }
    }

    /// Returns the type of a property of this model or of any resolved model.
    fn property_type(&self, symbol: &PropertySymbol) -> Option<&Type> {
        if symbol.owner() == &self.symbol {
            self.members.property(symbol.name()).map(|p| &p.ty)
        } else {
            self.world().find_property(symbol).map(|p| &p.ty)
        }
    }
}
