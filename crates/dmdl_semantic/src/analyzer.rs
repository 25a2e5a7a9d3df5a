//! The DMDL analyzer.
//!
//! Resolution runs in strictly ordered phases:
//!
//! 1. registration (`add_model`), which also records model dependencies
//! 2. symbol resolution, every model once, dependencies first
//! 3. attribute resolution
//! 4. attribute verification
//!
//! Each phase collects as many diagnostics as it can. If any of them is an
//! error the analysis stops before the next phase starts.

use crate::driver::{AttributeDriverRegistry, DeclarationSymbol, TypeResolver};
use crate::error::{Phase, SemanticError, SemanticResult};
use crate::graph::DependencyGraph;
use crate::options::AnalyzerOptions;
use crate::resolver::{Context, ModelResolver};
use crate::world::DmdlSemantics;
use dmdl_core::{codes, Diagnostic};
use dmdl_syntax::{Attribute, ModelDefinition};
use tracing::debug;

/// Analyzes DMDL model definitions into [`DmdlSemantics`].
///
/// Not safe for parallel calls on one instance.
#[derive(Debug)]
pub struct DmdlAnalyzer {
    world: DmdlSemantics,
    dependencies: DependencyGraph,
    types: TypeResolver,
    attributes: AttributeDriverRegistry,
    options: AnalyzerOptions,
}

impl Default for DmdlAnalyzer {
    fn default() -> Self {
        Self::new(TypeResolver::with_defaults(), AttributeDriverRegistry::new())
    }
}

impl DmdlAnalyzer {
    pub fn new(types: TypeResolver, attributes: AttributeDriverRegistry) -> Self {
        Self {
            world: DmdlSemantics::new(),
            dependencies: DependencyGraph::new(),
            types,
            attributes,
            options: AnalyzerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Registers a model definition.
    ///
    /// A definition whose name is already registered is reported and
    /// dropped; the earlier declaration is kept as is.
    pub fn add_model(&mut self, definition: ModelDefinition) {
        let name = definition.name.clone();
        if let Some(existing) = self.world.find_model(name.as_str()) {
            let diagnostic = Diagnostic::error(codes::DUPLICATE_MODEL, "duplicate model")
                .with_span(name.span, format!("model `{name}` is declared more than once"))
                .with_span(existing.name().span, "first declared here");
            self.world.report(diagnostic);
            return;
        }
        debug!(model = %name, "computing dependencies");
        self.dependencies.add_node(name.as_str());
        for target in definition.referenced_models() {
            self.dependencies.add_edge(name.as_str(), target.as_str());
        }
        self.world.declare_model(definition);
    }

    /// Runs every phase and returns the resolved world.
    ///
    /// Stops at the first phase boundary where an error has been reported.
    pub fn resolve(&mut self) -> SemanticResult<&DmdlSemantics> {
        self.checkpoint(Phase::Registration)?;
        self.resolve_symbols();
        self.checkpoint(Phase::SymbolResolution)?;
        self.resolve_attributes();
        self.checkpoint(Phase::AttributeResolution)?;
        self.verify_attributes();
        self.checkpoint(Phase::AttributeVerification)?;
        Ok(&self.world)
    }

    /// The world as resolved so far, including after a failed run.
    pub fn world(&self) -> &DmdlSemantics {
        &self.world
    }

    pub fn into_world(self) -> DmdlSemantics {
        self.world
    }

    fn checkpoint(&self, phase: Phase) -> SemanticResult<()> {
        let diagnostics = self.world.diagnostics();
        if !diagnostics.has_errors() {
            return Ok(());
        }
        debug!(%phase, errors = diagnostics.error_count(), "analysis stopped");
        Err(SemanticError::Stopped {
            phase,
            error_count: diagnostics.error_count(),
            diagnostics: diagnostics.to_vec(),
        })
    }

    fn resolve_symbols(&mut self) {
        debug!("resolving symbols");
        let circuits = self.dependencies.find_circuits();
        if !circuits.is_empty() {
            for circuit in &circuits {
                let cycle = circuit.join(" -> ");
                for name in circuit {
                    let Some(model) = self.world.find_model(name) else {
                        continue;
                    };
                    let diagnostic =
                        Diagnostic::error(codes::CYCLIC_DEPENDENCY, "cyclic model dependency")
                            .with_span(
                                model.name().span,
                                format!("`{name}` depends on itself through [{cycle}]"),
                            );
                    self.world.report(diagnostic);
                }
            }
            return;
        }

        for name in self.dependencies.sort_post_order() {
            self.resolve_model(&name);
        }
    }

    fn resolve_model(&mut self, name: &str) {
        let resolution = {
            // referenced but never declared; reported by the referrer
            let Some(model) = self.world.find_model(name) else {
                return;
            };
            let ctx = Context {
                world: &self.world,
                types: &self.types,
                options: &self.options,
            };
            ModelResolver::new(ctx, model).resolve()
        };
        let mut diagnostics = resolution.diagnostics;
        self.world.diagnostics_mut().append(&mut diagnostics);
        if let Some(model) = self.world.find_model_mut(name) {
            model.commit(resolution.members, resolution.traits);
        }
    }

    /// Attributes of every model and member, in declaration order.
    fn attribute_targets(&self) -> Vec<(DeclarationSymbol, Vec<Attribute>)> {
        let mut targets = Vec::new();
        for model in self.world.models() {
            let symbol = model.symbol();
            targets.push((
                DeclarationSymbol::Model(symbol.clone()),
                model.attributes().to_vec(),
            ));
            for member in model.members().iter() {
                targets.push((
                    DeclarationSymbol::Member(symbol.property(member.name().as_str())),
                    member.attributes().to_vec(),
                ));
            }
        }
        targets
    }

    fn resolve_attributes(&mut self) {
        for (declaration, attributes) in self.attribute_targets() {
            for attribute in &attributes {
                let name = attribute.name.as_str();
                debug!(%declaration, attribute = name, "resolving attribute");
                let Some(driver) = self.attributes.get(name) else {
                    let diagnostic =
                        Diagnostic::error(codes::UNKNOWN_ATTRIBUTE, "unknown attribute")
                            .with_span(
                                attribute.name.span,
                                format!("no driver handles attribute `@{name}`"),
                            );
                    self.world.report(diagnostic);
                    continue;
                };
                driver.process(&mut self.world, &declaration, attribute);
            }
        }
    }

    fn verify_attributes(&mut self) {
        for (declaration, attributes) in self.attribute_targets() {
            for attribute in &attributes {
                // unknown attributes were reported while resolving
                if let Some(driver) = self.attributes.get(attribute.name.as_str()) {
                    debug!(%declaration, attribute = %attribute.name, "verifying attribute");
                    driver.verify(&mut self.world, &declaration, attribute);
                }
            }
        }
    }
}
