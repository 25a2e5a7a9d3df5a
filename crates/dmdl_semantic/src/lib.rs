//! Semantic analysis for DMDL.
//!
//! This crate turns parsed model definitions into resolved semantics:
//! - `analyzer`: Phase-ordered driver ([`DmdlAnalyzer`])
//! - `world`: Declared models and diagnostics ([`DmdlSemantics`])
//! - `declaration`, `symbol`, `traits`: The semantic model
//! - `types`: Property types and aggregate mappings
//! - `driver`: Pluggable type and attribute drivers
//! - `graph`: Model dependency ordering and cycle detection
//!
//! ```
//! use dmdl_core::Span;
//! use dmdl_semantic::DmdlAnalyzer;
//! use dmdl_syntax::*;
//!
//! let name = |s: &str| Name::new(s, Span::default());
//! let item = ModelDefinition::new(
//!     name("item"),
//!     ModelExpression::Record(UnionExpression::new(
//!         vec![RecordTerm::Definition(RecordDefinition::new(
//!             vec![PropertyDefinition::normal(
//!                 name("code"),
//!                 SyntaxType::named("LONG", Span::default()),
//!             )],
//!             Span::default(),
//!         ))],
//!         Span::default(),
//!     )),
//! );
//!
//! let mut analyzer = DmdlAnalyzer::default();
//! analyzer.add_model(item);
//! let world = analyzer.resolve().unwrap();
//! assert!(world.find_model("item").unwrap().find_property("code").is_some());
//! ```

pub mod analyzer;
pub mod declaration;
pub mod driver;
pub mod error;
pub mod graph;
pub mod options;
mod resolver;
pub mod symbol;
pub mod traits;
pub mod types;
pub mod world;

pub use analyzer::DmdlAnalyzer;
pub use declaration::{
    MemberDeclaration, Members, ModelDeclaration, PropertyDeclaration,
    PropertyReferenceDeclaration, ReferenceContainer, ReferenceKind,
};
pub use driver::{
    AttributeDriver, AttributeDriverRegistry, BasicTypeDriver, CollectionTypeDriver,
    DeclarationSymbol, DriverEntry, TypeDriver, TypeResolver,
};
pub use error::{Phase, SemanticError, SemanticResult};
pub use options::{AnalyzerOptions, ExcessTermPolicy};
pub use symbol::{ModelSymbol, PropertySymbol};
pub use traits::{
    JoinTrait, MappingFactor, ProjectionsTrait, ReduceTerm, ReferencesTrait, SummarizeTrait,
    TraitMap, Traits,
};
pub use types::{BasicTypeKind, MappingKind, Type};
pub use world::DmdlSemantics;
