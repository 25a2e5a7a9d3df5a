//! Pluggable type and attribute drivers.

use crate::symbol::{ModelSymbol, PropertySymbol};
use crate::types::{BasicTypeKind, Type};
use crate::world::DmdlSemantics;
use dmdl_syntax::{Attribute, SyntaxType};
use rustc_hash::FxHashMap;
use std::fmt::{self, Debug};

// =============================================================================
// Type drivers
// =============================================================================

/// Resolves syntactic types into semantic types.
pub trait TypeDriver: Send + Sync {
    /// Returns the resolved type, or `None` if this driver does not know it.
    ///
    /// `chain` resolves nested types through every registered driver.
    fn resolve(&self, chain: &TypeResolver, syntax: &SyntaxType) -> Option<Type>;
}

/// A boxed type driver.
pub type BoxedTypeDriver = Box<dyn TypeDriver>;

/// Ordered chain of type drivers; the first one that resolves a type wins.
#[derive(Default)]
pub struct TypeResolver {
    drivers: Vec<BoxedTypeDriver>,
}

impl TypeResolver {
    pub fn new(drivers: Vec<BoxedTypeDriver>) -> Self {
        Self { drivers }
    }

    /// Creates a chain with the basic and collection drivers installed.
    pub fn with_defaults() -> Self {
        Self::new(vec![Box::new(BasicTypeDriver), Box::new(CollectionTypeDriver)])
    }

    pub fn register<D: TypeDriver + 'static>(&mut self, driver: D) {
        self.drivers.push(Box::new(driver));
    }

    /// Resolves `syntax`; the caller reports absence.
    pub fn resolve(&self, syntax: &SyntaxType) -> Option<Type> {
        self.drivers
            .iter()
            .find_map(|driver| driver.resolve(self, syntax))
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Debug for TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeResolver")
            .field("driver_count", &self.drivers.len())
            .finish()
    }
}

/// Resolves basic type keywords such as `INT` or `text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTypeDriver;

impl TypeDriver for BasicTypeDriver {
    fn resolve(&self, _chain: &TypeResolver, syntax: &SyntaxType) -> Option<Type> {
        match syntax {
            SyntaxType::Named(name) => BasicTypeKind::from_keyword(name.as_str()).map(Type::Basic),
            SyntaxType::Collection { .. } => None,
        }
    }
}

/// Resolves `{T}` and `{:T}`, resolving `T` through the chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionTypeDriver;

impl TypeDriver for CollectionTypeDriver {
    fn resolve(&self, chain: &TypeResolver, syntax: &SyntaxType) -> Option<Type> {
        match syntax {
            SyntaxType::Collection { kind, element, .. } => {
                chain.resolve(element).map(|t| Type::collection(*kind, t))
            }
            SyntaxType::Named(_) => None,
        }
    }
}

// =============================================================================
// Attribute drivers
// =============================================================================

/// The declaration an attribute is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclarationSymbol {
    Model(ModelSymbol),
    /// A property or a property reference.
    Member(PropertySymbol),
}

impl DeclarationSymbol {
    /// Returns the model that owns this declaration.
    pub fn model(&self) -> &ModelSymbol {
        match self {
            Self::Model(model) => model,
            Self::Member(member) => member.owner(),
        }
    }
}

impl fmt::Display for DeclarationSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(model) => write!(f, "{model}"),
            Self::Member(member) => write!(f, "{member}"),
        }
    }
}

/// Handles one attribute name.
///
/// Several drivers may target the same name; they then run in registration
/// order and must not depend on each other's effects.
pub trait AttributeDriver: Send + Sync {
    /// Attribute name this driver handles, e.g. `directio.csv`.
    fn target_name(&self) -> &str;

    /// Interprets the attribute, typically attaching a trait to the declaration.
    fn process(
        &self,
        world: &mut DmdlSemantics,
        declaration: &DeclarationSymbol,
        attribute: &Attribute,
    );

    /// Validates the attribute once every declaration has been processed.
    fn verify(
        &self,
        _world: &mut DmdlSemantics,
        _declaration: &DeclarationSymbol,
        _attribute: &Attribute,
    ) {
    }
}

/// A boxed attribute driver.
pub type BoxedAttributeDriver = Box<dyn AttributeDriver>;

/// Drivers registered for one attribute name.
pub enum DriverEntry {
    Single(BoxedAttributeDriver),
    Composite(Vec<BoxedAttributeDriver>),
}

impl DriverEntry {
    fn push(self, driver: BoxedAttributeDriver) -> Self {
        match self {
            Self::Single(first) => Self::Composite(vec![first, driver]),
            Self::Composite(mut drivers) => {
                drivers.push(driver);
                Self::Composite(drivers)
            }
        }
    }

    pub fn process(
        &self,
        world: &mut DmdlSemantics,
        declaration: &DeclarationSymbol,
        attribute: &Attribute,
    ) {
        match self {
            Self::Single(driver) => driver.process(world, declaration, attribute),
            Self::Composite(drivers) => {
                for driver in drivers {
                    driver.process(world, declaration, attribute);
                }
            }
        }
    }

    pub fn verify(
        &self,
        world: &mut DmdlSemantics,
        declaration: &DeclarationSymbol,
        attribute: &Attribute,
    ) {
        match self {
            Self::Single(driver) => driver.verify(world, declaration, attribute),
            Self::Composite(drivers) => {
                for driver in drivers {
                    driver.verify(world, declaration, attribute);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Composite(drivers) => drivers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for DriverEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(driver) => f.debug_tuple("Single").field(&driver.target_name()).finish(),
            Self::Composite(drivers) => f.debug_tuple("Composite").field(&drivers.len()).finish(),
        }
    }
}

/// Attribute drivers indexed by target name.
#[derive(Default, Debug)]
pub struct AttributeDriverRegistry {
    drivers: FxHashMap<String, DriverEntry>,
}

impl AttributeDriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<D: AttributeDriver + 'static>(&mut self, driver: D) {
        self.register_boxed(Box::new(driver));
    }

    pub fn register_boxed(&mut self, driver: BoxedAttributeDriver) {
        let name = driver.target_name().to_string();
        let entry = match self.drivers.remove(&name) {
            Some(entry) => entry.push(driver),
            None => DriverEntry::Single(driver),
        };
        self.drivers.insert(name, entry);
    }

    pub fn get(&self, name: &str) -> Option<&DriverEntry> {
        self.drivers.get(name)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl FromIterator<BoxedAttributeDriver> for AttributeDriverRegistry {
    fn from_iter<I: IntoIterator<Item = BoxedAttributeDriver>>(iter: I) -> Self {
        let mut registry = Self::new();
        for driver in iter {
            registry.register_boxed(driver);
        }
        registry
    }
}
