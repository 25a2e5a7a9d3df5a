//! Resolved property types and aggregate mappings.

use dmdl_syntax::CollectionKind;
use std::fmt;

/// A basic (scalar) property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicTypeKind {
    Int,
    Long,
    Byte,
    Short,
    Decimal,
    Float,
    Double,
    Text,
    Boolean,
    Date,
    DateTime,
}

impl BasicTypeKind {
    /// All basic type kinds, in keyword order.
    pub const ALL: [BasicTypeKind; 11] = [
        Self::Int,
        Self::Long,
        Self::Byte,
        Self::Short,
        Self::Decimal,
        Self::Float,
        Self::Double,
        Self::Text,
        Self::Boolean,
        Self::Date,
        Self::DateTime,
    ];

    /// Returns the DMDL keyword of this type.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Int => "INT",
            Self::Long => "LONG",
            Self::Byte => "BYTE",
            Self::Short => "SHORT",
            Self::Decimal => "DECIMAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
        }
    }

    /// Looks up a basic type by keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(keyword))
    }

    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    pub const fn is_numeric(self) -> bool {
        self.is_integral() || matches!(self, Self::Decimal | Self::Float | Self::Double)
    }
}

impl fmt::Display for BasicTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How a source property is folded into a target property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MappingKind {
    /// Copies any one value (also used for plain join mappings).
    Any,
    Sum,
    Max,
    Min,
    Count,
}

impl MappingKind {
    /// Parses an aggregator keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "ANY" => Some(Self::Any),
            "SUM" => Some(Self::Sum),
            "MAX" => Some(Self::Max),
            "MIN" => Some(Self::Min),
            "COUNT" => Some(Self::Count),
            _ => None,
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Min => "min",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A resolved property type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Basic(BasicTypeKind),
    Collection {
        kind: CollectionKind,
        element: Box<Type>,
    },
}

impl Type {
    pub fn basic(kind: BasicTypeKind) -> Self {
        Self::Basic(kind)
    }

    pub fn collection(kind: CollectionKind, element: Type) -> Self {
        Self::Collection {
            kind,
            element: Box::new(element),
        }
    }

    /// Returns true if both types denote the same type.
    pub fn is_same(&self, other: &Type) -> bool {
        self == other
    }

    pub fn as_basic(&self) -> Option<BasicTypeKind> {
        match self {
            Self::Basic(kind) => Some(*kind),
            Self::Collection { .. } => None,
        }
    }

    /// Returns the type of a property folded with `mapping`, or `None` if the
    /// aggregate cannot be applied to this type.
    pub fn map(&self, mapping: MappingKind) -> Option<Type> {
        if mapping == MappingKind::Any {
            return Some(self.clone());
        }
        let kind = self.as_basic()?;
        let mapped = match mapping {
            MappingKind::Any => kind,
            MappingKind::Count => BasicTypeKind::Long,
            MappingKind::Sum => match kind {
                k if k.is_integral() => BasicTypeKind::Long,
                BasicTypeKind::Float | BasicTypeKind::Double => BasicTypeKind::Double,
                BasicTypeKind::Decimal => BasicTypeKind::Decimal,
                _ => return None,
            },
            MappingKind::Max | MappingKind::Min => match kind {
                BasicTypeKind::Boolean => return None,
                other => other,
            },
        };
        Some(Type::Basic(mapped))
    }
}

impl From<BasicTypeKind> for Type {
    fn from(kind: BasicTypeKind) -> Self {
        Self::Basic(kind)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(kind) => write!(f, "{kind}"),
            Self::Collection {
                kind: CollectionKind::List,
                element,
            } => write!(f, "{{{element}}}"),
            Self::Collection {
                kind: CollectionKind::Map,
                element,
            } => write!(f, "{{:{element}}}"),
        }
    }
}
