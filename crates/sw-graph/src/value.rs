//! Values and handles carried by the dependency graph.

use sw_core::{Id, same_bits};

/// Handle to a mutable numeric cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) Id);

/// Handle to a derived (computed) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivedId(pub(crate) Id);

impl CellId {
    pub(crate) fn slot(self) -> usize {
        self.0.slot()
    }
}

impl DerivedId {
    pub(crate) fn slot(self) -> usize {
        self.0.slot()
    }
}

/// Either kind of graph slot, used to declare the inputs of a derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Cell(CellId),
    Derived(DerivedId),
}

impl From<CellId> for NodeRef {
    fn from(id: CellId) -> Self {
        Self::Cell(id)
    }
}

impl From<DerivedId> for NodeRef {
    fn from(id: DerivedId) -> Self {
        Self::Derived(id)
    }
}

/// Scalar value flowing through the graph.
///
/// `Undefined` is the explicit sentinel for degenerate results (a bound off
/// the handle, a division by zero mass). It is data, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    Number(f64),
    Flag(bool),
    #[default]
    Undefined,
}

impl Value {
    /// `Some(v)` becomes `Number(v)`, `None` becomes `Undefined`.
    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(Self::Undefined, Self::Number)
    }

    /// The numeric payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The flag payload, if this is a flag.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Bit-level comparison; unlike `==`, `NaN` equals itself and `-0.0`
    /// differs from `0.0`.
    pub fn same_bits(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => same_bits(*a, *b),
            (Self::Flag(a), Self::Flag(b)) => a == b,
            (Self::Undefined, Self::Undefined) => true,
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        Self::from_option(v)
    }
}
