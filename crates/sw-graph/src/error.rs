//! Graph construction errors.
//!
//! All of these are programming errors in how a graph is wired. They are
//! raised while building, never while reading or writing a built graph.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A slot was reserved with `reserve` but never given inputs and a body.
    #[error("Derived value '{name}' was reserved but never defined")]
    UndefinedSlot { name: String },

    /// `define` was called twice for the same slot.
    #[error("Derived value '{name}' is already defined")]
    AlreadyDefined { name: String },

    /// A derived value lists itself as an input.
    #[error("Derived value '{name}' depends on itself")]
    SelfDependency { name: String },

    /// A derived value depends on itself through other derived values.
    #[error("Dependency cycle among: {}", names.join(", "))]
    Cycle { names: Vec<String> },

    /// A handle refers to a slot this builder never issued.
    #[error("{what} {index} does not exist")]
    UnknownNode { what: &'static str, index: usize },

    /// The builder ran out of 32-bit slot handles.
    #[error("Too many {what} for 32-bit handles")]
    TooManySlots { what: &'static str },
}
