//! sw-graph: lazy dependency graph for switchsim.
//!
//! Provides:
//! - Numeric cells (mutable inputs with generation counters)
//! - Derived values (pure, cached, recomputed on read)
//! - Builder with forward reservation and build-time cycle rejection
//! - Batch scopes that coalesce change notifications
//!
//! # Example
//!
//! ```
//! use sw_graph::{GraphBuilder, Value};
//!
//! let mut builder = GraphBuilder::new();
//! let a = builder.add_cell("a", 2.0).unwrap();
//! let b = builder.add_cell("b", 3.0).unwrap();
//! let sum = builder
//!     .add_derived("sum", [a, b], |v| {
//!         Value::from_option(v[0].as_number().zip(v[1].as_number()).map(|(x, y)| x + y))
//!     })
//!     .unwrap();
//! let mut graph = builder.build().unwrap();
//!
//! assert_eq!(graph.number(sum), Some(5.0));
//! graph.set(a, 10.0);
//! assert_eq!(graph.number(sum), Some(13.0));
//! ```

pub mod batch;
pub mod builder;
pub mod error;
pub mod graph;
pub mod value;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use batch::BatchGuard;
pub use builder::{ComputeFn, GraphBuilder};
pub use error::{GraphError, GraphResult};
pub use graph::{ChangeNotice, DependencyGraph};
pub use value::{CellId, DerivedId, NodeRef, Value};
