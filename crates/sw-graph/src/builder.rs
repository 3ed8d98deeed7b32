//! Incremental dependency-graph builder.

use std::collections::BTreeSet;

use sw_core::Id;

use crate::error::{GraphError, GraphResult};
use crate::graph::{CellSlot, DependencyGraph, DerivedSlot};
use crate::validate;
use crate::value::{CellId, DerivedId, NodeRef, Value};

/// Pure recomputation function of a derived value.
///
/// Receives the current values of the declared inputs, in declaration order.
pub type ComputeFn = Box<dyn Fn(&[Value]) -> Value>;

pub(crate) struct CellDef {
    pub(crate) name: String,
    pub(crate) value: f64,
}

pub(crate) struct DerivedDef {
    pub(crate) id: DerivedId,
    pub(crate) name: String,
    pub(crate) body: Option<(Vec<NodeRef>, ComputeFn)>,
}

/// Builder for constructing a dependency graph incrementally.
///
/// Cells and derived values are added in any order. A derived value may be
/// `reserve`d first (so other slots can name it as an input) and `define`d
/// later. `build()` validates the wiring and freezes it into a
/// `DependencyGraph`.
#[derive(Default)]
pub struct GraphBuilder {
    cells: Vec<CellDef>,
    derived: Vec<DerivedDef>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mutable numeric cell with its initial value.
    pub fn add_cell(&mut self, name: impl Into<String>, value: f64) -> GraphResult<CellId> {
        let id = CellId(next_id(self.cells.len(), "cells")?);
        self.cells.push(CellDef {
            name: name.into(),
            value,
        });
        Ok(id)
    }

    /// Reserve a derived slot without defining it yet.
    pub fn reserve(&mut self, name: impl Into<String>) -> GraphResult<DerivedId> {
        let id = DerivedId(next_id(self.derived.len(), "derived values")?);
        self.derived.push(DerivedDef {
            id,
            name: name.into(),
            body: None,
        });
        Ok(id)
    }

    /// Give a reserved slot its inputs and recomputation function.
    pub fn define<I, F>(&mut self, id: DerivedId, inputs: I, compute: F) -> GraphResult<()>
    where
        I: IntoIterator,
        I::Item: Into<NodeRef>,
        F: Fn(&[Value]) -> Value + 'static,
    {
        let inputs: Vec<NodeRef> = inputs.into_iter().map(Into::into).collect();
        for input in &inputs {
            self.check_exists(*input)?;
        }

        let def = self
            .derived
            .get_mut(id.slot())
            .ok_or(GraphError::UnknownNode {
                what: "Derived value",
                index: id.slot(),
            })?;
        if def.body.is_some() {
            return Err(GraphError::AlreadyDefined {
                name: def.name.clone(),
            });
        }
        def.body = Some((inputs, Box::new(compute)));
        Ok(())
    }

    /// Reserve and define in one step.
    pub fn add_derived<I, F>(
        &mut self,
        name: impl Into<String>,
        inputs: I,
        compute: F,
    ) -> GraphResult<DerivedId>
    where
        I: IntoIterator,
        I::Item: Into<NodeRef>,
        F: Fn(&[Value]) -> Value + 'static,
    {
        let id = self.reserve(name)?;
        self.define(id, inputs, compute)?;
        Ok(id)
    }

    /// Validate and freeze the graph.
    ///
    /// Fails if any reserved slot is still undefined or if any derived value
    /// depends on itself, directly or transitively.
    pub fn build(self) -> GraphResult<DependencyGraph> {
        let order = validate::evaluation_order(&self.derived)?;
        let dependents = Self::build_dependents(&self.cells, &self.derived, &order);

        let cells = self
            .cells
            .into_iter()
            .map(|def| CellSlot::new(def.name, def.value))
            .collect();

        let mut derived = Vec::with_capacity(self.derived.len());
        for def in self.derived {
            // evaluation_order has already rejected undefined slots
            let Some((inputs, compute)) = def.body else {
                return Err(GraphError::UndefinedSlot { name: def.name });
            };
            derived.push(DerivedSlot::new(def.name, inputs, compute));
        }

        Ok(DependencyGraph::new(cells, derived, order, dependents))
    }

    fn check_exists(&self, node: NodeRef) -> GraphResult<()> {
        match node {
            NodeRef::Cell(id) if id.slot() >= self.cells.len() => Err(GraphError::UnknownNode {
                what: "Cell",
                index: id.slot(),
            }),
            NodeRef::Derived(id) if id.slot() >= self.derived.len() => {
                Err(GraphError::UnknownNode {
                    what: "Derived value",
                    index: id.slot(),
                })
            }
            _ => Ok(()),
        }
    }

    /// For each cell, every derived value that transitively reads it, in
    /// evaluation order.
    fn build_dependents(
        cells: &[CellDef],
        derived: &[DerivedDef],
        order: &[DerivedId],
    ) -> Vec<Vec<DerivedId>> {
        // Cells each derived value reads, directly or through other derived values
        let mut reads: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); derived.len()];
        for &id in order {
            let mut set = BTreeSet::new();
            if let Some((inputs, _)) = &derived[id.slot()].body {
                for input in inputs {
                    match *input {
                        NodeRef::Cell(cell) => {
                            set.insert(cell.slot());
                        }
                        NodeRef::Derived(upstream) => {
                            set.extend(reads[upstream.slot()].iter().copied());
                        }
                    }
                }
            }
            reads[id.slot()] = set;
        }

        let mut dependents = vec![Vec::new(); cells.len()];
        for &id in order {
            for &cell in &reads[id.slot()] {
                dependents[cell].push(id);
            }
        }
        dependents
    }
}

/// Handle for the slot after `len` existing ones.
fn next_id(len: usize, what: &'static str) -> GraphResult<Id> {
    Id::from_slot(len).ok_or(GraphError::TooManySlots { what })
}
