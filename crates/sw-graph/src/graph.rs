//! The built dependency graph: cells, cached derived values, observers.

use std::cell::{Cell, RefCell};
use std::fmt;

use sw_core::same_bits;
use tracing::trace;

use crate::batch::BatchGuard;
use crate::builder::ComputeFn;
use crate::value::{CellId, DerivedId, NodeRef, Value};

/// Notification that a cell changed.
///
/// `affected` lists every derived value that transitively reads the cell, in
/// evaluation order. Those values are recomputed lazily on their next read.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotice {
    pub cell: CellId,
    pub affected: Vec<DerivedId>,
}

type Observer = Box<dyn FnMut(&ChangeNotice)>;

pub(crate) struct CellSlot {
    name: String,
    value: f64,
    generation: u64,
}

impl CellSlot {
    pub(crate) fn new(name: String, value: f64) -> Self {
        Self {
            name,
            value,
            generation: 0,
        }
    }
}

struct CachedValue {
    value: Value,
    generation: u64,
    /// Generations of the inputs this value was computed from.
    input_generations: Vec<u64>,
    /// Graph revision at which the inputs were last checked.
    verified_at: u64,
}

pub(crate) struct DerivedSlot {
    name: String,
    inputs: Vec<NodeRef>,
    compute: ComputeFn,
    cache: RefCell<Option<CachedValue>>,
    recomputations: Cell<u64>,
}

impl DerivedSlot {
    pub(crate) fn new(name: String, inputs: Vec<NodeRef>, compute: ComputeFn) -> Self {
        Self {
            name,
            inputs,
            compute,
            cache: RefCell::new(None),
            recomputations: Cell::new(0),
        }
    }
}

#[derive(Default)]
struct BatchState {
    depth: usize,
    /// Cells written during the batch with their value at batch entry.
    touched: Vec<(CellId, f64)>,
}

/// A validated dependency graph.
///
/// Cells are written with [`set`](Self::set); derived values are pulled with
/// [`get`](Self::get) and recomputed only when the generation of some
/// transitive input changed since the cached result was produced.
pub struct DependencyGraph {
    cells: Vec<CellSlot>,
    derived: Vec<DerivedSlot>,
    order: Vec<DerivedId>,
    dependents: Vec<Vec<DerivedId>>,
    /// Bumped on every cell write; lets unchanged reads skip input checks.
    revision: u64,
    observers: Vec<Observer>,
    batch: BatchState,
}

impl DependencyGraph {
    pub(crate) fn new(
        cells: Vec<CellSlot>,
        derived: Vec<DerivedSlot>,
        order: Vec<DerivedId>,
        dependents: Vec<Vec<DerivedId>>,
    ) -> Self {
        Self {
            cells,
            derived,
            order,
            dependents,
            revision: 0,
            observers: Vec::new(),
            batch: BatchState::default(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn derived_count(&self) -> usize {
        self.derived.len()
    }

    pub fn cell_name(&self, cell: CellId) -> &str {
        &self.cells[cell.slot()].name
    }

    pub fn derived_name(&self, id: DerivedId) -> &str {
        &self.derived[id.slot()].name
    }

    /// Topological order of derived values, fixed at build time.
    pub fn evaluation_order(&self) -> &[DerivedId] {
        &self.order
    }

    /// Derived values that transitively read `cell`.
    pub fn affected_by(&self, cell: CellId) -> &[DerivedId] {
        &self.dependents[cell.slot()]
    }

    /// Current value of a cell.
    pub fn value(&self, cell: CellId) -> f64 {
        self.cells[cell.slot()].value
    }

    /// Number of writes a cell has received.
    pub fn cell_generation(&self, cell: CellId) -> u64 {
        self.cells[cell.slot()].generation
    }

    /// Number of times a derived value has been recomputed.
    pub fn recompute_count(&self, id: DerivedId) -> u64 {
        self.derived[id.slot()].recomputations.get()
    }

    /// Store a new cell value and bump its generation.
    ///
    /// Outside a batch, observers are told immediately if the value changed.
    /// Inside a batch, the write is recorded and reported at outermost exit.
    pub fn set(&mut self, cell: CellId, value: f64) {
        let slot = &mut self.cells[cell.slot()];
        let previous = slot.value;
        slot.value = value;
        slot.generation += 1;
        self.revision += 1;

        if self.batch.depth > 0 {
            if !self.batch.touched.iter().any(|(id, _)| *id == cell) {
                self.batch.touched.push((cell, previous));
            }
        } else if !same_bits(previous, value) {
            self.notify(cell);
        }
    }

    /// Read any slot, recomputing stale derived values on the way.
    pub fn get(&self, node: impl Into<NodeRef>) -> Value {
        self.resolve(node.into()).0
    }

    /// Read a slot as a number; `None` for `Undefined` (and for flags).
    pub fn number(&self, node: impl Into<NodeRef>) -> Option<f64> {
        self.get(node).as_number()
    }

    /// Read a slot as a flag; anything other than `Flag(true)` reads false.
    pub fn flag(&self, node: impl Into<NodeRef>) -> bool {
        self.get(node).as_flag().unwrap_or(false)
    }

    /// Register an observer for cell changes.
    pub fn subscribe(&mut self, observer: impl FnMut(&ChangeNotice) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Enter a batch scope. Notifications are coalesced until the returned
    /// guard (and any guards nested inside it) is dropped.
    pub fn batch(&mut self) -> BatchGuard<'_> {
        self.batch.depth += 1;
        BatchGuard::new(self)
    }

    pub fn is_batching(&self) -> bool {
        self.batch.depth > 0
    }

    pub(crate) fn end_batch(&mut self) {
        self.batch.depth = self.batch.depth.saturating_sub(1);
        if self.batch.depth > 0 {
            return;
        }

        let touched = std::mem::take(&mut self.batch.touched);
        for (cell, original) in touched {
            if !same_bits(self.value(cell), original) {
                self.notify(cell);
            }
        }
    }

    fn notify(&mut self, cell: CellId) {
        trace!(cell = self.cell_name(cell), "changed");
        if self.observers.is_empty() {
            return;
        }
        let notice = ChangeNotice {
            cell,
            affected: self.dependents[cell.slot()].clone(),
        };
        for observer in &mut self.observers {
            observer(&notice);
        }
    }

    fn resolve(&self, node: NodeRef) -> (Value, u64) {
        match node {
            NodeRef::Cell(id) => {
                let slot = &self.cells[id.slot()];
                (Value::Number(slot.value), slot.generation)
            }
            NodeRef::Derived(id) => self.resolve_derived(id),
        }
    }

    fn resolve_derived(&self, id: DerivedId) -> (Value, u64) {
        let slot = &self.derived[id.slot()];

        // Nothing was written since the last check
        if let Some(cached) = slot.cache.borrow().as_ref() {
            if cached.verified_at == self.revision {
                return (cached.value, cached.generation);
            }
        }

        let mut values = Vec::with_capacity(slot.inputs.len());
        let mut generations = Vec::with_capacity(slot.inputs.len());
        for &input in &slot.inputs {
            let (value, generation) = self.resolve(input);
            values.push(value);
            generations.push(generation);
        }

        let mut cache = slot.cache.borrow_mut();
        if let Some(cached) = cache.as_mut() {
            if cached.input_generations == generations {
                cached.verified_at = self.revision;
                return (cached.value, cached.generation);
            }
        }

        let value = (slot.compute)(&values);
        let generation = cache.as_ref().map_or(1, |cached| cached.generation + 1);
        slot.recomputations.set(slot.recomputations.get() + 1);
        trace!(derived = self.derived_name(id), generation, "recomputed");

        *cache = Some(CachedValue {
            value,
            generation,
            input_generations: generations,
            verified_at: self.revision,
        });
        (value, generation)
    }
}

impl fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("cells", &self.cells.len())
            .field("derived", &self.derived.len())
            .field("revision", &self.revision)
            .field("observers", &self.observers.len())
            .field("batch_depth", &self.batch.depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphBuilder;
    use std::rc::Rc;

    fn sum(v: &[Value]) -> Value {
        Value::from_option(v.iter().map(Value::as_number).sum())
    }

    #[test]
    fn unchanged_reads_hit_cache() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_cell("a", 1.0).unwrap();
        let b = builder.add_cell("b", 2.0).unwrap();
        let total = builder.add_derived("total", [a, b], sum).unwrap();
        let graph = builder.build().unwrap();

        assert_eq!(graph.number(total), Some(3.0));
        assert_eq!(graph.number(total), Some(3.0));
        assert_eq!(graph.recompute_count(total), 1);
    }

    #[test]
    fn write_invalidates_only_readers() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_cell("a", 1.0).unwrap();
        let b = builder.add_cell("b", 2.0).unwrap();
        let da = builder.add_derived("da", [a], sum).unwrap();
        let db = builder.add_derived("db", [b], sum).unwrap();
        let mut graph = builder.build().unwrap();

        graph.get(da);
        graph.get(db);
        graph.set(a, 5.0);

        assert_eq!(graph.number(da), Some(5.0));
        assert_eq!(graph.number(db), Some(2.0));
        assert_eq!(graph.recompute_count(da), 2);
        assert_eq!(graph.recompute_count(db), 1);
    }

    #[test]
    fn set_bumps_generation_even_for_same_value() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_cell("a", 1.0).unwrap();
        let mut graph = builder.build().unwrap();

        graph.set(a, 1.0);
        graph.set(a, 1.0);
        assert_eq!(graph.cell_generation(a), 2);
        assert_eq!(graph.value(a), 1.0);
    }

    #[test]
    fn observer_sees_affected_values() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_cell("a", 1.0).unwrap();
        let da = builder.add_derived("da", [a], sum).unwrap();
        let mut graph = builder.build().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        graph.subscribe(move |notice| sink.borrow_mut().push(notice.clone()));

        graph.set(a, 2.0);
        graph.set(a, 2.0); // same bits, no notice

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].cell, a);
        assert_eq!(seen[0].affected, vec![da]);
    }

    #[test]
    fn slots_keep_their_builder_names() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_cell("robot1.mass", 1.0).unwrap();
        let da = builder.add_derived("robot1.torque", [a], sum).unwrap();
        let graph = builder.build().unwrap();

        assert_eq!(graph.cell_name(a), "robot1.mass");
        assert_eq!(graph.derived_name(da), "robot1.torque");
    }

    #[test]
    fn debug_is_compact() {
        let mut builder = GraphBuilder::new();
        builder.add_cell("a", 1.0).unwrap();
        let graph = builder.build().unwrap();
        let text = format!("{graph:?}");
        assert!(text.contains("cells: 1"));
    }
}
