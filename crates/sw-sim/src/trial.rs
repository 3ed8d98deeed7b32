//! Temporary repositioning of one mass for tolerance searches.

use sw_graph::{BatchGuard, CellId, DependencyGraph, DerivedId};

/// Moves one position cell around inside a batch scope.
///
/// The cell's value at construction is written back when the trial drops,
/// whichever way the search ends, before the batch scope closes. Observers
/// therefore see nothing.
pub(crate) struct PositionTrial<'g> {
    graph: BatchGuard<'g>,
    cell: CellId,
    is_level: DerivedId,
    original: f64,
}

impl<'g> PositionTrial<'g> {
    pub(crate) fn new(graph: &'g mut DependencyGraph, cell: CellId, is_level: DerivedId) -> Self {
        let original = graph.value(cell);
        Self {
            graph: graph.batch(),
            cell,
            is_level,
            original,
        }
    }

    pub(crate) fn original(&self) -> f64 {
        self.original
    }

    /// Place the mass at `x` and report whether the switch is level.
    pub(crate) fn level_at(&mut self, x: f64) -> bool {
        self.graph.set(self.cell, x);
        self.graph.flag(self.is_level)
    }
}

impl Drop for PositionTrial<'_> {
    fn drop(&mut self) {
        self.graph.set(self.cell, self.original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use sw_graph::{GraphBuilder, Value};

    #[test]
    fn restores_and_stays_silent() {
        let mut builder = GraphBuilder::new();
        let x = builder.add_cell("x", 1.5).unwrap();
        let level = builder
            .add_derived("level", [x], |v| {
                Value::Flag(v[0].as_number().is_some_and(|x| x.abs() <= 2.0))
            })
            .unwrap();
        let mut graph = builder.build().unwrap();

        let notices = Rc::new(Cell::new(0));
        let sink = Rc::clone(&notices);
        graph.subscribe(move |_| sink.set(sink.get() + 1));

        {
            let mut trial = PositionTrial::new(&mut graph, x, level);
            assert_eq!(trial.original(), 1.5);
            assert!(!trial.level_at(3.0));
            assert!(trial.level_at(-2.0));
        }

        assert_eq!(graph.value(x).to_bits(), 1.5f64.to_bits());
        assert!(graph.flag(level));
        assert!(!graph.is_batching());
        assert_eq!(notices.get(), 0);
    }
}
