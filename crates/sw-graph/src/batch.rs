//! Scoped suppression of change notifications.

use std::ops::{Deref, DerefMut};

use crate::graph::DependencyGraph;

/// Exclusive access to a graph inside a batch scope.
///
/// Reads and writes go through the guard as through the graph itself. While
/// any guard is alive, writes are recorded instead of announced. When the
/// outermost guard drops, each cell whose value differs from the value it had
/// at scope entry is announced once; cells written and then restored are not
/// announced at all.
pub struct BatchGuard<'g> {
    graph: &'g mut DependencyGraph,
}

impl<'g> BatchGuard<'g> {
    pub(crate) fn new(graph: &'g mut DependencyGraph) -> Self {
        Self { graph }
    }
}

impl Deref for BatchGuard<'_> {
    type Target = DependencyGraph;

    fn deref(&self) -> &Self::Target {
        self.graph
    }
}

impl DerefMut for BatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.graph
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.graph.end_batch();
    }
}
