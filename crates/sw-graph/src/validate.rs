//! Build-time validation of derived-value wiring.

use std::collections::VecDeque;

use crate::builder::DerivedDef;
use crate::error::{GraphError, GraphResult};
use crate::value::{DerivedId, NodeRef};

/// Compute a topological evaluation order for the derived values.
///
/// Every derived value comes after all derived values it reads. Rejects
/// undefined slots, self-dependency and longer cycles.
pub(crate) fn evaluation_order(derived: &[DerivedDef]) -> GraphResult<Vec<DerivedId>> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); derived.len()];
    let mut in_degree = vec![0_usize; derived.len()];

    for (index, def) in derived.iter().enumerate() {
        let Some((inputs, _)) = &def.body else {
            return Err(GraphError::UndefinedSlot {
                name: def.name.clone(),
            });
        };
        for input in inputs {
            if let NodeRef::Derived(upstream) = *input {
                if upstream.slot() == index {
                    return Err(GraphError::SelfDependency {
                        name: def.name.clone(),
                    });
                }
                adj[upstream.slot()].push(index);
                in_degree[index] += 1;
            }
        }
    }

    // Kahn's algorithm, FIFO over ascending indices for a deterministic order
    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(index, _)| index)
        .collect();

    let mut order = Vec::with_capacity(derived.len());
    while let Some(index) = queue.pop_front() {
        order.push(derived[index].id);
        for &next in &adj[index] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != derived.len() {
        let names = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg > 0)
            .map(|(index, _)| derived[index].name.clone())
            .collect();
        return Err(GraphError::Cycle { names });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ComputeFn;
    use crate::value::Value;

    use sw_core::Id;

    fn handle(slot: usize) -> DerivedId {
        DerivedId(Id::from_slot(slot).unwrap())
    }

    fn def(slot: usize, name: &str, inputs: &[usize]) -> DerivedDef {
        let inputs = inputs.iter().map(|&i| NodeRef::Derived(handle(i))).collect();
        let compute: ComputeFn = Box::new(|_| Value::Undefined);
        DerivedDef {
            id: handle(slot),
            name: name.into(),
            body: Some((inputs, compute)),
        }
    }

    #[test]
    fn chain_is_ordered() {
        // d2 <- d1 <- d0, declared out of order
        let defs = vec![def(0, "d0", &[1]), def(1, "d1", &[2]), def(2, "d2", &[])];
        let order = evaluation_order(&defs).unwrap();
        let slots: Vec<usize> = order.iter().map(|id| id.slot()).collect();
        assert_eq!(slots, vec![2, 1, 0]);
    }

    #[test]
    fn self_dependency_detected() {
        let defs = vec![def(0, "loop", &[0])];
        assert_eq!(
            evaluation_order(&defs).unwrap_err(),
            GraphError::SelfDependency {
                name: "loop".into()
            }
        );
    }

    #[test]
    fn cycle_detected() {
        let defs = vec![
            def(0, "a", &[2]),
            def(1, "b", &[0]),
            def(2, "c", &[1]),
            def(3, "free", &[]),
        ];
        match evaluation_order(&defs).unwrap_err() {
            GraphError::Cycle { names } => {
                assert_eq!(names, vec!["a".to_string(), "b".into(), "c".into()]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn undefined_slot_detected() {
        let defs = vec![DerivedDef {
            id: handle(0),
            name: "pending".into(),
            body: None,
        }];
        assert!(matches!(
            evaluation_order(&defs),
            Err(GraphError::UndefinedSlot { .. })
        ));
    }
}
