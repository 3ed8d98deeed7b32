//! Integration tests for sw-graph.

use sw_graph::{GraphBuilder, GraphError, NodeRef, Value};

fn sum(v: &[Value]) -> Value {
    Value::from_option(v.iter().map(Value::as_number).sum())
}

fn product(v: &[Value]) -> Value {
    Value::from_option(v.iter().map(Value::as_number).product())
}

#[test]
fn diamond_recomputes_each_node_once_per_write() {
    //      a
    //     / \
    //  left  right
    //     \ /
    //     top
    let mut builder = GraphBuilder::new();
    let a = builder.add_cell("a", 1.0).unwrap();
    let k = builder.add_cell("k", 3.0).unwrap();
    let left = builder.add_derived("left", [a], sum).unwrap();
    let right = builder.add_derived("right", [a, k], product).unwrap();
    let top = builder
        .add_derived("top", [left, right], sum)
        .unwrap();
    let mut graph = builder.build().unwrap();

    assert_eq!(graph.number(top), Some(4.0));
    graph.set(a, 2.0);
    assert_eq!(graph.number(top), Some(8.0));
    assert_eq!(graph.number(top), Some(8.0));

    assert_eq!(graph.recompute_count(left), 2);
    assert_eq!(graph.recompute_count(right), 2);
    assert_eq!(graph.recompute_count(top), 2);

    // Writing an unrelated input leaves `left` cached
    graph.set(k, 4.0);
    assert_eq!(graph.number(top), Some(10.0));
    assert_eq!(graph.recompute_count(left), 2);
    assert_eq!(graph.recompute_count(right), 3);
}

#[test]
fn forward_reservation_wires_late_definitions() {
    let mut builder = GraphBuilder::new();
    let x = builder.add_cell("x", 2.0).unwrap();
    let scaled = builder.reserve("scaled").unwrap();
    let offset = builder
        .add_derived("offset", [scaled], |v| {
            Value::from_option(v[0].as_number().map(|s| s + 1.0))
        })
        .unwrap();
    builder
        .define(scaled, [x], |v| {
            Value::from_option(v[0].as_number().map(|x| 10.0 * x))
        })
        .unwrap();
    let graph = builder.build().unwrap();

    assert_eq!(graph.number(offset), Some(21.0));
    let order = graph.evaluation_order();
    let pos_scaled = order.iter().position(|id| *id == scaled).unwrap();
    let pos_offset = order.iter().position(|id| *id == offset).unwrap();
    assert!(pos_scaled < pos_offset);
}

#[test]
fn self_dependency_rejected_at_build() {
    let mut builder = GraphBuilder::new();
    let x = builder.add_cell("x", 0.0).unwrap();
    let d = builder.reserve("d").unwrap();
    builder
        .define(d, [NodeRef::from(x), NodeRef::from(d)], sum)
        .unwrap();
    assert_eq!(
        builder.build().unwrap_err(),
        GraphError::SelfDependency { name: "d".into() }
    );
}

#[test]
fn transitive_cycle_rejected_at_build() {
    let mut builder = GraphBuilder::new();
    let p = builder.reserve("p").unwrap();
    let q = builder.add_derived("q", [p], sum).unwrap();
    builder.define(p, [q], sum).unwrap();
    assert!(matches!(
        builder.build(),
        Err(GraphError::Cycle { names }) if names == vec!["p".to_string(), "q".to_string()]
    ));
}

#[test]
fn undefined_reservation_rejected_at_build() {
    let mut builder = GraphBuilder::new();
    builder.reserve("dangling").unwrap();
    assert_eq!(
        builder.build().unwrap_err(),
        GraphError::UndefinedSlot {
            name: "dangling".into()
        }
    );
}

#[test]
fn undefined_values_propagate_as_data() {
    let mut builder = GraphBuilder::new();
    let m = builder.add_cell("m", 0.0).unwrap();
    let inverse = builder
        .add_derived("inverse", [m], |v| {
            Value::from_option(v[0].as_number().filter(|m| *m != 0.0).map(|m| 1.0 / m))
        })
        .unwrap();
    let doubled = builder
        .add_derived("doubled", [inverse], |v| {
            Value::from_option(v[0].as_number().map(|x| 2.0 * x))
        })
        .unwrap();
    let mut graph = builder.build().unwrap();

    assert!(graph.get(doubled).is_undefined());
    graph.set(m, 4.0);
    assert_eq!(graph.number(doubled), Some(0.5));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cached_value_matches_direct_evaluation(
            writes in prop::collection::vec((0_usize..3, -1e3_f64..1e3), 1..30),
        ) {
            let mut builder = GraphBuilder::new();
            let cells = [
                builder.add_cell("c0", 0.0).unwrap(),
                builder.add_cell("c1", 0.0).unwrap(),
                builder.add_cell("c2", 0.0).unwrap(),
            ];
            let partial = builder.add_derived("partial", [cells[0], cells[1]], sum).unwrap();
            let total = builder
                .add_derived("total", [NodeRef::from(partial), NodeRef::from(cells[2])], sum)
                .unwrap();
            let mut graph = builder.build().unwrap();

            let mut shadow = [0.0_f64; 3];
            for (index, value) in writes {
                graph.set(cells[index], value);
                shadow[index] = value;
                let expected = (shadow[0] + shadow[1]) + shadow[2];
                prop_assert_eq!(graph.number(total), Some(expected));
            }
        }
    }
}
