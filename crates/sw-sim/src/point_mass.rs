//! Point masses mounted on the switch.

use sw_core::Vec2;
use sw_core::geometry::vec2;
use sw_graph::{CellId, DependencyGraph, DerivedId, GraphBuilder, GraphResult, NodeRef, Value};
use sw_solver::{absolute_position, torque};

/// Pair of mutable cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellVec2 {
    pub x: CellId,
    pub y: CellId,
}

/// Pair of derived values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedVec2 {
    pub x: DerivedId,
    pub y: DerivedId,
}

/// A mass at some position; `P` says whether the position is set or computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointMass<P> {
    pub mass: CellId,
    pub position: P,
}

/// A point mass riding on the switch.
///
/// The mass and switch-relative position are cells. The absolute position
/// and torque are derived from them and from the simulation's equilibrium
/// angle, which the entity reads but does not own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointMassOnSwitch {
    body: PointMass<DerivedVec2>,
    relative: CellVec2,
    angle: DerivedId,
    torque: DerivedId,
}

impl PointMassOnSwitch {
    /// Add the entity's cells and derived values to `builder`.
    ///
    /// `angle` may still be only reserved; it is resolved at build time.
    pub(crate) fn register(
        builder: &mut GraphBuilder,
        name: &str,
        relative: Vec2,
        mass: f64,
        angle: DerivedId,
        pivot_height: f64,
    ) -> GraphResult<Self> {
        let mass_cell = builder.add_cell(format!("{name}.mass"), mass)?;
        let rel = CellVec2 {
            x: builder.add_cell(format!("{name}.relative.x"), relative.x)?,
            y: builder.add_cell(format!("{name}.relative.y"), relative.y)?,
        };

        let position = DerivedVec2 {
            x: builder.add_derived(
                format!("{name}.position.x"),
                [NodeRef::from(rel.x), rel.y.into(), angle.into()],
                move |v| Value::from_option(absolute(v, pivot_height).map(|p| p.x)),
            )?,
            y: builder.add_derived(
                format!("{name}.position.y"),
                [NodeRef::from(rel.x), rel.y.into(), angle.into()],
                move |v| Value::from_option(absolute(v, pivot_height).map(|p| p.y)),
            )?,
        };

        let torque_id = builder.add_derived(
            format!("{name}.torque"),
            [NodeRef::from(mass_cell), position.x.into()],
            |v| {
                let inputs = v[0].as_number().zip(v[1].as_number());
                Value::from_option(inputs.map(|(mass, x)| torque(mass, x)))
            },
        )?;

        Ok(Self {
            body: PointMass {
                mass: mass_cell,
                position,
            },
            relative: rel,
            angle,
            torque: torque_id,
        })
    }

    pub fn mass_cell(&self) -> CellId {
        self.body.mass
    }

    pub fn relative_cells(&self) -> CellVec2 {
        self.relative
    }

    pub fn position_ids(&self) -> DerivedVec2 {
        self.body.position
    }

    pub fn torque_id(&self) -> DerivedId {
        self.torque
    }

    pub fn mass(&self, graph: &DependencyGraph) -> f64 {
        graph.value(self.body.mass)
    }

    pub fn relative_position(&self, graph: &DependencyGraph) -> Vec2 {
        vec2(graph.value(self.relative.x), graph.value(self.relative.y))
    }

    /// Absolute position; NaN components if the angle is undefined.
    pub fn position(&self, graph: &DependencyGraph) -> Vec2 {
        vec2(
            graph.number(self.body.position.x).unwrap_or(f64::NAN),
            graph.number(self.body.position.y).unwrap_or(f64::NAN),
        )
    }

    pub fn torque(&self, graph: &DependencyGraph) -> Option<f64> {
        graph.number(self.torque)
    }

    pub fn angle(&self, graph: &DependencyGraph) -> Option<f64> {
        graph.number(self.angle)
    }
}

fn absolute(values: &[Value], pivot_height: f64) -> Option<Vec2> {
    let x = values[0].as_number()?;
    let y = values[1].as_number()?;
    let angle = values[2].as_number()?;
    Some(absolute_position(vec2(x, y), angle, pivot_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_graph::GraphError;

    fn single(mass: f64, x: f64, y: f64) -> (DependencyGraph, PointMassOnSwitch, CellId) {
        let mut builder = GraphBuilder::new();
        let angle_cell = builder.add_cell("angle.input", 0.0).unwrap();
        let angle = builder.add_derived("angle", [angle_cell], |v| v[0]).unwrap();
        let entity =
            PointMassOnSwitch::register(&mut builder, "robot", vec2(x, y), mass, angle, 100.0)
                .unwrap();
        (builder.build().unwrap(), entity, angle_cell)
    }

    #[test]
    fn level_position_is_offset_by_pivot() {
        let (graph, entity, _) = single(10.0, 3.0, -20.0);
        let p = entity.position(&graph);
        assert!((p.x - 3.0).abs() < 1e-12);
        assert!((p.y - 80.0).abs() < 1e-12);
        assert_eq!(entity.torque(&graph), Some(-30.0));
        assert_eq!(entity.mass(&graph), 10.0);
        assert_eq!(entity.relative_position(&graph), vec2(3.0, -20.0));
    }

    #[test]
    fn follows_the_shared_angle() {
        let (mut graph, entity, angle_cell) = single(2.0, 0.0, -10.0);
        graph.set(angle_cell, std::f64::consts::FRAC_PI_2);

        // (0, -10) rotated a quarter turn counterclockwise is (10, 0)
        let p = entity.position(&graph);
        assert!((p.x - 10.0).abs() < 1e-12);
        assert!((p.y - 100.0).abs() < 1e-12);
        assert!((entity.torque(&graph).unwrap() + 20.0).abs() < 1e-12);
        assert_eq!(entity.angle(&graph), Some(std::f64::consts::FRAC_PI_2));
    }

    #[test]
    fn torque_tracks_mass_writes() {
        let (mut graph, entity, _) = single(1.0, 4.0, 0.0);
        assert_eq!(entity.torque(&graph), Some(-4.0));
        graph.set(entity.mass_cell(), 3.0);
        assert_eq!(entity.torque(&graph), Some(-12.0));
        // position does not read the mass
        assert_eq!(graph.recompute_count(entity.position_ids().x), 1);
    }

    #[test]
    fn undefined_angle_propagates() {
        let mut builder = GraphBuilder::new();
        let angle = builder
            .add_derived("angle", std::iter::empty::<CellId>(), |_| Value::Undefined)
            .unwrap();
        let entity =
            PointMassOnSwitch::register(&mut builder, "robot", vec2(1.0, 1.0), 1.0, angle, 0.0)
                .unwrap();
        let graph = builder.build().unwrap();
        assert!(entity.position(&graph).x.is_nan());
        assert_eq!(entity.torque(&graph), None);
    }

    #[test]
    fn angle_reading_entity_position_is_a_cycle() {
        let mut builder = GraphBuilder::new();
        let angle = builder.reserve("angle").unwrap();
        let entity =
            PointMassOnSwitch::register(&mut builder, "robot", vec2(0.0, -1.0), 1.0, angle, 0.0)
                .unwrap();
        builder
            .define(angle, [entity.position_ids().x], |v| v[0])
            .unwrap();
        assert!(matches!(builder.build(), Err(GraphError::Cycle { .. })));
    }
}
