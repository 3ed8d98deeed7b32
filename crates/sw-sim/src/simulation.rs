//! The switch: one counterweight plus movable robots on a shared graph.

use sw_core::Vec2;
use sw_core::geometry::vec2;
use sw_graph::{ChangeNotice, DependencyGraph, DerivedId, GraphBuilder, NodeRef, Value};
use sw_solver::{
    EquilibriumStrategy, LevelBounds, MassPoint, Moments, ToleranceReport, ToleranceStrategy,
    bisection_angle, closed_form_angle, closed_form_bounds, is_level, solve_tolerance,
};
use tracing::debug;

use crate::config::SwitchConfig;
use crate::error::{SimError, SimResult};
use crate::point_mass::PointMassOnSwitch;
use crate::trial::PositionTrial;

/// Closed-form level-band nodes of one robot.
#[derive(Clone, Copy, Debug)]
struct LevelNodes {
    min: DerivedId,
    zero: DerivedId,
    max: DerivedId,
}

/// Published values of one entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    pub mass: f64,
    pub relative: Vec2,
    pub position: Vec2,
    pub torque: Option<f64>,
}

/// Every published value at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub equilibrium_angle: Option<f64>,
    pub is_level: bool,
    pub total_mass: Option<f64>,
    pub com: Option<Vec2>,
    pub net_torque: Option<f64>,
    /// Counterweight first, then robots
    pub entities: Vec<EntitySnapshot>,
    /// One per robot
    pub tolerances: Vec<ToleranceReport>,
}

/// Balance-switch simulation.
///
/// Entity 0 is the counterweight: fixed mass and relative position. Entities
/// `1..=robot_count` are robots whose mass and relative x are writable. All
/// published values are lazy graph nodes, recomputed on read when an input
/// changed.
pub struct Simulation {
    config: SwitchConfig,
    graph: DependencyGraph,
    entities: Vec<PointMassOnSwitch>,
    total_mass: DerivedId,
    com_x: DerivedId,
    com_y: DerivedId,
    angle: DerivedId,
    is_level: DerivedId,
    net_torque: DerivedId,
    level: Vec<LevelNodes>,
}

impl Simulation {
    pub fn new(config: SwitchConfig) -> SimResult<Self> {
        config.validate()?;

        let mut builder = GraphBuilder::new();
        let angle = builder.reserve("equilibrium_angle")?;

        let mut entities = Vec::with_capacity(config.robot_count + 1);
        entities.push(PointMassOnSwitch::register(
            &mut builder,
            "counterweight",
            vec2(0.0, -config.com_pivot_distance),
            config.switch_weight,
            angle,
            config.pivot_height,
        )?);
        for i in 0..config.robot_count {
            entities.push(PointMassOnSwitch::register(
                &mut builder,
                &format!("robot{}", i + 1),
                vec2(0.0, -config.rung_pivot_distance()),
                0.0,
                angle,
                config.pivot_height,
            )?);
        }

        // Inputs of every whole-system node: all masses, then all relative x,
        // then all relative y.
        let layout: Vec<NodeRef> = entities
            .iter()
            .map(|e| NodeRef::from(e.mass_cell()))
            .chain(entities.iter().map(|e| e.relative_cells().x.into()))
            .chain(entities.iter().map(|e| e.relative_cells().y.into()))
            .collect();

        let total_mass = builder.add_derived("total_mass", layout.clone(), |v| {
            Value::from_option(moments(v).map(|m| m.total_mass))
        })?;
        let com_x = builder.add_derived("com_x", layout.clone(), |v| {
            Value::from_option(moments(v).and_then(|m| m.center()).map(|c| c.x))
        })?;
        let com_y = builder.add_derived("com_y", layout.clone(), |v| {
            Value::from_option(moments(v).and_then(|m| m.center()).map(|c| c.y))
        })?;

        let max_angle = config.max_angle;
        match config.equilibrium {
            EquilibriumStrategy::ClosedForm => {
                builder.define(angle, [com_x, com_y], move |v| {
                    let x = v[0].as_number().unwrap_or(f64::NAN);
                    let y = v[1].as_number().unwrap_or(f64::NAN);
                    Value::Number(closed_form_angle(x, y, max_angle))
                })?;
            }
            EquilibriumStrategy::Bisection => {
                let bisection = config.bisection();
                builder.define(angle, layout.clone(), move |v| {
                    let result = mass_points(v)
                        .and_then(|points| bisection_angle(&points, max_angle, &bisection).ok());
                    Value::from_option(result.map(|r| r.value))
                })?;
            }
        }

        let threshold = config.level_threshold;
        let is_level_id = builder.add_derived("is_level", [angle], move |v| {
            Value::Flag(v[0].as_number().is_some_and(|a| is_level(a, threshold)))
        })?;

        let torques: Vec<DerivedId> = entities.iter().map(|e| e.torque_id()).collect();
        let net_torque = builder.add_derived("net_torque", torques, |v| {
            let sum: Option<f64> = v.iter().map(Value::as_number).sum();
            Value::from_option(sum)
        })?;

        let half = config.half_handle();
        let mut level = Vec::with_capacity(config.robot_count);
        for robot in 1..=config.robot_count {
            let mut node = |suffix: &str, pick: fn(&LevelBounds) -> Option<f64>| {
                builder.add_derived(
                    format!("robot{robot}.level_x_{suffix}"),
                    layout.clone(),
                    move |v| {
                        let bounds = mass_points(v).map(|points| {
                            closed_form_bounds(&points, robot, threshold, half)
                        });
                        Value::from_option(bounds.as_ref().and_then(pick))
                    },
                )
            };
            level.push(LevelNodes {
                min: node("min", |b| b.min)?,
                zero: node("zero", |b| b.zero)?,
                max: node("max", |b| b.max)?,
            });
        }

        let graph = builder.build()?;
        debug!(
            robots = config.robot_count,
            strategy = ?config.equilibrium,
            cells = graph.cell_count(),
            derived = graph.derived_count(),
            "simulation built"
        );

        Ok(Self {
            config,
            graph,
            entities,
            total_mass,
            com_x,
            com_y,
            angle,
            is_level: is_level_id,
            net_torque,
            level,
        })
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Counterweight first, then robots.
    pub fn entities(&self) -> &[PointMassOnSwitch] {
        &self.entities
    }

    pub fn counterweight(&self) -> &PointMassOnSwitch {
        &self.entities[0]
    }

    pub fn robot_count(&self) -> usize {
        self.entities.len() - 1
    }

    pub fn robot(&self, index: usize) -> SimResult<&PointMassOnSwitch> {
        index
            .checked_add(1)
            .and_then(|slot| self.entities.get(slot))
            .ok_or(SimError::RobotIndex {
                index,
                count: self.robot_count(),
            })
    }

    pub fn total_mass(&self) -> Option<f64> {
        self.graph.number(self.total_mass)
    }

    pub fn com_x(&self) -> Option<f64> {
        self.graph.number(self.com_x)
    }

    pub fn com_y(&self) -> Option<f64> {
        self.graph.number(self.com_y)
    }

    /// Center of mass in switch-relative coordinates.
    pub fn com(&self) -> Option<Vec2> {
        self.com_x().zip(self.com_y()).map(|(x, y)| vec2(x, y))
    }

    pub fn equilibrium_angle(&self) -> Option<f64> {
        self.graph.number(self.angle)
    }

    pub fn equilibrium_angle_id(&self) -> DerivedId {
        self.angle
    }

    pub fn is_level(&self) -> bool {
        self.graph.flag(self.is_level)
    }

    pub fn net_torque(&self) -> Option<f64> {
        self.graph.number(self.net_torque)
    }

    /// Closed-form level band and ideal position of robot `index`.
    pub fn level_bounds(&self, index: usize) -> SimResult<LevelBounds> {
        let nodes = self.level_nodes(index)?;
        Ok(LevelBounds {
            min: self.graph.number(nodes.min),
            zero: self.graph.number(nodes.zero),
            max: self.graph.number(nodes.max),
        })
    }

    /// Relative x that would put robot `index` at exactly level.
    pub fn ideal_x(&self, index: usize) -> SimResult<Option<f64>> {
        Ok(self.graph.number(self.level_nodes(index)?.zero))
    }

    pub fn set_robot_mass(&mut self, index: usize, mass: f64) -> SimResult<()> {
        sw_core::ensure_finite(mass, "robot mass")?;
        let cell = self.robot(index)?.mass_cell();
        self.graph.set(cell, mass);
        Ok(())
    }

    pub fn set_robot_x(&mut self, index: usize, x: f64) -> SimResult<()> {
        sw_core::ensure_finite(x, "robot position")?;
        let cell = self.robot(index)?.relative_cells().x;
        self.graph.set(cell, x);
        Ok(())
    }

    /// Set mass and position together; observers hear about it once.
    pub fn place_robot(&mut self, index: usize, mass: f64, x: f64) -> SimResult<()> {
        sw_core::ensure_finite(mass, "robot mass")?;
        sw_core::ensure_finite(x, "robot position")?;
        let robot = *self.robot(index)?;
        let mut graph = self.graph.batch();
        graph.set(robot.mass_cell(), mass);
        graph.set(robot.relative_cells().x, x);
        Ok(())
    }

    pub fn tolerance(&mut self, index: usize) -> SimResult<ToleranceReport> {
        self.tolerance_with(index, ToleranceStrategy::default())
    }

    /// Tolerance of robot `index` with every other mass held in place.
    ///
    /// The robot is moved around inside a batch scope and put back before
    /// the scope ends, so no cell changes and no observer is called.
    pub fn tolerance_with(
        &mut self,
        index: usize,
        strategy: ToleranceStrategy,
    ) -> SimResult<ToleranceReport> {
        let closed = self.level_bounds(index)?;
        let cell = self.robot(index)?.relative_cells().x;
        let half = self.config.half_handle();
        let bisection = self.config.bisection();

        let mut trial = PositionTrial::new(&mut self.graph, cell, self.is_level);
        let current = trial.original();
        let report = solve_tolerance(current, &closed, half, strategy, &bisection, |x| {
            trial.level_at(x)
        })?;
        Ok(report)
    }

    /// Tolerance of every robot, in robot order.
    pub fn tolerances(&mut self) -> SimResult<Vec<ToleranceReport>> {
        (0..self.robot_count()).map(|i| self.tolerance(i)).collect()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ChangeNotice) + 'static) {
        self.graph.subscribe(observer);
    }

    pub fn snapshot(&mut self) -> SimResult<Snapshot> {
        let tolerances = self.tolerances()?;
        let entities = self
            .entities
            .iter()
            .map(|e| EntitySnapshot {
                mass: e.mass(&self.graph),
                relative: e.relative_position(&self.graph),
                position: e.position(&self.graph),
                torque: e.torque(&self.graph),
            })
            .collect();
        Ok(Snapshot {
            equilibrium_angle: self.equilibrium_angle(),
            is_level: self.is_level(),
            total_mass: self.total_mass(),
            com: self.com(),
            net_torque: self.net_torque(),
            entities,
            tolerances,
        })
    }

    fn level_nodes(&self, index: usize) -> SimResult<LevelNodes> {
        self.level.get(index).copied().ok_or(SimError::RobotIndex {
            index,
            count: self.robot_count(),
        })
    }
}

/// Rebuild the mass list from a `[masses, xs, ys]` input layout.
fn mass_points(values: &[Value]) -> Option<Vec<MassPoint>> {
    let n = values.len() / 3;
    (0..n)
        .map(|i| {
            Some(MassPoint::new(
                values[i].as_number()?,
                values[n + i].as_number()?,
                values[2 * n + i].as_number()?,
            ))
        })
        .collect()
}

fn moments(values: &[Value]) -> Option<Moments> {
    mass_points(values).map(|points| Moments::of(&points))
}
