//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while configuring or driving a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Robot index {index} out of range ({count} robots)")]
    RobotIndex { index: usize, count: usize },

    #[error("Core error: {0}")]
    Core(#[from] sw_core::SwError),

    #[error("Graph error: {0}")]
    Graph(#[from] sw_graph::GraphError),

    #[error("Solver error: {0}")]
    Solver(#[from] sw_solver::SolverError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;
