pub mod circuit;
pub mod cli;
pub mod component;
pub mod demo;
pub mod error;
pub mod mna;
pub mod network;
pub mod output;
pub mod solver;

// Re-export commonly used types
pub use circuit::{CalculationMode, ComponentData, ComponentType, IdealParameters, Node, SwitchCondition};
pub use component::{Component, Element, Resistor, Switch, VoltageSource};
pub use error::{CircuitError, Result, SingularDiagnostic};
pub use network::{Network, NetworkConfig};
pub use output::{BranchReport, NodeReport, OutputFormat};
pub use solver::{LinearSolver, SolverConfig, SolverMethod};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
