//! Circuit graph and the Modified Nodal Analysis driver.
//!
//! A [`Network`] owns named nodes and at most one [`Component`] per unordered
//! node pair. [`Network::solve`] runs the whole DC analysis:
//!
//! 1. update every component for its calculation mode
//! 2. drop isolated nodes, pick the ground node, index the rows
//! 3. stamp passive components, then voltage sources
//! 4. pin the ground potential
//! 5. reject rank-deficient systems with row diagnostics
//! 6. solve the dense system
//! 7. write potentials and currents back into nodes and components
//! 8. optionally snapshot node and branch reports

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::circuit::{CalculationMode, Node};
use crate::component::{Component, Element};
use crate::error::{CircuitError, Result};
use crate::mna::MnaSystem;
use crate::output::{self, BranchReport, NodeReport};
use crate::solver::{LinearSolver, SolverConfig};

/// Node names tried as ground before falling back to the first node
pub const GROUND_CANDIDATES: [&str; 2] = ["n0", "gnd"];

/// Network configuration
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub solver_config: SolverConfig,
    pub node_reporting: bool,
    pub branch_reporting: bool,
}

/// One graph edge; `a` and `b` are node handles for endpoint1 and endpoint2
#[derive(Debug, Clone)]
struct Edge {
    a: usize,
    b: usize,
    component: Component,
}

/// Undirected circuit graph with one component per edge
#[derive(Debug, Clone)]
pub struct Network {
    nodes: Vec<Node>,
    node_map: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_map: HashMap<(usize, usize), usize>,
    mode: Option<CalculationMode>,
    ground_node: Option<String>,
    node_indices: HashMap<String, usize>,
    node_voltages: HashMap<String, f64>,
    node_report: Option<Vec<NodeReport>>,
    branch_report: Option<Vec<BranchReport>>,
    config: NetworkConfig,
    solver: LinearSolver,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Network {
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        let solver = LinearSolver::with_config(config.solver_config.clone());
        Network {
            nodes: Vec::new(),
            node_map: HashMap::new(),
            edges: Vec::new(),
            edge_map: HashMap::new(),
            mode: None,
            ground_node: None,
            node_indices: HashMap::new(),
            node_voltages: HashMap::new(),
            node_report: None,
            branch_report: None,
            config,
            solver,
        }
    }

    /// Add a node if it is not present yet and return its handle.
    ///
    /// A given position replaces any stored one.
    pub fn add_node(&mut self, name: &str, position: Option<(f64, f64)>) -> usize {
        let handle = self.ensure_node(name);
        if position.is_some() {
            self.nodes[handle].position = position;
        }
        handle
    }

    fn ensure_node(&mut self, name: &str) -> usize {
        if let Some(&handle) = self.node_map.get(name) {
            return handle;
        }

        let handle = self.nodes.len();
        self.nodes.push(Node::new(name.to_string()));
        self.node_map.insert(name.to_string(), handle);
        handle
    }

    /// Attach `component` between two nodes, creating them as needed.
    ///
    /// The component's endpoints are rebound to the given names. A component
    /// already on the same node pair, in either orientation, is replaced.
    pub fn add_component(&mut self, endpoint1: &str, endpoint2: &str, mut component: Component) {
        let a = self.ensure_node(endpoint1);
        let b = self.ensure_node(endpoint2);

        let data = component.data_mut();
        data.endpoint1 = endpoint1.to_string();
        data.endpoint2 = endpoint2.to_string();

        let edge = Edge { a, b, component };
        match self.edge_map.get(&edge_key(a, b)) {
            Some(&index) => {
                debug!(
                    "Replacing {} between {} and {} with {}",
                    self.edges[index].component.name(),
                    endpoint1,
                    endpoint2,
                    edge.component.name()
                );
                self.edges[index] = edge;
            }
            None => {
                self.edge_map.insert(edge_key(a, b), self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    /// Set the calculation mode of every attached component
    pub fn set_calculation_mode(&mut self, mode: CalculationMode) {
        self.mode = Some(mode);
        for edge in &mut self.edges {
            edge.component.set_mode(mode);
        }
    }

    pub fn calculation_mode(&self) -> Option<CalculationMode> {
        self.mode
    }

    pub fn set_node_reporting(&mut self, enabled: bool) {
        self.config.node_reporting = enabled;
    }

    pub fn set_branch_reporting(&mut self, enabled: bool) {
        self.config.branch_reporting = enabled;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.node_map.get(name).map(|&handle| &self.nodes[handle])
    }

    /// Node name to matrix row, as indexed by the last solve
    pub fn node_indices(&self) -> &HashMap<String, usize> {
        &self.node_indices
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn component_count(&self) -> usize {
        self.edges.len()
    }

    /// Components in edge order with their endpoint names
    pub fn components(&self) -> impl Iterator<Item = (&str, &str, &Component)> + '_ {
        self.edges.iter().map(move |edge| {
            (
                self.nodes[edge.a].name.as_str(),
                self.nodes[edge.b].name.as_str(),
                &edge.component,
            )
        })
    }

    /// Component on the edge between two nodes, in either orientation
    pub fn component(&self, endpoint1: &str, endpoint2: &str) -> Option<&Component> {
        let index = self.edge_index(endpoint1, endpoint2)?;
        Some(&self.edges[index].component)
    }

    pub fn component_mut(&mut self, endpoint1: &str, endpoint2: &str) -> Option<&mut Component> {
        let index = self.edge_index(endpoint1, endpoint2)?;
        Some(&mut self.edges[index].component)
    }

    fn edge_index(&self, endpoint1: &str, endpoint2: &str) -> Option<usize> {
        let a = *self.node_map.get(endpoint1)?;
        let b = *self.node_map.get(endpoint2)?;
        self.edge_map.get(&edge_key(a, b)).copied()
    }

    /// Ground node chosen by the last solve
    pub fn ground_node(&self) -> Option<&str> {
        self.ground_node.as_deref()
    }

    /// Solved node potentials, kept across solves
    pub fn node_voltages(&self) -> &HashMap<String, f64> {
        &self.node_voltages
    }

    pub fn node_voltage(&self, name: &str) -> Option<f64> {
        self.node_voltages.get(name).copied()
    }

    pub fn node_report(&self) -> Option<&[NodeReport]> {
        self.node_report.as_deref()
    }

    pub fn branch_report(&self) -> Option<&[BranchReport]> {
        self.branch_report.as_deref()
    }

    /// Run the full DC analysis.
    ///
    /// Stops at the first failing stage; state written by earlier stages
    /// stays in place.
    pub fn solve(&mut self, time: Option<f64>) -> Result<()> {
        info!("Solving circuit using Modified Nodal Analysis");

        for edge in &mut self.edges {
            edge.component.update(time)?;
        }

        info!("1: Pruning isolated nodes");
        self.prune_isolated_nodes();
        let ground = self.select_ground()?;
        self.node_indices = self.node_map.clone();
        let num_nodes = self.nodes.len();

        let sources: Vec<usize> = self
            .edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.component.is_voltage_source())
            .map(|(index, _)| index)
            .collect();

        info!("2: Generating A matrix, b vector");
        let mut mna = MnaSystem::new(num_nodes, sources.len())?;

        for edge in &mut self.edges {
            match edge.component {
                Component::Resistor(_) | Component::Switch(_) => {
                    mna.stamp(&mut edge.component, edge.a, edge.b, None)?;
                }
                Component::VoltageSource(_) => {}
            }
        }

        for (k, &index) in sources.iter().enumerate() {
            let vs_index = mna.voltage_source_index(k);
            let edge = &mut self.edges[index];
            mna.stamp(&mut edge.component, edge.a, edge.b, Some(vs_index))?;
        }

        info!("3: Setting ground node {}", self.nodes[ground].name);
        mna.fix_ground(ground);

        info!("4: Checking A matrix for numerical stability issues");
        let rank = self.solver.rank(&mna.matrix);
        if rank < mna.size {
            let names: Vec<String> = self.nodes.iter().map(|node| node.name.clone()).collect();
            let diagnostic = mna.diagnose(rank, &names, self.solver.config().zero_row_tolerance);
            for (row, label) in &diagnostic.zero_rows {
                warn!("Row {}: {}", row, label);
            }
            return Err(CircuitError::SingularSystem(diagnostic));
        }

        info!("5: Solving Ax=b");
        let (solution, stats) = self.solver.solve_dense(&mna.matrix, &mna.rhs)?;
        debug!(
            "Solver stats: method={:?}, residual={:.2e}, time={:.3}ms",
            stats.method_used,
            stats.residual_norm,
            stats.solve_time * 1e3
        );
        mna.update_solution(solution);

        self.propagate(&mna, &sources);

        self.node_report = if self.config.node_reporting {
            let report = output::collect_node_report(self);
            info!("Reporting node data for {} nodes", report.len());
            Some(report)
        } else {
            None
        };

        self.branch_report = if self.config.branch_reporting {
            let report = output::collect_branch_report(self);
            info!("Reporting branch data for {} branches", report.len());
            Some(report)
        } else {
            None
        };

        Ok(())
    }

    /// Remove nodes without incident edges and compact the node handles
    fn prune_isolated_nodes(&mut self) {
        let mut degree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            degree[edge.a] += 1;
            degree[edge.b] += 1;
        }

        if degree.iter().all(|&d| d > 0) {
            return;
        }

        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut kept = Vec::with_capacity(self.nodes.len());
        let mut dropped = Vec::new();

        for (old, node) in std::mem::take(&mut self.nodes).into_iter().enumerate() {
            if degree[old] == 0 {
                dropped.push(node.name);
            } else {
                remap[old] = kept.len();
                kept.push(node);
            }
        }

        warn!("Dropping isolated nodes: {:?}", dropped);
        for name in &dropped {
            self.node_voltages.remove(name);
        }

        self.nodes = kept;
        self.node_map = self
            .nodes
            .iter()
            .enumerate()
            .map(|(handle, node)| (node.name.clone(), handle))
            .collect();

        for edge in &mut self.edges {
            edge.a = remap[edge.a];
            edge.b = remap[edge.b];
        }
        self.edge_map = self
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (edge_key(edge.a, edge.b), index))
            .collect();
    }

    /// Pick the reference node: "n0", then "gnd", then the first node
    fn select_ground(&mut self) -> Result<usize> {
        let handle = GROUND_CANDIDATES
            .iter()
            .find_map(|name| self.node_map.get(*name).copied())
            .or(if self.nodes.is_empty() { None } else { Some(0) })
            .ok_or(CircuitError::EmptyNetwork)?;

        self.ground_node = Some(self.nodes[handle].name.clone());
        Ok(handle)
    }

    /// Write the solution back into nodes and components
    fn propagate(&mut self, mna: &MnaSystem, sources: &[usize]) {
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.voltage = mna.node_voltage(index);
            self.node_voltages.insert(node.name.clone(), node.voltage);
        }

        for (k, &index) in sources.iter().enumerate() {
            self.edges[index].component.data_mut().current = Some(mna.voltage_source_current(k));
        }

        for edge in &mut self.edges {
            let voltage = self.nodes[edge.a].voltage - self.nodes[edge.b].voltage;
            let data = edge.component.data_mut();
            data.voltage = Some(voltage);

            match edge.component {
                Component::Resistor(_) | Component::Switch(_) => {
                    let data = edge.component.data_mut();
                    data.current = Some(match data.resistance {
                        Some(resistance) if resistance != 0.0 => voltage / resistance,
                        // short circuit
                        _ => f64::INFINITY,
                    });
                }
                Component::VoltageSource(_) => {}
            }
        }

        for node in &mut self.nodes {
            node.net_current = 0.0;
        }
        for edge in &self.edges {
            let current = edge.component.data().current.unwrap_or(0.0);
            self.nodes[edge.a].net_current -= current;
            self.nodes[edge.b].net_current += current;
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
