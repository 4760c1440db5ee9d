//! Post-solve snapshots of node and branch state, plus export helpers.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Result};
use colored::*;
use csv::WriterBuilder;
use log::info;
use serde::{Deserialize, Serialize};

use crate::circuit::ComponentType;
use crate::component::Element;
use crate::network::Network;

/// Output file format for exported reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

/// Solved state of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    pub name: String,
    pub voltage: f64,
    /// Signed sum of incident currents, current leaving counts negative
    pub net_current: f64,
    pub position: Option<(f64, f64)>,
}

/// Solved state of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchReport {
    pub name: String,
    pub endpoint1: String,
    pub endpoint2: String,
    pub endpoint1_voltage: f64,
    pub endpoint2_voltage: f64,
    pub voltage_drop: f64,
    pub current: f64,
    pub resistance: Option<f64>,
    pub component_type: ComponentType,
}

#[derive(Serialize)]
struct Reports<'a> {
    nodes: Option<&'a [NodeReport]>,
    branches: Option<&'a [BranchReport]>,
}

/// Node snapshot in node order
pub fn collect_node_report(network: &Network) -> Vec<NodeReport> {
    network
        .nodes()
        .iter()
        .map(|node| NodeReport {
            name: node.name.clone(),
            voltage: network.node_voltage(&node.name).unwrap_or(0.0),
            net_current: node.net_current,
            position: node.position,
        })
        .collect()
}

/// Branch snapshot in edge order
pub fn collect_branch_report(network: &Network) -> Vec<BranchReport> {
    network
        .components()
        .map(|(endpoint1, endpoint2, component)| {
            let data = component.data();
            BranchReport {
                name: data.name.clone(),
                endpoint1: endpoint1.to_string(),
                endpoint2: endpoint2.to_string(),
                endpoint1_voltage: network.node_voltage(endpoint1).unwrap_or(0.0),
                endpoint2_voltage: network.node_voltage(endpoint2).unwrap_or(0.0),
                voltage_drop: data.voltage.unwrap_or(0.0),
                current: data.current.unwrap_or(0.0),
                resistance: data.resistance,
                component_type: data.component_type,
            }
        })
        .collect()
}

/// Export the reports of the last solve to `filename`
pub fn export_reports(network: &Network, filename: &Path, format: OutputFormat) -> Result<()> {
    if network.node_report().is_none() && network.branch_report().is_none() {
        return Err(anyhow!("No reports available, enable node or branch reporting before solving"));
    }

    match format {
        OutputFormat::Csv => export_csv(network, filename),
        OutputFormat::Json => export_json(network, filename),
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export reports to CSV format, one section per report
fn export_csv(network: &Network, filename: &Path) -> Result<()> {
    let file = File::create(filename)?;
    // Node and branch sections have different widths
    let mut writer = WriterBuilder::new().flexible(true).from_writer(file);

    if let Some(nodes) = network.node_report() {
        writer.write_record(["node", "voltage", "net_current", "x", "y"])?;
        for node in nodes {
            let (x, y) = match node.position {
                Some((x, y)) => (Some(x), Some(y)),
                None => (None, None),
            };
            writer.write_record([
                node.name.clone(),
                node.voltage.to_string(),
                node.net_current.to_string(),
                format_optional(x),
                format_optional(y),
            ])?;
        }
    }

    if let Some(branches) = network.branch_report() {
        writer.write_record([
            "branch",
            "endpoint1",
            "endpoint2",
            "endpoint1_voltage",
            "endpoint2_voltage",
            "voltage_drop",
            "current",
            "resistance",
            "type",
        ])?;
        for branch in branches {
            writer.write_record([
                branch.name.clone(),
                branch.endpoint1.clone(),
                branch.endpoint2.clone(),
                branch.endpoint1_voltage.to_string(),
                branch.endpoint2_voltage.to_string(),
                branch.voltage_drop.to_string(),
                branch.current.to_string(),
                format_optional(branch.resistance),
                branch.component_type.to_string(),
            ])?;
        }
    }

    writer.flush()?;
    info!("Reports exported to CSV: {}", filename.display());
    Ok(())
}

/// Export reports to JSON format
fn export_json(network: &Network, filename: &Path) -> Result<()> {
    let file = File::create(filename)?;
    let reports = Reports {
        nodes: network.node_report(),
        branches: network.branch_report(),
    };
    serde_json::to_writer_pretty(file, &reports)?;

    info!("Reports exported to JSON: {}", filename.display());
    Ok(())
}

/// Print the reports of the last solve
pub fn print_summary(network: &Network) {
    println!("\n{}", "=== Solution Summary ===".bold());
    if let Some(ground) = network.ground_node() {
        println!("Ground node: {}", ground);
    }

    match network.node_report() {
        Some(nodes) => {
            println!("\n{}", "Node data:".green());
            for node in nodes {
                println!(
                    "  V({}): {:.6}V  net current: {:.6}A",
                    node.name, node.voltage, node.net_current
                );
            }
        }
        None => {
            println!("\n{}", "Node voltages:".green());
            for node in network.nodes() {
                println!("  V({}): {:.6}V", node.name, node.voltage);
            }
        }
    }

    if let Some(branches) = network.branch_report() {
        println!("\n{}", "Branch data:".green());
        for branch in branches {
            let resistance = match branch.resistance {
                Some(r) => format!("{:.6e}Ω", r),
                None => "-".to_string(),
            };
            println!(
                "  {} [{}] {} -> {}: drop {:.6}V, I {:.6}A, R {}",
                branch.name.bright_blue(),
                branch.component_type,
                branch.endpoint1,
                branch.endpoint2,
                branch.voltage_drop,
                branch.current,
                resistance
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{CalculationMode, ComponentData, IdealParameters};
    use crate::component::Component;
    use approx::assert_abs_diff_eq;

    fn solved_divider() -> Network {
        let mut net = Network::new();
        net.add_node("n0", Some((0.0, 0.0)));
        net.add_component(
            "n0",
            "n1",
            Component::voltage_source(
                ComponentData::new("V1", "n0", "n1")
                    .with_current(0.0)
                    .with_ideal_parameters(IdealParameters::voltage_source(10.0, 0.0)),
            ),
        );
        net.add_component("n1", "n2", Component::resistor(ComponentData::new("R1", "n1", "n2").with_resistance(6.0).with_current(0.0)));
        net.add_component("n2", "n0", Component::resistor(ComponentData::new("R2", "n2", "n0").with_resistance(4.0).with_current(0.0)));
        net.set_calculation_mode(CalculationMode::Voltage);
        net.set_node_reporting(true);
        net.set_branch_reporting(true);
        net.solve(None).unwrap();
        net
    }

    #[test]
    fn test_node_report() {
        let net = solved_divider();
        let nodes = net.node_report().unwrap();

        let names: Vec<&str> = nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["n0", "n1", "n2"]);
        assert_eq!(nodes[0].position, Some((0.0, 0.0)));
        assert_abs_diff_eq!(nodes[1].voltage, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(nodes[2].voltage, 4.0, epsilon = 1e-9);
        for node in nodes {
            assert_abs_diff_eq!(node.net_current, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_branch_report() {
        let net = solved_divider();
        let branches = net.branch_report().unwrap();

        assert_eq!(branches.len(), 3);
        let r1 = &branches[1];
        assert_eq!(r1.name, "R1");
        assert_eq!((r1.endpoint1.as_str(), r1.endpoint2.as_str()), ("n1", "n2"));
        assert_abs_diff_eq!(r1.endpoint1_voltage, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r1.endpoint2_voltage, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r1.voltage_drop, 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r1.current, 1.0, epsilon = 1e-9);
        assert_eq!(r1.resistance, Some(6.0));
        assert_eq!(r1.component_type, ComponentType::Resistor);

        assert_eq!(branches[0].component_type, ComponentType::VoltageSource);
        assert!(branches[0].resistance.is_none());
    }

    #[test]
    fn test_export_csv() {
        let net = solved_divider();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.csv");

        export_reports(&net, &path, OutputFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("node,voltage,net_current,x,y"));
        assert!(content.contains("branch,endpoint1,endpoint2"));
        assert!(content.contains("R2,n2,n0"));
        assert!(content.contains("voltage_source"));

        // Header plus three rows for each section
        let widths: Vec<usize> = content.lines().map(|line| line.split(',').count()).collect();
        assert_eq!(widths, vec![5, 5, 5, 5, 9, 9, 9, 9]);
    }

    #[test]
    fn test_export_csv_series_network() {
        let mut net = crate::demo::build_series_network();
        net.set_node_reporting(true);
        net.solve(None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        export_reports(&net, &path, OutputFormat::Csv).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|record| record.unwrap()).collect();
        assert_eq!(records.len(), 1 + 4 + 1 + 4);
        assert_eq!(&records[5][0], "branch");
        assert_eq!(&records[9][0], "R3");
    }

    #[test]
    fn test_export_json() {
        let net = solved_divider();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");

        export_reports(&net, &path, OutputFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["branches"][2]["name"], "R2");
        assert_eq!(value["branches"][0]["component_type"], "voltage_source");
    }

    #[test]
    fn test_export_without_reports_fails() {
        let mut net = solved_divider();
        net.set_node_reporting(false);
        net.set_branch_reporting(false);
        net.solve(None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        assert!(export_reports(&net, &dir.path().join("out.csv"), OutputFormat::Csv).is_err());
    }
}
