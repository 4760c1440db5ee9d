//! Ready-made networks used by the binary and the benchmarks.

use crate::circuit::{CalculationMode, ComponentData, IdealParameters};
use crate::component::Component;
use crate::network::Network;

/// Resistance of the interconnect wires in the parallel ladder
pub const WIRE_RESISTANCE: f64 = 1e-10;

fn source(name: &str, endpoint1: &str, endpoint2: &str) -> Component {
    Component::voltage_source(
        ComponentData::new(name, endpoint1, endpoint2)
            .with_voltage(10.0)
            .with_current(0.0)
            .with_mode(CalculationMode::Current)
            .with_ideal_parameters(IdealParameters::voltage_source(12.0, 1.0)),
    )
}

fn resistor(name: &str, endpoint1: &str, endpoint2: &str, resistance: f64) -> Component {
    Component::resistor(
        ComponentData::new(name, endpoint1, endpoint2)
            .with_resistance(resistance)
            .with_voltage(0.0)
            .with_current(0.0)
            .with_mode(CalculationMode::Voltage),
    )
}

/// 12 V source with 1 Ω internal resistance driving three 10 Ω resistors in
/// series around the loop n0 -> n1 -> n2 -> n3 -> n0.
pub fn build_series_network() -> Network {
    let mut net = Network::new();
    net.set_branch_reporting(true);

    for name in ["n0", "n1", "n2", "n3"] {
        net.add_node(name, None);
    }

    net.add_component("n0", "n1", source("V1", "n0", "n1"));
    net.add_component("n1", "n2", resistor("R1", "n1", "n2", 10.0));
    net.add_component("n2", "n3", resistor("R2", "n2", "n3", 10.0));
    net.add_component("n3", "n0", resistor("R3", "n3", "n0", 10.0));

    net
}

/// 12 V source feeding three 10 Ω rungs between two wire rails.
///
/// n2 and n3 are left unconnected and get pruned on solve.
pub fn build_parallel_network() -> Network {
    let mut net = Network::new();
    net.set_branch_reporting(true);

    for name in ["n0", "n1", "n2", "n3", "w1", "w2", "w3", "w4", "w5", "w6"] {
        net.add_node(name, None);
    }

    net.add_component("n0", "n1", source("V1", "n0", "n1"));

    let wires = [
        ("W1", "n1", "w1"),
        ("W2", "w1", "w2"),
        ("W3", "w2", "w3"),
        ("W4", "n0", "w4"),
        ("W5", "w4", "w5"),
        ("W6", "w5", "w6"),
    ];
    for (name, a, b) in wires {
        net.add_component(a, b, resistor(name, a, b, WIRE_RESISTANCE));
    }

    let rungs = [("R1", "w1", "w4"), ("R2", "w2", "w5"), ("R3", "w3", "w6")];
    for (name, a, b) in rungs {
        net.add_component(a, b, resistor(name, a, b, 10.0));
    }

    net
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::ComponentType;
    use crate::component::Element;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_series_network() {
        let mut net = build_series_network();
        net.solve(None).unwrap();

        let expected = 12.0 / 31.0;
        assert_eq!(net.ground_node(), Some("n0"));

        let source = net.component("n0", "n1").unwrap().data();
        assert_abs_diff_eq!(source.current.unwrap(), expected, epsilon = 1e-9);

        let mut resistors = 0;
        for (_, _, component) in net.components() {
            let data = component.data();
            if data.component_type == ComponentType::Resistor {
                resistors += 1;
                assert_abs_diff_eq!(data.current.unwrap(), expected, epsilon = 1e-9);
                assert_abs_diff_eq!(data.voltage.unwrap(), expected * 10.0, epsilon = 1e-9);
            }
        }
        assert_eq!(resistors, 3);
        assert_eq!(net.branch_report().unwrap().len(), 4);
    }

    #[test]
    fn test_parallel_network() {
        let mut net = build_parallel_network();
        net.solve(None).unwrap();

        assert!(net.node("n2").is_none());
        assert!(net.node("n3").is_none());
        assert_eq!(net.node_count(), 8);

        let r_parallel = 1.0 / (3.0 / 10.0);
        let expected = 12.0 / (1.0 + r_parallel);
        let source = net.component("n0", "n1").unwrap().data();
        assert_abs_diff_eq!(source.current.unwrap().abs(), expected, epsilon = 1e-4);

        for name in ["R1", "R2", "R3"] {
            let (_, _, rung) = net
                .components()
                .find(|(_, _, component)| component.name() == name)
                .unwrap();
            let data = rung.data();
            assert_abs_diff_eq!(data.current.unwrap().abs(), expected / 3.0, epsilon = 1e-4);
            assert_abs_diff_eq!(
                data.voltage.unwrap().abs(),
                (data.current.unwrap() * 10.0).abs(),
                epsilon = 1e-4
            );
        }

        // Kirchhoff's current law at every surviving node
        for node in net.nodes() {
            assert_abs_diff_eq!(node.net_current, 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_series_mode_override() {
        let mut net = build_series_network();
        net.set_calculation_mode(CalculationMode::Voltage);
        net.solve(None).unwrap();

        let source = net.component("n0", "n1").unwrap().data();
        assert_abs_diff_eq!(source.current.unwrap(), 12.0 / 31.0, epsilon = 1e-9);
    }
}
