use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents a node in the circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Potential from the last solve
    pub voltage: f64,
    /// Signed sum of incident branch currents, current leaving counts negative
    pub net_current: f64,
    /// Display position, cosmetic only
    pub position: Option<(f64, f64)>,
}

impl Node {
    pub fn new(name: String) -> Self {
        Node {
            name,
            voltage: 0.0,
            net_current: 0.0,
            position: None,
        }
    }
}

/// Which electrical quantity `update()` solves for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationMode {
    Voltage,
    Current,
    Resistance,
}

impl fmt::Display for CalculationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalculationMode::Voltage => "voltage",
            CalculationMode::Current => "current",
            CalculationMode::Resistance => "resistance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchCondition {
    Open,
    Closed,
}

/// Types of circuit components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Resistor,
    VoltageSource,
    CurrentSource,
    Switch,
    Node,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Resistor => "resistor",
            ComponentType::VoltageSource => "voltage_source",
            ComponentType::CurrentSource => "current_source",
            ComponentType::Switch => "switch",
            ComponentType::Node => "node",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of an ideal source behind its internal resistance
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IdealParameters {
    pub ideal_voltage: f64,
    pub ideal_current: f64,
    pub internal_resistance: f64,
}

impl IdealParameters {
    pub fn voltage_source(ideal_voltage: f64, internal_resistance: f64) -> Self {
        IdealParameters {
            ideal_voltage,
            internal_resistance,
            ..Default::default()
        }
    }
}

/// Electrical state of one two-terminal component.
///
/// Quantities stay `None` until the caller sets them or a solve fills them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    pub name: String,
    pub endpoint1: String,
    pub endpoint2: String,
    pub current: Option<f64>,
    pub voltage: Option<f64>,
    pub resistance: Option<f64>,
    pub mode: Option<CalculationMode>,
    pub switch_condition: Option<SwitchCondition>,
    pub component_type: ComponentType,
    pub ideal: Option<IdealParameters>,
}

impl ComponentData {
    pub fn new(name: impl Into<String>, endpoint1: impl Into<String>, endpoint2: impl Into<String>) -> Self {
        ComponentData {
            name: name.into(),
            endpoint1: endpoint1.into(),
            endpoint2: endpoint2.into(),
            current: None,
            voltage: None,
            resistance: None,
            mode: None,
            switch_condition: None,
            component_type: ComponentType::Resistor,
            ideal: None,
        }
    }

    pub fn with_current(mut self, current: f64) -> Self {
        self.current = Some(current);
        self
    }

    pub fn with_voltage(mut self, voltage: f64) -> Self {
        self.voltage = Some(voltage);
        self
    }

    pub fn with_resistance(mut self, resistance: f64) -> Self {
        self.resistance = Some(resistance);
        self
    }

    pub fn with_mode(mut self, mode: CalculationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_switch_condition(mut self, condition: SwitchCondition) -> Self {
        self.switch_condition = Some(condition);
        self
    }

    pub fn with_ideal_parameters(mut self, ideal: IdealParameters) -> Self {
        self.ideal = Some(ideal);
        self
    }
}
