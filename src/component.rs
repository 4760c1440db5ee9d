//! Two-terminal component models.
//!
//! Every variant implements [`Element`]: `update` fills in the quantity
//! selected by the calculation mode, `stamp` adds the component's terms to the
//! MNA system. [`Component`] is the closed set the network stores on its edges.

use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::circuit::{CalculationMode, ComponentData, ComponentType, IdealParameters, SwitchCondition};
use crate::error::{CircuitError, Result};

/// Resistance of an open switch
pub const OPEN_SWITCH_RESISTANCE: f64 = 1e10;
/// Resistance of a closed switch
pub const CLOSED_SWITCH_RESISTANCE: f64 = 1e-10;

/// Trait implemented by every circuit component.
pub trait Element {
    fn data(&self) -> &ComponentData;

    fn data_mut(&mut self) -> &mut ComponentData;

    /// Recomputes the quantity selected by the calculation mode.
    ///
    /// `time` is passed through for time-varying sources; the DC variants
    /// ignore it.
    fn update(&mut self, time: Option<f64>) -> Result<()>;

    /// Adds this component's terms to `matrix` and `rhs`.
    ///
    /// `n1` and `n2` are the rows of endpoint1 and endpoint2. Voltage sources
    /// also need the row of their auxiliary branch current.
    fn stamp(
        &mut self,
        matrix: &mut DMatrix<f64>,
        rhs: &mut DVector<f64>,
        n1: usize,
        n2: usize,
        voltage_source_index: Option<usize>,
    ) -> Result<()>;
}

fn require(data: &ComponentData, value: Option<f64>, quantity: &str) -> Result<f64> {
    value.ok_or_else(|| CircuitError::invalid_parameter(&data.name, format!("{} is not set", quantity)))
}

fn missing_mode(data: &ComponentData, variant: &str) -> CircuitError {
    CircuitError::invalid_mode(&data.name, format!("specify calculation mode for {}", variant))
}

// Ohm's law shared by the resistive variants

fn ohmic_voltage(data: &mut ComponentData) -> Result<()> {
    let current = require(data, data.current, "current")?;
    let resistance = require(data, data.resistance, "resistance")?;
    data.voltage = Some(current * resistance);
    Ok(())
}

fn ohmic_current(data: &mut ComponentData) -> Result<()> {
    let resistance = require(data, data.resistance, "resistance")?;
    if resistance <= 0.0 {
        return Err(CircuitError::invalid_parameter(
            &data.name,
            format!("invalid resistance: {}", resistance),
        ));
    }
    let voltage = require(data, data.voltage, "voltage")?;
    data.current = Some(voltage / resistance);
    Ok(())
}

fn ohmic_resistance(data: &mut ComponentData) -> Result<()> {
    let current = require(data, data.current, "current")?;
    if current == 0.0 {
        return Err(CircuitError::invalid_parameter(
            &data.name,
            format!("invalid current: {}", current),
        ));
    }
    let voltage = require(data, data.voltage, "voltage")?;
    data.resistance = Some(voltage / current.abs());
    Ok(())
}

fn stamp_conductance(data: &ComponentData, matrix: &mut DMatrix<f64>, n1: usize, n2: usize) -> Result<()> {
    let resistance = match data.resistance {
        Some(r) if r > 0.0 => r,
        other => {
            return Err(CircuitError::invalid_parameter(
                &data.name,
                format!("cannot stamp resistance {:?}", other),
            ))
        }
    };

    let conductance = 1.0 / resistance;
    matrix[(n1, n1)] += conductance;
    matrix[(n2, n2)] += conductance;
    matrix[(n1, n2)] -= conductance;
    matrix[(n2, n1)] -= conductance;
    Ok(())
}

// ========================= Resistor =========================

/// Linear resistor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resistor {
    data: ComponentData,
}

impl Resistor {
    pub fn new(mut data: ComponentData) -> Self {
        data.component_type = ComponentType::Resistor;
        Resistor { data }
    }
}

impl Element for Resistor {
    fn data(&self) -> &ComponentData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    fn update(&mut self, _time: Option<f64>) -> Result<()> {
        match self.data.mode {
            Some(CalculationMode::Voltage) => ohmic_voltage(&mut self.data),
            Some(CalculationMode::Current) => ohmic_current(&mut self.data),
            Some(CalculationMode::Resistance) => ohmic_resistance(&mut self.data),
            None => Err(missing_mode(&self.data, "Resistor")),
        }
    }

    fn stamp(
        &mut self,
        matrix: &mut DMatrix<f64>,
        _rhs: &mut DVector<f64>,
        n1: usize,
        n2: usize,
        _voltage_source_index: Option<usize>,
    ) -> Result<()> {
        stamp_conductance(&self.data, matrix, n1, n2)
    }
}

// ========================= Switch =========================

/// Two-state switch modelled as a very large or very small resistance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    data: ComponentData,
}

impl Switch {
    pub fn new(mut data: ComponentData) -> Self {
        data.component_type = ComponentType::Switch;
        Switch { data }
    }

    pub fn set_condition(&mut self, condition: SwitchCondition) {
        self.data.switch_condition = Some(condition);
    }

    /// Derives the resistance from the switch condition.
    fn apply_condition(&mut self) -> Result<()> {
        let resistance = match self.data.switch_condition {
            Some(SwitchCondition::Open) => OPEN_SWITCH_RESISTANCE,
            Some(SwitchCondition::Closed) => CLOSED_SWITCH_RESISTANCE,
            None => {
                return Err(CircuitError::invalid_parameter(
                    &self.data.name,
                    "switch condition is not set",
                ))
            }
        };
        self.data.resistance = Some(resistance);
        Ok(())
    }
}

impl Element for Switch {
    fn data(&self) -> &ComponentData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    fn update(&mut self, _time: Option<f64>) -> Result<()> {
        self.apply_condition()?;

        match self.data.mode {
            Some(CalculationMode::Voltage) => ohmic_voltage(&mut self.data),
            Some(CalculationMode::Current) => ohmic_current(&mut self.data),
            Some(CalculationMode::Resistance) => Err(CircuitError::invalid_mode(
                &self.data.name,
                "switch resistance follows its condition",
            )),
            None => Err(missing_mode(&self.data, "Switch")),
        }
    }

    fn stamp(
        &mut self,
        matrix: &mut DMatrix<f64>,
        _rhs: &mut DVector<f64>,
        n1: usize,
        n2: usize,
        _voltage_source_index: Option<usize>,
    ) -> Result<()> {
        self.apply_condition()?;
        stamp_conductance(&self.data, matrix, n1, n2)
    }
}

// ========================= Voltage source =========================

/// Ideal voltage source behind a series internal resistance.
///
/// The source raises the potential from endpoint1 to endpoint2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageSource {
    data: ComponentData,
}

impl VoltageSource {
    pub fn new(mut data: ComponentData) -> Self {
        data.component_type = ComponentType::VoltageSource;
        VoltageSource { data }
    }

    fn ideal(&self) -> Result<IdealParameters> {
        self.data.ideal.ok_or_else(|| {
            CircuitError::invalid_parameter(&self.data.name, "specify voltage source ideal parameters")
        })
    }

    fn voltage(&mut self) -> Result<()> {
        let ideal = self.ideal()?;
        let current = require(&self.data, self.data.current, "current")?;
        self.data.voltage = Some(ideal.ideal_voltage - current * ideal.internal_resistance);
        Ok(())
    }

    fn current(&mut self) -> Result<()> {
        let ideal = self.ideal()?;
        if ideal.internal_resistance <= 0.0 {
            return Err(CircuitError::invalid_parameter(
                &self.data.name,
                format!("invalid internal resistance: {}", ideal.internal_resistance),
            ));
        }
        let voltage = require(&self.data, self.data.voltage, "voltage")?;
        self.data.current = Some((ideal.ideal_voltage - voltage) / ideal.internal_resistance);
        Ok(())
    }

    fn resistance(&mut self) -> Result<()> {
        let mut ideal = self.ideal()?;
        let current = require(&self.data, self.data.current, "current")?;
        if current == 0.0 {
            return Err(CircuitError::invalid_parameter(
                &self.data.name,
                format!("invalid current: {}", current),
            ));
        }
        let voltage = require(&self.data, self.data.voltage, "voltage")?;

        ideal.internal_resistance = (ideal.ideal_voltage - voltage) / current.abs();
        self.data.ideal = Some(ideal);
        self.data.resistance = Some(ideal.internal_resistance);
        Ok(())
    }
}

impl Element for VoltageSource {
    fn data(&self) -> &ComponentData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    fn update(&mut self, time: Option<f64>) -> Result<()> {
        if let Some(t) = time {
            debug!("{}: constant source at t = {}", self.data.name, t);
        }

        match self.data.mode {
            Some(CalculationMode::Voltage) => self.voltage(),
            Some(CalculationMode::Current) => self.current(),
            Some(CalculationMode::Resistance) => self.resistance(),
            None => Err(missing_mode(&self.data, "VoltageSource")),
        }
    }

    fn stamp(
        &mut self,
        matrix: &mut DMatrix<f64>,
        rhs: &mut DVector<f64>,
        n1: usize,
        n2: usize,
        voltage_source_index: Option<usize>,
    ) -> Result<()> {
        let ideal = self.ideal()?;
        let vs = voltage_source_index.ok_or_else(|| {
            CircuitError::invalid_parameter(&self.data.name, "voltage source needs a branch current row")
        })?;

        matrix[(n1, vs)] += 1.0;
        matrix[(vs, n1)] += 1.0;
        matrix[(n2, vs)] -= 1.0;
        matrix[(vs, n2)] -= 1.0;

        if ideal.internal_resistance > 0.0 {
            matrix[(vs, vs)] -= ideal.internal_resistance;
        }

        // The rise from n1 to n2 enters with a negative sign
        rhs[vs] -= ideal.ideal_voltage;
        Ok(())
    }
}

// ========================= Component =========================

/// A circuit component attached to one network edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Resistor(Resistor),
    Switch(Switch),
    VoltageSource(VoltageSource),
}

impl Component {
    pub fn resistor(data: ComponentData) -> Self {
        Component::Resistor(Resistor::new(data))
    }

    pub fn switch(data: ComponentData) -> Self {
        Component::Switch(Switch::new(data))
    }

    pub fn voltage_source(data: ComponentData) -> Self {
        Component::VoltageSource(VoltageSource::new(data))
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn is_voltage_source(&self) -> bool {
        match self {
            Component::VoltageSource(_) => true,
            Component::Resistor(_) | Component::Switch(_) => false,
        }
    }

    pub fn set_mode(&mut self, mode: CalculationMode) {
        self.data_mut().mode = Some(mode);
    }
}

impl Element for Component {
    fn data(&self) -> &ComponentData {
        match self {
            Component::Resistor(r) => r.data(),
            Component::Switch(s) => s.data(),
            Component::VoltageSource(v) => v.data(),
        }
    }

    fn data_mut(&mut self) -> &mut ComponentData {
        match self {
            Component::Resistor(r) => r.data_mut(),
            Component::Switch(s) => s.data_mut(),
            Component::VoltageSource(v) => v.data_mut(),
        }
    }

    fn update(&mut self, time: Option<f64>) -> Result<()> {
        match self {
            Component::Resistor(r) => r.update(time),
            Component::Switch(s) => s.update(time),
            Component::VoltageSource(v) => v.update(time),
        }
    }

    fn stamp(
        &mut self,
        matrix: &mut DMatrix<f64>,
        rhs: &mut DVector<f64>,
        n1: usize,
        n2: usize,
        voltage_source_index: Option<usize>,
    ) -> Result<()> {
        match self {
            Component::Resistor(r) => r.stamp(matrix, rhs, n1, n2, voltage_source_index),
            Component::Switch(s) => s.stamp(matrix, rhs, n1, n2, voltage_source_index),
            Component::VoltageSource(v) => v.stamp(matrix, rhs, n1, n2, voltage_source_index),
        }
    }
}

impl From<Resistor> for Component {
    fn from(resistor: Resistor) -> Self {
        Component::Resistor(resistor)
    }
}

impl From<Switch> for Component {
    fn from(switch: Switch) -> Self {
        Component::Switch(switch)
    }
}

impl From<VoltageSource> for Component {
    fn from(source: VoltageSource) -> Self {
        Component::VoltageSource(source)
    }
}
