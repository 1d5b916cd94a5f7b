//! Connection graph and the cycle-accurate step algorithm.
//!
//! Connections are stored input-side: each input slot holds the upstream
//! output reference, so an output fans out for free and an input can hold
//! at most one edge by construction.

use thiserror::Error;

use crate::devices::{Device, DeviceKind, DeviceState, DeviceStore, OutputRef, Signal};
use crate::names::NameId;

/// Failures from [`Network::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("Device has not been defined.")]
    DeviceAbsent,
    #[error("Invalid output port.")]
    OutputPortAbsent,
    #[error("Invalid input port.")]
    InputPortAbsent,
    #[error("Input already has a connection.")]
    InputAlreadyConnected,
    #[error("Attempted to connect an output to an output.")]
    OutputToOutput,
    #[error("Attempted to connect an input to an input.")]
    InputToInput,
}

/// The circuit: a device store plus the step machinery that drives it in
/// lockstep discrete time.
pub struct Network {
    devices: DeviceStore,
}

impl Network {
    #[must_use]
    pub fn new(devices: DeviceStore) -> Self {
        Network { devices }
    }

    #[must_use]
    pub fn devices(&self) -> &DeviceStore {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceStore {
        &mut self.devices
    }

    /// Wires `(out_device, out_port)` into the input slot
    /// `(in_device, in_port)` after validating both endpoints.
    pub fn connect(
        &mut self,
        out_device: NameId,
        out_port: Option<NameId>,
        in_device: NameId,
        in_port: NameId,
    ) -> Result<(), NetError> {
        let source = self.devices.get(out_device).ok_or(NetError::DeviceAbsent)?;
        if !source.outputs.contains_key(&out_port) {
            // A named port that exists on the input side means the caller
            // wired two inputs together rather than naming a missing port.
            return match out_port {
                Some(port) if source.inputs.contains_key(&port) => Err(NetError::InputToInput),
                _ => Err(NetError::OutputPortAbsent),
            };
        }

        let sink = self.devices.get(in_device).ok_or(NetError::DeviceAbsent)?;
        if !sink.inputs.contains_key(&in_port) {
            return if sink.outputs.contains_key(&Some(in_port)) {
                Err(NetError::OutputToOutput)
            } else {
                Err(NetError::InputPortAbsent)
            };
        }
        if sink.inputs.get(&in_port).copied().flatten().is_some() {
            return Err(NetError::InputAlreadyConnected);
        }

        let reference = OutputRef {
            device: out_device,
            port: out_port,
        };
        if let Some(sink) = self.devices.get_mut(in_device) {
            sink.inputs.insert(in_port, Some(reference));
        }
        Ok(())
    }

    /// True when every input slot of every device holds a connection.
    #[must_use]
    pub fn check_all_inputs_connected(&self) -> bool {
        self.devices
            .iter()
            .all(|d| d.inputs.values().all(Option::is_some))
    }

    /// Current level of an output port.
    #[must_use]
    pub fn query_output(&self, device: NameId, port: Option<NameId>) -> Option<Signal> {
        self.devices.output_signal(device, port)
    }

    /// Level seen by one input slot: the referenced upstream output's
    /// current level, BLANK if the slot is unconnected.
    fn input_level(&self, device: &Device, port: NameId) -> Signal {
        device
            .inputs
            .get(&port)
            .copied()
            .flatten()
            .and_then(|r| self.devices.output_signal(r.device, r.port))
            .unwrap_or(Signal::Blank)
    }

    /// Advances the network by one cycle.
    ///
    /// Phase order is fixed and observable through monitors: clock
    /// pre-phase, D-type sampling, combinational settle, clock post-phase,
    /// RC update. Returns `false` if the combinational sub-network failed
    /// to settle within the iteration bound.
    pub fn step(&mut self) -> bool {
        self.clock_pre_phase();
        self.dtype_sample();
        if !self.settle() {
            return false;
        }
        self.clock_post_phase();
        self.rc_update();
        true
    }

    /// Clocks whose counter reached zero flip their stored level and emit
    /// the matching transient for the rest of this step.
    fn clock_pre_phase(&mut self) {
        for device in self.devices.iter_mut() {
            if let DeviceState::Clock { counter, level, .. } = &mut device.state {
                if *counter == 0 {
                    let going_high = *level != Signal::High;
                    *level = Signal::steady(going_high);
                    let transient = if going_high {
                        Signal::Rising
                    } else {
                        Signal::Falling
                    };
                    device.outputs.insert(None, transient);
                }
            }
        }
    }

    /// Edge-triggered D-type update. CLK must read exactly RISING for the
    /// stored bit to latch DATA; SET and CLEAR override asynchronously,
    /// with SET winning ties.
    fn dtype_sample(&mut self) {
        let ports = *self.devices.ports();
        for id in self.devices.find_by_kind(DeviceKind::DType) {
            let Some(device) = self.devices.get(id) else {
                continue;
            };
            let clk = self.input_level(device, ports.clk);
            let data = self.input_level(device, ports.data);
            let set = self.input_level(device, ports.set);
            let clear = self.input_level(device, ports.clear);

            let Some(device) = self.devices.get_mut(id) else {
                continue;
            };
            if let DeviceState::DType { memory } = &mut device.state {
                if clk == Signal::Rising {
                    *memory = Signal::steady(data.is_high());
                }
                if clear.is_high() {
                    *memory = Signal::Low;
                }
                if set.is_high() {
                    *memory = Signal::High;
                }
                let q = *memory;
                device.outputs.insert(Some(ports.q), q);
                device
                    .outputs
                    .insert(Some(ports.qbar), Signal::steady(!q.is_high()));
            }
        }
    }

    /// Re-evaluates every gate in place until a full pass changes nothing.
    ///
    /// The iteration bound caps feedback loops that have no stable point
    /// (e.g. an inverter feeding itself); exceeding it reports oscillation.
    fn settle(&mut self) -> bool {
        let gates: Vec<NameId> = self
            .devices
            .iter()
            .filter(|d| d.kind.is_gate())
            .map(|d| d.id)
            .collect();
        let max_iterations = 3 * self.devices.len() + 10;

        for _ in 0..max_iterations {
            let mut changed = false;
            for &id in &gates {
                let Some(new_level) = self.evaluate_gate(id) else {
                    continue;
                };
                let Some(device) = self.devices.get_mut(id) else {
                    continue;
                };
                if let Some(slot) = device.outputs.get_mut(&None) {
                    if *slot != new_level {
                        *slot = new_level;
                        changed = true;
                    }
                }
            }
            if !changed {
                return true;
            }
        }
        tracing::debug!(
            gates = gates.len(),
            bound = max_iterations,
            "combinational settle exceeded iteration bound"
        );
        false
    }

    fn evaluate_gate(&self, id: NameId) -> Option<Signal> {
        let device = self.devices.get(id)?;
        let total = device.inputs.len();
        let high = device
            .inputs
            .keys()
            .filter(|&&port| self.input_level(device, port).is_high())
            .count();
        let level = match device.kind {
            DeviceKind::And => Signal::steady(high == total),
            DeviceKind::Nand => Signal::steady(high != total),
            DeviceKind::Or => Signal::steady(high > 0),
            DeviceKind::Nor => Signal::steady(high == 0),
            DeviceKind::Xor => Signal::steady(high == 1),
            _ => return None,
        };
        Some(level)
    }

    /// Counters tick down; a clock that toggled this step trades its
    /// transient for the new steady level before monitors sample.
    fn clock_post_phase(&mut self) {
        for device in self.devices.iter_mut() {
            if let DeviceState::Clock {
                half_period,
                counter,
                ..
            } = &mut device.state
            {
                if *counter == 0 {
                    *counter = *half_period;
                }
                *counter -= 1;
                if let Some(out) = device.outputs.get_mut(&None) {
                    match *out {
                        Signal::Rising => *out = Signal::High,
                        Signal::Falling => *out = Signal::Low,
                        _ => {}
                    }
                }
            }
        }
    }

    /// RC outputs stay HIGH while `elapsed <= duration`, LOW after. Only
    /// `cold_startup` rewinds them.
    fn rc_update(&mut self) {
        for device in self.devices.iter_mut() {
            if let DeviceState::Rc { duration, elapsed } = &mut device.state {
                *elapsed = elapsed.saturating_add(1);
                let high = *elapsed <= *duration;
                device.outputs.insert(None, Signal::steady(high));
            }
        }
    }
}
