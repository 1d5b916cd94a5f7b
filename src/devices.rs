//! Device primitives: gates, switches, clocks, D-type flip-flops and RC
//! pulse generators, plus the store that owns them.
//!
//! Devices reference each other only by interned ID; the store is a flat
//! insertion-ordered map, so the connection graph can be cyclic without any
//! ownership cycles.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::names::{NameId, NameTable};

/// Signal level on an output.
///
/// `Rising` and `Falling` are transient levels emitted by clocks in the
/// half-step where they toggle; D-type edge detection reads them raw, while
/// gate evaluation coerces them to their steady equivalents. `Blank` marks a
/// combinational output that has not been evaluated yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Low,
    High,
    Rising,
    Falling,
    Blank,
}

impl Signal {
    /// Functional coercion for gate truth tables: RISING counts as HIGH,
    /// FALLING as LOW, and BLANK as LOW.
    #[inline]
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Signal::High | Signal::Rising)
    }

    /// Steady level from a boolean.
    #[inline]
    #[must_use]
    pub fn steady(high: bool) -> Self {
        if high {
            Signal::High
        } else {
            Signal::Low
        }
    }
}

/// The primitive device kinds of the definition language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Switch,
    Clock,
    DType,
    Rc,
}

impl DeviceKind {
    /// True for devices re-evaluated during the combinational settle.
    #[inline]
    #[must_use]
    pub fn is_gate(self) -> bool {
        matches!(
            self,
            DeviceKind::And | DeviceKind::Nand | DeviceKind::Or | DeviceKind::Nor | DeviceKind::Xor
        )
    }
}

/// Reference from an input slot to the upstream output that drives it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputRef {
    pub device: NameId,
    /// `None` addresses a device's single anonymous output.
    pub port: Option<NameId>,
}

/// Per-kind device state.
#[derive(Clone, Debug)]
pub enum DeviceState {
    Gate,
    Switch {
        level: Signal,
    },
    Clock {
        half_period: u32,
        /// Cycles until the next toggle. A zero counter toggles in the next
        /// step's clock pre-phase.
        counter: u32,
        level: Signal,
    },
    DType {
        memory: Signal,
    },
    Rc {
        duration: u32,
        elapsed: u32,
    },
}

/// One device instance: identity, state, input slots and output levels.
///
/// Input ports always carry a real name (`I1..IK`, `DATA`, ...). The output
/// map is keyed by `Option<NameId>` so the single anonymous output of most
/// devices is a distinguished key, not an ID collision.
#[derive(Clone, Debug)]
pub struct Device {
    pub id: NameId,
    pub kind: DeviceKind,
    pub state: DeviceState,
    pub inputs: IndexMap<NameId, Option<OutputRef>>,
    pub outputs: IndexMap<Option<NameId>, Signal>,
}

/// Failures from device construction and switch flipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("Device with this name has already been instantiated.")]
    AlreadyExists,
    #[error("Bad device type.")]
    BadKind,
    #[error("No device qualifier.")]
    NoQualifier,
    #[error("Invalid device qualifier.")]
    BadQualifier,
    #[error("Device qualifier present when there should be none.")]
    QualifierForbidden,
    #[error("Device is not a switch.")]
    NotASwitch,
}

/// Interned IDs of the reserved port names.
#[derive(Clone, Copy, Debug)]
pub struct PortNames {
    inputs: [NameId; 16],
    pub data: NameId,
    pub clk: NameId,
    pub set: NameId,
    pub clear: NameId,
    pub q: NameId,
    pub qbar: NameId,
}

impl PortNames {
    fn intern(names: &mut NameTable) -> Self {
        let input_names: Vec<String> = (1..=16).map(|n| format!("I{n}")).collect();
        let refs: Vec<&str> = input_names.iter().map(String::as_str).collect();
        let inputs: [NameId; 16] = names
            .lookup(&refs)
            .try_into()
            .expect("sixteen gate input names");
        let [data, clk, set, clear, q, qbar] = names
            .lookup(&["DATA", "CLK", "SET", "CLEAR", "Q", "QBAR"])
            .try_into()
            .expect("six reserved port names");
        PortNames {
            inputs,
            data,
            clk,
            set,
            clear,
            q,
            qbar,
        }
    }

    /// `I1..IK` for a gate with `k` inputs.
    #[must_use]
    pub fn gate_inputs(&self, k: u32) -> &[NameId] {
        &self.inputs[..k as usize]
    }
}

/// Flat container of every device in the circuit, keyed and ordered by
/// declaration.
pub struct DeviceStore {
    devices: IndexMap<NameId, Device>,
    ports: PortNames,
}

impl DeviceStore {
    pub fn new(names: &mut NameTable) -> Self {
        DeviceStore {
            devices: IndexMap::new(),
            ports: PortNames::intern(names),
        }
    }

    #[must_use]
    pub fn ports(&self) -> &PortNames {
        &self.ports
    }

    #[must_use]
    pub fn get(&self, id: NameId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NameId) -> Option<&mut Device> {
        self.devices.get_mut(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.values_mut()
    }

    /// IDs of every device of the given kind, in declaration order.
    #[must_use]
    pub fn find_by_kind(&self, kind: DeviceKind) -> Vec<NameId> {
        self.devices
            .values()
            .filter(|d| d.kind == kind)
            .map(|d| d.id)
            .collect()
    }

    /// Current level of an output port, if the device and port exist.
    #[must_use]
    pub fn output_signal(&self, device: NameId, port: Option<NameId>) -> Option<Signal> {
        self.devices.get(&device)?.outputs.get(&port).copied()
    }

    /// Creates and registers a device, validating its qualifier and
    /// populating its port slots.
    pub fn make_device(
        &mut self,
        id: NameId,
        kind: DeviceKind,
        qualifier: Option<u32>,
    ) -> Result<(), DeviceError> {
        if self.devices.contains_key(&id) {
            return Err(DeviceError::AlreadyExists);
        }

        let mut inputs = IndexMap::new();
        let mut outputs = IndexMap::new();
        let state = match kind {
            DeviceKind::And | DeviceKind::Nand | DeviceKind::Or | DeviceKind::Nor => {
                let n = qualifier.ok_or(DeviceError::NoQualifier)?;
                if !(1..=16).contains(&n) {
                    return Err(DeviceError::BadQualifier);
                }
                for &port in self.ports.gate_inputs(n) {
                    inputs.insert(port, None);
                }
                outputs.insert(None, Signal::Blank);
                DeviceState::Gate
            }
            DeviceKind::Xor => {
                if qualifier.is_some() {
                    return Err(DeviceError::QualifierForbidden);
                }
                for &port in self.ports.gate_inputs(2) {
                    inputs.insert(port, None);
                }
                outputs.insert(None, Signal::Blank);
                DeviceState::Gate
            }
            DeviceKind::Switch => {
                let level = match qualifier.ok_or(DeviceError::NoQualifier)? {
                    0 => Signal::Low,
                    1 => Signal::High,
                    _ => return Err(DeviceError::BadQualifier),
                };
                outputs.insert(None, level);
                DeviceState::Switch { level }
            }
            DeviceKind::Clock => {
                let half_period = qualifier.ok_or(DeviceError::NoQualifier)?;
                if half_period == 0 {
                    return Err(DeviceError::BadQualifier);
                }
                outputs.insert(None, Signal::Low);
                DeviceState::Clock {
                    half_period,
                    counter: 0,
                    level: Signal::Low,
                }
            }
            DeviceKind::DType => {
                if qualifier.is_some() {
                    return Err(DeviceError::QualifierForbidden);
                }
                for port in [self.ports.data, self.ports.clk, self.ports.set, self.ports.clear] {
                    inputs.insert(port, None);
                }
                outputs.insert(Some(self.ports.q), Signal::Low);
                outputs.insert(Some(self.ports.qbar), Signal::High);
                DeviceState::DType {
                    memory: Signal::Low,
                }
            }
            DeviceKind::Rc => {
                let duration = qualifier.ok_or(DeviceError::NoQualifier)?;
                if duration == 0 {
                    return Err(DeviceError::BadQualifier);
                }
                outputs.insert(None, Signal::High);
                DeviceState::Rc {
                    duration,
                    elapsed: 0,
                }
            }
        };

        self.devices.insert(
            id,
            Device {
                id,
                kind,
                state,
                inputs,
                outputs,
            },
        );
        Ok(())
    }

    /// Flips a switch to the given steady level.
    pub fn set_switch(&mut self, id: NameId, level: Signal) -> Result<(), DeviceError> {
        let device = self.devices.get_mut(&id).ok_or(DeviceError::NotASwitch)?;
        match &mut device.state {
            DeviceState::Switch { level: stored } => {
                *stored = level;
                device.outputs.insert(None, level);
                Ok(())
            }
            _ => Err(DeviceError::NotASwitch),
        }
    }

    /// Resets every stateful device to its power-on state.
    ///
    /// Clocks randomise their phase offset from the seeded PRNG and restart
    /// LOW; D-types clear their stored bit; RCs restart their HIGH pulse;
    /// gate outputs return to BLANK until the first settle.
    pub fn cold_startup(&mut self, seed: u64) {
        let mut rng = fastrand::Rng::with_seed(seed);
        for device in self.devices.values_mut() {
            match &mut device.state {
                DeviceState::Gate => {
                    for level in device.outputs.values_mut() {
                        *level = Signal::Blank;
                    }
                }
                DeviceState::Switch { level } => {
                    device.outputs.insert(None, *level);
                }
                DeviceState::Clock {
                    half_period,
                    counter,
                    level,
                } => {
                    *counter = rng.u32(0..*half_period);
                    *level = Signal::Low;
                    device.outputs.insert(None, Signal::Low);
                }
                DeviceState::DType { memory } => {
                    *memory = Signal::Low;
                    device.outputs.insert(Some(self.ports.q), Signal::Low);
                    device.outputs.insert(Some(self.ports.qbar), Signal::High);
                }
                DeviceState::Rc { elapsed, .. } => {
                    *elapsed = 0;
                    device.outputs.insert(None, Signal::High);
                }
            }
        }
    }
}
