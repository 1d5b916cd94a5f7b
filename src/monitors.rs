//! Per-signal trace recording.
//!
//! A monitor targets one `(device, output-port)` pair and appends the
//! target's level once per simulated step. Traces therefore stay parallel
//! in length, which the display layers rely on.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::devices::Signal;
use crate::names::{NameId, NameTable};
use crate::network::Network;

/// Failures from monitor creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("Not a valid output for this device.")]
    NotAnOutput,
    #[error("An output is being monitored more than once.")]
    AlreadyMonitored,
    #[error("Device has not been defined.")]
    DeviceAbsent,
}

/// One recorded trace in driver-facing form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSnapshot {
    pub name: String,
    pub levels: Vec<Signal>,
}

/// The monitor set, in creation order.
#[derive(Default)]
pub struct Monitors {
    traces: IndexMap<(NameId, Option<NameId>), Vec<Signal>>,
}

impl Monitors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts monitoring an output. The new trace begins empty; historical
    /// samples are never back-filled.
    pub fn make_monitor(
        &mut self,
        device: NameId,
        port: Option<NameId>,
        network: &Network,
    ) -> Result<(), MonitorError> {
        let target = network.devices().get(device).ok_or(MonitorError::DeviceAbsent)?;
        if !target.outputs.contains_key(&port) {
            return Err(MonitorError::NotAnOutput);
        }
        if self.traces.contains_key(&(device, port)) {
            return Err(MonitorError::AlreadyMonitored);
        }
        self.traces.insert((device, port), Vec::new());
        Ok(())
    }

    /// Stops monitoring an output, discarding its trace. Returns whether a
    /// monitor existed.
    pub fn remove_monitor(&mut self, device: NameId, port: Option<NameId>) -> bool {
        self.traces.shift_remove(&(device, port)).is_some()
    }

    /// Appends the current level of every monitored target. Called by the
    /// driver after each successful `Network::step`.
    pub fn record_step(&mut self, network: &Network) {
        for (&(device, port), trace) in &mut self.traces {
            let level = network.query_output(device, port).unwrap_or(Signal::Blank);
            trace.push(level);
        }
    }

    /// Clears every recorded sequence (cold startup). Monitors themselves
    /// stay in place.
    pub fn reset(&mut self) {
        for trace in self.traces.values_mut() {
            trace.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    #[must_use]
    pub fn contains(&self, device: NameId, port: Option<NameId>) -> bool {
        self.traces.contains_key(&(device, port))
    }

    pub fn iter(&self) -> impl Iterator<Item = ((NameId, Option<NameId>), &[Signal])> {
        self.traces.iter().map(|(&key, trace)| (key, trace.as_slice()))
    }

    /// `DEVICE` or `DEVICE.PORT` display form of a signal.
    #[must_use]
    pub fn signal_name(names: &NameTable, device: NameId, port: Option<NameId>) -> String {
        let device_name = names.get_string(device).unwrap_or("?");
        match port.and_then(|p| names.get_string(p)) {
            Some(port_name) => format!("{device_name}.{port_name}"),
            None => device_name.to_owned(),
        }
    }

    /// Splits every output in the network into monitored and unmonitored
    /// display names, both in declaration order.
    #[must_use]
    pub fn signal_names(&self, network: &Network, names: &NameTable) -> (Vec<String>, Vec<String>) {
        let monitored = self
            .traces
            .keys()
            .map(|&(device, port)| Self::signal_name(names, device, port))
            .collect();
        let unmonitored = network
            .devices()
            .iter()
            .flat_map(|d| d.outputs.keys().map(move |&port| (d.id, port)))
            .filter(|&(device, port)| !self.traces.contains_key(&(device, port)))
            .map(|(device, port)| Self::signal_name(names, device, port))
            .collect();
        (monitored, unmonitored)
    }

    /// Driver-facing copy of every trace.
    #[must_use]
    pub fn snapshot(&self, names: &NameTable) -> Vec<TraceSnapshot> {
        self.traces
            .iter()
            .map(|(&(device, port), trace)| TraceSnapshot {
                name: Self::signal_name(names, device, port),
                levels: trace.clone(),
            })
            .collect()
    }
}
