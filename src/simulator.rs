//! Driver facade tying the front end and the engine together.
//!
//! Display layers (batch waveforms, the console REPL, anything graphical)
//! talk to [`Simulator`] only: load a definition file, run or continue a
//! number of cycles, flip switches, manage monitors, take snapshots.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::devices::{DeviceError, DeviceStore, Signal};
use crate::monitors::{MonitorError, Monitors, TraceSnapshot};
use crate::names::{NameId, NameTable};
use crate::network::Network;
use crate::parser::Parser;
use crate::report::ParseReport;
use crate::scanner::{LexError, Scanner};

/// Failures while turning a definition file into a runnable simulator.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Definition files must carry the `.txt` extension.
    #[error("Error: Incorrect file type")]
    BadExtension,
    #[error("Error: File path does not exist.")]
    Io(#[from] std::io::Error),
    /// Fatal lexical error; the session is abandoned.
    #[error("Error: {0}")]
    Lex(#[from] LexError),
    /// One or more recoverable errors; the report carries the diagnostics
    /// and the total count.
    #[error("{0}")]
    Parse(ParseReport),
}

/// Failures while stepping the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunError {
    /// The combinational sub-network failed to settle. `completed` steps
    /// were recorded before the failing one.
    #[error("Error! Network oscillating.")]
    Oscillation { completed: usize },
    /// `continue_run` before any `run`.
    #[error("Nothing to continue. Run first.")]
    NotStarted,
    /// Not every input is connected; the simulator refuses to run.
    #[error("Error: There are unconnected inputs in the network.")]
    Unconnected,
}

/// Failures from the string-addressed control surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("Unknown signal: {0}")]
    UnknownSignal(String),
    #[error("Error: {0}")]
    Device(#[from] DeviceError),
    #[error("Error: {0}")]
    Monitor(#[from] MonitorError),
}

/// A parsed, runnable circuit.
pub struct Simulator {
    names: NameTable,
    network: Network,
    monitors: Monitors,
    seed: u64,
    started: bool,
}

impl Simulator {
    /// Loads and parses a definition file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let extension = path.extension().and_then(std::ffi::OsStr::to_str);
        if extension != Some("txt") {
            return Err(LoadError::BadExtension);
        }
        let source = fs::read_to_string(path)?;
        Self::from_source(&source)
    }

    /// Parses an in-memory definition text.
    pub fn from_source(source: &str) -> Result<Self, LoadError> {
        let mut names = NameTable::new();
        let scanner = Scanner::new(source, &mut names);
        let mut network = Network::new(DeviceStore::new(&mut names));
        let mut monitors = Monitors::new();

        let report = Parser::new(&mut names, &mut network, &mut monitors, scanner).parse()?;
        if !report.is_ok() {
            return Err(LoadError::Parse(report));
        }
        Ok(Simulator {
            names,
            network,
            monitors,
            seed: 0,
            started: false,
        })
    }

    /// Seed for clock phase randomisation at the next cold start. A fixed
    /// seed makes `run` reproducible down to the snapshot bytes.
    pub fn set_clock_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Read access to the parsed circuit, for display layers that want to
    /// walk the device graph themselves.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Read access to the session's name table.
    #[must_use]
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// True when every input slot of every device is connected.
    #[must_use]
    pub fn check_network(&self) -> bool {
        self.network.check_all_inputs_connected()
    }

    /// Cold-starts the circuit and steps it `n` times, recording monitors
    /// after each completed step.
    pub fn run(&mut self, n: usize) -> Result<(), RunError> {
        if !self.check_network() {
            return Err(RunError::Unconnected);
        }
        self.network.devices_mut().cold_startup(self.seed);
        self.monitors.reset();
        self.started = true;
        tracing::debug!(steps = n, seed = self.seed, "cold start");
        self.step_many(n)
    }

    /// Steps `n` more times without resetting device state or traces.
    pub fn continue_run(&mut self, n: usize) -> Result<(), RunError> {
        if !self.started {
            return Err(RunError::NotStarted);
        }
        self.step_many(n)
    }

    fn step_many(&mut self, n: usize) -> Result<(), RunError> {
        for completed in 0..n {
            if !self.network.step() {
                tracing::debug!(completed, "oscillation detected, stepping stopped");
                return Err(RunError::Oscillation { completed });
            }
            self.monitors.record_step(&self.network);
        }
        Ok(())
    }

    /// Flips a switch by name.
    pub fn set_switch(&mut self, name: &str, on: bool) -> Result<(), ControlError> {
        let id = self
            .names
            .query(name)
            .ok()
            .flatten()
            .ok_or_else(|| ControlError::UnknownSignal(name.to_owned()))?;
        self.network
            .devices_mut()
            .set_switch(id, Signal::steady(on))?;
        Ok(())
    }

    /// Starts monitoring a signal named `DEVICE` or `DEVICE.PORT`.
    pub fn add_monitor(&mut self, spec: &str) -> Result<(), ControlError> {
        let (device, port) = self.parse_signal_spec(spec)?;
        self.monitors.make_monitor(device, port, &self.network)?;
        Ok(())
    }

    /// Stops monitoring a signal, discarding its trace.
    pub fn remove_monitor(&mut self, spec: &str) -> Result<(), ControlError> {
        let (device, port) = self.parse_signal_spec(spec)?;
        if self.monitors.remove_monitor(device, port) {
            Ok(())
        } else {
            Err(ControlError::UnknownSignal(spec.to_owned()))
        }
    }

    /// Monitored and unmonitored signal names, in declaration order.
    #[must_use]
    pub fn signal_names(&self) -> (Vec<String>, Vec<String>) {
        self.monitors.signal_names(&self.network, &self.names)
    }

    /// Copies of every monitored trace.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TraceSnapshot> {
        self.monitors.snapshot(&self.names)
    }

    /// Resolves a `DEVICE` / `DEVICE.PORT` string against the name table.
    fn parse_signal_spec(&self, spec: &str) -> Result<(NameId, Option<NameId>), ControlError> {
        let (device, port) = match spec.split_once('.') {
            Some((device, port)) => (device, Some(port)),
            None => (spec, None),
        };
        let device_id = self
            .names
            .query(device)
            .ok()
            .flatten()
            .ok_or_else(|| ControlError::UnknownSignal(spec.to_owned()))?;
        let port_id = match port {
            Some(port) => Some(
                self.names
                    .query(port)
                    .ok()
                    .flatten()
                    .ok_or_else(|| ControlError::UnknownSignal(spec.to_owned()))?,
            ),
            None => None,
        };
        Ok((device_id, port_id))
    }
}
