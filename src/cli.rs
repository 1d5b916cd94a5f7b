use std::path::PathBuf;

use clap::Parser;

/// A cycle-accurate digital-logic circuit simulator.
/// Parses a plain-text circuit definition file, simulates the network in
/// discrete time, and prints the monitored signal traces.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "A cycle-accurate digital-logic circuit simulator.\n\
Parses a plain-text circuit definition file (gates, switches, clocks, D-type\n\
flip-flops, RC pulses), simulates the network in discrete time, and prints the\n\
monitored signal traces.\n\
\n\
EXAMPLES:\n\
  # Batch mode - run 20 cycles and print text waveforms:\n\
  gatesim circuit.txt\n\
\n\
  # Longer run with a fixed clock-phase seed:\n\
  gatesim circuit.txt --steps 100 --seed 7\n\
\n\
  # Machine-readable traces:\n\
  gatesim circuit.txt --json\n\
\n\
  # Interactive console (run/continue, flip switches, edit monitors):\n\
  gatesim -c circuit.txt\n\
\n\
See README for the definition-file grammar."
)]
pub struct Args {
    /// Path to the circuit definition file (must end in .txt).
    pub path: PathBuf,

    /// Run the interactive text console instead of batch mode.
    #[arg(short = 'c', long, action = clap::ArgAction::SetTrue)]
    pub console: bool,

    /// Number of simulation cycles to run in batch mode.
    #[arg(short = 's', long, default_value = "20", value_name = "N")]
    pub steps: usize,

    /// Seed for the clock phase randomisation at cold start.
    #[arg(long, default_value = "0", value_name = "SEED")]
    pub seed: u64,

    /// Emit the monitor snapshot as JSON instead of text waveforms.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}
