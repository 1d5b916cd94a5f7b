// Main application entry point.
// Parses command-line arguments, loads the definition file, and hands the
// simulator to either the batch runner or the interactive console.

use std::process::exit;

use colored::Colorize;

use gatesim::cli;
use gatesim::console;
use gatesim::simulator::{LoadError, RunError, Simulator};
use gatesim::waveform;

fn main() {
    // Logging goes to stderr so stdout stays clean for waveforms/JSON.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let mut simulator = match Simulator::load(&args.path) {
        Ok(simulator) => simulator,
        Err(LoadError::Parse(report)) => {
            // The report carries the caret diagnostics and the final
            // error-count summary; print it verbatim.
            eprint!("{report}");
            exit(1);
        }
        Err(err) => {
            eprintln!("{}", err.to_string().red().bold());
            exit(1);
        }
    };
    simulator.set_clock_seed(args.seed);

    if args.console {
        if let Err(err) = console::run(&mut simulator) {
            eprintln!("{} {}", "Console I/O error:".red().bold(), err);
            exit(1);
        }
        return;
    }

    // Batch mode: one cold-started run, then the traces.
    let outcome = simulator.run(args.steps);
    match outcome {
        Ok(()) => {}
        Err(err @ RunError::Oscillation { .. }) => {
            // Partial traces are still worth showing.
            eprintln!("{}", err.to_string().yellow().bold());
        }
        Err(err) => {
            eprintln!("{}", err.to_string().red().bold());
            exit(1);
        }
    }

    let snapshot = simulator.snapshot();
    if args.json {
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("{} {}", "Failed to serialise snapshot:".red().bold(), err);
                exit(1);
            }
        }
    } else {
        print!("{}", waveform::render(&snapshot));
    }

    if matches!(outcome, Err(RunError::Oscillation { .. })) {
        exit(2);
    }
}
