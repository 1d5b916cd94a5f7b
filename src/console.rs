//! Interactive text console over a loaded simulator.
//!
//! A thin command loop; all simulation behaviour lives behind the
//! [`Simulator`] facade.

use std::io::{self, BufRead, Write};

use crate::simulator::Simulator;
use crate::waveform;

const HELP: &str = "\
Commands:
  h            - print this help
  r N          - cold-start and run N cycles
  c N          - continue for N more cycles
  s NAME 0|1   - set a switch LOW or HIGH
  m SIGNAL     - monitor a signal (NAME or NAME.PORT)
  z SIGNAL     - stop monitoring a signal
  l            - list monitored and unmonitored signals
  d            - display the recorded traces
  q            - quit";

fn parse_count(word: Option<&str>) -> Option<usize> {
    word.and_then(|w| w.parse().ok())
}

/// Runs the command loop until `q` or EOF.
pub fn run(simulator: &mut Simulator) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    println!("Logic simulator console. Enter 'h' for help.");

    loop {
        print!("> ");
        stdout.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command {
            "h" => println!("{HELP}"),
            "r" => match parse_count(words.next()) {
                Some(n) => match simulator.run(n) {
                    Ok(()) => println!("Ran {n} cycle(s)."),
                    Err(err) => println!("{err}"),
                },
                None => println!("Usage: r N"),
            },
            "c" => match parse_count(words.next()) {
                Some(n) => match simulator.continue_run(n) {
                    Ok(()) => println!("Continued for {n} cycle(s)."),
                    Err(err) => println!("{err}"),
                },
                None => println!("Usage: c N"),
            },
            "s" => {
                let name = words.next();
                let level = words.next();
                match (name, level) {
                    (Some(name), Some("0" | "1")) => {
                        let on = level == Some("1");
                        match simulator.set_switch(name, on) {
                            Ok(()) => {}
                            Err(err) => println!("{err}"),
                        }
                    }
                    _ => println!("Usage: s NAME 0|1"),
                }
            }
            "m" => match words.next() {
                Some(spec) => match simulator.add_monitor(spec) {
                    Ok(()) => {}
                    Err(err) => println!("{err}"),
                },
                None => println!("Usage: m SIGNAL"),
            },
            "z" => match words.next() {
                Some(spec) => match simulator.remove_monitor(spec) {
                    Ok(()) => {}
                    Err(err) => println!("{err}"),
                },
                None => println!("Usage: z SIGNAL"),
            },
            "l" => {
                let (monitored, unmonitored) = simulator.signal_names();
                println!("Monitored:   {}", monitored.join(", "));
                println!("Unmonitored: {}", unmonitored.join(", "));
            }
            "d" => print!("{}", waveform::render(&simulator.snapshot())),
            "q" => break,
            _ => println!("Invalid command. Enter 'h' for help."),
        }
    }
    Ok(())
}
