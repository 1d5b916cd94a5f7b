//! Parser tests: clean files, error recovery, error counts and the
//! semantic-suppression rule.

use gatesim::report::{ErrorKind, ParseReport};
use gatesim::simulator::{LoadError, Simulator};

fn parse_ok(source: &str) -> Simulator {
    match Simulator::from_source(source) {
        Ok(simulator) => simulator,
        Err(err) => panic!("expected clean parse, got: {err}"),
    }
}

fn parse_err(source: &str) -> ParseReport {
    match Simulator::from_source(source) {
        Ok(_) => panic!("expected parse failure"),
        Err(LoadError::Parse(report)) => report,
        Err(other) => panic!("expected recoverable errors, got: {other}"),
    }
}

const DFF_EXAMPLE: &str = "\
DEVICES:
  CLOCK CK(2);
  SWITCH SW1(0), SW2(1);
  AND A1(2);
  DTYPE D1;
CONNECTIONS:
  SW1 > A1.I1;
  SW2 > A1.I2;
  A1  > D1.DATA;
  CK  > D1.CLK;
  SW1 > D1.SET;
  SW2 > D1.CLEAR;
MONITOR D1.Q, A1;
";

#[test]
fn parses_the_clocked_flipflop_example() {
    let simulator = parse_ok(DFF_EXAMPLE);
    assert!(simulator.check_network());
    let (monitored, _) = simulator.signal_names();
    assert_eq!(monitored, ["D1.Q", "A1"]);
}

#[test]
fn every_input_holds_a_live_output_reference_after_parse() {
    let simulator = parse_ok(DFF_EXAMPLE);
    let network = simulator.network();
    for device in network.devices().iter() {
        for (port, slot) in &device.inputs {
            let reference = slot.unwrap_or_else(|| {
                panic!("input {:?} of {:?} unconnected", port, device.id)
            });
            assert!(
                network.query_output(reference.device, reference.port).is_some(),
                "dangling reference out of {:?}",
                device.id
            );
        }
    }
}

#[test]
fn empty_sections_parse_cleanly() {
    let simulator = parse_ok("DEVICES:\nCONNECTIONS:\n");
    assert!(simulator.check_network());
}

#[test]
fn comments_are_transparent() {
    let source = "\
DEVICES: # declare everything first
  SWITCH A(1); ### a block
  comment spanning lines ###
CONNECTIONS:
MONITOR A;
";
    parse_ok(source);
}

#[test]
fn bare_devices_keyword_counts_two_errors() {
    let report = parse_err("DEVICES");
    assert_eq!(report.error_count, 2);
    assert_eq!(report.diagnostics.last().unwrap().kind, ErrorKind::UnexpectedEof);
}

#[test]
fn three_missing_semicolons_count_four_errors() {
    // Terminators are missing on the AND line and on the first and last
    // connection lines.
    let source = "\
DEVICES:
AND G1(2)
SWITCH SW1(0), SW2(1);
CONNECTIONS:
SW1 > G1.I1
SW2 > G1.I2;
SW1 > G1.I1
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 4);
    // Three resynchronising syntax errors, then the unexpected EOF.
    assert_eq!(report.diagnostics.len(), 4);
    assert_eq!(report.diagnostics[3].kind, ErrorKind::UnexpectedEof);
    assert!(report.diagnostics[..3]
        .iter()
        .all(|d| matches!(d.kind, ErrorKind::ExpectedSymbol(_))));
}

#[test]
fn parsing_a_broken_file_twice_gives_the_same_count() {
    let source = "\
DEVICES:
AND G1(2)
SWITCH SW1(0), SW2(1);
CONNECTIONS:
SW1 > G1.I1
";
    let first = parse_err(source).error_count;
    let second = parse_err(source).error_count;
    assert_eq!(first, second);
}

#[test]
fn invalid_qualifier_is_a_single_semantic_error() {
    let source = "\
DEVICES:
SWITCH SW1(2);
CONNECTIONS:
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 1);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind.to_string(), "Error: Invalid device qualifier.");
    // Raised at the terminating semicolon of the broken instantiation.
    assert_eq!(diagnostic.source_line, "SWITCH SW1(2);");
}

#[test]
fn unconnected_inputs_fail_the_final_check() {
    let source = "\
DEVICES:
AND G1(2);
CONNECTIONS:
MONITOR G1;
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.diagnostics[0].kind, ErrorKind::NetworkInputsUnconnected);
}

#[test]
fn device_instantiation_diagnostic_is_printed_once_but_counted_always() {
    let source = "\
DEVICES:
FOO;
BAR;
CLOCK CK(1);
CONNECTIONS:
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 2);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0]
        .render()
        .contains("Future errors of this type have been suppressed."));
}

#[test]
fn double_connection_is_reported_then_semantics_stop() {
    let source = "\
DEVICES:
SWITCH A(0), B(1);
AND G(2);
CONNECTIONS:
A > G.I1;
B > G.I1;
B > G.I2;
MONITOR G;
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 1);
    assert_eq!(
        report.diagnostics[0].kind.to_string(),
        "Error: Input already has a connection."
    );
}

#[test]
fn connection_to_unknown_device_is_reported() {
    let source = "\
DEVICES:
SWITCH A(0);
CONNECTIONS:
A > G.I1;
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 1);
    assert_eq!(
        report.diagnostics[0].kind.to_string(),
        "Error: Device has not been defined."
    );
}

#[test]
fn monitoring_the_same_output_twice_is_an_error() {
    let source = "\
DEVICES:
SWITCH A(0);
CONNECTIONS:
MONITOR A, A;
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 1);
    assert_eq!(
        report.diagnostics[0].kind.to_string(),
        "Error: An output is being monitored more than once."
    );
}

#[test]
fn trailing_tokens_after_monitor_are_rejected() {
    let source = "\
DEVICES:
SWITCH A(0);
CONNECTIONS:
MONITOR A;
SWITCH
";
    let report = parse_err(source);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.diagnostics[0].kind, ErrorKind::ExpectedEof);
}

#[test]
fn report_summary_names_the_total() {
    let report = parse_err("DEVICES");
    let rendered = report.to_string();
    assert!(rendered.contains("Circuit creation failed due to 2 detected error(s)."));
    assert!(rendered.contains("Circuit creation is abandoned after the first error,"));
    assert!(rendered.contains("so subsequent semantic errors are not detected."));
}

#[test]
fn caret_diagnostics_point_at_the_offending_column() {
    let source = "\
DEVICES:
SWITCH SW1(2);
CONNECTIONS:
";
    let report = parse_err(source);
    let rendered = report.diagnostics[0].render();
    // The caret sits under the semicolon, column 14.
    assert!(rendered.contains("SWITCH SW1(2);\n             ^"), "{rendered}");
    assert!(rendered.contains("(Line 2) Error: Invalid device qualifier."));
}
