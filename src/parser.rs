//! Recursive-descent parser with error recovery.
//!
//! Walks the token stream and drives the device, network and monitor
//! containers. Each production has a stopping symbol to resynchronise on
//! after a syntax error; semantic side-effects are suppressed from the
//! first error onwards, so a broken file reports its first semantic error
//! faithfully and every later syntactic one.

use crate::devices::{DeviceError, DeviceKind};
use crate::monitors::Monitors;
use crate::names::{NameId, NameTable};
use crate::network::{NetError, Network};
use crate::report::{Diagnostic, ErrorKind, ParseReport};
use crate::scanner::{Keywords, LexError, Scanner, Symbol, SymbolKind};

/// `(device, output-port)` named by an `output_id`.
type OutputSpec = (NameId, Option<NameId>);
/// `(device, input-port)` named by an `input_id`.
type InputSpec = (NameId, NameId);

/// Single-use parser over one definition text.
///
/// Fatal lexical errors abort the parse through `Result`; everything else
/// is recovered from and tallied in the returned [`ParseReport`].
pub struct Parser<'a> {
    names: &'a mut NameTable,
    network: &'a mut Network,
    monitors: &'a mut Monitors,
    scanner: Scanner,
    keywords: Keywords,
    symbol: Symbol,
    error_count: u32,
    diagnostics: Vec<Diagnostic>,
    instantiation_suppressed: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        names: &'a mut NameTable,
        network: &'a mut Network,
        monitors: &'a mut Monitors,
        scanner: Scanner,
    ) -> Self {
        let keywords = scanner.keywords();
        Parser {
            names,
            network,
            monitors,
            scanner,
            keywords,
            // Placeholder; parse() fetches the real first symbol before any
            // check can observe this.
            symbol: Symbol {
                kind: SymbolKind::Eof,
                id: None,
                value: None,
                line: 0,
                column: 1,
            },
            error_count: 0,
            diagnostics: Vec::new(),
            instantiation_suppressed: false,
        }
    }

    /// Parses the whole definition file, reporting every recoverable error.
    pub fn parse(mut self) -> Result<ParseReport, LexError> {
        self.symbol = self.scanner.next_symbol(self.names)?;

        // -- Device instantiation section
        let devices_kw = [self.keywords.devices];
        self.expect_keyword(&devices_kw, None)?;
        self.expect_symbol(SymbolKind::Colon, None)?;

        let device_types = self.keywords.device_types();
        loop {
            if self.symbol.kind == SymbolKind::Eof {
                self.report(ErrorKind::UnexpectedEof);
                return Ok(self.finish());
            } else if self.symbol_is_keyword(&device_types) {
                self.rule_device_instantiation()?;
            } else if self.symbol_is_keyword(&[self.keywords.connections]) {
                break;
            } else {
                self.handle_error(
                    ErrorKind::ExpectedDeviceInstantiation,
                    &[SymbolKind::Semicolon],
                )?;
                if self.symbol.kind != SymbolKind::Eof {
                    self.get_next_symbol()?;
                }
            }
        }

        // -- Connections section
        let connections_kw = [self.keywords.connections];
        self.expect_keyword(&connections_kw, None)?;
        self.expect_symbol(SymbolKind::Colon, None)?;

        loop {
            if self.symbol_is_keyword(&[self.keywords.monitor]) {
                self.rule_monitor()?;
                break;
            } else if self.symbol.kind == SymbolKind::Eof {
                break;
            } else if self.symbol.kind == SymbolKind::Name {
                self.rule_connection()?;
            } else {
                self.handle_error(ErrorKind::ExpectedConnection, &[SymbolKind::Semicolon])?;
                if self.symbol.kind != SymbolKind::Eof {
                    self.get_next_symbol()?;
                }
            }
        }

        // Anything after the monitor instruction is trailing garbage.
        if self.symbol.kind != SymbolKind::Eof {
            self.report(ErrorKind::ExpectedEof);
        }
        Ok(self.finish())
    }

    /// End-of-parse bookkeeping: connectivity check and the report.
    fn finish(mut self) -> ParseReport {
        if self.error_count == 0 && !self.network.check_all_inputs_connected() {
            self.report(ErrorKind::NetworkInputsUnconnected);
        }
        tracing::debug!(errors = self.error_count, "parse finished");
        ParseReport {
            diagnostics: self.diagnostics,
            error_count: self.error_count,
        }
    }

    /// Counts an error and records its diagnostic unless this kind has
    /// been suppressed.
    fn report(&mut self, kind: ErrorKind) {
        self.error_count += 1;
        if kind == ErrorKind::ExpectedDeviceInstantiation {
            if self.instantiation_suppressed {
                return;
            }
            self.instantiation_suppressed = true;
        }
        self.diagnostics.push(Diagnostic {
            line: self.symbol.line,
            column: self.symbol.column,
            source_line: self.scanner.line_text(self.symbol.line).to_owned(),
            kind,
        });
    }

    /// Reports an error, then resynchronises on the stopping symbols.
    fn handle_error(&mut self, kind: ErrorKind, stopping: &[SymbolKind]) -> Result<(), LexError> {
        self.report(kind);
        self.skip_to(stopping)
    }

    /// Advances until one of `stopping` or EOF is the current symbol.
    fn skip_to(&mut self, stopping: &[SymbolKind]) -> Result<(), LexError> {
        while !stopping.contains(&self.symbol.kind) && self.symbol.kind != SymbolKind::Eof {
            self.get_next_symbol()?;
        }
        Ok(())
    }

    /// Fetches the next symbol; pumping past EOF is itself an error.
    fn get_next_symbol(&mut self) -> Result<(), LexError> {
        if self.symbol.kind == SymbolKind::Eof {
            self.report(ErrorKind::UnexpectedEof);
            return Ok(());
        }
        self.symbol = self.scanner.next_symbol(self.names)?;
        Ok(())
    }

    fn symbol_is_keyword(&self, ids: &[NameId]) -> bool {
        self.symbol.kind == SymbolKind::Keyword
            && self.symbol.id.is_some_and(|id| ids.contains(&id))
    }

    /// Consumes the current symbol if it is one of the given keywords;
    /// otherwise reports and optionally resynchronises.
    fn expect_keyword(
        &mut self,
        ids: &[NameId],
        stopping: Option<&[SymbolKind]>,
    ) -> Result<bool, LexError> {
        if self.symbol_is_keyword(ids) {
            self.get_next_symbol()?;
            return Ok(true);
        }
        let words = ids
            .iter()
            .map(|&id| self.names.get_string(id).unwrap_or("?").to_owned())
            .collect();
        self.report(ErrorKind::ExpectedKeyword(words));
        if let Some(stopping) = stopping {
            self.skip_to(stopping)?;
        }
        Ok(false)
    }

    /// Consumes the current symbol if it has the given kind; otherwise
    /// reports and optionally resynchronises.
    fn expect_symbol(
        &mut self,
        kind: SymbolKind,
        stopping: Option<&[SymbolKind]>,
    ) -> Result<bool, LexError> {
        if self.symbol.kind == kind {
            self.get_next_symbol()?;
            return Ok(true);
        }
        self.report(ErrorKind::ExpectedSymbol(vec![kind]));
        if let Some(stopping) = stopping {
            self.skip_to(stopping)?;
        }
        Ok(false)
    }

    /// Parses `rule (sep rule)* stop`, resynchronising on `stop` when an
    /// element fails. Returns every element's outcome in order.
    fn one_or_more<R>(
        &mut self,
        mut rule: impl FnMut(&mut Self) -> Result<Option<R>, LexError>,
        sep: SymbolKind,
        stop: SymbolKind,
    ) -> Result<Vec<Option<R>>, LexError> {
        let mut results = vec![rule(self)?];
        loop {
            if self.symbol.kind == sep {
                self.get_next_symbol()?;
                let result = rule(self)?;
                let failed = result.is_none();
                results.push(result);
                if failed {
                    self.skip_to(&[stop])?;
                }
            } else if self.symbol.kind == stop {
                self.get_next_symbol()?;
                break;
            } else if self.symbol.kind == SymbolKind::Eof {
                self.report(ErrorKind::UnexpectedEof);
                break;
            } else {
                self.handle_error(ErrorKind::ExpectedSymbol(vec![sep, stop]), &[stop])?;
            }
        }
        Ok(results)
    }

    fn rule_device_instantiation(&mut self) -> Result<(), LexError> {
        let device_type = self.symbol.id;
        let device_types = self.keywords.device_types();
        if self.expect_keyword(&device_types, Some(&[SymbolKind::Semicolon]))? {
            self.one_or_more(
                |p| p.rule_device_name_init(device_type),
                SymbolKind::Comma,
                SymbolKind::Semicolon,
            )?;
        }
        Ok(())
    }

    fn rule_device_name_init(
        &mut self,
        device_type: Option<NameId>,
    ) -> Result<Option<()>, LexError> {
        let Some(device_name) = self.rule_device_identifier()? else {
            return Ok(None);
        };
        let mut qualifier = None;
        if self.symbol.kind == SymbolKind::BrackOpen {
            self.get_next_symbol()?;
            if self.symbol.kind == SymbolKind::Number {
                qualifier = self.symbol.value;
            }
            if self.expect_symbol(SymbolKind::Number, None)? {
                self.expect_symbol(SymbolKind::BrackClose, None)?;
            }
        }
        Ok(self.initialise_device(device_type, device_name, qualifier))
    }

    fn rule_connection(&mut self) -> Result<(), LexError> {
        match self.rule_output_identifier()? {
            None => self.skip_to(&[SymbolKind::Semicolon])?,
            Some(output) => {
                if self.expect_symbol(SymbolKind::Greater, Some(&[SymbolKind::Semicolon]))? {
                    match self.rule_input_identifier()? {
                        None => self.skip_to(&[SymbolKind::Semicolon])?,
                        Some(input) => self.make_connection(output, input),
                    }
                }
            }
        }
        if !self.expect_symbol(SymbolKind::Semicolon, Some(&[SymbolKind::Semicolon]))? {
            self.get_next_symbol()?;
        }
        Ok(())
    }

    fn rule_monitor(&mut self) -> Result<(), LexError> {
        let monitor_kw = [self.keywords.monitor];
        self.expect_keyword(&monitor_kw, None)?;
        let outputs = self.one_or_more(
            Self::rule_output_identifier,
            SymbolKind::Comma,
            SymbolKind::Semicolon,
        )?;
        for output in outputs.into_iter().flatten() {
            self.monitor_output(output);
        }
        Ok(())
    }

    /// `NAME`, yielding the device's interned ID.
    fn rule_device_identifier(&mut self) -> Result<Option<NameId>, LexError> {
        let device_id = if self.symbol.kind == SymbolKind::Name {
            self.symbol.id
        } else {
            None
        };
        if self.expect_symbol(SymbolKind::Name, None)? {
            Ok(device_id)
        } else {
            Ok(None)
        }
    }

    /// `NAME [ "." ("Q"|"QBAR") ]`.
    fn rule_output_identifier(&mut self) -> Result<Option<OutputSpec>, LexError> {
        let Some(device_id) = self.rule_device_identifier()? else {
            self.report(ErrorKind::Net(NetError::DeviceAbsent));
            return Ok(None);
        };
        if self.network.devices().get(device_id).is_none() && self.error_count == 0 {
            self.report(ErrorKind::Net(NetError::DeviceAbsent));
            return Ok(None);
        }

        if self.symbol.kind == SymbolKind::Dot {
            self.get_next_symbol()?;
            let port_id = if self.symbol.kind == SymbolKind::Keyword {
                self.symbol.id
            } else {
                None
            };
            let output_ports = self.keywords.output_ports();
            if self.expect_keyword(&output_ports, None)? {
                return Ok(port_id.map(|port| (device_id, Some(port))));
            }
            return Ok(None);
        }
        Ok(Some((device_id, None)))
    }

    /// `NAME "." ( NAME | "CLK"|"DATA"|"SET"|"CLEAR" )`.
    fn rule_input_identifier(&mut self) -> Result<Option<InputSpec>, LexError> {
        let Some(device_id) = self.rule_device_identifier()? else {
            self.report(ErrorKind::Net(NetError::DeviceAbsent));
            return Ok(None);
        };
        if self.network.devices().get(device_id).is_none() && self.error_count == 0 {
            self.report(ErrorKind::Net(NetError::DeviceAbsent));
            return Ok(None);
        }

        if self.expect_symbol(SymbolKind::Dot, Some(&[SymbolKind::Semicolon]))? {
            if self.symbol.kind == SymbolKind::Name {
                let port_id = self.symbol.id;
                self.get_next_symbol()?;
                return Ok(port_id.map(|port| (device_id, port)));
            }
            let input_ports = self.keywords.input_ports();
            if self.symbol_is_keyword(&input_ports) {
                let port_id = self.symbol.id;
                self.get_next_symbol()?;
                return Ok(port_id.map(|port| (device_id, port)));
            }
            self.report(ErrorKind::ExpectedInputPort);
        }
        Ok(None)
    }

    /// Maps a device-type keyword to its kind.
    fn device_kind(&self, id: NameId) -> Option<DeviceKind> {
        let kw = self.keywords;
        if id == kw.and_ {
            Some(DeviceKind::And)
        } else if id == kw.nand {
            Some(DeviceKind::Nand)
        } else if id == kw.or_ {
            Some(DeviceKind::Or)
        } else if id == kw.nor {
            Some(DeviceKind::Nor)
        } else if id == kw.xor {
            Some(DeviceKind::Xor)
        } else if id == kw.switch {
            Some(DeviceKind::Switch)
        } else if id == kw.clock {
            Some(DeviceKind::Clock)
        } else if id == kw.dtype {
            Some(DeviceKind::DType)
        } else if id == kw.rc {
            Some(DeviceKind::Rc)
        } else {
            None
        }
    }

    /// Semantic action: device construction. `Some` when construction
    /// succeeded or was suppressed, `None` when a domain error was raised.
    fn initialise_device(
        &mut self,
        device_type: Option<NameId>,
        device_id: NameId,
        qualifier: Option<u32>,
    ) -> Option<()> {
        if self.error_count > 0 {
            return Some(());
        }
        let kind = device_type.and_then(|id| self.device_kind(id));
        let Some(kind) = kind else {
            self.report(ErrorKind::Device(DeviceError::BadKind));
            return None;
        };
        match self
            .network
            .devices_mut()
            .make_device(device_id, kind, qualifier)
        {
            Ok(()) => Some(()),
            Err(err) => {
                self.report(err.into());
                None
            }
        }
    }

    /// Semantic action: wiring one connection.
    fn make_connection(&mut self, output: OutputSpec, input: InputSpec) {
        if self.error_count > 0 {
            return;
        }
        let (out_device, out_port) = output;
        let (in_device, in_port) = input;
        if let Err(err) = self.network.connect(out_device, out_port, in_device, in_port) {
            self.report(err.into());
        }
    }

    /// Semantic action: monitor creation.
    fn monitor_output(&mut self, output: OutputSpec) {
        if self.error_count > 0 {
            return;
        }
        let (device, port) = output;
        if let Err(err) = self.monitors.make_monitor(device, port, self.network) {
            self.report(err.into());
        }
    }
}
