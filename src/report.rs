//! Error kinds and their line-pointer rendering.
//!
//! Every recoverable failure in the front end, whichever subsystem raised
//! it, is one variant of [`ErrorKind`]; the reporter pattern-matches here
//! to produce the reference message texts. The core never prints; it
//! collects [`Diagnostic`]s into a [`ParseReport`] and the driver decides
//! where they go.

use std::fmt;

use crate::devices::DeviceError;
use crate::monitors::MonitorError;
use crate::network::NetError;
use crate::scanner::SymbolKind;

/// Everything the parser can report against a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A specific token (or one of several) was required.
    ExpectedSymbol(Vec<SymbolKind>),
    /// A specific keyword (or one of several) was required; resolved to
    /// display strings at raise time.
    ExpectedKeyword(Vec<String>),
    ExpectedDeviceInstantiation,
    ExpectedConnection,
    UnexpectedEof,
    ExpectedEof,
    ExpectedInputPort,
    NetworkInputsUnconnected,
    Device(DeviceError),
    Net(NetError),
    Monitor(MonitorError),
}

impl From<DeviceError> for ErrorKind {
    fn from(err: DeviceError) -> Self {
        ErrorKind::Device(err)
    }
}

impl From<NetError> for ErrorKind {
    fn from(err: NetError) -> Self {
        ErrorKind::Net(err)
    }
}

impl From<MonitorError> for ErrorKind {
    fn from(err: MonitorError) -> Self {
        ErrorKind::Monitor(err)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ExpectedSymbol(kinds) => match kinds.as_slice() {
                [kind] => write!(f, "Error: Expected Symbol: {kind}"),
                kinds => {
                    let alternatives: Vec<String> =
                        kinds.iter().map(|k| format!("'{k}'")).collect();
                    write!(f, "Error: Expected Symbols: {}", alternatives.join(" or "))
                }
            },
            ErrorKind::ExpectedKeyword(words) => match words.as_slice() {
                [word] => write!(f, "Error: Expected Keyword: '{word}'"),
                words => {
                    let alternatives: Vec<String> =
                        words.iter().map(|w| format!("'{w}'")).collect();
                    write!(f, "Error: Expected Keywords: {}", alternatives.join(", "))
                }
            },
            ErrorKind::ExpectedDeviceInstantiation => write!(
                f,
                "Error: Expected either:\n \
                 - A device type for device instantiation.\n \
                 - 'CONNECTIONS:' (include before defining connections).\n\
                 Future errors of this type have been suppressed."
            ),
            ErrorKind::ExpectedConnection => write!(
                f,
                "Error: Expected either:\n \
                 - A device name for a connection.\n \
                 - 'MONITOR'."
            ),
            ErrorKind::UnexpectedEof => write!(f, "Error: Unexpected end of file (EOF)."),
            ErrorKind::ExpectedEof => write!(f, "Error: Expected end of file (EOF)."),
            ErrorKind::ExpectedInputPort => {
                write!(f, "Error: Invalid input port name following dot.")
            }
            ErrorKind::NetworkInputsUnconnected => {
                write!(f, "Error: There are unconnected inputs in the network.")
            }
            ErrorKind::Device(err) => write!(f, "Error: {err}"),
            ErrorKind::Net(err) => write!(f, "Error: {err}"),
            ErrorKind::Monitor(err) => write!(f, "Error: {err}"),
        }
    }
}

/// One reported error, pinned to the symbol it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    /// 0-based source line of the offending symbol.
    pub line: u32,
    /// 1-based column of the offending symbol.
    pub column: u32,
    /// The offending source line, for the caret display.
    pub source_line: String,
}

impl Diagnostic {
    /// The reference display: source line, caret under the column, then
    /// `(Line N) message` with a 1-based line number.
    #[must_use]
    pub fn render(&self) -> String {
        let caret_indent = " ".repeat(self.column.saturating_sub(1) as usize);
        format!(
            "\n{}\n{}^\n(Line {}) {}",
            self.source_line,
            caret_indent,
            self.line + 1,
            self.kind
        )
    }
}

/// The outcome of a parse: the displayed diagnostics and the total error
/// count (suppressed repeats are counted but not displayed).
#[derive(Debug, Default)]
pub struct ParseReport {
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: u32,
}

impl ParseReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error_count == 0
    }
}

impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic.render())?;
        }
        if self.error_count > 0 {
            writeln!(f)?;
            writeln!(
                f,
                "Circuit creation failed due to {} detected error(s).",
                self.error_count
            )?;
            writeln!(f, "Circuit creation is abandoned after the first error,")?;
            writeln!(f, "so subsequent semantic errors are not detected.")?;
        }
        Ok(())
    }
}
