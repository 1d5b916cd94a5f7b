//! Lexer for the circuit definition language.
//!
//! Translates the definition text into a stream of [`Symbol`]s for the
//! parser, skipping whitespace and comments and tracking line/column
//! positions for the caret diagnostics.

use thiserror::Error;

use crate::names::{NameId, NameTable};

/// Reserved words, registered into the name table before any user name so
/// their IDs stay low and stable for the session.
pub const KEYWORDS: &[&str] = &[
    "CLOCK",
    "SWITCH",
    "AND",
    "NAND",
    "OR",
    "NOR",
    "DTYPE",
    "XOR",
    "MONITOR",
    "Q",
    "QBAR",
    "CLK",
    "DATA",
    "SET",
    "CLEAR",
    "DEVICES",
    "CONNECTIONS",
    "RC",
];

/// Interned IDs of every reserved word.
#[derive(Clone, Copy, Debug)]
pub struct Keywords {
    pub clock: NameId,
    pub switch: NameId,
    pub and_: NameId,
    pub nand: NameId,
    pub or_: NameId,
    pub nor: NameId,
    pub dtype: NameId,
    pub xor: NameId,
    pub monitor: NameId,
    pub q: NameId,
    pub qbar: NameId,
    pub clk: NameId,
    pub data: NameId,
    pub set: NameId,
    pub clear: NameId,
    pub devices: NameId,
    pub connections: NameId,
    pub rc: NameId,
    all: [NameId; 18],
}

impl Keywords {
    /// Registers the reserved words and captures their IDs.
    pub fn intern(names: &mut NameTable) -> Self {
        let ids = names.lookup(KEYWORDS);
        let all: [NameId; 18] = ids.try_into().expect("keyword list length is fixed");
        let [clock, switch, and_, nand, or_, nor, dtype, xor, monitor, q, qbar, clk, data, set, clear, devices, connections, rc] =
            all;
        Keywords {
            clock,
            switch,
            and_,
            nand,
            or_,
            nor,
            dtype,
            xor,
            monitor,
            q,
            qbar,
            clk,
            data,
            set,
            clear,
            devices,
            connections,
            rc,
            all,
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: NameId) -> bool {
        self.all.contains(&id)
    }

    /// Keywords that open a device instantiation.
    #[must_use]
    pub fn device_types(&self) -> [NameId; 9] {
        [
            self.clock,
            self.switch,
            self.and_,
            self.nand,
            self.or_,
            self.nor,
            self.dtype,
            self.xor,
            self.rc,
        ]
    }

    /// Keywords legal after the dot of an `output_id`.
    #[must_use]
    pub fn output_ports(&self) -> [NameId; 2] {
        [self.q, self.qbar]
    }

    /// Keywords legal after the dot of an `input_id`.
    #[must_use]
    pub fn input_ports(&self) -> [NameId; 4] {
        [self.clk, self.data, self.set, self.clear]
    }
}

/// Token discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Comma,
    Semicolon,
    Greater,
    BrackOpen,
    BrackClose,
    Dot,
    Colon,
    Number,
    Keyword,
    Name,
    Eof,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SymbolKind::Comma => "Comma ','",
            SymbolKind::Semicolon => "Semi-colon ';'",
            SymbolKind::Greater => "Greater-than arrow '>'",
            SymbolKind::BrackOpen => "Open bracket '('",
            SymbolKind::BrackClose => "Close bracket ')'",
            SymbolKind::Dot => "Dot '.'",
            SymbolKind::Colon => "Colon ':'",
            SymbolKind::Number => "<number>",
            SymbolKind::Keyword => "<keyword>",
            SymbolKind::Name => "<name>",
            SymbolKind::Eof => "EOF (End of File)",
        };
        f.write_str(text)
    }
}

/// One token, tagged with its source position.
///
/// `id` is set for `Keyword` and `Name` symbols, `value` for `Number`.
/// `line` is 0-based (rendered 1-based by the reporter), `column` is the
/// 1-based column of the token's first character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub id: Option<NameId>,
    pub value: Option<u32>,
    pub line: u32,
    pub column: u32,
}

impl Symbol {
    fn at(kind: SymbolKind, line: u32, column: u32) -> Self {
        Symbol {
            kind,
            id: None,
            value: None,
            line,
            column,
        }
    }
}

/// Fatal lexical failure. The whole load is abandoned; there is no
/// recovery from a character the language has no use for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error(
        "File contains invalid characters. First invalid symbol: {ch:?} (Line {}, Character {column})",
        .line + 1
    )]
    InvalidCharacter { ch: char, line: u32, column: u32 },
}

/// Streaming tokenizer over an in-memory definition text.
///
/// The scanner does not own the name table; callers pass it to
/// [`Scanner::next_symbol`] so names can be interned on the fly while the
/// table stays shared with the parser and the device containers.
pub struct Scanner {
    chars: Vec<char>,
    src: String,
    pos: usize,
    line: u32,
    column: u32,
    keywords: Keywords,
}

impl Scanner {
    pub fn new(source: &str, names: &mut NameTable) -> Self {
        Scanner {
            chars: source.chars().collect(),
            src: source.to_owned(),
            pos: 0,
            line: 0,
            column: 0,
            keywords: Keywords::intern(names),
        }
    }

    #[must_use]
    pub fn keywords(&self) -> Keywords {
        self.keywords
    }

    /// Source text of the given 0-based line, without its newline.
    /// Used by the reporter for the caret display.
    #[must_use]
    pub fn line_text(&self, line: u32) -> &str {
        self.src.lines().nth(line as usize).unwrap_or("")
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) {
        let Some(ch) = self.peek() else {
            return;
        };
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    /// Consumes a run of consecutive `#` characters, returning its length.
    fn hash_run(&mut self) -> u32 {
        let mut run = 0;
        while self.peek() == Some('#') {
            self.bump();
            run += 1;
        }
        run
    }

    /// Skips whitespace and comments.
    ///
    /// A run of three or more `#` opens a block comment closed by the next
    /// run of three or more `#` (or EOF); a shorter run comments to the end
    /// of the line. Block delimiters take precedence, matching the
    /// reference scanner.
    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }
            if self.peek() != Some('#') {
                return;
            }
            if self.hash_run() >= 3 {
                // Block comment: anything goes until the closing run.
                loop {
                    match self.peek() {
                        None => return,
                        Some('#') => {
                            if self.hash_run() >= 3 {
                                break;
                            }
                        }
                        Some(_) => {
                            self.bump();
                        }
                    }
                }
            } else {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            }
        }
    }

    /// Translates the next run of characters into a symbol.
    pub fn next_symbol(&mut self, names: &mut NameTable) -> Result<Symbol, LexError> {
        self.skip_trivia();

        let line = self.line;
        let column = self.column + 1;

        let Some(ch) = self.peek() else {
            return Ok(Symbol::at(SymbolKind::Eof, line, column));
        };

        let punct = match ch {
            ',' => Some(SymbolKind::Comma),
            ';' => Some(SymbolKind::Semicolon),
            '>' => Some(SymbolKind::Greater),
            '(' => Some(SymbolKind::BrackOpen),
            ')' => Some(SymbolKind::BrackClose),
            '.' => Some(SymbolKind::Dot),
            ':' => Some(SymbolKind::Colon),
            _ => None,
        };
        if let Some(kind) = punct {
            self.bump();
            return Ok(Symbol::at(kind, line, column));
        }

        if ch.is_ascii_alphabetic() {
            let mut text = String::new();
            while let Some(c) = self.peek() {
                if !c.is_ascii_alphanumeric() {
                    break;
                }
                self.bump();
                text.push(c);
            }
            let id = names.intern(&text);
            let kind = if self.keywords.contains(id) {
                SymbolKind::Keyword
            } else {
                SymbolKind::Name
            };
            let mut symbol = Symbol::at(kind, line, column);
            symbol.id = Some(id);
            return Ok(symbol);
        }

        if ch.is_ascii_digit() {
            let mut value: u32 = 0;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
                self.bump();
                value = value.saturating_mul(10).saturating_add(digit);
            }
            let mut symbol = Symbol::at(SymbolKind::Number, line, column);
            symbol.value = Some(value);
            return Ok(symbol);
        }

        Err(LexError::InvalidCharacter { ch, line, column })
    }
}
