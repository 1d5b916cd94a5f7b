//! Unit tests for the scanner: token classification, comment handling and
//! position tracking over whole definition snippets.

use gatesim::names::NameTable;
use gatesim::scanner::{Scanner, Symbol, SymbolKind};

fn scan(source: &str) -> (Vec<Symbol>, NameTable) {
    let mut names = NameTable::new();
    let mut scanner = Scanner::new(source, &mut names);
    let mut symbols = Vec::new();
    loop {
        let symbol = scanner.next_symbol(&mut names).expect("valid source");
        let done = symbol.kind == SymbolKind::Eof;
        symbols.push(symbol);
        if done {
            return (symbols, names);
        }
    }
}

fn kinds(symbols: &[Symbol]) -> Vec<SymbolKind> {
    symbols.iter().map(|s| s.kind).collect()
}

#[test]
fn tokenises_a_device_line() {
    let (symbols, _) = scan("CLOCK CK(2);");
    assert_eq!(
        kinds(&symbols),
        [
            SymbolKind::Keyword,
            SymbolKind::Name,
            SymbolKind::BrackOpen,
            SymbolKind::Number,
            SymbolKind::BrackClose,
            SymbolKind::Semicolon,
            SymbolKind::Eof,
        ]
    );
    assert_eq!(symbols[3].value, Some(2));
}

#[test]
fn tokenises_a_connection_line() {
    let (symbols, _) = scan("CK > D1.CLK;");
    assert_eq!(
        kinds(&symbols),
        [
            SymbolKind::Name,
            SymbolKind::Greater,
            SymbolKind::Name,
            SymbolKind::Dot,
            SymbolKind::Keyword,
            SymbolKind::Semicolon,
            SymbolKind::Eof,
        ]
    );
}

#[test]
fn keyword_ids_resolve_back_to_their_strings() {
    let (symbols, names) = scan("DEVICES CONNECTIONS MONITOR QBAR");
    let texts: Vec<&str> = symbols[..4]
        .iter()
        .map(|s| names.get_string(s.id.unwrap()).unwrap())
        .collect();
    assert_eq!(texts, ["DEVICES", "CONNECTIONS", "MONITOR", "QBAR"]);
    assert!(symbols[..4].iter().all(|s| s.kind == SymbolKind::Keyword));
}

#[test]
fn name_ids_are_shared_between_occurrences() {
    let (symbols, _) = scan("SW1 > G1.I1; SW1 > G1.I2;");
    assert_eq!(symbols[0].id, symbols[6].id);
    assert_ne!(symbols[0].id, symbols[2].id);
}

#[test]
fn numbers_accumulate_decimal_digits() {
    let (symbols, _) = scan("007 4096");
    assert_eq!(symbols[0].value, Some(7));
    assert_eq!(symbols[1].value, Some(4096));
}

#[test]
fn line_comments_are_invisible_to_the_parser() {
    let (symbols, _) = scan("SWITCH # the rest of this line vanishes ; > .\nSW1");
    assert_eq!(
        kinds(&symbols),
        [SymbolKind::Keyword, SymbolKind::Name, SymbolKind::Eof]
    );
}

#[test]
fn block_comments_swallow_everything_between_hash_runs() {
    let source = "### block with stray # and ## inside\nstill comment ### DTYPE D1;";
    let (symbols, _) = scan(source);
    assert_eq!(
        kinds(&symbols),
        [
            SymbolKind::Keyword,
            SymbolKind::Name,
            SymbolKind::Semicolon,
            SymbolKind::Eof,
        ]
    );
}

#[test]
fn unterminated_block_comment_reaches_eof() {
    let (symbols, _) = scan("XOR ### everything after here is comment");
    assert_eq!(kinds(&symbols), [SymbolKind::Keyword, SymbolKind::Eof]);
}

#[test]
fn positions_point_at_token_starts() {
    let (symbols, _) = scan("AND G1(2);\n  NAND G2(3);");
    // AND at line 0 column 1; NAND at line 1 column 3.
    assert_eq!((symbols[0].line, symbols[0].column), (0, 1));
    let nand = &symbols[6];
    assert_eq!(nand.kind, SymbolKind::Keyword);
    assert_eq!((nand.line, nand.column), (1, 3));
}

#[test]
fn invalid_character_reports_its_position() {
    let mut names = NameTable::new();
    let mut scanner = Scanner::new("DEVICES:\n  G1 = 4;", &mut names);
    for _ in 0..3 {
        scanner.next_symbol(&mut names).expect("valid prefix");
    }
    let err = scanner.next_symbol(&mut names).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("invalid characters"), "{message}");
    assert!(message.contains("Line 2"), "{message}");
}

#[test]
fn scanning_twice_yields_identical_streams() {
    let source = "DEVICES:\n  CLOCK CK(2); ### x ###\n  SWITCH SW1(0), SW2(1);\nCONNECTIONS:\n";
    let (first, _) = scan(source);
    let (second, _) = scan(source);
    assert_eq!(first, second);
}
