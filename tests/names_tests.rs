//! Unit tests for the name table.

use gatesim::names::NameTable;

#[test]
fn round_trips_strings_and_ids() {
    let mut names = NameTable::new();
    for s in ["CLOCK", "SW1", "aVeryLongDeviceName42"] {
        let id = names.lookup(&[s])[0];
        assert_eq!(names.get_string(id), Some(s));
        assert_eq!(names.lookup(&[s])[0], id);
    }
}

#[test]
fn ids_are_dense_and_first_seen_ordered() {
    let mut names = NameTable::new();
    let ids = names.lookup(&["a", "b", "c"]);
    assert_eq!(ids[0].index(), 0);
    assert_eq!(ids[1].index(), 1);
    assert_eq!(ids[2].index(), 2);
}

#[test]
fn later_appends_never_move_existing_ids() {
    let mut names = NameTable::new();
    let first = names.lookup(&["G1", "G2"]);
    names.lookup(&["G3", "G4", "G1"]);
    assert_eq!(names.lookup(&["G1", "G2"]), first);
}

#[test]
fn query_does_not_insert() {
    let mut names = NameTable::new();
    assert_eq!(names.query("ghost").unwrap(), None);
    assert_eq!(names.len(), 0);
    let id = names.intern("ghost");
    assert_eq!(names.query("ghost").unwrap(), Some(id));
}

#[test]
fn query_rejects_non_names() {
    let names = NameTable::new();
    assert!(names.query("123").is_err());
    assert!(names.query("no-dashes").is_err());
    assert!(names.query("no spaces").is_err());
    // A stray leading digit is still alphanumeric, so the query is legal
    // and simply comes back unknown.
    assert_eq!(names.query("9lives").unwrap(), None);
}

#[test]
fn get_string_is_none_out_of_range() {
    let mut names = NameTable::new();
    let id = names.intern("only");
    assert_eq!(names.get_string(id), Some("only"));
    let ghost = {
        let mut other = NameTable::new();
        other.lookup(&["a", "b"]);
        other.lookup(&["c"])[0]
    };
    assert_eq!(names.get_string(ghost), None);
}

#[test]
fn error_code_ranges_are_disjoint_and_monotonic() {
    let mut names = NameTable::new();
    let a = names.reserve_error_codes(8);
    let b = names.reserve_error_codes(5);
    assert_eq!(a.len() + b.len(), 13);
    assert!(a.end <= b.start);
    assert!(b.start >= a.end);
    let c = names.reserve_error_codes(1);
    assert_eq!(c.start, b.end);
}
