//! Interning table mapping identifier strings to dense integer IDs.
//!
//! Nearly every other module leans on this one: scanner keywords, device
//! names and port names are all `NameId`s, so the rest of the core can
//! compare and hash plain integers instead of strings.

use std::collections::HashMap;
use std::ops::Range;

use thiserror::Error;

/// Dense handle for an interned name. IDs are assigned in first-seen order
/// and are stable for the lifetime of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);

impl NameId {
    /// Index of this name in the table's arena.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Raised by [`NameTable::query`] when the queried string could never have
/// been produced by the scanner as a name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bad name string {0:?}: names are alphanumeric and not purely numeric")]
pub struct BadName(pub String);

/// Append-only string interner plus a counter handing out unique error-code
/// ranges to embedders.
///
/// Keywords are registered first, so they always receive the same low IDs
/// within a session.
#[derive(Debug, Default)]
pub struct NameTable {
    arena: Vec<String>,
    index: HashMap<String, NameId>,
    error_code_count: usize,
}

impl NameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a single name, returning its existing ID if already present.
    pub fn intern(&mut self, name: &str) -> NameId {
        debug_assert!(!name.is_empty(), "the empty string is never a name");
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NameId(u32::try_from(self.arena.len()).unwrap_or(u32::MAX));
        self.arena.push(name.to_owned());
        self.index.insert(name.to_owned(), id);
        id
    }

    /// Interns every string in `names`; the result order matches the input
    /// order. Already-known strings keep their original IDs.
    pub fn lookup(&mut self, names: &[&str]) -> Vec<NameId> {
        names.iter().map(|name| self.intern(name)).collect()
    }

    /// Looks a name up without inserting it. Returns `Ok(None)` for unknown
    /// names and `Err(BadName)` for strings that cannot be names at all
    /// (empty, non-alphanumeric, or purely numeric).
    pub fn query(&self, name: &str) -> Result<Option<NameId>, BadName> {
        if name.is_empty()
            || !name.chars().all(|c| c.is_ascii_alphanumeric())
            || name.chars().all(|c| c.is_ascii_digit())
        {
            return Err(BadName(name.to_owned()));
        }
        Ok(self.index.get(name).copied())
    }

    /// Inverse lookup. `None` if the ID was never handed out by this table.
    #[must_use]
    pub fn get_string(&self, id: NameId) -> Option<&str> {
        self.arena.get(id.index()).map(String::as_str)
    }

    /// Allocates `n` fresh error codes. Codes are monotonically increasing
    /// and never recycled, so two calls always yield disjoint ranges.
    pub fn reserve_error_codes(&mut self, n: usize) -> Range<usize> {
        let start = self.error_code_count;
        self.error_code_count += n;
        start..self.error_code_count
    }

    /// Number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut names = NameTable::new();
        let a = names.intern("SW1");
        let b = names.intern("SW1");
        assert_eq!(a, b);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn lookup_preserves_input_order() {
        let mut names = NameTable::new();
        let ids = names.lookup(&["CLOCK", "SWITCH", "CLOCK"]);
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(names.get_string(ids[1]), Some("SWITCH"));
    }

    #[test]
    fn query_rejects_malformed_names() {
        let names = NameTable::new();
        assert!(names.query("123").is_err());
        assert!(names.query("a-b").is_err());
        assert!(names.query("").is_err());
        // Alphanumeric but not purely numeric: a legal query, just unknown.
        assert_eq!(names.query("1abc").unwrap(), None);
        assert_eq!(names.query("unseen").unwrap(), None);
    }

    #[test]
    fn error_codes_never_recycle() {
        let mut names = NameTable::new();
        let a = names.reserve_error_codes(8);
        let b = names.reserve_error_codes(3);
        assert_eq!(a, 0..8);
        assert_eq!(b, 8..11);
    }
}
