//! The four edit primitives and their partial-order comparison, grounded on
//! `corrections/edit_operations.py`. The Python original makes each edit
//! operation a `Token` subclass (so it can live as a CSPPF leaf); here they
//! are a flat sum type and the forest's token nodes simply carry one.

use std::fmt;

use crate::error::AlcepError;

/// One of the four edit primitives. `Insert` never consumes an input token;
/// `Delete`/`Replace`/`Read` each consume exactly one (spec §3).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditOp {
    /// Insert `word` (the terminal's label; may be empty) without consuming input.
    Insert(String),
    /// Delete the input token `letter`.
    Delete(String),
    /// Replace the input token `letter` with `replaced_by`.
    Replace { letter: String, replaced_by: String },
    /// Read the input token `letter` (it already matches the expected terminal).
    Read(String)
}

/// Result of comparing two edit operations under the fixed partial order of
/// spec §4.1.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ordering3 {
    Equal,
    /// `self` is smaller than `other`.
    Smaller,
    /// `self` is bigger than `other`.
    Bigger,
    Incomparable
}

impl EditOp {
    pub fn insert(word: impl Into<String>) -> EditOp {
        EditOp::Insert(word.into())
    }

    pub fn delete(letter: impl Into<String>) -> EditOp {
        EditOp::Delete(letter.into())
    }

    pub fn replace(letter: impl Into<String>, replaced_by: impl Into<String>) -> EditOp {
        EditOp::Replace { letter: letter.into(), replaced_by: replaced_by.into() }
    }

    pub fn read(letter: impl Into<String>) -> EditOp {
        EditOp::Read(letter.into())
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, EditOp::Insert(_))
    }

    /// The letter this operation reads/deletes/replaces, or the word it
    /// inserts — used to render `SYMBOL 'payload'` (spec §6).
    pub fn display_symbol_and_payload(&self) -> (&'static str, String) {
        match self {
            EditOp::Insert(w) => ("INS", w.clone()),
            EditOp::Delete(l) => ("DEL", l.clone()),
            EditOp::Replace { letter, replaced_by } => {
                ("REPLACE", format!("{letter}'REPLACE2'{replaced_by}"))
            }
            EditOp::Read(l) => ("READ", l.clone())
        }
    }

    /// Compare `self` to `other` per the fixed table in spec §4.1. Comparing
    /// an Insert with a non-Insert (in either direction) is a programmer
    /// error and surfaces as `AlcepError::InvalidComparison`.
    pub fn compare(&self, other: &EditOp) -> Result<Ordering3, AlcepError> {
        use EditOp::*;
        use Ordering3::*;

        match (self, other) {
            (Insert(u), Insert(v)) => Ok(compare_inserts(u, v)),
            (Insert(_), _) | (_, Insert(_)) => Err(AlcepError::InvalidComparison {
                left: self.clone(),
                right: other.clone()
            }),

            (Read(x), Read(y)) => Ok(if x == y { Equal } else { Incomparable }),
            (Read(x), Delete(y)) => Ok(if x == y { Smaller } else { Incomparable }),
            (Read(x), Replace { letter, .. }) => Ok(if x == letter { Smaller } else { Incomparable }),

            (Delete(x), Read(y)) => Ok(if x == y { Bigger } else { Incomparable }),
            (Delete(x), Delete(y)) => Ok(if x == y { Equal } else { Incomparable }),
            (Delete(_), Replace { .. }) => Ok(Incomparable),

            (Replace { letter, .. }, Read(y)) => Ok(if letter == y { Bigger } else { Incomparable }),
            (Replace { .. }, Delete(_)) => Ok(Incomparable),
            (Replace { letter: x1, replaced_by: y1 }, Replace { letter: x2, replaced_by: y2 }) => {
                Ok(if x1 == x2 && y1 == y2 { Equal } else { Incomparable })
            }
        }
    }
}

/// `Insert(u) <= Insert(v)` iff `u` is a scattered subsequence of `v`
/// (standard two-pointer scan).
fn compare_inserts(u: &str, v: &str) -> Ordering3 {
    if u == v {
        return Ordering3::Equal;
    }
    let (shorter, longer, self_is_shorter) =
        if u.chars().count() <= v.chars().count() { (u, v, true) } else { (v, u, false) };

    let res = if shorter.is_empty() {
        Ordering3::Smaller
    } else {
        is_scattered_subsequence(shorter, longer)
    };

    if self_is_shorter {
        res
    } else {
        match res {
            Ordering3::Smaller => Ordering3::Bigger,
            other => other
        }
    }
}

fn is_scattered_subsequence(shorter: &str, longer: &str) -> Ordering3 {
    let mut shorter_chars = shorter.chars();
    let mut want = shorter_chars.next();
    for c in longer.chars() {
        if Some(c) == want {
            want = shorter_chars.next();
            if want.is_none() {
                return Ordering3::Smaller;
            }
        }
    }
    Ordering3::Incomparable
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EditOp::Insert(w) => write!(f, "INS'{w}'"),
            EditOp::Delete(l) => write!(f, "DEL'{l}'"),
            EditOp::Replace { letter, replaced_by } => write!(f, "REPLACE1'{letter}'REPLACE2'{replaced_by}'"),
            EditOp::Read(l) => write!(f, "READ'{l}'")
        }
    }
}
