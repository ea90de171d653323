//! Word-ordered corrections: `Ins · (Read|Delete|Replace · Ins)*`, grounded
//! on `corrections/word_ordered_correction.py` and
//! `word_ordered_correction_with_counter_of_edits.py`.
//!
//! The Python original models the counted variant as a subclass
//! (`WordOrderedCorrectionWithCounterOfEdits`) that reads its ceilings off
//! *class attributes* set once by the transformer's constructor — genuine
//! global, process-wide state. Design Notes §9 calls this out explicitly;
//! here a `Policy` value is threaded through every call that needs it
//! instead, and counted corrections carry their own per-kind counters as
//! plain fields rather than via subclassing (`CountedCorrection` wraps a
//! `Correction`, it doesn't extend one).

use crate::editop::{EditOp, Ordering3};
use crate::error::AlcepError;

/// A sequence of edit operations in the word-ordered shape: an `Insert`,
/// then zero or more `(Read|Delete|Replace, Insert)` pairs. `edit_count()`
/// is `n` — the number of non-insert edits — which is what spec §3 calls
/// the correction's length `|c|`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Correction {
    ops: Vec<EditOp>
}

impl Correction {
    /// Build a correction from a raw operation list, without validating its
    /// shape. Used internally where the caller already guarantees the
    /// alternation (e.g. the transformer assembling token-node leaves).
    pub fn new_unchecked(ops: Vec<EditOp>) -> Correction {
        Correction { ops }
    }

    /// Build a correction, validating the `Ins · (Read|Delete|Replace · Ins)*`
    /// alternation (spec §7's "invalid correction shape" validator).
    pub fn new_validated(ops: Vec<EditOp>) -> Result<Correction, AlcepError> {
        if !ops.is_empty() && ops.len() % 2 == 0 {
            return Err(AlcepError::InvalidCorrectionShape(
                "the number of edit operations is not odd".to_string()
            ));
        }
        for (i, op) in ops.iter().enumerate() {
            let expect_insert = i % 2 == 0;
            if op.is_insert() != expect_insert {
                return Err(AlcepError::InvalidCorrectionShape(
                    "operations must alternate insertion and non-insertion, starting and ending with insertion"
                        .to_string()
                ));
            }
        }
        Ok(Correction { ops })
    }

    pub fn empty() -> Correction {
        Correction { ops: Vec::new() }
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of non-insert edits (`n` in spec §3's `2n+1`).
    pub fn edit_count(&self) -> usize {
        self.ops.len() / 2
    }

    /// Fold left, producing the output string: Read/Replace emit one
    /// letter, Insert emits its word, Delete emits nothing.
    pub fn apply(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            match op {
                EditOp::Read(l) => out.push_str(l),
                EditOp::Delete(_) => {}
                EditOp::Insert(w) => out.push_str(w),
                EditOp::Replace { replaced_by, .. } => out.push_str(replaced_by)
            }
        }
        out
    }

    /// The input projection: the Read/Delete/Replace letters, in order
    /// (spec I3 — must equal the input word for any correction that's
    /// applicable to it).
    pub fn input_projection(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            match op {
                EditOp::Read(l) | EditOp::Delete(l) => out.push_str(l),
                EditOp::Replace { letter, .. } => out.push_str(letter),
                EditOp::Insert(_) => {}
            }
        }
        out
    }

    /// Whether concatenating `self` then `other` would produce a
    /// non-simplified correction (spec §4.2.1). Assumes both `self` and
    /// `other` are already simplified; the check is local to the boundary.
    fn can_simplify(&self, other: &Correction) -> bool {
        let self_last = self.ops.last().expect("concatenate already handled the empty case");
        let other_first = other.ops.first().expect("concatenate already handled the empty case");
        let (self_word, other_word) = match (self_last, other_first) {
            (EditOp::Insert(a), EditOp::Insert(b)) => (a, b),
            _ => unreachable!("boundary operations of a word-ordered correction are always Insert")
        };

        match (!self_word.is_empty(), !other_word.is_empty()) {
            (true, true) => false,
            (true, false) => {
                if other.ops.len() == 1 {
                    return false;
                }
                match &other.ops[1] {
                    EditOp::Delete(_) => true,
                    EditOp::Replace { letter, .. } => self_word.ends_with(letter.as_str()),
                    _ => false
                }
            }
            (false, true) => {
                if self.ops.len() == 1 {
                    return false;
                }
                match &self.ops[self.ops.len() - 2] {
                    EditOp::Delete(_) => true,
                    EditOp::Replace { replaced_by, .. } => other_word.starts_with(replaced_by.as_str()),
                    _ => false
                }
            }
            (false, false) => {
                if other.ops.len() == 1 || self.ops.len() == 1 {
                    return false;
                }
                match (&self.ops[self.ops.len() - 2], &other.ops[1]) {
                    (EditOp::Replace { replaced_by, .. }, EditOp::Delete(deleted)) => replaced_by == deleted,
                    _ => false
                }
            }
        }
    }

    fn fuse_boundary(&self, other: &Correction) -> Vec<EditOp> {
        let self_last_word = match self.ops.last().unwrap() {
            EditOp::Insert(w) => w.as_str(),
            _ => unreachable!()
        };
        let other_first_word = match other.ops.first().unwrap() {
            EditOp::Insert(w) => w.as_str(),
            _ => unreachable!()
        };
        let mut ops = Vec::with_capacity(self.ops.len() + other.ops.len() - 1);
        ops.extend_from_slice(&self.ops[..self.ops.len() - 1]);
        ops.push(EditOp::insert(format!("{self_last_word}{other_first_word}")));
        ops.extend_from_slice(&other.ops[1..]);
        ops
    }

    /// Concatenate `self` then `other`. If either is empty, returns the
    /// other unchanged (spec scenario 6). Otherwise fuses the boundary
    /// Inserts by string concatenation. When `simplify` is true, rejects
    /// (returns `None`) if the fused correction is non-simplified.
    pub fn concatenate(&self, other: &Correction, simplify: bool) -> Option<Correction> {
        if self.is_empty() {
            return Some(other.clone());
        }
        if other.is_empty() {
            return Some(self.clone());
        }
        if simplify && self.can_simplify(other) {
            return None;
        }
        Some(Correction { ops: self.fuse_boundary(other) })
    }

    /// Compare two corrections of equal length pointwise (spec §4.2).
    /// Corrections of differing length are `Incomparable` — the caller
    /// (`transform::smallest_corrections`) already only pairs up
    /// equal-length corrections, but this still handles the general case
    /// without panicking, unlike the Python original's `assert`.
    pub fn compare(&self, other: &Correction) -> Result<Ordering3, AlcepError> {
        if self.ops.len() != other.ops.len() {
            return Ok(Ordering3::Incomparable);
        }

        let mut verdict = Ordering3::Equal;
        for (a, b) in self.ops.iter().zip(other.ops.iter()) {
            match a.compare(b)? {
                Ordering3::Incomparable => return Ok(Ordering3::Incomparable),
                Ordering3::Equal => {}
                Ordering3::Smaller => match verdict {
                    Ordering3::Equal => verdict = Ordering3::Smaller,
                    Ordering3::Bigger => return Ok(Ordering3::Incomparable),
                    _ => {}
                },
                Ordering3::Bigger => match verdict {
                    Ordering3::Equal => verdict = Ordering3::Bigger,
                    Ordering3::Smaller => return Ok(Ordering3::Incomparable),
                    _ => {}
                }
            }
        }
        Ok(verdict)
    }
}

/// Per-kind edit counters, plus configured ceilings. `None` means
/// unlimited (the Python original's `-1` sentinel).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Policy {
    pub max_ins: Option<usize>,
    pub max_del: Option<usize>,
    pub max_rep: Option<usize>,
    pub max_edits: Option<usize>
}

impl Policy {
    pub fn unlimited() -> Policy {
        Policy::default()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EditCounts {
    pub insertions: usize,
    pub deletions: usize,
    pub replacements: usize
}

impl EditCounts {
    fn sum(&self) -> usize {
        self.insertions + self.deletions + self.replacements
    }

    fn combined(&self, other: &EditCounts) -> EditCounts {
        EditCounts {
            insertions: self.insertions + other.insertions,
            deletions: self.deletions + other.deletions,
            replacements: self.replacements + other.replacements
        }
    }

    fn within(&self, policy: &Policy) -> bool {
        if let Some(max) = policy.max_ins {
            if self.insertions > max {
                return false;
            }
        }
        if let Some(max) = policy.max_del {
            if self.deletions > max {
                return false;
            }
        }
        if let Some(max) = policy.max_rep {
            if self.replacements > max {
                return false;
            }
        }
        if let Some(max) = policy.max_edits {
            if self.sum() > max {
                return false;
            }
        }
        true
    }
}

/// A `Correction` plus per-kind edit counters, checked against a `Policy`'s
/// ceilings at every concatenation (spec §4.2 "Counted variant").
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CountedCorrection {
    correction: Correction,
    counts: EditCounts
}

impl CountedCorrection {
    pub fn new(correction: Correction, counts: EditCounts) -> CountedCorrection {
        CountedCorrection { correction, counts }
    }

    pub fn correction(&self) -> &Correction {
        &self.correction
    }

    pub fn counts(&self) -> EditCounts {
        self.counts
    }

    pub fn apply(&self) -> String {
        self.correction.apply()
    }

    pub fn edit_count(&self) -> usize {
        self.correction.edit_count()
    }

    pub fn compare(&self, other: &CountedCorrection) -> Result<Ordering3, AlcepError> {
        self.correction.compare(&other.correction)
    }

    /// Concatenate, checking the combined counters against `policy`'s
    /// ceilings. Rejects (`None`) on a simplification failure or a
    /// breached bound, exactly as `concatenate` on the base `Correction`
    /// rejects on simplification alone.
    pub fn concatenate(&self, other: &CountedCorrection, simplify: bool, policy: &Policy) -> Option<CountedCorrection> {
        if self.correction.is_empty() {
            return Some(other.clone());
        }
        if other.correction.is_empty() {
            return Some(self.clone());
        }

        let fused = self.correction.concatenate(&other.correction, simplify)?;
        let counts = self.counts.combined(&other.counts);
        if !counts.within(policy) {
            return None;
        }
        Some(CountedCorrection { correction: fused, counts })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn read_triple(l: &str) -> Correction {
        Correction::new_validated(vec![EditOp::insert(""), EditOp::read(l), EditOp::insert("")]).unwrap()
    }

    #[test]
    fn empty_concatenate_identity() {
        let c = read_triple("a");
        assert_eq!(Correction::empty().concatenate(&c, false), Some(c.clone()));
        assert_eq!(c.concatenate(&Correction::empty(), false), Some(c));
    }

    #[test]
    fn concatenate_fuses_boundary_inserts() {
        let a = Correction::new_validated(vec![EditOp::insert("x"), EditOp::read("a"), EditOp::insert("y")]).unwrap();
        let b = Correction::new_validated(vec![EditOp::insert("z"), EditOp::read("b"), EditOp::insert("")]).unwrap();
        let c = a.concatenate(&b, false).unwrap();
        assert_eq!(
            c.ops(),
            &[EditOp::insert("x"), EditOp::read("a"), EditOp::insert("yz"), EditOp::read("b"), EditOp::insert("")]
        );
    }

    #[test]
    fn simplify_rejects_insert_then_delete() {
        let a = Correction::new_validated(vec![EditOp::insert("x"), EditOp::read("a"), EditOp::insert("y")]).unwrap();
        let b =
            Correction::new_validated(vec![EditOp::insert(""), EditOp::delete("b"), EditOp::insert("")]).unwrap();
        assert_eq!(a.concatenate(&b, true), None);
        assert!(a.concatenate(&b, false).is_some());
    }

    #[test]
    fn simplify_allows_both_nonempty_boundary() {
        let a = Correction::new_validated(vec![EditOp::insert("x"), EditOp::read("a"), EditOp::insert("y")]).unwrap();
        let b =
            Correction::new_validated(vec![EditOp::insert("z"), EditOp::delete("b"), EditOp::insert("")]).unwrap();
        assert!(a.concatenate(&b, true).is_some());
    }

    #[test]
    fn replace_then_matching_delete_simplifies() {
        let a = Correction::new_validated(vec![
            EditOp::insert(""),
            EditOp::replace("p", "q"),
            EditOp::insert("")
        ])
        .unwrap();
        let b =
            Correction::new_validated(vec![EditOp::insert(""), EditOp::delete("q"), EditOp::insert("")]).unwrap();
        assert_eq!(a.concatenate(&b, true), None);
    }

    #[test]
    fn compare_equal_length() {
        let a = read_triple("a");
        let b = read_triple("a");
        assert_eq!(a.compare(&b).unwrap(), Ordering3::Equal);
    }

    #[test]
    fn compare_smaller_read_vs_delete() {
        let read = read_triple("a");
        let del = Correction::new_validated(vec![EditOp::insert(""), EditOp::delete("a"), EditOp::insert("")])
            .unwrap();
        assert_eq!(read.compare(&del).unwrap(), Ordering3::Smaller);
        assert_eq!(del.compare(&read).unwrap(), Ordering3::Bigger);
    }

    #[test]
    fn compare_different_lengths_incomparable() {
        let short = read_triple("a");
        let long = Correction::new_validated(vec![
            EditOp::insert(""),
            EditOp::read("a"),
            EditOp::insert(""),
            EditOp::read("b"),
            EditOp::insert("")
        ])
        .unwrap();
        assert_eq!(short.compare(&long).unwrap(), Ordering3::Incomparable);
    }

    #[test]
    fn invalid_shape_rejected() {
        assert!(Correction::new_validated(vec![EditOp::read("a")]).is_err());
        assert!(Correction::new_validated(vec![EditOp::insert(""), EditOp::insert("")]).is_err());
    }

    #[test]
    fn counted_concatenate_enforces_policy() {
        let a = CountedCorrection::new(read_triple("a"), EditCounts { insertions: 0, deletions: 0, replacements: 0 });
        let b = CountedCorrection::new(
            Correction::new_validated(vec![EditOp::insert(""), EditOp::delete("b"), EditOp::insert("")]).unwrap(),
            EditCounts { insertions: 0, deletions: 1, replacements: 0 }
        );
        let policy = Policy { max_del: Some(0), ..Policy::unlimited() };
        assert!(a.concatenate(&b, false, &policy).is_none());

        let permissive = Policy::unlimited();
        assert!(a.concatenate(&b, false, &permissive).is_some());
    }
}
