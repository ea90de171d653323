//! Error types, styled on `cfgrammar`'s `GrammarValidationError`/
//! `FromYaccParserError`: named variants, a manual `Display`, and
//! `std::error::Error` so callers can use `?` throughout. Conditions the
//! spec treats as implementation invariants (§7 "absence of a root... is an
//! implementation invariant violation") still get a named variant rather
//! than a panic, so a caller embedding this parser can recover instead of
//! crashing the host process.

use std::error::Error;
use std::fmt;

use crate::editop::EditOp;

#[derive(Clone, Debug)]
pub enum AlcepError {
    /// A grammar rule or terminal carries a priority; the all-corrections
    /// parser has no notion of precedence (spec §7, Non-goals).
    UnsupportedGrammarFeature(String),
    /// Two edit operations were compared that the algebra declares
    /// undefined (an Insert against a non-Insert, in either direction).
    InvalidComparison { left: EditOp, right: EditOp },
    /// `Correction::compare` was called on corrections of differing length;
    /// the comparison is defined only for equal-length corrections (spec
    /// §4.2). Unlike the Python original (which asserts and panics), the
    /// smallest-corrections filter treats this case as `Incomparable`
    /// rather than calling `compare` at all — this variant exists for
    /// direct callers of `compare`.
    IncomparableLength { left: usize, right: usize },
    /// A `WordOrderedCorrection` was constructed from an operation sequence
    /// that does not alternate `Insert · (Read|Delete|Replace)*` correctly.
    InvalidCorrectionShape(String),
    /// No root symbol node `(start_symbol, 0, n)` existed in the final
    /// Earley set. The recognizer is total over non-empty grammars (spec
    /// §4.3); seeing this means a grammar or recognizer invariant broke.
    MissingRoot,
    /// A user's choice in the interactive (ALCIEP) variant didn't name any
    /// of the currently offered edit options.
    InvalidEditChoice { chosen: usize, available: usize }
}

impl fmt::Display for AlcepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AlcepError::UnsupportedGrammarFeature(msg) => {
                write!(f, "unsupported grammar feature: {msg}")
            }
            AlcepError::InvalidComparison { left, right } => {
                write!(f, "cannot compare {left} with {right}: Insert cannot be compared with a non-Insert")
            }
            AlcepError::IncomparableLength { left, right } => {
                write!(f, "cannot compare corrections of length {left} and {right}: compare is only defined for equal-length corrections")
            }
            AlcepError::InvalidCorrectionShape(msg) => write!(f, "invalid correction shape: {msg}"),
            AlcepError::MissingRoot => {
                write!(f, "no root symbol node found in the final Earley set: recognizer invariant violated")
            }
            AlcepError::InvalidEditChoice { chosen, available } => {
                write!(f, "edit choice {chosen} is not one of the {available} currently offered options")
            }
        }
    }
}

impl Error for AlcepError {}
