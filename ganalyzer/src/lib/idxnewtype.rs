//! Newtype indices into a grammar's rules, productions, symbols, and tokens.
//!
//! Mirrors `cfgrammar`'s `RIdx`/`PIdx`/`SIdx`/`TIdx` family: each index is a
//! distinct type so that, for example, a `TIdx` can never be passed where a
//! `RIdx` is expected. Unlike the teacher, which keeps the backing integer
//! generic over `StorageT: PrimInt + Unsigned` so grammars can pick a
//! narrower representation, we fix the backing type to `u32` — this crate's
//! grammars are small (test fixtures and the boundary contract, not a
//! production-scale grammar compiler) and the generic parameter would only
//! add bound-threading noise. See DESIGN.md for the full rationale.

use std::fmt;

macro_rules! idx_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u32);

        impl $name {
            pub fn new(v: usize) -> Self {
                $name(v as u32)
            }
        }

        impl From<$name> for usize {
            fn from(i: $name) -> usize {
                i.0 as usize
            }
        }

        impl From<$name> for u32 {
            fn from(i: $name) -> u32 {
                i.0
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                $name::new(v)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

idx_newtype!(RIdx, "Index of a non-terminal rule.");
idx_newtype!(PIdx, "Index of a production (a single right-hand-side alternative of a rule).");
idx_newtype!(SIdx, "Index of a symbol within a production.");
idx_newtype!(TIdx, "Index of a terminal (token).");
