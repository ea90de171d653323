// Copyright (c) 2017 King's College London
// created by the Software Development Team <http://soft-dev.org/>
//
// The Universal Permissive License (UPL), Version 1.0
//
// Subject to the condition set forth below, permission is hereby granted to any person obtaining a
// copy of this software, associated documentation and/or data (collectively the "Software"), free
// of charge and under any and all copyright rights in the Software, and any and all patent rights
// owned or freely licensable by each licensor hereunder covering either (i) the unmodified
// Software as contributed to or provided by such licensor, or (ii) the Larger Works (as defined
// below), to deal in both
//
// (a) the Software, and
// (b) any piece of software and/or hardware listed in the lrgrwrks.txt file
// if one is included with the Software (each a "Larger Work" to which the Software is contributed
// by such licensors),
//
// without restriction, including without limitation the rights to copy, create derivative works
// of, display, perform, and distribute the Software and make, use, sell, offer for sale, import,
// export, have made, and have sold the Software and the Larger Work(s), and to sublicense the
// foregoing rights on either these or other terms.
//
// This license is subject to the following condition: The above copyright notice and either this
// complete permission notice or at a minimum a reference to the UPL must be included in all copies
// or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! `ganalyzer` supplies the Grammar Analyzer contract used by the
//! all-corrections Earley recognizer (`alcep`): iteration over a
//! non-terminal's expanded productions, the FIRST and NULLABLE sets, and
//! classification of grammar symbols into terminals and non-terminals.
//!
//! This crate deliberately does *not* parse Yacc/BNF grammar files — that
//! (together with the lexer) is an external collaborator per the
//! specification this workspace implements. What's here is the boundary
//! trait (`GrammarAnalyzer`) plus `simple::SimpleGrammar`, a minimal
//! in-memory grammar representation that implements it, sufficient to
//! exercise the recognizer and transformer in tests.
//!
//!   * A *grammar* is an ordered sequence of *productions*.
//!   * A *production* is an ordered sequence of *symbols*.
//!   * A *rule* maps a name to one or more productions.
//!   * A *token* is the name of a syntactic element.
//!
//! Productions are numbered `0..prods_len()`, rules `0..rules_len()`,
//! tokens `0..tokens_len()`.

mod firsts;
mod idxnewtype;
pub mod simple;

pub use firsts::Firsts;
pub use idxnewtype::{PIdx, RIdx, SIdx, TIdx};

/// A single symbol on the right-hand side of a production: either a
/// reference to another rule, or a terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Symbol {
    Rule(RIdx),
    Token(TIdx)
}

impl Symbol {
    pub fn is_token(&self) -> bool {
        matches!(self, Symbol::Token(_))
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, Symbol::Rule(_))
    }
}

/// The boundary contract the recognizer depends on. Exposes rules,
/// predictions (a non-terminal's expanded productions), the TERMINAL/
/// NON-TERMINAL classification, and FIRST/NULLABLE — everything
/// `alcep`'s recognizers need and nothing about how the grammar was
/// loaded or how tokens are lexed.
///
/// Implementations must reject rule or terminal priorities: the
/// all-corrections parser has no notion of precedence (spec Non-goals).
/// `ganalyzer` never rejects on your behalf — `alcep::ParserBuilder` is
/// where that fatal check happens, by calling `has_priorities`.
pub trait GrammarAnalyzer {
    /// The non-terminal the grammar starts from.
    fn start_rule(&self) -> RIdx;

    /// Human-readable name of a rule, for diagnostics and debug export.
    fn rule_name(&self, ridx: RIdx) -> &str;

    /// The number of rules in the grammar.
    fn rules_len(&self) -> usize;

    /// All productions belonging to `ridx`, i.e. the set the Earley
    /// predictor expands a non-terminal into ("predictions" in spec §4.3).
    fn productions_for_rule(&self, ridx: RIdx) -> &[PIdx];

    /// The rule a production belongs to.
    fn prod_to_rule(&self, pidx: PIdx) -> RIdx;

    /// The symbol sequence of a production.
    fn production(&self, pidx: PIdx) -> &[Symbol];

    /// The number of productions in the grammar.
    fn prods_len(&self) -> usize;

    /// Human-readable name of a terminal.
    fn token_name(&self, tidx: TIdx) -> &str;

    /// The terminal's textual pattern (e.g. a literal Yacc terminal's
    /// quoted string), if the grammar records one distinct from its name.
    fn token_pattern(&self, tidx: TIdx) -> Option<&str>;

    /// The number of terminals in the grammar.
    fn tokens_len(&self) -> usize;

    /// Is `ridx` nullable (can it derive the empty string)?
    fn is_nullable(&self, ridx: RIdx) -> bool;

    /// The FIRST set of `ridx`, as terminal indices.
    fn firsts(&self, ridx: RIdx) -> &[TIdx];

    /// Does any production or terminal in this grammar carry a priority?
    /// The all-corrections parser has no notion of rule/terminal priority
    /// (spec §7); grammars that set one must be rejected at construction.
    fn has_priorities(&self) -> bool;

    /// The string an Insert/Replace edit of this terminal displays and
    /// applies: the terminal's textual pattern if present, else its name
    /// (spec §4.3).
    fn ins_label(&self, tidx: TIdx) -> &str {
        self.token_pattern(tidx).unwrap_or_else(|| self.token_name(tidx))
    }
}
