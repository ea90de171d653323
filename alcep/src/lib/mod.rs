//! `alcep`: an all-corrections Earley parser. Given a grammar (via the
//! `ganalyzer` boundary contract) and an input token stream, it builds a
//! Correction Shared Packed Parse Forest (CSPPF) recognizing every
//! edit-distance correction of the input against the grammar, then
//! transforms that forest into the set of `WordOrderedCorrection`s it
//! represents.
//!
//! Three recognizer variants share one forest representation:
//!   * [`alcep::recognize`] — streaming, one Earley set at a time.
//!   * [`oalcep::recognize`] — offline, via one position-independent
//!     closure instantiated over the whole input grid.
//!   * [`alciep`] — interactive, asking a caller to pick one edit at a
//!     time instead of exploring every correction.
//!
//! [`transform::transform`] walks a finished forest and produces
//! [`correction::Correction`]s (or, with `TransformConfig::use_counted`,
//! [`correction::CountedCorrection`]s checked against a [`correction::
//! Policy`]).

pub mod alciep;
pub mod alcep;
pub mod correction;
pub mod debug;
mod earley;
pub mod editop;
pub mod error;
pub mod forest;
pub mod oalcep;
pub mod transform;

pub use correction::{Correction, CountedCorrection, EditCounts, Policy};
pub use earley::Item;
pub use editop::{EditOp, Ordering3};
pub use error::AlcepError;
pub use forest::{structurally_equal, Forest, Label, NodeIdx, PackedNode, SymbolNodeData};

use ganalyzer::GrammarAnalyzer;

/// Which recognizer variant to run (spec §4.3/§4.4/§4.5).
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ParserVariant {
    /// Streaming, position-by-position (spec §4.3).
    Alcep,
    /// Offline, closure-then-grid (spec §4.4).
    Oalcep
}

/// Builds a [`Parser`], rejecting grammars the all-corrections parser
/// cannot support (spec §7 "fatal, at construction").
pub struct ParserBuilder {
    variant: ParserVariant,
    ordered_sets: bool
}

impl ParserBuilder {
    pub fn new() -> ParserBuilder {
        ParserBuilder { variant: ParserVariant::Alcep, ordered_sets: true }
    }

    pub fn variant(mut self, variant: ParserVariant) -> ParserBuilder {
        self.variant = variant;
        self
    }

    /// Whether Earley-set iteration order is insertion-ordered
    /// (`true`, the default) or arbitrary (`false`) — spec §5. Forest
    /// family order is always insertion-ordered regardless of this flag.
    pub fn ordered_sets(mut self, ordered_sets: bool) -> ParserBuilder {
        self.ordered_sets = ordered_sets;
        self
    }

    pub fn build<'g>(self, grammar: &'g dyn GrammarAnalyzer) -> Result<Parser<'g>, AlcepError> {
        if grammar.has_priorities() {
            log::warn!("grammar declares rule/terminal priorities, which the all-corrections parser cannot honour");
            return Err(AlcepError::UnsupportedGrammarFeature(
                "rule and terminal priorities are not supported by the all-corrections parser".to_string()
            ));
        }
        log::debug!("built a {:?} parser (ordered_sets={})", self.variant, self.ordered_sets);
        Ok(Parser { grammar, variant: self.variant, ordered_sets: self.ordered_sets })
    }
}

impl Default for ParserBuilder {
    fn default() -> ParserBuilder {
        ParserBuilder::new()
    }
}

/// A validated grammar plus the chosen recognizer variant, ready to parse
/// token streams.
pub struct Parser<'g> {
    grammar: &'g dyn GrammarAnalyzer,
    variant: ParserVariant,
    ordered_sets: bool
}

impl<'g> Parser<'g> {
    pub fn grammar(&self) -> &'g dyn GrammarAnalyzer {
        self.grammar
    }

    /// Run the configured recognizer variant over `tokens`, returning the
    /// resulting forest and its root node.
    pub fn parse(&self, tokens: &[String], term_matcher: alcep::TermMatcher<'_>) -> Result<(Forest, NodeIdx), AlcepError> {
        match self.variant {
            ParserVariant::Alcep => alcep::recognize(self.grammar, tokens, term_matcher, self.ordered_sets),
            ParserVariant::Oalcep => oalcep::recognize(self.grammar, tokens, term_matcher)
        }
    }
}

/// End-to-end tests of spec §8's numbered invariants, run against the
/// full recognize-then-transform pipeline rather than any one module in
/// isolation.
#[cfg(test)]
mod invariant_test {
    use ganalyzer::simple::SimpleGrammarBuilder;
    use ganalyzer::{GrammarAnalyzer, PIdx, RIdx, Symbol, TIdx};

    use crate::correction::{EditCounts, Policy};
    use crate::editop::EditOp;
    use crate::forest::{Forest, Label};
    use crate::transform::{transform, transform_counted, TransformConfig};
    use crate::{alcep, forest, oalcep};

    fn exact_matcher(grammar: &dyn GrammarAnalyzer, tidx: TIdx, token: &str) -> bool {
        grammar.token_name(tidx) == token
    }

    /// These tests exercise the full recognize-then-transform pipeline, so
    /// a failure is easiest to diagnose with the recognizer's own
    /// `log::trace!`/`log::debug!` output visible — run with
    /// `RUST_LOG=trace` to see it.
    fn init_logging() {
        let _ = env_logger::try_init();
    }

    /// I1/I3: every correction out of a full recognize-then-transform run
    /// applies to a string the grammar accepts, and its input projection
    /// reproduces the original (possibly erroneous) input word.
    #[test]
    fn every_correction_applies_in_language_and_projects_the_input() {
        init_logging();
        let mut b = SimpleGrammarBuilder::new();
        let s = b.rule("S");
        let a = b.token("a", None);
        b.production(s, vec![Symbol::Token(a)]);
        let grammar = b.build(s);

        let tokens = vec!["b".to_string()];
        let (f, root) = alcep::recognize(&grammar, &tokens, &exact_matcher, true).unwrap();
        let corrections = transform(&f, root, &TransformConfig::default()).unwrap();

        assert!(!corrections.is_empty());
        for c in &corrections {
            assert_eq!(c.apply(), "a", "every accepted correction must realise the one-word language L(G) = {{a}}");
            assert_eq!(c.input_projection(), "b", "the input projection must reproduce the original token stream");
            assert_eq!(c.ops().len() % 2, 1, "a word-ordered correction always has an odd number of operations");
        }
    }

    /// I4: alcep and oalcep must build structurally equal forests for the
    /// same `(grammar, tokens)`.
    #[test]
    fn alcep_and_oalcep_produce_structurally_equal_forests() {
        init_logging();
        let mut b = SimpleGrammarBuilder::new();
        let s = b.rule("S");
        let a = b.token("a", None);
        b.production(s, vec![Symbol::Token(a)]);
        let grammar = b.build(s);

        let tokens = vec!["b".to_string()];
        let (f1, root1) = alcep::recognize(&grammar, &tokens, &exact_matcher, true).unwrap();
        let (f2, root2) = oalcep::recognize(&grammar, &tokens, &exact_matcher).unwrap();

        assert!(forest::structurally_equal(&f1, root1, &f2, root2));
    }

    /// I6: a counted transform never returns a correction whose combined
    /// edit counters breach `Policy::max_edits`.
    #[test]
    fn counted_transform_honours_max_edits_bound() {
        init_logging();
        let mut forest = Forest::new();
        let left = forest.get_or_create_symbol(Label::Symbol(Symbol::Rule(RIdx::new(0))), 0, 1);
        let read = forest.new_token(EditOp::read("x"));
        forest.add_family(left, PIdx::new(0), 0, None, Some(read));

        let right = forest.get_or_create_symbol(Label::Symbol(Symbol::Rule(RIdx::new(1))), 1, 2);
        let delete = forest.new_token(EditOp::delete("y"));
        forest.add_family(right, PIdx::new(1), 1, None, Some(delete));

        let root = forest.get_or_create_symbol(Label::Symbol(Symbol::Rule(RIdx::new(2))), 0, 2);
        forest.add_family(root, PIdx::new(2), 1, Some(left), Some(right));

        let cfg = TransformConfig::default();

        let strict = Policy { max_edits: Some(0), ..Policy::unlimited() };
        let rejected = transform_counted(&forest, root, &cfg, &strict).unwrap();
        assert!(rejected.is_empty(), "one deletion breaches a max_edits=0 ceiling");

        let permissive = Policy { max_edits: Some(1), ..Policy::unlimited() };
        let accepted = transform_counted(&forest, root, &cfg, &permissive).unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].counts(), EditCounts { insertions: 0, deletions: 1, replacements: 0 });
    }

    /// I7: the `only_smallest` result contains no correction that some
    /// other same-length correction in the pre-filter set beats.
    #[test]
    fn only_smallest_drops_the_dominated_delete() {
        init_logging();
        let mut forest = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let root = forest.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let read = forest.new_token(EditOp::read("a"));
        let delete = forest.new_token(EditOp::delete("a"));
        forest.add_family(root, PIdx::new(0), 0, None, Some(read));
        forest.add_family(root, PIdx::new(1), 0, None, Some(delete));

        let cfg = TransformConfig { only_smallest: true, ..TransformConfig::default() };
        let corrections = transform(&forest, root, &cfg).unwrap();
        assert_eq!(corrections.len(), 1, "Read is strictly smaller than Delete on the same letter (spec §4.1)");
        assert_eq!(corrections[0].apply(), "a");
    }

    /// spec §11 scenario 3: `S -> a | aS`, input `"b"` — only the `Replace`
    /// correction survives `only_smallest` (it beats the delete+insert
    /// alternative of the same edit-op length under the §4.1 ordering).
    #[test]
    fn scenario_3_replace_beats_delete_insert_on_mismatched_single_token() {
        init_logging();
        let mut b = SimpleGrammarBuilder::new();
        let s = b.rule("S");
        let a = b.token("a", None);
        b.production(s, vec![Symbol::Token(a)]);
        b.production(s, vec![Symbol::Token(a), Symbol::Rule(s)]);
        let grammar = b.build(s);

        let tokens = vec!["b".to_string()];
        let (f, root) = alcep::recognize(&grammar, &tokens, &exact_matcher, true).unwrap();
        let corrections = transform(&f, root, &TransformConfig::default()).unwrap();

        let shortest = corrections.iter().map(|c| c.edit_count()).min().unwrap();
        let shortest_group: Vec<_> = corrections.iter().filter(|c| c.edit_count() == shortest).collect();
        assert_eq!(shortest_group.len(), 1, "exactly one correction should survive at the minimal edit length");
        assert_eq!(shortest_group[0].ops()[1], EditOp::replace("b", "a"));
    }

    /// spec §11 scenario 4: `E -> E "+" E | "x"`, input `"x+x"` — the
    /// read-only correction exists and is the unique smallest correction
    /// (no other correction has as few edits, and it dominates every other
    /// correction of the same minimal edit length).
    #[test]
    fn scenario_4_unique_smallest_is_all_reads() {
        init_logging();
        let mut b = SimpleGrammarBuilder::new();
        let e = b.rule("E");
        let x = b.token("x", None);
        let plus = b.token("+", None);
        b.production(e, vec![Symbol::Rule(e), Symbol::Token(plus), Symbol::Rule(e)]);
        b.production(e, vec![Symbol::Token(x)]);
        let grammar = b.build(e);

        let tokens = vec!["x".to_string(), "+".to_string(), "x".to_string()];
        let (f, root) = alcep::recognize(&grammar, &tokens, &exact_matcher, true).unwrap();
        let corrections = transform(&f, root, &TransformConfig::default()).unwrap();

        let shortest = corrections.iter().map(|c| c.edit_count()).min().unwrap();
        assert_eq!(shortest, 3, "one non-insert edit per input token is the minimum possible");
        let shortest_group: Vec<_> = corrections.iter().filter(|c| c.edit_count() == shortest).collect();
        assert_eq!(shortest_group.len(), 1, "the all-reads correction must be the unique survivor at the minimum length");

        let unique = shortest_group[0];
        assert_eq!(unique.apply(), "x+x");
        assert_eq!(
            unique.ops(),
            &[
                EditOp::insert(""),
                EditOp::read("x"),
                EditOp::insert(""),
                EditOp::read("+"),
                EditOp::insert(""),
                EditOp::read("x"),
                EditOp::insert("")
            ]
        );
    }

    /// spec §11 scenario 5: `E -> E "+" E | "x"`, input `"+"` with
    /// `max_ins=2, max_edits=3` — the two-insertion completion is included,
    /// and nothing requiring 3+ insertions is.
    #[test]
    fn scenario_5_counted_bounds_include_and_exclude() {
        init_logging();
        let mut b = SimpleGrammarBuilder::new();
        let e = b.rule("E");
        let x = b.token("x", None);
        let plus = b.token("+", None);
        b.production(e, vec![Symbol::Rule(e), Symbol::Token(plus), Symbol::Rule(e)]);
        b.production(e, vec![Symbol::Token(x)]);
        let grammar = b.build(e);

        let tokens = vec!["+".to_string()];
        let (f, root) = alcep::recognize(&grammar, &tokens, &exact_matcher, true).unwrap();

        let cfg = TransformConfig::default();
        let policy = Policy { max_ins: Some(2), max_edits: Some(3), ..Policy::unlimited() };
        let corrections = transform_counted(&f, root, &cfg, &policy).unwrap();

        assert!(
            corrections.iter().any(|c| c.apply() == "x+x" && c.counts().insertions == 2),
            "the two-insertion completion `Insert(x) Read(+) Insert(x)` must be included"
        );
        for c in &corrections {
            assert!(c.counts().insertions <= 2, "no returned correction may require 3 or more insertions");
        }
    }

    /// I4 over a nullable grammar (`S -> A a ; A -> epsilon | a`): alcep's
    /// completer emits a `(None, None)` family for the epsilon derivation
    /// of `A`, so this is the grammar class most likely to expose a
    /// divergence between alcep's and oalcep's node-liveness treatment
    /// (DESIGN.md's documented `home_node`/`node_at` distinction).
    #[test]
    fn i4_holds_for_a_nullable_grammar() {
        init_logging();
        let mut b = SimpleGrammarBuilder::new();
        let s = b.rule("S");
        let a_rule = b.rule("A");
        let a = b.token("a", None);
        b.production(s, vec![Symbol::Rule(a_rule), Symbol::Token(a)]);
        b.production(a_rule, vec![]);
        b.production(a_rule, vec![Symbol::Token(a)]);
        let grammar = b.build(s);

        let tokens = vec!["a".to_string()];
        let (f1, root1) = alcep::recognize(&grammar, &tokens, &exact_matcher, true).unwrap();
        let (f2, root2) = oalcep::recognize(&grammar, &tokens, &exact_matcher).unwrap();

        assert!(forest::structurally_equal(&f1, root1, &f2, root2));
    }
}
