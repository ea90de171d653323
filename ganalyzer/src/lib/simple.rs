//! `SimpleGrammar`: a minimal in-memory `GrammarAnalyzer` implementation.
//!
//! This is *not* a Yacc-grammar loader — loading grammar text is out of
//! scope for this workspace (spec.md's "external collaborators"). It is
//! just enough grammar representation, built programmatically via
//! `SimpleGrammarBuilder`, to drive the recognizer and transformer in
//! tests and examples. Rule/token lookup by name uses `IndexMap` so that
//! iteration order (and therefore `productions_for_rule`'s order) is
//! deterministic, matching the `ordered_sets` requirement the recognizer
//! depends on for family ordering (spec §5).

use indexmap::IndexMap;

use crate::firsts::{Firsts, GrammarShape};
use crate::{PIdx, RIdx, Symbol, TIdx};

pub struct SimpleGrammar {
    rule_names: Vec<String>,
    rule_productions: Vec<Vec<PIdx>>,
    prod_to_rule: Vec<RIdx>,
    productions: Vec<Vec<Symbol>>,
    token_names: Vec<String>,
    token_patterns: Vec<Option<String>>,
    start: RIdx,
    firsts: Firsts,
    has_priorities: bool
}

impl GrammarAnalyzer for SimpleGrammar {
    fn start_rule(&self) -> RIdx {
        self.start
    }

    fn rule_name(&self, ridx: RIdx) -> &str {
        &self.rule_names[usize::from(ridx)]
    }

    fn rules_len(&self) -> usize {
        self.rule_names.len()
    }

    fn productions_for_rule(&self, ridx: RIdx) -> &[PIdx] {
        &self.rule_productions[usize::from(ridx)]
    }

    fn prod_to_rule(&self, pidx: PIdx) -> RIdx {
        self.prod_to_rule[usize::from(pidx)]
    }

    fn production(&self, pidx: PIdx) -> &[Symbol] {
        &self.productions[usize::from(pidx)]
    }

    fn prods_len(&self) -> usize {
        self.productions.len()
    }

    fn token_name(&self, tidx: TIdx) -> &str {
        &self.token_names[usize::from(tidx)]
    }

    fn token_pattern(&self, tidx: TIdx) -> Option<&str> {
        self.token_patterns[usize::from(tidx)].as_deref()
    }

    fn tokens_len(&self) -> usize {
        self.token_names.len()
    }

    fn is_nullable(&self, ridx: RIdx) -> bool {
        self.firsts.is_nullable(ridx)
    }

    fn firsts(&self, ridx: RIdx) -> &[TIdx] {
        self.firsts.firsts(ridx)
    }

    fn has_priorities(&self) -> bool {
        self.has_priorities
    }
}

use super::GrammarAnalyzer;

/// Builds a `SimpleGrammar` one rule/token/production at a time.
#[derive(Default)]
pub struct SimpleGrammarBuilder {
    rule_idx: IndexMap<String, RIdx>,
    rule_names: Vec<String>,
    rule_productions: Vec<Vec<PIdx>>,
    prod_to_rule: Vec<RIdx>,
    productions: Vec<Vec<Symbol>>,
    prod_priorities: Vec<bool>,
    token_idx: IndexMap<String, TIdx>,
    token_names: Vec<String>,
    token_patterns: Vec<Option<String>>,
    token_priorities: Vec<bool>
}

impl SimpleGrammarBuilder {
    pub fn new() -> Self {
        SimpleGrammarBuilder::default()
    }

    /// Get-or-create the rule named `name`.
    pub fn rule(&mut self, name: &str) -> RIdx {
        if let Some(r) = self.rule_idx.get(name) {
            return *r;
        }
        let ridx = RIdx::new(self.rule_names.len());
        self.rule_names.push(name.to_string());
        self.rule_productions.push(Vec::new());
        self.rule_idx.insert(name.to_string(), ridx);
        ridx
    }

    /// Get-or-create a terminal named `name`, optionally with a distinct
    /// surface pattern (e.g. the literal text of a quoted Yacc terminal).
    pub fn token(&mut self, name: &str, pattern: Option<&str>) -> TIdx {
        if let Some(t) = self.token_idx.get(name) {
            return *t;
        }
        let tidx = TIdx::new(self.token_names.len());
        self.token_names.push(name.to_string());
        self.token_patterns.push(pattern.map(|p| p.to_string()));
        self.token_priorities.push(false);
        self.token_idx.insert(name.to_string(), tidx);
        tidx
    }

    /// Mark a previously created terminal as carrying a priority — used
    /// only to exercise the "unsupported grammar feature" rejection path.
    pub fn set_token_priority(&mut self, tidx: TIdx) {
        self.token_priorities[usize::from(tidx)] = true;
    }

    /// Add a production `ridx -> symbols` and mark it with a priority —
    /// used only to exercise the rejection path.
    pub fn production_with_priority(&mut self, ridx: RIdx, symbols: Vec<Symbol>) -> PIdx {
        let pidx = self.production(ridx, symbols);
        self.prod_priorities[usize::from(pidx)] = true;
        pidx
    }

    /// Add a production `ridx -> symbols`.
    pub fn production(&mut self, ridx: RIdx, symbols: Vec<Symbol>) -> PIdx {
        let pidx = PIdx::new(self.productions.len());
        self.productions.push(symbols);
        self.prod_to_rule.push(ridx);
        self.prod_priorities.push(false);
        self.rule_productions[usize::from(ridx)].push(pidx);
        pidx
    }

    /// Finish building, with `start` as the grammar's start rule.
    pub fn build(self, start: RIdx) -> SimpleGrammar {
        let shape = GrammarShape {
            rules_len: self.rule_names.len(),
            tokens_len: self.token_names.len(),
            productions: &self.productions,
            prod_to_rule: &self.prod_to_rule
        };
        let firsts = Firsts::new(&shape);
        let has_priorities =
            self.prod_priorities.iter().any(|x| *x) || self.token_priorities.iter().any(|x| *x);

        SimpleGrammar {
            rule_names: self.rule_names,
            rule_productions: self.rule_productions,
            prod_to_rule: self.prod_to_rule,
            productions: self.productions,
            token_names: self.token_names,
            token_patterns: self.token_patterns,
            start,
            firsts,
            has_priorities
        }
    }
}
