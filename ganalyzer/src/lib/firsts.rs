// Copyright (c) 2018 King's College London
// created by the Software Development Team <http://soft-dev.org/>
//
// The Universal Permissive License (UPL), Version 1.0. See `mod.rs` for the full text.

//! FIRST and NULLABLE set computation, grounded on `cfgrammar::yacc::follows`'s
//! approach: a fixpoint loop over `Vob` bitsets (one per rule, bit-width
//! `tokens_len`), iterating productions back-to-front-free (FIRST only
//! needs a forward scan, unlike FOLLOW) until no bit changes.

use vob::Vob;

use crate::{PIdx, RIdx, Symbol, TIdx};

/// The shape of a grammar, in exactly the form `Firsts::new` needs to run
/// its fixpoint: production lists grouped by rule, and each production's
/// symbol sequence. `simple::SimpleGrammar` builds one of these once, up
/// front, and keeps the result cached for the lifetime of the grammar.
pub struct GrammarShape<'a> {
    pub rules_len: usize,
    pub tokens_len: usize,
    pub productions: &'a [Vec<Symbol>],
    pub prod_to_rule: &'a [RIdx]
}

/// All FIRST sets and the NULLABLE set for a grammar.
#[derive(Debug)]
pub struct Firsts {
    firsts: Vec<Vob>,
    firsts_cache: Vec<Vec<TIdx>>,
    nullable: Vob
}

impl Firsts {
    /// Compute FIRST and NULLABLE for the given grammar shape.
    pub fn new(shape: &GrammarShape) -> Self {
        let mut firsts = Vec::with_capacity(shape.rules_len);
        for _ in 0..shape.rules_len {
            firsts.push(Vob::from_elem(shape.tokens_len, false));
        }
        let mut nullable = Vob::from_elem(shape.rules_len, false);

        loop {
            let mut changed = false;
            for (pidx, prod) in shape.productions.iter().enumerate() {
                let ridx = shape.prod_to_rule[pidx];
                let ridx_u = usize::from(ridx);

                // NULLABLE: this production derives epsilon if every
                // symbol in it is itself nullable (an empty production
                // trivially qualifies).
                let prod_nullable = prod.iter().all(|sym| match sym {
                    Symbol::Token(_) => false,
                    Symbol::Rule(r) => nullable[usize::from(*r)]
                });
                if prod_nullable && !nullable[ridx_u] {
                    nullable.set(ridx_u, true);
                    changed = true;
                }

                // FIRST: scan symbols left to right; a token terminates
                // the scan (after being added); a nullable rule's firsts
                // are added and the scan continues, a non-nullable rule's
                // firsts are added and the scan stops.
                for sym in prod.iter() {
                    match sym {
                        Symbol::Token(tidx) => {
                            if firsts[ridx_u].set(usize::from(*tidx), true) {
                                changed = true;
                            }
                            break;
                        }
                        Symbol::Rule(r) => {
                            let r_u = usize::from(*r);
                            // A rule's FIRST or'd into itself (direct left
                            // recursion, e.g. `E -> E '+' E`) is a no-op —
                            // skip straight to the nullable check, since
                            // split_at_mut(r_u) would otherwise be asked
                            // for an out-of-bounds `a[ridx_u]` when
                            // ridx_u == r_u.
                            if ridx_u != r_u {
                                // or() returns true if the receiver changed.
                                let (lo, hi) = if ridx_u < r_u {
                                    let (a, b) = firsts.split_at_mut(r_u);
                                    (&mut a[ridx_u], &b[0])
                                } else {
                                    let (a, b) = firsts.split_at_mut(ridx_u);
                                    (&mut b[0], &a[r_u])
                                };
                                if lo.or(hi) {
                                    changed = true;
                                }
                            }
                            if !nullable[r_u] {
                                break;
                            }
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let firsts_cache = firsts
            .iter()
            .map(|v: &Vob| (0..shape.tokens_len).filter(|i| v[*i]).map(TIdx::new).collect())
            .collect();

        Firsts { firsts, firsts_cache, nullable }
    }

    pub fn is_nullable(&self, ridx: RIdx) -> bool {
        self.nullable[usize::from(ridx)]
    }

    pub fn firsts(&self, ridx: RIdx) -> &[TIdx] {
        &self.firsts_cache[usize::from(ridx)]
    }

    pub fn firsts_bitset(&self, ridx: RIdx) -> &Vob {
        &self.firsts[usize::from(ridx)]
    }
}

#[cfg(test)]
mod test {
    use super::{Firsts, GrammarShape};
    use crate::{RIdx, Symbol, TIdx};

    // E: T E2 ; E2: '+' T E2 | ; T: F T2 ; T2: '*' F T2 | ; F: '(' E ')' | 'ID' ;
    // Rules: E=0 E2=1 T=2 T2=3 F=4. Tokens: '+'=0 '*'=1 '('=2 ')'=3 'ID'=4
    fn grammar() -> (Vec<Vec<Symbol>>, Vec<RIdx>) {
        let productions = vec![
            vec![Symbol::Rule(RIdx::new(2)), Symbol::Rule(RIdx::new(1))], // p0: E -> T E2
            vec![Symbol::Token(TIdx::new(0)), Symbol::Rule(RIdx::new(2)), Symbol::Rule(RIdx::new(1))], // p1: E2 -> + T E2
            vec![],                                                      // p2: E2 -> epsilon
            vec![Symbol::Rule(RIdx::new(4)), Symbol::Rule(RIdx::new(3))], // p3: T -> F T2
            vec![Symbol::Token(TIdx::new(1)), Symbol::Rule(RIdx::new(4)), Symbol::Rule(RIdx::new(3))], // p4: T2 -> * F T2
            vec![],                                                      // p5: T2 -> epsilon
            vec![Symbol::Token(TIdx::new(2)), Symbol::Rule(RIdx::new(0)), Symbol::Token(TIdx::new(3))], // p6: F -> ( E )
            vec![Symbol::Token(TIdx::new(4))]                             // p7: F -> ID
        ];
        let prod_to_rule = vec![
            RIdx::new(0),
            RIdx::new(1),
            RIdx::new(1),
            RIdx::new(2),
            RIdx::new(3),
            RIdx::new(3),
            RIdx::new(4),
            RIdx::new(4)
        ];
        (productions, prod_to_rule)
    }

    #[test]
    fn firsts_and_nullable() {
        let (productions, prod_to_rule) = grammar();
        let shape = GrammarShape {
            rules_len: 5,
            tokens_len: 5,
            productions: &productions,
            prod_to_rule: &prod_to_rule
        };
        let firsts = Firsts::new(&shape);

        assert!(firsts.is_nullable(RIdx::new(1))); // E2
        assert!(firsts.is_nullable(RIdx::new(3))); // T2
        assert!(!firsts.is_nullable(RIdx::new(0))); // E
        assert!(!firsts.is_nullable(RIdx::new(2))); // T
        assert!(!firsts.is_nullable(RIdx::new(4))); // F

        let e_firsts: Vec<u32> = firsts.firsts(RIdx::new(0)).iter().map(|t| u32::from(*t)).collect();
        assert_eq!(e_firsts, vec![2, 4]); // '(' and 'ID'
    }

    // E: E '+' E | 'x' ; direct left recursion (spec §11 scenarios 4/5).
    #[test]
    fn direct_left_recursion_does_not_panic() {
        let productions = vec![
            vec![Symbol::Rule(RIdx::new(0)), Symbol::Token(TIdx::new(0)), Symbol::Rule(RIdx::new(0))], // p0: E -> E + E
            vec![Symbol::Token(TIdx::new(1))]                                                          // p1: E -> x
        ];
        let prod_to_rule = vec![RIdx::new(0), RIdx::new(0)];
        let shape = GrammarShape { rules_len: 1, tokens_len: 2, productions: &productions, prod_to_rule: &prod_to_rule };
        let firsts = Firsts::new(&shape);

        assert!(!firsts.is_nullable(RIdx::new(0)));
        let e_firsts: Vec<u32> = firsts.firsts(RIdx::new(0)).iter().map(|t| u32::from(*t)).collect();
        assert_eq!(e_firsts, vec![1]); // 'x' only; '+' never starts E
    }
}
