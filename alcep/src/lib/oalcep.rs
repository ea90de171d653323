//! OALCEP: the offline all-corrections Earley recognizer (spec §4.4),
//! grounded on the Python original's `lark.parsers.oalcep.
//! OptimizedBaseParser`.
//!
//! Where ALCEP interleaves closure and shift phases position by position,
//! OALCEP exploits that an item's closure relationships don't depend on
//! *where* it sits, only on its production and dot: it computes one
//! position-independent closure (`q0`, the items reachable directly from
//! the start symbol; `xi`, every item derived while closing that closure)
//! and then instantiates the resulting edges at every `(start, end)` grid
//! cell of the input, `0 <= start <= end <= n`, relying on the same
//! `Forest` node cache ALCEP uses to dedup by `(label, start, end)`.
//!
//! Deviation from the Python original, noted in `DESIGN.md`: its deletion
//! loops always read `tokens[0]` rather than `tokens[i]` inside a loop
//! over `i` — apparently a copy/paste slip, since every other rule (and
//! ALCEP's own deletion rule) consumes the token at the position being
//! shifted past. This implementation uses `tokens[i]`, matching ALCEP and
//! producing the structurally-equal forest invariant I4 requires.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;

use ganalyzer::{GrammarAnalyzer, RIdx, Symbol};

use crate::alcep::label_always;
use crate::earley::Item;
use crate::editop::EditOp;
use crate::error::AlcepError;
use crate::forest::{Forest, Label, NodeIdx};

type TermMatcher<'a> = &'a dyn Fn(&dyn GrammarAnalyzer, ganalyzer::TIdx, &str) -> bool;

fn add_item(item: Item, q0: &mut IndexSet<Item>, xi: &mut IndexSet<Item>, worklist: &mut VecDeque<Item>) {
    if q0.insert(item) {
        worklist.push_back(item);
    }
    xi.insert(item);
}

/// The position-independent closure: `q0` are items reachable from the
/// start symbol, seeded at `(rule, 0, 0)`; `xi` are the items produced
/// while closing `q0` under the completer/predictor/insertion rules (spec
/// §4.4 "the template closure").
fn compute_q0_xi(grammar: &dyn GrammarAnalyzer) -> (IndexSet<Item>, IndexSet<Item>) {
    let mut q0: IndexSet<Item> = IndexSet::new();
    let mut xi: IndexSet<Item> = IndexSet::new();
    let mut worklist: VecDeque<Item> = VecDeque::new();

    for &pidx in grammar.productions_for_rule(grammar.start_rule()) {
        let item = Item::new(pidx, 0, 0);
        if q0.insert(item) {
            worklist.push_back(item);
        }
    }

    let mut held_completions: HashSet<RIdx> = HashSet::new();

    while let Some(item) = worklist.pop_front() {
        if item.is_complete(grammar) {
            let origin = grammar.prod_to_rule(item.rule);
            held_completions.insert(origin);

            let originators: Vec<Item> =
                q0.iter().copied().filter(|o| o.expect(grammar) == Some(Symbol::Rule(origin))).collect();
            for originator in originators {
                add_item(originator.advance(), &mut q0, &mut xi, &mut worklist);
            }
        } else {
            match item.expect(grammar).expect("non-complete item always expects a symbol") {
                Symbol::Rule(b) => {
                    for &pidx in grammar.productions_for_rule(b) {
                        add_item(Item::new(pidx, 0, 0), &mut q0, &mut xi, &mut worklist);
                    }
                    if held_completions.contains(&b) {
                        add_item(item.advance(), &mut q0, &mut xi, &mut worklist);
                    }
                }
                Symbol::Token(_) => {
                    add_item(item.advance(), &mut q0, &mut xi, &mut worklist);
                }
            }
        }
    }

    (q0, xi)
}

/// The node for `item` instantiated at grid cell `(start, end)`, or `None`
/// on the zero-width diagonal (`start == end`) for a not-yet-complete item
/// with an empty dot — nothing has been recognized for it there.
fn node_at(item: &Item, start: usize, end: usize, grammar: &dyn GrammarAnalyzer, forest: &mut Forest) -> Option<NodeIdx> {
    if item.ptr == 0 && !item.is_complete(grammar) && start == end {
        None
    } else {
        Some(forest.get_or_create_symbol(label_always(item, grammar), start, end))
    }
}

fn create_node(item: &Item, start: usize, end: usize, grammar: &dyn GrammarAnalyzer, forest: &mut Forest) -> NodeIdx {
    forest.get_or_create_symbol(label_always(item, grammar), start, end)
}

#[allow(clippy::too_many_arguments)]
fn compute_edges(
    grammar: &dyn GrammarAnalyzer,
    forest: &mut Forest,
    q0: &IndexSet<Item>,
    xi: &IndexSet<Item>,
    n: usize,
    tokens: &[String],
    term_matcher: TermMatcher
) {
    // Epsilon completions: an item that is complete with an empty dot
    // derives its rule from a zero-symbol production (e.g. `A -> `), so it
    // contributes a direct `(None, None)` family at every zero-width span
    // `(j, j)` — mirroring `alcep::compute_earley_set`'s explicit
    // `add_family(node, ..., None, None)` for the same case. Without this,
    // a nullable rule's own symbol node never gets a family at all here,
    // since every other loop below only ever creates families by advancing
    // some *other* item past it.
    for item in xi {
        if item.ptr == 0 && item.is_complete(grammar) {
            for j in 0..=n {
                let node = create_node(item, j, j, grammar, forest);
                if forest.symbol(node).children.is_empty() {
                    forest.add_family(node, item.rule, j, None, None);
                }
            }
        }
    }

    // Deletion: q0 at split 0, then xi at every split j.
    for item in q0 {
        for i in 0..n {
            let left = node_at(item, 0, i, grammar, forest);
            let del = forest.new_token(EditOp::delete(&tokens[i]));
            let new_node = create_node(item, 0, i + 1, grammar, forest);
            forest.add_family(new_node, item.rule, 0, left, Some(del));
        }
    }
    for item in xi {
        for i in 1..n {
            for j in 1..=i {
                let left = node_at(item, j, i, grammar, forest);
                let del = forest.new_token(EditOp::delete(&tokens[i]));
                let new_node = create_node(item, j, i + 1, grammar, forest);
                forest.add_family(new_node, item.rule, j, left, Some(del));
            }
        }
    }

    // Insertion: items expecting a terminal, advanced without consuming input.
    for item in q0 {
        if let Some(Symbol::Token(t)) = item.expect(grammar) {
            let advanced = item.advance();
            for i in 0..=n {
                let left = node_at(item, 0, i, grammar, forest);
                let ins = forest.new_token(EditOp::insert(grammar.ins_label(t)));
                let new_node = create_node(&advanced, 0, i, grammar, forest);
                forest.add_family(new_node, item.rule, 0, left, Some(ins));
            }
        }
    }
    for item in xi {
        if let Some(Symbol::Token(t)) = item.expect(grammar) {
            let advanced = item.advance();
            for i in 0..=n {
                for j in 1..=i {
                    let left = node_at(item, j, i, grammar, forest);
                    let ins = forest.new_token(EditOp::insert(grammar.ins_label(t)));
                    let new_node = create_node(&advanced, j, i, grammar, forest);
                    forest.add_family(new_node, item.rule, j, left, Some(ins));
                }
            }
        }
    }

    // Scanner/replacement: items expecting a terminal, consuming one input token.
    for item in q0 {
        if let Some(Symbol::Token(t)) = item.expect(grammar) {
            let advanced = item.advance();
            for i in 0..n {
                let left = node_at(item, 0, i, grammar, forest);
                let tok = if term_matcher(grammar, t, &tokens[i]) {
                    forest.new_token(EditOp::read(&tokens[i]))
                } else {
                    forest.new_token(EditOp::replace(&tokens[i], grammar.ins_label(t)))
                };
                let new_node = create_node(&advanced, 0, i + 1, grammar, forest);
                forest.add_family(new_node, item.rule, 0, left, Some(tok));
            }
        }
    }
    for item in xi {
        if let Some(Symbol::Token(t)) = item.expect(grammar) {
            let advanced = item.advance();
            for i in 0..n {
                for j in 1..=i {
                    let left = node_at(item, j, i, grammar, forest);
                    let tok = if term_matcher(grammar, t, &tokens[i]) {
                        forest.new_token(EditOp::read(&tokens[i]))
                    } else {
                        forest.new_token(EditOp::replace(&tokens[i], grammar.ins_label(t)))
                    };
                    let new_node = create_node(&advanced, j, i + 1, grammar, forest);
                    forest.add_family(new_node, item.rule, j, left, Some(tok));
                }
            }
        }
    }

    // Completer: q0 complete items against q0 originators (split fixed at 0)...
    for item in q0 {
        if !item.is_complete(grammar) {
            continue;
        }
        let origin = grammar.prod_to_rule(item.rule);
        for originator in q0 {
            if originator.expect(grammar) != Some(Symbol::Rule(origin)) {
                continue;
            }
            let new_item = originator.advance();
            let left = node_at(originator, 0, 0, grammar, forest);
            for i in 0..=n {
                let right = node_at(item, 0, i, grammar, forest);
                let new_node = create_node(&new_item, 0, i, grammar, forest);
                forest.add_family(new_node, new_item.rule, 0, left, right);
            }
        }
    }
    // ...and xi complete items against both xi and q0 originators, at every split.
    for item in xi {
        if !item.is_complete(grammar) {
            continue;
        }
        let origin = grammar.prod_to_rule(item.rule);

        for originator in xi {
            if originator.expect(grammar) != Some(Symbol::Rule(origin)) {
                continue;
            }
            let new_item = originator.advance();
            for i in 0..=n {
                for j in 1..=i {
                    let right = node_at(item, j, i, grammar, forest);
                    for k in 1..=j {
                        let left = node_at(originator, k, j, grammar, forest);
                        let new_node = create_node(&new_item, k, i, grammar, forest);
                        forest.add_family(new_node, new_item.rule, k, left, right);
                    }
                }
            }
        }

        for originator in q0 {
            if originator.expect(grammar) != Some(Symbol::Rule(origin)) {
                continue;
            }
            let new_item = originator.advance();
            for i in 0..=n {
                for j in 1..=i {
                    let right = node_at(item, j, i, grammar, forest);
                    let left = node_at(originator, 0, j, grammar, forest);
                    let new_node = create_node(&new_item, 0, i, grammar, forest);
                    forest.add_family(new_node, new_item.rule, 0, left, right);
                }
            }
        }
    }
}

/// Run the offline recognizer over `tokens`, returning the forest and its
/// root node. Produces a forest structurally equal to `alcep::recognize`'s
/// (spec invariant I4) via a completely different construction strategy.
pub fn recognize(grammar: &dyn GrammarAnalyzer, tokens: &[String], term_matcher: TermMatcher) -> Result<(Forest, NodeIdx), AlcepError> {
    log::trace!("oalcep::recognize starting over {} tokens", tokens.len());
    let mut forest = Forest::new();
    let start = grammar.start_rule();
    let n = tokens.len();

    let (q0, xi) = compute_q0_xi(grammar);
    log::trace!("closure produced {} q0 items, {} xi items", q0.len(), xi.len());
    compute_edges(grammar, &mut forest, &q0, &xi, n, tokens, term_matcher);

    let root = forest.find_symbol(Label::Symbol(Symbol::Rule(start)), 0, n).ok_or_else(|| {
        log::warn!("oalcep::recognize found no complete root item at position {n}");
        AlcepError::MissingRoot
    })?;
    Ok((forest, root))
}
