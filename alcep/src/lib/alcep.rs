//! ALCEP: the streaming all-corrections Earley recognizer (spec §4.3),
//! grounded on the Python original's `lark.parsers.alcep.BaseParser`.
//!
//! Each input position alternates a *closure* phase (`compute_earley_set`:
//! completer, predictor, insertion, applied to a fixed point) and a *shift*
//! phase (`init_next_earley_set`: scanner/replacement, plus an unconditional
//! deletion of every item) that seeds the next position.
//!
//! Two departures from the Python original, both noted in `DESIGN.md`:
//! `to_scan` is recomputed as a filter over the closed Earley set rather
//! than accumulated incrementally during closure (the three Python scripts
//! disagree on exactly how `to_scan` gets built — spec.md's Open Questions
//! flags this — so this implementation picks the unambiguous, obviously
//! correct definition instead of replicating any one of them); and a forest
//! node's identity is looked up on demand from `(label, start, end)`
//! rather than cached on the item object itself, since Rust's `Item` is a
//! plain `Copy` value rather than a mutable Python object.

use std::collections::VecDeque;

use indexmap::IndexMap;

use ganalyzer::{GrammarAnalyzer, RIdx, Symbol, TIdx};

use crate::earley::{Item, ItemSet};
use crate::editop::EditOp;
use crate::error::AlcepError;
use crate::forest::{Forest, Label, NodeIdx};

/// A matcher between an expected terminal and a concrete input token,
/// supplied by the (out-of-scope) lexer/grammar-loader collaborator.
pub type TermMatcher<'a> = &'a dyn Fn(&dyn GrammarAnalyzer, TIdx, &str) -> bool;

pub(crate) fn label_always(item: &Item, grammar: &dyn GrammarAnalyzer) -> Label {
    if item.is_complete(grammar) {
        Label::Symbol(Symbol::Rule(grammar.prod_to_rule(item.rule)))
    } else {
        Label::Intermediate(item.rule, item.ptr)
    }
}

fn create_node(item: &Item, at: usize, grammar: &dyn GrammarAnalyzer, forest: &mut Forest) -> NodeIdx {
    forest.get_or_create_symbol(label_always(item, grammar), item.start, at)
}

/// The node for `item` as it stands at position `at`, or `None` if `item`
/// is still sitting at its own creation position with an empty dot
/// (`ptr == 0`, not complete, `item.start == at`) — nothing has been
/// recognized for it yet, so there is nothing to point a packed node's
/// `left` at. Once such an item is shifted forward by a deletion
/// (`item.start < at`), it does have a node: the deletion rule creates one
/// unconditionally, regardless of `ptr`.
fn home_node(item: &Item, at: usize, grammar: &dyn GrammarAnalyzer, forest: &mut Forest) -> Option<NodeIdx> {
    if item.ptr == 0 && !item.is_complete(grammar) && item.start == at {
        None
    } else {
        Some(create_node(item, at, grammar, forest))
    }
}

/// Apply the completer, predictor and insertion rules to Earley set `i`
/// until no more items are added (spec §4.3 "Closure phase").
fn compute_earley_set(grammar: &dyn GrammarAnalyzer, forest: &mut Forest, positions: &mut [ItemSet], i: usize) {
    let mut held_completions: IndexMap<RIdx, NodeIdx> = IndexMap::new();
    let mut worklist: VecDeque<Item> = positions[i].iter().copied().collect();

    while let Some(item) = worklist.pop_front() {
        if item.is_complete(grammar) {
            let origin = grammar.prod_to_rule(item.rule);
            let node = create_node(&item, i, grammar, forest);
            if item.ptr == 0 && forest.symbol(node).children.is_empty() {
                // A direct (epsilon) completion: register the empty derivation once.
                forest.add_family(node, item.rule, item.start, None, None);
            }
            if item.start == i {
                held_completions.insert(origin, node);
            }

            let originators: Vec<Item> = positions[item.start]
                .iter()
                .copied()
                .filter(|o| o.expect(grammar) == Some(Symbol::Rule(origin)))
                .collect();
            for originator in originators {
                let new_item = originator.advance();
                let new_node = create_node(&new_item, i, grammar, forest);
                let originator_node = home_node(&originator, item.start, grammar, forest);
                forest.add_family(new_node, new_item.rule, originator.start, originator_node, Some(node));
                if positions[i].insert(new_item) {
                    worklist.push_back(new_item);
                }
            }
        } else {
            match item.expect(grammar).expect("non-complete item always expects a symbol") {
                Symbol::Rule(b) => {
                    for &pidx in grammar.productions_for_rule(b) {
                        let new_item = Item::new(pidx, 0, i);
                        if positions[i].insert(new_item) {
                            worklist.push_back(new_item);
                        }
                    }
                    if let Some(&held_node) = held_completions.get(&b) {
                        let new_item = item.advance();
                        let new_node = create_node(&new_item, i, grammar, forest);
                        let item_node = home_node(&item, i, grammar, forest);
                        forest.add_family(new_node, new_item.rule, item.start, item_node, Some(held_node));
                        if positions[i].insert(new_item) {
                            worklist.push_back(new_item);
                        }
                    }
                }
                Symbol::Token(t) => {
                    let new_item = item.advance();
                    let new_node = create_node(&new_item, i, grammar, forest);
                    let item_node = home_node(&item, i, grammar, forest);
                    let ins_node = forest.new_token(EditOp::insert(grammar.ins_label(t)));
                    forest.add_family(new_node, item.rule, new_item.start, item_node, Some(ins_node));
                    if positions[i].insert(new_item) {
                        worklist.push_back(new_item);
                    }
                }
            }
        }
    }
}

/// Apply the scanner/replacement rules (for items expecting a terminal)
/// and the deletion rule (for every item, unconditionally) to seed
/// position `i + 1` from input token `token` (spec §4.3 "Shift phase").
fn init_next_earley_set(
    grammar: &dyn GrammarAnalyzer,
    forest: &mut Forest,
    positions: &[ItemSet],
    i: usize,
    token: &str,
    term_matcher: TermMatcher,
    ordered_sets: bool
) -> ItemSet {
    let mut next = ItemSet::new(ordered_sets);

    for item in positions[i].iter().copied().collect::<Vec<_>>() {
        if let Some(Symbol::Token(tidx)) = item.expect(grammar) {
            let new_item = item.advance();
            let new_node = create_node(&new_item, i + 1, grammar, forest);
            let item_node = home_node(&item, i, grammar, forest);
            let tok_node = if term_matcher(grammar, tidx, token) {
                forest.new_token(EditOp::read(token))
            } else {
                forest.new_token(EditOp::replace(token, grammar.ins_label(tidx)))
            };
            forest.add_family(new_node, item.rule, new_item.start, item_node, Some(tok_node));
            next.insert(new_item);
        }

        let deleted = item;
        let new_node = create_node(&deleted, i + 1, grammar, forest);
        let item_node = home_node(&item, i, grammar, forest);
        let del_node = forest.new_token(EditOp::delete(token));
        forest.add_family(new_node, deleted.rule, deleted.start, item_node, Some(del_node));
        next.insert(deleted);
    }

    next
}

/// Run the streaming recognizer over `tokens`, returning the forest and
/// its root node — the unique symbol node `(start_symbol, 0, n)` (spec
/// §4.3). `grammar.has_priorities()` having been checked is the caller's
/// responsibility (`ParserBuilder`, spec §7).
pub fn recognize(
    grammar: &dyn GrammarAnalyzer,
    tokens: &[String],
    term_matcher: TermMatcher,
    ordered_sets: bool
) -> Result<(Forest, NodeIdx), AlcepError> {
    log::trace!("alcep::recognize starting over {} tokens", tokens.len());
    let mut forest = Forest::new();
    let start = grammar.start_rule();
    let n = tokens.len();

    let mut positions: Vec<ItemSet> = vec![ItemSet::new(ordered_sets)];
    for &pidx in grammar.productions_for_rule(start) {
        positions[0].insert(Item::new(pidx, 0, 0));
    }

    for i in 0..n {
        compute_earley_set(grammar, &mut forest, &mut positions, i);
        let next_set = init_next_earley_set(grammar, &mut forest, &positions, i, &tokens[i], term_matcher, ordered_sets);
        positions.push(next_set);
    }
    compute_earley_set(grammar, &mut forest, &mut positions, n);

    let root_exists = positions[n]
        .iter()
        .any(|it| it.is_complete(grammar) && it.start == 0 && grammar.prod_to_rule(it.rule) == start);
    if !root_exists {
        log::warn!("alcep::recognize found no complete root item at position {n}");
        return Err(AlcepError::MissingRoot);
    }
    let root = forest
        .find_symbol(Label::Symbol(Symbol::Rule(start)), 0, n)
        .expect("a qualifying complete item implies its node was created");
    Ok((forest, root))
}
