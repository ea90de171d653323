//! Earley items and sets, shared by both recognizer variants (spec §3,
//! §4.3, §4.4). Grounded on the Python original's `lark.parsers.
//! earley_common.Item` and on `lark.utils.OrderedSet`'s role in
//! `alcep.py`/`oalcep.py` (`self.Set = OrderedSet if ordered_sets else
//! set`).

use std::collections::HashSet;

use indexmap::IndexSet;

use ganalyzer::{GrammarAnalyzer, PIdx, Symbol};

/// `(rule, ptr, start)`: the usual dotted-rule Earley item. Two items are
/// equal iff their triples match (spec §3).
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct Item {
    pub rule: PIdx,
    pub ptr: usize,
    pub start: usize
}

impl Item {
    pub fn new(rule: PIdx, ptr: usize, start: usize) -> Item {
        Item { rule, ptr, start }
    }

    pub fn advance(&self) -> Item {
        Item { rule: self.rule, ptr: self.ptr + 1, start: self.start }
    }

    pub fn is_complete(&self, grammar: &dyn GrammarAnalyzer) -> bool {
        self.ptr == grammar.production(self.rule).len()
    }

    /// The symbol immediately after the dot, or `None` when complete.
    pub fn expect(&self, grammar: &dyn GrammarAnalyzer) -> Option<Symbol> {
        grammar.production(self.rule).get(self.ptr).copied()
    }
}

/// An Earley set: an insertion-ordered or unordered set of items,
/// depending on `ordered_sets` (spec §5 — iteration order determines the
/// order packed-node families are visited downstream).
#[derive(Clone)]
pub enum ItemSet {
    Ordered(IndexSet<Item>),
    Unordered(HashSet<Item>)
}

impl ItemSet {
    pub fn new(ordered: bool) -> ItemSet {
        if ordered { ItemSet::Ordered(IndexSet::new()) } else { ItemSet::Unordered(HashSet::new()) }
    }

    /// Insert `item`, returning `true` if it was not already present.
    pub fn insert(&mut self, item: Item) -> bool {
        match self {
            ItemSet::Ordered(s) => s.insert(item),
            ItemSet::Unordered(s) => s.insert(item)
        }
    }

    pub fn contains(&self, item: &Item) -> bool {
        match self {
            ItemSet::Ordered(s) => s.contains(item),
            ItemSet::Unordered(s) => s.contains(item)
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Item> + '_> {
        match self {
            ItemSet::Ordered(s) => Box::new(s.iter()),
            ItemSet::Unordered(s) => Box::new(s.iter())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ItemSet::Ordered(s) => s.len(),
            ItemSet::Unordered(s) => s.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
