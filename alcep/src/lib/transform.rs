//! The forest-to-corrections transformer (spec §4.6), grounded on
//! `corrections/transformer.py`'s `CSPPFToCorrectionTransformer`.
//!
//! The Python original walks the forest with a hand-rolled generator/stack
//! machine to stay under CPython's recursion limit. Rust's call stack has
//! no comparable ceiling for forests this size, so this port uses ordinary
//! recursion with explicit memoization (`memo_symbol`/`memo_packed`/
//! `memo_token`) and cycle detection (`visiting_symbol`/`visiting_packed`,
//! plus the `path_stack` of symbol/intermediate nodes currently being
//! descended into) instead — the memoization keys, anchor-path semantics,
//! and aggregation order are unchanged; only the walking mechanism is
//! idiomatic Rust rather than a transliterated generator loop. Noted in
//! `DESIGN.md`.
//!
//! A packed node is never shared between two symbol nodes (it belongs to
//! exactly one parent's family list), so cycles can only pass back through
//! a shared symbol/intermediate node — `path_stack` tracks only those,
//! which is enough to detect every cycle the CSPPF can actually contain.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use crate::correction::{Correction, CountedCorrection, EditCounts, Policy};
use crate::editop::{EditOp, Ordering3};
use crate::error::AlcepError;
use crate::forest::{Forest, NodeIdx, PackedNode};

/// The anchor-indexed path used to key the memo tables (spec §4.6
/// "anchor symbols reset the path"). `None` until the walk passes through
/// its first zero-width (`start == end`) symbol node; from then on, every
/// subsequent symbol/intermediate node visited is appended.
type PathKey = Option<Vec<NodeIdx>>;

fn down_path(incoming: &PathKey, node: NodeIdx, start: usize, end: usize) -> PathKey {
    match incoming {
        Some(p) => {
            let mut next = p.clone();
            next.push(node);
            Some(next)
        }
        None if start == end => Some(vec![node]),
        None => None
    }
}

/// Either output shape the transformer can build a leaf/aggregate from —
/// a plain `Correction`, or one with per-kind edit counters checked
/// against a `Policy` (spec §4.2's counted variant).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
enum Output {
    Plain(Correction),
    Counted(CountedCorrection)
}

impl Output {
    fn concatenate(&self, other: &Output, simplify: bool, policy: &Policy) -> Option<Output> {
        match (self, other) {
            (Output::Plain(a), Output::Plain(b)) => a.concatenate(b, simplify).map(Output::Plain),
            (Output::Counted(a), Output::Counted(b)) => a.concatenate(b, simplify, policy).map(Output::Counted),
            _ => unreachable!("a single transform run never mixes plain and counted outputs")
        }
    }

    fn compare(&self, other: &Output) -> Ordering3 {
        let result = match (self, other) {
            (Output::Plain(a), Output::Plain(b)) => a.compare(b),
            (Output::Counted(a), Output::Counted(b)) => a.compare(b),
            _ => unreachable!("a single transform run never mixes plain and counted outputs")
        };
        result.expect("word-ordered corrections of equal length never produce an invalid comparison")
    }
}

/// Options controlling which corrections the transformer keeps (spec
/// §4.6). `only_smallest`/`smallest_dynamically` implement the smallest-
/// corrections filter described there; `only_simplified` rejects any
/// concatenation that would produce a non-simplified correction (spec
/// §4.2.1).
#[derive(Clone, Debug)]
pub struct TransformConfig {
    pub only_simplified: bool,
    pub only_smallest: bool,
    pub smallest_dynamically: bool
}

impl Default for TransformConfig {
    fn default() -> TransformConfig {
        TransformConfig { only_simplified: false, only_smallest: true, smallest_dynamically: false }
    }
}

struct Engine<'a> {
    forest: &'a Forest,
    cfg: &'a TransformConfig,
    use_counted: bool,
    policy: &'a Policy,
    memo_symbol: HashMap<(NodeIdx, PathKey), IndexSet<Output>>,
    visiting_symbol: HashSet<(NodeIdx, PathKey)>,
    memo_packed: HashMap<(NodeIdx, usize, PathKey), IndexSet<Output>>,
    visiting_packed: HashSet<(NodeIdx, usize, PathKey)>,
    memo_token: HashMap<NodeIdx, IndexSet<Output>>,
    path_stack: Vec<NodeIdx>
}

impl<'a> Engine<'a> {
    fn new(forest: &'a Forest, cfg: &'a TransformConfig, use_counted: bool, policy: &'a Policy) -> Engine<'a> {
        Engine {
            forest,
            cfg,
            use_counted,
            policy,
            memo_symbol: HashMap::new(),
            visiting_symbol: HashSet::new(),
            memo_packed: HashMap::new(),
            visiting_packed: HashSet::new(),
            memo_token: HashMap::new(),
            path_stack: Vec::new()
        }
    }

    fn apply_smallest_if_dynamic(&self, set: IndexSet<Output>) -> IndexSet<Output> {
        if self.cfg.only_smallest && self.cfg.smallest_dynamically {
            smallest(&set)
        } else {
            set
        }
    }

    fn visit_token(&mut self, node: NodeIdx) -> IndexSet<Output> {
        if let Some(cached) = self.memo_token.get(&node) {
            return cached.clone();
        }
        let op = self.forest.token(node).clone();
        let output = self.build_leaf(op);
        let mut set = IndexSet::new();
        set.insert(output);
        self.memo_token.insert(node, set.clone());
        set
    }

    fn build_leaf(&self, op: EditOp) -> Output {
        if !self.use_counted {
            let ops = match &op {
                EditOp::Insert(_) => vec![op],
                _ => vec![EditOp::insert(""), op, EditOp::insert("")]
            };
            return Output::Plain(Correction::new_unchecked(ops));
        }

        let (ops, counts) = match &op {
            EditOp::Insert(_) => (vec![op], EditCounts { insertions: 1, deletions: 0, replacements: 0 }),
            EditOp::Replace { .. } => {
                (vec![EditOp::insert(""), op, EditOp::insert("")], EditCounts { insertions: 0, deletions: 0, replacements: 1 })
            }
            EditOp::Read(letter) => {
                let mut ops = vec![EditOp::insert("")];
                for ch in letter.chars() {
                    ops.push(EditOp::read(ch.to_string()));
                    ops.push(EditOp::insert(""));
                }
                (ops, EditCounts::default())
            }
            EditOp::Delete(_) => {
                (vec![EditOp::insert(""), op, EditOp::insert("")], EditCounts { insertions: 0, deletions: 1, replacements: 0 })
            }
        };
        Output::Counted(CountedCorrection::new(Correction::new_unchecked(ops), counts))
    }

    fn visit_symbol(&mut self, node: NodeIdx, incoming: &PathKey) -> IndexSet<Output> {
        let key = (node, incoming.clone());
        if let Some(cached) = self.memo_symbol.get(&key) {
            return cached.clone();
        }
        if self.visiting_symbol.contains(&key) || self.path_stack.contains(&node) {
            return IndexSet::new();
        }

        self.visiting_symbol.insert(key.clone());
        self.path_stack.push(node);

        let (start, end, children_len) = {
            let data = self.forest.symbol(node);
            (data.start, data.end, data.children.len())
        };
        let child_path = down_path(incoming, node, start, end);

        let mut aggregated: IndexSet<Output> = IndexSet::new();
        for idx in 0..children_len {
            let packed = self.forest.symbol(node).children[idx].clone();
            let contribution = self.visit_packed(node, idx, &packed, &child_path);
            for c in contribution {
                aggregated.insert(c);
            }
        }

        self.path_stack.pop();
        self.visiting_symbol.remove(&key);

        let result = if aggregated.is_empty() { aggregated } else { self.apply_smallest_if_dynamic(aggregated) };
        self.memo_symbol.insert(key, result.clone());
        result
    }

    fn visit_packed(&mut self, owner: NodeIdx, idx: usize, packed: &PackedNode, incoming: &PathKey) -> IndexSet<Output> {
        let key = (owner, idx, incoming.clone());
        if let Some(cached) = self.memo_packed.get(&key) {
            return cached.clone();
        }
        if self.visiting_packed.contains(&key) {
            return IndexSet::new();
        }
        self.visiting_packed.insert(key.clone());

        let right = packed.right.expect("a packed node always has a right child");
        let right_set =
            if self.forest.is_token(right) { self.visit_token(right) } else { self.visit_symbol(right, incoming) };

        let result = if right_set.is_empty() {
            self.visiting_packed.remove(&key);
            return IndexSet::new();
        } else if let Some(left) = packed.left {
            let left_set = self.visit_symbol(left, incoming);
            if left_set.is_empty() {
                self.visiting_packed.remove(&key);
                return IndexSet::new();
            }
            let mut product = IndexSet::new();
            for l in &left_set {
                for r in &right_set {
                    if let Some(combined) = l.concatenate(r, self.cfg.only_simplified, self.policy) {
                        product.insert(combined);
                    }
                }
            }
            if product.is_empty() {
                self.visiting_packed.remove(&key);
                return IndexSet::new();
            }
            self.apply_smallest_if_dynamic(product)
        } else {
            right_set
        };

        self.visiting_packed.remove(&key);
        self.memo_packed.insert(key, result.clone());
        result
    }
}

/// Remove every correction that has some other correction in the same set
/// strictly smaller than it (spec §4.6's smallest-corrections filter,
/// ported from `__compute_smallest_corrections`).
fn smallest(set: &IndexSet<Output>) -> IndexSet<Output> {
    let items: Vec<Output> = set.iter().cloned().collect();
    let mut possible: IndexSet<Output> = set.clone();
    let mut result = IndexSet::new();

    for (i, candidate) in items.iter().enumerate() {
        if !possible.contains(candidate) {
            continue;
        }
        let mut exists_no_smaller = true;
        for other in items.iter().skip(i + 1) {
            match candidate.compare(other) {
                Ordering3::Smaller => {
                    possible.shift_remove(other);
                }
                Ordering3::Bigger => {
                    possible.shift_remove(candidate);
                    exists_no_smaller = false;
                    break;
                }
                _ => {}
            }
        }
        if exists_no_smaller {
            result.insert(candidate.clone());
        }
    }

    result
}

fn ensure_symbol_root(forest: &Forest, root: NodeIdx) -> Result<(), AlcepError> {
    if forest.is_token(root) {
        return Err(AlcepError::InvalidCorrectionShape("transform root must be a symbol node, not a token".to_string()));
    }
    Ok(())
}

/// Transform a finished CSPPF into the set of plain `Correction`s it
/// represents (spec §4.6).
pub fn transform(forest: &Forest, root: NodeIdx, cfg: &TransformConfig) -> Result<Vec<Correction>, AlcepError> {
    ensure_symbol_root(forest, root)?;
    log::trace!("transform: walking forest of {} nodes from root {root}", forest.len());
    let policy = Policy::unlimited();
    let mut engine = Engine::new(forest, cfg, false, &policy);
    let mut set = engine.visit_symbol(root, &None);
    if cfg.only_smallest && !cfg.smallest_dynamically {
        set = smallest(&set);
    }
    log::debug!("transform produced {} corrections", set.len());
    Ok(set
        .into_iter()
        .map(|o| match o {
            Output::Plain(c) => c,
            Output::Counted(_) => unreachable!("transform never builds counted outputs")
        })
        .collect())
}

/// Transform a finished CSPPF into the set of `CountedCorrection`s it
/// represents, each already checked against `policy`'s ceilings at every
/// concatenation (spec §4.2 "Counted variant").
pub fn transform_counted(
    forest: &Forest,
    root: NodeIdx,
    cfg: &TransformConfig,
    policy: &Policy
) -> Result<Vec<CountedCorrection>, AlcepError> {
    ensure_symbol_root(forest, root)?;
    log::trace!("transform_counted: walking forest of {} nodes from root {root}", forest.len());
    let mut engine = Engine::new(forest, cfg, true, policy);
    let mut set = engine.visit_symbol(root, &None);
    if cfg.only_smallest && !cfg.smallest_dynamically {
        set = smallest(&set);
    }
    log::debug!("transform_counted produced {} corrections", set.len());
    Ok(set
        .into_iter()
        .map(|o| match o {
            Output::Counted(c) => c,
            Output::Plain(_) => unreachable!("transform_counted never builds plain outputs")
        })
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::forest::Label;
    use ganalyzer::{RIdx, Symbol};

    /// A single symbol node `(S, 0, 1)` with one packed node whose right
    /// child is a `Read('a')` token — the simplest possible forest.
    #[test]
    fn transforms_a_single_read() {
        let mut forest = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let root = forest.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let tok = forest.new_token(EditOp::read("a"));
        forest.add_family(root, ganalyzer::PIdx::new(0), 0, None, Some(tok));

        let corrections = transform(&forest, root, &TransformConfig::default()).unwrap();
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].apply(), "a");
        assert_eq!(corrections[0].edit_count(), 1);
    }

    /// Two packed node families on the same node (an ambiguous read vs.
    /// replace) should union into two distinct corrections.
    #[test]
    fn unions_ambiguous_families() {
        let mut forest = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let root = forest.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let read = forest.new_token(EditOp::read("a"));
        let replace = forest.new_token(EditOp::replace("a", "b"));
        forest.add_family(root, ganalyzer::PIdx::new(0), 0, None, Some(read));
        forest.add_family(root, ganalyzer::PIdx::new(1), 0, None, Some(replace));

        let corrections = transform(&forest, root, &TransformConfig::default()).unwrap();
        let applied: Vec<String> = corrections.iter().map(|c| c.apply()).collect();
        assert!(applied.contains(&"a".to_string()));
        assert!(applied.contains(&"b".to_string()));
    }

    /// The smallest-corrections filter keeps Read over Delete for the same
    /// letter (spec §4.1 — `Read < Delete`).
    #[test]
    fn smallest_filter_prefers_read_over_delete() {
        let mut forest = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let root = forest.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let read = forest.new_token(EditOp::read("a"));
        let delete = forest.new_token(EditOp::delete("a"));
        forest.add_family(root, ganalyzer::PIdx::new(0), 0, None, Some(read));
        forest.add_family(root, ganalyzer::PIdx::new(1), 0, None, Some(delete));

        let cfg = TransformConfig { only_smallest: true, ..TransformConfig::default() };
        let corrections = transform(&forest, root, &cfg).unwrap();
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].apply(), "a");
    }

    #[test]
    fn counted_read_splits_per_character_with_no_edit_cost() {
        let mut forest = Forest::new();
        let s = Symbol::Rule(RIdx::new(0));
        let root = forest.get_or_create_symbol(Label::Symbol(s), 0, 1);
        let tok = forest.new_token(EditOp::read("ab"));
        forest.add_family(root, ganalyzer::PIdx::new(0), 0, None, Some(tok));

        let cfg = TransformConfig::default();
        let policy = Policy::unlimited();
        let corrections = transform_counted(&forest, root, &cfg, &policy).unwrap();
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].apply(), "ab");
        assert_eq!(corrections[0].counts(), EditCounts::default());
    }

    #[test]
    fn rejects_token_root() {
        let mut forest = Forest::new();
        let tok = forest.new_token(EditOp::read("a"));
        assert!(transform(&forest, tok, &TransformConfig::default()).is_err());
    }
}
