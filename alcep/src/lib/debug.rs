//! Debug export of a finished CSPPF (spec §6), grounded on the Python
//! original's `forest_to_html_dot_visitor.ForestToHtmlDotVisitor` (which
//! itself subclasses `lark.parsers.earley_forest.ForestToPyDotVisitor`, not
//! present in `original_source/` — that class lives in `lark` proper, not
//! in the distilled sources this spec was built from).
//!
//! The Python original shells out to `pydot`/`networkx`/`pyvis` to render
//! an actual interactive HTML graph. Per `SPEC_FULL.md`'s ambient-stack
//! section, this port stays dependency-free and pure-Rust: [`export_dot`]
//! writes a Graphviz DOT description via `std::fmt::Write`, and
//! [`export_html`] wraps that DOT text in a minimal static HTML page (a
//! `<pre>` block, not a rendered graph) — good enough to inspect a forest
//! by eye or feed to an external `dot` binary, without needing one here.
//! `SPEC_FULL.md` also notes the original's `parse()` enumerates one
//! artifact per accepted root (there can be more than one structurally
//! distinct root at `(start, 0, n)` before dedup), so both functions take
//! a slice of roots rather than a single one.

use std::fmt::Write;

use crate::forest::{Forest, Label, NodeIdx};

fn node_id(idx: NodeIdx) -> String {
    format!("node_{idx}")
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn label_text(forest: &Forest, idx: NodeIdx, label: Label, start: usize, end: usize) -> String {
    let _ = forest;
    match label {
        Label::Symbol(sym) => format!("{sym:?}, {start}, {end}"),
        Label::Intermediate(rule, ptr) => format!("{rule:?}:{ptr}, {start}, {end}")
    }
}

fn write_node(out: &mut String, forest: &Forest, idx: NodeIdx, visited: &mut std::collections::HashSet<NodeIdx>) {
    if !visited.insert(idx) {
        return;
    }

    if forest.is_token(idx) {
        let op = forest.token(idx);
        let _ = writeln!(out, "  {} [shape=box, label=\"{}\"];", node_id(idx), escape(&op.to_string()));
        return;
    }

    let data = forest.symbol(idx);
    let label = label_text(forest, idx, data.label, data.start, data.end);
    let _ = writeln!(out, "  {} [shape=ellipse, label=\"{}\"];", node_id(idx), escape(&label));

    for (i, packed) in data.children.iter().enumerate() {
        let packed_id = format!("{}_p{}", node_id(idx), i);
        let _ = writeln!(out, "  {packed_id} [shape=point];");
        let _ = writeln!(out, "  {} -> {};", node_id(idx), packed_id);

        if let Some(left) = packed.left {
            let _ = writeln!(out, "  {packed_id} -> {};", node_id(left));
            write_node(out, forest, left, visited);
        }
        if let Some(right) = packed.right {
            let _ = writeln!(out, "  {packed_id} -> {};", node_id(right));
            write_node(out, forest, right, visited);
        }
    }
}

/// Render `roots` (and every node reachable from them) as a Graphviz DOT
/// digraph: ellipse nodes are symbol/intermediate nodes, boxes are token
/// leaves, and small point nodes stand in for packed-node families.
pub fn export_dot(forest: &Forest, roots: &[NodeIdx]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph csppf {{");
    let mut visited = std::collections::HashSet::new();
    for &root in roots {
        write_node(&mut out, forest, root, &mut visited);
    }
    let _ = writeln!(out, "}}");
    out
}

/// Wrap [`export_dot`]'s output in a minimal static HTML page. Not a
/// rendered graph (spec's debug flag must never change recognizer
/// behaviour, and no graph-rendering crate is part of the teacher's
/// stack) — a `<pre>` block a reader, or an external `dot` invocation,
/// can consume directly.
pub fn export_html(forest: &Forest, roots: &[NodeIdx]) -> String {
    let dot = export_dot(forest, roots);
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>CSPPF</title></head>\n\
         <body><pre>{}</pre></body></html>\n",
        dot.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
    )
}
