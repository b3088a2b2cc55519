//! The surgical reprinter.
//!
//! `print_node` is the single entry point. A node with no record prints
//! from scratch; a node with a record and an empty dirty set replays its
//! cached original slice verbatim; a dirty node is reconstructed region by
//! region, reusing original sub-slices for everything its mutation did not
//! touch. Region boundaries always come from child-node spans (plus the
//! cached element bounds and block-param spans), never from fixed offsets,
//! because sibling sizes vary.
//!
//! Every reconstruction routine drains the node's dirty set through a
//! [`DirtyLedger`]; a field left over at the end is an engine gap and is
//! reported as an [`ReprintError::UnhandledMutation`] rather than silently
//! dropped.

pub mod errors;
mod generic;

use std::collections::BTreeSet;

use crate::ast::{
    Attr, Block, Concat, Element, Field, HashPair, Mustache, Node, NodeId, SubExpression,
};
use crate::source::{Position, Span};
use crate::track::{NodeRecord, TemplateEditor};

pub use errors::ReprintError;

use generic::{hash_has_pairs, opens_with_chained_block};

pub(crate) fn print_node(editor: &TemplateEditor, id: NodeId) -> Result<String, ReprintError> {
    match editor.record(id) {
        None => generic::print(editor, id),
        Some(record) => {
            if !editor.is_dirty(id) {
                return Ok(record.slice.clone());
            }
            reconstruct(editor, id, record)
        }
    }
}

/// The dirty fields of one node, drained as a reconstruction routine
/// consumes them.
struct DirtyLedger {
    kind: &'static str,
    fields: BTreeSet<Field>,
}

impl DirtyLedger {
    fn new(editor: &TemplateEditor, id: NodeId) -> Self {
        Self {
            kind: editor.node(id).kind_name(),
            fields: editor.dirty_fields(id).clone(),
        }
    }

    fn take(&mut self, field: Field) -> bool {
        self.fields.remove(&field)
    }

    fn finish(self) -> Result<(), ReprintError> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let fields = self
            .fields
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ");
        Err(ReprintError::UnhandledMutation {
            kind: self.kind,
            fields,
        })
    }
}

fn reconstruct(
    editor: &TemplateEditor,
    id: NodeId,
    record: &NodeRecord,
) -> Result<String, ReprintError> {
    let span = editor.span(id).expect("recorded node has a span");
    let mut ledger = DirtyLedger::new(editor, id);
    let kind = editor.node(id).kind_name();

    let out = match (editor.node(id), &record.original) {
        (Node::Template(cur), Node::Template(_)) => print_body(editor, &cur.body, &mut ledger)?,
        (Node::Program(cur), Node::Program(_)) => print_body(editor, &cur.body, &mut ledger)?,
        (Node::Text(cur), _) => {
            ledger.take(Field::Chars);
            cur.chars.clone()
        }
        (Node::MustacheComment(cur), _) => {
            ledger.take(Field::Value);
            if record.slice.starts_with("{{!--") {
                format!("{{{{!--{}--}}}}", cur.value)
            } else {
                format!("{{{{!{}}}}}", cur.value)
            }
        }
        (Node::HtmlComment(cur), _) => {
            ledger.take(Field::Value);
            format!("<!--{}-->", cur.value)
        }
        (Node::StringLiteral(cur), _) => {
            ledger.take(Field::Value);
            if record.slice.starts_with('\'') {
                format!("'{}'", cur.value.replace('\\', "\\\\").replace('\'', "\\'"))
            } else {
                generic::double_quote(&cur.value)
            }
        }
        (Node::NumberLiteral(cur), _) => {
            ledger.take(Field::Value);
            cur.value.to_string()
        }
        (Node::BooleanLiteral(cur), _) => {
            ledger.take(Field::Value);
            cur.value.to_string()
        }
        (Node::Path(cur), _) => {
            let original_dirty = ledger.take(Field::Original);
            let parts_dirty = ledger.take(Field::Parts);
            if original_dirty || !parts_dirty {
                cur.original.clone()
            } else {
                cur.parts.join(".")
            }
        }
        (Node::HashPair(cur), Node::HashPair(orig)) => {
            reconstruct_hash_pair(editor, span, cur, orig, &mut ledger)?
        }
        (Node::Hash(cur), Node::Hash(orig)) => {
            ledger.take(Field::Pairs);
            join_collection(editor, &cur.pairs, &orig.pairs, None)?
        }
        (Node::Concat(cur), Node::Concat(orig)) => {
            reconstruct_concat(editor, span, cur, orig, &mut ledger)?
        }
        (Node::Attr(cur), Node::Attr(orig)) => {
            reconstruct_attr(editor, span, cur, orig, &mut ledger)?
        }
        (Node::Mustache(cur), Node::Mustache(orig)) => {
            reconstruct_mustache(editor, span, cur, orig, &mut ledger)?
        }
        (Node::SubExpression(cur), Node::SubExpression(orig)) => {
            reconstruct_sub_expression(editor, span, cur, orig, &mut ledger)?
        }
        (Node::Block(cur), Node::Block(orig)) => {
            reconstruct_block(editor, span, cur, orig, record, &mut ledger)?
        }
        (Node::Element(cur), Node::Element(orig)) => {
            reconstruct_element(editor, span, cur, orig, record, &mut ledger)?
        }
        _ => return Err(ReprintError::UnsupportedKind { kind }),
    };

    ledger.finish()?;
    Ok(out)
}

fn print_body(
    editor: &TemplateEditor,
    body: &[NodeId],
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    ledger.take(Field::Body);
    let mut out = String::new();
    for &id in body {
        out.push_str(&print_node(editor, id)?);
    }
    Ok(out)
}

// ---- region helpers -------------------------------------------------------

/// Original children are always parsed, and parsed nodes always carry a
/// span.
fn located(editor: &TemplateEditor, id: NodeId) -> Span {
    editor.span(id).expect("original child nodes are located")
}

fn is_ws(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_whitespace())
}

/// A joiner candidate that is empty or contains non-whitespace is rejected
/// and replaced by a single space.
fn sanitize_joiner(candidate: Option<String>) -> String {
    match candidate {
        Some(c) if is_ws(&c) => c,
        _ => " ".to_string(),
    }
}

/// Joiner for a whitespace-delimited collection whose cardinality changed:
/// the separator observed between the first two original elements, else the
/// caller-provided fallback (whitespace preceding the next present field),
/// else a single space.
fn synth_joiner(
    editor: &TemplateEditor,
    originals: &[NodeId],
    fallback: Option<String>,
) -> String {
    if originals.len() >= 2 {
        let sep = editor.source().between(
            located(editor, originals[0]).end,
            located(editor, originals[1]).start,
        );
        return sanitize_joiner(Some(sep));
    }
    sanitize_joiner(fallback)
}

/// Print a whitespace-delimited collection without its leading separator.
/// While the length is unchanged, per-position original separators are
/// reused; a cardinality change falls back to a synthesized joiner.
fn join_collection(
    editor: &TemplateEditor,
    current: &[NodeId],
    originals: &[NodeId],
    fallback: Option<String>,
) -> Result<String, ReprintError> {
    let mut out = String::new();
    if current.len() == originals.len() {
        for (i, &id) in current.iter().enumerate() {
            if i > 0 {
                out.push_str(&editor.source().between(
                    located(editor, originals[i - 1]).end,
                    located(editor, originals[i]).start,
                ));
            }
            out.push_str(&print_node(editor, id)?);
        }
    } else {
        let joiner = synth_joiner(editor, originals, fallback);
        for (i, &id) in current.iter().enumerate() {
            if i > 0 {
                out.push_str(&joiner);
            }
            out.push_str(&print_node(editor, id)?);
        }
    }
    Ok(out)
}

fn original_hash_has_pairs(editor: &TemplateEditor, hash: NodeId) -> bool {
    match editor.record(hash).map(|r| &r.original) {
        Some(Node::Hash(h)) => !h.pairs.is_empty(),
        _ => hash_has_pairs(editor, hash),
    }
}

// ---- call-like nodes ------------------------------------------------------

struct CallView<'a> {
    path: NodeId,
    params: &'a [NodeId],
    hash: NodeId,
}

/// Path, params and hash of a call-like node, from the path through the
/// last originally present part. Returns the text and the original end
/// position the caller's closing region starts at.
fn call_interior(
    editor: &TemplateEditor,
    cur: CallView<'_>,
    orig: CallView<'_>,
    ledger: &mut DirtyLedger,
) -> Result<(String, Position), ReprintError> {
    let path_span = located(editor, orig.path);
    ledger.take(Field::Path);
    let mut out = print_node(editor, cur.path)?;

    let orig_hash_span = located(editor, orig.hash);
    let orig_had_pairs = original_hash_has_pairs(editor, orig.hash);
    let prev_end = orig
        .params
        .last()
        .map(|&p| located(editor, p).end)
        .unwrap_or(path_span.end);

    ledger.take(Field::Params);
    if !cur.params.is_empty() {
        let leading = match orig.params.first() {
            Some(&first) => editor
                .source()
                .between(path_span.end, located(editor, first).start),
            None => " ".to_string(),
        };
        out.push_str(&leading);
        let fallback = if orig_had_pairs {
            Some(editor.source().between(prev_end, orig_hash_span.start))
        } else {
            None
        };
        out.push_str(&join_collection(editor, cur.params, orig.params, fallback)?);
    }

    ledger.take(Field::Hash);
    if hash_has_pairs(editor, cur.hash) {
        if orig_had_pairs {
            out.push_str(&editor.source().between(prev_end, orig_hash_span.start));
        } else {
            out.push(' ');
        }
        out.push_str(&print_node(editor, cur.hash)?);
    }

    let last_end = if orig_had_pairs {
        orig_hash_span.end
    } else if let Some(&p) = orig.params.last() {
        located(editor, p).end
    } else {
        path_span.end
    };
    Ok((out, last_end))
}

fn reconstruct_mustache(
    editor: &TemplateEditor,
    span: Span,
    cur: &Mustache,
    orig: &Mustache,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    let path_span = located(editor, orig.path);
    let trusting_dirty = ledger.take(Field::Trusting);
    let open = if trusting_dirty {
        if cur.trusting { "{{{" } else { "{{" }.to_string()
    } else {
        editor.source().between(span.start, path_span.start)
    };

    let (interior, last_end) = call_interior(
        editor,
        CallView {
            path: cur.path,
            params: &cur.params,
            hash: cur.hash,
        },
        CallView {
            path: orig.path,
            params: &orig.params,
            hash: orig.hash,
        },
        ledger,
    )?;

    let close_slice = editor.source().between(last_end, span.end);
    let close = if trusting_dirty {
        let ws = close_slice.trim_end_matches('}');
        format!("{}{}", ws, if cur.trusting { "}}}" } else { "}}" })
    } else {
        close_slice
    };
    Ok(format!("{open}{interior}{close}"))
}

fn reconstruct_sub_expression(
    editor: &TemplateEditor,
    span: Span,
    cur: &SubExpression,
    orig: &SubExpression,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    let path_span = located(editor, orig.path);
    let open = editor.source().between(span.start, path_span.start);
    let (interior, last_end) = call_interior(
        editor,
        CallView {
            path: cur.path,
            params: &cur.params,
            hash: cur.hash,
        },
        CallView {
            path: orig.path,
            params: &orig.params,
            hash: orig.hash,
        },
        ledger,
    )?;
    let close = editor.source().between(last_end, span.end);
    Ok(format!("{open}{interior}{close}"))
}

fn reconstruct_block(
    editor: &TemplateEditor,
    span: Span,
    cur: &Block,
    orig: &Block,
    record: &NodeRecord,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    let path_span = located(editor, orig.path);
    let chained_dirty = ledger.take(Field::Chained);
    let open = if chained_dirty {
        if cur.chained { "{{else " } else { "{{#" }.to_string()
    } else {
        editor.source().between(span.start, path_span.start)
    };

    let printed_path = print_node(editor, cur.path)?;
    let orig_path_slice = editor.source().slice(path_span);

    let (interior, last_end) = call_interior(
        editor,
        CallView {
            path: cur.path,
            params: &cur.params,
            hash: cur.hash,
        },
        CallView {
            path: orig.path,
            params: &orig.params,
            hash: orig.hash,
        },
        ledger,
    )?;

    let program_span = located(editor, orig.program);
    let bp_dirty = ledger.take(Field::BlockParams);
    let mut head_tail = String::new();
    match (record.block_params_span, cur.block_params.is_empty()) {
        (Some(bs), false) => {
            if bp_dirty {
                head_tail.push_str(&editor.source().between(last_end, bs.start));
                head_tail.push_str("as |");
                head_tail.push_str(&cur.block_params.join(" "));
                head_tail.push('|');
                head_tail.push_str(&editor.source().between(bs.end, program_span.start));
            } else {
                head_tail.push_str(&editor.source().between(last_end, program_span.start));
            }
        }
        (Some(bs), true) => {
            head_tail.push_str(&editor.source().between(bs.end, program_span.start));
        }
        (None, false) => {
            head_tail.push_str(" as |");
            head_tail.push_str(&cur.block_params.join(" "));
            head_tail.push('|');
            head_tail.push_str(&editor.source().between(last_end, program_span.start));
        }
        (None, true) => {
            head_tail.push_str(&editor.source().between(last_end, program_span.start));
        }
    }

    ledger.take(Field::Program);
    let program_out = print_node(editor, cur.program)?;

    ledger.take(Field::Inverse);
    let mut inverse_out = String::new();
    match (orig.inverse, cur.inverse) {
        (Some(original), Some(current)) if original == current => {
            // The original marker region (`{{else}}`, or nothing for a
            // chained continuation) is reused verbatim.
            inverse_out.push_str(
                &editor
                    .source()
                    .between(program_span.end, located(editor, original).start),
            );
            inverse_out.push_str(&print_node(editor, current)?);
        }
        (_, Some(current)) => {
            if !opens_with_chained_block(editor, current) {
                inverse_out.push_str("{{else}}");
            }
            inverse_out.push_str(&print_node(editor, current)?);
        }
        (_, None) => {}
    }

    let mut close_out = String::new();
    if !cur.chained {
        let orig_tail_end = located(editor, orig.inverse.unwrap_or(orig.program)).end;
        let close_region = editor.source().between(orig_tail_end, span.end);
        if printed_path == orig_path_slice && !close_region.is_empty() {
            close_out = close_region;
        } else {
            close_out.push_str("{{/");
            close_out.push_str(&printed_path);
            close_out.push_str("}}");
        }
    }

    Ok(format!(
        "{open}{interior}{head_tail}{program_out}{inverse_out}{close_out}"
    ))
}

// ---- elements -------------------------------------------------------------

/// Attributes, modifiers and comments in their open-tag source order.
/// Synthetic entries have no span and sort as equal to anything, which a
/// stable sort leaves exactly where the mutation put them.
fn open_tag_parts(editor: &TemplateEditor, e: &Element) -> Vec<NodeId> {
    let mut parts: Vec<NodeId> = e
        .attributes
        .iter()
        .chain(&e.modifiers)
        .chain(&e.comments)
        .copied()
        .collect();
    parts.sort_by(|&a, &b| match (editor.span(a), editor.span(b)) {
        (Some(x), Some(y)) => x.start.cmp(&y.start),
        _ => std::cmp::Ordering::Equal,
    });
    parts
}

fn reconstruct_element(
    editor: &TemplateEditor,
    span: Span,
    cur: &Element,
    orig: &Element,
    record: &NodeRecord,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    let bounds = record.bounds.expect("element record carries bounds");
    let tag_dirty = ledger.take(Field::Tag);
    let attrs_dirty = ledger.take(Field::Attributes);
    let mods_dirty = ledger.take(Field::Modifiers);
    let comments_dirty = ledger.take(Field::Comments);
    let parts_dirty = attrs_dirty || mods_dirty || comments_dirty;
    let children_dirty = ledger.take(Field::Children);
    let bp_dirty = ledger.take(Field::BlockParams);
    let sc_dirty = ledger.take(Field::SelfClosing);

    let orig_parts = open_tag_parts(editor, orig);
    let cur_parts = open_tag_parts(editor, cur);
    let had_parts = !orig_parts.is_empty();
    let parts_now = !cur_parts.is_empty();

    let tag_end = Position::new(span.start.line, span.start.column + 1 + orig.tag.len());
    let last_orig_end = orig_parts.last().map(|&p| located(editor, p).end);
    let bracket_len = if orig.self_closing { 2 } else { 1 };
    let bracket_start = Position::new(
        bounds.open_end.line,
        bounds.open_end.column.saturating_sub(bracket_len),
    );

    let wants_self_closing = cur.self_closing && cur.children.is_empty();
    let as_pair = if wants_self_closing {
        false
    } else {
        bounds.close_start.is_some() || !cur.children.is_empty() || (sc_dirty && !cur.self_closing)
    };

    let open_dirty = tag_dirty || parts_dirty || bp_dirty || sc_dirty;
    let content_anchor = record
        .block_params_span
        .map(|b| b.end)
        .or(last_orig_end)
        .unwrap_or(tag_end);

    let open_out = if !open_dirty {
        if as_pair && bounds.close_start.is_none() {
            // Flip to an open/close pair: keep everything up to the last
            // real open-tag content, dropping the whitespace and slash.
            let mut o = editor.source().between(span.start, content_anchor);
            o.push('>');
            o
        } else {
            editor.source().between(span.start, bounds.open_end)
        }
    } else {
        let mut o = format!("<{}", cur.tag);
        if parts_now {
            let leading = match orig_parts.first() {
                Some(&first) => editor
                    .source()
                    .between(tag_end, located(editor, first).start),
                None => " ".to_string(),
            };
            o.push_str(&leading);
            o.push_str(&join_collection(editor, &cur_parts, &orig_parts, None)?);
        }

        // Block-param clause, independent of how the tag closes.
        let pre_anchor = last_orig_end.unwrap_or(tag_end);
        match (record.block_params_span, cur.block_params.is_empty()) {
            (Some(bs), false) => {
                o.push_str(&editor.source().between(pre_anchor, bs.start));
                if bp_dirty {
                    o.push_str("as |");
                    o.push_str(&cur.block_params.join(" "));
                    o.push('|');
                } else {
                    o.push_str(&editor.source().slice(bs));
                }
            }
            (None, false) => {
                o.push_str(" as |");
                o.push_str(&cur.block_params.join(" "));
                o.push('|');
            }
            // Removed (or never present): the clause and its leading
            // whitespace vanish together.
            (Some(_), true) | (None, true) => {}
        }

        if wants_self_closing && bounds.close_start.is_some() {
            // A pair converted into a self-closing tag.
            o.push_str(" />");
        } else if as_pair && bounds.close_start.is_none() {
            o.push('>');
        } else if !parts_now
            && cur.block_params.is_empty()
            && (had_parts || record.block_params_span.is_some())
        {
            // Removing every attribute collapses the trailing pre-`>`
            // whitespace.
            o.push_str(&editor.source().between(bracket_start, bounds.open_end));
        } else {
            o.push_str(&editor.source().between(content_anchor, bounds.open_end));
        }
        o
    };

    let mut out = open_out;
    if as_pair {
        match bounds.close_start {
            Some(close_start) if !children_dirty => {
                out.push_str(&editor.source().between(bounds.open_end, close_start));
            }
            _ => {
                for &child in &cur.children {
                    out.push_str(&print_node(editor, child)?);
                }
            }
        }
        match bounds.close_start {
            Some(close_start) if !tag_dirty => {
                out.push_str(&editor.source().between(close_start, span.end));
            }
            _ => {
                out.push_str("</");
                out.push_str(&cur.tag);
                out.push('>');
            }
        }
    }
    Ok(out)
}

// ---- attributes and hash pairs --------------------------------------------

fn strip_quote(head: &str, quote: Option<char>) -> String {
    match quote {
        Some(q) => head.strip_suffix(q).unwrap_or(head).to_string(),
        None => head.to_string(),
    }
}

fn reconstruct_attr(
    editor: &TemplateEditor,
    span: Span,
    cur: &Attr,
    orig: &Attr,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    let value_span = located(editor, orig.value);
    let lead = editor.source().between(span.start, value_span.start);
    let trail = editor.source().between(value_span.end, span.end);
    let quote = lead.chars().last().filter(|&c| c == '"' || c == '\'');
    let has_eq = lead.contains('=');

    ledger.take(Field::Name);
    let after_name = lead.get(orig.name.len()..).unwrap_or("");
    let mut head = cur.name.clone();
    head.push_str(after_name);

    ledger.take(Field::Value);
    if cur.value == orig.value {
        let printed = print_node(editor, cur.value)?;
        if has_eq || printed.is_empty() {
            return Ok(format!("{head}{printed}{trail}"));
        }
        // A bare attribute gaining a value forces double quotes.
        return Ok(format!("{head}=\"{printed}\""));
    }

    let printed = print_node(editor, cur.value)?;
    let orig_is_text = matches!(editor.node(orig.value), Node::Text(_));
    match editor.node(cur.value) {
        Node::Concat(_) => {
            // The concat printer supplies its own delimiters.
            let base = strip_quote(&head, quote);
            let eq = if has_eq { "" } else { "=" };
            Ok(format!("{base}{eq}{printed}"))
        }
        Node::Text(t) => {
            if orig_is_text && has_eq {
                Ok(format!("{head}{printed}{trail}"))
            } else if t.chars.is_empty() && !has_eq {
                Ok(head)
            } else if !has_eq {
                Ok(format!("{head}=\"{printed}\""))
            } else {
                // An expression replaced by plain text forces double quotes.
                Ok(format!("{}\"{printed}\"", strip_quote(&head, quote)))
            }
        }
        _ => {
            // Plain text replaced by an expression drops the quotes.
            let base = strip_quote(&head, quote);
            let eq = if has_eq { "" } else { "=" };
            Ok(format!("{base}{eq}{printed}"))
        }
    }
}

fn reconstruct_hash_pair(
    editor: &TemplateEditor,
    span: Span,
    cur: &HashPair,
    orig: &HashPair,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    let value_span = located(editor, orig.value);
    let lead = editor.source().between(span.start, value_span.start);
    let mut out = String::new();
    if ledger.take(Field::Key) {
        out.push_str(&cur.key);
        out.push_str(lead.get(orig.key.len()..).unwrap_or("="));
    } else {
        out.push_str(&lead);
    }
    ledger.take(Field::Value);
    out.push_str(&print_node(editor, cur.value)?);
    out.push_str(&editor.source().between(value_span.end, span.end));
    Ok(out)
}

fn reconstruct_concat(
    editor: &TemplateEditor,
    span: Span,
    cur: &Concat,
    orig: &Concat,
    ledger: &mut DirtyLedger,
) -> Result<String, ReprintError> {
    ledger.take(Field::Parts);
    let mut out = String::new();
    match (orig.parts.first(), orig.parts.last()) {
        (Some(&first), Some(&last)) => {
            out.push_str(
                &editor
                    .source()
                    .between(span.start, located(editor, first).start),
            );
            for &part in &cur.parts {
                out.push_str(&print_node(editor, part)?);
            }
            out.push_str(&editor.source().between(located(editor, last).end, span.end));
        }
        _ => {
            out.push('"');
            for &part in &cur.parts {
                out.push_str(&print_node(editor, part)?);
            }
            out.push('"');
        }
    }
    Ok(out)
}
