//! The from-scratch printer for synthetic subtrees.
//!
//! Used whenever a node has no record, i.e. it was built programmatically
//! rather than parsed. Recursion goes through [`print_node`], so any parsed
//! fragment embedded in a synthetic tree still replays its original text.

use crate::ast::{Element, Node, NodeId};
use crate::track::TemplateEditor;

use super::{print_node, ReprintError};

pub(super) fn print(editor: &TemplateEditor, id: NodeId) -> Result<String, ReprintError> {
    match editor.node(id) {
        Node::Template(t) => print_all(editor, &t.body),
        Node::Program(p) => print_all(editor, &p.body),
        Node::Element(e) => print_element(editor, e),
        Node::Mustache(m) => {
            let (open, close) = if m.trusting { ("{{{", "}}}") } else { ("{{", "}}") };
            let mut out = String::from(open);
            out.push_str(&call_interior(editor, m.path, &m.params, m.hash)?);
            out.push_str(close);
            Ok(out)
        }
        Node::Block(b) => {
            let mut out = String::new();
            if b.chained {
                out.push_str("{{else ");
            } else {
                out.push_str("{{#");
            }
            out.push_str(&call_interior(editor, b.path, &b.params, b.hash)?);
            if !b.block_params.is_empty() {
                out.push_str(" as |");
                out.push_str(&b.block_params.join(" "));
                out.push('|');
            }
            out.push_str("}}");
            out.push_str(&print_node(editor, b.program)?);
            if let Some(inverse) = b.inverse {
                if !opens_with_chained_block(editor, inverse) {
                    out.push_str("{{else}}");
                }
                out.push_str(&print_node(editor, inverse)?);
            }
            if !b.chained {
                out.push_str("{{/");
                out.push_str(&print_node(editor, b.path)?);
                out.push_str("}}");
            }
            Ok(out)
        }
        Node::SubExpression(s) => {
            let mut out = String::from("(");
            out.push_str(&call_interior(editor, s.path, &s.params, s.hash)?);
            out.push(')');
            Ok(out)
        }
        Node::Concat(c) => {
            let mut out = String::from("\"");
            for &part in &c.parts {
                out.push_str(&print_node(editor, part)?);
            }
            out.push('"');
            Ok(out)
        }
        Node::Hash(h) => {
            let printed: Result<Vec<_>, _> =
                h.pairs.iter().map(|&p| print_node(editor, p)).collect();
            Ok(printed?.join(" "))
        }
        Node::HashPair(p) => {
            let mut out = p.key.clone();
            out.push('=');
            out.push_str(&print_node(editor, p.value)?);
            Ok(out)
        }
        Node::Attr(a) => {
            let mut out = a.name.clone();
            match editor.node(a.value) {
                Node::Text(t) if t.chars.is_empty() => {}
                Node::Text(_) => {
                    out.push_str("=\"");
                    out.push_str(&print_node(editor, a.value)?);
                    out.push('"');
                }
                _ => {
                    // Mustache values are bare; concat values carry their
                    // own quotes.
                    out.push('=');
                    out.push_str(&print_node(editor, a.value)?);
                }
            }
            Ok(out)
        }
        Node::Path(p) => Ok(p.original.clone()),
        Node::MustacheComment(c) => {
            if c.value.contains("}}") {
                Ok(format!("{{{{!--{}--}}}}", c.value))
            } else {
                Ok(format!("{{{{!{}}}}}", c.value))
            }
        }
        Node::HtmlComment(c) => Ok(format!("<!--{}-->", c.value)),
        Node::Text(t) => Ok(t.chars.clone()),
        Node::StringLiteral(s) => Ok(double_quote(&s.value)),
        Node::NumberLiteral(n) => Ok(n.value.to_string()),
        Node::BooleanLiteral(b) => Ok(b.value.to_string()),
        Node::Null => Ok("null".to_string()),
        Node::Undefined => Ok("undefined".to_string()),
    }
}

fn print_all(editor: &TemplateEditor, body: &[NodeId]) -> Result<String, ReprintError> {
    let mut out = String::new();
    for &id in body {
        out.push_str(&print_node(editor, id)?);
    }
    Ok(out)
}

fn call_interior(
    editor: &TemplateEditor,
    path: NodeId,
    params: &[NodeId],
    hash: NodeId,
) -> Result<String, ReprintError> {
    let mut out = print_node(editor, path)?;
    for &param in params {
        out.push(' ');
        out.push_str(&print_node(editor, param)?);
    }
    if hash_has_pairs(editor, hash) {
        out.push(' ');
        out.push_str(&print_node(editor, hash)?);
    }
    Ok(out)
}

fn print_element(editor: &TemplateEditor, e: &Element) -> Result<String, ReprintError> {
    let mut out = format!("<{}", e.tag);
    for &part in e
        .attributes
        .iter()
        .chain(&e.modifiers)
        .chain(&e.comments)
    {
        out.push(' ');
        out.push_str(&print_node(editor, part)?);
    }
    if !e.block_params.is_empty() {
        out.push_str(" as |");
        out.push_str(&e.block_params.join(" "));
        out.push('|');
    }
    if e.self_closing && e.children.is_empty() {
        out.push_str(" />");
        return Ok(out);
    }
    out.push('>');
    if e.children.is_empty() && crate::parser::is_void_tag(&e.tag) {
        return Ok(out);
    }
    out.push_str(&print_all(editor, &e.children)?);
    out.push_str("</");
    out.push_str(&e.tag);
    out.push('>');
    Ok(out)
}

pub(super) fn hash_has_pairs(editor: &TemplateEditor, hash: NodeId) -> bool {
    matches!(editor.node(hash), Node::Hash(h) if !h.pairs.is_empty())
}

pub(super) fn opens_with_chained_block(editor: &TemplateEditor, program: NodeId) -> bool {
    match editor.node(program) {
        Node::Program(p) => match p.body.first() {
            Some(&first) => matches!(editor.node(first), Node::Block(b) if b.chained),
            None => false,
        },
        _ => false,
    }
}

/// Double-quoted, escaped rendition of a plain string. The JSON string
/// grammar matches the template grammar's double-quoted strings.
pub(super) fn double_quote(value: &str) -> String {
    serde_json::to_string(value).expect("string serialization is infallible")
}
