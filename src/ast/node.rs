//! The template grammar as a closed set of node variants.
//!
//! Nodes live in the [`TemplateEditor`](crate::track::TemplateEditor) arena
//! and refer to their children by [`NodeId`]. Spans are kept in a side table
//! rather than on the nodes themselves so that field diffing never confuses
//! a formatting detail with a semantic mutation.

use serde::{Deserialize, Serialize};

/// Stable index of a node in its arena.
///
/// Ids are assigned once at allocation time and never reused; unlinking a
/// node from the tree leaves its slot (and its dirty set) intact, which is
/// what lets a relocated node keep its history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Every field name in the grammar, used as the key of dirty sets and
/// ancestor links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Body,
    Tag,
    Attributes,
    Modifiers,
    Comments,
    Children,
    BlockParams,
    SelfClosing,
    Path,
    Params,
    Hash,
    Trusting,
    Program,
    Inverse,
    Chained,
    Parts,
    Pairs,
    Key,
    Value,
    Name,
    Original,
    Chars,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Body => "body",
            Field::Tag => "tag",
            Field::Attributes => "attributes",
            Field::Modifiers => "modifiers",
            Field::Comments => "comments",
            Field::Children => "children",
            Field::BlockParams => "block_params",
            Field::SelfClosing => "self_closing",
            Field::Path => "path",
            Field::Params => "params",
            Field::Hash => "hash",
            Field::Trusting => "trusting",
            Field::Program => "program",
            Field::Inverse => "inverse",
            Field::Chained => "chained",
            Field::Parts => "parts",
            Field::Pairs => "pairs",
            Field::Key => "key",
            Field::Value => "value",
            Field::Name => "name",
            Field::Original => "original",
            Field::Chars => "chars",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Root of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub body: Vec<NodeId>,
}

/// Body of a block statement (primary or inverse).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<NodeId>,
}

/// An HTML-like element, possibly a component invocation.
///
/// `attributes`, `modifiers` and `comments` are separate collections even
/// though they interleave textually inside the open tag; the reprinter
/// re-interleaves them by span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<NodeId>,
    pub modifiers: Vec<NodeId>,
    pub comments: Vec<NodeId>,
    pub children: Vec<NodeId>,
    pub block_params: Vec<String>,
    pub self_closing: bool,
}

/// An inline output-producing statement: `{{expr}}` or trusting `{{{expr}}}`.
///
/// Also used for element modifiers, which share the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mustache {
    pub path: NodeId,
    pub params: Vec<NodeId>,
    pub hash: NodeId,
    pub trusting: bool,
}

/// A paired open/close construct with a primary body and an optional
/// alternate body. `chained` marks a block that continues an else-if chain
/// and therefore suppresses its own closing tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub path: NodeId,
    pub params: Vec<NodeId>,
    pub hash: NodeId,
    pub program: NodeId,
    pub inverse: Option<NodeId>,
    pub block_params: Vec<String>,
    pub chained: bool,
}

/// A nested call usable as an argument value: `(helper a b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubExpression {
    pub path: NodeId,
    pub params: Vec<NodeId>,
    pub hash: NodeId,
}

/// A quoted attribute value mixing text and mustache parts. The quotes
/// belong to the concat itself, not to the owning attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concat {
    pub parts: Vec<NodeId>,
}

/// Order-preserving named arguments of a call-like node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hash {
    pub pairs: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashPair {
    pub key: String,
    pub value: NodeId,
}

/// An element attribute. The value is a `Text`, `Mustache` or `Concat`
/// node; quoting is a property of the original source, not of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    pub value: NodeId,
}

/// A dotted reference such as `foo.bar`, `@arg.name` or `this.x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathExpression {
    pub original: String,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub chars: String,
}

/// Payload shared by `{{! ... }}` and `<!-- ... -->` comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanLiteral {
    pub value: bool,
}

/// A node of the template tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Template(Template),
    Program(Program),
    Element(Element),
    Mustache(Mustache),
    Block(Block),
    SubExpression(SubExpression),
    Concat(Concat),
    Hash(Hash),
    HashPair(HashPair),
    Attr(Attr),
    Path(PathExpression),
    MustacheComment(Comment),
    HtmlComment(Comment),
    Text(Text),
    StringLiteral(StringLiteral),
    NumberLiteral(NumberLiteral),
    BooleanLiteral(BooleanLiteral),
    Null,
    Undefined,
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Template(_) => "Template",
            Node::Program(_) => "Program",
            Node::Element(_) => "Element",
            Node::Mustache(_) => "Mustache",
            Node::Block(_) => "Block",
            Node::SubExpression(_) => "SubExpression",
            Node::Concat(_) => "Concat",
            Node::Hash(_) => "Hash",
            Node::HashPair(_) => "HashPair",
            Node::Attr(_) => "Attr",
            Node::Path(_) => "Path",
            Node::MustacheComment(_) => "MustacheComment",
            Node::HtmlComment(_) => "HtmlComment",
            Node::Text(_) => "Text",
            Node::StringLiteral(_) => "StringLiteral",
            Node::NumberLiteral(_) => "NumberLiteral",
            Node::BooleanLiteral(_) => "BooleanLiteral",
            Node::Null => "Null",
            Node::Undefined => "Undefined",
        }
    }

    /// Visit every child id together with the field it is stored under, in
    /// source order. The closed-set equivalent of reflective traversal;
    /// wrapping, re-linking and the visitor all walk through here.
    pub fn for_each_child<F: FnMut(Field, NodeId)>(&self, mut f: F) {
        match self {
            Node::Template(t) => {
                for &id in &t.body {
                    f(Field::Body, id);
                }
            }
            Node::Program(p) => {
                for &id in &p.body {
                    f(Field::Body, id);
                }
            }
            Node::Element(e) => {
                for &id in &e.attributes {
                    f(Field::Attributes, id);
                }
                for &id in &e.modifiers {
                    f(Field::Modifiers, id);
                }
                for &id in &e.comments {
                    f(Field::Comments, id);
                }
                for &id in &e.children {
                    f(Field::Children, id);
                }
            }
            Node::Mustache(m) => {
                f(Field::Path, m.path);
                for &id in &m.params {
                    f(Field::Params, id);
                }
                f(Field::Hash, m.hash);
            }
            Node::Block(b) => {
                f(Field::Path, b.path);
                for &id in &b.params {
                    f(Field::Params, id);
                }
                f(Field::Hash, b.hash);
                f(Field::Program, b.program);
                if let Some(inverse) = b.inverse {
                    f(Field::Inverse, inverse);
                }
            }
            Node::SubExpression(s) => {
                f(Field::Path, s.path);
                for &id in &s.params {
                    f(Field::Params, id);
                }
                f(Field::Hash, s.hash);
            }
            Node::Concat(c) => {
                for &id in &c.parts {
                    f(Field::Parts, id);
                }
            }
            Node::Hash(h) => {
                for &id in &h.pairs {
                    f(Field::Pairs, id);
                }
            }
            Node::HashPair(p) => f(Field::Value, p.value),
            Node::Attr(a) => f(Field::Value, a.value),
            Node::Path(_)
            | Node::MustacheComment(_)
            | Node::HtmlComment(_)
            | Node::Text(_)
            | Node::StringLiteral(_)
            | Node::NumberLiteral(_)
            | Node::BooleanLiteral(_)
            | Node::Null
            | Node::Undefined => {}
        }
    }
}
