//! The tracked-tree layer: an arena of nodes plus the side tables that make
//! surgical reprinting possible.
//!
//! Every node gets a stable integer id at allocation time. Three
//! id-indexed tables carry the bookkeeping: the [`NodeRecord`] of each
//! parsed node (wrap-time snapshot, cached source slice, cached tag
//! boundaries), the ancestor link (parent id + field key), and the
//! dirty-field set. All mutation flows through [`TemplateEditor::update`],
//! which diffs the node's fields over the closed variant set, marks the
//! changed fields dirty, and propagates dirtiness up the ancestor chain.
//! Printing happens top-down but whitespace decisions need bottom-up
//! knowledge of exactly which fields changed; snapshot + dirty set +
//! ancestor propagation let any level decide cheaply whether it can replay
//! cached text or must recompute.

pub mod errors;

use std::collections::{BTreeSet, HashMap};

use crate::ast::{Field, Node, NodeId};
use crate::parser::{self, ElementBounds, ParseError};
use crate::reprint::{self, ReprintError};
use crate::source::{SourceIndex, Span};

pub use errors::MutationError;

/// Per-node bookkeeping captured once at wrap time.
pub(crate) struct NodeRecord {
    /// Immutable deep snapshot of the field values at wrap time.
    pub original: Node,
    /// The exact original source slice covered by the node's span.
    pub slice: String,
    /// Open/close tag boundaries, elements only.
    pub bounds: Option<ElementBounds>,
    /// Span of the `as |...|` clause, elements and blocks only.
    pub block_params_span: Option<Span>,
}

/// Where a node is stored: its parent and the field key under which the
/// parent holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub parent: NodeId,
    pub field: Field,
}

/// A parsed template plus the editing state for one parse→mutate→print
/// cycle.
///
/// # Example
///
/// ```
/// use template_edit::{Node, TemplateEditor};
///
/// let mut editor = TemplateEditor::parse("<div class=\"lol\"></div>").unwrap();
/// let text = editor
///     .descendants(editor.root())
///     .into_iter()
///     .find(|&id| matches!(editor.node(id), Node::Text(_)))
///     .unwrap();
/// editor
///     .update(text, |node| {
///         if let Node::Text(t) = node {
///             t.chars = "hahah".to_string();
///         }
///     })
///     .unwrap();
/// assert_eq!(editor.print().unwrap(), "<div class=\"hahah\"></div>");
/// ```
pub struct TemplateEditor {
    source: SourceIndex,
    nodes: Vec<Node>,
    spans: Vec<Option<Span>>,
    records: Vec<Option<NodeRecord>>,
    parents: Vec<Option<ParentLink>>,
    dirty: Vec<BTreeSet<Field>>,
    root: NodeId,
}

impl TemplateEditor {
    /// Parse a template and wrap the resulting tree for tracked editing.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let output = parser::preprocess(source)?;
        let len = output.nodes.len();
        let mut editor = Self {
            source: SourceIndex::new(source),
            nodes: output.nodes,
            spans: output.spans,
            records: (0..len).map(|_| None).collect(),
            parents: vec![None; len],
            dirty: vec![BTreeSet::new(); len],
            root: output.root,
        };
        let mut bounds = output.element_bounds;
        let mut block_params = output.block_param_spans;
        editor.wrap(editor.root, &mut bounds, &mut block_params);
        Ok(editor)
    }

    /// Record ancestor links, snapshots and cached slices for the subtree
    /// rooted at `id`. Runs once, immediately after parse.
    fn wrap(
        &mut self,
        id: NodeId,
        bounds: &mut HashMap<NodeId, ElementBounds>,
        block_params: &mut HashMap<NodeId, Span>,
    ) {
        let node = self.nodes[id.index()].clone();
        if let Some(span) = self.spans[id.index()] {
            let slice = self.source.slice(span);
            self.records[id.index()] = Some(NodeRecord {
                original: node.clone(),
                slice,
                bounds: bounds.remove(&id),
                block_params_span: block_params.remove(&id),
            });
        }
        node.for_each_child(|field, child| {
            self.parents[child.index()] = Some(ParentLink { parent: id, field });
            self.wrap(child, bounds, block_params);
        });
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn span(&self, id: NodeId) -> Option<Span> {
        self.spans[id.index()]
    }

    /// A node with no span was built programmatically and has no original
    /// text to replay.
    pub fn is_synthetic(&self, id: NodeId) -> bool {
        self.spans[id.index()].is_none()
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        !self.dirty[id.index()].is_empty()
    }

    pub(crate) fn source(&self) -> &SourceIndex {
        &self.source
    }

    pub(crate) fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.records[id.index()].as_ref()
    }

    pub(crate) fn dirty_fields(&self, id: NodeId) -> &BTreeSet<Field> {
        &self.dirty[id.index()]
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<ParentLink> {
        self.parents[id.index()]
    }

    /// Allocate a synthetic node. It has no span, no record, and therefore
    /// always prints from scratch; its children (if any) are linked
    /// immediately.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.spans.push(None);
        self.records.push(None);
        self.parents.push(None);
        self.dirty.push(BTreeSet::new());
        self.relink_children(id);
        id
    }

    /// The single mutation door.
    ///
    /// Applies `f` to the node value, diffs every field against the
    /// pre-closure value, marks changed fields dirty on this node, and
    /// propagates dirtiness through the ancestor chain. Changing the
    /// node's variant kind is rolled back and rejected as an illegal type
    /// transition. Children attached by the closure are (re)parented,
    /// which is also how relocation works.
    pub fn update<F>(&mut self, id: NodeId, f: F) -> Result<(), MutationError>
    where
        F: FnOnce(&mut Node),
    {
        let before = self.nodes[id.index()].clone();
        f(&mut self.nodes[id.index()]);
        let changed = match changed_fields(&before, &self.nodes[id.index()]) {
            Ok(changed) => changed,
            Err(err) => {
                self.nodes[id.index()] = before;
                return Err(err);
            }
        };
        for field in changed {
            self.mark_dirty(id, field);
        }
        self.relink_children(id);
        Ok(())
    }

    /// Append a statement node to a `Template`, `Program` or `Element`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), MutationError> {
        if !matches!(
            self.nodes[parent.index()],
            Node::Template(_) | Node::Program(_) | Node::Element(_)
        ) {
            return Err(MutationError::UnsupportedTarget {
                kind: self.nodes[parent.index()].kind_name(),
                operation: "appending a child",
            });
        }
        self.update(parent, |node| match node {
            Node::Template(t) => t.body.push(child),
            Node::Program(p) => p.body.push(child),
            Node::Element(e) => e.children.push(child),
            _ => {}
        })
    }

    /// Append an attribute node to an `Element`.
    pub fn append_attribute(&mut self, parent: NodeId, attr: NodeId) -> Result<(), MutationError> {
        if !matches!(self.nodes[parent.index()], Node::Element(_)) {
            return Err(MutationError::UnsupportedTarget {
                kind: self.nodes[parent.index()].kind_name(),
                operation: "appending an attribute",
            });
        }
        self.update(parent, |node| {
            if let Node::Element(e) = node {
                e.attributes.push(attr);
            }
        })
    }

    /// Set (or replace) the inverse body of a `Block`.
    pub fn set_inverse(&mut self, block: NodeId, inverse: NodeId) -> Result<(), MutationError> {
        if !matches!(self.nodes[block.index()], Node::Block(_)) {
            return Err(MutationError::UnsupportedTarget {
                kind: self.nodes[block.index()].kind_name(),
                operation: "setting an inverse body",
            });
        }
        self.update(block, |node| {
            if let Node::Block(b) = node {
                b.inverse = Some(inverse);
            }
        })
    }

    /// Replace `child` in the `field` slot of `parent` with zero or more
    /// nodes. Collections splice; required scalar slots demand exactly one
    /// replacement; the optional inverse slot accepts zero or one.
    pub fn splice(
        &mut self,
        parent: NodeId,
        field: Field,
        child: NodeId,
        replacement: &[NodeId],
    ) -> Result<(), MutationError> {
        let kind = self.nodes[parent.index()].kind_name();
        match slot_shape(&self.nodes[parent.index()], field) {
            Some(SlotShape::Collection) => {
                let replacement = replacement.to_vec();
                self.update(parent, |node| {
                    if let Some(vec) = collection_slot(node, field) {
                        if let Some(at) = vec.iter().position(|&id| id == child) {
                            vec.splice(at..=at, replacement);
                        }
                    }
                })
            }
            Some(SlotShape::Scalar) => match replacement {
                [single] => {
                    let single = *single;
                    self.update(parent, |node| set_scalar_slot(node, field, single))
                }
                [] => Err(MutationError::RemoveRequired { kind, field }),
                many => Err(MutationError::ReplaceCardinality {
                    kind,
                    field,
                    count: many.len(),
                }),
            },
            Some(SlotShape::OptionalScalar) => match replacement {
                [] => self.update(parent, |node| {
                    if let Node::Block(b) = node {
                        b.inverse = None;
                    }
                }),
                [single] => {
                    let single = *single;
                    self.update(parent, |node| {
                        if let Node::Block(b) = node {
                            b.inverse = Some(single);
                        }
                    })
                }
                many => Err(MutationError::ReplaceCardinality {
                    kind,
                    field,
                    count: many.len(),
                }),
            },
            None => Err(MutationError::UnsupportedTarget {
                kind,
                operation: "splicing that field",
            }),
        }
    }

    /// Pre-order listing of a subtree, the receiver included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = Vec::new();
            self.nodes[current.index()].for_each_child(|_, child| children.push(child));
            while let Some(child) = children.pop() {
                stack.push(child);
            }
        }
        out
    }

    /// Print the whole template.
    pub fn print(&self) -> Result<String, ReprintError> {
        reprint::print_node(self, self.root)
    }

    /// Print one subtree. Falls back to the generic printer for synthetic
    /// nodes, while parsed descendants keep their original formatting.
    pub fn print_node(&self, id: NodeId) -> Result<String, ReprintError> {
        reprint::print_node(self, id)
    }

    fn mark_dirty(&mut self, id: NodeId, field: Field) {
        if !self.dirty[id.index()].insert(field) {
            return;
        }
        let mut current = id;
        while let Some(link) = self.parents[current.index()] {
            if !self.dirty[link.parent.index()].insert(link.field) {
                break;
            }
            current = link.parent;
        }
    }

    fn relink_children(&mut self, id: NodeId) {
        let node = self.nodes[id.index()].clone();
        node.for_each_child(|field, child| {
            let link = ParentLink { parent: id, field };
            if self.parents[child.index()] != Some(link) {
                self.parents[child.index()] = Some(link);
            }
        });
    }
}

enum SlotShape {
    Collection,
    Scalar,
    OptionalScalar,
}

fn slot_shape(node: &Node, field: Field) -> Option<SlotShape> {
    match (node, field) {
        (Node::Template(_), Field::Body)
        | (Node::Program(_), Field::Body)
        | (Node::Element(_), Field::Attributes)
        | (Node::Element(_), Field::Modifiers)
        | (Node::Element(_), Field::Comments)
        | (Node::Element(_), Field::Children)
        | (Node::Mustache(_), Field::Params)
        | (Node::Block(_), Field::Params)
        | (Node::SubExpression(_), Field::Params)
        | (Node::Concat(_), Field::Parts)
        | (Node::Hash(_), Field::Pairs) => Some(SlotShape::Collection),
        (Node::Mustache(_), Field::Path)
        | (Node::Mustache(_), Field::Hash)
        | (Node::Block(_), Field::Path)
        | (Node::Block(_), Field::Hash)
        | (Node::Block(_), Field::Program)
        | (Node::SubExpression(_), Field::Path)
        | (Node::SubExpression(_), Field::Hash)
        | (Node::HashPair(_), Field::Value)
        | (Node::Attr(_), Field::Value) => Some(SlotShape::Scalar),
        (Node::Block(_), Field::Inverse) => Some(SlotShape::OptionalScalar),
        _ => None,
    }
}

fn collection_slot<'a>(node: &'a mut Node, field: Field) -> Option<&'a mut Vec<NodeId>> {
    match (node, field) {
        (Node::Template(t), Field::Body) => Some(&mut t.body),
        (Node::Program(p), Field::Body) => Some(&mut p.body),
        (Node::Element(e), Field::Attributes) => Some(&mut e.attributes),
        (Node::Element(e), Field::Modifiers) => Some(&mut e.modifiers),
        (Node::Element(e), Field::Comments) => Some(&mut e.comments),
        (Node::Element(e), Field::Children) => Some(&mut e.children),
        (Node::Mustache(m), Field::Params) => Some(&mut m.params),
        (Node::Block(b), Field::Params) => Some(&mut b.params),
        (Node::SubExpression(s), Field::Params) => Some(&mut s.params),
        (Node::Concat(c), Field::Parts) => Some(&mut c.parts),
        (Node::Hash(h), Field::Pairs) => Some(&mut h.pairs),
        _ => None,
    }
}

fn set_scalar_slot(node: &mut Node, field: Field, value: NodeId) {
    match (node, field) {
        (Node::Mustache(m), Field::Path) => m.path = value,
        (Node::Mustache(m), Field::Hash) => m.hash = value,
        (Node::Block(b), Field::Path) => b.path = value,
        (Node::Block(b), Field::Hash) => b.hash = value,
        (Node::Block(b), Field::Program) => b.program = value,
        (Node::SubExpression(s), Field::Path) => s.path = value,
        (Node::SubExpression(s), Field::Hash) => s.hash = value,
        (Node::HashPair(p), Field::Value) => p.value = value,
        (Node::Attr(a), Field::Value) => a.value = value,
        _ => {}
    }
}

/// Field-by-field comparison over the closed variant set. The grammar is
/// finite, so no reflection is needed; a variant change is an illegal type
/// transition.
fn changed_fields(before: &Node, after: &Node) -> Result<Vec<Field>, MutationError> {
    let mut changed = Vec::new();
    let mut push_if = |cond: bool, field: Field| {
        if cond {
            changed.push(field);
        }
    };
    match (before, after) {
        (Node::Template(a), Node::Template(b)) => push_if(a.body != b.body, Field::Body),
        (Node::Program(a), Node::Program(b)) => push_if(a.body != b.body, Field::Body),
        (Node::Element(a), Node::Element(b)) => {
            push_if(a.tag != b.tag, Field::Tag);
            push_if(a.attributes != b.attributes, Field::Attributes);
            push_if(a.modifiers != b.modifiers, Field::Modifiers);
            push_if(a.comments != b.comments, Field::Comments);
            push_if(a.children != b.children, Field::Children);
            push_if(a.block_params != b.block_params, Field::BlockParams);
            push_if(a.self_closing != b.self_closing, Field::SelfClosing);
        }
        (Node::Mustache(a), Node::Mustache(b)) => {
            push_if(a.path != b.path, Field::Path);
            push_if(a.params != b.params, Field::Params);
            push_if(a.hash != b.hash, Field::Hash);
            push_if(a.trusting != b.trusting, Field::Trusting);
        }
        (Node::Block(a), Node::Block(b)) => {
            push_if(a.path != b.path, Field::Path);
            push_if(a.params != b.params, Field::Params);
            push_if(a.hash != b.hash, Field::Hash);
            push_if(a.program != b.program, Field::Program);
            push_if(a.inverse != b.inverse, Field::Inverse);
            push_if(a.block_params != b.block_params, Field::BlockParams);
            push_if(a.chained != b.chained, Field::Chained);
        }
        (Node::SubExpression(a), Node::SubExpression(b)) => {
            push_if(a.path != b.path, Field::Path);
            push_if(a.params != b.params, Field::Params);
            push_if(a.hash != b.hash, Field::Hash);
        }
        (Node::Concat(a), Node::Concat(b)) => push_if(a.parts != b.parts, Field::Parts),
        (Node::Hash(a), Node::Hash(b)) => push_if(a.pairs != b.pairs, Field::Pairs),
        (Node::HashPair(a), Node::HashPair(b)) => {
            push_if(a.key != b.key, Field::Key);
            push_if(a.value != b.value, Field::Value);
        }
        (Node::Attr(a), Node::Attr(b)) => {
            push_if(a.name != b.name, Field::Name);
            push_if(a.value != b.value, Field::Value);
        }
        (Node::Path(a), Node::Path(b)) => {
            push_if(a.original != b.original, Field::Original);
            push_if(a.parts != b.parts, Field::Parts);
        }
        (Node::MustacheComment(a), Node::MustacheComment(b)) => {
            push_if(a.value != b.value, Field::Value);
        }
        (Node::HtmlComment(a), Node::HtmlComment(b)) => {
            push_if(a.value != b.value, Field::Value);
        }
        (Node::Text(a), Node::Text(b)) => push_if(a.chars != b.chars, Field::Chars),
        (Node::StringLiteral(a), Node::StringLiteral(b)) => {
            push_if(a.value != b.value, Field::Value);
        }
        (Node::NumberLiteral(a), Node::NumberLiteral(b)) => {
            push_if(a.value != b.value, Field::Value);
        }
        (Node::BooleanLiteral(a), Node::BooleanLiteral(b)) => {
            push_if(a.value != b.value, Field::Value);
        }
        (Node::Null, Node::Null) | (Node::Undefined, Node::Undefined) => {}
        _ => {
            return Err(MutationError::TypeTransition {
                from: before.kind_name(),
                to: after.kind_name(),
            });
        }
    }
    Ok(changed)
}
