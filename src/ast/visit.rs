//! Tree walk with per-kind visitor hooks.
//!
//! A hook may mutate the visited node in place through the editor, replace
//! it with one or more nodes, or remove it. Replacement and removal are
//! applied by splicing the owning collection through the tracked mutation
//! API, so the containing field is dirtied like any other edit. Replacement
//! nodes are not re-visited.

use crate::ast::{Field, Node, NodeId};
use crate::track::{MutationError, TemplateEditor};

/// What a visitor hook wants done with the node it was handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitAction {
    Keep,
    Replace(Vec<NodeId>),
    Remove,
}

/// Per-kind hooks, all defaulting to [`VisitAction::Keep`].
#[allow(unused_variables)]
pub trait Visitor {
    fn template(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn program(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn element(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn mustache(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn block(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn sub_expression(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn concat(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn hash(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn hash_pair(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn attr(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn path(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn text(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn mustache_comment(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn html_comment(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }

    fn literal(
        &mut self,
        editor: &mut TemplateEditor,
        id: NodeId,
    ) -> Result<VisitAction, MutationError> {
        Ok(VisitAction::Keep)
    }
}

enum Hook {
    Template,
    Program,
    Element,
    Mustache,
    Block,
    SubExpression,
    Concat,
    Hash,
    HashPair,
    Attr,
    Path,
    Text,
    MustacheComment,
    HtmlComment,
    Literal,
}

fn hook_for(node: &Node) -> Hook {
    match node {
        Node::Template(_) => Hook::Template,
        Node::Program(_) => Hook::Program,
        Node::Element(_) => Hook::Element,
        Node::Mustache(_) => Hook::Mustache,
        Node::Block(_) => Hook::Block,
        Node::SubExpression(_) => Hook::SubExpression,
        Node::Concat(_) => Hook::Concat,
        Node::Hash(_) => Hook::Hash,
        Node::HashPair(_) => Hook::HashPair,
        Node::Attr(_) => Hook::Attr,
        Node::Path(_) => Hook::Path,
        Node::Text(_) => Hook::Text,
        Node::MustacheComment(_) => Hook::MustacheComment,
        Node::HtmlComment(_) => Hook::HtmlComment,
        Node::StringLiteral(_)
        | Node::NumberLiteral(_)
        | Node::BooleanLiteral(_)
        | Node::Null
        | Node::Undefined => Hook::Literal,
    }
}

/// Pre-order walk from the root, applying hook results as it goes.
pub fn traverse<V: Visitor>(
    editor: &mut TemplateEditor,
    visitor: &mut V,
) -> Result<(), MutationError> {
    let root = editor.root();
    match visit_subtree(editor, visitor, root)? {
        VisitAction::Keep => Ok(()),
        _ => Err(MutationError::UnsupportedTarget {
            kind: "Template",
            operation: "replacing or removing the root",
        }),
    }
}

fn visit_subtree<V: Visitor>(
    editor: &mut TemplateEditor,
    visitor: &mut V,
    id: NodeId,
) -> Result<VisitAction, MutationError> {
    let action = match hook_for(editor.node(id)) {
        Hook::Template => visitor.template(editor, id)?,
        Hook::Program => visitor.program(editor, id)?,
        Hook::Element => visitor.element(editor, id)?,
        Hook::Mustache => visitor.mustache(editor, id)?,
        Hook::Block => visitor.block(editor, id)?,
        Hook::SubExpression => visitor.sub_expression(editor, id)?,
        Hook::Concat => visitor.concat(editor, id)?,
        Hook::Hash => visitor.hash(editor, id)?,
        Hook::HashPair => visitor.hash_pair(editor, id)?,
        Hook::Attr => visitor.attr(editor, id)?,
        Hook::Path => visitor.path(editor, id)?,
        Hook::Text => visitor.text(editor, id)?,
        Hook::MustacheComment => visitor.mustache_comment(editor, id)?,
        Hook::HtmlComment => visitor.html_comment(editor, id)?,
        Hook::Literal => visitor.literal(editor, id)?,
    };
    if action != VisitAction::Keep {
        return Ok(action);
    }

    let mut children: Vec<(Field, NodeId)> = Vec::new();
    editor
        .node(id)
        .for_each_child(|field, child| children.push((field, child)));
    for (field, child) in children {
        match visit_subtree(editor, visitor, child)? {
            VisitAction::Keep => {}
            VisitAction::Replace(with) => editor.splice(id, field, child, &with)?,
            VisitAction::Remove => editor.splice(id, field, child, &[])?,
        }
    }
    Ok(VisitAction::Keep)
}
