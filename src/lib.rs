//! Template Edit: lossless editing for hybrid HTML/Mustache templates.
//!
//! Parse a template into a tree, mutate the tree through a tracked editing
//! API, and re-emit source text that is byte-identical to the original
//! except in the exact spans the mutation touched: whitespace, quote
//! style, indentation and blank lines all survive.
//!
//! # Architecture
//!
//! Every node lives in an arena and is addressed by a stable [`NodeId`].
//! Wrapping (at parse time) snapshots each node's fields and caches its
//! original source slice; all mutation flows through
//! [`TemplateEditor::update`], which diffs fields over the closed grammar,
//! marks the changed fields dirty, and propagates dirtiness up the
//! ancestor chain. Printing replays cached slices for clean subtrees and
//! reconstructs only the regions that dirty fields own.
//!
//! # Example
//!
//! ```
//! use template_edit::{Node, TemplateEditor};
//!
//! let mut editor = TemplateEditor::parse("<div></div>").unwrap();
//! let root = editor.root();
//! let div = editor
//!     .descendants(root)
//!     .into_iter()
//!     .find(|&id| matches!(editor.node(id), Node::Element(_)))
//!     .unwrap();
//! let attr = editor.build_text_attr("data-test", "wheee");
//! editor.append_attribute(div, attr).unwrap();
//! assert_eq!(editor.print().unwrap(), "<div data-test=\"wheee\"></div>");
//! ```

pub mod ast;
pub mod parser;
pub mod reprint;
pub mod source;
pub mod track;

use thiserror::Error;

// Re-exports
pub use ast::{
    traverse, Attr, Block, BooleanLiteral, Comment, Concat, Element, Field, Hash, HashPair,
    Mustache, Node, NodeId, NumberLiteral, PathExpression, Program, StringLiteral, SubExpression,
    Template, Text, VisitAction, Visitor,
};
pub use parser::{ParseError, ParseErrorKind};
pub use reprint::ReprintError;
pub use source::{Position, SourceIndex, Span};
pub use track::{MutationError, ParentLink, TemplateEditor};

/// Any failure of a parse→mutate→print cycle.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Reprint(#[from] ReprintError),
}

/// Parse a template for tracked editing.
pub fn parse(source: &str) -> Result<TemplateEditor, ParseError> {
    TemplateEditor::parse(source)
}

/// Result of [`transform`]: the edited tree and its printed text.
pub struct TransformOutput {
    pub editor: TemplateEditor,
    pub code: String,
}

/// Parse `source`, run `visitor` over the tree, and print the result.
pub fn transform<V: Visitor>(source: &str, visitor: &mut V) -> Result<TransformOutput, Error> {
    let mut editor = TemplateEditor::parse(source)?;
    ast::traverse(&mut editor, visitor)?;
    let code = editor.print()?;
    Ok(TransformOutput { editor, code })
}

/// Run `visitor` over an already-parsed tree and print the result.
pub fn transform_tree<V: Visitor>(
    editor: &mut TemplateEditor,
    visitor: &mut V,
) -> Result<String, Error> {
    ast::traverse(editor, visitor)?;
    Ok(editor.print()?)
}
