//! Construction of synthetic nodes.
//!
//! Builders allocate span-less nodes straight into the editor's arena.
//! Having no record, a built node is fully dirty by construction: it always
//! prints from scratch, while any parsed node attached beneath it keeps its
//! original text.

use crate::ast::{
    Attr, Block, BooleanLiteral, Concat, Element, Hash, HashPair, Mustache, Node, NodeId,
    NumberLiteral, PathExpression, Program, StringLiteral, SubExpression, Text,
};
use crate::track::TemplateEditor;

impl TemplateEditor {
    pub fn build_text(&mut self, chars: &str) -> NodeId {
        self.alloc(Node::Text(Text {
            chars: chars.to_string(),
        }))
    }

    pub fn build_path(&mut self, original: &str) -> NodeId {
        self.alloc(Node::Path(PathExpression {
            original: original.to_string(),
            parts: original.split('.').map(str::to_string).collect(),
        }))
    }

    pub fn build_string(&mut self, value: &str) -> NodeId {
        self.alloc(Node::StringLiteral(StringLiteral {
            value: value.to_string(),
        }))
    }

    pub fn build_number(&mut self, value: f64) -> NodeId {
        self.alloc(Node::NumberLiteral(NumberLiteral { value }))
    }

    pub fn build_boolean(&mut self, value: bool) -> NodeId {
        self.alloc(Node::BooleanLiteral(BooleanLiteral { value }))
    }

    pub fn build_hash_pair(&mut self, key: &str, value: NodeId) -> NodeId {
        self.alloc(Node::HashPair(HashPair {
            key: key.to_string(),
            value,
        }))
    }

    pub fn build_hash(&mut self, pairs: Vec<NodeId>) -> NodeId {
        self.alloc(Node::Hash(Hash { pairs }))
    }

    /// A `{{path param...}}` statement; `pairs` become its hash.
    pub fn build_mustache(
        &mut self,
        path: &str,
        params: Vec<NodeId>,
        pairs: Vec<NodeId>,
    ) -> NodeId {
        let path = self.build_path(path);
        let hash = self.build_hash(pairs);
        self.alloc(Node::Mustache(Mustache {
            path,
            params,
            hash,
            trusting: false,
        }))
    }

    pub fn build_sub_expression(
        &mut self,
        path: &str,
        params: Vec<NodeId>,
        pairs: Vec<NodeId>,
    ) -> NodeId {
        let path = self.build_path(path);
        let hash = self.build_hash(pairs);
        self.alloc(Node::SubExpression(SubExpression { path, params, hash }))
    }

    pub fn build_attr(&mut self, name: &str, value: NodeId) -> NodeId {
        self.alloc(Node::Attr(Attr {
            name: name.to_string(),
            value,
        }))
    }

    /// Shorthand for the common plain-text attribute.
    pub fn build_text_attr(&mut self, name: &str, chars: &str) -> NodeId {
        let value = self.build_text(chars);
        self.build_attr(name, value)
    }

    pub fn build_concat(&mut self, parts: Vec<NodeId>) -> NodeId {
        self.alloc(Node::Concat(Concat { parts }))
    }

    pub fn build_program(&mut self, body: Vec<NodeId>) -> NodeId {
        self.alloc(Node::Program(Program { body }))
    }

    pub fn build_element(&mut self, tag: &str, children: Vec<NodeId>) -> NodeId {
        self.alloc(Node::Element(Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
            modifiers: Vec::new(),
            comments: Vec::new(),
            children,
            block_params: Vec::new(),
            self_closing: false,
        }))
    }

    pub fn build_block(
        &mut self,
        path: &str,
        params: Vec<NodeId>,
        pairs: Vec<NodeId>,
        program: NodeId,
        inverse: Option<NodeId>,
    ) -> NodeId {
        let path = self.build_path(path);
        let hash = self.build_hash(pairs);
        self.alloc(Node::Block(Block {
            path,
            params,
            hash,
            program,
            inverse,
            block_params: Vec::new(),
            chained: false,
        }))
    }
}
