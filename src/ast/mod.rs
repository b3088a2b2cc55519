pub mod builders;
pub mod node;
pub mod visit;

pub use node::{
    Attr, Block, BooleanLiteral, Comment, Concat, Element, Field, Hash, HashPair, Mustache, Node,
    NodeId, NumberLiteral, PathExpression, Program, StringLiteral, SubExpression, Template, Text,
};
pub use visit::{traverse, VisitAction, Visitor};
