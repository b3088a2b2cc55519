use crate::ast::Field;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// A node's variant kind was changed in place through `update`. The
    /// sanctioned conversion is allocating a new node and replacing the id
    /// in the owning slot.
    #[error("illegal type transition: {from} cannot be repurposed as {to} in place")]
    TypeTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("cannot remove the {field} of a {kind}; the slot is required")]
    RemoveRequired { kind: &'static str, field: Field },

    #[error("replacement for the {field} of a {kind} must be exactly one node, got {count}")]
    ReplaceCardinality {
        kind: &'static str,
        field: Field,
        count: usize,
    },

    #[error("a {kind} does not support {operation}")]
    UnsupportedTarget {
        kind: &'static str,
        operation: &'static str,
    },
}
