use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReprintError {
    /// A mutated node's kind has no reconstruction routine.
    #[error("no reconstruction routine for mutated {kind} nodes")]
    UnsupportedKind { kind: &'static str },

    /// A reconstruction routine finished without consuming every dirty
    /// field. This is an engine gap, not a caller mistake: it means a
    /// mutation would otherwise be silently dropped from the output.
    #[error("unhandled mutation on {kind}: {fields}")]
    UnhandledMutation { kind: &'static str, fields: String },
}
