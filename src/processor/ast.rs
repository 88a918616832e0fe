//! Typed program tree built from a compact document *before* it runs.

use std::collections::HashMap;
use std::fmt;

/// A value slot in a step: either already an integer, or text that is
/// evaluated (or taken literally, for block types) where it is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Text(String),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Unevaluated fields of one block, shared by `place` steps and legacy
/// `blocks` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub x: Expr,
    pub y: Expr,
    pub z: Expr,
    pub block_type: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `{"op":"place"|"block", x, y, z, blockType}`
    Place(Placement),

    /// `{"op":"for", var, from, to, step?, steps}` – inclusive range.
    For {
        var: String,
        from: Expr,
        to: Expr,
        stride: Expr,
        body: Vec<Step>,
    },

    /// `{"op":"call", name, args}`
    Call {
        name: String,
        args: Vec<(String, Expr)>,
    },
}

/// A named, reusable step sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Def {
    pub name: String,
    /// Empty means the def takes free-form arguments.
    pub params: Vec<String>,
    pub steps: Vec<Step>,
}

pub type Defs = HashMap<String, Def>;

/// One compact document, ready to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub defs: Defs,
    pub steps: Vec<Step>,
}
