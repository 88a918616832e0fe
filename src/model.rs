// interpreter ceilings
pub const MAX_CALL_DEPTH: usize = 24;
pub const MAX_EXECUTED_STEPS: u32 = 50_000;
pub const MAX_CALLS: u32 = 500;

pub const DEFAULT_MAX_BLOCKS: usize = 4096;

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One concrete placement, relative to the build origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(rename = "blockType")]
    pub block_type: String,
}

/// Which input shape a blueprint was expanded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintFormat {
    Compact,
    Legacy,
}

/// Final, bounded output handed to writers.
#[derive(Debug, Clone, Serialize)]
pub struct Blueprint {
    pub format: BlueprintFormat,
    /// Label of the catalog the block types were validated against.
    pub catalog: String,
    /// Set when assembly had to cut the block list down to the cap.
    pub truncated: bool,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl Blueprint {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Smallest box containing every block, `None` for an empty blueprint.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.blocks.first()?;
        let mut b = Bounds {
            min: [first.x, first.y, first.z],
            max: [first.x, first.y, first.z],
        };
        for block in &self.blocks[1..] {
            for (axis, v) in [block.x, block.y, block.z].into_iter().enumerate() {
                b.min[axis] = b.min[axis].min(v);
                b.max[axis] = b.max[axis].max(v);
            }
        }
        Some(b)
    }

    /// Block count per block type.
    pub fn palette(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for block in &self.blocks {
            *counts.entry(block.block_type.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// A value bound to a variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeValue {
    Int(i64),
    Text(String),
}

impl ScopeValue {
    /// Integer view of the value. Text only converts when it is exactly an
    /// optionally negative run of digits.
    pub fn to_int(&self, name: &str) -> Result<i64, ParseError> {
        match self {
            ScopeValue::Int(n) => Ok(*n),
            ScopeValue::Text(s) => parse_int_literal(s).ok_or_else(|| ParseError::NonNumeric {
                name: name.to_string(),
                value: s.clone(),
            }),
        }
    }
}

impl fmt::Display for ScopeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeValue::Int(n) => write!(f, "{n}"),
            ScopeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Matches `^-?\d+$` and parses it.
pub fn parse_int_literal(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Variable bindings for one step sequence.
///
/// Scopes are never mutated once handed to the interpreter; nested bodies get
/// a `child` that shadows the parent's entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: HashMap<String, ScopeValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ScopeValue> {
        self.vars.get(name)
    }

    /// Parent entries overlaid with `bindings`.
    pub fn child<I>(&self, bindings: I) -> Scope
    where
        I: IntoIterator<Item = (String, ScopeValue)>,
    {
        let mut vars = self.vars.clone();
        vars.extend(bindings);
        Scope { vars }
    }

    pub fn with(mut self, name: &str, value: ScopeValue) -> Self {
        self.vars.insert(name.to_string(), value);
        self
    }
}

/// Ceilings applied to one expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_call_depth: usize,
    pub max_executed_steps: u32,
    pub max_calls: u32,
    pub max_blocks: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: MAX_CALL_DEPTH,
            max_executed_steps: MAX_EXECUTED_STEPS,
            max_calls: MAX_CALLS,
            max_blocks: DEFAULT_MAX_BLOCKS,
        }
    }
}

impl Limits {
    pub fn with_max_blocks(max_blocks: usize) -> Self {
        Self {
            max_blocks,
            ..Default::default()
        }
    }
}
