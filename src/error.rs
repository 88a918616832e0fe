use thiserror::Error;

/// Failure while tokenizing or evaluating one integer expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character `{0}`")]
    InvalidChar(char),

    #[error("number `{0}` does not fit in a 64-bit integer")]
    NumberOutOfRange(String),

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unmatched `(`")]
    UnclosedParen,

    #[error("trailing input starting at `{0}`")]
    Trailing(String),

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("unknown variable `{0}`")]
    UnboundVariable(String),

    #[error("variable `{name}` holds non-numeric string {value:?}")]
    NonNumeric { name: String, value: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

/// One of the interpreter ceilings was breached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetExceeded {
    #[error("call depth {depth} exceeds the limit of {limit}")]
    CallDepth { depth: usize, limit: usize },

    #[error("executed more than {limit} steps")]
    Steps { limit: u32 },

    #[error("made more than {limit} calls")]
    Calls { limit: u32 },
}

/// Every way a document can be rejected.
///
/// None of these are failures of the process itself; the caller is expected
/// to ask the model for a new document.
#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {message}")]
    Structure { path: String, message: String },

    #[error("{path}: cannot evaluate {expr:?}: {source}")]
    Eval {
        path: String,
        expr: String,
        #[source]
        source: ParseError,
    },

    #[error("{path}: unknown op `{op}`")]
    UnknownOp { path: String, op: String },

    #[error("call to undefined function `{0}`")]
    UnknownDef(String),

    #[error("call to `{def}` is missing parameter `{param}`")]
    MissingParam { def: String, param: String },

    #[error("runaway program: {0}")]
    Budget(#[from] BudgetExceeded),

    #[error("document is missing both `steps`/`defs` and `blocks`")]
    MissingShape,
}

impl BlueprintError {
    pub(crate) fn structure(path: impl Into<String>, message: impl Into<String>) -> Self {
        BlueprintError::Structure {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn eval(path: impl Into<String>, expr: impl Into<String>, source: ParseError) -> Self {
        BlueprintError::Eval {
            path: path.into(),
            expr: expr.into(),
            source,
        }
    }

    /// True for ceiling breaches, i.e. a program that ran away rather than
    /// one that was malformed.
    pub fn is_runaway(&self) -> bool {
        matches!(self, BlueprintError::Budget(_))
    }
}
