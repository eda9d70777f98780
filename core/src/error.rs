use crate::boolean::Operator;
use thiserror::Error;

/// Failure while evaluating a boolean query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// An operator was reached with fewer operands on the stack than it consumes.
    #[error("{operator} at postfix position {position} needs {expected} operand(s), found {found}")]
    MissingOperand {
        operator: Operator,
        position: usize,
        expected: usize,
        found: usize,
    },
}
