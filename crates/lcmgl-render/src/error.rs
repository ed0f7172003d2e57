use lcmgl_protocol::{FrameKind, OperandError};

use crate::context::BackendError;
use crate::stack::StackError;

/// Why a buffer stopped decoding, and where.
///
/// `offset` is the start of the record being processed (its opcode tag),
/// except for [`DecodeErrorKind::UnbalancedStack`], which is reported at the
/// buffer length.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at offset {offset}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub offset: usize,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("truncated record")]
    Truncated,
    #[error("unknown opcode {0:#06x}")]
    UnknownOpcode(u16),
    #[error("invalid operand: {0}")]
    InvalidOperand(OperandError),
    #[error("pop of a {0} frame with nothing open")]
    StackUnderflow(FrameKind),
    #[error("nesting exceeds the depth limit of {limit}")]
    StackOverflow { limit: usize },
    #[error("pop of a {found} frame while a {expected} frame is open")]
    StackMismatch { expected: FrameKind, found: FrameKind },
    #[error("{depth} frame(s) still open at end of buffer")]
    UnbalancedStack { depth: usize },
    #[error("backend rejected command: {0}")]
    BackendRejected(BackendError),
}

impl DecodeErrorKind {
    /// Stable snake_case label, used for log fields and reports.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Truncated => "truncated",
            Self::UnknownOpcode(_) => "unknown_opcode",
            Self::InvalidOperand(_) => "invalid_operand",
            Self::StackUnderflow(_) => "stack_underflow",
            Self::StackOverflow { .. } => "stack_overflow",
            Self::StackMismatch { .. } => "stack_mismatch",
            Self::UnbalancedStack { .. } => "unbalanced_stack",
            Self::BackendRejected(_) => "backend_rejected",
        }
    }
}

impl From<StackError> for DecodeErrorKind {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Overflow { limit } => Self::StackOverflow { limit },
            StackError::Underflow(kind) => Self::StackUnderflow(kind),
            StackError::Mismatch { expected, found } => Self::StackMismatch { expected, found },
        }
    }
}

impl From<BackendError> for DecodeErrorKind {
    fn from(err: BackendError) -> Self {
        Self::BackendRejected(err)
    }
}

impl From<OperandError> for DecodeErrorKind {
    fn from(err: OperandError) -> Self {
        match err {
            // A fixed operand block shorter than its layout is a short record.
            OperandError::Layout(_) => Self::Truncated,
            other => Self::InvalidOperand(other),
        }
    }
}
