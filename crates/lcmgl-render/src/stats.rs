use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::DecodeErrorKind;

/// Point-in-time copy of [`DecodeStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeStatsSnapshot {
    pub buffers_ok: u64,
    pub buffers_failed: u64,
    pub commands: u64,
    pub bytes: u64,

    pub truncated: u64,
    pub unknown_opcode: u64,
    pub invalid_operand: u64,
    pub stack_underflow: u64,
    pub stack_overflow: u64,
    pub stack_mismatch: u64,
    pub unbalanced_stack: u64,
    pub backend_rejected: u64,
}

impl DecodeStatsSnapshot {
    pub fn buffers(&self) -> u64 {
        self.buffers_ok + self.buffers_failed
    }
}

/// Decoder counters.
///
/// Updated on the render thread; readable from any thread through an `Arc`.
#[derive(Debug, Default)]
pub struct DecodeStats {
    buffers_ok: AtomicU64,
    buffers_failed: AtomicU64,
    commands: AtomicU64,
    bytes: AtomicU64,

    truncated: AtomicU64,
    unknown_opcode: AtomicU64,
    invalid_operand: AtomicU64,
    stack_underflow: AtomicU64,
    stack_overflow: AtomicU64,
    stack_mismatch: AtomicU64,
    unbalanced_stack: AtomicU64,
    backend_rejected: AtomicU64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_commands(&self, n: u64) {
        self.commands.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_ok(&self, bytes: usize) {
        self.buffers_ok.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, bytes: usize, kind: &DecodeErrorKind) {
        self.buffers_failed.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        let counter = match kind {
            DecodeErrorKind::Truncated => &self.truncated,
            DecodeErrorKind::UnknownOpcode(_) => &self.unknown_opcode,
            DecodeErrorKind::InvalidOperand(_) => &self.invalid_operand,
            DecodeErrorKind::StackUnderflow(_) => &self.stack_underflow,
            DecodeErrorKind::StackOverflow { .. } => &self.stack_overflow,
            DecodeErrorKind::StackMismatch { .. } => &self.stack_mismatch,
            DecodeErrorKind::UnbalancedStack { .. } => &self.unbalanced_stack,
            DecodeErrorKind::BackendRejected(_) => &self.backend_rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DecodeStatsSnapshot {
        DecodeStatsSnapshot {
            buffers_ok: self.buffers_ok.load(Ordering::Relaxed),
            buffers_failed: self.buffers_failed.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            unknown_opcode: self.unknown_opcode.load(Ordering::Relaxed),
            invalid_operand: self.invalid_operand.load(Ordering::Relaxed),
            stack_underflow: self.stack_underflow.load(Ordering::Relaxed),
            stack_overflow: self.stack_overflow.load(Ordering::Relaxed),
            stack_mismatch: self.stack_mismatch.load(Ordering::Relaxed),
            unbalanced_stack: self.unbalanced_stack.load(Ordering::Relaxed),
            backend_rejected: self.backend_rejected.load(Ordering::Relaxed),
        }
    }
}
