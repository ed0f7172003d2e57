//! Nested save/restore frames opened while decoding one buffer.

use lcmgl_protocol::{FrameKind, PrimitiveMode};

/// What a push opcode saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Primitive(PrimitiveMode),
    Matrix,
    /// Attribute mask passed to `PushAttrib`.
    Attrib(u32),
}

impl FrameState {
    pub const fn kind(self) -> FrameKind {
        match self {
            Self::Primitive(_) => FrameKind::Primitive,
            Self::Matrix => FrameKind::Matrix,
            Self::Attrib(_) => FrameKind::Attrib,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame {
    pub state: FrameState,
    /// Offset of the opcode that opened the frame.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("push would exceed the depth limit of {limit}")]
    Overflow { limit: usize },
    #[error("pop of a {0} frame with nothing open")]
    Underflow(FrameKind),
    #[error("pop of a {found} frame while a {expected} frame is open")]
    Mismatch { expected: FrameKind, found: FrameKind },
}

/// LIFO of open frames with a depth cap.
#[derive(Debug, Clone)]
pub struct StateStack {
    frames: Vec<StackFrame>,
    limit: usize,
    high_water: usize,
}

impl StateStack {
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::new(),
            limit,
            high_water: 0,
        }
    }

    pub fn push(&mut self, frame: StackFrame) -> Result<(), StackError> {
        if self.frames.len() >= self.limit {
            return Err(StackError::Overflow { limit: self.limit });
        }
        self.frames.push(frame);
        self.high_water = self.high_water.max(self.frames.len());
        Ok(())
    }

    /// Pop the top frame, which must be of `kind`. On error the stack is left
    /// as it was.
    pub fn pop(&mut self, kind: FrameKind) -> Result<StackFrame, StackError> {
        let top = self.frames.last().ok_or(StackError::Underflow(kind))?;
        let open = top.state.kind();
        if open != kind {
            return Err(StackError::Mismatch {
                expected: open,
                found: kind,
            });
        }
        self.frames.pop().ok_or(StackError::Underflow(kind))
    }

    pub fn top(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_balanced(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Deepest nesting reached since creation.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Open frames, outermost first.
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(state: FrameState, offset: usize) -> StackFrame {
        StackFrame { state, offset }
    }

    #[test]
    fn push_pop_is_lifo() {
        let mut s = StateStack::new(4);
        s.push(frame(FrameState::Matrix, 0)).unwrap();
        s.push(frame(FrameState::Attrib(0x4000), 2)).unwrap();
        assert_eq!(s.depth(), 2);
        assert_eq!(
            s.pop(FrameKind::Attrib).unwrap(),
            frame(FrameState::Attrib(0x4000), 2)
        );
        assert_eq!(s.pop(FrameKind::Matrix).unwrap().offset, 0);
        assert!(s.is_balanced());
        assert_eq!(s.high_water(), 2);
    }

    #[test]
    fn limit_is_inclusive() {
        let mut s = StateStack::new(2);
        s.push(frame(FrameState::Matrix, 0)).unwrap();
        s.push(frame(FrameState::Matrix, 2)).unwrap();
        assert_eq!(
            s.push(frame(FrameState::Matrix, 4)),
            Err(StackError::Overflow { limit: 2 })
        );
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn empty_pop_underflows() {
        let mut s = StateStack::new(2);
        assert_eq!(
            s.pop(FrameKind::Primitive),
            Err(StackError::Underflow(FrameKind::Primitive))
        );
    }

    #[test]
    fn mismatched_pop_leaves_stack_untouched() {
        let mut s = StateStack::new(2);
        s.push(frame(FrameState::Primitive(PrimitiveMode::Points), 0))
            .unwrap();
        assert_eq!(
            s.pop(FrameKind::Matrix),
            Err(StackError::Mismatch {
                expected: FrameKind::Primitive,
                found: FrameKind::Matrix
            })
        );
        assert_eq!(s.depth(), 1);
        assert_eq!(s.top().unwrap().state.kind(), FrameKind::Primitive);
    }
}
