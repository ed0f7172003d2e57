//! Offline replay of captured LCMGL buffers.

#![forbid(unsafe_code)]

pub mod capture;
pub mod replay;

pub use capture::{CaptureError, CaptureReader, CaptureWriter};
pub use replay::{replay, BufferReport, ErrorReport, ReplayOptions, ReplaySummary};
