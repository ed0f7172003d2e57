//! Decode-and-dispatch engine for LCMGL command buffers.
//!
//! [`Decoder::decode`] reads one buffer record by record, keeps the
//! `Begin`/`End`, `PushMatrix`/`PopMatrix` and `PushAttrib`/`PopAttrib` nesting
//! in a [`StateStack`], and forwards each command to a host-supplied
//! [`RenderContext`]. A buffer either decodes completely or stops at the first
//! problem with a [`DecodeError`] naming the kind and byte offset; malformed
//! input never panics.
//!
//! Around the decoder:
//! - [`ingest`]: bounded, non-blocking handoff from the messaging thread
//! - [`SceneCache`]: keeps each channel's current scene for repaints
//! - [`RecordingContext`]: a context that records calls, for tests and tooling

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod decode;
pub mod error;
pub mod ingest;
pub mod recording;
pub mod scene;
pub mod stack;
pub mod stats;

pub use config::{ConfigError, DecoderConfig, IngestConfig};
pub use context::{BackendError, RenderContext};
pub use decode::{decode, DecodeOutcome, DecodeReport, Decoder};
pub use error::{DecodeError, DecodeErrorKind};
pub use ingest::{Envelope, IngestReceiver, IngestSender, Offer};
pub use recording::{RecordedCall, RecordingContext};
pub use scene::{Retained, SceneCache};
pub use stack::{FrameState, StackError, StackFrame, StateStack};
pub use stats::{DecodeStats, DecodeStatsSnapshot};
