//! Buffer decode loop.

use std::sync::Arc;

use lcmgl_protocol::{lookup, read_record, ByteReader, Command, FrameKind};
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::context::RenderContext;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::stack::{FrameState, StackFrame, StateStack};
use crate::stats::DecodeStats;

/// Summary of a buffer that decoded cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Records decoded, `Nop` included.
    pub commands: usize,
    pub bytes: usize,
    /// Deepest stack nesting reached.
    pub max_depth: usize,
}

pub type DecodeOutcome = Result<DecodeReport, DecodeError>;

/// Decode `buffer` into `context` with the default limits.
pub fn decode<C: RenderContext + ?Sized>(buffer: &[u8], context: &mut C) -> DecodeOutcome {
    Decoder::default().decode(buffer, context)
}

/// Replays command buffers against a [`RenderContext`].
///
/// A decoder holds no per-buffer state; each [`decode`](Self::decode) call
/// starts with an empty stack. It can be reused for any number of buffers and
/// contexts.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
    stats: Arc<DecodeStats>,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            stats: Arc::new(DecodeStats::new()),
        }
    }

    /// Use `stats` instead of a private counter set, e.g. to share counters
    /// between decoders.
    pub fn with_stats(config: DecoderConfig, stats: Arc<DecodeStats>) -> Self {
        Self { config, stats }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn stats(&self) -> &Arc<DecodeStats> {
        &self.stats
    }

    /// Decode every record in `buffer`, driving `context` in stream order.
    ///
    /// Stops at the first error; calls already made to `context` are not
    /// undone. Never panics on malformed input.
    pub fn decode<C: RenderContext + ?Sized>(&self, buffer: &[u8], context: &mut C) -> DecodeOutcome {
        let mut engine = Engine {
            reader: ByteReader::new(buffer),
            stack: StateStack::new(self.config.max_stack_depth()),
            commands: 0,
        };
        let result = engine.run(context);
        self.stats.record_commands(engine.commands as u64);

        match result {
            Ok(()) => {
                self.stats.record_ok(buffer.len());
                Ok(DecodeReport {
                    commands: engine.commands,
                    bytes: buffer.len(),
                    max_depth: engine.stack.high_water(),
                })
            }
            Err(err) => {
                self.stats.record_failure(buffer.len(), &err.kind);
                debug!(
                    kind = err.kind.name(),
                    offset = err.offset,
                    len = buffer.len(),
                    commands = engine.commands,
                    depth = engine.stack.depth(),
                    error = %err,
                    "command buffer rejected"
                );
                Err(err)
            }
        }
    }
}

struct Engine<'a> {
    reader: ByteReader<'a>,
    stack: StateStack,
    commands: usize,
}

impl<'a> Engine<'a> {
    fn run<C: RenderContext + ?Sized>(&mut self, ctx: &mut C) -> Result<(), DecodeError> {
        while !self.reader.is_empty() {
            let offset = self.reader.position();
            self.step(ctx, offset)
                .map_err(|kind| DecodeError::new(kind, offset))?;
        }
        if !self.stack.is_balanced() {
            return Err(DecodeError::new(
                DecodeErrorKind::UnbalancedStack {
                    depth: self.stack.depth(),
                },
                self.reader.len(),
            ));
        }
        Ok(())
    }

    fn step<C: RenderContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        offset: usize,
    ) -> Result<(), DecodeErrorKind> {
        let tag = self
            .reader
            .read_u16()
            .map_err(|_| DecodeErrorKind::Truncated)?;
        let descriptor = lookup(tag).ok_or(DecodeErrorKind::UnknownOpcode(tag))?;
        let record = read_record(&mut self.reader, descriptor, offset)
            .map_err(|_| DecodeErrorKind::Truncated)?;
        let command = Command::parse(&record)?;

        trace!(offset, opcode = descriptor.name, depth = self.stack.depth(), "dispatch");
        self.dispatch(ctx, command, offset)?;
        self.commands += 1;
        Ok(())
    }

    fn dispatch<C: RenderContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        command: Command<'_>,
        offset: usize,
    ) -> Result<(), DecodeErrorKind> {
        match command {
            Command::Begin(mode) => {
                self.push(FrameState::Primitive(mode), offset)?;
                ctx.begin(mode)?;
            }
            Command::End => {
                self.stack.pop(FrameKind::Primitive)?;
                ctx.end()?;
            }
            Command::PushMatrix => {
                self.push(FrameState::Matrix, offset)?;
                ctx.push_matrix()?;
            }
            Command::PopMatrix => {
                self.stack.pop(FrameKind::Matrix)?;
                ctx.pop_matrix()?;
            }
            Command::PushAttrib(mask) => {
                self.push(FrameState::Attrib(mask), offset)?;
                ctx.push_attrib(mask)?;
            }
            Command::PopAttrib => {
                self.stack.pop(FrameKind::Attrib)?;
                ctx.pop_attrib()?;
            }
            Command::Vertex(v) => ctx.vertex(v)?,
            Command::Normal(n) => ctx.normal(n)?,
            Command::Color(c) => ctx.color(c)?,
            Command::Attribute(a) => ctx.set_attribute(a)?,
            Command::Transform(t) => ctx.transform(t)?,
            Command::Shape(s) => ctx.draw_shape(s)?,
            Command::Text(text) => ctx.draw_text(&text)?,
            Command::Texture(tex) => ctx.upload_texture(&tex)?,
            Command::TexturedQuad(quad) => ctx.draw_textured_quad(&quad)?,
            Command::Nop => {}
        }
        Ok(())
    }

    fn push(&mut self, state: FrameState, offset: usize) -> Result<(), DecodeErrorKind> {
        self.stack.push(StackFrame { state, offset })?;
        Ok(())
    }
}
