use std::io::Read;

use lcmgl_render::{DecodeError, Decoder, DecoderConfig, RecordingContext};
use serde::Serialize;
use tracing::{debug, info};

use crate::capture::{CaptureError, CaptureReader};

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Only decode records from this channel.
    pub channel: Option<String>,
    /// Keep the recorded calls of every buffer in the report.
    pub dump: bool,
    pub decoder: DecoderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub offset: usize,
    pub message: String,
}

impl From<&DecodeError> for ErrorReport {
    fn from(err: &DecodeError) -> Self {
        Self {
            kind: err.kind.name(),
            offset: err.offset,
            message: err.kind.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferReport {
    pub channel: String,
    pub scene: i32,
    pub sequence: i32,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<String>,
}

impl BufferReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub ok: u64,
    pub failed: u64,
    /// Records skipped by the channel filter.
    pub skipped: u64,
    pub commands: u64,
    pub buffers: Vec<BufferReport>,
}

/// Decode every record of a capture against a [`RecordingContext`].
///
/// Each buffer gets a fresh context so `--dump` output shows only that
/// buffer's calls. Decode failures are reported per buffer; only a malformed
/// capture file is an error.
pub fn replay<R: Read>(
    reader: CaptureReader<R>,
    options: &ReplayOptions,
) -> Result<ReplaySummary, CaptureError> {
    let decoder = Decoder::new(options.decoder);
    let mut summary = ReplaySummary::default();

    for envelope in reader {
        let envelope = envelope?;
        if let Some(channel) = &options.channel {
            if *channel != envelope.channel {
                summary.skipped += 1;
                continue;
            }
        }

        let mut ctx = RecordingContext::new();
        let outcome = decoder.decode(&envelope.data, &mut ctx);
        let calls = if options.dump {
            ctx.calls().iter().map(ToString::to_string).collect()
        } else {
            Vec::new()
        };

        let report = match outcome {
            Ok(decoded) => {
                summary.ok += 1;
                summary.commands += decoded.commands as u64;
                BufferReport {
                    channel: envelope.channel,
                    scene: envelope.scene,
                    sequence: envelope.sequence,
                    bytes: decoded.bytes,
                    commands: Some(decoded.commands),
                    max_depth: Some(decoded.max_depth),
                    error: None,
                    calls,
                }
            }
            Err(err) => {
                summary.failed += 1;
                BufferReport {
                    channel: envelope.channel,
                    scene: envelope.scene,
                    sequence: envelope.sequence,
                    bytes: envelope.data.len(),
                    commands: None,
                    max_depth: None,
                    error: Some(ErrorReport::from(&err)),
                    calls,
                }
            }
        };
        debug!(
            channel = %report.channel,
            sequence = report.sequence,
            ok = report.is_ok(),
            "replayed buffer"
        );
        summary.buffers.push(report);
    }

    info!(
        ok = summary.ok,
        failed = summary.failed,
        skipped = summary.skipped,
        commands = summary.commands,
        "replay finished"
    );
    Ok(summary)
}
