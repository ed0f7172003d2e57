#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use lcmgl_render::config::DEFAULT_MAX_STACK_DEPTH;
use lcmgl_render::DecoderConfig;
use lcmgl_replay::capture::DEFAULT_MAX_RECORD_BYTES;
use lcmgl_replay::{replay, CaptureReader, ReplayOptions, ReplaySummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lcmgl-replay",
    about = "Decode the buffers of an LCMGL capture file and report what each would draw."
)]
struct Args {
    /// Capture file (LGLC)
    input: PathBuf,

    /// Only replay buffers from this channel
    #[arg(long, value_name = "NAME")]
    channel: Option<String>,

    /// Print every render call of every buffer
    #[arg(long, action = clap::ArgAction::SetTrue)]
    dump: bool,

    /// Print a JSON report instead of text
    #[arg(long, action = clap::ArgAction::SetTrue)]
    json: bool,

    /// Exit with an error if any buffer fails to decode
    #[arg(long, action = clap::ArgAction::SetTrue)]
    strict: bool,

    /// Deepest allowed Begin/PushMatrix/PushAttrib nesting
    #[arg(long, env = "LCMGL_MAX_STACK_DEPTH", default_value_t = DEFAULT_MAX_STACK_DEPTH)]
    max_stack_depth: usize,

    /// Largest record the capture reader will load
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_RECORD_BYTES)]
    max_record_bytes: usize,

    /// Log filter (e.g. "info", "lcmgl_render=debug")
    #[arg(long, env = "LCMGL_LOG", default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;
    run(args)
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter).with_context(|| format!("invalid log filter {filter:?}"))?;
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let decoder = DecoderConfig::new(args.max_stack_depth).context("invalid --max-stack-depth")?;

    let file = File::open(&args.input)
        .with_context(|| format!("open capture {}", args.input.display()))?;
    let reader = CaptureReader::open(BufReader::new(file))
        .with_context(|| format!("read capture header of {}", args.input.display()))?
        .with_max_record_bytes(args.max_record_bytes);

    let options = ReplayOptions {
        channel: args.channel,
        dump: args.dump,
        decoder,
    };
    let summary = replay(reader, &options)
        .with_context(|| format!("replay {}", args.input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &summary).context("write JSON report")?;
        writeln!(out)?;
    } else {
        print_text(&mut out, &summary)?;
    }
    out.flush()?;

    if args.strict && summary.failed > 0 {
        bail!(
            "{} of {} buffers failed to decode",
            summary.failed,
            summary.ok + summary.failed
        );
    }
    Ok(())
}

fn print_text(out: &mut impl Write, summary: &ReplaySummary) -> io::Result<()> {
    for buffer in &summary.buffers {
        write!(
            out,
            "{} scene={} seq={} bytes={}: ",
            buffer.channel, buffer.scene, buffer.sequence, buffer.bytes
        )?;
        match (&buffer.error, buffer.commands, buffer.max_depth) {
            (Some(err), _, _) => {
                writeln!(out, "error {} at {}: {}", err.kind, err.offset, err.message)?
            }
            (None, Some(commands), Some(depth)) => {
                writeln!(out, "ok commands={commands} max_depth={depth}")?
            }
            (None, _, _) => writeln!(out, "ok")?,
        }
        for call in &buffer.calls {
            writeln!(out, "  {call}")?;
        }
    }
    writeln!(
        out,
        "{} ok, {} failed, {} skipped, {} commands",
        summary.ok, summary.failed, summary.skipped, summary.commands
    )
}
