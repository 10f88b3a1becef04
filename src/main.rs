use std::error::Error;
use std::io;
use std::path::PathBuf;

use async_stream::try_stream;
use clap::{Parser, Subcommand};
use futures::{future, Stream, StreamExt};
use time::OffsetDateTime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use etekcity_scale::logging::init_tracing;
use etekcity_scale::{
    decode_record, finish_measurement_frame, init2_frame, init_frame, set_time_frame, DisplayUnit,
    EtekcityScale, FrameWriter, ScaleConfig,
};

#[derive(Parser)]
#[command(name = "etekcity-scale", about = "Decode, build and replay Etekcity scale frames")]
struct Cli {
    /// Log every frame sent and received.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode hex frames captured from the scale.
    Decode {
        #[arg(required = true)]
        frames: Vec<String>,
    },
    /// Print a host frame as hex.
    Encode {
        #[command(subcommand)]
        frame: HostFrame,
    },
    /// Answer a recorded notification log (hex, one frame per line) the way a host would.
    Replay {
        #[arg(long, default_value = "KG")]
        unit: DisplayUnit,
        #[arg(long, default_value_t = 16)]
        queue: usize,
        /// Reads stdin when omitted.
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HostFrame {
    Init {
        #[arg(long, default_value = "KG")]
        unit: String,
    },
    SetTime {
        /// Unix seconds, defaults to now.
        #[arg(long)]
        unix: Option<i64>,
    },
    Init2,
    Finish,
}

struct StdoutWriter;

impl FrameWriter for StdoutWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        println!("SEND {}", hex::encode(frame));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Decode { frames } => decode_frames(&frames)?,
        Command::Encode { frame } => {
            let bytes = match frame {
                HostFrame::Init { unit } => init_frame(&unit)?,
                HostFrame::SetTime { unix } => {
                    let timestamp = unix.map(OffsetDateTime::from_unix_timestamp).transpose()?;
                    set_time_frame(timestamp)?
                }
                HostFrame::Init2 => init2_frame()?,
                HostFrame::Finish => finish_measurement_frame()?,
            };
            println!("{}", hex::encode(bytes));
        }
        Command::Replay { unit, queue, file } => {
            let reader: Box<dyn AsyncBufRead + Unpin> = match file {
                Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
                None => Box::new(BufReader::new(tokio::io::stdin())),
            };

            let scale = EtekcityScale::new(ScaleConfig {
                display_unit: unit,
                queue_capacity: queue,
                ..ScaleConfig::default()
            });
            replay(&scale, reader, &mut StdoutWriter).await?;

            if let Some(mac) = scale.device_mac().await {
                println!("Device: {}", mac);
            }
            match (scale.final_weight().await, scale.current_weight().await) {
                (Some(w), _) => println!("Final weight: {:.2} kg", w),
                (None, Some(w)) => println!("Last weight: {:.2} kg", w),
                (None, None) => println!("No weight received"),
            }
        }
    }

    Ok(())
}

fn decode_frames(frames: &[String]) -> Result<(), Box<dyn Error>> {
    let mut failures = 0;
    for frame in frames {
        let bytes = match hex::decode(frame.replace(' ', "")) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{}: not hex: {}", frame, e);
                failures += 1;
                continue;
            }
        };
        match decode_record(&bytes) {
            Ok(record) => println!("{}", record),
            Err(e) => {
                eprintln!("{}: {}", frame, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} frames failed to decode", failures, frames.len()).into());
    }
    Ok(())
}

/// Runs the notification log in `reader` through `scale`. A read error ends
/// the replay and is returned once the queued replies are written.
async fn replay<R, W>(scale: &EtekcityScale, reader: R, writer: &mut W) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: FrameWriter,
{
    let mut read_error = None;
    let frames = frame_lines(reader).scan(&mut read_error, |slot, item| {
        future::ready(match item {
            Ok(frame) => Some(frame),
            Err(e) => {
                **slot = Some(e);
                None
            }
        })
    });
    scale.run(frames, writer).await?;

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Hex frames, one per line. Blank lines and `#` comments are skipped, as
/// are lines that are not UTF-8 or not hex.
fn frame_lines<R>(reader: R) -> impl Stream<Item = io::Result<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    try_stream! {
        let mut segments = reader.split(b'\n');
        while let Some(segment) = segments.next_segment().await? {
            let line = match std::str::from_utf8(&segment) {
                Ok(line) => line.trim(),
                Err(e) => {
                    warn!(error = %e, "Skipping line that is not UTF-8");
                    continue;
                }
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match hex::decode(line.replace(' ', "")) {
                Ok(frame) => yield frame,
                Err(e) => warn!(error = %e, line, "Skipping line that is not hex"),
            }
        }
    }
}
