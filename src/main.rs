mod error;
mod parser;
mod pipeline;
mod serialiser;
mod source;
mod subtitle;
mod timing;

use crate::error::ConvertError;
use crate::pipeline::{CancelToken, Pipeline};
use crate::subtitle::FileFormat;

use std::fs::File;
use std::future::Future;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser as ClapParser};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const READ_BUFFER_SIZE: usize = 256 * 1024;
const WRITE_BUFFER_SIZE: usize = 256 * 1024;

const EXIT_FAILURE: i32 = 1;
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            let interrupted = err
                .downcast_ref::<ConvertError>()
                .map_or(false, |e| e.is_cancelled());
            process::exit(if interrupted {
                EXIT_INTERRUPTED
            } else {
                EXIT_FAILURE
            });
        }
    }
}

#[derive(ClapParser)]
#[command(
    about = "Convert subtitles between frame-based and SRT formats",
    args_override_self = true
)]
struct Cli {
    #[arg(
        value_name = "FILE",
        help = "The file to read from. If not supplied, the subtitles will be read from standard input.",
        default_value = "-"
    )]
    input: String,
    #[arg(hide = true)]
    ignored: Vec<String>,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to. If not supplied, the subtitles will be written to standard output.",
        default_value = "-"
    )]
    output: String,
    #[arg(
        short,
        long,
        value_enum,
        value_name = "FORMAT",
        help = "Input format. Inferred from the input file extension, or txt."
    )]
    from: Option<FileFormat>,
    #[arg(
        short,
        long,
        value_enum,
        value_name = "FORMAT",
        help = "Output format. Inferred from the output file extension, or srt."
    )]
    to: Option<FileFormat>,
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Log more details to standard error. Repeat for more."
    )]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "subconv=warn",
        1 => "subconv=info",
        2 => "subconv=debug",
        _ => "subconv=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let input_format = cli
        .from
        .or_else(|| FileFormat::from_path(&cli.input))
        .unwrap_or(FileFormat::Txt);
    let output_format = cli
        .to
        .or_else(|| FileFormat::from_path(&cli.output))
        .unwrap_or(FileFormat::Srt);
    if !cli.ignored.is_empty() {
        warn!(ignored = ?cli.ignored, "only the first input file is converted");
    }
    info!(input = %cli.input, %input_format, output = %cli.output, %output_format, "converting");

    let cancel = CancelToken::new();
    watch_interrupt(cancel.clone())?;

    let reader = open_input(&cli.input)?;
    let writer = open_output(&cli.output)?;

    let mut pipeline = Pipeline::new(reader, writer, input_format, output_format, cancel);
    let result = pipeline.run();
    debug!(state = ?pipeline.state(), "pipeline stopped");

    let (_, writer) = pipeline.into_inner();
    let emitted = finish(result, writer, &cli.output)?;

    info!(emitted, "conversion finished");
    Ok(())
}

/// Flushes whatever the run wrote, even after a failure. A failed run is
/// reported ahead of a failed flush.
fn finish<W: Write>(
    result: Result<usize, ConvertError>,
    mut writer: W,
    path: &str,
) -> Result<usize> {
    let flushed = writer.flush();
    let emitted = result?;
    flushed.context(format!("Failed to write to output file: '{}'", path))?;
    Ok(emitted)
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    if path == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).context(format!("Failed to open input file: '{}'", path))?;
    Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
}

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(BufWriter::with_capacity(
            WRITE_BUFFER_SIZE,
            io::stdout().lock(),
        )));
    }
    let file = File::create(path).context(format!("Failed to create output file: '{}'", path))?;
    Ok(Box::new(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file)))
}

/// Cancels the conversion on Ctrl-C. The conversion notices at the next
/// subtitle boundary; a second Ctrl-C exits immediately.
fn watch_interrupt(cancel: CancelToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start signal handler")?;
    std::thread::spawn(move || {
        runtime.block_on(handle_interrupts(tokio::signal::ctrl_c, cancel, || {
            process::exit(EXIT_INTERRUPTED);
        }))
    });
    Ok(())
}

async fn handle_interrupts<F, Fut, E>(mut interrupted: F, cancel: CancelToken, exit: E)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
    E: FnOnce(),
{
    if interrupted().await.is_err() {
        return;
    }
    warn!("interrupted, stopping after the current subtitle");
    cancel.cancel();

    if interrupted().await.is_ok() {
        exit();
    }
}
