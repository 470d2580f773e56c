use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use chunkbox_codecs::{codec_by_name, PassThroughCodec, DEFAULT_CODEC, DEFAULT_LEVEL};
use chunkbox_core::roundtrip::{self, RoundTrip};
use chunkbox_core::{
    decode_stream, encode_stream, Codec, Error, FrameHeader, FrameReader, HeaderWidth,
    PipelineStats, ScratchArena, CHUNK_SIZE,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "chunkbox",
    about = "Chunked block compression container: split into 64 KB blocks, compress, frame, and restore",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source file for the round-trip self-test
    infile: Option<PathBuf>,
    /// Container file written by the round-trip self-test
    outfile: Option<PathBuf>,
    /// Where the round trip writes the reconstruction (default: <OUTFILE>.restored)
    #[arg(short, long)]
    restore_to: Option<PathBuf>,

    #[command(flatten)]
    format: FormatOpts,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args, Clone)]
struct FormatOpts {
    /// Codec to use: lz4 | zstd | passthrough
    #[arg(short, long, default_value = DEFAULT_CODEC)]
    codec: String,
    /// Zstd compression level (only used with --codec zstd)
    #[arg(long, default_value_t = DEFAULT_LEVEL)]
    level: i32,
    /// Frame header width in bytes: 4 or 8 (default: native word size)
    #[arg(long, value_parser = parse_width)]
    header_width: Option<HeaderWidth>,
}

impl FormatOpts {
    fn codec(&self) -> anyhow::Result<Box<dyn Codec>> {
        Ok(codec_by_name(&self.codec, self.level)?)
    }

    fn width(&self) -> HeaderWidth {
        self.header_width.unwrap_or_default()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file into a container
    Compress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination container ("-" writes stdout)
        output: PathBuf,
        #[command(flatten)]
        format: FormatOpts,
    },
    /// Decode a container back to the original bytes
    Decompress {
        /// Source container ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
        #[command(flatten)]
        format: FormatOpts,
    },
    /// Walk the frame headers of a container without decoding payloads
    Inspect {
        /// Container to inspect
        file: PathBuf,
        /// Print one line per frame
        #[arg(long)]
        frames: bool,
        /// Frame header width in bytes: 4 or 8 (default: native word size)
        #[arg(long, value_parser = parse_width)]
        header_width: Option<HeaderWidth>,
    },
}

fn parse_width(s: &str) -> Result<HeaderWidth, String> {
    s.parse::<usize>()
        .ok()
        .and_then(HeaderWidth::from_bytes)
        .ok_or_else(|| format!("header width must be 4 or 8, got '{s}'"))
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(BufReader::new(roundtrip::open(path)?)))
}

/// Output that is either stdout or a file that must be closed explicitly.
enum Sink {
    Stdout(io::Stdout),
    File(BufWriter<File>, PathBuf),
}

impl Sink {
    fn create(path: &Path) -> anyhow::Result<Self> {
        if is_stdio(path) {
            return Ok(Sink::Stdout(io::stdout()));
        }
        let file = roundtrip::create(path)?;
        Ok(Sink::File(BufWriter::new(file), path.to_path_buf()))
    }

    fn close(self) -> anyhow::Result<()> {
        match self {
            Sink::Stdout(mut out) => out
                .flush()
                .map_err(|source| Error::ShortWrite { source })?,
            Sink::File(file, path) => roundtrip::close(file, &path)?,
        }
        Ok(())
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(out) => out.write(buf),
            Sink::File(file, _) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::File(file, _) => file.flush(),
        }
    }
}

fn print_pass(label: &str, stats: &PipelineStats, elapsed_secs: f64) {
    eprintln!("  {label}");
    eprintln!("    blocks      : {}", stats.blocks);
    eprintln!(
        "    frames      : {} compressed, {} raw",
        stats.compressed_frames, stats.raw_frames
    );
    eprintln!("    raw size    : {}", human_bytes(stats.raw_bytes));
    eprintln!("    container   : {}", human_bytes(stats.container_bytes));
    eprintln!("    ratio       : {:.2}x", stats.ratio());
    if elapsed_secs > 0.0 {
        eprintln!(
            "    throughput  : {}/s",
            human_bytes((stats.raw_bytes as f64 / elapsed_secs) as u64)
        );
    }
    eprintln!("    elapsed     : {:.3}s", elapsed_secs);
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_roundtrip(
    infile: PathBuf,
    outfile: PathBuf,
    restore_to: Option<PathBuf>,
    format: &FormatOpts,
) -> anyhow::Result<()> {
    let codec = format.codec()?;
    let restored = restore_to.unwrap_or_else(|| {
        let mut name = outfile.clone().into_os_string();
        name.push(".restored");
        PathBuf::from(name)
    });
    let job = RoundTrip {
        input: infile,
        container: outfile,
        restored,
        width: format.width(),
    };

    eprintln!(
        "chunkbox round trip: codec {}, {} headers, {} blocks",
        codec.name(),
        job.width,
        human_bytes(CHUNK_SIZE as u64)
    );

    debug!(
        input = ?job.input,
        container = ?job.container,
        restored = ?job.restored,
        "round trip paths"
    );

    let report = job.run(codec.as_ref())?;

    print_pass("encode", &report.encoded, report.encode_time.as_secs_f64());
    print_pass("decode", &report.decoded, report.decode_time.as_secs_f64());

    job.verify()
        .with_context(|| format!("verifying {:?} against {:?}", job.restored, job.input))?;
    eprintln!();
    eprintln!(
        "round trip passed: {} blocks restored into {:?}",
        report.decoded.blocks, job.restored
    );
    Ok(())
}

fn run_compress(input: &Path, output: &Path, format: &FormatOpts) -> anyhow::Result<()> {
    let codec = format.codec()?;
    let mut scratch = ScratchArena::for_codec(codec.as_ref(), CHUNK_SIZE)?;

    let src = open_input(input)?;
    let mut dst = Sink::create(output)?;

    let t0 = Instant::now();
    let stats = encode_stream(codec.as_ref(), format.width(), &mut scratch, src, &mut dst)
        .with_context(|| format!("compressing {:?}", input))?;
    dst.close()?;

    eprintln!("  codec       : {}", codec.name());
    print_pass("encode", &stats, t0.elapsed().as_secs_f64());
    Ok(())
}

fn run_decompress(input: &Path, output: &Path, format: &FormatOpts) -> anyhow::Result<()> {
    let codec = format.codec()?;
    let src = open_input(input)?;
    let mut dst = Sink::create(output)?;

    let t0 = Instant::now();
    let stats = decode_stream(codec.as_ref(), format.width(), src, &mut dst)
        .with_context(|| format!("decompressing {:?}", input))?;
    dst.close()?;

    print_pass("decode", &stats, t0.elapsed().as_secs_f64());
    Ok(())
}

fn run_inspect(file: &Path, show_frames: bool, width: HeaderWidth) -> anyhow::Result<()> {
    let src = open_input(file)?;
    // Header walking never calls the codec.
    let mut reader = FrameReader::new(src, &PassThroughCodec, width);

    if show_frames {
        println!(
            "  {:>8}  {:>12}  {:>12}  {:>10}",
            "frame", "offset", "payload", "kind"
        );
        println!("  {}", "-".repeat(48));
    }

    let mut offset = 0u64;
    let mut index = 0u64;
    while let Some(header) = reader
        .next_header()
        .with_context(|| format!("reading frame {} of {:?}", index, file))?
    {
        if show_frames {
            let kind = match header {
                FrameHeader::Compressed(_) => "compressed",
                FrameHeader::Raw(_) => "raw",
            };
            println!(
                "  {:>8}  {:>12}  {:>12}  {:>10}",
                index,
                offset,
                human_bytes(header.payload_len() as u64),
                kind
            );
        }
        offset += (width.size() + header.payload_len()) as u64;
        index += 1;
    }

    let stats = reader.stats();
    if show_frames {
        println!();
    }
    println!("=== chunkbox container: {:?} ===", file);
    println!();
    println!("  header width   : {}", width);
    println!("  frames         : {}", stats.blocks);
    println!("  compressed     : {}", stats.compressed_frames);
    println!("  raw            : {}", stats.raw_frames);
    println!("  container size : {}", human_bytes(stats.container_bytes));
    println!("  raw payload    : {}", human_bytes(stats.raw_bytes));
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Compress {
            input,
            output,
            format,
        }) => run_compress(&input, &output, &format),
        Some(Commands::Decompress {
            input,
            output,
            format,
        }) => run_decompress(&input, &output, &format),
        Some(Commands::Inspect {
            file,
            frames,
            header_width,
        }) => run_inspect(&file, frames, header_width.unwrap_or_default()),
        None => match (cli.infile, cli.outfile) {
            (Some(infile), Some(outfile)) => {
                run_roundtrip(infile, outfile, cli.restore_to, &cli.format)
            }
            _ => Err(Error::Usage("chunkbox <INFILE> <OUTFILE>".to_string()).into()),
        },
    }
}

/// Exit status for a failed run: the first chunkbox error in the chain
/// decides, anything else is an I/O-class failure.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and are not failures.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
