//! # StreamIconv CLI - Streaming Character Set Converter
//!
//! Command-line interface converting files or standard streams between any
//! two encodings the platform iconv supports.

#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, Read};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::info;

#[cfg(feature = "cli")]
use stream_iconv::{
    ConversionOption, Converter, Error as ConvertError, OverflowPolicy, PumpConfig, Summary,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// StreamIconv: streaming character set converter
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "stream-iconv")]
#[command(version, about, long_about = None)]
#[command(author = "StreamIconv Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert a file or stdin between character encodings
    Convert(ConvertArgs),

    /// Check that input is well-formed in an encoding
    Check(CheckArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding, passed to iconv as-is
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Target encoding, passed to iconv as-is
    #[arg(short = 't', long = "to")]
    to: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Handling of unrepresentable characters (none, translit, ignore)
    #[arg(long, default_value = "none")]
    option: String,

    /// Pump configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read buffer size in bytes
    #[arg(long)]
    read_buffer: Option<usize>,

    /// Write buffer size in bytes
    #[arg(long)]
    write_buffer: Option<usize>,

    /// Flush and continue instead of failing when the write buffer fills up
    #[arg(long)]
    retry_on_overflow: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct CheckArgs {
    /// Expected encoding
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    from: String,
    to: String,
    #[serde(flatten)]
    summary: Summary,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CheckResult {
    valid: bool,
    encoding: String,
    error: Option<String>,
    offset: Option<u64>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Check(ref args) => check_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

#[cfg(feature = "cli")]
fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            info!("Reading from: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => {
            info!("Reading from stdin");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

#[cfg(feature = "cli")]
fn load_config(args: &ConvertArgs) -> Result<PumpConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        }
        None => PumpConfig::default(),
    };

    if let Some(bytes) = args.read_buffer {
        config = config.read_capacity(bytes);
    }
    if let Some(bytes) = args.write_buffer {
        config = config.write_capacity(bytes);
    }
    if args.retry_on_overflow {
        config = config.on_overflow(OverflowPolicy::FlushAndRetry);
    }
    Ok(config)
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();

    let option = ConversionOption::from(args.option.as_str());
    let config = load_config(args)?;

    info!(
        "Converting from {} to {} (option: {})",
        args.from, args.to, option
    );

    let mut converter = Converter::open(&args.to, &args.from, option)
        .with_context(|| format!("Failed to open converter from {} to {}", args.from, args.to))?
        .with_config(config)?;

    let mut input = open_input(args.input.as_deref())?;
    let summary = match args.output {
        Some(ref output_path) => {
            let file = File::create(output_path).with_context(|| {
                format!("Failed to create output file: {}", output_path.display())
            })?;
            let mut sink = BufWriter::new(file);
            let summary = converter
                .execute(&mut sink, &mut input)
                .context("Conversion failed")?;
            info!("Wrote to: {}", output_path.display());
            summary
        }
        None => {
            let mut sink = io::stdout().lock();
            converter
                .execute(&mut sink, &mut input)
                .context("Conversion failed")?
        }
    };
    converter.close();

    let processing_time = start_time.elapsed();
    info!(
        "Processed {} bytes -> {} bytes in {:?}",
        summary.bytes_read, summary.bytes_written, processing_time
    );

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                from: args.from.clone(),
                to: args.to.clone(),
                summary,
                processing_time_ms: processing_time.as_millis() as u64,
            };
            eprintln!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if cli.verbose || args.output.is_some() {
                eprintln!("✓ Conversion completed successfully");
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn check_command(args: &CheckArgs, cli: &Cli) -> Result<()> {
    // Output is discarded, so a full write buffer must never count as invalid input
    let config = PumpConfig::new().on_overflow(OverflowPolicy::FlushAndRetry);
    let mut converter = Converter::open("UTF-8", &args.from, ConversionOption::None)
        .with_context(|| format!("Unsupported encoding: {}", args.from))?
        .with_config(config)?;
    let mut input = open_input(args.input.as_deref())?;

    let outcome = converter.execute(&mut io::sink(), &mut input);
    converter.close();

    let failure = match outcome {
        Ok(_) => None,
        Err(ConvertError::Io(e)) => return Err(e).context("Failed to read input"),
        Err(e) => Some(e),
    };

    match cli.format {
        OutputFormat::Json => {
            let result = CheckResult {
                valid: failure.is_none(),
                encoding: args.from.clone(),
                error: failure.as_ref().map(|e| e.to_string()),
                offset: failure.as_ref().and_then(|e| e.offset()),
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => match failure {
            None => println!("✓ Input is valid {}", args.from),
            Some(ref e) => {
                println!("✗ Input is not valid {}", args.from);
                println!("  Error: {}", e);
            }
        },
    }

    if failure.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
