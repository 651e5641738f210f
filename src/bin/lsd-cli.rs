//! lsd-cli - Command-line interface for lsdreader
//!
//! Unpacks ABBYY Lingvo `.lsd` dictionaries into DSL source files.

use clap::{ArgGroup, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use lsdreader::languages::LANGUAGES;
use lsdreader::unpack::unpack;
use lsdreader::{Header, LsdError, LsdFile, UnpackOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Dictionaries with more entries than this get a progress bar
const PROGRESS_THRESHOLD: u32 = 1000;

#[derive(Parser)]
#[command(name = "lsd-cli")]
#[command(about = "Decode ABBYY Lingvo LSD dictionaries to DSL")]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true).args(["input", "all", "codecs"])))]
struct Cli {
    /// Dictionary file to unpack
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Unpack every .lsd file in the current directory
    #[arg(short, long)]
    all: bool,

    /// Print the supported language codes
    #[arg(short, long)]
    codecs: bool,

    /// Print the dictionary header and exit
    #[arg(long)]
    header: bool,

    /// Output directory, created if missing
    #[arg(short, long)]
    outdir: Option<PathBuf>,

    /// Verbose output: write the prefix file, dump the header and show
    /// decoder debug logs (`RUST_LOG` overrides the log level)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if cli.codecs {
        print_codecs();
        return;
    }

    let files = match collect_inputs(&cli) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut failed = 0;
    for path in &files {
        match process_file(path, &cli) {
            Ok(()) => {}
            Err(LsdError::UnsupportedVersion(version)) => {
                let header = fs::read(path)
                    .map_err(LsdError::from)
                    .and_then(|data| Header::parse(&data));
                if let Ok(header) = header {
                    println!("{}", header);
                }
                eprintln!(
                    "Error: {}: unsupported dictionary version {:#x}",
                    path.display(),
                    version
                );
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if !cli.quiet && files.len() > 1 {
        println!(
            "{} of {} dictionaries unpacked",
            files.len() - failed,
            files.len()
        );
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Default log directive for the verbosity flags
fn log_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "lsdreader=debug"
    } else {
        "warn"
    }
}

/// Route the library's `log` records to stderr
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(cli.verbose, cli.quiet)));
    // fails only when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_codecs() {
    println!("Supported language codes:");
    for (code, name) in LANGUAGES {
        println!("  {:>5}  {}", code, name);
    }
}

fn collect_inputs(cli: &Cli) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file '{}' does not exist", input.display()).into());
        }
        if !is_lsd_path(input) {
            return Err(format!("Input file '{}' is not an .lsd file", input.display()).into());
        }
        return Ok(vec![input.clone()]);
    }

    let files = lsd_files_in(Path::new("."))?;
    if files.is_empty() {
        return Err("No .lsd files found in the current directory".into());
    }
    Ok(files)
}

fn is_lsd_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("lsd"))
}

fn lsd_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_lsd_path(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn progress_bar(entries: u32, quiet: bool) -> Option<ProgressBar> {
    if quiet || entries <= PROGRESS_THRESHOLD {
        return None;
    }

    let pb = ProgressBar::new(entries as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message("Decoding articles...");
    Some(pb)
}

fn process_file(path: &Path, cli: &Cli) -> lsdreader::Result<()> {
    let start_time = Instant::now();
    let file = LsdFile::open(path)?;

    if cli.header {
        println!("{}", file.dump());
        return Ok(());
    }

    if !cli.quiet {
        println!("Unpacking '{}'", path.display());
    }

    let mut options = UnpackOptions::new().with_prefix(cli.verbose);
    if let Some(outdir) = &cli.outdir {
        options = options.with_output_dir(outdir);
    }

    let progress = progress_bar(file.header().entries_count, cli.quiet);
    let report = unpack(&file, path, &options, |done, total| {
        if let Some(pb) = &progress {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }
    })?;
    if let Some(pb) = &progress {
        pb.finish_with_message("Articles decoded");
    }

    if !cli.quiet {
        println!("✓ Unpacked {}", file.info().name);
        println!("  Headings: {}", report.headings);
        println!("  Articles: {}", report.articles);
        println!("  Time:     {:.2?}", start_time.elapsed());
        for written in report.files() {
            println!("  Wrote:    {}", written.display());
        }
    }

    if cli.verbose {
        println!("{}", file.dump());
    }

    Ok(())
}
