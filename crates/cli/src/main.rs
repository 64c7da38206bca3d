use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use newsmark_core::{ConvertConfig, Converter, Document, plain_text};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

use echo::{format_size, print_banner, print_detail, print_info, print_step, print_success, print_timing, print_warning};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert scraped news HTML into clean, structure-preserving text markup
#[derive(Parser, Debug)]
#[command(name = "newsmark")]
#[command(author = "Newsmark Contributors")]
#[command(version)]
#[command(about = "Convert scraped news HTML into clean text markup", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// URL the document was fetched from, used to resolve relative links
    #[arg(long, value_name = "URL", value_parser = parse_base_url)]
    base_url: Option<Url>,

    /// JSON conversion config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum converter recursion depth
    #[arg(long, value_name = "NUM")]
    max_depth: Option<u32>,

    /// Disable site-specific cleanup rules
    #[arg(long)]
    no_site_rules: bool,

    /// Output flat plain text only
    #[arg(long)]
    plain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_base_url(value: &str) -> Result<Url, String> {
    Url::parse(value).map_err(|e| format!("invalid base URL '{}': {}", value, e))
}

/// Logs go to stderr so stdout stays clean for the converted text.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("newsmark_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<ConvertConfig> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ConvertConfig::default(),
    };

    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if args.no_site_rules {
        config.site_rules = false;
    }

    config.validate().context("Invalid conversion config")?;
    tracing::debug!(?config, "loaded conversion config");
    Ok(config)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        return Ok(buffer);
    }

    let bytes = fs::read(input).with_context(|| format!("Failed to read file: {}", input))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let config = load_config(&args)?;

    if args.verbose {
        let source = if args.input == "-" { "stdin".to_string() } else { args.input.clone() };
        print_step(1, 3, &format!("Reading from {}", source.bright_white()));
    }

    let html = read_input(&args.input)?;

    if args.verbose {
        print_detail("Size", &format_size(html.len()));
        if let Some(title) = Document::parse(&html).ok().as_ref().and_then(Document::title) {
            print_detail("Title", title);
        }
        if let Some(base) = &args.base_url {
            print_detail("Base URL", base.as_str());
        }
        eprintln!();
    }

    if let Some(limit) = config.max_input_bytes
        && html.len() > limit
        && !args.plain
    {
        print_warning(&format!(
            "Input is {} (limit {}), falling back to plain text",
            format_size(html.len()),
            format_size(limit)
        ));
    }

    if args.verbose {
        print_step(2, 3, if args.plain { "Extracting plain text" } else { "Converting document" });
    }

    let started = Instant::now();
    let output = if args.plain {
        plain_text(&html)
    } else {
        Converter::new(config).convert(&html, args.base_url.as_ref().map(Url::as_str))
    };

    if args.verbose {
        print_timing("Conversion", started.elapsed());
        print_detail("Output", &format_size(output.len()));
        eprintln!();
        print_step(3, 3, "Writing output");
    }

    match args.output {
        Some(path) => {
            fs::write(&path, format!("{}\n", output))
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
