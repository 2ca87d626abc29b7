use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use lml_parse::{AttributeOrder, Diagnostic, Format, Severity};
use std::path::PathBuf;

mod config;
mod logger;

#[derive(Parser)]
#[command(name = "lml", version, about = "Convert between HTML, LML and JSON markup")]
struct Cli {
    /// Source file (.html, .lml or .json)
    source: PathBuf,

    /// Source format (default: from the source file extension)
    #[arg(long, value_enum)]
    from: Option<FormatArg>,

    /// Output format (default: from the --out extension, else HTML <-> LML)
    #[arg(long, value_enum)]
    to: Option<FormatArg>,

    /// Minify HTML or JSON output
    #[arg(long)]
    minify: bool,

    /// Spaces or one tab; `s` and `t` stand for a space and a tab
    #[arg(long, value_name = "INDENT")]
    indentation: Option<String>,

    /// Wrap long lines at N characters (0 disables wrapping)
    #[arg(long, value_name = "N")]
    line_wrap: Option<usize>,

    /// Attribute output order
    #[arg(long, value_enum)]
    order_attributes: Option<OrderArg>,

    /// Write output to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Config file (default: lml.json in the working directory, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Suppress warnings and status output
    #[arg(long)]
    quiet: bool,

    /// Log parser and renderer activity to stderr
    #[arg(long)]
    verbose: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FormatArg {
    Html,
    Lml,
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => Format::Html,
            FormatArg::Lml => Format::Lml,
            FormatArg::Json => Format::Json,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OrderArg {
    AsAuthored,
    Alphabetical,
}

impl From<OrderArg> for AttributeOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::AsAuthored => AttributeOrder::AsAuthored,
            OrderArg::Alphabetical => AttributeOrder::Alphabetical,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        logger::init(log::LevelFilter::Debug).context("Failed to install logger")?;
    }

    handle_convert(&cli)
}

fn handle_convert(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let file_config = config::load_config(&cwd, cli.config.as_deref())?;

    let from = cli
        .from
        .map(Format::from)
        .or(file_config.from)
        .unwrap_or_else(|| config::infer_source_format(&cli.source));
    let to = cli
        .to
        .map(Format::from)
        .or(file_config.to)
        .unwrap_or_else(|| config::infer_target_format(cli.out.as_deref(), from));

    let overrides = config::Overrides {
        minify: cli.minify,
        indentation: cli.indentation.clone(),
        line_wrap: cli.line_wrap,
        order_attributes: cli.order_attributes.map(AttributeOrder::from),
    };
    let output = config::merge_output(&file_config.output, &overrides);
    // Reject the output options before touching the source.
    output.resolve(to)?;
    log::debug!(target: "lml", "converting {} from {from:?} to {to:?}", cli.source.display());

    let content = std::fs::read_to_string(&cli.source)
        .with_context(|| format!("Failed to read '{}'", cli.source.display()))?;
    let origin = cli.source.display().to_string();
    let result = lml_parse::parse(&content, from, Some(&origin));

    for diag in &result.diagnostics {
        if diag.is_error() || !cli.quiet {
            eprintln!("{}", format_diagnostic(diag, &origin));
        }
    }
    if result.is_fatal() {
        std::process::exit(1);
    }

    let rendered = lml_parse::render(&result.document, to, &output)?;
    let text = format!("{}\n", rendered.trim());

    match &cli.out {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            if !cli.quiet {
                println!("{} {}", "Wrote".green(), path.display());
            }
        }
        None => print!("{text}"),
    }

    Ok(())
}

fn format_diagnostic(diag: &Diagnostic, file: &str) -> String {
    let severity_str = match diag.severity {
        Severity::Error => format!("{}", "error".red().bold()),
        Severity::Warning => format!("{}", "warning".yellow().bold()),
    };

    let line_info = match diag.location {
        Some(location) => format!("{file}:{location}"),
        None => file.to_string(),
    };

    let code_str = match &diag.code {
        Some(c) => format!("[{}] ", c),
        None => String::new(),
    };

    format!("{line_info}: {severity_str}: {code_str}{}", diag.message)
}
