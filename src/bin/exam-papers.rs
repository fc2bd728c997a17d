//! Exam Papers CLI tool
//!
//! A command-line tool for turning a question selection into exam PDFs.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use exam_papers::config::ExportConfig;
use exam_papers::date::{resolve_date_field, DateStyle};
use exam_papers::export::{DirectoryDelivery, Exporter, Navigator, Variant};
use exam_papers::layout::{LayoutMode, PageDimensions, PageGeometry};
use exam_papers::pdf::{extract_metadata_from_file, PdfRenderer};
use exam_papers::preview::PreviewHost;
use exam_papers::{fonts, logging, question};

/// Exam Papers - Compose question papers and answer keys as PDF
#[derive(Parser)]
#[command(name = "exam-papers")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Export both papers into ./exports
    exam-papers export -q selected.json --school \"Lincoln High\" --subject Math --date today

    # Two-column layout with a watermark, then open the results
    exam-papers export --questions selected.json --layout horizontal --watermark DRAFT --open

    # Show what the answer key would contain
    exam-papers preview --questions selected.json --answers

    # Inspect an exported file
    exam-papers info exports/questions_only.pdf")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by `export` and `preview`
#[derive(Args)]
struct PaperArgs {
    /// JSON file with the selected questions (a list, or an object with `selectedQuestions`)
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// School name (first header line)
    #[arg(long, default_value = "")]
    school: String,

    /// Subject
    #[arg(long, default_value = "")]
    subject: String,

    /// Date (e.g., "today", "Tuesday+1", "2026-01-14", or any free text)
    #[arg(long, default_value = "")]
    date: String,

    /// How resolved dates are written: iso or long
    #[arg(long)]
    date_style: Option<String>,

    /// Watermark text drawn across every page
    #[arg(long, default_value = "")]
    watermark: String,

    /// Layout: vertical or horizontal
    #[arg(long)]
    layout: Option<LayoutMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the questions-only paper and the answer key
    Export {
        #[command(flatten)]
        paper: PaperArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Page size: a4 or letter
        #[arg(long)]
        page_size: Option<String>,

        /// Open both files after export
        #[arg(long)]
        open: bool,
    },

    /// Print the page description of one variant as JSON
    Preview {
        #[command(flatten)]
        paper: PaperArgs,

        /// Describe the answer key instead of the questions-only paper
        #[arg(long)]
        answers: bool,
    },

    /// Show information about an exported PDF
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

/// Reports the hand-off back to the question selection step
struct ReturnToDashboard;

impl Navigator for ReturnToDashboard {
    fn leave_preview(&self) {
        info!("Both papers saved, returning to the dashboard");
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = ExportConfig::from_env();

    let result = match cli.command {
        Commands::Export { paper, output, page_size, open } => {
            cmd_export(&config, paper, output, page_size, open)
        }
        Commands::Preview { paper, answers } => {
            cmd_preview(&config, paper, answers)
        }
        Commands::Info { input } => {
            cmd_info(&input)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Load the questions and apply the header and layout flags to a fresh host
fn build_host(config: &ExportConfig, paper: PaperArgs) -> Result<PreviewHost> {
    let questions = match &paper.questions {
        Some(path) => question::load_questions(path)
            .with_context(|| format!("reading questions from {}", path.display()))?,
        None => None,
    };

    let date_style = match paper.date_style.as_deref() {
        Some(name) => match DateStyle::from_name(name) {
            Some(style) => style,
            None => bail!("unknown date style: {} (expected iso or long)", name),
        },
        None => config.date_style,
    };

    let host = PreviewHost::new(questions);
    host.set_layout(paper.layout.unwrap_or(config.layout));
    host.set_school_name(paper.school);
    host.set_subject(paper.subject);
    host.set_date(resolve_date_field(&paper.date, date_style));
    host.set_watermark(paper.watermark);
    Ok(host)
}

/// Render and save both variants
fn cmd_export(
    config: &ExportConfig,
    paper: PaperArgs,
    output: Option<PathBuf>,
    page_size: Option<String>,
    open: bool,
) -> Result<()> {
    let page = match page_size.as_deref() {
        Some(name) => match PageDimensions::from_name(name) {
            Some(page) => page,
            None => bail!("unknown page size: {} (expected a4 or letter)", name),
        },
        None => config.page_size,
    };
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let host = build_host(config, paper)?;

    let renderer = PdfRenderer::new(fonts::register()).with_geometry(PageGeometry::new(page));
    let exporter = Exporter::new(Arc::new(renderer), Arc::new(DirectoryDelivery::new(&output)))
        .with_navigator(Arc::new(ReturnToDashboard));

    eprintln!("Exporting {} questions...", host.questions().len());

    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let report = runtime.block_on(host.export(&exporter))?;

    for name in report.delivered() {
        eprintln!("Saved: {}", output.join(name).display());
    }
    for (variant, e) in report.failures() {
        eprintln!("Failed ({}): {}", variant, e);
    }
    report.into_result()?;

    if open {
        for variant in Variant::ALL {
            open_file(&output.join(exporter.filename(variant)))?;
        }
    }

    Ok(())
}

/// Print one variant's page description
fn cmd_preview(config: &ExportConfig, paper: PaperArgs, answers: bool) -> Result<()> {
    let host = build_host(config, paper)?;
    let variant = if answers { Variant::WithAnswers } else { Variant::QuestionsOnly };

    let description = host.pane(variant).compose()?;
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata_from_file(input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }

    Ok(())
}
