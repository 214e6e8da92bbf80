//! qbank CLI - question bank extraction tool

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use qbank::convert::{batch_stats, convert_batch_with, convert_file, is_missing_source};
use qbank::{default_output_dir, ExtractOptions, OutputLayout, QBank, SourceKind};

#[derive(Parser)]
#[command(name = "qbank")]
#[command(author = "qbank contributors")]
#[command(version)]
#[command(about = "Extract exam question banks to JSON", long_about = None)]
struct Cli {
    /// Source document (block record stream or form page)
    #[arg(value_name = "SOURCE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: ExtractFlags,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Args, Clone)]
struct ExtractFlags {
    /// Source kind
    #[arg(long, value_enum, default_value = "auto", global = true)]
    kind: KindArg,

    /// Output record layout
    #[arg(long, value_enum, default_value = "bank", global = true)]
    layout: LayoutArg,

    /// Output compact JSON
    #[arg(long, global = true)]
    compact: bool,

    /// Do not write image files
    #[arg(long, global = true)]
    no_images: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert many sources, one sub-directory each
    Batch {
        /// Source documents
        #[arg(value_name = "SOURCES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output root directory
        #[arg(short, long, value_name = "DIR", default_value = "qbank_output")]
        output: PathBuf,

        /// Convert one document at a time
        #[arg(long)]
        sequential: bool,
    },

    /// Show extraction statistics without writing output
    Info {
        /// Source document
        #[arg(value_name = "SOURCE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Detect from extension, then content
    Auto,
    /// Page-ordered text/image block records (JSON or JSON Lines)
    Paginated,
    /// Form page with radio-control rows
    Markup,
}

impl KindArg {
    fn source_kind(self) -> Option<SourceKind> {
        match self {
            KindArg::Auto => None,
            KindArg::Paginated => Some(SourceKind::Paginated),
            KindArg::Markup => Some(SourceKind::Markup),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    /// Nested sections with questions
    Bank,
    /// Flat question list with bare answer values
    Review,
}

impl From<LayoutArg> for OutputLayout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Bank => OutputLayout::Bank,
            LayoutArg::Review => OutputLayout::Review,
        }
    }
}

impl ExtractFlags {
    fn to_options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new()
            .with_layout(self.layout.into())
            .with_images(!self.no_images);
        if let Some(kind) = self.kind.source_kind() {
            options = options.with_source_kind(kind);
        }
        if self.compact {
            options = options.compact();
        }
        options
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let options = cli.flags.to_options();

    let result = match cli.command {
        Some(Commands::Batch {
            inputs,
            output,
            sequential,
        }) => {
            let options = if sequential {
                options.sequential()
            } else {
                options
            };
            cmd_batch(&inputs, &output, &options)
        }
        Some(Commands::Info { input }) => cmd_info(&input, options),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_convert(&input, cli.output.as_deref(), &options)
            } else {
                println!("{}", "Usage: qbank <SOURCE> [OUTPUT]".yellow());
                println!("       qbank --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output_dir(input));

    let pb = spinner(&format!("Extracting {}...", input.display()));
    let result = convert_file(input, &output_dir, options);
    pb.finish_and_clear();
    let result = result?;

    for diagnostic in result.diagnostics.iter().filter(|d| d.drops_content()) {
        println!("{} {}", "warning:".yellow(), diagnostic);
    }

    println!(
        "{} {} records ({} sections, {} questions, {} images) from {} source",
        "Done!".green().bold(),
        result.record_count,
        result.sections.len(),
        result.question_count(),
        result.images_written,
        result.kind
    );
    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), result.json_path.display());
    println!(
        "  {} {}",
        "└─".dimmed(),
        result.output_dir.join("images").display()
    );

    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    output: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message("Converting...");

    let results = convert_batch_with(inputs, output, options, |_| pb.inc(1));
    pb.finish_with_message("Done!");

    let mut missing = 0;
    for (input, result) in inputs.iter().zip(&results) {
        match result {
            Ok(converted) => println!(
                "  {} {} ({} records)",
                "✓".green(),
                input.display(),
                converted.record_count
            ),
            Err(e) => {
                if is_missing_source(result) {
                    missing += 1;
                }
                println!("  {} {}: {}", "✗".red(), input.display(), e);
            }
        }
    }

    let stats = batch_stats(&results);
    let failed = results.iter().filter(|r| r.is_err()).count();
    println!(
        "\n{} {} documents, {} sections, {} questions, {} images ({} failed)",
        "Batch complete:".green().bold(),
        results.len() - failed,
        stats.section_count,
        stats.question_count,
        stats.image_count,
        failed
    );

    if missing > 0 {
        return Err(format!("{} source path(s) not found", missing).into());
    }
    Ok(())
}

fn cmd_info(input: &Path, options: ExtractOptions) -> Result<(), Box<dyn std::error::Error>> {
    let result = QBank::with_options(options.with_images(false)).extract_file(input)?;
    let extraction = &result.extraction;
    let stats = &extraction.stats;

    println!("{}", "Source Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Kind".bold(), extraction.kind);
    println!(
        "{}: {} ({} text, {} image)",
        "Blocks".bold(),
        stats.block_count,
        stats.text_block_count,
        stats.image_block_count
    );

    println!();
    println!("{}", "Question Bank".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for section in result.sections() {
        println!(
            "{} {} {}: {} questions",
            section.label().bold(),
            section.cert_level,
            section.title,
            section.question_count()
        );
    }
    println!("{}: {}", "Questions".bold(), stats.question_count);
    println!(
        "{}: {} ({:.0}%)",
        "Answers".bold(),
        stats.answer_count,
        stats.answer_ratio() * 100.0
    );
    println!("{}: {}", "Options".bold(), stats.option_count);
    println!(
        "{}: {} attached, {} dropped",
        "Images".bold(),
        stats.image_count,
        stats.dropped_image_count
    );

    if !result.diagnostics().is_empty() {
        println!();
        println!("{}", "Diagnostics".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for diagnostic in result.diagnostics() {
            println!("  {}", diagnostic);
        }
    }

    log::debug!("{} diagnostics", result.diagnostics().len());
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "qbank".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Question bank extraction tool");
    println!();
    println!("License: MIT");
}
