//! Manual PDF CLI tool
//!
//! Writes the Family Health Center user manual to a PDF.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manual_pdf::date::format_pdf_date;
use manual_pdf::generate::{create_manual_pdf, default_output_path, GenerateOptions};
use manual_pdf::pdf::{extract_metadata, FontPreference};

/// Manual PDF - Generate the product user manual
#[derive(Parser)]
#[command(name = "manual-pdf")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Write docs/产品使用说明书.pdf
    manual-pdf

    # Write somewhere else and open the result
    manual-pdf generate -o manual.pdf --open

    # Embed a font file instead of referencing STSong-Light
    manual-pdf generate --font-file simhei.ttf

    # Inspect a generated file
    manual-pdf info docs/产品使用说明书.pdf")]
struct Cli {
    /// Log debug output (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the manual (the default when no command is given)
    Generate {
        /// Output PDF file path [default: docs/产品使用说明书.pdf]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TrueType font to embed (falls back to STSong-Light if unusable, including CFF .otf files)
        #[arg(long)]
        font_file: Option<PathBuf>,

        /// Font preference: auto, cjk or latin
        #[arg(long, default_value_t = FontPreference::Auto)]
        font: FontPreference,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "manual_pdf=debug" } else { "manual_pdf=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Generate {
        output: None,
        font_file: None,
        font: FontPreference::Auto,
        open: false,
    });

    let result = match command {
        Commands::Generate { output, font_file, font, open } => {
            cmd_generate(output, font_file, font, open)
        }
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Open a file with the system default application
fn open_file(path: &PathBuf) -> anyhow::Result<()> {
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

/// Generate the manual
fn cmd_generate(
    output: Option<PathBuf>,
    font_file: Option<PathBuf>,
    font: FontPreference,
    open: bool,
) -> anyhow::Result<()> {
    let options = GenerateOptions {
        output_path: output.unwrap_or_else(default_output_path),
        font_file,
        preference: font,
        ..Default::default()
    };

    let report = create_manual_pdf(&options)
        .with_context(|| format!("failed to write {}", options.output_path.display()))?;

    println!("PDF已生成: {}", report.output_path.display());

    if open {
        open_file(&report.output_path)
            .with_context(|| format!("failed to open {}", report.output_path.display()))?;
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    let metadata = extract_metadata(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(subject) = metadata.subject {
        println!("Subject: {}", subject);
    }
    if let Some(producer) = metadata.producer {
        println!("Producer: {}", producer);
    }
    if let Some(created) = metadata.created {
        println!("Created: {}", format_pdf_date(&created));
    }
    if !metadata.fonts.is_empty() {
        println!("Fonts: {}", metadata.fonts.join(", "));
    }

    Ok(())
}
