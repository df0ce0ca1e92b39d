//! unfile CLI - business document conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use unfile::{Converter, JsonFormat, OutputFormat, ParseOptions, RenderOptions, ValidationLimits};

#[derive(Parser)]
#[command(name = "unfile")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert PDF, Word, Excel and PowerPoint files to Markdown, text, CSV, and JSON", long_about = None)]
struct Cli {
    /// Maximum accepted file size in megabytes
    #[arg(long, global = true, env = "UNFILE_MAX_SIZE_MB", default_value_t = 50)]
    max_size_mb: u64,

    /// Disable parallel processing
    #[arg(long, global = true)]
    sequential: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file to all formats (Markdown, text, CSV, JSON)
    Convert {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Convert a file to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,
    },

    /// Convert a file to plain text
    Text {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Convert a file to JSON
    Json {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Convert a file's tables to CSV
    Csv {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let mut parse_options = ParseOptions::new();
    if cli.sequential {
        parse_options = parse_options.sequential();
    }
    let converter = Converter::new()
        .with_limits(ValidationLimits::with_max_size_mb(cli.max_size_mb))
        .with_parse_options(parse_options);

    let result = match cli.command {
        Commands::Convert { input, output } => cmd_convert(&converter, &input, output.as_deref()),
        Commands::Markdown {
            input,
            output,
            frontmatter,
        } => {
            let converter =
                converter.with_render_options(RenderOptions::new().with_frontmatter(frontmatter));
            cmd_single(&converter, &input, output.as_deref(), OutputFormat::Markdown)
        }
        Commands::Text { input, output } => {
            cmd_single(&converter, &input, output.as_deref(), OutputFormat::Text)
        }
        Commands::Json {
            input,
            output,
            compact,
        } => {
            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let converter =
                converter.with_render_options(RenderOptions::new().with_json_format(format));
            cmd_single(&converter, &input, output.as_deref(), OutputFormat::Json)
        }
        Commands::Csv { input, output } => {
            cmd_single(&converter, &input, output.as_deref(), OutputFormat::Csv)
        }
        Commands::Info { input } => cmd_info(&converter, &input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Default output directory: `<stem>_output` next to the working directory.
fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_output", stem))
}

fn output_file_name(format: OutputFormat) -> String {
    format!("extract.{}", format.extension())
}

fn cmd_convert(converter: &Converter, input: &Path, output: Option<&Path>) -> CliResult {
    let output_dir = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_dir(input));
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(OutputFormat::ALL.len() as u64 + 1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Parsing...");
    let doc = converter.parse_file(input)?;
    pb.inc(1);

    let converter = converter
        .clone()
        .with_render_options(RenderOptions::new().with_frontmatter(true));

    let mut written = Vec::new();
    for format in OutputFormat::ALL {
        pb.set_message(format!("Generating {}...", format));
        let content = converter.render(&doc, format)?;
        let name = output_file_name(format);
        fs::write(output_dir.join(&name), &content)?;
        log::debug!("Wrote {} ({} bytes)", name, content.len());
        written.push(name);
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    println!("\n{} {}", "Output files in".green().bold(), output_dir.display());
    for (i, name) in written.iter().enumerate() {
        let branch = if i + 1 == written.len() { "└─" } else { "├─" };
        println!("  {} {}", branch.dimmed(), name);
    }

    Ok(())
}

fn cmd_single(
    converter: &Converter,
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> CliResult {
    let result = converter.convert_file(input, format)?;

    for warning in &result.warnings {
        eprintln!("{}: {}", "Warning".yellow().bold(), warning);
    }

    if let Some(path) = output {
        fs::write(path, &result.content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", result.content);
    }

    Ok(())
}

fn cmd_info(converter: &Converter, input: &Path) -> CliResult {
    let doc = converter.parse_file(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), doc.file_type());
    for (key, value) in doc.metadata() {
        println!("{}: {}", key.bold(), value);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    println!(
        "{}: {}",
        format!("{}s", capitalize(doc.file_type().unit_name())).bold(),
        doc.unit_count()
    );
    println!("{}: {}", "Tables".bold(), doc.tables().len());
    println!("{}: {}", "Images".bold(), doc.images().len());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());

    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/data/budget.xlsx")),
            PathBuf::from("budget_output")
        );
    }

    #[test]
    fn test_output_file_names() {
        let names: Vec<String> = OutputFormat::ALL.iter().map(|f| output_file_name(*f)).collect();
        assert_eq!(
            names,
            vec!["extract.json", "extract.md", "extract.csv", "extract.txt"]
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("slides"), "Slides");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_info_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain text").unwrap();
        assert!(cmd_info(&Converter::new(), &path).is_err());
    }

    #[test]
    fn test_cli_parses_global_limit() {
        let cli = Cli::try_parse_from(["unfile", "csv", "book.xlsx", "--max-size-mb", "5"]).unwrap();
        assert_eq!(cli.max_size_mb, 5);
        assert!(matches!(cli.command, Commands::Csv { .. }));
    }
}
