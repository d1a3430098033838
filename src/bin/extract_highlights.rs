//! CLI tool for extracting highlighted lines and comments from a PDF.
//!
//! The default mode associates yellow / light-blue highlights with
//! enumerated comments; `--grouped` switches to the palette pipeline,
//! which merges adjacent same-color highlights into logical spans.

use clap::{Parser, ValueEnum};
use pdf_markup::{
    extract_highlight_groups, extract_highlighted_lines, output, HighlightOptions, PdfError,
};
use std::path::PathBuf;
use std::process;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "extract-highlights")]
#[command(about = "Extract highlighted lines/comments from a PDF")]
struct Cli {
    /// Path to PDF file
    pdf: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Merge adjacent same-color highlights into grouped spans instead
    /// of associating them with enumerated comments
    #[arg(long)]
    grouped: bool,

    /// Highlight colors to include: yellow, light-blue
    #[arg(long, num_args = 1.., default_values_t = [String::from("yellow"), String::from("light-blue")])]
    colors: Vec<String>,

    /// RGB distance threshold for yellow
    #[arg(long, default_value_t = 0.35)]
    yellow_threshold: f32,

    /// RGB distance threshold for light blue
    #[arg(long, default_value_t = 0.35)]
    light_blue_threshold: f32,
}

fn run(cli: &Cli) -> Result<String, PdfError> {
    if cli.grouped {
        let records = extract_highlight_groups(&cli.pdf)?;
        return match cli.format {
            Format::Json => output::to_json(&records),
            Format::Text => Ok(output::render_groups_text(&records)),
        };
    }

    let options = HighlightOptions {
        colors: cli.colors.clone(),
        yellow_threshold: cli.yellow_threshold,
        light_blue_threshold: cli.light_blue_threshold,
    };
    let records = extract_highlighted_lines(&cli.pdf, &options)?;
    match cli.format {
        Format::Json => output::to_json(&records),
        Format::Text => Ok(output::render_highlights_text(&records)),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(rendered) => {
            if matches!(cli.format, Format::Json) {
                println!("{}", rendered);
            } else {
                print!("{}", rendered);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
