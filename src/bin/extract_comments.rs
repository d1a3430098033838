//! CLI tool for extracting PDF comments with their referenced text.

use clap::{Parser, ValueEnum};
use pdf_markup::{extract_comments, output};
use std::path::PathBuf;
use std::process;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "extract-comments")]
#[command(about = "Extract comments from a PDF and return referenced text")]
struct Cli {
    /// Path to PDF file
    pdf: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let records = match extract_comments(&cli.pdf) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match cli.format {
        Format::Json => match output::to_json(&records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Format::Text => print!("{}", output::render_comments_text(&records)),
    }
}
