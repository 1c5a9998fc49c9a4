//! Terminal client for the teacher guide generator.

mod editor;
mod export;
mod input;
mod remote;
mod status;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use editor::{edit_document, Document};
use guide_core::status::{EXPORT_MESSAGES, GENERATION_MESSAGES, STATUS_INTERVAL};
use guide_core::{GuideResponse, StatusRotator, Variant};
use input::InputAcquisition;
use remote::{GuideClient, DEFAULT_SERVER_URL};
use status::StatusIndicator;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Generate teacher guides from PowerPoint decks, edit them, and export
/// them as text or PDF.
#[derive(Parser, Debug)]
#[command(name = "guide-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Guide server base URL
    #[arg(long, global = true, env = "GUIDE_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the sample guide
    Demo(FetchArgs),

    /// Upload a deck and generate a guide (several paths: the first is used)
    Generate {
        /// The .pptx file; extra paths are treated as a multi-file drop
        files: Vec<PathBuf>,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Print a saved document as plain text
    Show {
        document: PathBuf,
    },

    /// Set a field of a saved document
    Set {
        document: PathBuf,

        /// Field name (title, overview, objectives, preparation, initiate,
        /// learn, make, share, glossary, bonus_activities; or html)
        field: String,

        /// New value; `-` reads it from stdin
        value: String,
    },

    /// Open a saved document in $VISUAL / $EDITOR
    Edit {
        document: PathBuf,
    },

    /// Write the document as a .txt file
    ExportTxt(ExportArgs),

    /// Render the document to PDF on the server
    ExportPdf(ExportArgs),
}

#[derive(ClapArgs, Debug)]
struct FetchArgs {
    /// Ask for separate fields instead of one HTML document
    #[arg(long)]
    structured: bool,

    /// Where to save the document (default: <file_name>.json/.html in the
    /// current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl FetchArgs {
    fn variant(&self) -> Variant {
        if self.structured {
            Variant::Structured
        } else {
            Variant::Html
        }
    }
}

#[derive(ClapArgs, Debug)]
struct ExportArgs {
    document: PathBuf,

    /// Output directory (default: current directory)
    #[arg(short = 'd', long)]
    dir: Option<PathBuf>,
}

impl ExportArgs {
    fn out_dir(&self) -> Result<PathBuf> {
        let dir = self.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(dir)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let client = GuideClient::new(&args.server)?;

    match &args.command {
        Command::Demo(fetch) => {
            let response = client.demo(fetch.variant()).await?;
            save_response(response, fetch.output.as_deref())?;
        }
        Command::Generate { files, fetch } => {
            let mut input = InputAcquisition::new();
            if files.len() == 1 {
                input.pick(&files[0])?;
            } else {
                input.drop_files(files)?;
            }
            eprintln!("File: {}", input.display_name());

            let response = {
                let _status = StatusIndicator::terminal(
                    StatusRotator::new(GENERATION_MESSAGES.iter().copied()),
                    STATUS_INTERVAL,
                );
                client.upload(input.selected(), fetch.variant()).await?
            };
            save_response(response, fetch.output.as_deref())?;
        }
        Command::Show { document } => {
            let doc = Document::load(document)?;
            print!("{}", export::text_export(&doc).1);
        }
        Command::Set {
            document,
            field,
            value,
        } => {
            let value = if value == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read value from stdin")?;
                buf
            } else {
                value.clone()
            };
            let mut doc = Document::load(document)?;
            doc.set_field(field, &value)?;
            doc.save(document)?;
            eprintln!("Updated {} in {}", field, document.display());
        }
        Command::Edit { document } => {
            let doc = edit_document(document)?;
            eprintln!("Saved {}", doc.title());
        }
        Command::ExportTxt(export_args) => {
            let doc = Document::load(&export_args.document)?;
            let path = export::write_text(&doc, &export_args.out_dir()?)?;
            eprintln!("Written to: {}", path.display());
        }
        Command::ExportPdf(export_args) => {
            let doc = Document::load(&export_args.document)?;
            let dir = export_args.out_dir()?;
            let path = {
                let _status = StatusIndicator::terminal(
                    StatusRotator::new(EXPORT_MESSAGES.iter().copied()),
                    STATUS_INTERVAL,
                );
                export::write_pdf(&client, &doc, &dir).await?
            };
            eprintln!("Written to: {}", path.display());
        }
    }

    Ok(())
}

/// Load a response into a document and save it.
fn save_response(response: GuideResponse, output: Option<&Path>) -> Result<()> {
    let doc = Document::from_response(response);
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => doc.default_path(Path::new(".")),
    };
    doc.save(&path)?;
    eprintln!("Saved \"{}\" to {}", doc.title(), path.display());
    Ok(())
}
