use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bookhooks::backend::CliBackend;
use bookhooks::models::BookInfo;
use bookhooks::segment::{self, markup};
use bookhooks::{Annotator, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "bookhooks")]
#[command(about = "Generate cached teasers and summaries for book chapters")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the segment groups of a chapter without calling the backend
    Segment {
        #[arg(long)]
        file: PathBuf,
    },
    /// Print a teaser for every segment of a chapter as a JSON object
    Annotate {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        author: String,
    },
    /// Print a summary of the book from its first chapter
    Summary(ArtifactArgs),
    /// Print a one-sentence hook for a chapter
    Prehook(ArtifactArgs),
    /// Print a closing reflection for a chapter
    Conclusion(ArtifactArgs),
}

#[derive(Args, Debug)]
struct ArtifactArgs {
    #[arg(long)]
    book_id: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    author: String,
    #[arg(long)]
    file: PathBuf,
    #[arg(long, default_value = "")]
    book_summary: String,
}

impl ArtifactArgs {
    fn book(&self) -> BookInfo {
        BookInfo {
            id: self.book_id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let cache = config.artifact_cache();
    let backend = Arc::new(CliBackend::new(config.backend.executable.clone()));
    let annotator = Annotator::new(config.clone(), cache, backend);

    match cli.command {
        Command::Segment { file } => {
            let content = read_chapter(&file).await?;
            let groups = segment::split(
                &content,
                config.segments.min_group_chars,
                config.segments.max_groups,
            );
            for group in groups {
                println!(
                    "{}",
                    serde_json::json!({
                        "index": group.index,
                        "clean_len": group.clean_len,
                        "paragraphs": group.paragraph_count,
                        "raw_bytes": group.raw.len(),
                    })
                );
            }
        }
        Command::Annotate {
            file,
            title,
            author,
        } => {
            let content = read_chapter(&file).await?;
            let book = BookInfo {
                id: String::new(),
                title,
                author,
            };
            let annotations = annotator.segment_annotations(&content, &book).await;
            println!("{}", serde_json::to_string_pretty(&annotations)?);
        }
        Command::Summary(args) => {
            let text = chapter_text(&args.file, &config).await?;
            println!("{}", annotator.book_summary(&args.book(), &text).await);
        }
        Command::Prehook(args) => {
            let text = chapter_text(&args.file, &config).await?;
            println!(
                "{}",
                annotator
                    .chapter_prehook(&args.book(), &text, &args.book_summary)
                    .await
            );
        }
        Command::Conclusion(args) => {
            let text = chapter_text(&args.file, &config).await?;
            println!(
                "{}",
                annotator
                    .chapter_conclusion(&args.book(), &text, &args.book_summary)
                    .await
            );
        }
    }

    Ok(())
}

async fn read_chapter(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed reading chapter file: {}", path.display()))
}

/// Clean chapter text, empty when too short to generate from.
async fn chapter_text(path: &Path, config: &AppConfig) -> Result<String> {
    let content = read_chapter(path).await?;
    Ok(markup::extract_text_content(
        &content,
        config.segments.chapter_min_chars,
    ))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
