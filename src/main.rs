//! book-chunker CLI application
//!
//! Command-line interface for the book-chunker library.

use anyhow::{Context, bail};
use book_chunker::classify::Verdict;
use book_chunker::config::{ExclusionPolicyKind, MergePolicyKind};
use book_chunker::document::MemoryDocument;
use book_chunker::storage::BookRecord;
use book_chunker::utils::{
    book_id_from_path, format_file_size, get_file_extension, is_supported_document,
    normalize_path,
};
use book_chunker::{
    ArtifactStore, BookChunker, ChunkReport, Config, Database, DocumentSource, NoArtifacts,
    PageRangePdfWriter, PdfDocument,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "book-chunker")]
#[command(about = "Structure-aware chunking of books along their table of contents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a document and write the chunk report
    Chunk {
        /// Input document (.pdf, or .txt with form-feed page breaks)
        input: PathBuf,

        /// Output directory for the report and page-range PDFs
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Book identifier (defaults to the input file stem)
        #[arg(short, long)]
        book_id: Option<String>,

        /// Skip writing per-chunk PDFs
        #[arg(long)]
        no_mini_pdfs: bool,

        /// Record the chunks in this SQLite index
        #[arg(short, long)]
        index: Option<PathBuf>,

        /// Number of materialization workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Show a progress bar while materializing
        #[arg(long)]
        progress: bool,

        #[command(flatten)]
        options: ChunkingArgs,
    },

    /// Print the resolved outline with each section's verdict
    Outline {
        /// Input document
        input: PathBuf,

        #[command(flatten)]
        options: ChunkingArgs,
    },

    /// List books or chunks stored in an index
    Show {
        /// Index file (SQLite database)
        #[arg(short, long)]
        index: PathBuf,

        /// Book to list chunks for; lists books when omitted
        #[arg(short, long)]
        book_id: Option<String>,
    },
}

/// Options shared by commands that run the chunking pipeline
#[derive(Args, Clone, Default)]
struct ChunkingArgs {
    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Outline for text input (JSON list of {depth, title, page})
    #[arg(long)]
    outline: Option<PathBuf>,

    #[arg(long)]
    min_pages: Option<u32>,

    #[arg(long)]
    max_pages: Option<u32>,

    #[arg(long)]
    min_tokens: Option<usize>,

    #[arg(long)]
    max_tokens: Option<usize>,

    /// Keep front and back matter
    #[arg(long)]
    no_exclude: bool,

    /// Additional exclusion pattern (repeatable)
    #[arg(long = "exclude-pattern")]
    exclude_patterns: Vec<String>,

    #[arg(long, value_enum)]
    merge_policy: Option<MergeArg>,

    #[arg(long, value_enum)]
    exclusion_policy: Option<ExclusionArg>,

    /// HuggingFace tokenizer.json for exact token counts
    #[arg(long)]
    tokenizer: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MergeArg {
    GrowingRun,
    Pairwise,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExclusionArg {
    ContentSniff,
    MainContentWindow,
}

impl ChunkingArgs {
    /// Load the configuration file, if any, and apply command-line overrides
    fn to_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        let chunking = &mut config.chunking;
        if let Some(value) = self.min_pages {
            chunking.min_pages = value;
        }
        if let Some(value) = self.max_pages {
            chunking.max_pages = value;
        }
        if let Some(value) = self.min_tokens {
            chunking.min_tokens = value;
        }
        if let Some(value) = self.max_tokens {
            chunking.max_tokens = value;
        }
        if let Some(policy) = self.merge_policy {
            chunking.merge_policy = match policy {
                MergeArg::GrowingRun => MergePolicyKind::GrowingRun,
                MergeArg::Pairwise => MergePolicyKind::Pairwise,
            };
        }

        let exclusion = &mut config.exclusion;
        if self.no_exclude {
            exclusion.exclude_sections = false;
        }
        exclusion
            .custom_exclude_patterns
            .extend(self.exclude_patterns.iter().cloned());
        if let Some(policy) = self.exclusion_policy {
            exclusion.policy = match policy {
                ExclusionArg::ContentSniff => ExclusionPolicyKind::ContentSniff,
                ExclusionArg::MainContentWindow => ExclusionPolicyKind::MainContentWindow,
            };
        }

        if let Some(path) = &self.tokenizer {
            config.tokenizer.tokenizer_path = Some(path.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// A document opened from disk
enum LoadedDocument {
    Pdf(PdfDocument),
    Text(MemoryDocument),
}

impl LoadedDocument {
    fn open(input: &Path, outline: Option<&Path>) -> anyhow::Result<Self> {
        let input = normalize_path(input)?;
        if !is_supported_document(&input) {
            bail!("Unsupported document type: {}", input.display());
        }

        if get_file_extension(&input).as_deref() == Some("pdf") {
            if outline.is_some() {
                bail!("--outline applies to text input only; PDFs carry their own outline");
            }
            return Ok(Self::Pdf(PdfDocument::open(&input)?));
        }

        let mut document = MemoryDocument::from_text_file(&input)?;
        if let Some(path) = outline {
            document = document
                .with_outline_file(path)
                .with_context(|| format!("Failed to load outline {}", path.display()))?;
        }
        Ok(Self::Text(document))
    }

    fn source(&self) -> &dyn DocumentSource {
        match self {
            Self::Pdf(pdf) => pdf,
            Self::Text(text) => text,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunk {
            input,
            output_dir,
            book_id,
            no_mini_pdfs,
            index,
            workers,
            progress,
            options,
        } => {
            let mut config = options.to_config()?;
            if let Some(dir) = output_dir {
                config.output.output_dir = dir;
            }
            if no_mini_pdfs {
                config.output.save_artifacts = false;
            }
            if let Some(workers) = workers {
                config.output.workers = workers;
            }
            config.output.show_progress |= progress;
            let book_id = book_id.unwrap_or_else(|| book_id_from_path(&input));
            let outline = options.outline.clone();

            tokio::task::spawn_blocking(move || {
                chunk_command(&input, &book_id, config, outline.as_deref(), index.as_deref())
            })
            .await
            .context("Chunking task panicked")??;
        }
        Commands::Outline { input, options } => {
            tokio::task::spawn_blocking(move || outline_command(&input, &options))
                .await
                .context("Outline task panicked")??;
        }
        Commands::Show { index, book_id } => {
            show_command(&index, book_id.as_deref())?;
        }
    }

    Ok(())
}

fn chunk_command(
    input: &Path,
    book_id: &str,
    config: Config,
    outline: Option<&Path>,
    index: Option<&Path>,
) -> anyhow::Result<()> {
    println!("📚 Chunking {} as '{}'...", input.display(), book_id);

    let document = LoadedDocument::open(input, outline)?;
    let chunker = BookChunker::new(config.clone())?;

    let mut store: Box<dyn ArtifactStore> = match &document {
        LoadedDocument::Pdf(pdf) if config.output.save_artifacts => Box::new(
            PageRangePdfWriter::new(pdf.bytes(), config.output.artifact_dir()),
        ),
        _ => Box::new(NoArtifacts),
    };

    let output = chunker.chunk_document(document.source(), book_id, store.as_mut())?;
    let report = ChunkReport::new(&output, &config, Some(input));
    let report_path = report.save(&config.output.output_dir)?;

    let summary = &output.summary;
    println!("✅ Chunking complete!");
    println!("   📄 Pages: {}", summary.total_pages);
    println!("   🗂️  Outline entries: {}", summary.original_outline_entry_count);
    println!("   🚫 Excluded sections: {}", summary.excluded_section_count);
    println!(
        "   📊 Chunks: {} ({} empty, {} failed)",
        summary.final_chunk_count, summary.empty_chunk_count, summary.failed_chunk_count
    );
    println!(
        "   📏 Average: {:.1} pages, {:.0} tokens",
        summary.average_pages_per_chunk, summary.average_tokens_per_chunk
    );
    println!("   📋 Report: {}", report_path.display());

    for failure in &output.failures {
        eprintln!(
            "❌ Pages {}-{} ('{}'): {}",
            failure.start_page, failure.end_page, failure.title, failure.error
        );
    }

    if let Some(index) = index {
        let mut db = Database::new(index)
            .with_context(|| format!("Failed to open index {}", index.display()))?;
        let record = BookRecord {
            book_id: book_id.to_string(),
            source_file: Some(input.display().to_string()),
            total_pages: summary.total_pages,
            chunk_count: output.chunks.len(),
            processed_at: report.metadata.processing_date.clone(),
            summary: summary.clone(),
        };
        db.replace_book(&record, &output.chunks)?;
        println!("   🗄️  Index: {}", index.display());
    }

    Ok(())
}

fn outline_command(input: &Path, options: &ChunkingArgs) -> anyhow::Result<()> {
    let config = options.to_config()?;
    let document = LoadedDocument::open(input, options.outline.as_deref())?;
    let chunker = BookChunker::new(config)?;
    let plan = chunker.plan(document.source())?;

    println!(
        "🗂️  {} sections over {} pages",
        plan.outline.sections.len(),
        plan.outline.total_pages
    );
    for (section, verdict) in plan.outline.sections.iter().zip(&plan.verdicts) {
        let indent = "  ".repeat(section.depth.saturating_sub(1) as usize);
        let status = match verdict {
            Verdict::Keep => "✅".to_string(),
            Verdict::Exclude(reason) => format!("🚫 {}", reason),
        };
        println!(
            "{}{} [{}-{}] {}",
            indent,
            section.title,
            section.start_page,
            section.end_page_exclusive.saturating_sub(1).max(section.start_page),
            status
        );
    }

    println!();
    println!("📋 {} planned chunks:", plan.plans.len());
    for chunk in &plan.plans {
        println!(
            "   [{}-{}] ~{} tokens  {}",
            chunk.start_page,
            chunk.end_page(),
            chunk.token_estimate,
            chunk.title
        );
    }

    Ok(())
}

fn show_command(index: &Path, book_id: Option<&str>) -> anyhow::Result<()> {
    if !index.exists() {
        bail!("Index file not found: {}", index.display());
    }
    let db = Database::new(index)?;

    match book_id {
        Some(book_id) => {
            let chunks = db.get_chunks_for_book(book_id)?;
            if chunks.is_empty() {
                println!("❌ No chunks stored for '{}'", book_id);
                return Ok(());
            }
            println!("📋 {} chunks for '{}':", chunks.len(), book_id);
            for chunk in chunks {
                println!(
                    "{:>4}. [{}-{}] {} tokens  {}",
                    chunk.index + 1,
                    chunk.start_page,
                    chunk.end_page,
                    chunk.token_count,
                    chunk.breadcrumb
                );
            }
        }
        None => {
            let stats = db.get_stats()?;
            println!(
                "🗄️  {} books, {} chunks ({})",
                stats.book_count,
                stats.chunk_count,
                format_file_size(stats.file_size_bytes as u64)
            );
            for book in db.list_books()? {
                println!(
                    "   {}  {} pages, {} chunks, processed {}",
                    book.book_id, book.total_pages, book.chunk_count, book.processed_at
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_arguments() {
        let cli = Cli::try_parse_from([
            "book-chunker",
            "chunk",
            "book.pdf",
            "--max-pages",
            "10",
            "--exclude-pattern",
            "exercises",
            "--exclude-pattern",
            "solutions",
            "--merge-policy",
            "pairwise",
            "--no-exclude",
        ])
        .unwrap();

        let Commands::Chunk { input, options, .. } = cli.command else {
            panic!("expected chunk command");
        };
        assert_eq!(input, PathBuf::from("book.pdf"));

        let config = options.to_config().unwrap();
        assert_eq!(config.chunking.max_pages, 10);
        assert_eq!(config.chunking.merge_policy, MergePolicyKind::Pairwise);
        assert!(!config.exclusion.exclude_sections);
        assert_eq!(
            config.exclusion.custom_exclude_patterns,
            vec!["exercises", "solutions"]
        );
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let options = ChunkingArgs {
            min_tokens: Some(9000),
            ..ChunkingArgs::default()
        };
        assert!(options.to_config().is_err());
    }

    #[test]
    fn test_outline_file_for_text_input() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("book.txt");
        std::fs::write(&text, "Intro\nwords\x0CMore\nwords").unwrap();
        let outline = dir.path().join("outline.json");
        std::fs::write(
            &outline,
            r#"[{"depth": 1, "title": "Intro", "page": 1}, {"depth": 1, "title": "More", "page": 2}]"#,
        )
        .unwrap();

        let document = LoadedDocument::open(&text, Some(&outline)).unwrap();
        assert_eq!(document.source().total_pages(), 2);
        assert_eq!(document.source().outline().len(), 2);
    }

    #[test]
    fn test_unsupported_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.md");
        std::fs::write(&notes, "# Notes").unwrap();

        let err = LoadedDocument::open(&notes, None).err().unwrap();
        assert!(err.to_string().contains("Unsupported document type"));
    }
}
