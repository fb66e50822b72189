use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};
use walkdir::WalkDir;

use ragkit_chunk::{
    AutoChunker, BoundaryChunker, BoundaryChunkerConfig, BoundaryMarker, Chunker, HybridChunker, RecursiveChunker,
    SemanticChunker,
};
use ragkit_core::config::{Config, FusionKind, Settings};
use ragkit_core::Document;
use ragkit_embed::get_default_embedder;
use ragkit_hybrid::HybridRetriever;

/// Chunk documents and run hybrid lexical + vector retrieval over them.
#[derive(Parser, Debug)]
#[command(name = "ragkit", version, about)]
struct Cli {
    /// TOML file layered over the defaults. Without it, config.toml and APP_* env vars are used.
    #[arg(long, env = "RAGKIT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk one file and print the chunks as JSON lines.
    Chunk {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Strategy::Recursive)]
        strategy: Strategy,
    },
    /// Chunk every matching file under a directory and search it.
    Search {
        dir: PathBuf,
        query: String,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// Fusion method: weighted or rrf. Defaults to fusion.method.
        #[arg(long)]
        method: Option<String>,
        #[arg(long)]
        rerank: bool,
        #[arg(long, value_enum, default_value_t = Strategy::Recursive)]
        strategy: Strategy,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    Recursive,
    Semantic,
    Hybrid,
    /// Recursive, hybrid or semantic, chosen per file from sentence similarity.
    Auto,
    Slides,
    Emails,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_path(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    let mut settings = config.settings()?;

    match cli.command {
        Command::Chunk { file, strategy } => run_chunk(&settings, &file, strategy),
        Command::Search { dir, query, top_k, method, rerank, strategy } => {
            if let Some(method) = method {
                settings.fusion.method = method.parse::<FusionKind>()?;
            }
            settings.rerank.enabled |= rerank;
            run_search(&settings, &dir, &query, top_k, strategy)
        }
    }
}

fn build_chunker(settings: &Settings, strategy: Strategy) -> Result<Box<dyn Chunker>> {
    let chunker: Box<dyn Chunker> = match strategy {
        Strategy::Recursive => Box::new(RecursiveChunker::new(settings.chunking.clone())?),
        Strategy::Semantic => Box::new(SemanticChunker::new(
            settings.chunking.clone(),
            settings.semantic.clone(),
            get_default_embedder(settings.data.embedding_dim)?,
        )?),
        Strategy::Hybrid => Box::new(HybridChunker::new(
            settings.chunking.clone(),
            settings.semantic.clone(),
            get_default_embedder(settings.data.embedding_dim)?,
        )?),
        Strategy::Auto => Box::new(AutoChunker::new(
            settings.chunking.clone(),
            settings.semantic.clone(),
            get_default_embedder(settings.data.embedding_dim)?,
        )?),
        Strategy::Slides => Box::new(BoundaryChunker::new(BoundaryChunkerConfig::from_settings(
            &settings.boundary,
            BoundaryMarker::slide(),
        ))?),
        Strategy::Emails => Box::new(BoundaryChunker::new(BoundaryChunkerConfig::from_settings(
            &settings.boundary,
            BoundaryMarker::email(),
        ))?),
    };
    Ok(chunker)
}

fn load_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut document = Document::new(path.display().to_string(), content);
    document.metadata.insert("path".into(), serde_json::Value::from(path.display().to_string()));
    Ok(document)
}

fn run_chunk(settings: &Settings, file: &Path, strategy: Strategy) -> Result<()> {
    let chunker = build_chunker(settings, strategy)?;
    let document = load_document(file)?;
    let chunks = chunker.chunk_document(&document)?;
    for chunk in &chunks {
        println!("{}", serde_json::to_string(chunk)?);
    }
    info!(file = %file.display(), chunks = chunks.len(), chunker = chunker.name(), "chunked");
    Ok(())
}

fn list_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        })
        .collect();
    files.sort();
    files
}

fn run_search(settings: &Settings, dir: &Path, query: &str, top_k: usize, strategy: Strategy) -> Result<()> {
    let files = list_files(dir, &settings.data.extensions);
    if files.is_empty() {
        println!("No {} files under {}", settings.data.extensions.join("/"), dir.display());
        return Ok(());
    }

    let chunker = build_chunker(settings, strategy)?;
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .context("progress bar template")?
            .progress_chars("#>-"),
    );

    let mut chunks = Vec::new();
    for path in &files {
        pb.set_message(path.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_string());
        let document = load_document(path)?;
        chunks.extend(chunker.chunk_document(&document)?);
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} chunks", chunks.len()));
    debug!(files = files.len(), chunks = chunks.len(), "corpus chunked");

    let embedder = get_default_embedder(settings.data.embedding_dim)?;
    let retriever = HybridRetriever::from_settings(settings, embedder)?;
    println!("\n🔍 \"{query}\" ({} fusion, {} chunks)", settings.fusion.method, chunks.len());

    if settings.rerank.enabled {
        let results = retriever.retrieve_reranked(query, &chunks, top_k, None)?;
        for r in &results {
            print_hit(r.rank, r.rerank_score, &r.chunk);
        }
        if results.is_empty() {
            println!("No results.");
        }
    } else {
        let results = retriever.retrieve_fused(query, &chunks, top_k, None)?;
        for r in &results {
            print_hit(r.rank, r.score, &r.chunk);
        }
        if results.is_empty() {
            println!("No results.");
        }
    }
    Ok(())
}

fn print_hit(rank: usize, score: f32, chunk: &ragkit_core::Chunk) {
    let source = chunk.metadata.get("path").and_then(|v| v.as_str()).unwrap_or("?");
    let preview: String = chunk.content.chars().take(160).collect::<String>().replace('\n', " ");
    println!("{rank:>2}. [{score:.4}] {source}");
    println!("    {preview}");
}
