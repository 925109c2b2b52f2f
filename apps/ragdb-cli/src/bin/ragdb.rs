//! ragdb command line.
//!
//! Usage:
//!   ragdb ingest notes/lease.txt             # chunk, embed and index a document
//!   ragdb ask lease.txt "when is rent due?"  # context and prompt for one document
//!   ragdb files                              # documents ingested so far
//!   ragdb search legal "consumer protection" # rank a domain corpus

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ragdb_core::config::{Config, Settings};
use ragdb_core::traits::{Embedder, VectorIndex};
use ragdb_corpus::{build_domain_prompt, load_corpus_async, rank, Domain};
use ragdb_embed::get_default_embedder;
use ragdb_upload::{build_document_prompt, KnownFiles, PromptMode, QueryRouter, UploadIndexer};
use ragdb_vector::LanceIndex;

#[derive(Parser)]
#[command(name = "ragdb", version, about = "Document ingestion and retrieval for legal and finance assistants")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and index plain-text documents
    Ingest {
        files: Vec<PathBuf>,
        /// Name to index under (single file only; defaults to the file name)
        #[arg(long)]
        source_name: Option<String>,
    },
    /// Retrieve context for a question about one ingested document
    Ask {
        file_name: String,
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
        /// Strict legal-assistant prompt
        #[arg(long)]
        legal: bool,
        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// List ingested documents
    Files,
    /// Rank a domain knowledge corpus and print the generation prompt
    Search {
        domain: Domain,
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "ragdb=debug" } else { "ragdb=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let cwd = std::env::current_dir()?;
    let settings = Config::load()
        .and_then(|c| c.settings())
        .context("loading configuration")?
        .resolve_paths(&cwd);

    match cli.command {
        Command::Ingest { files, source_name } => ingest(&settings, files, source_name).await,
        Command::Ask { file_name, question, top_k, legal, json } => {
            let (embedder, index) = collaborators(&settings).await?;
            let router = QueryRouter::new(embedder, index);
            let answer = router
                .answer_from_document(&file_name, &question, top_k.unwrap_or(settings.uploads.top_k))
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
                return Ok(());
            }
            println!("{}\n", answer.context_block);
            for m in &answer.matches {
                println!("  [{}#{}] similarity {:.3}", m.source_name, m.chunk_index, m.similarity);
            }
            let mode = if legal { PromptMode::Legal } else { PromptMode::General };
            println!("\n--- prompt ---\n{}", build_document_prompt(&answer, &question, mode));
            Ok(())
        }
        Command::Files => {
            let registry = KnownFiles::new(&settings.uploads.registry_path);
            for name in registry.list().await? {
                println!("{name}");
            }
            Ok(())
        }
        Command::Search { domain, query, top_k } => {
            let dir = domain.corpus_dir(&settings.corpus).to_path_buf();
            let corpus = load_corpus_async(dir).await;
            let ranked = rank(&corpus, &query, top_k.unwrap_or(settings.corpus.top_k));
            info!(corpus = corpus.len(), ranked = ranked.len(), "search complete");
            print!("{}", build_domain_prompt(domain, &query, &ranked));
            Ok(())
        }
    }
}

async fn collaborators(settings: &Settings) -> Result<(Arc<dyn Embedder>, Arc<dyn VectorIndex>)> {
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let index = LanceIndex::open(&settings.index.uri.to_string_lossy(), &settings.index.table, settings.embedding.dim)
        .await
        .with_context(|| format!("opening index at {}", settings.index.uri.display()))?;
    Ok((embedder, Arc::new(index)))
}

async fn ingest(settings: &Settings, files: Vec<PathBuf>, source_name: Option<String>) -> Result<()> {
    if files.is_empty() {
        bail!("no files given");
    }
    if source_name.is_some() && files.len() > 1 {
        bail!("--source-name only applies to a single file");
    }
    let (embedder, index) = collaborators(settings).await?;
    let registry = Arc::new(KnownFiles::new(&settings.uploads.registry_path));
    let indexer = UploadIndexer::from_settings(embedder, index, registry, settings.chunking, &settings.uploads)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );
    let mut total_chunks = 0usize;
    for path in &files {
        let name = match &source_name {
            Some(n) => n.clone(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("{} has no file name", path.display()))?,
        };
        pb.set_message(name.clone());
        let text = tokio::fs::read_to_string(path).await.with_context(|| format!("reading {}", path.display()))?;
        let result = indexer.ingest(&name, &text).await.with_context(|| format!("ingesting {name}"))?;
        pb.println(format!("{name}: {} chunks", result.chunk_count));
        total_chunks += result.chunk_count;
        pb.inc(1);
    }
    pb.finish_with_message("done");
    info!(files = files.len(), chunks = total_chunks, "ingest complete");
    Ok(())
}
