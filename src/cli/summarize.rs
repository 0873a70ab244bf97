//! CLI entry-point for summarizing a note file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{config::Settings, nlp::NoteAnalyzer};

/// Args for the `summarize` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Plain-text clinical note.
    #[arg(long)]
    pub file: PathBuf,
    /// Override the number of summary sentences.
    #[arg(long)]
    pub sentences: Option<usize>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let mut analyzer = NoteAnalyzer::load(&settings).await?;
    if let Some(sentences) = args.sentences.filter(|n| *n > 0) {
        analyzer = analyzer.with_summary_sentences(sentences);
    }
    let analysis = tokio::task::spawn_blocking(move || analyzer.analyze(&text)).await?;
    info!(summary_chars = analysis.summary.len(), "summarized note");
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
