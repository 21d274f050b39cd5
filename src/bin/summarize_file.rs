use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use wikibrief::logging::configure_logging;
use wikibrief::model::{load_summarizer, ModelConfig};
use wikibrief::summarize::summarize_in_background;
use wikibrief::wiki::{collapse_newlines, default_target_words};
use wikibrief::{describe_failure, word_count, ReductionStrategy, SummarizerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Summarize a local text file", long_about = None)]
struct Args {
    /// Plain text file to summarize
    #[arg(short = 'f', long)]
    file: String,

    /// Summary length in words (default depends on text length)
    #[arg(short = 'w', long)]
    target_words: Option<usize>,

    /// trim or recursive
    #[arg(short = 's', long)]
    strategy: Option<ReductionStrategy>,

    #[arg(short = 't', long, default_value_t = 900)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    configure_logging();

    let mut config = SummarizerConfig::from_env();
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    config.validate()?;

    let raw = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file))?;
    let text = collapse_newlines(&raw).trim().to_string();
    let target_words = args
        .target_words
        .unwrap_or_else(|| default_target_words(&text));

    println!(
        "Summarizing {} words from {} to {} words",
        word_count(&text),
        args.file,
        target_words
    );

    let model = load_summarizer(
        ModelConfig::from_env(),
        config.instruction_prefix.clone(),
        config.max_input_tokens,
    )
    .await?;

    match summarize_in_background(
        model,
        Arc::new(config),
        text,
        target_words,
        Duration::from_secs(args.timeout_secs),
    )
    .await
    {
        Ok(summary) => {
            println!("\n{}", summary);
            println!("\n({} words)", word_count(&summary));
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", describe_failure(&e));
            std::process::exit(1);
        }
    }
}
