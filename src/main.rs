use clap::Parser;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use wikibrief::logging::configure_logging;
use wikibrief::model::{load_summarizer, ModelConfig};
use wikibrief::summarize::summarize_in_background;
use wikibrief::wiki::{
    fetch_article, summarization_input, truncate_at_nearest_period, truncate_chars,
    DEFAULT_MAX_INPUT_CHARS, DISPLAY_LIMIT,
};
use wikibrief::{describe_failure, word_count, ReductionStrategy, SummarizerConfig};

const PREVIEW_CHARS: usize = 500;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch a Wikipedia article and summarize it", long_about = None)]
struct Args {
    /// Topic to look up, or the URL of any article
    topic: String,

    /// Characters of the article handed to the summarizer
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_INPUT_CHARS)]
    max_input_chars: usize,

    /// Summary length in words (default depends on article length)
    #[arg(short = 'w', long)]
    target_words: Option<usize>,

    /// How an over-long combined summary is shortened: trim or recursive
    #[arg(short = 's', long)]
    strategy: Option<ReductionStrategy>,

    /// Give up on summarization after this many seconds
    #[arg(short = 't', long, default_value_t = 900)]
    timeout_secs: u64,

    /// Print the fetched article before the summary
    #[arg(long)]
    show_content: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    configure_logging();

    let mut config = SummarizerConfig::from_env();
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    config.validate()?;

    let article = match fetch_article(&args.topic).await {
        Ok(article) => article,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    println!("\n{}", article.title);
    println!("{}", article.source);
    println!(
        "{} characters, {} words",
        article.char_count(),
        article.word_count()
    );

    if args.show_content {
        println!("\n{}", truncate_at_nearest_period(&article.text, DISPLAY_LIMIT));
    } else {
        println!("\n{}...", truncate_chars(&article.text, PREVIEW_CHARS));
    }

    let (input, target_words) =
        summarization_input(&article.text, args.max_input_chars, args.target_words);
    let input = input.to_string();
    info!(
        "Summarizing {} of {} characters to {} words",
        input.chars().count(),
        article.char_count(),
        target_words
    );

    let model = load_summarizer(
        ModelConfig::from_env(),
        config.instruction_prefix.clone(),
        config.max_input_tokens,
    )
    .await?;

    let result = summarize_in_background(
        model,
        Arc::new(config),
        input,
        target_words,
        Duration::from_secs(args.timeout_secs),
    )
    .await;

    match result {
        Ok(summary) => {
            println!("\nSummary ({} words):\n", word_count(&summary));
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            error!("Summarization of '{}' failed: {:#}", article.title, e);
            eprintln!("Error: {}", describe_failure(&e));
            process::exit(1);
        }
    }
}
