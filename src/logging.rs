use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const CONSOLE_FILTER: &str = "info,wiki_request=info,model_inference=warn,summarize=info";
const FILE_FILTER: &str = "info,model_inference=debug,summarize=debug";

pub fn configure_logging() {
    // readability's html5ever backend is noisy about malformed markup
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() == &Level::WARN && metadata.target() == "html5ever::serialize")
    });

    // RUST_LOG overrides the console filter, the log file keeps its defaults
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_FILTER));
    let console_log = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(console_filter)
        .with_filter(custom_filter);

    let file_appender = rolling::daily("logs", "wikibrief.log");
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(console_log)
        .with(file_log)
        .init();
}
