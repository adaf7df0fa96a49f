//! One-shot prompt-to-card client.
//!
//! Submits a prompt to the job backend, polls until it finishes, and prints
//! one line per card. The base URL comes from `--base-url`, then the
//! `CARDCAST_URL` environment variable, then `http://127.0.0.1:8000`.
//!
//! # Examples
//!
//! ```sh
//! # Generate cards and save their images
//! cardcast --prompt "fire dragon" --save-dir ./cards
//!
//! # Show what the autocomplete would offer
//! cardcast --complete pik
//! ```

use std::path::PathBuf;
use std::time::Duration;

use cardcast::prelude::*;
use cardcast::{cards, log_prompt, logging, normalize_prompt};
use clap::Parser;
use tracing::info;

/// One-shot prompt-to-card client.
#[derive(Parser)]
#[command(name = "cardcast", version)]
struct Cli {
    /// Prompt to generate cards for.
    #[arg(long, conflicts_with = "complete")]
    prompt: Option<String>,

    /// Print autocomplete suggestions for this input and exit.
    #[arg(long)]
    complete: Option<String>,

    /// Backend base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Suggestion corpus file, one entry per line. Defaults to the built-in list.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Directory to write decoded card images into.
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Status poll interval in milliseconds.
    #[arg(long, default_value_t = 2000)]
    poll_ms: u64,

    /// Delay between completion and showing results, in milliseconds.
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    logging::init_stderr(cli.verbose);

    let corpus = match &cli.corpus {
        Some(path) => Corpus::from_file(path)?,
        None => Corpus::builtin(),
    };

    if let Some(input) = &cli.complete {
        let mut autocomplete = Autocomplete::new(corpus);
        autocomplete.on_input_changed(input);
        for suggestion in autocomplete.suggestions() {
            println!("{}", suggestion.markup());
        }
        return Ok(());
    }

    let Some(prompt) = cli.prompt.clone() else {
        return Err("nothing to do: pass --prompt or --complete (see --help)".into());
    };

    let client = ClientConfig::default()
        .with_base_url(ClientConfig::resolve_base_url(cli.base_url.clone()))
        .with_request_timeout(Duration::from_secs(cli.timeout_secs));
    let service = HttpJobService::new(client).map_err(|e| e.to_string())?;
    info!("Backend: {}", service.base_url());

    let config = JobConfig::default()
        .with_poll_interval(Duration::from_millis(cli.poll_ms))
        .with_settle_delay(Duration::from_millis(cli.settle_ms));
    let mut session = Session::new(service, corpus, config);

    session.on_input_changed(prompt);
    info!(
        "Submitting '{}' (cache key '{}')",
        log_prompt(session.input()),
        normalize_prompt(session.input())
    );
    session.submit().map_err(|e| e.to_string())?;

    while !session.job().state.is_terminal() {
        if !session.pump().await && session.controller().is_polling() {
            eprint!(".");
        }
    }
    eprintln!();

    let job = session.job();
    if let Some(err) = &job.error {
        return Err(err.to_string());
    }

    if job.results.is_empty() {
        println!("No cards returned.");
    }
    for card in &job.results {
        println!("{}  ({} bytes)", card.summary(), card.image_size_hint());
    }

    if let Some(dir) = &cli.save_dir {
        let paths = cards::save_images_now(dir, &job.results)?;
        for path in paths {
            println!("saved {}", path.display());
        }
    }
    Ok(())
}
