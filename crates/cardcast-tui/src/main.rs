//! Interactive prompt-to-card terminal client.
//!
//! ```sh
//! cardcast-tui --base-url http://127.0.0.1:8000 --save-dir ./cards
//! ```

use std::path::PathBuf;
use std::time::Duration;

use cardcast::prelude::*;
use cardcast_tui::{TuiConfig, run_tui};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Interactive prompt-to-card terminal client.
#[derive(Parser)]
#[command(name = "cardcast-tui", version)]
struct Cli {
    /// Backend base URL. Falls back to `CARDCAST_URL`, then the local default.
    #[arg(long)]
    base_url: Option<String>,

    /// Suggestion corpus file, one entry per line.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Where Ctrl+S saves card images.
    #[arg(long, default_value = "cards")]
    save_dir: PathBuf,

    /// Status poll interval in milliseconds.
    #[arg(long, default_value_t = 2000)]
    poll_ms: u64,

    /// Delay between completion and showing results, in milliseconds.
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();

    // Tracing goes to the log pane, never to the terminal directly.
    let (tracing_layer, log_buffer) = UiTracingLayer::new();
    tracing_subscriber::registry().with(tracing_layer).init();

    let corpus = match &cli.corpus {
        Some(path) => Corpus::from_file(path)?,
        None => Corpus::builtin(),
    };

    let client =
        ClientConfig::default().with_base_url(ClientConfig::resolve_base_url(cli.base_url));
    let service = HttpJobService::new(client).map_err(|e| e.to_string())?;
    let backend_label = service.base_url().to_string();

    let config = JobConfig::default()
        .with_poll_interval(Duration::from_millis(cli.poll_ms))
        .with_settle_delay(Duration::from_millis(cli.settle_ms));
    let session = Session::new(service, corpus, config);

    let tui_config = TuiConfig {
        save_dir: cli.save_dir,
        backend_label,
        log_buffer: Some(log_buffer),
    };

    // The UI loop blocks on terminal input; job tasks stay on the runtime.
    tokio::task::spawn_blocking(move || run_tui(session, tui_config))
        .await
        .map_err(|e| format!("TUI thread failed: {e}"))?
        .map_err(|e| format!("TUI error: {e}"))
}
