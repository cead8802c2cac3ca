use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_core::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use catalog_core::{CatalogClient, CatalogConfig, ListConfig, ListView, Session, UreqTransport};
use clap::Parser;
use tokio::sync::{watch, Mutex};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod render;
mod repl;

/// Browse the comic character catalog from the terminal.
///
/// Reads MARVEL_URL, MARVEL_PUBLIC_KEY and MARVEL_PRIVATE_KEY from the
/// environment.
#[derive(Debug, Parser)]
#[command(name = "catalog", version)]
struct Cli {
    /// Characters per page, at most 100.
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u64).range(1..=MAX_PAGE_SIZE)
    )]
    page_size: u64,

    /// Initial name-prefix filter.
    #[arg(long)]
    search: Option<String>,

    /// Quiet period before a search takes effect, in milliseconds.
    #[arg(long, default_value_t = 300)]
    debounce_ms: u64,

    /// Return to the first page whenever the search changes.
    #[arg(long)]
    reset_page_on_search: bool,

    /// Print the total number of characters and exit.
    #[arg(long)]
    count: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = CatalogConfig::from_env().context("catalog credentials are not configured")?;
    let list = ListConfig {
        page_size: cli.page_size,
        debounce: Duration::from_millis(cli.debounce_ms),
        reset_page_on_search: cli.reset_page_on_search,
    };

    let client = CatalogClient::new(&catalog.base_url, catalog.credentials);
    let transport = UreqTransport::default();

    if cli.count {
        println!("{}", client.fetch_total_count(&transport).await);
        return Ok(());
    }

    let (handle, session) = Session::spawn(client, transport, list)?;
    let terminal = Arc::new(Mutex::new(()));
    let renderer = tokio::spawn(render_views(handle.subscribe(), Arc::clone(&terminal)));

    match cli.search {
        Some(search) => handle.init_with_search(search)?,
        None => handle.init()?,
    }
    print!("{}", repl::HELP);

    let input_handle = handle.clone();
    tokio::task::spawn_blocking(move || {
        repl::run(
            &input_handle,
            &terminal,
            std::io::stdin().lock(),
            std::io::stdout(),
        )
    })
    .await??;

    debug!("input closed, stopping session");
    let _ = handle.shutdown();
    session.await?;
    renderer.abort();
    Ok(())
}

/// Print each new view. Waits on `terminal` so a page never lands in the
/// middle of an open dialog.
async fn render_views(mut views: watch::Receiver<ListView>, terminal: Arc<Mutex<()>>) {
    while views.changed().await.is_ok() {
        let _held = terminal.lock().await;
        let text = render::render(&views.borrow_and_update());
        print!("{text}");
    }
}
