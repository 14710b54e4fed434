//! search-relay command line entry point

use anyhow::{bail, Context, Result};
use search_relay::{
    config::{self, Settings},
    network::HttpClient,
    providers::ProviderLoader,
    query::is_valid_query,
    web::{create_router, AppState},
    SearchDispatcher,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str);

    if matches!(command, None | Some("-h" | "--help" | "help")) {
        print_usage();
        return Ok(());
    }
    if matches!(command, Some("-V" | "--version")) {
        println!("search-relay {}", search_relay::VERSION);
        return Ok(());
    }

    let (settings, source) = config::load()?;
    init_logging(&settings);
    match source {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    match command {
        Some("query") => {
            let query = args[1..].join(" ");
            run_query(settings, &query).await
        }
        Some("serve") => serve(settings).await,
        Some(other) => {
            print_usage();
            bail!("unknown command: {}", other)
        }
        None => Ok(()),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` in debug mode
fn init_logging(settings: &Settings) {
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_dispatcher(settings: &Settings) -> Result<SearchDispatcher> {
    let client = HttpClient::with_settings(&settings.outgoing)?;
    let registry = ProviderLoader::load(settings, client)?;
    let dispatcher = SearchDispatcher::new(registry, settings.dispatch_options())
        .context("cannot start without search providers")?;
    Ok(dispatcher)
}

async fn run_query(settings: Settings, query: &str) -> Result<()> {
    let query = query.trim();
    if !is_valid_query(query) {
        bail!("not a searchable query: '{}'", query);
    }

    let dispatcher = build_dispatcher(&settings)?;
    let outcome = dispatcher.run(query).await;
    println!("{}", outcome);

    if !(outcome.is_success() || outcome.is_cache_hit()) {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(settings: Settings) -> Result<()> {
    info!("Starting search-relay v{}", search_relay::VERSION);

    let dispatcher = build_dispatcher(&settings)?;
    let addr = SocketAddr::new(
        settings
            .server
            .bind_address
            .parse()
            .with_context(|| format!("invalid bind address: {}", settings.server.bind_address))?,
        settings.server.port,
    );

    let app = create_router(AppState::new(settings, dispatcher));

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
search-relay v{}
Budgeted, cached, failover search across rate-limited providers

USAGE:
    search-relay query <TEXT...>   Run one search and print the result
    search-relay serve             Serve the JSON API

OPTIONS:
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    SEARCH_RELAY_SETTINGS_PATH  Path to settings.yml
    SEARCH_RELAY_DEBUG          Enable debug logging (true/false)
    SEARCH_RELAY_PORT           Server port
    SEARCH_RELAY_BIND_ADDRESS   Bind address
    BRAVE_API_KEY               Brave Search API subscription token
    TAVILY_API_KEY              Tavily API key
    RUST_LOG                    Log filter, e.g. search_relay=debug
"#,
        search_relay::VERSION
    );
}
