//! Opstrack: worklog parsing service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use opstrack_core::TrackerConfig;
use opstrack_runtime::ParseRequest;
use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("OPSTRACK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("Opstrack: natural-language worklog parser");
    println!();
    println!("Usage: opstrack [command]");
    println!();
    println!("Commands:");
    println!("  (none)                      Start the server");
    println!("  parse <text> [YYYY-MM-DD]   Parse a worklog and print the result as JSON");
    println!("  normalize <text>            Show normalized text and keyword hints");
    println!("  help                        Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "parse" => {
                let Some(text) = args.get(2) else {
                    eprintln!("Usage: opstrack parse <text> [YYYY-MM-DD]");
                    std::process::exit(1);
                };
                let target_date = match args.get(3) {
                    Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .with_context(|| format!("invalid date: {}", raw))?,
                    None => chrono::Local::now().date_naive(),
                };

                let config = TrackerConfig::from_env(resolve_data_dir())?;
                let state = AppState::new(config);
                let result = state
                    .parser
                    .parse(&ParseRequest::new(text.as_str(), "cli", target_date))
                    .await;
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            "normalize" => {
                let Some(text) = args.get(2) else {
                    eprintln!("Usage: opstrack normalize <text>");
                    std::process::exit(1);
                };
                let normalized = opstrack_text::normalize(text);
                let hints = opstrack_text::extract_hints(&normalized);
                println!("{}", normalized);
                for tag in opstrack_text::hint_tags(&hints) {
                    println!("  {}", tag);
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'opstrack help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = TrackerConfig::from_env(&data_dir)?;
    let state = Arc::new(AppState::new(config));
    let port = state.config.port;
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Opstrack server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
