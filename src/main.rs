use std::path::PathBuf;

mod app;
mod config;
mod crawler;
mod db;
mod error;
mod models;
mod reconcile;
mod schedule;
mod services;

use app::App;
use config::Config;
use error::{AppError, Result};
use models::{Series, Settings};

const USAGE: &str = "\
Usage: episode-watch <command> [args]

Commands:
  crawl                              Crawl all tracked series once and reconcile
  tasks                              Print the current crawl task batch as JSON
  report <file>                      Reconcile a crawl report JSON file
  list                               List tracked series
  add <name> <url>                   Start tracking a series
  edit <id> <name> <url>             Change a series' name and url
  remove <id>                        Delete a series
  watch <id> | unwatch <id>          Mark a series as watched / not watched
  toggle <id>                        Toggle tracking for a series
  clear <id>                         Clear episode history and status
  settings                           Show global settings
  settings <start> <end> <webhook>   Replace global settings (use \"\" to unset)
  test-notify                        Send a test notification";

#[tokio::main]
async fn main() {
    // Logs go to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("episode_watch=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };

    if matches!(command.as_str(), "help" | "--help" | "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = Config::load()?;
    let app = App::new(&config).await?;

    match (command.as_str(), &args[1..]) {
        ("crawl", []) => {
            let summary = app.crawl_once().await?;
            println!(
                "Crawl finished: {} new episode update(s), {} status change(s), {} unchanged, {} skipped, {} failed",
                summary.new_episodes, summary.status_changes, summary.unchanged, summary.skipped, summary.failed
            );
        }
        ("tasks", []) => {
            let batch = app.task_batch().await?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
        ("report", [path]) => {
            let summary = app.ingest_report(&PathBuf::from(path)).await?;
            println!(
                "Report applied: {} new episode update(s), {} status change(s), {} unchanged, {} skipped, {} failed",
                summary.new_episodes, summary.status_changes, summary.unchanged, summary.skipped, summary.failed
            );
        }
        ("list", []) => {
            for series in app.list_series().await? {
                print_series(&series);
            }
        }
        ("add", [name, url]) => {
            let series = app.add_series(name, url).await?;
            println!("Added:");
            print_series(&series);
        }
        ("edit", [id, name, url]) => {
            let series = app.edit_series(parse_id(id)?, name, url).await?;
            print_series(&series);
        }
        ("remove", [id]) => {
            app.remove_series(parse_id(id)?).await?;
            println!("Deleted series {}", id);
        }
        ("watch", [id]) => {
            app.set_watched(parse_id(id)?, true).await?;
            println!("Marked series {} as watched", id);
        }
        ("unwatch", [id]) => {
            app.set_watched(parse_id(id)?, false).await?;
            println!("Marked series {} as not watched", id);
        }
        ("toggle", [id]) => {
            let tracking = app.toggle_tracking(parse_id(id)?).await?;
            println!(
                "Tracking {} for series {}",
                if tracking { "enabled" } else { "disabled" },
                id
            );
        }
        ("clear", [id]) => {
            let series = app.clear_history(parse_id(id)?).await?;
            print_series(&series);
        }
        ("settings", []) => {
            println!("{}", serde_json::to_string_pretty(&app.settings().await?)?);
        }
        ("settings", [start, end, webhook]) => {
            app.update_settings(Settings {
                crawler_start_time: start.clone(),
                crawler_end_time: end.clone(),
                notification_webhook: webhook.clone(),
            })
            .await?;
            println!("Settings updated");
        }
        ("test-notify", []) => {
            app.send_test_notification().await?;
            println!("Test notification sent");
        }
        _ => {
            return Err(AppError::InvalidInput(format!(
                "unrecognized command: {}\n\n{USAGE}",
                args.join(" ")
            )));
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid id: {raw}")))
}

fn print_series(series: &Series) {
    let flags = format!(
        "{}{}",
        if series.is_tracking { "T" } else { "-" },
        if series.is_watched { "W" } else { "-" }
    );
    let last_seen = series
        .crawler_last_seen
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!(
        "{:>4} [{}] {} <{}>\n       current: {}  episodes: {}  last seen: {}",
        series.id,
        flags,
        series.name,
        series.url,
        if series.current.is_empty() { "-" } else { series.current.as_str() },
        series.history.len(),
        last_seen
    );
}
