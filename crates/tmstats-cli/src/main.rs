//! tmstats - command-line access to the cached game statistics.
//!
//! Every read goes through the same resource caches the dashboard uses,
//! so repeated invocations within the TTL are served from disk.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tmstats_core::cache::Clock;
use tmstats_core::models::CardMode;
use tmstats_core::utils::truncate_string;
use tmstats_core::{Config, Resource, StatsCaches};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: tmstats [--log-file <path>] <command>

Commands:
  status                                   Show freshness of every cache
  get <resource> [--mode <mode>] [--refresh]
                                           Print a resource collection as JSON
  options <resource> [--refresh]           Print a resource's filter options
  clear [<resource>]                       Drop cached data (all if omitted)

Resources: corporation, card, prelude, award, milestone
Card modes: played (default), kept, drawn, bought";

#[derive(Debug, PartialEq)]
enum Command {
    Status,
    Get {
        resource: Resource,
        mode: CardMode,
        refresh: bool,
    },
    Options {
        resource: Resource,
        refresh: bool,
    },
    Clear {
        resource: Option<Resource>,
    },
}

#[derive(Debug, PartialEq)]
struct Args {
    log_file: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut log_file = None;
    let mut mode = CardMode::Played;
    let mut refresh = false;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--log-file" => {
                let path = iter.next().context("--log-file needs a path")?;
                log_file = Some(PathBuf::from(path));
            }
            "--mode" => {
                let value = iter.next().context("--mode needs a value")?;
                mode = value.parse().map_err(anyhow::Error::msg)?;
            }
            "--refresh" => refresh = true,
            other if other.starts_with("--") => bail!("unknown flag: {}", other),
            other => positional.push(other),
        }
    }

    let resource = |name: Option<&&str>| -> Result<Resource> {
        name.context("missing <resource>")?
            .parse()
            .map_err(anyhow::Error::msg)
    };

    let command = match positional.first().copied() {
        Some("status") => Command::Status,
        Some("get") => Command::Get {
            resource: resource(positional.get(1))?,
            mode,
            refresh,
        },
        Some("options") => Command::Options {
            resource: resource(positional.get(1))?,
            refresh,
        },
        Some("clear") => Command::Clear {
            resource: match positional.get(1) {
                Some(_) => Some(resource(positional.get(1))?),
                None => None,
            },
        },
        Some(other) => bail!("unknown command: {}", other),
        None => bail!("missing command"),
    };

    Ok(Args { log_file, command })
}

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug). Logs go to
/// stderr unless a log file is given.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().context("--log-file must name a file")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    if raw.is_empty() || raw.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return Ok(());
    }
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let _guard = init_tracing(args.log_file.as_deref())?;

    let config = Config::load().context("Failed to load configuration")?;
    info!(api = %config.api_base_url, "tmstats starting");
    let caches = StatsCaches::from_config(&config)?;

    run(&caches, args.command).await
}

async fn run(caches: &StatsCaches, command: Command) -> Result<()> {
    match command {
        Command::Status => print_status(caches),
        Command::Get {
            resource,
            mode,
            refresh,
        } => {
            let json = match resource {
                Resource::Corporation => to_json(&*caches.corporations(refresh).await?)?,
                Resource::Card => to_json(&*caches.cards(mode, refresh).await?)?,
                Resource::Prelude => to_json(&*caches.preludes(refresh).await?)?,
                Resource::Award => to_json(&*caches.awards(refresh).await?)?,
                Resource::Milestone => to_json(&*caches.milestones(refresh).await?)?,
            };
            println!("{}", json);
        }
        Command::Options { resource, refresh } => {
            let options = caches.options(resource, refresh).await?;
            println!("{}", to_json(&*options)?);
        }
        Command::Clear { resource } => match resource {
            Some(resource) => {
                caches.clear(resource);
                eprintln!("Cleared {} cache", resource);
            }
            None => {
                caches.clear_all();
                eprintln!("Cleared all caches");
            }
        },
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

fn print_status(caches: &StatsCaches) {
    let now = caches.clock().now();
    println!(
        "{:<22} {:<7} {:<7} {:<7} {}",
        "KEY", "MEMORY", "DISK", "TTL", "FETCHED"
    );
    for status in caches.statuses() {
        println!(
            "{:<22} {:<7} {:<7} {:<7} {}",
            truncate_string(&status.key, 22),
            if status.in_memory { "fresh" } else { "-" },
            if status.persistent { "fresh" } else { "-" },
            format!("{}m", status.ttl_secs / 60),
            status.age_display(now),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Result<Args> {
        let raw: Vec<String> = line.split_whitespace().map(String::from).collect();
        parse_args(&raw)
    }

    #[test]
    fn test_parse_get_with_flags() {
        let parsed = args("get cards --mode kept --refresh").unwrap();
        assert_eq!(
            parsed.command,
            Command::Get {
                resource: Resource::Card,
                mode: CardMode::Kept,
                refresh: true,
            }
        );
        assert_eq!(parsed.log_file, None);
    }

    #[test]
    fn test_parse_clear_and_log_file() {
        let parsed = args("--log-file /tmp/tm.log clear").unwrap();
        assert_eq!(parsed.command, Command::Clear { resource: None });
        assert_eq!(parsed.log_file, Some(PathBuf::from("/tmp/tm.log")));

        let parsed = args("clear prelude").unwrap();
        assert_eq!(
            parsed.command,
            Command::Clear {
                resource: Some(Resource::Prelude)
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(args("").is_err());
        assert!(args("get").is_err());
        assert!(args("get colonies").is_err());
        assert!(args("options award --verbose").is_err());
        assert!(args("get card --mode sideways").is_err());
        assert!(args("frobnicate").is_err());
    }
}
