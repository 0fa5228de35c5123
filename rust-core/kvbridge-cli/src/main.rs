// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//!
//! kvbridge: run single record operations against a key-value cluster.
//!
//! Each invocation attaches to the cluster through the same driver the
//! benchmark harness uses, performs one operation, and prints the status
//! (and, for reads, the record as JSON) on stdout. Logs go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;

use kvbridge_core::config::parse_node_list;
use kvbridge_core::{compose_key, ConfigError, DriverConfig, FieldSet, KvDriver, Record, Status};
use kvbridge_store::{KvStore, MetricsStore};

/// kvbridge version string, pulled from Cargo.toml at compile time.
const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

/// Record operations over a flat key-value cluster.
#[derive(Parser, Debug)]
#[command(name = "kvbridge", version = VERSION, about = "CRUD records over a key-value cluster")]
struct Cli {
    /// Comma-separated store node addresses; the first is the primary.
    #[arg(long, env = "KVBRIDGE_NODES", global = true, default_value = "")]
    nodes: String,

    /// Channel-count hint for the cluster client.
    #[arg(long, env = "KVBRIDGE_CHANNELS", global = true)]
    channels: Option<usize>,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "KVBRIDGE_TIMEOUT_MS", global = true, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print store operation statistics after the command.
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a record, optionally projected to some fields.
    Read {
        table: String,
        key: String,
        /// Field to return; repeat for several. Omit for all fields.
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,
    },
    /// Insert a record from `name=value` pairs.
    Insert {
        table: String,
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Replace a record with `name=value` pairs.
    Update {
        table: String,
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Delete a record.
    Delete { table: String, key: String },
    /// Range scan (not supported by the store).
    Scan {
        table: String,
        start_key: String,
        count: usize,
    },
    /// Check `/health` on every configured node.
    Ping,
    /// Print the flat store key for a (table, key) pair.
    Key { table: String, key: String },
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a Record>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Split `name=value` arguments into ordered field pairs.
fn parse_values(values: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    values
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Ok((name.to_string(), value.to_string())),
            None => bail!("expected name=value, got '{pair}'"),
        })
        .collect()
}

/// Validated driver settings from the command line and `KVBRIDGE_*` variables.
fn driver_config(cli: &Cli) -> Result<DriverConfig, ConfigError> {
    DriverConfig::new(parse_node_list(&cli.nodes), cli.channels, cli.timeout_ms)
}

/// A miss is a valid answer; only failures and unsupported operations fail
/// the process.
fn succeeded(status: Status) -> bool {
    matches!(status, Status::Ok | Status::NotFound)
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if let Command::Key { table, key } = &cli.command {
        println!("{}", compose_key(table, key));
        return Ok(ExitCode::SUCCESS);
    }

    let config = driver_config(&cli).context("reading configuration")?;
    let cluster = KvDriver::init(&config)
        .await
        .context("connecting to the store cluster")?;

    if let Command::Ping = cli.command {
        let mut all_up = true;
        for (node, healthy) in cluster.store().health().await {
            println!("{node} {}", if healthy { "up" } else { "down" });
            all_up &= healthy;
        }
        return Ok(if all_up { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let metered = Arc::new(MetricsStore::new(Arc::clone(cluster.store())));
    let driver = KvDriver::with_store(Arc::clone(&metered));

    let status = match cli.command {
        Command::Read { table, key, fields } => {
            let fields: FieldSet = fields.into_iter().collect();
            let (status, record) = driver.read(&table, &key, Some(&fields)).await;
            let output = ReadOutput {
                status,
                record: record.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            status
        }
        Command::Insert { table, key, values } => {
            let status = driver.insert(&table, &key, parse_values(&values)?).await;
            println!("{status}");
            status
        }
        Command::Update { table, key, values } => {
            let status = driver.update(&table, &key, parse_values(&values)?).await;
            println!("{status}");
            status
        }
        Command::Delete { table, key } => {
            let status = driver.delete(&table, &key).await;
            println!("{status}");
            status
        }
        Command::Scan {
            table,
            start_key,
            count,
        } => {
            let status = driver.scan(&table, &start_key, count, None).await;
            println!("{status}");
            status
        }
        Command::Ping | Command::Key { .. } => unreachable!("handled above"),
    };

    if cli.stats {
        let stats = metered.stats().await;
        eprintln!(
            "store={} gets={} misses={} puts={} deletes={} failures={} read_bytes={} written_bytes={}",
            metered.name(),
            stats.get_count,
            stats.get_miss_count,
            stats.put_count,
            stats.delete_count,
            stats.failure_count,
            stats.total_bytes_read,
            stats.total_bytes_written,
        );
    }
    driver.cleanup();

    Ok(if succeeded(status) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        let args = ["name=Ann".to_string(), "note=a=b".to_string(), "e=".to_string()];
        let parsed = parse_values(&args).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("name".to_string(), "Ann".to_string()),
                ("note".to_string(), "a=b".to_string()),
                ("e".to_string(), String::new()),
            ]
        );
        assert!(parse_values(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn test_success_statuses() {
        assert!(succeeded(Status::Ok));
        assert!(succeeded(Status::NotFound));
        assert!(!succeeded(Status::Error));
        assert!(!succeeded(Status::NotImplemented));
    }

    #[test]
    fn test_cli_parses_read_with_fields() {
        let cli = Cli::try_parse_from([
            "kvbridge", "--nodes", "a:1,b:2", "read", "users", "u1", "-f", "name", "-f", "age",
        ])
        .unwrap();
        assert_eq!(cli.nodes, "a:1,b:2");
        match cli.command {
            Command::Read { table, key, fields } => {
                assert_eq!(table, "users");
                assert_eq!(key, "u1");
                assert_eq!(fields, vec!["name".to_string(), "age".to_string()]);
            }
            other => panic!("expected read, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_channels_and_timeout_are_rejected() {
        let cli = Cli::try_parse_from([
            "kvbridge", "--nodes", "a:1", "--channels", "0", "--timeout-ms", "0", "delete", "t", "k",
        ])
        .unwrap();
        assert!(matches!(
            driver_config(&cli),
            Err(ConfigError::InvalidNumber { .. })
        ));

        let cli = Cli::try_parse_from(["kvbridge", "--nodes", "a:1, b:2", "--channels", "3", "ping"])
            .unwrap();
        let config = driver_config(&cli).unwrap();
        assert_eq!(config.nodes, vec!["a:1".to_string(), "b:2".to_string()]);
        assert_eq!(config.channels, Some(3));
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn test_cli_requires_values_for_insert() {
        assert!(Cli::try_parse_from(["kvbridge", "insert", "users", "u1"]).is_err());
    }
}
