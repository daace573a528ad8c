//! # Finder CLI
//!
//! Loads the static node list and answers registry queries from the
//! command line.
//!
//! ```text
//! finder --host node01 --host node02 graphite '*.cpu'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finder::{Config, Finder, Node, Pattern, StaticFinder};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Finder - peer node registry queries
#[derive(Parser, Debug)]
#[command(name = "finder")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = finder_common::constants::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Additional host (repeatable, appended to the configured hosts)
    #[arg(long = "host")]
    hosts: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,

    /// Print results as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all nodes
    List,
    /// Nodes selected by a metrics path prefix
    Prefix { query: String },
    /// Nodes matched by a regular expression
    Regexp { pattern: String },
    /// Nodes matched by a Graphite-style pattern, with their expansion
    Graphite { pattern: String },
    /// Pick a neighborhood node
    Neighbor,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!("🔎 Starting Finder v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    config.finder.hosts.extend(args.hosts.iter().cloned());
    info!("📋 Configuration loaded from {}", args.config);

    let finder = StaticFinder::from_config(&config.finder);
    finder.start().await.context("Failed to start finder")?;
    info!(
        backend = %finder.describe(),
        nodes = finder.registry().len().await,
        "✅ Finder ready"
    );

    match &args.command {
        Command::List => {
            let nodes = finder.all_nodes().await?;
            print_nodes(&nodes, args.json)?;
        }
        Command::Prefix { query } => {
            let nodes = finder.prefix_nodes(query).await?;
            print_nodes(&nodes, args.json)?;
        }
        Command::Regexp { pattern } => {
            let pattern = Pattern::new(pattern).context("Invalid regular expression")?;
            let nodes = finder.regexp_nodes(&pattern).await?;
            print_nodes(&nodes, args.json)?;
        }
        Command::Graphite { pattern } => {
            let pattern = Pattern::graphite(pattern).context("Invalid Graphite pattern")?;
            let nodes: Vec<Node> = finder
                .all_nodes()
                .await?
                .into_iter()
                .filter(|node| pattern.match_node(node))
                .collect();
            print_expansions(&pattern, &nodes, args.json)?;
        }
        Command::Neighbor => {
            let origin = Node::new();
            let node = finder
                .neighborhood_node(&origin)
                .await
                .context("No neighborhood node available")?;
            print_nodes(std::slice::from_ref(&node), args.json)?;
        }
    }

    finder.stop().await.context("Failed to stop finder")?;
    Ok(())
}

fn print_nodes(nodes: &[Node], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(nodes)?);
        return Ok(());
    }

    for node in nodes {
        println!("{}", node);
    }
    Ok(())
}

fn print_expansions(pattern: &Pattern, nodes: &[Node], json: bool) -> Result<()> {
    let expansions: Vec<(String, String)> = nodes
        .iter()
        .map(|node| {
            let expanded = pattern
                .expand_node(node)
                .unwrap_or_else(|| pattern.as_str().to_string());
            (node.to_string(), expanded)
        })
        .collect();

    if json {
        let entries: Vec<_> = expansions
            .iter()
            .map(|(node, expanded)| serde_json::json!({ "node": node, "expanded": expanded }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (node, expanded) in expansions {
        println!("{}\t{}", node, expanded);
    }
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    Ok(())
}
