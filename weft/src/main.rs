//! # Weft CLI Entry Point
//!
//! The main executable for the Weft tool. This file drives the application
//! lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`].
//! 2. **Connection**: Establishes a connection to the target server via
//!    `weft_core`.
//! 3. **Execution**: Runs a single dynamic call, a service listing, or a whole
//!    flow definition.
//! 4. **Presentation**: Prints the resulting data or error to standard
//!    output/error and sets the exit code.

mod cli;
mod output;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use output::{FormattedString, ServiceList};
use std::path::Path;
use std::process;
use std::time::Duration;
use weft_core::connect::connect;
use weft_core::flow::{FlowDefinition, FlowOutcome, InMemoryFlowStore, execute_by_id};
use weft_core::grpc::client::GrpcClient;
use weft_core::invoke::invoke_unary;
use weft_core::reflection::client::ReflectionClient;
use weft_core::tonic::transport::Channel;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weft=info,weft_core=info".into()),
        )
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Call {
            url,
            symbol,
            body,
            headers,
            deadline,
        } => run_call(&url, &symbol, body, headers, deadline).await,
        Commands::List { url, deadline } => list_services(&url, deadline).await,
        Commands::Run { file } => run_flow(&file).await,
    }
}

async fn connect_or_exit(url: &str, deadline: u64) -> Channel {
    match connect(url, None, Duration::from_secs(deadline)).await {
        Ok(channel) => channel,
        Err(err) => {
            eprintln!("Connection failed: {err}");
            process::exit(1);
        }
    }
}

async fn run_call(
    url: &str,
    symbol: &str,
    body: Option<serde_json::Value>,
    headers: Vec<String>,
    deadline: u64,
) {
    let channel = connect_or_exit(url, deadline).await;
    let mut reflection = ReflectionClient::new(channel.clone());
    let mut grpc = GrpcClient::new(channel);

    let messages = match body {
        Some(serde_json::Value::Array(items)) => items,
        Some(single) => vec![single],
        None => Vec::new(),
    };

    match invoke_unary(&mut reflection, &mut grpc, symbol, &headers, messages).await {
        Ok(envelope) => println!("{}", FormattedString::from(envelope.payload)),
        Err(err) => {
            eprintln!("Call failed: {err}");
            process::exit(1);
        }
    }
}

async fn list_services(url: &str, deadline: u64) {
    let channel = connect_or_exit(url, deadline).await;
    let mut reflection = ReflectionClient::new(channel);

    match reflection.list_services().await {
        Ok(services) => println!("{}", FormattedString::from(ServiceList(services))),
        Err(err) => {
            eprintln!("Listing services failed: {err}");
            process::exit(1);
        }
    }
}

async fn run_flow(file: &Path) {
    let outcome = match load_and_execute(file).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    };

    if outcome.success {
        println!("Flow completed successfully");
    } else {
        eprintln!("Flow failed: {}", outcome.message.unwrap_or_default());
        process::exit(1);
    }
}

async fn load_and_execute(file: &Path) -> anyhow::Result<FlowOutcome> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading flow definition '{}'", file.display()))?;
    let flow: FlowDefinition =
        serde_json::from_str(&raw).context("parsing flow definition")?;

    let id = flow.id.clone();
    let mut store = InMemoryFlowStore::new();
    store.insert(flow);

    Ok(execute_by_id(&store, &id).await)
}
