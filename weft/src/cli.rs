//! # CLI
//!
//! This module defines the command-line interface of `weft` using `clap`.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weft", version, about = "Dynamic gRPC/REST flow tester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Perform a dynamic unary gRPC call
    ///
    /// Connects to a gRPC server, resolves the method schema through server
    /// reflection and executes it with a JSON body.
    ///
    /// ## Example:
    ///
    /// ```bash
    /// weft call http://localhost:50051 my.pkg.Service/Method --body '{"key": "value"}'
    /// ```
    Call {
        /// The server URL to connect to (e.g. http://localhost:50051)
        url: String,

        /// Method symbol (package.Service/Method or package.Service.Method)
        symbol: String,

        /// JSON body of the request message
        #[arg(long, value_parser = parse_body)]
        body: Option<serde_json::Value>,

        /// Request header ("Name: Value"); repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Dial deadline in seconds
        #[arg(long, default_value_t = 10)]
        deadline: u64,
    },

    /// List the services a server exposes via reflection
    List {
        /// The server URL to connect to (e.g. http://localhost:50051)
        url: String,

        /// Dial deadline in seconds
        #[arg(long, default_value_t = 10)]
        deadline: u64,
    },

    /// Execute a flow definition file and report the outcome
    Run {
        /// Path to the JSON flow definition
        file: PathBuf,
    },
}

fn parse_body(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("body is not valid JSON: {e}"))
}
