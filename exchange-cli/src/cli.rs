//! # CLI
//!
//! This module defines the command-line interface of `exchange` using `clap`.
//!
//! Global flags describe how to reach the engine; they fall back to environment variables so
//! scripts can export them once.
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "exchange", version, about = "Exchange engine gRPC client")]
pub struct Cli {
    #[command(flatten)]
    pub connection: Connection,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct Connection {
    /// Engine address, `host:port` or a full URI
    #[arg(long, global = true, env = "EXCHANGE_ADDRESS", default_value = "localhost:8888")]
    pub address: String,

    /// Use TLS (platform roots unless --ca-cert is given)
    #[arg(long, global = true, env = "EXCHANGE_TLS")]
    pub tls: bool,

    /// PEM file with the root certificates to trust
    #[arg(long, global = true, env = "EXCHANGE_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// PEM file with the client certificate chain
    #[arg(long, global = true, env = "EXCHANGE_CERT", requires = "key")]
    pub cert: Option<PathBuf>,

    /// PEM file with the client private key
    #[arg(long, global = true, env = "EXCHANGE_KEY", requires = "cert")]
    pub key: Option<PathBuf>,

    /// Per-call deadline in milliseconds. No deadline when omitted.
    #[arg(long, global = true, env = "EXCHANGE_TIMEOUT_MS", value_parser = parse_millis)]
    pub timeout_ms: Option<Duration>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Invoke a method of the Account, Market or Quotation service
    ///
    /// The JSON body is read into the typed request of the method, so unknown fields
    /// and malformed scaled decimals are rejected before anything is sent.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// exchange call Account/QueryBalance --body '{"userId": "alice", "tokens": ["USDT"]}'
    /// ```
    Call {
        /// Endpoint (Service/Method)
        #[arg(value_parser = parse_endpoint)]
        endpoint: (String, String),

        /// JSON body of the request
        #[arg(long, value_parser = parse_body, default_value = "{}")]
        body: serde_json::Value,

        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// List the services of the embedded schema
    List,

    /// Describe a service (`Account`) or a method (`Account/PutOrder`)
    Describe {
        /// Service name, or Service/Method
        symbol: String,
    },

    /// Convert a human decimal into its scaled wire form (0.01 -> 100000000)
    Scale {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Convert a scaled wire value back into a human decimal
    Unscale {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Run an end-to-end scenario against a live engine
    Scenario {
        #[arg(value_enum)]
        name: ScenarioName,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ScenarioName {
    /// Place a limit bid on BTC/USDT, check the frozen funds, then cancel it
    CancelOrder,
    /// Cross a limit ask and a limit bid on TRX/USDT
    BuySell,
    /// Consume a resting ask on BTC/USDT with market buys
    MarketOrder,
}

fn parse_endpoint(value: &str) -> Result<(String, String), String> {
    let (service, method) = value.split_once('/').ok_or_else(|| {
        format!("Invalid endpoint format: '{value}'. Expected 'Service/Method'",)
    })?;

    if service.trim().is_empty() || method.trim().is_empty() {
        return Err("Service and Method names cannot be empty".to_string());
    }

    Ok((service.to_string(), method.to_string()))
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}

fn parse_millis(value: &str) -> Result<Duration, String> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("Invalid timeout: {e}"))
}
