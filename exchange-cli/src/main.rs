//! # Exchange CLI Entry Point
//!
//! The `exchange` executable drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs a
//!    `tracing` subscriber on stderr, so stdout only carries results.
//! 2. **Connection**: Builds the channel and binds the `Account`, `Market` and `Quotation`
//!    façades. Nothing touches the network before the first call.
//! 3. **Execution**: Routes the command to a typed method, an introspection query or a
//!    scenario.
//! 4. **Presentation**: Formats and prints the result, or the failure with a non-zero exit
//!    code.

mod cli;
mod dispatch;
mod formatter;
mod scenario;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, Connection};
use exchange_client::{
    CallError, CallOptions, ClientOptions, ExchangeClients, ScaledDecimal, SchemaRegistry,
    SslOptions,
};
use formatter::{FormattedString, GenericError, Rejected, ServiceList};
use rust_decimal::Decimal;
use std::{process, str::FromStr};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    if let Err(err) = run(args).await {
        match err.downcast_ref::<CallError>() {
            Some(call_error) => eprintln!("{}", FormattedString::from(call_error)),
            None => {
                let err = GenericError("Command failed", format!("{err:#}"));
                eprintln!("{}", FormattedString::from(err));
            }
        }
        process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    match args.command {
        Commands::Call {
            endpoint,
            body,
            headers,
        } => {
            let (service, method) = endpoint;
            let clients = connect(&args.connection)?;
            let registry = SchemaRegistry::embedded()?;

            let mut options = call_options(&args.connection);
            for (key, value) in &headers {
                options = options.with_header(key, value)?;
            }

            let response =
                dispatch::call(&clients, &registry, &service, &method, body, options).await?;

            // A business rejection is still an answer: print it and exit normally.
            if response.get("success") == Some(&serde_json::Value::Bool(false)) {
                eprintln!("{}", FormattedString::from(Rejected(&response)));
            }
            println!("{}", FormattedString::from(response));
        }
        Commands::List => {
            let registry = SchemaRegistry::embedded()?;
            let services = registry.services().cloned().collect();
            println!("{}", FormattedString::from(ServiceList(services)));
        }
        Commands::Describe { symbol } => describe(&symbol)?,
        Commands::Scale { value } => {
            let decimal = Decimal::from_str(value.trim())
                .with_context(|| format!("'{value}' is not a decimal number"))?;
            println!("{}", ScaledDecimal::from_decimal(decimal)?);
        }
        Commands::Unscale { value } => {
            let scaled = ScaledDecimal::from_str(value.trim())?;
            println!("{}", scaled.to_decimal()?.normalize());
        }
        Commands::Scenario { name } => {
            let clients = connect(&args.connection)?;
            scenario::run(name, &clients, call_options(&args.connection)).await?;
        }
    }

    Ok(())
}

fn describe(symbol: &str) -> anyhow::Result<()> {
    let registry = SchemaRegistry::embedded()?;

    match symbol.split_once('/') {
        Some((service, method)) => {
            let method = registry.method(service, method)?;
            println!("{}", FormattedString::from(method.clone()));
            println!("{}", FormattedString::from(method.input()));
            println!("{}", FormattedString::from(method.output()));
        }
        None => {
            let service = registry.service(symbol)?;
            println!("{}", FormattedString::from(service.clone()));
        }
    }

    Ok(())
}

fn connect(connection: &Connection) -> anyhow::Result<ExchangeClients> {
    let mut options = ClientOptions::new(connection.address.clone());

    if connection.tls || connection.ca_cert.is_some() || connection.cert.is_some() {
        let read = |path: &Option<std::path::PathBuf>| {
            path.as_ref()
                .map(|p| {
                    std::fs::read(p).with_context(|| format!("Failed to read {}", p.display()))
                })
                .transpose()
        };

        options = options.with_tls(SslOptions {
            root_certs: read(&connection.ca_cert)?,
            private_key: read(&connection.key)?,
            cert_chain: read(&connection.cert)?,
        });
    }

    tracing::debug!(address = %options.address, tls = !options.insecure, "connecting");

    Ok(ExchangeClients::connect(&options)?)
}

fn call_options(connection: &Connection) -> CallOptions {
    match connection.timeout_ms {
        Some(timeout) => CallOptions::new().with_timeout(timeout),
        None => CallOptions::new(),
    }
}
