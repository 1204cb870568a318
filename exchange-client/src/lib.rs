//! # Exchange Client
//!
//! `exchange-client` is a schema-driven gRPC client for a trading backend made of three
//! services: the `Account` ledger, the `Market` matching engine and the `Quotation` feed.
//!
//! ## Key Components
//!
//! * **[`SchemaRegistry`]:** An immutable index of services and methods, loaded once per
//!   process from a protobuf `FileDescriptorSet`.
//! * **[`build_channel`]:** Turns [`ClientOptions`] into a plaintext or TLS channel. Malformed
//!   certificate material fails here, never on a call.
//! * **[`UnaryMethod`]:** A schema method bound to the channel, typed by its request and
//!   response. Each call settles exactly once. Nothing is retried and there is no deadline
//!   unless [`CallOptions`] asks for one.
//! * **[`ScaledDecimal`]:** The fixed-point convention of the protocol. Every amount, price,
//!   fee and funds field is `value * 10^10` written as an integer string.
//! * **[`ExchangeClients`]:** The `account`, `market` and `quotation` façades, created with
//!   [`create_clients`].
//!
//! ## Errors
//!
//! Transport and codec failures reject a call ([`CallError`]). A business rejection from the
//! engine resolves normally with `success == false` and a `code`, see [`Outcome`].
//!
//! ## Re-exports
//!
//! This crate re-exports `prost-reflect` and `tonic` to ensure that consumers use
//! compatible versions of these underlying dependencies.
pub mod binder;
pub mod channel;
pub mod client;
pub mod decimal;
pub mod error;
mod grpc;
pub mod schema;

pub use binder::{CallOptions, CallOptionsError, UnaryMethod};
pub use channel::{ClientOptions, SslOptions, build_channel};
pub use client::{ExchangeClients, Outcome, create_clients};
pub use decimal::ScaledDecimal;
pub use error::{
    ApplicationError, BindError, CallError, ChannelError, ClientError, CodecError,
    CredentialError, SchemaError, TransportError,
};
pub use schema::SchemaRegistry;

// Re-exports
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
