//! # Exchange Clients
//!
//! The public surface of the crate: one typed façade per exchange service, all sharing one
//! transport.
//!
//! ```text
//! SchemaRegistry ──┐
//!                  ├──> ServiceBinder ──> AccountClient / MarketClient / QuotationClient
//! Channel ─────────┘        (Invoke)
//! ```
//!
//! Every method is bound when the clients are created, so a schema lacking a method the
//! façades expect fails here rather than on the first call. Clones of [`ExchangeClients`]
//! share the same channel.
//!
//! ## Example
//!
//! ```rust,no_run
//! use exchange_client::{
//!     ClientOptions, ScaledDecimal, create_clients,
//!     client::account::{AlterRequest, BalanceQueryRequest},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let clients = create_clients(&ClientOptions::new("localhost:8888"))?;
//!
//! let deposit = AlterRequest::deposit("u1", "USDT", ScaledDecimal::from_units(1000), "dep-1");
//! clients.account.alter().call(deposit).await?;
//!
//! let balance = clients
//!     .account
//!     .query_balance()
//!     .call(BalanceQueryRequest {
//!         user_id: "u1".to_string(),
//!         tokens: vec!["USDT".to_string()],
//!     })
//!     .await?;
//!
//! assert!(balance.balance("USDT").is_consistent()?);
//! # Ok(())
//! # }
//! ```
pub mod account;
pub mod market;
pub mod quotation;
mod types;

pub use account::AccountClient;
pub use market::MarketClient;
pub use quotation::QuotationClient;
pub use types::{AlterAction, BizType, OrderType, Outcome, Side};

use crate::{
    BoxError,
    binder::Invoke,
    channel::{self, ClientOptions},
    error::{BindError, ClientError},
    grpc::client::GrpcClient,
    schema::SchemaRegistry,
};
use http_body::Body as HttpBody;
use std::sync::Arc;
use tonic::transport::Channel;

/// The three service façades of one exchange connection.
#[derive(Debug, Clone)]
pub struct ExchangeClients {
    pub account: AccountClient,
    pub market: MarketClient,
    pub quotation: QuotationClient,
}

/// Builds the channel described by `options` and binds every service against it.
///
/// No network I/O happens here, the connection is established by the first call.
pub fn create_clients(options: &ClientOptions) -> Result<ExchangeClients, ClientError> {
    ExchangeClients::connect(options)
}

impl ExchangeClients {
    /// See [`create_clients`].
    pub fn connect(options: &ClientOptions) -> Result<Self, ClientError> {
        let channel = channel::build_channel(options)?;
        Self::from_channel(channel)
    }

    /// Binds the embedded schema against an existing channel.
    pub fn from_channel(channel: Channel) -> Result<Self, ClientError> {
        Self::from_service(channel)
    }

    /// Binds the embedded schema against any tonic service (e.g. an in-process server).
    pub fn from_service<S>(service: S) -> Result<Self, ClientError>
    where
        S: tonic::client::GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
        S::Future: Send,
        S::Error: Into<BoxError> + Send,
        S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
        <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
    {
        let registry = SchemaRegistry::embedded()?;
        Ok(Self::from_service_with_registry(service, &registry)?)
    }

    /// Binds an explicit schema against any tonic service.
    ///
    /// The registry must declare every method of the three façades.
    pub fn from_service_with_registry<S>(
        service: S,
        registry: &SchemaRegistry,
    ) -> Result<Self, BindError>
    where
        S: tonic::client::GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
        S::Future: Send,
        S::Error: Into<BoxError> + Send,
        S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
        <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
    {
        let invoker: Arc<dyn Invoke> = Arc::new(GrpcClient::new(service));
        Self::bind(&invoker, registry)
    }

    pub(crate) fn bind(
        invoker: &Arc<dyn Invoke>,
        registry: &SchemaRegistry,
    ) -> Result<Self, BindError> {
        let clients = Self {
            account: AccountClient::bind(invoker, registry)?,
            market: MarketClient::bind(invoker, registry)?,
            quotation: QuotationClient::bind(invoker, registry)?,
        };

        tracing::debug!(package = registry.package(), "exchange services bound");

        Ok(clients)
    }
}
