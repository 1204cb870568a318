//! # Quotation Façade
//!
//! Read-only market data.
use super::{
    market::DealOrderModel,
    types::{impl_outcome, proto_double},
};
use crate::{
    binder::{Invoke, ServiceBinder, UnaryMethod},
    decimal::ScaledDecimal,
    error::BindError,
    schema::SchemaRegistry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRequest {
    pub market: String,
    pub limit: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketDealOrderResponse {
    pub success: bool,
    pub deal_orders: Vec<DealOrderModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketPriceResponse {
    pub success: bool,
    pub price: ScaledDecimal,
    /// Relative change, not scaled.
    #[serde(deserialize_with = "proto_double")]
    pub change: f64,
    pub max: ScaledDecimal,
    pub min: ScaledDecimal,
    pub volume: ScaledDecimal,
    pub value: ScaledDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketLatestResponse {
    pub success: bool,
    pub price: ScaledDecimal,
    #[serde(deserialize_with = "proto_double")]
    pub change: f64,
    pub max: ScaledDecimal,
    pub min: ScaledDecimal,
    pub volume: ScaledDecimal,
    pub value: ScaledDecimal,
    pub deal_orders: Vec<DealOrderModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSimplePrice {
    pub name: String,
    pub price: ScaledDecimal,
    #[serde(deserialize_with = "proto_double")]
    pub change: f64,
    pub volume: ScaledDecimal,
    pub value: ScaledDecimal,
    pub max: ScaledDecimal,
    pub min: ScaledDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketListResponse {
    pub success: bool,
    pub markets: Vec<MarketSimplePrice>,
}

impl_outcome!(
    MarketDealOrderResponse,
    MarketPriceResponse,
    MarketLatestResponse,
    MarketListResponse,
);

/// The `Quotation` service, every method bound at construction.
#[derive(Debug, Clone)]
pub struct QuotationClient {
    query_latest_deal: UnaryMethod<MarketRequest, MarketDealOrderResponse>,
    query_latest_price: UnaryMethod<MarketRequest, MarketPriceResponse>,
    query_latest: UnaryMethod<MarketRequest, MarketLatestResponse>,
    query_all_market: UnaryMethod<MarketRequest, MarketListResponse>,
}

impl QuotationClient {
    pub const SERVICE: &'static str = "Quotation";

    pub(crate) fn bind(
        invoker: &Arc<dyn Invoke>,
        registry: &SchemaRegistry,
    ) -> Result<Self, BindError> {
        let binder = ServiceBinder::new(invoker, registry, Self::SERVICE)?;

        Ok(Self {
            query_latest_deal: binder.bind("QueryLatestDeal")?,
            query_latest_price: binder.bind("QueryLatestPrice")?,
            query_latest: binder.bind("QueryLatest")?,
            query_all_market: binder.bind("QueryAllMarket")?,
        })
    }

    pub fn query_latest_deal(&self) -> &UnaryMethod<MarketRequest, MarketDealOrderResponse> {
        &self.query_latest_deal
    }

    pub fn query_latest_price(&self) -> &UnaryMethod<MarketRequest, MarketPriceResponse> {
        &self.query_latest_price
    }

    /// Price snapshot plus the most recent deals.
    pub fn query_latest(&self) -> &UnaryMethod<MarketRequest, MarketLatestResponse> {
        &self.query_latest
    }

    /// Every market. The `market` field of the request is ignored.
    pub fn query_all_market(&self) -> &UnaryMethod<MarketRequest, MarketListResponse> {
        &self.query_all_market
    }
}
