//! # Market Façade
//!
//! Market administration and the matching engine's order book.
use super::types::{OrderType, Side, impl_outcome, reported_side};
use crate::{
    binder::{Invoke, ServiceBinder, UnaryMethod},
    decimal::ScaledDecimal,
    error::BindError,
    schema::SchemaRegistry,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketRequest {
    /// e.g. `BTC/USDT`
    pub name: String,
    /// Base token.
    pub token1: String,
    /// Quote token.
    pub token2: String,
    pub min_amount: ScaledDecimal,
    pub taker_fee: ScaledDecimal,
    pub maker_fee: ScaledDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateMarketResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMarketRequest {
    pub name: String,
    pub min_amount: ScaledDecimal,
    pub taker_fee: ScaledDecimal,
    pub maker_fee: ScaledDecimal,
    pub status: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateMarketResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub start_time: String,
    pub end_time: String,
    pub market: String,
}

/// An order addressed directly to the matching engine.
///
/// Market orders ignore `price` and are bounded by `funds` on the BID side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOrderRequest {
    pub market: String,
    pub user_id: String,
    pub id: String,
    pub price: ScaledDecimal,
    pub amount: ScaledDecimal,
    pub funds: ScaledDecimal,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

/// An order as held by the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketOrderModel {
    pub id: String,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: i64,
    pub price: ScaledDecimal,
    pub left_amount: ScaledDecimal,
    pub filled_amount: ScaledDecimal,
    pub left_funds: ScaledDecimal,
    pub filled_funds: ScaledDecimal,
    pub uid: String,
    #[serde(default, deserialize_with = "reported_side")]
    pub side: Option<Side>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketResponse {
    pub success: bool,
    pub code: String,
    pub current_price: ScaledDecimal,
    pub left: ScaledDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRequest {
    pub market: String,
    pub limit: i32,
    pub group: i32,
}

/// Aggregated depth, price level to quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthResponse {
    pub success: bool,
    pub current_price: ScaledDecimal,
    pub bids: BTreeMap<ScaledDecimal, ScaledDecimal>,
    pub asks: BTreeMap<ScaledDecimal, ScaledDecimal>,
    pub current_side: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookResponse {
    pub success: bool,
    pub bids: Vec<MarketOrderModel>,
    pub asks: Vec<MarketOrderModel>,
}

/// A trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealOrderModel {
    #[serde(default)]
    pub timestamp: i64,
    pub price: ScaledDecimal,
    pub amount: ScaledDecimal,
    #[serde(default, deserialize_with = "reported_side")]
    pub side: Option<Side>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealRecordResponse {
    pub success: bool,
    pub data: Vec<DealOrderModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderDetailResponse {
    pub success: bool,
    pub data: Option<MarketOrderModel>,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderCountResponse {
    pub success: bool,
    pub ask: i32,
    pub bid: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderExistResponse {
    pub success: bool,
    pub exists: bool,
}

impl_outcome!(with_code: MarketResponse, OrderDetailResponse);
impl_outcome!(
    CreateMarketResponse,
    UpdateMarketResponse,
    DepthResponse,
    OrderBookResponse,
    DealRecordResponse,
    OrderCountResponse,
    OrderExistResponse,
);

/// The `Market` service, every method bound at construction.
#[derive(Debug, Clone)]
pub struct MarketClient {
    create_market: UnaryMethod<CreateMarketRequest, CreateMarketResponse>,
    update_market: UnaryMethod<UpdateMarketRequest, UpdateMarketResponse>,
    put_limit_order: UnaryMethod<MarketOrderRequest, MarketResponse>,
    put_market_order: UnaryMethod<MarketOrderRequest, MarketResponse>,
    query_order_detail: UnaryMethod<MarketOrderRequest, OrderDetailResponse>,
    cancel_order: UnaryMethod<MarketOrderRequest, MarketResponse>,
    query_order_book: UnaryMethod<DepthRequest, OrderBookResponse>,
    get_depth_merge: UnaryMethod<DepthRequest, DepthResponse>,
    query_latest_deal_record: UnaryMethod<DepthRequest, DealRecordResponse>,
    re_publish_deal_order: UnaryMethod<PublishRequest, MarketResponse>,
    query_order_count: UnaryMethod<DepthRequest, OrderCountResponse>,
    is_order_exist: UnaryMethod<MarketOrderRequest, OrderExistResponse>,
}

impl MarketClient {
    pub const SERVICE: &'static str = "Market";

    pub(crate) fn bind(
        invoker: &Arc<dyn Invoke>,
        registry: &SchemaRegistry,
    ) -> Result<Self, BindError> {
        let binder = ServiceBinder::new(invoker, registry, Self::SERVICE)?;

        Ok(Self {
            create_market: binder.bind("CreateMarket")?,
            update_market: binder.bind("UpdateMarket")?,
            put_limit_order: binder.bind("PutLimitOrder")?,
            put_market_order: binder.bind("PutMarketOrder")?,
            query_order_detail: binder.bind("QueryOrderDetail")?,
            cancel_order: binder.bind("CancelOrder")?,
            query_order_book: binder.bind("QueryOrderBook")?,
            get_depth_merge: binder.bind("GetDepthMerge")?,
            query_latest_deal_record: binder.bind("QueryLatestDealRecord")?,
            re_publish_deal_order: binder.bind("RePublishDealOrder")?,
            query_order_count: binder.bind("QueryOrderCount")?,
            is_order_exist: binder.bind("IsOrderExist")?,
        })
    }

    /// Creating an existing market again is reported by the engine, never a transport
    /// failure.
    pub fn create_market(&self) -> &UnaryMethod<CreateMarketRequest, CreateMarketResponse> {
        &self.create_market
    }

    pub fn update_market(&self) -> &UnaryMethod<UpdateMarketRequest, UpdateMarketResponse> {
        &self.update_market
    }

    pub fn put_limit_order(&self) -> &UnaryMethod<MarketOrderRequest, MarketResponse> {
        &self.put_limit_order
    }

    pub fn put_market_order(&self) -> &UnaryMethod<MarketOrderRequest, MarketResponse> {
        &self.put_market_order
    }

    pub fn query_order_detail(&self) -> &UnaryMethod<MarketOrderRequest, OrderDetailResponse> {
        &self.query_order_detail
    }

    pub fn cancel_order(&self) -> &UnaryMethod<MarketOrderRequest, MarketResponse> {
        &self.cancel_order
    }

    pub fn query_order_book(&self) -> &UnaryMethod<DepthRequest, OrderBookResponse> {
        &self.query_order_book
    }

    pub fn get_depth_merge(&self) -> &UnaryMethod<DepthRequest, DepthResponse> {
        &self.get_depth_merge
    }

    pub fn query_latest_deal_record(&self) -> &UnaryMethod<DepthRequest, DealRecordResponse> {
        &self.query_latest_deal_record
    }

    pub fn re_publish_deal_order(&self) -> &UnaryMethod<PublishRequest, MarketResponse> {
        &self.re_publish_deal_order
    }

    pub fn query_order_count(&self) -> &UnaryMethod<DepthRequest, OrderCountResponse> {
        &self.query_order_count
    }

    pub fn is_order_exist(&self) -> &UnaryMethod<MarketOrderRequest, OrderExistResponse> {
        &self.is_order_exist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn depth_levels_are_ordered_by_price() {
        let response: DepthResponse = serde_json::from_value(json!({
            "success": true,
            "current_price": "300000000000000",
            "bids": { "299000000000000": "10000000", "298000000000000": "20000000" },
            "asks": { "301000000000000": "30000000" },
            "current_side": "1"
        }))
        .unwrap();

        let bids: Vec<_> = response.bids.keys().map(|p| p.raw()).collect();
        assert_eq!(bids, vec![298_000_000_000_000, 299_000_000_000_000]);
        assert_eq!(
            response.asks.values().next(),
            Some(&ScaledDecimal::from_raw(30_000_000))
        );
    }

    #[test]
    fn unset_prices_read_as_zero() {
        let response: MarketResponse = serde_json::from_value(json!({
            "success": false,
            "code": "OrderNotFound",
            "current_price": "",
            "left": ""
        }))
        .unwrap();

        assert!(response.current_price.is_zero());
        assert!(response.left.is_zero());
    }

    #[test]
    fn book_survives_an_unknown_side_code() {
        let order = |id: &str, side: &str| {
            json!({
                "Id": id, "Price": "300000000000000", "LeftAmount": "10000000",
                "FilledAmount": "0", "LeftFunds": "", "FilledFunds": "", "Uid": "u1", "Side": side
            })
        };
        let response: OrderBookResponse = serde_json::from_value(json!({
            "success": true,
            "bids": [order("o-1", "1"), order("o-2", "")],
            "asks": [order("o-3", "7")]
        }))
        .unwrap();

        assert_eq!(response.bids[0].side, Some(Side::Bid));
        assert_eq!(response.bids[1].side, None);
        assert_eq!(response.asks[0].side, None);
    }

    #[test]
    fn market_orders_carry_funds() {
        let request = MarketOrderRequest {
            market: "BTC/USDT".to_string(),
            user_id: "u2".to_string(),
            id: String::new(),
            price: ScaledDecimal::ZERO,
            amount: ScaledDecimal::from_raw(30_000_000),
            funds: ScaledDecimal::from_raw(900_000_000_000),
            side: Side::Bid,
            order_type: OrderType::Market,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["funds"], "900000000000");
        assert_eq!(value["type"], "2");
        assert_eq!(value["userId"], "u2");
    }
}
