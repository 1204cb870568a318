//! # Account Façade
//!
//! The ledger side of the exchange: accounts, balance mutations and the order lifecycle as
//! seen by one user.
use super::types::{AlterAction, BizType, OrderType, Side, impl_outcome, reported_side};
use crate::{
    binder::{Invoke, ServiceBinder, UnaryMethod},
    decimal::ScaledDecimal,
    error::{BindError, CodecError},
    schema::SchemaRegistry,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAccountResponse {
    pub user_id: String,
}

/// Credits or debits a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlterRequest {
    pub token: String,
    pub action: AlterAction,
    pub amount: ScaledDecimal,
    pub fee: ScaledDecimal,
    pub user_id: String,
    pub biz_type: BizType,
    /// Caller chosen identifier of the ledger entry.
    pub biz_id: String,
}

impl AlterRequest {
    /// A fee-free deposit of `amount` of `token`.
    pub fn deposit(
        user_id: impl Into<String>,
        token: impl Into<String>,
        amount: ScaledDecimal,
        biz_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            action: AlterAction::Credit,
            amount,
            fee: ScaledDecimal::ZERO,
            user_id: user_id.into(),
            biz_type: BizType::Deposit,
            biz_id: biz_id.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountResponse {
    pub success: bool,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQueryRequest {
    pub user_id: String,
    pub tokens: Vec<String>,
}

/// One token balance. `available + frozen == total` once every operation has settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceItem {
    pub total: ScaledDecimal,
    pub frozen: ScaledDecimal,
    pub available: ScaledDecimal,
}

impl BalanceItem {
    pub fn is_consistent(&self) -> Result<bool, CodecError> {
        Ok(self.available.checked_add(self.frozen)? == self.total)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceResponse {
    pub success: bool,
    pub data: HashMap<String, BalanceItem>,
}

impl BalanceResponse {
    /// The balance of `token`, zero when the engine did not report it.
    pub fn balance(&self, token: &str) -> BalanceItem {
        self.data.get(token).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOrderRequest {
    pub market: String,
    pub user_id: String,
    /// Empty when placing, the engine assigns it.
    pub id: String,
    pub price: ScaledDecimal,
    pub amount: ScaledDecimal,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBatchOrderRequest {
    pub orders: Vec<AccountOrderRequest>,
}

/// An order as recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountOrderModel {
    pub id: String,
    #[serde(default)]
    pub create_time: i64,
    pub price: ScaledDecimal,
    pub user_id: String,
    #[serde(default, deserialize_with = "reported_side")]
    pub side: Option<Side>,
    pub left_amount: ScaledDecimal,
    pub left_funds: ScaledDecimal,
    pub filled_funds: ScaledDecimal,
    pub filled_amount: ScaledDecimal,
    pub market: String,
    #[serde(rename = "Type")]
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountOrderResponse {
    pub success: bool,
    pub code: String,
    pub order: Option<AccountOrderModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountBatchOrderResponse {
    pub response: Vec<AccountOrderResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOrderRequest {
    pub market: String,
    pub user_id: String,
    pub limit: i32,
    pub offset: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountOrderList {
    pub success: bool,
    pub orders: Vec<AccountOrderModel>,
}

impl AccountOrderList {
    pub fn find(&self, id: &str) -> Option<&AccountOrderModel> {
        self.orders.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishedOrderResponse {
    pub success: bool,
    pub orders: Vec<AccountOrderModel>,
}

impl_outcome!(with_code: AccountResponse, AccountOrderResponse);
impl_outcome!(BalanceResponse, AccountOrderList, FinishedOrderResponse);

/// The `Account` service, every method bound at construction.
#[derive(Debug, Clone)]
pub struct AccountClient {
    create_account: UnaryMethod<CreateAccountRequest, CreateAccountResponse>,
    alter: UnaryMethod<AlterRequest, AccountResponse>,
    query_balance: UnaryMethod<BalanceQueryRequest, BalanceResponse>,
    batch_put_order: UnaryMethod<AccountBatchOrderRequest, AccountBatchOrderResponse>,
    put_order: UnaryMethod<AccountOrderRequest, AccountOrderResponse>,
    cancel_all_order: UnaryMethod<QueryOrderRequest, AccountOrderResponse>,
    cancel_user_order: UnaryMethod<AccountOrderRequest, AccountOrderResponse>,
    batch_cancel_user_order: UnaryMethod<AccountBatchOrderRequest, AccountBatchOrderResponse>,
    query_user_order: UnaryMethod<QueryOrderRequest, AccountOrderList>,
    query_history_order: UnaryMethod<QueryOrderRequest, AccountOrderList>,
    query_finished_order: UnaryMethod<QueryOrderRequest, FinishedOrderResponse>,
}

impl AccountClient {
    pub const SERVICE: &'static str = "Account";

    pub(crate) fn bind(
        invoker: &Arc<dyn Invoke>,
        registry: &SchemaRegistry,
    ) -> Result<Self, BindError> {
        let binder = ServiceBinder::new(invoker, registry, Self::SERVICE)?;

        Ok(Self {
            create_account: binder.bind("CreateAccount")?,
            alter: binder.bind("Alter")?,
            query_balance: binder.bind("QueryBalance")?,
            batch_put_order: binder.bind("BatchPutOrder")?,
            put_order: binder.bind("PutOrder")?,
            cancel_all_order: binder.bind("CancelAllOrder")?,
            cancel_user_order: binder.bind("CancelUserOrder")?,
            batch_cancel_user_order: binder.bind("BatchCancelUserOrder")?,
            query_user_order: binder.bind("QueryUserOrder")?,
            query_history_order: binder.bind("QueryHistoryOrder")?,
            query_finished_order: binder.bind("QueryFinishedOrder")?,
        })
    }

    pub fn create_account(&self) -> &UnaryMethod<CreateAccountRequest, CreateAccountResponse> {
        &self.create_account
    }

    /// Mutates a balance (`"Alter"` on the wire).
    pub fn alter(&self) -> &UnaryMethod<AlterRequest, AccountResponse> {
        &self.alter
    }

    pub fn query_balance(&self) -> &UnaryMethod<BalanceQueryRequest, BalanceResponse> {
        &self.query_balance
    }

    pub fn batch_put_order(
        &self,
    ) -> &UnaryMethod<AccountBatchOrderRequest, AccountBatchOrderResponse> {
        &self.batch_put_order
    }

    /// Places an order. A BID freezes `funds(price, amount)` of the quote token, an ASK
    /// freezes `amount` of the base token.
    pub fn put_order(&self) -> &UnaryMethod<AccountOrderRequest, AccountOrderResponse> {
        &self.put_order
    }

    pub fn cancel_all_order(&self) -> &UnaryMethod<QueryOrderRequest, AccountOrderResponse> {
        &self.cancel_all_order
    }

    pub fn cancel_user_order(&self) -> &UnaryMethod<AccountOrderRequest, AccountOrderResponse> {
        &self.cancel_user_order
    }

    pub fn batch_cancel_user_order(
        &self,
    ) -> &UnaryMethod<AccountBatchOrderRequest, AccountBatchOrderResponse> {
        &self.batch_cancel_user_order
    }

    /// Open orders of a user.
    pub fn query_user_order(&self) -> &UnaryMethod<QueryOrderRequest, AccountOrderList> {
        &self.query_user_order
    }

    pub fn query_history_order(&self) -> &UnaryMethod<QueryOrderRequest, AccountOrderList> {
        &self.query_history_order
    }

    pub fn query_finished_order(&self) -> &UnaryMethod<QueryOrderRequest, FinishedOrderResponse> {
        &self.query_finished_order
    }
}
