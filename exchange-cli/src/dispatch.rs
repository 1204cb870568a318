//! Routes a `Service/Method` pair from the command line to the typed façade method.
//!
//! The body goes through the typed request first, so the same validation applies as for
//! library callers (decimal strings, enum codes).
use anyhow::Context;
use exchange_client::{CallOptions, ExchangeClients, SchemaRegistry, UnaryMethod};
use serde::{Serialize, de::DeserializeOwned};

/// Invokes `service/method` with a JSON body and returns the response as JSON.
///
/// `service` may be the short or fully qualified name.
pub async fn call(
    clients: &ExchangeClients,
    registry: &SchemaRegistry,
    service: &str,
    method: &str,
    body: serde_json::Value,
    options: CallOptions,
) -> anyhow::Result<serde_json::Value> {
    let descriptor = registry.method(service, method)?;
    let service = descriptor.parent_service().name().to_string();

    macro_rules! route {
        ($( $svc:literal => $field:ident { $( $name:literal => $accessor:ident ),+ $(,)? } ),+ $(,)?) => {
            match (service.as_str(), method) {
                $( $( ($svc, $name) => invoke(clients.$field.$accessor(), body, options).await, )+ )+
                _ => anyhow::bail!("{service}/{method} has no typed binding"),
            }
        };
    }

    route! {
        "Account" => account {
            "CreateAccount" => create_account,
            "Alter" => alter,
            "QueryBalance" => query_balance,
            "BatchPutOrder" => batch_put_order,
            "PutOrder" => put_order,
            "CancelAllOrder" => cancel_all_order,
            "CancelUserOrder" => cancel_user_order,
            "BatchCancelUserOrder" => batch_cancel_user_order,
            "QueryUserOrder" => query_user_order,
            "QueryHistoryOrder" => query_history_order,
            "QueryFinishedOrder" => query_finished_order,
        },
        "Market" => market {
            "CreateMarket" => create_market,
            "UpdateMarket" => update_market,
            "PutLimitOrder" => put_limit_order,
            "PutMarketOrder" => put_market_order,
            "QueryOrderDetail" => query_order_detail,
            "CancelOrder" => cancel_order,
            "QueryOrderBook" => query_order_book,
            "GetDepthMerge" => get_depth_merge,
            "QueryLatestDealRecord" => query_latest_deal_record,
            "RePublishDealOrder" => re_publish_deal_order,
            "QueryOrderCount" => query_order_count,
            "IsOrderExist" => is_order_exist,
        },
        "Quotation" => quotation {
            "QueryLatestDeal" => query_latest_deal,
            "QueryLatestPrice" => query_latest_price,
            "QueryLatest" => query_latest,
            "QueryAllMarket" => query_all_market,
        },
    }
}

async fn invoke<Req, Res>(
    method: &UnaryMethod<Req, Res>,
    body: serde_json::Value,
    options: CallOptions,
) -> anyhow::Result<serde_json::Value>
where
    Req: Serialize + DeserializeOwned,
    Res: Serialize + DeserializeOwned,
{
    let request: Req = serde_json::from_value(body)
        .with_context(|| format!("Invalid body for {}", method.name()))?;

    let response = method.call_with(request, options).await?;

    Ok(serde_json::to_value(response)?)
}
