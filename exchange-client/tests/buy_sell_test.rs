use exchange_client::ScaledDecimal;
use exchange_client::client::account::{
    AccountBatchOrderRequest, AccountOrderRequest, AlterRequest, BalanceQueryRequest,
    QueryOrderRequest,
};
use exchange_client::client::market::{CreateMarketRequest, DepthRequest};
use exchange_client::client::quotation::MarketRequest;
use exchange_client::client::{ExchangeClients, OrderType, Side};
use exchange_engine_impl::{ExchangeEngine, connect};


const MARKET: &str = "TRX/USDT";
const BUYER: &str = "user_trx_a";
const SELLER: &str = "user_trx_b";

fn scaled(value: f64) -> ScaledDecimal {
    ScaledDecimal::from_f64(value).unwrap()
}

async fn setup() -> ExchangeClients {
    let clients = connect(&ExchangeEngine::new());

    let created = clients
        .market
        .create_market()
        .call(CreateMarketRequest {
            name: MARKET.to_string(),
            token1: "TRX".to_string(),
            token2: "USDT".to_string(),
            min_amount: ScaledDecimal::from_units(1),
            taker_fee: ScaledDecimal::from_raw(100),
            maker_fee: ScaledDecimal::from_raw(80),
        })
        .await
        .unwrap();
    assert!(created.success);

    let deposits = [
        AlterRequest::deposit(BUYER, "USDT", ScaledDecimal::from_units(100), "dep-a-usdt-100"),
        AlterRequest::deposit(SELLER, "TRX", ScaledDecimal::from_units(100), "dep-b-trx-100"),
    ];
    for deposit in deposits {
        assert!(clients.account.alter().call(deposit).await.unwrap().success);
    }

    clients
}

fn order(user: &str, side: Side) -> AccountOrderRequest {
    AccountOrderRequest {
        market: MARKET.to_string(),
        user_id: user.to_string(),
        id: String::new(),
        price: scaled(0.3),
        amount: ScaledDecimal::from_units(3),
        side,
        order_type: OrderType::Limit,
        source: "test-trx-usdt".to_string(),
    }
}

async fn balances(clients: &ExchangeClients, user: &str) -> exchange_client::client::account::BalanceResponse {
    clients
        .account
        .query_balance()
        .call(BalanceQueryRequest {
            user_id: user.to_string(),
            tokens: vec!["USDT".to_string(), "TRX".to_string()],
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_crossing_limit_orders_settle_both_sides() {
    let clients = setup().await;

    let ask = clients
        .account
        .put_order()
        .call(order(SELLER, Side::Ask))
        .await
        .unwrap();
    assert!(ask.success);
    let ask_id = ask.order.unwrap().id;

    let bid = clients
        .account
        .put_order()
        .call(order(BUYER, Side::Bid))
        .await
        .unwrap();
    assert!(bid.success);
    assert!(bid.order.unwrap().left_amount.is_zero());

    let open = clients
        .account
        .query_user_order()
        .call(QueryOrderRequest {
            market: MARKET.to_string(),
            user_id: SELLER.to_string(),
            limit: 50,
            offset: 0,
        })
        .await
        .unwrap();
    assert!(open.find(&ask_id).is_none());

    // 3 TRX at 0.3 USDT = 0.9 USDT
    let buyer = balances(&clients, BUYER).await;
    assert_eq!(buyer.balance("TRX").available, ScaledDecimal::from_units(3));
    assert_eq!(buyer.balance("USDT").available, scaled(99.1));

    let seller = balances(&clients, SELLER).await;
    assert_eq!(seller.balance("TRX").available, ScaledDecimal::from_units(97));
    assert_eq!(seller.balance("USDT").available, scaled(0.9));

    for response in [&buyer, &seller] {
        for item in response.data.values() {
            assert!(item.is_consistent().unwrap());
        }
    }

    let latest = clients
        .quotation
        .query_latest()
        .call(MarketRequest {
            market: MARKET.to_string(),
            limit: 10,
        })
        .await
        .unwrap();
    assert_eq!(latest.price, scaled(0.3));
    assert_eq!(latest.deal_orders.len(), 1);
    assert_eq!(latest.change, 0.0);

    let all = clients
        .quotation
        .query_all_market()
        .call(MarketRequest::default())
        .await
        .unwrap();
    assert_eq!(all.markets.len(), 1);
    assert_eq!(all.markets[0].name, MARKET);
}

#[tokio::test]
async fn test_orders_below_the_minimum_are_rejected() {
    let clients = setup().await;

    let response = clients
        .account
        .put_order()
        .call(AccountOrderRequest {
            amount: scaled(0.5),
            ..order(SELLER, Side::Ask)
        })
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.code, "AmountTooSmall");
    assert!(response.order.is_none());
}

#[tokio::test]
async fn test_batch_orders_report_each_outcome() {
    let clients = setup().await;

    let batch = AccountBatchOrderRequest {
        orders: vec![
            order(SELLER, Side::Ask),
            AccountOrderRequest {
                amount: ScaledDecimal::from_units(1000),
                ..order(SELLER, Side::Ask)
            },
        ],
    };

    let response = clients
        .account
        .batch_put_order()
        .call(batch)
        .await
        .unwrap();

    assert_eq!(response.response.len(), 2);
    assert!(response.response[0].success);
    assert!(!response.response[1].success);
    assert_eq!(response.response[1].code, "InsufficientBalance");

    let placed = response.response[0].order.clone().unwrap();
    let canceled = clients
        .account
        .batch_cancel_user_order()
        .call(AccountBatchOrderRequest {
            orders: vec![AccountOrderRequest {
                id: placed.id,
                ..order(SELLER, Side::Ask)
            }],
        })
        .await
        .unwrap();
    assert!(canceled.response[0].success);

    let book = clients
        .market
        .query_order_book()
        .call(DepthRequest {
            market: MARKET.to_string(),
            limit: 10,
            group: 0,
        })
        .await
        .unwrap();
    assert!(book.asks.is_empty());
    assert!(book.bids.is_empty());
}
