use exchange_client::ScaledDecimal;
use exchange_client::client::account::{
    AccountOrderRequest, AlterRequest, BalanceItem, BalanceQueryRequest, CreateAccountRequest,
    QueryOrderRequest,
};
use exchange_client::client::market::{CreateMarketRequest, MarketOrderRequest};
use exchange_client::client::{ExchangeClients, OrderType, Side};
use exchange_engine_impl::{ExchangeEngine, connect};


const MARKET: &str = "BTC/USDT";
const SELLER: &str = "user_A_market_test";
const BUYER: &str = "user_B_market_test";

fn scaled(value: f64) -> ScaledDecimal {
    ScaledDecimal::from_f64(value).unwrap()
}

async fn setup() -> ExchangeClients {
    let clients = connect(&ExchangeEngine::new());

    clients
        .market
        .create_market()
        .call(CreateMarketRequest {
            name: MARKET.to_string(),
            token1: "BTC".to_string(),
            token2: "USDT".to_string(),
            min_amount: scaled(0.0001),
            taker_fee: ScaledDecimal::from_raw(100),
            maker_fee: ScaledDecimal::from_raw(80),
        })
        .await
        .unwrap();

    for user in [SELLER, BUYER] {
        clients
            .account
            .create_account()
            .call(CreateAccountRequest {
                user_id: user.to_string(),
            })
            .await
            .unwrap();
    }

    let deposits = [
        AlterRequest::deposit(SELLER, "BTC", scaled(0.01), "dep-a-btc-1"),
        AlterRequest::deposit(BUYER, "USDT", ScaledDecimal::from_units(1000), "dep-b-usdt-1"),
    ];
    for deposit in deposits {
        assert!(clients.account.alter().call(deposit).await.unwrap().success);
    }

    clients
}

async fn balance(clients: &ExchangeClients, user: &str, token: &str) -> BalanceItem {
    clients
        .account
        .query_balance()
        .call(BalanceQueryRequest {
            user_id: user.to_string(),
            tokens: vec![token.to_string()],
        })
        .await
        .unwrap()
        .balance(token)
}

fn orders_of(user: &str) -> QueryOrderRequest {
    QueryOrderRequest {
        market: MARKET.to_string(),
        user_id: user.to_string(),
        limit: 100,
        offset: 0,
    }
}

async fn place_ask(clients: &ExchangeClients, amount: ScaledDecimal) -> String {
    let placed = clients
        .account
        .put_order()
        .call(AccountOrderRequest {
            market: MARKET.to_string(),
            user_id: SELLER.to_string(),
            id: String::new(),
            price: ScaledDecimal::from_units(30000),
            amount,
            side: Side::Ask,
            order_type: OrderType::Limit,
            source: "test-market-order".to_string(),
        })
        .await
        .unwrap();

    assert!(placed.success, "{placed:?}");
    placed.order.unwrap().id
}

fn market_buy(amount: ScaledDecimal) -> MarketOrderRequest {
    MarketOrderRequest {
        market: MARKET.to_string(),
        user_id: BUYER.to_string(),
        id: String::new(),
        price: ScaledDecimal::ZERO,
        amount,
        funds: ScaledDecimal::funds(ScaledDecimal::from_units(30000), amount).unwrap(),
        side: Side::Bid,
        order_type: OrderType::Market,
    }
}

#[tokio::test]
async fn test_ask_freezes_the_base_token() {
    let clients = setup().await;
    let sell_total = scaled(0.009);

    let order_id = place_ask(&clients, sell_total).await;

    let btc = balance(&clients, SELLER, "BTC").await;
    assert_eq!(btc.frozen, sell_total);
    assert_eq!(btc.available.checked_add(btc.frozen).unwrap(), scaled(0.01));

    let open = clients
        .account
        .query_user_order()
        .call(orders_of(SELLER))
        .await
        .unwrap();
    assert_eq!(open.find(&order_id).unwrap().left_amount, sell_total);
}

#[tokio::test]
async fn test_market_buys_consume_the_resting_order() {
    let clients = setup().await;
    let sell_total = scaled(0.009);
    let chunk = scaled(0.003);

    let order_id = place_ask(&clients, sell_total).await;

    let mut previous_left = sell_total;
    let mut previous_btc = balance(&clients, BUYER, "BTC").await.available;

    for _ in 0..3 {
        let filled = clients
            .market
            .put_market_order()
            .call(market_buy(chunk))
            .await
            .unwrap();
        assert!(filled.success, "{filled:?}");

        let open = clients
            .account
            .query_user_order()
            .call(orders_of(SELLER))
            .await
            .unwrap();
        let left = open
            .find(&order_id)
            .map(|o| o.left_amount)
            .unwrap_or(ScaledDecimal::ZERO);
        assert!(left < previous_left, "remaining amount must decrease");
        previous_left = left;

        let btc = balance(&clients, BUYER, "BTC").await.available;
        assert!(btc > previous_btc, "buyer must receive BTC on every fill");
        previous_btc = btc;
    }

    assert!(previous_left.is_zero());

    let open = clients
        .account
        .query_user_order()
        .call(orders_of(SELLER))
        .await
        .unwrap();
    assert!(open.find(&order_id).is_none());

    let finished = clients
        .account
        .query_finished_order()
        .call(orders_of(SELLER))
        .await
        .unwrap();
    let order = finished.orders.iter().find(|o| o.id == order_id).unwrap();
    assert!(order.left_amount.is_zero());
    assert_eq!(order.filled_amount, sell_total);

    let seller_btc = balance(&clients, SELLER, "BTC").await;
    assert!(seller_btc.frozen.is_zero());
    assert_eq!(
        seller_btc.available,
        scaled(0.01).checked_sub(sell_total).unwrap()
    );

    let buyer_btc = balance(&clients, BUYER, "BTC").await;
    assert_eq!(buyer_btc.available, sell_total);

    // 0.009 BTC at 30000 = 270 USDT
    let buyer_usdt = balance(&clients, BUYER, "USDT").await;
    assert_eq!(buyer_usdt.available, ScaledDecimal::from_units(730));
    assert!(buyer_usdt.frozen.is_zero());
}

#[tokio::test]
async fn test_market_order_against_an_empty_book_releases_funds() {
    let clients = setup().await;

    let response = clients
        .market
        .put_market_order()
        .call(market_buy(scaled(0.003)))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.left, scaled(0.003));

    let usdt = balance(&clients, BUYER, "USDT").await;
    assert!(usdt.frozen.is_zero());
    assert_eq!(usdt.available, ScaledDecimal::from_units(1000));
}

#[tokio::test]
async fn test_book_and_quotation_reflect_fills() {
    let clients = setup().await;
    let order_id = place_ask(&clients, scaled(0.009)).await;

    clients
        .market
        .put_market_order()
        .call(market_buy(scaled(0.003)))
        .await
        .unwrap();

    let exists = clients
        .market
        .is_order_exist()
        .call(MarketOrderRequest {
            id: order_id.clone(),
            ..market_buy(scaled(0.003))
        })
        .await
        .unwrap();
    assert!(exists.exists);

    let detail = clients
        .market
        .query_order_detail()
        .call(MarketOrderRequest {
            id: order_id,
            ..market_buy(scaled(0.003))
        })
        .await
        .unwrap();
    let data = detail.data.unwrap();
    assert_eq!(data.left_amount, scaled(0.006));
    assert_eq!(data.filled_amount, scaled(0.003));
    assert_eq!(data.side, Some(Side::Ask));

    let depth_request = exchange_client::client::market::DepthRequest {
        market: MARKET.to_string(),
        limit: 10,
        group: 0,
    };

    let depth = clients
        .market
        .get_depth_merge()
        .call(depth_request.clone())
        .await
        .unwrap();
    assert_eq!(depth.current_price, ScaledDecimal::from_units(30000));
    assert_eq!(
        depth.asks.get(&ScaledDecimal::from_units(30000)),
        Some(&scaled(0.006))
    );
    assert!(depth.bids.is_empty());

    let count = clients
        .market
        .query_order_count()
        .call(depth_request.clone())
        .await
        .unwrap();
    assert_eq!((count.ask, count.bid), (1, 0));

    let deals = clients
        .market
        .query_latest_deal_record()
        .call(depth_request)
        .await
        .unwrap();
    assert_eq!(deals.data.len(), 1);
    assert_eq!(deals.data[0].amount, scaled(0.003));
    assert_eq!(deals.data[0].side, Some(Side::Bid));

    let price = clients
        .quotation
        .query_latest_price()
        .call(exchange_client::client::quotation::MarketRequest {
            market: MARKET.to_string(),
            limit: 10,
        })
        .await
        .unwrap();
    assert!(price.success);
    assert_eq!(price.price, ScaledDecimal::from_units(30000));
    assert_eq!(price.volume, scaled(0.003));
    assert_eq!(price.value, ScaledDecimal::from_units(90));
}
