//! # Scenarios
//!
//! End-to-end runs against a live engine: create a market, fund fresh accounts, trade, and
//! check every balance movement with exact integer arithmetic.
//!
//! Account and ledger identifiers carry a per-run suffix so a scenario can be repeated
//! against the same engine. Markets are shared, their creation is idempotent.
use crate::cli::ScenarioName;
use anyhow::{Context, ensure};
use colored::*;
use exchange_client::{
    CallOptions, ExchangeClients, Outcome, ScaledDecimal,
    client::{
        OrderType, Side,
        account::{
            AccountOrderRequest, AlterRequest, BalanceItem, BalanceQueryRequest,
            CreateAccountRequest, QueryOrderRequest,
        },
        market::{CreateMarketRequest, MarketOrderRequest},
        quotation::MarketRequest,
    },
};
use std::time::{SystemTime, UNIX_EPOCH};

pub async fn run(
    name: ScenarioName,
    clients: &ExchangeClients,
    options: CallOptions,
) -> anyhow::Result<()> {
    let run = Run::new(clients, options);

    match name {
        ScenarioName::CancelOrder => cancel_order(&run).await,
        ScenarioName::BuySell => buy_sell(&run).await,
        ScenarioName::MarketOrder => market_order(&run).await,
    }?;

    println!("\n{}", "Scenario passed".green().bold());
    Ok(())
}

struct Run<'a> {
    clients: &'a ExchangeClients,
    options: CallOptions,
    suffix: u128,
}

impl<'a> Run<'a> {
    fn new(clients: &'a ExchangeClients, options: CallOptions) -> Self {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        Self {
            clients,
            options,
            suffix,
        }
    }

    fn id(&self, base: &str) -> String {
        format!("{base}_{}", self.suffix)
    }

    fn step(&self, message: &str) {
        println!("{} {}", "==>".cyan().bold(), message);
    }

    async fn create_market(
        &self,
        name: &str,
        base: &str,
        quote: &str,
        min_amount: ScaledDecimal,
    ) -> anyhow::Result<()> {
        self.step(&format!("CreateMarket {name}"));

        let response = self
            .clients
            .market
            .create_market()
            .call_with(
                CreateMarketRequest {
                    name: name.to_string(),
                    token1: base.to_string(),
                    token2: quote.to_string(),
                    min_amount,
                    // Raw fee values, passed through as the engine expects them.
                    taker_fee: ScaledDecimal::from_raw(100),
                    maker_fee: ScaledDecimal::from_raw(80),
                },
                self.options.clone(),
            )
            .await?;

        if !response.success {
            tracing::warn!(market = name, "market exists with other parameters, reusing it");
        }
        Ok(())
    }

    async fn create_account(&self, user: &str) -> anyhow::Result<()> {
        let response = self
            .clients
            .account
            .create_account()
            .call_with(
                CreateAccountRequest {
                    user_id: user.to_string(),
                },
                self.options.clone(),
            )
            .await?;

        ensure!(response.user_id == user, "CreateAccount echoed {}", response.user_id);
        Ok(())
    }

    async fn deposit(&self, user: &str, token: &str, amount: ScaledDecimal) -> anyhow::Result<()> {
        let biz_id = format!("dep-{user}-{token}");

        self.clients
            .account
            .alter()
            .call_with(
                AlterRequest::deposit(user, token, amount, biz_id),
                self.options.clone(),
            )
            .await?
            .into_result()
            .with_context(|| format!("Deposit of {token} for {user}"))?;

        Ok(())
    }

    async fn balance(&self, user: &str, token: &str) -> anyhow::Result<BalanceItem> {
        let response = self
            .clients
            .account
            .query_balance()
            .call_with(
                BalanceQueryRequest {
                    user_id: user.to_string(),
                    tokens: vec![token.to_string()],
                },
                self.options.clone(),
            )
            .await?
            .into_result()?;

        let item = response.balance(token);
        println!(
            "    {user} {token}: available={} frozen={}",
            human(item.available),
            human(item.frozen)
        );
        Ok(item)
    }

    async fn open_orders(&self, market: &str, user: &str) -> anyhow::Result<Vec<String>> {
        let list = self
            .clients
            .account
            .query_user_order()
            .call_with(orders_of(market, user), self.options.clone())
            .await?
            .into_result()?;

        Ok(list.orders.into_iter().map(|o| o.id).collect())
    }
}

fn orders_of(market: &str, user: &str) -> QueryOrderRequest {
    QueryOrderRequest {
        market: market.to_string(),
        user_id: user.to_string(),
        limit: 100,
        offset: 0,
    }
}

fn human(value: ScaledDecimal) -> String {
    value
        .to_decimal()
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn scaled(value: f64) -> anyhow::Result<ScaledDecimal> {
    Ok(ScaledDecimal::from_f64(value)?)
}

async fn cancel_order(run: &Run<'_>) -> anyhow::Result<()> {
    const MARKET: &str = "BTC/USDT";
    let user = run.id("test_user");
    let deposit_btc = scaled(0.01)?;
    let deposit_usdt = ScaledDecimal::from_units(1000);

    run.create_market(MARKET, "BTC", "USDT", scaled(0.0001)?).await?;

    run.step(&format!("CreateAccount {user} and deposit 0.01 BTC, 1000 USDT"));
    run.create_account(&user).await?;
    run.deposit(&user, "BTC", deposit_btc).await?;
    run.deposit(&user, "USDT", deposit_usdt).await?;

    let btc = run.balance(&user, "BTC").await?;
    let usdt = run.balance(&user, "USDT").await?;
    ensure!(btc.available == deposit_btc && btc.frozen.is_zero(), "BTC deposit mismatch");
    ensure!(usdt.available == deposit_usdt && usdt.frozen.is_zero(), "USDT deposit mismatch");

    let order = AccountOrderRequest {
        market: MARKET.to_string(),
        user_id: user.clone(),
        id: String::new(),
        price: ScaledDecimal::from_units(30000),
        amount: scaled(0.005)?,
        side: Side::Bid,
        order_type: OrderType::Limit,
        source: "exchange-cli".to_string(),
    };
    let expected_frozen = ScaledDecimal::funds(order.price, order.amount)?;

    run.step("PutOrder BID 0.005 BTC @ 30000");
    let placed = run
        .clients
        .account
        .put_order()
        .call_with(order.clone(), run.options.clone())
        .await?
        .into_result()?;
    let placed = placed.order.context("PutOrder returned no order")?;
    ensure!(placed.price == order.price, "Order price differs from the request");
    ensure!(placed.left_amount == order.amount, "LeftAmount differs from the request");

    let usdt = run.balance(&user, "USDT").await?;
    ensure!(usdt.frozen == expected_frozen, "USDT frozen should be price*amount");
    ensure!(
        usdt.available == deposit_usdt.checked_sub(expected_frozen)?,
        "USDT available should drop by the frozen funds"
    );
    ensure!(
        run.open_orders(MARKET, &user).await?.contains(&placed.id),
        "Placed order missing from the open orders"
    );

    run.step(&format!("CancelUserOrder {}", placed.id));
    run.clients
        .account
        .cancel_user_order()
        .call_with(
            AccountOrderRequest {
                id: placed.id.clone(),
                ..order
            },
            run.options.clone(),
        )
        .await?
        .into_result()?;

    let usdt = run.balance(&user, "USDT").await?;
    ensure!(usdt.frozen.is_zero(), "USDT frozen should be released");
    ensure!(usdt.available == deposit_usdt, "USDT available should be restored");
    ensure!(
        !run.open_orders(MARKET, &user).await?.contains(&placed.id),
        "Cancelled order still open"
    );

    Ok(())
}

async fn buy_sell(run: &Run<'_>) -> anyhow::Result<()> {
    const MARKET: &str = "TRX/USDT";
    let buyer = run.id("user_trx_a");
    let seller = run.id("user_trx_b");
    let price = scaled(0.3)?;
    let amount = ScaledDecimal::from_units(3);
    let hundred = ScaledDecimal::from_units(100);

    run.create_market(MARKET, "TRX", "USDT", ScaledDecimal::from_units(1)).await?;

    run.step("Fund buyer with 100 USDT and seller with 100 TRX");
    run.create_account(&buyer).await?;
    run.create_account(&seller).await?;
    run.deposit(&buyer, "USDT", hundred).await?;
    run.deposit(&seller, "TRX", hundred).await?;

    let order = |user: &str, side| AccountOrderRequest {
        market: MARKET.to_string(),
        user_id: user.to_string(),
        id: String::new(),
        price,
        amount,
        side,
        order_type: OrderType::Limit,
        source: "exchange-cli".to_string(),
    };

    run.step("Seller asks 3 TRX @ 0.3");
    run.clients
        .account
        .put_order()
        .call_with(order(&seller, Side::Ask), run.options.clone())
        .await?
        .into_result()?;

    let trx = run.balance(&seller, "TRX").await?;
    ensure!(trx.frozen == amount, "Seller TRX frozen should equal the ask amount");

    run.step("Buyer bids 3 TRX @ 0.3");
    run.clients
        .account
        .put_order()
        .call_with(order(&buyer, Side::Bid), run.options.clone())
        .await?
        .into_result()?;

    let cost = ScaledDecimal::funds(price, amount)?;

    let buyer_trx = run.balance(&buyer, "TRX").await?;
    let buyer_usdt = run.balance(&buyer, "USDT").await?;
    ensure!(buyer_trx.available == amount, "Buyer should hold the traded TRX");
    ensure!(
        buyer_usdt.available == hundred.checked_sub(cost)?,
        "Buyer should have paid price*amount"
    );

    let seller_trx = run.balance(&seller, "TRX").await?;
    let seller_usdt = run.balance(&seller, "USDT").await?;
    ensure!(
        seller_trx.available == hundred.checked_sub(amount)? && seller_trx.frozen.is_zero(),
        "Seller TRX should be settled"
    );
    ensure!(seller_usdt.available == cost, "Seller should receive price*amount");

    let latest = run
        .clients
        .quotation
        .query_latest()
        .call_with(
            MarketRequest {
                market: MARKET.to_string(),
                limit: 10,
            },
            run.options.clone(),
        )
        .await?;
    println!("    latest price on {MARKET}: {}", human(latest.price));

    Ok(())
}

async fn market_order(run: &Run<'_>) -> anyhow::Result<()> {
    const MARKET: &str = "BTC/USDT";
    let seller = run.id("user_A_market_test");
    let buyer = run.id("user_B_market_test");
    let price = ScaledDecimal::from_units(30000);
    let sell_total = scaled(0.009)?;
    let chunk = scaled(0.003)?;

    run.create_market(MARKET, "BTC", "USDT", scaled(0.0001)?).await?;

    run.step("Fund seller with 0.01 BTC and buyer with 1000 USDT");
    run.create_account(&seller).await?;
    run.create_account(&buyer).await?;
    run.deposit(&seller, "BTC", scaled(0.01)?).await?;
    run.deposit(&buyer, "USDT", ScaledDecimal::from_units(1000)).await?;

    run.step("Seller asks 0.009 BTC @ 30000");
    let placed = run
        .clients
        .account
        .put_order()
        .call_with(
            AccountOrderRequest {
                market: MARKET.to_string(),
                user_id: seller.clone(),
                id: String::new(),
                price,
                amount: sell_total,
                side: Side::Ask,
                order_type: OrderType::Limit,
                source: "exchange-cli".to_string(),
            },
            run.options.clone(),
        )
        .await?
        .into_result()?;
    let order_id = placed.order.context("PutOrder returned no order")?.id;

    let btc = run.balance(&seller, "BTC").await?;
    ensure!(btc.frozen == sell_total, "Seller BTC frozen should equal the ask amount");

    let mut previous_btc = run.balance(&buyer, "BTC").await?.available;

    for round in 1..=3 {
        run.step(&format!("Market buy {round}/3 of 0.003 BTC"));

        run.clients
            .market
            .put_market_order()
            .call_with(
                MarketOrderRequest {
                    market: MARKET.to_string(),
                    user_id: buyer.clone(),
                    id: String::new(),
                    price: ScaledDecimal::ZERO,
                    amount: chunk,
                    funds: ScaledDecimal::funds(price, chunk)?,
                    side: Side::Bid,
                    order_type: OrderType::Market,
                },
                run.options.clone(),
            )
            .await?
            .into_result()?;

        let btc = run.balance(&buyer, "BTC").await?.available;
        ensure!(btc > previous_btc, "Buyer BTC should grow on every fill");
        previous_btc = btc;
    }

    ensure!(
        !run.open_orders(MARKET, &seller).await?.contains(&order_id),
        "Fully filled ask still open"
    );

    let finished = run
        .clients
        .account
        .query_finished_order()
        .call_with(orders_of(MARKET, &seller), run.options.clone())
        .await?;
    ensure!(
        finished.orders.iter().any(|o| o.id == order_id),
        "Fully filled ask missing from the finished orders"
    );

    let btc = run.balance(&seller, "BTC").await?;
    ensure!(btc.frozen.is_zero(), "Seller BTC should be released");

    Ok(())
}
