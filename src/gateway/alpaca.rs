//! # gateway::alpaca
//!
//! **Alpaca REST client** — implements both [`Broker`] and [`MarketData`].
//!
//! ## Endpoints
//! ```text
//! POST {base}/v2/orders                         submit market order
//! GET  {base}/v2/positions/{symbol}             404 = no position
//! GET  {data}/v2/stocks/{symbol}/trades/latest  last trade price
//! GET  {data}/v2/stocks/{symbol}/bars           historical bars (paged)
//! ```
//!
//! Every call carries the configured per-request timeout. With `dry_run`
//! enabled orders are logged and acknowledged locally; reads still hit the API.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AlpacaConfig;
use crate::error::AgentError;
use crate::gateway::{BarsRequest, Broker, MarketData};
use crate::models::bar::normalize;
use crate::models::{Bar, BrokerPosition, LatestTrade, OrderReceipt, OrderRequest, OrderSide};

/// Largest page the bars endpoint serves.
const MAX_PAGE: usize = 10_000;

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OrderPayload<'a> {
    symbol:          &'a str,
    qty:             String,
    side:            &'static str,
    #[serde(rename = "type")]
    order_type:      &'static str,
    time_in_force:   &'static str,
    client_order_id: String,
}

impl<'a> From<&'a OrderRequest> for OrderPayload<'a> {
    fn from(order: &'a OrderRequest) -> Self {
        Self {
            symbol:          &order.symbol,
            qty:             order.quantity.to_string(),
            side:            match order.side {
                OrderSide::Buy  => "buy",
                OrderSide::Sell => "sell",
            },
            order_type:      "market",
            time_in_force:   "day",
            client_order_id: order.client_order_id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id:     String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    qty:             String,
    avg_entry_price: String,
}

#[derive(Debug, Deserialize)]
struct LatestTradeResponse {
    trade: TradePrint,
}

#[derive(Debug, Deserialize)]
struct TradePrint {
    #[serde(rename = "p")]
    price: f64,
}

#[derive(Debug, Deserialize)]
struct BarsPage {
    /// `null` when the range holds no bars
    #[serde(default)]
    bars:            Option<Vec<Bar>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct AlpacaClient {
    config: AlpacaConfig,
    client: reqwest::Client,
}

impl AlpacaClient {
    pub fn new(config: AlpacaConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.config.api_key)
            .header("APCA-API-SECRET-KEY", &self.config.api_secret)
            .timeout(self.config.request_timeout)
    }

    async fn send(&self, builder: RequestBuilder, context: &str) -> Result<Response, AgentError> {
        self.authed(builder)
            .send()
            .await
            .map_err(|e| AgentError::from_transport(context, e))
    }

    async fn fetch_bars_page(
        &self,
        request: &BarsRequest,
        page_limit: usize,
        page_token: Option<&str>,
    ) -> Result<BarsPage, AgentError> {
        let url = format!("{}/v2/stocks/{}/bars", self.config.data_url, request.symbol);

        let mut query: Vec<(&str, String)> = vec![
            ("timeframe", request.timeframe.clone()),
            ("start",     request.start.format("%Y-%m-%d").to_string()),
            ("end",       request.end.format("%Y-%m-%d").to_string()),
            ("limit",     page_limit.to_string()),
            // newest first, so the limit trims the oldest bars
            ("sort",      "desc".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token.to_string()));
        }

        let resp = self.send(self.client.get(&url).query(&query), "bars").await?;
        decode(resp, "bars").await
    }
}

/// Checks the status and parses a JSON body.
async fn decode<T: DeserializeOwned>(resp: Response, context: &str) -> Result<T, AgentError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AgentError::Gateway {
            status:  status.as_u16(),
            message: format!("{context}: {body}"),
        });
    }

    resp.json::<T>()
        .await
        .map_err(|e| AgentError::InvalidResponse(format!("{context}: {e}")))
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64, AgentError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AgentError::InvalidResponse(format!("{field} is not a number: '{raw}'")))
}

// ─── Broker ───────────────────────────────────────────────────────────────────

#[async_trait]
impl Broker for AlpacaClient {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, AgentError> {
        if self.config.dry_run {
            info!(
                symbol   = %order.symbol,
                side     = %order.side,
                quantity = order.quantity,
                "🎭 [BROKER] DRY RUN — order not sent"
            );
            return Ok(OrderReceipt {
                order_id:        format!("dry-run-{}", Uuid::new_v4()),
                client_order_id: order.client_order_id,
                status:          "dry_run".to_string(),
            });
        }

        let url = format!("{}/v2/orders", self.config.base_url);
        let payload = OrderPayload::from(order);

        info!(
            symbol   = %order.symbol,
            side     = %order.side,
            quantity = order.quantity,
            url      = %url,
            "🚀 [BROKER] Submitting market order"
        );

        let resp = self.send(self.client.post(&url).json(&payload), "submit order").await?;
        let body: OrderResponse = decode(resp, "submit order").await?;

        info!(order_id = %body.id, status = %body.status, "✅ [BROKER] Order accepted");

        Ok(OrderReceipt {
            order_id:        body.id,
            client_order_id: order.client_order_id,
            status:          body.status,
        })
    }

    async fn latest_trade(&self, symbol: &str) -> Result<LatestTrade, AgentError> {
        let url = format!("{}/v2/stocks/{symbol}/trades/latest", self.config.data_url);
        let resp = self.send(self.client.get(&url), "latest trade").await?;
        let body: LatestTradeResponse = decode(resp, "latest trade").await?;

        if !(body.trade.price.is_finite() && body.trade.price > 0.0) {
            return Err(AgentError::InvalidResponse(format!(
                "latest trade price for {symbol} is {}",
                body.trade.price
            )));
        }

        debug!(symbol, price = body.trade.price, "Latest trade");
        Ok(LatestTrade { price: body.trade.price })
    }

    async fn position(&self, symbol: &str) -> Result<BrokerPosition, AgentError> {
        let url = format!("{}/v2/positions/{symbol}", self.config.base_url);
        let resp = self.send(self.client.get(&url), "position").await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AgentError::PositionNotFound(symbol.to_string()));
        }

        let body: PositionResponse = decode(resp, "position").await?;
        Ok(BrokerPosition {
            avg_entry_price: parse_decimal("avg_entry_price", &body.avg_entry_price)?,
            quantity:        parse_decimal("qty", &body.qty)?.abs(),
        })
    }
}

// ─── Market Data ──────────────────────────────────────────────────────────────

#[async_trait]
impl MarketData for AlpacaClient {
    async fn bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, AgentError> {
        let mut collected: Vec<Bar> = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let remaining = request.limit.saturating_sub(collected.len());
            if remaining == 0 {
                break;
            }

            let page = self
                .fetch_bars_page(request, remaining.min(MAX_PAGE), token.as_deref())
                .await?;
            collected.extend(page.bars.unwrap_or_default());

            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        if collected.len() > request.limit {
            warn!(got = collected.len(), limit = request.limit, "Provider over-delivered bars");
            collected.truncate(request.limit);
        }

        let bars = normalize(collected);
        debug!(
            symbol = %request.symbol,
            count  = bars.len(),
            start  = %request.start,
            end    = %request.end,
            "Bars fetched"
        );
        Ok(bars)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
