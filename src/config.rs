//! # config — read Config from environment variables
//!
//! Everything is resolved once at startup. A missing or malformed required
//! variable aborts before the trading loop starts.

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::NaiveTime;
use chrono_tz::Tz;

// ─── Sections ─────────────────────────────────────────────────────────────────

/// Brokerage / market-data connection settings.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key:         String,
    pub api_secret:      String,
    /// Trading endpoint, e.g. `https://paper-api.alpaca.markets`
    pub base_url:        String,
    /// Market data endpoint, e.g. `https://data.alpaca.markets`
    pub data_url:        String,
    /// Per-call timeout applied to every request
    pub request_timeout: Duration,
    /// Log orders instead of sending them
    pub dry_run:         bool,
}

/// Signal and sizing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub ema_fast:      usize,
    pub ema_slow:      usize,
    /// Absolute price delta per share that triggers the exit
    pub profit_target: f64,
    /// Quantity bought on entry
    pub trade_qty:     f64,
}

/// Session clock settings, all in `timezone` local time.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub timezone:           Tz,
    pub trading_start:      NaiveTime,
    pub trading_end:        NaiveTime,
    pub report_cutoff:      NaiveTime,
    pub poll_interval:      Duration,
    pub heartbeat_interval: Duration,
    pub error_cooldown:     Duration,
    pub self_test_settle:   Duration,
}

impl Schedule {
    /// Inclusive trading window check.
    pub fn in_trading_window(&self, local: NaiveTime) -> bool {
        local >= self.trading_start && local <= self.trading_end
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────

/// All settings the agent needs for its lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    pub alpaca:             AlpacaConfig,
    pub symbol:             String,
    /// Bar granularity understood by the data API, e.g. "1Min"
    pub timeframe:          String,
    pub strategy:           StrategyParams,
    pub schedule:           Schedule,
    /// Symbol for the one-time connectivity round trip
    pub test_symbol:        String,
    pub lookback_days:      i64,
    pub bar_limit:          usize,
    /// Identical consecutive failures before escalation (0 = never)
    pub failure_escalation: u32,
    /// None = log-only notifications
    pub webhook_url:        Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let api_key = env.required("API_KEY")?;
        let api_secret = env.required("API_SECRET")?;
        let symbol = env.required("SYMBOL")?.to_uppercase();

        let ema_fast: usize = env.parse_required("EMA_FAST")?;
        let ema_slow: usize = env.parse_required("EMA_SLOW")?;
        if ema_fast == 0 || ema_slow == 0 {
            bail!("EMA_FAST and EMA_SLOW must be at least 1");
        }
        if ema_fast >= ema_slow {
            bail!("EMA_FAST ({ema_fast}) must be smaller than EMA_SLOW ({ema_slow})");
        }

        let profit_target: f64 = env.parse_required("PROFIT_TARGET")?;
        if !(profit_target.is_finite() && profit_target > 0.0) {
            bail!("PROFIT_TARGET must be a positive number, got {profit_target}");
        }

        let trade_qty: f64 = env.parse_or("TRADE_QTY", 2.0)?;
        if !(trade_qty.is_finite() && trade_qty > 0.0) {
            bail!("TRADE_QTY must be a positive number, got {trade_qty}");
        }

        let tz_name = env.or("TIMEZONE", "US/Eastern");
        let timezone: Tz = tz_name
            .parse()
            .map_err(|e| anyhow::anyhow!("TIMEZONE '{tz_name}' is not a known time zone: {e}"))?;

        let trading_start = env.time_or("TRADING_START", "09:30")?;
        let trading_end = env.time_or("TRADING_END", "16:30")?;
        if trading_start >= trading_end {
            bail!("TRADING_START ({trading_start}) must be before TRADING_END ({trading_end})");
        }

        let bar_limit: usize = env.parse_or("BAR_LIMIT", 10_000)?;
        if bar_limit == 0 {
            bail!("BAR_LIMIT must be at least 1");
        }

        Ok(Self {
            alpaca: AlpacaConfig {
                api_key,
                api_secret,
                base_url:        trim_url(env.or("BASE_URL", "https://paper-api.alpaca.markets")),
                data_url:        trim_url(env.or("DATA_URL", "https://data.alpaca.markets")),
                request_timeout: env.secs_or("REQUEST_TIMEOUT_SECS", 10)?,
                dry_run:         env.flag("DRY_RUN"),
            },
            symbol,
            timeframe: env.or("TIMEFRAME", "1Min"),
            strategy: StrategyParams { ema_fast, ema_slow, profit_target, trade_qty },
            schedule: Schedule {
                timezone,
                trading_start,
                trading_end,
                report_cutoff:      env.time_or("REPORT_CUTOFF", "16:00")?,
                poll_interval:      env.secs_or("POLL_INTERVAL_SECS", 60)?,
                heartbeat_interval: env.secs_or("HEARTBEAT_INTERVAL_SECS", 300)?,
                error_cooldown:     env.secs_or("ERROR_COOLDOWN_SECS", 60)?,
                self_test_settle:   env.secs_or("SELF_TEST_SETTLE_SECS", 60)?,
            },
            test_symbol:        env.or("TEST_SYMBOL", "T").to_uppercase(),
            lookback_days:      env.parse_or("LOOKBACK_DAYS", 31)?,
            bar_limit,
            failure_escalation: env.parse_or("FAILURE_ESCALATION", 5)?,
            webhook_url:        env.optional("WEBHOOK_URL"),
        })
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

// ─── Lookup helpers ───────────────────────────────────────────────────────────

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> anyhow::Result<String> {
        self.optional(key)
            .with_context(|| format!("{key} environment variable is required"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_required<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(key)?;
        raw.parse()
            .map_err(|e| anyhow::anyhow!("{key} must be a number, got '{raw}': {e}"))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("{key} must be a number, got '{raw}': {e}")),
            None => Ok(default),
        }
    }

    fn secs_or(&self, key: &str, default: u64) -> anyhow::Result<Duration> {
        Ok(Duration::from_secs(self.parse_or(key, default)?))
    }

    fn time_or(&self, key: &str, default: &str) -> anyhow::Result<NaiveTime> {
        let raw = self.or(key, default);
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .with_context(|| format!("{key} must be HH:MM, got '{raw}'"))
    }

    fn flag(&self, key: &str) -> bool {
        self.optional(key)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
