//! Operation catalog: module identifiers and their registration functions.
//!
//! A module is the smallest independently registrable unit of tools. The
//! catalog resolves a [`ModuleId`] to an async loader whose result is a
//! [`Registrar`] — a one-shot function that attaches the module's tools to
//! a server handle. The session layer only ever calls `load`; it never
//! inspects what a module registers.
//!
//! Module identifiers form a closed enumeration resolved at compile time
//! rather than a string-keyed loader map, so an unknown module is
//! unrepresentable.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use rmcp::model::{CallToolResult, Content, Tool};

use crate::mcp::handle::{ServerHandle, ToolCallArgs, ToolHandler};
use crate::{AppError, Result};

/// Closed enumeration of every registrable data module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleId {
    /// Real-time quote snapshots.
    Quotes,
    /// Daily and intraday price history.
    PriceHistory,
    /// Gainers, losers, and most-active rankings.
    MarketMovers,
    /// Company profile and officer data.
    CompanyProfile,
    /// Income statement, balance sheet, cash flow.
    FinancialStatements,
    /// Earnings calendar and history.
    Earnings,
    /// Market-wide and per-ticker news.
    NewsFeed,
    /// Company press releases.
    PressReleases,
    /// Free-text symbol search.
    SymbolSearch,
    /// Entity and ISIN lookup.
    EntityLookup,
    /// Equity screener.
    StockScreener,
    /// Mutual fund and ETF screeners.
    FundScreener,
    /// Option chains and expirations.
    OptionChains,
    /// Option greeks.
    OptionGreeks,
    /// Cryptocurrency quotes and pairs.
    CryptoQuotes,
    /// Cryptocurrency price history.
    CryptoHistory,
    /// Macroeconomic indicator series.
    EconomicIndicators,
    /// Treasury yield curve and rate history.
    TreasuryRates,
}

impl ModuleId {
    /// Stable snake_case identifier used in status reports and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "quotes",
            Self::PriceHistory => "price_history",
            Self::MarketMovers => "market_movers",
            Self::CompanyProfile => "company_profile",
            Self::FinancialStatements => "financial_statements",
            Self::Earnings => "earnings",
            Self::NewsFeed => "news_feed",
            Self::PressReleases => "press_releases",
            Self::SymbolSearch => "symbol_search",
            Self::EntityLookup => "entity_lookup",
            Self::StockScreener => "stock_screener",
            Self::FundScreener => "fund_screener",
            Self::OptionChains => "option_chains",
            Self::OptionGreeks => "option_greeks",
            Self::CryptoQuotes => "crypto_quotes",
            Self::CryptoHistory => "crypto_history",
            Self::EconomicIndicators => "economic_indicators",
            Self::TreasuryRates => "treasury_rates",
        }
    }

    /// Tool names and descriptions this module registers.
    #[must_use]
    pub fn tools(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Quotes => &[
                ("quote_snapshot", "Latest quote for a ticker symbol"),
                ("quote_batch", "Latest quotes for up to 100 ticker symbols"),
            ],
            Self::PriceHistory => &[
                ("price_history_daily", "Daily OHLCV bars for a ticker"),
                ("price_history_intraday", "Intraday bars for a ticker"),
            ],
            Self::MarketMovers => &[
                ("market_gainers", "Top gaining equities for the session"),
                ("market_losers", "Top losing equities for the session"),
                ("market_most_active", "Most actively traded equities"),
            ],
            Self::CompanyProfile => &[
                ("company_profile", "Company description, sector, and key facts"),
                ("company_officers", "Officers and directors of a company"),
            ],
            Self::FinancialStatements => &[
                ("income_statement", "Annual or quarterly income statements"),
                ("balance_sheet", "Annual or quarterly balance sheets"),
                ("cash_flow_statement", "Annual or quarterly cash flow statements"),
            ],
            Self::Earnings => &[
                ("earnings_calendar", "Upcoming earnings announcements"),
                ("earnings_history", "Historical earnings surprises for a ticker"),
            ],
            Self::NewsFeed => &[
                ("market_news", "Latest market-wide news headlines"),
                ("ticker_news", "News headlines for a specific ticker"),
            ],
            Self::PressReleases => &[("press_releases", "Company press releases")],
            Self::SymbolSearch => &[(
                "symbol_search",
                "Search listed instruments by name or symbol fragment",
            )],
            Self::EntityLookup => &[
                ("entity_lookup", "Resolve a legal entity to listed instruments"),
                ("isin_lookup", "Resolve an ISIN to its primary listing"),
            ],
            Self::StockScreener => &[(
                "stock_screener",
                "Screen equities by fundamental and technical criteria",
            )],
            Self::FundScreener => &[
                ("fund_screener", "Screen mutual funds by criteria"),
                ("etf_screener", "Screen ETFs by criteria"),
            ],
            Self::OptionChains => &[
                ("option_chain", "Full option chain for an underlying"),
                ("option_expirations", "Available expirations for an underlying"),
            ],
            Self::OptionGreeks => &[("option_greeks", "Greeks for an option contract")],
            Self::CryptoQuotes => &[
                ("crypto_quote", "Latest quote for a crypto pair"),
                ("crypto_pairs", "Tradable crypto pairs"),
            ],
            Self::CryptoHistory => &[("crypto_history", "Historical bars for a crypto pair")],
            Self::EconomicIndicators => &[
                ("economic_indicators", "Macroeconomic indicator series"),
                ("gdp_series", "GDP time series by country"),
                ("cpi_series", "CPI time series by country"),
            ],
            Self::TreasuryRates => &[
                ("treasury_yield_curve", "Current treasury yield curve"),
                ("treasury_rates_history", "Historical treasury rates"),
            ],
        }
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot registration function produced by a successful module load.
///
/// Applied synchronously to the target handle with the session credential,
/// so a load that times out can never register tools afterwards: the loader
/// future is dropped (and thereby cancelled) on timeout, before any
/// registrar exists.
pub type Registrar = Box<dyn FnOnce(&ServerHandle, Option<&str>) + Send>;

/// Resolves module identifiers to registration functions.
///
/// The session layer calls `load` and applies the result; it has no
/// knowledge of the tools a module exposes.
pub trait OperationCatalog: Send + Sync {
    /// Asynchronously load the registrar for `module`.
    fn load(&self, module: ModuleId) -> BoxFuture<'static, Result<Registrar>>;
}

/// Production catalog: every module registers parameter-forwarding tools
/// that POST their arguments to the upstream data provider.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    /// Create a catalog forwarding to `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Convert a `serde_json::Value::Object` into the `Arc<Map>` expected by `Tool`.
    fn schema(value: serde_json::Value) -> Arc<serde_json::Map<String, serde_json::Value>> {
        match value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::default()),
        }
    }
}

/// Forwarding handler for one tool: POST the raw arguments to `url` with an
/// optional bearer credential and return the upstream JSON payload.
fn forward_handler(client: reqwest::Client, url: String, credential: Option<String>) -> ToolHandler {
    Arc::new(move |args: ToolCallArgs| {
        let client = client.clone();
        let url = url.clone();
        let credential = credential.clone();
        Box::pin(async move {
            let body = serde_json::Value::Object(args.arguments.unwrap_or_default());
            let mut request = client.post(&url).json(&body);
            if let Some(ref token) = credential {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(|err| {
                rmcp::ErrorData::internal_error(format!("upstream request failed: {err}"), None)
            })?;
            let response = response.error_for_status().map_err(|err| {
                rmcp::ErrorData::internal_error(
                    format!("upstream returned error status: {err}"),
                    None,
                )
            })?;
            let payload: serde_json::Value = response.json().await.map_err(|err| {
                rmcp::ErrorData::internal_error(
                    format!("upstream returned invalid JSON: {err}"),
                    None,
                )
            })?;

            Ok(CallToolResult::success(vec![Content::json(payload).map_err(
                |err| {
                    rmcp::ErrorData::internal_error(
                        format!("failed to serialize upstream payload: {err}"),
                        None,
                    )
                },
            )?]))
        })
    })
}

impl OperationCatalog for HttpCatalog {
    fn load(&self, module: ModuleId) -> BoxFuture<'static, Result<Registrar>> {
        let client = self.client.clone();
        let base = self.base_url.trim_end_matches('/').to_owned();

        Box::pin(async move {
            let registrar: Registrar = Box::new(move |handle: &ServerHandle, credential| {
                let credential = credential.map(str::to_owned);
                for (name, description) in module.tools() {
                    let tool = Tool {
                        name: (*name).into(),
                        description: Some((*description).into()),
                        input_schema: HttpCatalog::schema(serde_json::json!({
                            "type": "object",
                            "additionalProperties": true
                        })),
                        output_schema: None,
                        annotations: None,
                        title: None,
                        icons: None,
                        meta: None,
                    };
                    let handler = forward_handler(
                        client.clone(),
                        format!("{base}/api/{name}"),
                        credential.clone(),
                    );
                    handle.insert(tool, handler);
                }
            });
            Ok::<Registrar, AppError>(registrar)
        })
    }
}
