//! Static toolset definitions.
//!
//! Toolsets are defined once at compile time and never created or destroyed
//! at runtime. A module may belong to more than one toolset
//! (`market_movers` is part of both `market_data` and `screener`), which is
//! why logical disable tracks module reference counts across active
//! toolsets.

use super::catalog::ModuleId;

/// One named, togglable bundle of data modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolsetDef {
    /// Stable toolset name used in session configs and meta-tool calls.
    pub name: &'static str,
    /// Human-readable title.
    pub title: &'static str,
    /// One-line description surfaced in `get_toolset_status`.
    pub description: &'static str,
    /// Ordered module list; registration follows this order.
    pub modules: &'static [ModuleId],
}

const TOOLSETS: &[ToolsetDef] = &[
    ToolsetDef {
        name: "market_data",
        title: "Market Data",
        description: "Real-time and historical quotes, price history, and market movers",
        modules: &[
            ModuleId::Quotes,
            ModuleId::PriceHistory,
            ModuleId::MarketMovers,
        ],
    },
    ToolsetDef {
        name: "fundamentals",
        title: "Fundamentals",
        description: "Company profiles, financial statements, and earnings data",
        modules: &[
            ModuleId::CompanyProfile,
            ModuleId::FinancialStatements,
            ModuleId::Earnings,
        ],
    },
    ToolsetDef {
        name: "news",
        title: "News",
        description: "Market news feeds and company press releases",
        modules: &[ModuleId::NewsFeed, ModuleId::PressReleases],
    },
    ToolsetDef {
        name: "search",
        title: "Search",
        description: "Symbol search and entity lookup across listed instruments",
        modules: &[ModuleId::SymbolSearch, ModuleId::EntityLookup],
    },
    ToolsetDef {
        name: "screener",
        title: "Screener",
        description: "Stock and fund screeners plus market-mover rankings",
        modules: &[
            ModuleId::StockScreener,
            ModuleId::FundScreener,
            ModuleId::MarketMovers,
        ],
    },
    ToolsetDef {
        name: "options",
        title: "Options",
        description: "Option chains and greeks",
        modules: &[ModuleId::OptionChains, ModuleId::OptionGreeks],
    },
    ToolsetDef {
        name: "crypto",
        title: "Crypto",
        description: "Cryptocurrency quotes and history",
        modules: &[ModuleId::CryptoQuotes, ModuleId::CryptoHistory],
    },
    ToolsetDef {
        name: "economy",
        title: "Economy",
        description: "Macroeconomic indicators and treasury rates",
        modules: &[ModuleId::EconomicIndicators, ModuleId::TreasuryRates],
    },
];

/// Immutable lookup table over the built-in toolsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityRegistry;

impl CapabilityRegistry {
    /// Registry backed by the built-in toolset table.
    #[must_use]
    pub fn builtin() -> Self {
        Self
    }

    /// Look up a toolset by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static ToolsetDef> {
        TOOLSETS.iter().find(|def| def.name == name)
    }

    /// All toolset definitions in declaration order.
    #[must_use]
    pub fn toolsets(&self) -> &'static [ToolsetDef] {
        TOOLSETS
    }

    /// Ordered toolset names, used for remediation text in error messages.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        TOOLSETS.iter().map(|def| def.name).collect()
    }

    /// Number of defined toolsets.
    #[must_use]
    pub fn len(&self) -> usize {
        TOOLSETS.len()
    }

    /// Whether the registry is empty (never true for the built-in table).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        TOOLSETS.is_empty()
    }

    /// Deduplicated union of every module across all toolsets, preserving
    /// first-seen order.
    #[must_use]
    pub fn all_modules(&self) -> Vec<ModuleId> {
        let mut seen = Vec::new();
        for def in TOOLSETS {
            for module in def.modules {
                if !seen.contains(module) {
                    seen.push(*module);
                }
            }
        }
        seen
    }
}
