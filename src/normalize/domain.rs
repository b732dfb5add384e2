use crate::data::CanonicalField;
use crate::error::ParseDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered source-column aliases for every canonical field.
///
/// Within a field the first alias present in the input wins.
pub type AliasTable = [(CanonicalField, &'static [&'static str]); 7];

const OPEN: &[&str] = &["open", "open_price", "price_open"];
const HIGH: &[&str] = &["high", "high_price"];
const LOW: &[&str] = &["low", "low_price"];
const VOLUME: &[&str] = &["vol", "volume", "volume_traded"];
const MARKET_CAP: &[&str] = &["market_cap", "marketcap", "mkt_cap"];

const STOCK_ALIASES: AliasTable = [
    (CanonicalField::Datetime, &["date", "datetime", "timestamp"]),
    (CanonicalField::Open, OPEN),
    (CanonicalField::High, HIGH),
    (CanonicalField::Low, LOW),
    (CanonicalField::Close, &["close", "close_price"]),
    (CanonicalField::Volume, VOLUME),
    (CanonicalField::MarketCap, MARKET_CAP),
];

const CRYPTO_ALIASES: AliasTable = [
    (CanonicalField::Datetime, &["time", "timestamp", "date", "datetime"]),
    (CanonicalField::Open, OPEN),
    (CanonicalField::High, HIGH),
    (CanonicalField::Low, LOW),
    (CanonicalField::Close, &["close", "close_price", "price"]),
    (CanonicalField::Volume, VOLUME),
    (CanonicalField::MarketCap, MARKET_CAP),
];

/// The kind of market a raw table comes from.
///
/// The domain selects both the alias priorities and how the datetime column is
/// decoded: stock tables carry calendar strings, crypto tables carry epoch
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Stock,
    Crypto,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Stock => "stock",
            Domain::Crypto => "crypto",
        }
    }

    pub fn aliases(&self) -> &'static AliasTable {
        match self {
            Domain::Stock => &STOCK_ALIASES,
            Domain::Crypto => &CRYPTO_ALIASES,
        }
    }

    pub fn aliases_for(&self, field: CanonicalField) -> &'static [&'static str] {
        self.aliases()
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "equity" => Ok(Domain::Stock),
            "crypto" | "cryptocurrency" => Ok(Domain::Crypto),
            _ => Err(ParseDomainError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_tables_follow_canonical_order() {
        for domain in [Domain::Stock, Domain::Crypto] {
            let fields: Vec<_> = domain.aliases().iter().map(|(field, _)| *field).collect();
            assert_eq!(fields, CanonicalField::ALL);
        }
    }

    #[test]
    fn test_aliases_are_lowercase_and_unique() {
        for domain in [Domain::Stock, Domain::Crypto] {
            let mut seen = Vec::new();
            for (_, aliases) in domain.aliases() {
                for alias in *aliases {
                    assert_eq!(*alias, alias.to_lowercase());
                    assert!(!seen.contains(alias), "{} listed twice for {}", alias, domain);
                    seen.push(*alias);
                }
            }
        }
    }

    #[test]
    fn test_datetime_priorities_differ_by_domain() {
        assert_eq!(
            Domain::Stock.aliases_for(CanonicalField::Datetime),
            ["date", "datetime", "timestamp"]
        );
        assert_eq!(
            Domain::Crypto.aliases_for(CanonicalField::Datetime)[..3],
            ["time", "timestamp", "date"]
        );
        assert!(Domain::Crypto
            .aliases_for(CanonicalField::Close)
            .contains(&"price"));
        assert!(!Domain::Stock
            .aliases_for(CanonicalField::Close)
            .contains(&"price"));
    }

    #[test]
    fn test_parse_domain() {
        assert_eq!("Stock".parse::<Domain>().unwrap(), Domain::Stock);
        assert_eq!(" crypto ".parse::<Domain>().unwrap(), Domain::Crypto);
        assert!("forex".parse::<Domain>().is_err());
        assert_eq!(serde_json::to_string(&Domain::Crypto).unwrap(), "\"crypto\"");
    }
}
