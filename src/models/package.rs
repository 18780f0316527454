use serde::{Deserialize, Serialize};

/// Purchasable coin packages.
///
/// The payment gateway charges the USD price; on confirmation the ledger is
/// credited with the package's coin amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinPackage {
    Starter,
    Standard,
    Premium,
}

impl CoinPackage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "starter" => Some(Self::Starter),
            "standard" => Some(Self::Standard),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }

    /// Coins credited when the package is purchased
    pub fn coins(&self) -> i64 {
        match self {
            Self::Starter => 500,
            Self::Standard => 1200,
            Self::Premium => 2500,
        }
    }

    /// USD price in cents ($5 minimum, matching the gateway floor)
    pub fn price_usd_cents(&self) -> i64 {
        match self {
            Self::Starter => 500,
            Self::Standard => 1000,
            Self::Premium => 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_conversion() {
        assert_eq!(CoinPackage::from_str("standard"), Some(CoinPackage::Standard));
        assert_eq!(CoinPackage::from_str("whale"), None);
        assert_eq!(CoinPackage::Starter.coins(), 500);
    }

    #[test]
    fn test_package_prices_meet_gateway_floor() {
        for package in [CoinPackage::Starter, CoinPackage::Standard, CoinPackage::Premium] {
            assert!(package.price_usd_cents() >= 500);
        }
    }
}
