//! Supported currencies and their display symbols

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyType {
    USD,
    EUR,
    NGN,
    GBP,
    JPY,
    AUD,
    CAD,
    CHF,
    CNY,
    INR,
}

impl CurrencyType {
    pub const ALL: [CurrencyType; 10] = [
        CurrencyType::USD,
        CurrencyType::EUR,
        CurrencyType::NGN,
        CurrencyType::GBP,
        CurrencyType::JPY,
        CurrencyType::AUD,
        CurrencyType::CAD,
        CurrencyType::CHF,
        CurrencyType::CNY,
        CurrencyType::INR,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            CurrencyType::USD => "USD",
            CurrencyType::EUR => "EUR",
            CurrencyType::NGN => "NGN",
            CurrencyType::GBP => "GBP",
            CurrencyType::JPY => "JPY",
            CurrencyType::AUD => "AUD",
            CurrencyType::CAD => "CAD",
            CurrencyType::CHF => "CHF",
            CurrencyType::CNY => "CNY",
            CurrencyType::INR => "INR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CurrencyType::USD => "$",
            CurrencyType::EUR => "€",
            CurrencyType::NGN => "₦",
            CurrencyType::GBP => "£",
            CurrencyType::JPY => "¥",
            CurrencyType::AUD => "A$",
            CurrencyType::CAD => "C$",
            CurrencyType::CHF => "CHF",
            CurrencyType::CNY => "¥",
            CurrencyType::INR => "₹",
        }
    }
}

impl fmt::Display for CurrencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyType {
    type Err = String;

    /// Case-insensitive; rejects anything outside the supported list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CurrencyType::ALL
            .iter()
            .copied()
            .find(|c| c.code() == upper)
            .ok_or_else(|| {
                format!(
                    "Invalid currency '{}'. Supported: USD, EUR, NGN, GBP, JPY, AUD, CAD, CHF, CNY, INR",
                    s
                )
            })
    }
}
