//! Saga-local transfer types
//!
//! A `TransferRequest` is built per saga invocation from the validated wire
//! payload and dropped when the saga terminates. A `FeeQuote` is a pure
//! function of the amount and the static rate table.

use rust_decimal::Decimal;
use serde::Deserialize;

use super::currency::CurrencyType;
use super::wallet::WalletId;
use crate::utils::TransferError;

/// Withdraw payload exactly as it arrives on the wire; every field optional
/// so the coordinator can name the first missing one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransfer {
    pub username: Option<String>,
    #[serde(rename = "senderUser")]
    pub sender_user: Option<String>,
    #[serde(rename = "walletId")]
    pub wallet_id: Option<String>,
    #[serde(rename = "recipientUser")]
    pub recipient_user: Option<String>,
    pub amount: Option<String>,
    pub region: Option<String>,
    #[serde(rename = "currencyType")]
    pub currency_type: Option<String>,
    pub transferpin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Username asserted by the caller for itself.
    pub username: String,
    /// Username asserted as the wallet owner; must match `username`.
    pub sender_user: String,
    pub recipient_user: String,
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub currency: CurrencyType,
    pub region: String,
    pub transfer_pin: String,
}

impl TransferRequest {
    /// VALIDATE_FIELDS: first missing or malformed field decides the error.
    pub fn parse(raw: RawTransfer) -> Result<Self, TransferError> {
        fn require(
            value: Option<String>,
            field: &'static str,
        ) -> Result<String, TransferError> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(TransferError::Validation { field }),
            }
        }

        let username = require(raw.username, "username")?;
        let sender_user = require(raw.sender_user, "senderUser")?;
        let wallet_id_str = require(raw.wallet_id, "walletId")?;
        let recipient_user = require(raw.recipient_user, "recipientUser")?;
        let amount_str = require(raw.amount, "amount")?;
        let region = require(raw.region, "region")?;
        let currency_str = require(raw.currency_type, "currencyType")?;
        let transfer_pin = require(raw.transferpin, "transferpin")?;

        let wallet_id: WalletId =
            wallet_id_str
                .trim()
                .parse()
                .map_err(|_| TransferError::Malformed {
                    field: "walletId",
                    message: format!("Invalid wallet id '{}'.", wallet_id_str),
                })?;

        let amount: Decimal = amount_str
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| TransferError::Malformed {
                field: "amount",
                message: format!("Invalid amount '{}'.", amount_str),
            })?;
        if amount <= Decimal::ZERO {
            return Err(TransferError::Malformed {
                field: "amount",
                message: "Amount must be greater than zero.".to_string(),
            });
        }

        let currency: CurrencyType =
            currency_str
                .parse()
                .map_err(|message: String| TransferError::Malformed {
                    field: "currencyType",
                    message,
                })?;

        Ok(TransferRequest {
            username,
            sender_user,
            recipient_user,
            wallet_id,
            amount,
            currency,
            region,
            transfer_pin: transfer_pin.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee: Decimal,
    /// amount + fee, the full deduction from the sender.
    pub total_deduction: Decimal,
    /// Portion accrued to platform revenue (the whole fee).
    pub revenue_share: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn full_raw() -> RawTransfer {
        RawTransfer {
            username: Some("alice".into()),
            sender_user: Some("alice".into()),
            wallet_id: Some("5001".into()),
            recipient_user: Some("bob".into()),
            amount: Some("50.00".into()),
            region: Some("US".into()),
            currency_type: Some("usd".into()),
            transferpin: Some(" 4821 ".into()),
        }
    }

    #[test]
    fn parses_a_complete_payload() {
        let req = TransferRequest::parse(full_raw()).unwrap();
        assert_eq!(req.amount, dec!(50.00));
        assert_eq!(req.currency, CurrencyType::USD);
        assert_eq!(req.wallet_id, 5001);
        assert_eq!(req.transfer_pin, "4821");
    }

    #[test]
    fn first_missing_field_is_reported() {
        let raw = RawTransfer {
            username: Some("alice".into()),
            sender_user: None,
            ..full_raw()
        };
        match TransferRequest::parse(raw) {
            Err(TransferError::Validation { field }) => assert_eq!(field, "senderUser"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let raw = RawTransfer {
            wallet_id: Some("   ".into()),
            ..full_raw()
        };
        assert!(matches!(
            TransferRequest::parse(raw),
            Err(TransferError::Validation { field: "walletId" })
        ));
    }

    #[test]
    fn rejects_non_positive_and_garbage_amounts() {
        let raw = RawTransfer {
            amount: Some("0".into()),
            ..full_raw()
        };
        assert!(matches!(
            TransferRequest::parse(raw),
            Err(TransferError::Malformed { field: "amount", .. })
        ));

        let raw = RawTransfer {
            amount: Some("fifty".into()),
            ..full_raw()
        };
        assert!(matches!(
            TransferRequest::parse(raw),
            Err(TransferError::Malformed { field: "amount", .. })
        ));
    }

    #[test]
    fn rejects_unknown_currency() {
        let raw = RawTransfer {
            currency_type: Some("DOGE".into()),
            ..full_raw()
        };
        assert!(matches!(
            TransferRequest::parse(raw),
            Err(TransferError::Malformed {
                field: "currencyType",
                ..
            })
        ));
    }
}
