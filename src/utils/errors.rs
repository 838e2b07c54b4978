//! Error taxonomy for the transfer saga and the wallet endpoint
//!
//! Anything raised before the sender is debited is fully recoverable: the
//! caller gets the message and no ledger state has changed. `Mutation` is the
//! only category that can leave partial state behind and is logged louder
//! than ordinary errors. `SideEffect` failures never fail the user-visible
//! result but must not be dropped silently.

use thiserror::Error;

use crate::models::CurrencyType;

/// Typed failures of the wallet debit/credit endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Sorry.! Your wallet is not found.")]
    WalletNotFound,
    #[error("Currency {0} not found in wallet.")]
    CurrencyNotFound(CurrencyType),
    #[error("Insufficient balance to deduct the requested amount.")]
    InsufficientFunds,
    #[error("Wallet service unavailable: {0}")]
    Unavailable(String),
}

/// First matching risk-gate rule; the reason text is what the caller sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("Your account has been temporarily locked.\nPlease contact support to unlock your account.")]
    AccountLocked,
    #[error("Your account has been blocked.\nPlease contact support for assistance.")]
    AccountBlocked,
    #[error("Account temporarily restricted due to suspicious activity.\nToo many transfers in a short period. Please contact support.")]
    HighVolume,
    #[error("Access Restricted.\nYour account has been temporarily restricted due to activity from a high-risk region.\nPlease contact support for assistance.")]
    HighRiskRegion,
    #[error("New Account Restrictions.\nNew accounts have transaction limits for security reasons.\nPlease verify your identity to continue.")]
    NewAccountHighRisk,
    #[error("Suspicious Activity Detected.\nUnusual transaction activity has been detected on your account.\nPlease contact support.")]
    InconsistentBehavior,
    #[error("Fraudulent Activity Detected.\nYour account has been flagged for suspicious activity.\nPlease contact support immediately.")]
    FlaggedFraudulent,
    #[error("Suspicious Activity Detected.\nA deposit followed by an immediate withdrawal was detected.\nPlease contact support.")]
    DepositThenWithdraw,
}

#[derive(Debug, Error)]
pub enum TransferError {
    /// Missing/invalid/expired token. Terminal for the connection.
    #[error("{0}")]
    Authentication(String),

    /// A required request field is missing or malformed.
    #[error("Missing `{field}` param..! The {field} parameter must be provided.")]
    Validation { field: &'static str },

    /// A field is present but unusable (bad amount, unknown currency).
    #[error("{message}")]
    Malformed { field: &'static str, message: String },

    /// Asserted sender identity does not match the authenticated caller.
    /// Intentionally strong wording; the event is audited.
    #[error("Fraudulent action detected. You are not authorized to operate this wallet.\nOne more attempt and you will be reported to the financial crimes authority.")]
    Authorization,

    #[error("{0}")]
    PolicyDenial(DenialReason),

    #[error("{what}")]
    NotFound { what: String },

    #[error("Invalid transfer pin.\nThe provided transfer pin is incorrect.")]
    InvalidPin,

    #[error("Insufficient balance\nYour account balance is low.")]
    InsufficientFunds,

    /// Debit or credit failed (or timed out) after the pair lock was taken.
    #[error("Transfer failed at {step}: {detail}. The incident has been reported.")]
    Mutation { step: &'static str, detail: String },

    /// History/revenue/notification failed after the money moved.
    #[error("{step} failed after transfer: {detail}")]
    SideEffect { step: &'static str, detail: String },

    /// Collaborator failed before any mutation was attempted.
    #[error("Unexpected error while processing the request.")]
    Internal(String),
}

impl TransferError {
    /// Authentication failures close the connection after the error payload
    /// is flushed; every other category keeps it open.
    pub fn closes_connection(&self) -> bool {
        matches!(self, TransferError::Authentication(_))
    }
}
