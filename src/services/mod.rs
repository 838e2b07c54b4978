//! Service implementations behind the collaborator interfaces
//!
//! Everything here is in-process state behind async locks; the saga
//! coordinator only sees the traits in `crate::clients`.

pub mod fee;
pub mod history_service;
pub mod notification_service;
pub mod revenue_service;
pub mod risk_service;
pub mod transfer_service;
pub mod user_service;
pub mod wallet_service;

pub use fee::{calculate_fee, quote};
pub use history_service::HistoryService;
pub use notification_service::{NotificationService, OutboundAlert};
pub use revenue_service::RevenueService;
pub use risk_service::{RiskDecision, RiskGate};
pub use transfer_service::{TransferOutcome, TransferService};
pub use user_service::UserDirectory;
pub use wallet_service::WalletService;
