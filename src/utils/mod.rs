pub mod errors;
pub mod format;
pub mod pair_lock;
pub mod pin;

pub use errors::{DenialReason, TransferError, WalletError};
pub use format::format_amount;
pub use pair_lock::TransferLockManager;
pub use pin::{hash_pin, verify_pin};
