//! Transfer saga coordinator
//!
//! Linear state machine with early exits:
//! VALIDATE_FIELDS → RESOLVE_PARTIES → RISK_GATE → VERIFY_PIN → QUOTE_FEE →
//! CHECK_BALANCE → ENSURE_RECIPIENT_WALLET → (pair-locked) DEBIT_SENDER →
//! CREDIT_RECIPIENT → RECORD_HISTORY ×2 → ACCRUE_REVENUE → NOTIFY ×2.
//!
//! Everything before DEBIT_SENDER fails closed: the caller learns the reason
//! and no ledger state has changed. After the debit commits, a credit
//! failure is compensated by re-crediting the sender inside the same pair
//! lock; a failed compensation is the one state an operator must reconcile
//! by hand and is logged accordingly. History and revenue run after the
//! lock is released and never roll the money movement back; notifications
//! are dispatched without being awaited.

use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::clients::{
    CreditAlert, DebitAlert, HistoryClient, NotificationClient, RevenueClient, UserClient,
    WalletClient,
};
use crate::config::Settings;
use crate::models::{
    Account, AccountId, CurrencyType, FeeQuote, NewHistoryRecord, RawTransfer, TransactionType,
    TransferRequest,
};
use crate::services::fee;
use crate::services::risk_service::{RiskDecision, RiskGate};
use crate::utils::{format_amount, verify_pin, TransferError, TransferLockManager, WalletError};

pub struct TransferService {
    settings: Arc<Settings>,
    users: Arc<dyn UserClient>,
    wallets: Arc<dyn WalletClient>,
    history: Arc<dyn HistoryClient>,
    revenue: Arc<dyn RevenueClient>,
    notifier: Arc<dyn NotificationClient>,
    risk: Arc<RiskGate>,
    locks: Arc<TransferLockManager>,
}

/// What the caller sees after a committed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub message: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub currency: CurrencyType,
    pub sender_balance: Decimal,
}

impl TransferService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<Settings>,
        users: Arc<dyn UserClient>,
        wallets: Arc<dyn WalletClient>,
        history: Arc<dyn HistoryClient>,
        revenue: Arc<dyn RevenueClient>,
        notifier: Arc<dyn NotificationClient>,
        risk: Arc<RiskGate>,
        locks: Arc<TransferLockManager>,
    ) -> Self {
        Self {
            settings,
            users,
            wallets,
            history,
            revenue,
            notifier,
            risk,
            locks,
        }
    }

    /// Run the full saga for an authenticated caller. The caller id comes
    /// from the validated bearer token, never from the payload.
    pub async fn execute(
        &self,
        caller: AccountId,
        raw: RawTransfer,
    ) -> Result<TransferOutcome, TransferError> {
        // VALIDATE_FIELDS
        let request = TransferRequest::parse(raw)?;

        // RESOLVE_PARTIES
        let sender = self.resolve_account(&request.username, "Sender").await?;
        let recipient = self
            .resolve_account(&request.recipient_user, "Recipient")
            .await?;

        // Authorization invariant: the token identity must own the asserted
        // sender. Treated as a security event, not a validation slip.
        if sender.id != caller || sender.username != request.sender_user {
            warn!(
                caller,
                asserted = %request.sender_user,
                resolved = %request.username,
                "Authorization mismatch on transfer request"
            );
            return Err(TransferError::Authorization);
        }

        // RISK_GATE
        let decision = self
            .bounded(self.risk.evaluate(&sender, &request.region, request.amount))
            .await
            .map_err(|_| timeout_internal("RISK_GATE"))?
            .map_err(|e| TransferError::Internal(e.to_string()))?;
        if let RiskDecision::Deny(reason) = decision {
            info!(user = %sender.username, %reason, "Transfer denied by risk gate");
            return Err(TransferError::PolicyDenial(reason));
        }

        // VERIFY_PIN
        let sender_wallet = self
            .bounded(self.wallets.get_wallet(sender.id))
            .await
            .map_err(|_| timeout_internal("VERIFY_PIN"))?
            .map_err(|e| TransferError::Internal(e.to_string()))?
            .ok_or_else(|| TransferError::NotFound {
                what: "Sorry.! Your wallet is not found.".to_string(),
            })?;
        if sender_wallet.id != request.wallet_id {
            return Err(TransferError::NotFound {
                what: "The wallet id provided is not recognized in our system.".to_string(),
            });
        }
        let pin_ok = verify_pin(&request.transfer_pin, &sender_wallet.pin_hash)
            .map_err(|e| TransferError::Internal(e.to_string()))?;
        if !pin_ok {
            return Err(TransferError::InvalidPin);
        }

        // QUOTE_FEE
        let quote = fee::quote(request.amount);

        // CHECK_BALANCE (advisory; the debit re-checks under the lock)
        let balance = self
            .bounded(self.wallets.balance_of(sender.id, request.currency))
            .await
            .map_err(|_| timeout_internal("CHECK_BALANCE"))?
            .map_err(|e| match e {
                WalletError::InsufficientFunds => TransferError::InsufficientFunds,
                other => TransferError::NotFound {
                    what: other.to_string(),
                },
            })?;
        if balance < quote.total_deduction {
            return Err(TransferError::InsufficientFunds);
        }

        // ENSURE_RECIPIENT_WALLET
        let recipient_wallet = match self
            .bounded(self.wallets.get_wallet(recipient.id))
            .await
            .map_err(|_| timeout_internal("ENSURE_RECIPIENT_WALLET"))?
            .map_err(|e| TransferError::Internal(e.to_string()))?
        {
            Some(wallet) => wallet,
            None => self
                .bounded(self.wallets.provision_wallet(recipient.id))
                .await
                .map_err(|_| timeout_internal("ENSURE_RECIPIENT_WALLET"))?
                .map_err(|e| TransferError::Internal(e.to_string()))?,
        };

        // DEBIT_SENDER / CREDIT_RECIPIENT under the pair lock. The guard
        // covers exactly the two mutations and the compensation path.
        let (sender_balance, recipient_balance) = {
            let _guard = self.locks.acquire(sender.id, recipient.id).await;

            let sender_balance = match self
                .bounded(
                    self.wallets
                        .debit(sender.id, request.currency, quote.total_deduction),
                )
                .await
            {
                Err(_) => {
                    return Err(self.mutation_failure("DEBIT_SENDER", "timed out", &request))
                }
                Ok(Err(WalletError::InsufficientFunds)) => {
                    return Err(TransferError::InsufficientFunds)
                }
                Ok(Err(e)) => {
                    return Err(self.mutation_failure("DEBIT_SENDER", &e.to_string(), &request))
                }
                Ok(Ok(balance)) => balance,
            };

            let credit_result = self
                .bounded(
                    self.wallets
                        .credit(recipient.id, request.currency, request.amount),
                )
                .await;
            match credit_result {
                Ok(Ok(balance)) => (sender_balance, balance),
                Ok(Err(e)) => {
                    self.compensate_debit(&sender, &request, quote.total_deduction)
                        .await;
                    return Err(self.mutation_failure(
                        "CREDIT_RECIPIENT",
                        &e.to_string(),
                        &request,
                    ));
                }
                Err(_) => {
                    self.compensate_debit(&sender, &request, quote.total_deduction)
                        .await;
                    return Err(self.mutation_failure("CREDIT_RECIPIENT", "timed out", &request));
                }
            }
        };

        // RECORD_HISTORY ×2, independent legs joined in parallel.
        let pretty = format_amount(request.amount);
        let symbol = request.currency.symbol();
        let sender_record = NewHistoryRecord {
            user_id: sender.id,
            counterpart: recipient.username.clone(),
            amount: -request.amount,
            currency: request.currency,
            record_type: TransactionType::Debited,
            description: format!("Transferred {}{} to {}", symbol, pretty, recipient.username),
            wallet_id: sender_wallet.id,
        };
        let recipient_record = NewHistoryRecord {
            user_id: recipient.id,
            counterpart: sender.username.clone(),
            amount: request.amount,
            currency: request.currency,
            record_type: TransactionType::Credited,
            description: format!("Credited {}{} by {}", symbol, pretty, sender.username),
            wallet_id: recipient_wallet.id,
        };
        let (sender_leg, recipient_leg) = tokio::join!(
            self.bounded(self.history.append(sender_record)),
            self.bounded(self.history.append(recipient_record)),
        );
        self.report_side_effect("RECORD_HISTORY(sender)", sender_leg, &request);
        self.report_side_effect("RECORD_HISTORY(recipient)", recipient_leg, &request);

        // ACCRUE_REVENUE
        let accrual = self
            .bounded(self.revenue.accrue(quote.revenue_share, request.currency))
            .await;
        self.report_side_effect("ACCRUE_REVENUE", accrual, &request);

        // NOTIFY ×2, fire-and-forget.
        self.dispatch_alerts(&sender, &recipient, &request, &quote, sender_balance, recipient_balance);

        info!(
            sender = %sender.username,
            recipient = %recipient.username,
            amount = %request.amount,
            fee = %quote.fee,
            currency = %request.currency,
            "Transfer committed"
        );

        Ok(TransferOutcome {
            message: format!(
                "Transaction successful {}{} has been successfully sent to {}.",
                symbol, pretty, recipient.username
            ),
            amount: request.amount,
            fee: quote.fee,
            currency: request.currency,
            sender_balance,
        })
    }

    async fn resolve_account(
        &self,
        username: &str,
        role: &str,
    ) -> Result<Account, TransferError> {
        self.bounded(self.users.find_by_username(username))
            .await
            .map_err(|_| timeout_internal("RESOLVE_PARTIES"))?
            .map_err(|e| TransferError::Internal(e.to_string()))?
            .ok_or_else(|| TransferError::NotFound {
                what: format!("{} user not found: {}", role, username),
            })
    }

    /// Reverse a committed debit after the credit leg failed. Runs with the
    /// pair lock still held.
    async fn compensate_debit(
        &self,
        sender: &Account,
        request: &TransferRequest,
        total_deduction: Decimal,
    ) {
        match self
            .bounded(
                self.wallets
                    .credit(sender.id, request.currency, total_deduction),
            )
            .await
        {
            Ok(Ok(balance)) => {
                warn!(
                    sender = %sender.username,
                    amount = %total_deduction,
                    currency = %request.currency,
                    restored_balance = %balance,
                    "Credit leg failed; sender debit compensated"
                );
            }
            other => {
                // Money left the sender and reached nobody. Nothing else in
                // this process can repair that; flag it for reconciliation.
                error!(
                    sender = %sender.username,
                    amount = %total_deduction,
                    currency = %request.currency,
                    result = ?other,
                    "COMPENSATION FAILED after credit failure; manual reconciliation required"
                );
            }
        }
    }

    fn mutation_failure(
        &self,
        step: &'static str,
        detail: &str,
        request: &TransferRequest,
    ) -> TransferError {
        error!(
            step,
            detail,
            request = ?request,
            "Mutation step failed inside the partial-failure window"
        );
        TransferError::Mutation {
            step,
            detail: detail.to_string(),
        }
    }

    /// Log a post-commit side-effect failure without failing the saga.
    fn report_side_effect<T, E: std::fmt::Display>(
        &self,
        step: &'static str,
        outcome: Result<Result<T, E>, tokio::time::error::Elapsed>,
        request: &TransferRequest,
    ) {
        let detail = match outcome {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => e.to_string(),
            Err(_) => "timed out".to_string(),
        };
        warn!(
            step,
            detail,
            request = ?request,
            "Side effect failed after committed transfer; queued for operator review"
        );
    }

    fn dispatch_alerts(
        &self,
        sender: &Account,
        recipient: &Account,
        request: &TransferRequest,
        quote: &FeeQuote,
        sender_balance: Decimal,
        recipient_balance: Decimal,
    ) {
        let debit = DebitAlert {
            email: sender.email.clone(),
            username: sender.username.clone(),
            counterpart_full_name: recipient.full_name(),
            amount: request.amount,
            currency: request.currency,
            fee: quote.fee,
            new_balance: sender_balance,
        };
        let credit = CreditAlert {
            email: recipient.email.clone(),
            username: recipient.username.clone(),
            sender_username: sender.username.clone(),
            amount: request.amount,
            currency: request.currency,
            new_balance: recipient_balance,
        };

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_debit_alert(debit).await {
                warn!("NOTIFY(sender) failed: {}", e);
            }
        });
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_credit_alert(credit).await {
                warn!("NOTIFY(recipient) failed: {}", e);
            }
        });
    }

    /// Every collaborator call gets the same bounded timeout.
    async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, tokio::time::error::Elapsed> {
        tokio::time::timeout(self.settings.rpc_timeout, fut).await
    }
}

fn timeout_internal(step: &str) -> TransferError {
    TransferError::Internal(format!("{} timed out", step))
}
