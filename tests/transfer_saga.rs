//! End-to-end saga tests against the in-process service stack.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::{dec, Decimal};

use remitd::cache::SessionCache;
use remitd::clients::{ClientError, HistoryClient, NotificationClient, RevenueClient, UserClient, WalletClient};
use remitd::config::Settings;
use remitd::models::{Account, AccountId, CurrencyType, RawTransfer, TransactionType, Wallet};
use remitd::services::{
    HistoryService, NotificationService, OutboundAlert, RevenueService, RiskGate, TransferService,
    UserDirectory, WalletService,
};
use remitd::utils::{DenialReason, TransferError, TransferLockManager, WalletError};

const PIN: &str = "4821";

struct Harness {
    users: Arc<UserDirectory>,
    wallets: Arc<WalletService>,
    history: Arc<HistoryService>,
    revenue: Arc<RevenueService>,
    notifier: Arc<NotificationService>,
    transfer: Arc<TransferService>,
}

fn build_transfer(
    users: &Arc<UserDirectory>,
    wallet_client: Arc<dyn WalletClient>,
    history: &Arc<HistoryService>,
    revenue: &Arc<RevenueService>,
    notifier: &Arc<NotificationService>,
) -> Arc<TransferService> {
    let settings = Arc::new(Settings::default());
    let risk = Arc::new(RiskGate::new(
        Arc::clone(&settings),
        Arc::clone(users) as Arc<dyn UserClient>,
        Arc::clone(history) as Arc<dyn HistoryClient>,
    ));
    Arc::new(TransferService::new(
        settings,
        Arc::clone(users) as Arc<dyn UserClient>,
        wallet_client,
        Arc::clone(history) as Arc<dyn HistoryClient>,
        Arc::clone(revenue) as Arc<dyn RevenueClient>,
        Arc::clone(notifier) as Arc<dyn NotificationClient>,
        risk,
        Arc::new(TransferLockManager::new()),
    ))
}

fn harness() -> Harness {
    let cache = Arc::new(SessionCache::new());
    let users = Arc::new(UserDirectory::new(3600));
    let wallets = Arc::new(WalletService::new(cache));
    let history = Arc::new(HistoryService::new());
    let revenue = Arc::new(RevenueService::new());
    let notifier = Arc::new(NotificationService::new());
    let transfer = build_transfer(
        &users,
        Arc::clone(&wallets) as Arc<dyn WalletClient>,
        &history,
        &revenue,
        &notifier,
    );
    Harness {
        users,
        wallets,
        history,
        revenue,
        notifier,
        transfer,
    }
}

impl Harness {
    /// Account old enough to clear the new-account rule.
    async fn seasoned_account(&self, username: &str) -> Account {
        let account = self
            .users
            .create_account(username, &format!("{}@example.com", username), "Test", "User")
            .await;
        self.users
            .backdate_account(account.id, Utc::now() - Duration::days(30))
            .await;
        account
    }

    async fn funded_account(&self, username: &str, balance: Decimal) -> (Account, Wallet) {
        let account = self.seasoned_account(username).await;
        let wallet = self.wallets.create_wallet(account.id, PIN).await;
        self.wallets
            .seed_balance(account.id, CurrencyType::USD, balance)
            .await;
        (account, wallet)
    }

    async fn usd_balance(&self, user_id: AccountId) -> Result<Decimal, WalletError> {
        self.wallets.balance_of(user_id, CurrencyType::USD).await
    }

    /// Notifications are dispatched on detached tasks; poll until they land.
    async fn wait_for_alerts(&self, expected: usize) -> Vec<OutboundAlert> {
        for _ in 0..100 {
            let outbox = self.notifier.outbox().await;
            if outbox.len() >= expected {
                return outbox;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("expected {} alerts, outbox never filled", expected);
    }
}

fn raw(sender: &str, recipient: &str, wallet_id: i64, amount: &str) -> RawTransfer {
    RawTransfer {
        username: Some(sender.to_string()),
        sender_user: Some(sender.to_string()),
        wallet_id: Some(wallet_id.to_string()),
        recipient_user: Some(recipient.to_string()),
        amount: Some(amount.to_string()),
        region: Some("US".to_string()),
        currency_type: Some("USD".to_string()),
        transferpin: Some(PIN.to_string()),
    }
}

#[tokio::test]
async fn committed_transfer_moves_money_and_records_every_leg() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    let (bob, _) = h.funded_account("bob", dec!(0.00)).await;

    let outcome = h
        .transfer
        .execute(alice.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .expect("transfer commits");

    // 50.00 sits in the lowest tier: 0.5% fee, sender pays amount + fee.
    assert_eq!(outcome.fee, dec!(0.25));
    assert_eq!(outcome.sender_balance, dec!(49.75));
    assert!(outcome.message.contains("$50.00"));
    assert!(outcome.message.contains("bob"));

    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(49.75));
    assert_eq!(h.usd_balance(bob.id).await.unwrap(), dec!(50.00));

    let sender_records = h.history.records_for(alice.id).await;
    assert_eq!(sender_records.len(), 1);
    assert_eq!(sender_records[0].record_type, TransactionType::Debited);
    assert_eq!(sender_records[0].amount, dec!(-50.00));
    assert_eq!(sender_records[0].counterpart, "bob");
    assert!(sender_records[0].description.contains("Transferred $50.00 to bob"));

    let recipient_records = h.history.records_for(bob.id).await;
    assert_eq!(recipient_records.len(), 1);
    assert_eq!(recipient_records[0].record_type, TransactionType::Credited);
    assert_eq!(recipient_records[0].amount, dec!(50.00));

    assert_eq!(
        h.revenue.balance_of(CurrencyType::USD).await,
        Some(dec!(0.25))
    );

    let alerts = h.wait_for_alerts(2).await;
    let debit = alerts.iter().find_map(|a| match a {
        OutboundAlert::Debit(d) => Some(d.clone()),
        _ => None,
    });
    let credit = alerts.iter().find_map(|a| match a {
        OutboundAlert::Credit(c) => Some(c.clone()),
        _ => None,
    });
    let debit = debit.expect("sender alert");
    assert_eq!(debit.email, "alice@example.com");
    assert_eq!(debit.fee, dec!(0.25));
    assert_eq!(debit.new_balance, dec!(49.75));
    let credit = credit.expect("recipient alert");
    assert_eq!(credit.email, "bob@example.com");
    assert_eq!(credit.sender_username, "alice");
    assert_eq!(credit.new_balance, dec!(50.00));
}

#[tokio::test]
async fn insufficient_funds_leaves_every_ledger_untouched() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(10.00)).await;
    let (bob, _) = h.funded_account("bob", dec!(5.00)).await;

    let err = h
        .transfer
        .execute(alice.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds));

    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(10.00));
    assert_eq!(h.usd_balance(bob.id).await.unwrap(), dec!(5.00));
    assert!(h.history.records_for(alice.id).await.is_empty());
    assert_eq!(h.revenue.balance_of(CurrencyType::USD).await, None);
    assert!(h.notifier.outbox().await.is_empty());
}

#[tokio::test]
async fn fee_counts_against_the_sender_balance() {
    // Covers exactly the amount but not the fee.
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(50.00)).await;
    h.funded_account("bob", dec!(0.00)).await;

    let err = h
        .transfer
        .execute(alice.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::InsufficientFunds));
    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(50.00));
}

#[tokio::test]
async fn recipient_without_a_wallet_gets_one_provisioned() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    let bob = h.seasoned_account("bob").await;
    assert!(h.wallets.get_wallet(bob.id).await.unwrap().is_none());

    h.transfer
        .execute(alice.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .expect("transfer commits");

    let bob_wallet = h.wallets.get_wallet(bob.id).await.unwrap().expect("provisioned");
    assert_eq!(bob_wallet.balances.len(), 1);
    assert_eq!(bob_wallet.balances[0].balance, dec!(50.00));
}

#[tokio::test]
async fn token_identity_must_own_the_asserted_sender() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    let (bob, _) = h.funded_account("bob", dec!(20.00)).await;

    // Bob's token, Alice's wallet.
    let err = h
        .transfer
        .execute(bob.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Authorization));
    assert!(err.to_string().contains("not authorized"));

    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(100.00));
    assert!(h.history.records_for(alice.id).await.is_empty());
    assert!(h.history.records_for(bob.id).await.is_empty());
    assert_eq!(h.revenue.balance_of(CurrencyType::USD).await, None);
}

#[tokio::test]
async fn risk_denial_happens_before_any_mutation() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    h.funded_account("bob", dec!(0.00)).await;
    h.users.set_flags(alice.id, false, false, true).await;

    let err = h
        .transfer
        .execute(alice.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::PolicyDenial(DenialReason::FlaggedFraudulent)
    ));

    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(100.00));
    assert!(h.history.records_for(alice.id).await.is_empty());
}

#[tokio::test]
async fn high_risk_region_is_denied() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    h.funded_account("bob", dec!(0.00)).await;

    let mut payload = raw("alice", "bob", alice_wallet.id, "50.00");
    payload.region = Some("KP".to_string());
    let err = h.transfer.execute(alice.id, payload).await.unwrap_err();
    assert!(matches!(
        err,
        TransferError::PolicyDenial(DenialReason::HighRiskRegion)
    ));
}

#[tokio::test]
async fn wrong_pin_is_rejected_before_the_quote() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    h.funded_account("bob", dec!(0.00)).await;

    let mut payload = raw("alice", "bob", alice_wallet.id, "50.00");
    payload.transferpin = Some("0000".to_string());
    let err = h.transfer.execute(alice.id, payload).await.unwrap_err();
    assert!(matches!(err, TransferError::InvalidPin));
    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(100.00));
}

#[tokio::test]
async fn unknown_recipient_is_reported_by_name() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;

    let err = h
        .transfer
        .execute(alice.id, raw("alice", "nobody", alice_wallet.id, "50.00"))
        .await
        .unwrap_err();
    match err {
        TransferError::NotFound { what } => assert!(what.contains("nobody")),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn missing_field_is_named_in_the_error() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;

    let mut payload = raw("alice", "bob", alice_wallet.id, "50.00");
    payload.amount = None;
    let err = h.transfer.execute(alice.id, payload).await.unwrap_err();
    assert!(matches!(
        err,
        TransferError::Validation { field: "amount" }
    ));
}

#[tokio::test]
async fn opposing_concurrent_transfers_conserve_money() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    let (bob, bob_wallet) = h.funded_account("bob", dec!(100.00)).await;

    let mut handles = Vec::new();
    for _ in 0..3 {
        let t = Arc::clone(&h.transfer);
        let payload = raw("alice", "bob", alice_wallet.id, "10.00");
        let caller = alice.id;
        handles.push(tokio::spawn(async move { t.execute(caller, payload).await }));

        let t = Arc::clone(&h.transfer);
        let payload = raw("bob", "alice", bob_wallet.id, "10.00");
        let caller = bob.id;
        handles.push(tokio::spawn(async move { t.execute(caller, payload).await }));
    }
    for handle in handles {
        handle.await.unwrap().expect("every transfer commits");
    }

    // Each side sent 3 x 10.00 with a 0.05 fee and received 3 x 10.00 back.
    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(99.85));
    assert_eq!(h.usd_balance(bob.id).await.unwrap(), dec!(99.85));
    assert_eq!(
        h.revenue.balance_of(CurrencyType::USD).await,
        Some(dec!(0.30))
    );
    assert_eq!(h.history.records_for(alice.id).await.len(), 6);
    assert_eq!(h.history.records_for(bob.id).await.len(), 6);
}

/// Delegating wallet client whose credit leg fails for one chosen user.
struct FailingCredit {
    inner: Arc<WalletService>,
    fail_for: AccountId,
}

#[async_trait]
impl WalletClient for FailingCredit {
    async fn get_wallet(&self, user_id: AccountId) -> Result<Option<Wallet>, ClientError> {
        self.inner.get_wallet(user_id).await
    }

    async fn provision_wallet(&self, user_id: AccountId) -> Result<Wallet, ClientError> {
        self.inner.provision_wallet(user_id).await
    }

    async fn debit(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        self.inner.debit(user_id, currency, amount).await
    }

    async fn credit(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
        amount: Decimal,
    ) -> Result<Decimal, WalletError> {
        if user_id == self.fail_for {
            return Err(WalletError::Unavailable("credit endpoint down".to_string()));
        }
        self.inner.credit(user_id, currency, amount).await
    }

    async fn balance_of(
        &self,
        user_id: AccountId,
        currency: CurrencyType,
    ) -> Result<Decimal, WalletError> {
        self.inner.balance_of(user_id, currency).await
    }
}

#[tokio::test]
async fn failed_credit_is_compensated_back_to_the_sender() {
    let h = harness();
    let (alice, alice_wallet) = h.funded_account("alice", dec!(100.00)).await;
    let (bob, _) = h.funded_account("bob", dec!(0.00)).await;

    let failing = Arc::new(FailingCredit {
        inner: Arc::clone(&h.wallets),
        fail_for: bob.id,
    });
    let transfer = build_transfer(
        &h.users,
        failing as Arc<dyn WalletClient>,
        &h.history,
        &h.revenue,
        &h.notifier,
    );

    let err = transfer
        .execute(alice.id, raw("alice", "bob", alice_wallet.id, "50.00"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransferError::Mutation {
            step: "CREDIT_RECIPIENT",
            ..
        }
    ));

    // The debit was reversed; nothing downstream of the lock ran.
    assert_eq!(h.usd_balance(alice.id).await.unwrap(), dec!(100.00));
    assert_eq!(h.usd_balance(bob.id).await.unwrap(), dec!(0.00));
    assert!(h.history.records_for(alice.id).await.is_empty());
    assert_eq!(h.revenue.balance_of(CurrencyType::USD).await, None);
    assert!(h.notifier.outbox().await.is_empty());
}
