//! Best-effort user notifications
//!
//! Content templating and actual delivery belong to the notification
//! collaborator; here alerts land in an in-memory outbox (observable by
//! tests and operators) and are logged. Callers dispatch these
//! fire-and-forget; a lost alert never affects the money movement.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::{ClientError, CreditAlert, DebitAlert, NotificationClient};
use crate::utils::format_amount;

#[derive(Debug, Clone)]
pub enum OutboundAlert {
    Debit(DebitAlert),
    Credit(CreditAlert),
}

#[derive(Default)]
pub struct NotificationService {
    outbox: RwLock<Vec<OutboundAlert>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn outbox(&self) -> Vec<OutboundAlert> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl NotificationClient for NotificationService {
    async fn send_debit_alert(&self, alert: DebitAlert) -> Result<(), ClientError> {
        info!(
            email = %alert.email,
            "Debit alert: {} sent {}{} to {} (fee {}{}, new balance {}{})",
            alert.username,
            alert.currency.symbol(),
            format_amount(alert.amount),
            alert.counterpart_full_name,
            alert.currency.symbol(),
            format_amount(alert.fee),
            alert.currency.symbol(),
            format_amount(alert.new_balance),
        );
        self.outbox.write().await.push(OutboundAlert::Debit(alert));
        Ok(())
    }

    async fn send_credit_alert(&self, alert: CreditAlert) -> Result<(), ClientError> {
        info!(
            email = %alert.email,
            "Credit alert: {} received {}{} from {} (new balance {}{})",
            alert.username,
            alert.currency.symbol(),
            format_amount(alert.amount),
            alert.sender_username,
            alert.currency.symbol(),
            format_amount(alert.new_balance),
        );
        self.outbox.write().await.push(OutboundAlert::Credit(alert));
        Ok(())
    }
}
