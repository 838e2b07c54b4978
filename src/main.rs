use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use remitd::broker::Broker;
use remitd::cache::SessionCache;
use remitd::clients::{HistoryClient, NotificationClient, RevenueClient, UserClient, WalletClient};
use remitd::config::Settings;
use remitd::services::{
    HistoryService, NotificationService, RevenueService, RiskGate, TransferService, UserDirectory,
    WalletService,
};
use remitd::utils::TransferLockManager;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("remitd=debug".parse().expect("valid directive")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting remitd...");

    let settings = Arc::new(Settings::from_env());
    info!(bind = %settings.bind_addr, "Settings loaded");

    let cache = Arc::new(SessionCache::new());
    let users = Arc::new(UserDirectory::new(settings.token_ttl_secs));
    let wallets = Arc::new(WalletService::new(Arc::clone(&cache)));
    let history = Arc::new(HistoryService::new());
    let revenue = Arc::new(RevenueService::new());
    let notifier = Arc::new(NotificationService::new());

    let risk = Arc::new(RiskGate::new(
        Arc::clone(&settings),
        Arc::clone(&users) as Arc<dyn UserClient>,
        Arc::clone(&history) as Arc<dyn HistoryClient>,
    ));
    let locks = Arc::new(TransferLockManager::new());

    let transfer = Arc::new(TransferService::new(
        Arc::clone(&settings),
        Arc::clone(&users) as Arc<dyn UserClient>,
        Arc::clone(&wallets) as Arc<dyn WalletClient>,
        Arc::clone(&history) as Arc<dyn HistoryClient>,
        Arc::clone(&revenue) as Arc<dyn RevenueClient>,
        Arc::clone(&notifier) as Arc<dyn NotificationClient>,
        risk,
        locks,
    ));

    let broker = Arc::new(Broker::new(
        Arc::clone(&users) as Arc<dyn UserClient>,
        Arc::clone(&wallets) as Arc<dyn WalletClient>,
        Arc::clone(&history) as Arc<dyn HistoryClient>,
        transfer,
        cache,
    ));

    let listener = match TcpListener::bind(&settings.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", settings.bind_addr, e);
            return;
        }
    };
    info!("Listening on {}", settings.bind_addr);

    broker.run(listener).await;
}
