//! Message-framed connection endpoint
//!
//! One persistent, bidirectional connection per client session; messages are
//! newline-framed JSON objects. The bearer token is validated before any
//! other field is read. Authentication failures flush an error payload and
//! close the connection; validation failures keep it open. The transfer
//! saga runs on its own task, so a client disconnect mid-saga never cancels
//! an in-flight mutation.

pub mod payload;

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::cache::{SessionCache, SessionSnapshot};
use crate::clients::{HistoryClient, UserClient, WalletClient};
use crate::models::{AccountId, CurrencyType, RawTransfer};
use crate::services::TransferService;
use crate::utils::TransferError;
use payload::Response;

pub struct Broker {
    users: Arc<dyn UserClient>,
    wallets: Arc<dyn WalletClient>,
    history: Arc<dyn HistoryClient>,
    transfer: Arc<TransferService>,
    cache: Arc<SessionCache>,
}

/// Outcome of one handled message.
enum Flow {
    Continue,
    Close(&'static str),
}

impl Broker {
    pub fn new(
        users: Arc<dyn UserClient>,
        wallets: Arc<dyn WalletClient>,
        history: Arc<dyn HistoryClient>,
        transfer: Arc<TransferService>,
        cache: Arc<SessionCache>,
    ) -> Self {
        Self {
            users,
            wallets,
            history,
            transfer,
            cache,
        }
    }

    /// Accept loop: one task per connection.
    pub async fn run(self: Arc<Self>, listener: TcpListener) {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(%addr, "Connection accepted");
                    let broker = Arc::clone(&self);
                    tokio::spawn(async move {
                        broker.serve_connection(stream).await;
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Session loop over any framed byte stream (TCP in production, an
    /// in-memory duplex in tests).
    pub async fn serve_connection<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut lines = BufReader::new(read_half).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    debug!("Connection read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let flow = match serde_json::from_str::<Value>(&line) {
                Ok(message) => self.handle_message(&mut write_half, message).await,
                Err(_) => {
                    let _ = send(&mut write_half, &Response::error("Invalid message format")).await;
                    Flow::Close("invalid message format")
                }
            };

            if let Flow::Close(reason) = flow {
                info!(reason, "Closing connection");
                let _ = write_half.shutdown().await;
                return;
            }
        }
        let _ = write_half.shutdown().await;
    }

    async fn handle_message<W>(&self, writer: &mut W, message: Value) -> Flow
    where
        W: AsyncWrite + Unpin,
    {
        // Token first; nothing else in the payload is trusted before this.
        let token = match message.get("token").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => t,
            _ => {
                let err = TransferError::Authentication(
                    "Authentication token is missing. Authentication required.".to_string(),
                );
                let _ = send(writer, &Response::error(err.to_string())).await;
                return Flow::Close("missing token");
            }
        };
        let caller = match self.users.identity_from_token(token).await {
            Some(id) => id,
            None => {
                let err = TransferError::Authentication("Invalid or expired token".to_string());
                let _ = send(writer, &Response::error(err.to_string())).await;
                return Flow::Close("invalid token");
            }
        };

        let kind = match message.get("type").and_then(Value::as_str) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                let _ = send(
                    writer,
                    &Response::error("Missing `type` param..! The type parameter must be provided."),
                )
                .await;
                return Flow::Continue;
            }
        };

        match kind.as_str() {
            "hello" => self.handle_hello(writer, caller).await,
            "withdraw" | "transfer" => self.handle_withdraw(writer, caller, message).await,
            "balance_view" => self.handle_balance_view(writer, caller, message).await,
            other => {
                let _ = send(
                    writer,
                    &Response::error(format!("Unknown message type '{}'.", other)),
                )
                .await;
                Flow::Continue
            }
        }
    }

    /// Build and cache the caller's session snapshot.
    async fn handle_hello<W: AsyncWrite + Unpin>(&self, writer: &mut W, caller: AccountId) -> Flow {
        match self.build_snapshot(caller).await {
            Ok(snapshot) => {
                let data = match serde_json::to_value(&snapshot) {
                    Ok(v) => v,
                    Err(e) => {
                        error!("Failed to serialize session snapshot: {}", e);
                        let _ = send(writer, &Response::error("Internal server error")).await;
                        return Flow::Continue;
                    }
                };
                self.cache.put(snapshot).await;
                let _ = send(
                    writer,
                    &Response::success(
                        "message",
                        "Connection established and user session initialized",
                    )
                    .with_data(data),
                )
                .await;
            }
            Err(message) => {
                let _ = send(writer, &Response::error(message)).await;
            }
        }
        Flow::Continue
    }

    async fn handle_withdraw<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut W,
        caller: AccountId,
        message: Value,
    ) -> Flow {
        let raw: RawTransfer = match serde_json::from_value(message) {
            Ok(raw) => raw,
            Err(_) => {
                let _ = send(writer, &Response::error("Invalid message format")).await;
                return Flow::Continue;
            }
        };

        // The saga outlives the connection: a disconnect mid-transfer must
        // not cancel a mutation already in flight.
        let transfer = Arc::clone(&self.transfer);
        let handle = tokio::spawn(async move { transfer.execute(caller, raw).await });

        match handle.await {
            Ok(Ok(outcome)) => {
                let _ = send(writer, &Response::success("withdraw-message", outcome.message)).await;
                Flow::Continue
            }
            Ok(Err(e)) => {
                let closes = e.closes_connection();
                let _ = send(writer, &Response::error(e.to_string())).await;
                if closes {
                    Flow::Close("authentication failure")
                } else {
                    Flow::Continue
                }
            }
            Err(join_err) => {
                error!("Transfer saga task failed: {}", join_err);
                let _ = send(writer, &Response::error("Internal server error")).await;
                Flow::Continue
            }
        }
    }

    /// Read one currency balance through the session cache.
    async fn handle_balance_view<W: AsyncWrite + Unpin>(
        &self,
        writer: &mut W,
        caller: AccountId,
        message: Value,
    ) -> Flow {
        let currency_raw = match message.get("currencyType").and_then(Value::as_str) {
            Some(c) => c,
            None => {
                let _ = send(
                    writer,
                    &Response::error(
                        "Missing `currencyType` param..! The currencyType parameter must be provided.",
                    ),
                )
                .await;
                return Flow::Continue;
            }
        };
        let currency: CurrencyType = match currency_raw.parse() {
            Ok(c) => c,
            Err(message_text) => {
                let _ = send(writer, &Response::error(message_text)).await;
                return Flow::Continue;
            }
        };

        let snapshot = match self.cache.get(caller).await {
            Some(snapshot) => snapshot,
            None => match self.build_snapshot(caller).await {
                Ok(snapshot) => {
                    self.cache.put(snapshot.clone()).await;
                    snapshot
                }
                Err(message_text) => {
                    let _ = send(writer, &Response::error(message_text)).await;
                    return Flow::Continue;
                }
            },
        };

        match snapshot
            .balances
            .iter()
            .find(|b| b.currency_code == currency.code())
        {
            Some(view) => {
                let data = serde_json::json!({
                    "currency": view.currency_code,
                    "symbol": view.symbol,
                    "balance": view.balance,
                });
                let _ = send(
                    writer,
                    &Response::success("message", view.balance.clone()).with_data(data),
                )
                .await;
            }
            None => {
                let _ = send(
                    writer,
                    &Response::error(format!(
                        "Currency {} not found in wallet.",
                        currency.code()
                    )),
                )
                .await;
            }
        }
        Flow::Continue
    }

    async fn build_snapshot(&self, caller: AccountId) -> Result<SessionSnapshot, String> {
        let account = self
            .users
            .find_by_id(caller)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "User not found".to_string())?;
        let wallet = self
            .wallets
            .get_wallet(caller)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "User wallet not found.".to_string())?;
        let history_count = self.history.count_for(caller).await.unwrap_or_else(|e| {
            warn!("History count unavailable for snapshot: {}", e);
            0
        });
        Ok(SessionSnapshot::build(&account, &wallet, history_count))
    }
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> std::io::Result<()> {
    let mut frame = serde_json::to_string(response)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    frame.push('\n');
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}
