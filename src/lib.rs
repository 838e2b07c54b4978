//! remitd - funds-transfer daemon
//!
//! Cooperating identity, wallet, history, revenue and notification services
//! behind one message-framed endpoint. The interesting part is the transfer
//! saga in `services::transfer_service`: per-pair mutual exclusion, a tiered
//! fee schedule, an ordered risk gate and an explicit compensation path for
//! the credit leg.

pub mod broker;
pub mod cache;
pub mod clients;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;
