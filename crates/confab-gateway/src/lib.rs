//! confab gateway: the Axum service hosting the meeting session engine
//! (shared code for the binary and the integration tests).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod access_code;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod export;
pub mod http;
pub mod realtime;
pub mod repo;
pub mod router;
pub mod summarize;
pub mod transport;
