//! # Storefront server
//! This crate hosts the inbound gateways of the storefront. It is responsible for:
//! * Serving the web app's HTTP API: catalog reads, placing and listing orders, and operator payment review.
//! * Receiving Telegram bot updates on the webhook and feeding them to the order flow as bot events.
//! * Delivering the order flow's notifications through the Telegram Bot API.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook`: Telegram bot updates.
//! * `/api/...`: The web app API. Callers identify themselves with Telegram Web App init data in the
//!   `X-Telegram-Init-Data` header. See [routes](routes/index.html).
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook;
