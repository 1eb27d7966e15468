//! Storefront Engine
//!
//! The storefront engine owns the order and payment lifecycle of a chat-bot storefront: customers place orders for
//! product variants, pay by manual bank transfer, upload a screenshot of the receipt, and an operator approves or
//! rejects the payment. Approved payments earn the customer cashback.
//!
//! The library is divided into these sections:
//! 1. Database management ([`mod@sqlite`] and [`mod@traits`]). SQLite is the supported backend. You should never need
//!    to access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The payment state machine ([`mod@state_machine`]). Transitions are pure functions of the current order, an
//!    event and the acting identity. They return the new state and a list of side effects.
//! 3. The public API (`OrderFlowApi`, `AccountApi`, `CatalogApi`). `OrderFlowApi` interprets the side effects produced
//!    by the state machine: it persists transitions, credits cashback and dispatches notifications.
//!
//! Outbound messaging and operator authorization are supplied by the caller through the [`Notifier`] and
//! [`OperatorPolicy`] traits, so both the HTTP gateway and the bot webhook drive the exact same flow.
pub mod db_types;
pub mod helpers;
pub mod messages;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod state_machine;
pub mod traits;

mod sfe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use sfe_api::{
    accounts_api::AccountApi,
    bot_objects,
    catalog_api::CatalogApi,
    order_flow_api::{FlowSettings, OrderFlowApi},
    order_objects,
};
pub use traits::{
    AccountApiError,
    AccountManagement,
    CatalogError,
    CatalogManagement,
    Notifier,
    NotifierError,
    OperatorAllowList,
    OperatorPolicy,
    StorefrontDatabase,
    StorefrontError,
};
