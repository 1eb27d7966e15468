//! # Backend and collaborator contracts
//!
//! This module defines the interfaces that the storefront engine depends on.
//!
//! ## Database backends
//! * [`StorefrontDatabase`] defines the highest level of behaviour: order creation with stock reservation, and
//!   conditional payment-status transitions (with cashback crediting).
//! * [`AccountManagement`] provides read-only queries for orders, users and cashback history.
//! * [`CatalogManagement`] provides catalog reads and product creation.
//!
//! ## Collaborators
//! * [`Notifier`] is the outbound messaging channel to customers and operators.
//! * [`OperatorPolicy`] decides whether an identity may perform operator-only actions.
mod account_management;
mod catalog_management;
mod notifier;
mod operator_policy;
mod storefront_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use notifier::{Button, ButtonAction, Notifier, NotifierError};
pub use operator_policy::{OperatorAllowList, OperatorPolicy};
pub use storefront_database::{StorefrontDatabase, StorefrontError};
