use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use sf_common::Tenge;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------     TelegramId       --------------------------------------------------------
/// A Telegram user or chat identity. For private chats the two coincide, which is how we address customers and
/// operators.
#[derive(Debug, Clone, Copy, Type, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TelegramId(i64);

impl TelegramId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TelegramId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for TelegramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TelegramId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

//--------------------------------------       OrderId        --------------------------------------------------------
/// The database identity of an order. Customers see the separate, human-friendly `order_number` instead.
#[derive(Debug, Clone, Copy, Type, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

//--------------------------------------    PaymentStatus     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The order has been placed, and the customer has not yet said that they have paid.
    Unpaid,
    /// The customer has tapped "I paid", and we are waiting for the receipt screenshot.
    ScreenshotAwaited,
    /// A screenshot has been received and is waiting for an operator's decision.
    Verification,
    /// An operator approved the payment. Terminal.
    Paid,
    /// An operator rejected the payment. Terminal.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Failed)
    }

    /// The statuses for which an operator still has work to do.
    pub fn pending() -> [PaymentStatus; 2] {
        [PaymentStatus::ScreenshotAwaited, PaymentStatus::Verification]
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::ScreenshotAwaited => "screenshot_awaited",
            PaymentStatus::Verification => "verification",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for PaymentStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "screenshot_awaited" => Ok(Self::ScreenshotAwaited),
            "verification" => Ok(Self::Verification),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     OrderStatus      --------------------------------------------------------
/// Fulfillment status. It follows the payment status once the payment is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order         --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub order_number: i64,
    pub user_id: i64,
    pub telegram_id: TelegramId,
    pub total_amount: Tenge,
    pub cashback_earned: Tenge,
    pub delivery_address: String,
    pub phone: String,
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_screenshot: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: i64,
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    /// Unit price at the time the order was placed.
    pub price: Tenge,
}

/// An order together with its line items, which is how orders are presented to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------      New orders      --------------------------------------------------------
/// The customer placing an order, as vouched for by the identity provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Customer {
    pub fn id(&self) -> TelegramId {
        TelegramId::from(self.telegram_id)
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    /// Display name supplied by the client. Only used to name the item in an out-of-stock error when the variant does
    /// not exist at all.
    #[serde(default)]
    pub product_name: Option<String>,
}

impl OrderLineRequest {
    pub fn describe(&self) -> String {
        let name = self.product_name.clone().unwrap_or_else(|| format!("product #{}", self.product_id));
        format!("{name} ({}, {})", self.size, self.color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOrder {
    pub customer: Customer,
    pub items: Vec<OrderLineRequest>,
    pub delivery_address: String,
    pub phone: String,
    pub notes: Option<String>,
}

/// A line item whose price has been resolved against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i64,
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub unit_price: Tenge,
}

impl PricedLine {
    pub fn line_total(&self) -> Tenge {
        self.unit_price * self.quantity
    }

    pub fn describe(&self) -> String {
        format!("{} ({}, {})", self.product_name, self.size, self.color)
    }
}

/// A fully priced order that is ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub customer: Customer,
    pub lines: Vec<PricedLine>,
    pub total_amount: Tenge,
    pub cashback_earned: Tenge,
    pub delivery_address: String,
    pub phone: String,
    pub notes: Option<String>,
}

//--------------------------------------        Users         --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub cashback_balance: Tenge,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct CashbackTransaction {
    pub id: i64,
    pub user_id: i64,
    pub order_id: Option<OrderId>,
    pub amount: Tenge,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Catalog        --------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Tenge,
    pub sale_price: Option<Tenge>,
    pub category: Option<String>,
    pub images: Json<Vec<String>>,
    pub featured: bool,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price customers actually pay: the sale price if there is one.
    pub fn effective_price(&self) -> Tenge {
        self.sale_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub size: String,
    pub color: String,
    pub stock_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// A variant joined with the pricing fields of its parent product.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct PricedVariant {
    pub product_id: i64,
    pub product_name: String,
    pub size: String,
    pub color: String,
    pub stock_quantity: i64,
    pub price: Tenge,
    pub sale_price: Option<Tenge>,
}

impl PricedVariant {
    pub fn unit_price(&self) -> Tenge {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn describe(&self) -> String {
        format!("{} ({}, {})", self.product_name, self.size, self.color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVariant {
    pub size: String,
    pub color: String,
    #[serde(default)]
    pub stock_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Tenge,
    #[serde(default)]
    pub sale_price: Option<Tenge>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}
