mod cashback;
mod payment_info;

pub use cashback::{cashback_for, CASHBACK_PERCENT};
pub use payment_info::{Instructions, PaymentInstructions, PaymentTarget};
