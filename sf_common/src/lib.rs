mod helpers;
mod tenge;

pub mod op;
mod secret;

pub use helpers::{parse_boolean_flag, parse_comma_separated};
pub use secret::Secret;
pub use tenge::{Tenge, TengeConversionError, CURRENCY_SIGN, KZT_CURRENCY_CODE};
