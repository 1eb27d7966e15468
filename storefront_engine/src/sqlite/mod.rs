//! SQLite backend for the storefront engine.
pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;
