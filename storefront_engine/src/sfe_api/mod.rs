pub mod accounts_api;
pub mod bot_objects;
pub mod catalog_api;
pub mod order_flow_api;
pub mod order_objects;
