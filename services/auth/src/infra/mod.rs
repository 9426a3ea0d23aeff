pub mod cache;
pub mod db;
pub mod identity_api;
pub mod session;
pub mod sms;
