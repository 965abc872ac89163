pub mod account_service;
pub mod error;
pub mod notification_service;
