pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod sheet;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use service::{BidStore, MailBidExtractor, SharedStore};
