pub mod mail_pipeline;
pub mod query;
pub mod store;

pub use mail_pipeline::{MailBidExtractor, MailSession, MailSource, TextGenerator};
pub use store::{BidStore, SharedStore};
