pub mod bid;
pub mod mail;
pub mod report;

pub use bid::{parse_leading_int, BidRecord};
pub use mail::{EmailBidExtraction, MailMessage, MessageList, MessagePart};
pub use report::{BidCounts, CustomerRevenue, DailyBids, Page};
