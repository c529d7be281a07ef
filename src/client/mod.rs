pub mod gemini;
pub mod gmail;
pub mod http;
pub mod zip;

pub use gemini::GeminiClient;
pub use gmail::GmailClient;
pub use http::{build_client, get_with_retry};
pub use zip::ZipClient;
