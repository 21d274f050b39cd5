//! Encyclopedia content source.
//!
//! Looks a topic up through the MediaWiki extracts API, or extracts an
//! arbitrary page with readability when given a URL, and hands back cleaned
//! plain text.

mod client;
mod types;
mod util;

pub use self::client::{create_http_client, fetch_article};
pub use self::types::*;
pub use self::util::*;
