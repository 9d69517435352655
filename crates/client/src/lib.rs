//! Client code for textweb.
//!
//! This crate provides the hand-rolled HTTP/1.1 fetch pipeline, page text
//! extraction, and search result scraping used by the CLI.

pub mod extract;
pub mod fetch;
pub mod search;

pub use extract::{BlockKind, TextBlock, extract_text_blocks};
pub use fetch::{FetchClient, FetchConfig, FetchOutcome, TcpTransport, TlsPolicy, Transport};
pub use search::{DEFAULT_RESULT_LIMIT, SearchHit, parse_search_results, search_url};
