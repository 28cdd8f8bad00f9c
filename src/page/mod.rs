//! Page acquisition: fetching over HTTP and parsing into a document tree

mod fetcher;
mod parser;

pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use parser::{parse_html, parse_page};
