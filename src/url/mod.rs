//! URL handling module
//!
//! This module provides domain extraction, reference resolution against a
//! page's base URL, and parsing of user-supplied target URLs.

mod domain;
mod resolve;

// Re-export main functions
pub use domain::{domain_of, extract_domain, is_external};
pub use resolve::{parse_target_url, resolve_reference};
