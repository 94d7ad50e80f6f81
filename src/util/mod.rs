//! Utility functions for common operations.
//!
//! - **Label normalization**: the single trim + case-fold used wherever
//!   categories are compared
//! - **Text processing**: character-count previews, terminal-width
//!   truncation, control-character stripping
//! - **URL validation**: base URL and article link checks
//!
//! # Examples
//!
//! ```
//! use newsdeck::util::{normalize_label, preview, validate_base_url};
//!
//! assert_eq!(normalize_label(" Tech "), "tech");
//! assert_eq!(preview("abcdef", 3), "abc...");
//! assert!(validate_base_url("https://news.example.com").is_ok());
//! ```

mod text;
mod url_validator;

pub use text::{is_blank, normalize_label, preview, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_base_url, validate_source_url, UrlValidationError};
