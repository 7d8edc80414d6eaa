//! Utility functions for common operations.
//!
//! - **Text processing**: Unicode-aware width and truncation, terminal escape
//!   stripping, headline text cleanup
//! - **URL validation**: checks an article link before it is opened in a browser

mod text;
mod url_validator;

pub use text::{
    display_width, single_line, strip_content_marker, strip_control_chars, truncate_to_width,
};
pub use url_validator::{validate_url_for_open, UrlValidationError};
