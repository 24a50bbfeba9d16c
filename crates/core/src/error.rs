//! Error types for bindery operations.
//!
//! This module defines the main error type [`BinderyError`] which represents
//! all possible errors that can occur while parsing the table of contents,
//! converting chapters, resolving images, and serializing the EPUB package.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion operations.
///
/// Only [`BinderyError::MissingResource`] is recoverable: the image
/// inlining step catches it and leaves the offending `src` untouched.
/// Every other variant propagates to the top level and aborts the run.
///
/// # Example
///
/// ```rust
/// use bindery_core::{BinderyError, toc::parse_toc};
///
/// match parse_toc("<html><body></body></html>") {
///     Ok(entries) => println!("{} chapters", entries.len()),
///     Err(BinderyError::Structure(landmark)) => {
///         println!("site layout changed: {} not found", landmark);
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum BinderyError {
    /// An expected HTML landmark is missing.
    ///
    /// Returned when the table-of-contents container, a chapter `<body>`,
    /// or a chapter `<title>` cannot be located. This usually means the
    /// site layout changed and the fixed selectors no longer apply.
    #[error("Expected HTML landmark missing: {0}")]
    Structure(String),

    /// An article path points at a directory instead of a file.
    #[error("Article path is a directory: {0}")]
    InvalidInput(PathBuf),

    /// A locally-referenced image file does not exist.
    ///
    /// Callers inlining images treat this as skip-and-continue; the
    /// chapter is still produced without that image.
    #[error("Local image not found: {0}")]
    MissingResource(PathBuf),

    /// Invalid URL provided.
    ///
    /// Returned when a remote image reference cannot be parsed as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing or rewriting errors.
    ///
    /// Returned when a CSS selector is invalid or the streaming rewriter
    /// rejects the document.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and non-success status codes while fetching remote images.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// File I/O errors.
    ///
    /// Wraps standard I/O errors for article, image, and cache files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// EPUB serialization errors from epub-builder.
    #[error("EPUB assembly failed: {0}")]
    Epub(String),
}

/// Result type alias for BinderyError.
///
/// This is a convenience alias for `std::result::Result<T, BinderyError>`.
pub type Result<T> = std::result::Result<T, BinderyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_error_display() {
        let err = BinderyError::Structure("ul.book-toc".to_string());
        assert!(err.to_string().contains("ul.book-toc"));
    }

    #[test]
    fn test_invalid_input_error_display() {
        let err = BinderyError::InvalidInput(PathBuf::from("/some/dir"));
        assert!(err.to_string().contains("directory"));
        assert!(err.to_string().contains("/some/dir"));
    }

    #[test]
    fn test_missing_resource_error_display() {
        let err = BinderyError::MissingResource(PathBuf::from("images/gone.png"));
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err = BinderyError::from(io);
        assert!(matches!(err, BinderyError::Io(_)));
    }
}
