//! Table-of-contents discovery.
//!
//! The index page of the mirrored book carries a single `ul.book-toc`
//! list whose links define both the chapter ordering and the chapter
//! file names.

use tracing::debug;

use crate::parse::Document;
use crate::{BinderyError, Result};

/// CSS selector identifying the table-of-contents container.
pub const TOC_SELECTOR: &str = "ul.book-toc";

/// One entry of the table of contents.
///
/// `article` is the href of the source article relative to the mirror
/// root; `chapter_file` is the EPUB-internal file name of the produced
/// chapter. In the current site layout the two are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Source article reference, relative to the mirror root.
    pub article: String,
    /// Target chapter file name inside the EPUB.
    pub chapter_file: String,
}

/// Parses the book structure out of the index page.
///
/// Returns the entries in document order, one per link inside the
/// `ul.book-toc` container. The materialized `Vec` is small and can be
/// iterated as often as needed.
///
/// # Errors
///
/// Returns [`BinderyError::Structure`] when the container is absent,
/// which signals that the site layout changed.
pub fn parse_toc(index_html: &str) -> Result<Vec<TocEntry>> {
    let doc = Document::parse(index_html);

    let containers = doc.select(TOC_SELECTOR)?;
    let toc = containers
        .first()
        .ok_or_else(|| BinderyError::Structure(format!("table of contents ({})", TOC_SELECTOR)))?;

    let entries: Vec<TocEntry> = toc
        .select("a")?
        .iter()
        .filter_map(|a| a.attr("href"))
        .map(|href| TocEntry { article: href.to_string(), chapter_file: href.to_string() })
        .collect();

    debug!(count = entries.len(), "parsed table of contents");

    Ok(entries)
}
