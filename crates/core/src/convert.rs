//! Run orchestration.
//!
//! Wires the pipeline together: ensure the scratch cache directory
//! exists, parse the table of contents, convert every article in order,
//! and finalize the EPUB. Serialization happens only at the end, so a
//! failed run leaves no partial package, just the (possibly partially
//! populated) image cache.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::Result;
use crate::book::BookBuilder;
use crate::chapter::convert_chapter;
use crate::images::{FetchConfig, ImageResolver};
use crate::toc::parse_toc;

/// File name of the produced EPUB, written to the working directory.
pub const OUTPUT_FILE: &str = "meaningness.epub";

/// Scratch directory for cached remote images, created in the working
/// directory and reused across runs.
pub const CACHE_DIR: &str = "tmp_images";

/// Book-level metadata applied to the generated EPUB.
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// Book title, also used as the single TOC section name.
    pub title: String,
    /// Book language (BCP 47 tag).
    pub language: String,
    /// Authors, in order.
    pub authors: Vec<String>,
    /// Publication date recorded in the package metadata.
    pub date: String,
    /// Generator string recorded in the package metadata.
    pub generator: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: "Meaningness".to_string(),
            language: "en".to_string(),
            authors: vec!["David Chapman".to_string()],
            date: "2020-01-27".to_string(),
            generator: concat!("bindery ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Drives a single conversion over a mirror directory.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use bindery_core::convert::{BookConfig, Converter};
/// use bindery_core::images::FetchConfig;
///
/// let mut converter = Converter::new(
///     Path::new("meaningness_mirror"),
///     Path::new("tmp_images"),
///     BookConfig::default(),
///     &FetchConfig::default(),
/// ).unwrap();
/// converter.run().unwrap();
/// converter.into_book().finalize(Path::new("meaningness.epub")).unwrap();
/// ```
pub struct Converter {
    html_root: PathBuf,
    resolver: ImageResolver,
    book: BookBuilder,
}

impl Converter {
    /// Creates a converter, ensuring the cache directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BinderyError::Io`] when the cache directory
    /// cannot be created and [`crate::BinderyError::Http`] when the
    /// HTTP client cannot be constructed.
    pub fn new(html_root: &Path, cache_dir: &Path, config: BookConfig, fetch: &FetchConfig) -> Result<Self> {
        if !cache_dir.exists() {
            fs::create_dir_all(cache_dir)?;
        }

        let mut book = BookBuilder::new(&config.title);
        book.set_language(&config.language);
        for author in &config.authors {
            book.add_author(author);
        }
        book.set_date(&config.date);
        book.set_generator(&config.generator);

        let resolver = ImageResolver::new(html_root, cache_dir, fetch)?;

        Ok(Self { html_root: html_root.to_path_buf(), resolver, book })
    }

    /// Parses the TOC and converts every article, in TOC order.
    ///
    /// # Errors
    ///
    /// The first failing step aborts the run; only a missing local
    /// image is tolerated (handled inside image inlining).
    pub fn run(&mut self) -> Result<()> {
        info!("parsing toc");
        let index_html = fs::read_to_string(self.html_root.join("index.html"))?;
        let entries = parse_toc(&index_html)?;

        for entry in &entries {
            convert_chapter(
                &self.html_root,
                &entry.article,
                &entry.chapter_file,
                None,
                &self.resolver,
                &mut self.book,
            )?;
        }

        Ok(())
    }

    /// The book accumulated so far.
    pub fn book(&self) -> &BookBuilder {
        &self.book
    }

    /// Consumes the converter, yielding the book for finalization.
    pub fn into_book(self) -> BookBuilder {
        self.book
    }
}

/// Converts the mirror at `html_root` into `meaningness.epub`.
///
/// Creates `tmp_images/` in the working directory when missing and
/// returns the path of the written EPUB.
pub fn convert(html_root: &Path) -> Result<PathBuf> {
    let mut converter = Converter::new(html_root, Path::new(CACHE_DIR), BookConfig::default(), &FetchConfig::default())?;
    converter.run()?;

    let output = PathBuf::from(OUTPUT_FILE);
    converter.into_book().finalize(&output)?;

    Ok(output)
}
