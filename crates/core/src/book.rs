//! Book accumulation and EPUB serialization.
//!
//! [`BookBuilder`] collects chapters, images, and metadata while the
//! pipeline runs, then serializes everything in one step through
//! `epub-builder`. Finalization consumes the builder, so nothing can be
//! added to a book that has already been written.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use epub_builder::{EpubBuilder, EpubContent, EpubVersion, MetadataOpf, ReferenceType, ZipLibrary};
use tracing::info;

use crate::{BinderyError, Result};

/// Fixed stylesheet injected into every generated book.
const STYLESHEET: &str = "BODY {color: white;}";

/// One chapter of the book under construction.
///
/// Created once per TOC entry and immutable afterwards. `file_name` is
/// the EPUB-internal identifier; `content` is the cleaned body fragment
/// (it gets wrapped in an XHTML shell at serialization time).
#[derive(Debug, Clone)]
pub struct Chapter {
    /// Chapter title shown in the table of contents.
    pub title: String,
    /// EPUB-internal file name, e.g. `first.html`.
    pub file_name: String,
    /// Cleaned, image-inlined HTML body fragment.
    pub content: String,
}

/// Where an embedded image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Read from the mirror directory.
    Local,
    /// Fetched over HTTP(S) and cached on disk.
    Remote,
}

/// An image embedded into the book.
#[derive(Debug, Clone)]
pub struct EpubImage {
    /// EPUB-internal path; for remote images this is the cache path,
    /// which doubles as the deduplication key.
    pub file_name: String,
    /// Raw image bytes.
    pub content: Vec<u8>,
    /// MIME type derived from the file extension.
    pub media_type: String,
    /// Local-path or remote-URL derived.
    pub origin: ImageOrigin,
}

/// Accumulates chapters, images, and metadata, then writes the EPUB.
///
/// Chapters keep their append order in the spine, preceded by the
/// generated table-of-contents document. Images are deduplicated by
/// file name, so registering the same cache identity twice embeds a
/// single resource.
///
/// # Example
///
/// ```rust,no_run
/// use bindery_core::book::{BookBuilder, Chapter};
///
/// let mut book = BookBuilder::new("Meaningness");
/// book.set_language("en");
/// book.add_author("David Chapman");
/// book.add_chapter(Chapter {
///     title: "Preview".to_string(),
///     file_name: "preview.html".to_string(),
///     content: "<p>…</p>".to_string(),
/// });
/// book.finalize(std::path::Path::new("meaningness.epub")).unwrap();
/// ```
pub struct BookBuilder {
    title: String,
    language: String,
    authors: Vec<String>,
    date: Option<String>,
    generator: Option<String>,
    chapters: Vec<Chapter>,
    images: Vec<EpubImage>,
    image_names: HashSet<String>,
}

impl BookBuilder {
    /// Creates an empty book with the given title.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            language: "en".to_string(),
            authors: Vec::new(),
            date: None,
            generator: None,
            chapters: Vec::new(),
            images: Vec::new(),
            image_names: HashSet::new(),
        }
    }

    /// Sets the book language (BCP 47 tag, e.g. `en`).
    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    /// Adds an author. Authors keep their registration order.
    pub fn add_author(&mut self, author: &str) {
        self.authors.push(author.to_string());
    }

    /// Sets the publication date, emitted as a `dcterms:date` meta entry.
    pub fn set_date(&mut self, date: &str) {
        self.date = Some(date.to_string());
    }

    /// Sets the generator string recorded in the package metadata.
    pub fn set_generator(&mut self, generator: &str) {
        self.generator = Some(generator.to_string());
    }

    /// Appends a chapter. Spine order is append order.
    pub fn add_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    /// Registers an image, deduplicated by file name.
    ///
    /// Returns `true` when the image was newly added, `false` when an
    /// image with the same file name is already embedded.
    pub fn add_image(&mut self, image: EpubImage) -> bool {
        if !self.image_names.insert(image.file_name.clone()) {
            return false;
        }
        self.images.push(image);
        true
    }

    /// Chapters accumulated so far, in spine order.
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Images accumulated so far.
    pub fn images(&self) -> &[EpubImage] {
        &self.images
    }

    /// Serializes the book to `path`.
    ///
    /// Injects the fixed stylesheet, generates the navigation documents
    /// with a single section covering all chapters, puts the inline TOC
    /// first in the spine, and embeds every registered image. Consuming
    /// `self` makes post-finalization mutation a compile error.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::Epub`] when epub-builder rejects the
    /// package and [`BinderyError::Io`] when the output file cannot be
    /// created.
    pub fn finalize(self, path: &Path) -> Result<()> {
        info!(path = %path.display(), chapters = self.chapters.len(), images = self.images.len(), "writing ebook");

        let zip = ZipLibrary::new().map_err(epub_error)?;
        let mut builder = EpubBuilder::new(zip).map_err(epub_error)?;

        builder.epub_version(EpubVersion::V30);
        builder.metadata("title", self.title.as_str()).map_err(epub_error)?;
        builder.metadata("lang", self.language.as_str()).map_err(epub_error)?;
        builder.metadata("toc_name", self.title.as_str()).map_err(epub_error)?;
        for author in &self.authors {
            builder.metadata("author", author.as_str()).map_err(epub_error)?;
        }
        if let Some(generator) = &self.generator {
            builder.metadata("generator", generator.as_str()).map_err(epub_error)?;
        }
        if let Some(date) = &self.date {
            builder.add_metadata_opf(Box::new(MetadataOpf {
                name: "dcterms:date".to_string(),
                content: date.to_string(),
            }));
        }

        builder.stylesheet(STYLESHEET.as_bytes()).map_err(epub_error)?;
        builder.inline_toc();

        for chapter in &self.chapters {
            let document = chapter_xhtml(&chapter.title, &chapter.content);
            builder
                .add_content(
                    EpubContent::new(chapter.file_name.as_str(), document.as_bytes())
                        .title(chapter.title.as_str())
                        .reftype(ReferenceType::Text),
                )
                .map_err(epub_error)?;
        }

        for image in &self.images {
            builder
                .add_resource(image.file_name.as_str(), image.content.as_slice(), image.media_type.as_str())
                .map_err(epub_error)?;
        }

        let mut output = File::create(path)?;
        builder.generate(&mut output).map_err(epub_error)?;

        Ok(())
    }
}

fn epub_error(err: epub_builder::Error) -> BinderyError {
    BinderyError::Epub(err.to_string())
}

/// Wraps a chapter fragment in a complete XHTML document.
///
/// epub-builder stores content files verbatim, so the shell (doctype,
/// namespace, stylesheet link) has to be supplied here.
fn chapter_xhtml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title>{}</title>
<link rel="stylesheet" type="text/css" href="stylesheet.css"/>
</head>
<body>
{}
</body>
</html>
"#,
        escape_text(title),
        body
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> EpubImage {
        EpubImage {
            file_name: name.to_string(),
            content: vec![1, 2, 3],
            media_type: "image/png".to_string(),
            origin: ImageOrigin::Local,
        }
    }

    #[test]
    fn test_chapters_keep_append_order() {
        let mut book = BookBuilder::new("Test");
        for name in ["a.html", "b.html", "c.html"] {
            book.add_chapter(Chapter {
                title: name.to_string(),
                file_name: name.to_string(),
                content: String::new(),
            });
        }

        let names: Vec<&str> = book.chapters().iter().map(|c| c.file_name.as_str()).collect();
        assert_eq!(names, ["a.html", "b.html", "c.html"]);
    }

    #[test]
    fn test_duplicate_image_registered_once() {
        let mut book = BookBuilder::new("Test");

        assert!(book.add_image(image("tmp_images/abc.png")));
        assert!(!book.add_image(image("tmp_images/abc.png")));
        assert_eq!(book.images().len(), 1);
    }

    #[test]
    fn test_distinct_images_both_kept() {
        let mut book = BookBuilder::new("Test");

        assert!(book.add_image(image("one.png")));
        assert!(book.add_image(image("two.png")));
        assert_eq!(book.images().len(), 2);
    }

    #[test]
    fn test_finalize_writes_package() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("test.epub");

        let mut book = BookBuilder::new("Test Book");
        book.set_language("en");
        book.add_author("Somebody");
        book.set_date("2020-01-27");
        book.set_generator("bindery test");
        book.add_chapter(Chapter {
            title: "Only".to_string(),
            file_name: "only.html".to_string(),
            content: "<p>Hello</p>".to_string(),
        });
        book.add_image(image("pic.png"));
        book.finalize(&out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        // EPUB containers are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_chapter_xhtml_escapes_title() {
        let doc = chapter_xhtml("A <b> & B", "<p>x</p>");

        assert!(doc.contains("A &lt;b&gt; &amp; B"));
        assert!(doc.contains("<p>x</p>"));
        assert!(doc.contains("stylesheet.css"));
    }
}
