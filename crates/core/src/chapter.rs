//! Conversion of a single article into a book chapter.
//!
//! An article file is parsed, its title derived from the page `<title>`,
//! its body stripped of site chrome and image-inlined, and the result
//! registered with the book under construction.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::book::{BookBuilder, Chapter};
use crate::images::{ImageResolver, inline_images};
use crate::parse::Document;
use crate::{BinderyError, Result, clean};

/// Converts one article file and registers the chapter with `book`.
///
/// `article_path` is resolved relative to `html_root`; `chapter_file`
/// becomes the EPUB-internal file name. When `title` is `None` it is
/// derived from the document title via [`chapter_title`].
///
/// # Errors
///
/// Returns [`BinderyError::InvalidInput`] when the article path is a
/// directory (checked before any side effect) and
/// [`BinderyError::Structure`] when the document lacks a `<title>` or
/// `<body>`. Image resolution errors other than a missing local file
/// propagate unchanged.
pub fn convert_chapter(
    html_root: &Path, article_path: &str, chapter_file: &str, title: Option<&str>, resolver: &ImageResolver,
    book: &mut BookBuilder,
) -> Result<()> {
    info!(article = article_path, "converting chapter");

    let full_path = html_root.join(article_path);
    if full_path.is_dir() {
        return Err(BinderyError::InvalidInput(full_path));
    }

    let doc = Document::parse(&fs::read_to_string(&full_path)?);

    let title = match title {
        Some(explicit) => explicit.to_string(),
        None => {
            let page_title = doc
                .title()
                .ok_or_else(|| BinderyError::Structure(format!("title of {}", article_path)))?;
            chapter_title(&page_title)
        }
    };

    let body = doc
        .select("body")?
        .into_iter()
        .next()
        .ok_or_else(|| BinderyError::Structure(format!("body of {}", article_path)))?;

    let cleaned = clean::strip_chrome(&body.inner_html())?;
    let content = inline_images(&cleaned, resolver, book)?;

    book.add_chapter(Chapter { title, file_name: chapter_file.to_string(), content });

    Ok(())
}

/// Derives a chapter title from a page title.
///
/// The site names its pages "Book Title (chapter title)", so the text
/// after the last `(` and before the next `)` is taken and capitalized.
/// Titles without parentheses degrade to the whole title, which is the
/// accepted behavior for a handful of chapters.
pub fn chapter_title(page_title: &str) -> String {
    let tail = page_title.rsplit('(').next().unwrap_or(page_title);
    let inner = tail.split(')').next().unwrap_or(tail);
    capitalize(inner)
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::FetchConfig;
    use rstest::rstest;

    #[rstest]
    #[case("Meaningness (an extended preview)", "An extended preview")]
    #[case("Meaningness (Nebulosity)", "Nebulosity")]
    #[case("Outer (inner (deepest))", "Deepest")]
    #[case("No parentheses at all", "No parentheses at all")]
    #[case("", "")]
    fn test_chapter_title(#[case] page_title: &str, #[case] expected: &str) {
        assert_eq!(chapter_title(page_title), expected);
    }

    #[test]
    fn test_capitalize_lowercases_rest() {
        assert_eq!(capitalize("mIXED cAse"), "Mixed case");
    }

    fn setup(dir: &Path) -> (ImageResolver, BookBuilder) {
        let cache = dir.join("cache");
        fs::create_dir(&cache).unwrap();
        let resolver = ImageResolver::new(dir, &cache, &FetchConfig::default()).unwrap();
        (resolver, BookBuilder::new("Test"))
    }

    #[test]
    fn test_convert_registers_chapter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.html"),
            r#"<html><head><title>Book (first steps)</title></head>
               <body><header>chrome</header><div class="node-content"><p>Text</p></div></body></html>"#,
        )
        .unwrap();

        let (resolver, mut book) = setup(dir.path());
        convert_chapter(dir.path(), "a.html", "a.html", None, &resolver, &mut book).unwrap();

        assert_eq!(book.chapters().len(), 1);
        let chapter = &book.chapters()[0];
        assert_eq!(chapter.title, "First steps");
        assert_eq!(chapter.file_name, "a.html");
        assert!(chapter.content.contains("<p>Text</p>"));
        assert!(!chapter.content.contains("chrome"));
    }

    #[test]
    fn test_explicit_title_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.html"),
            "<html><head><title>Ignored (ignored)</title></head><body><p>x</p></body></html>",
        )
        .unwrap();

        let (resolver, mut book) = setup(dir.path());
        convert_chapter(dir.path(), "a.html", "a.html", Some("Given"), &resolver, &mut book).unwrap();

        assert_eq!(book.chapters()[0].title, "Given");
    }

    #[test]
    fn test_directory_rejected_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let (resolver, mut book) = setup(dir.path());
        let result = convert_chapter(dir.path(), "subdir", "subdir", None, &resolver, &mut book);

        assert!(matches!(result, Err(BinderyError::InvalidInput(_))));
        assert!(book.chapters().is_empty());
    }

    #[test]
    fn test_missing_title_is_structure_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "<html><body><p>x</p></body></html>").unwrap();

        let (resolver, mut book) = setup(dir.path());
        let result = convert_chapter(dir.path(), "a.html", "a.html", None, &resolver, &mut book);

        assert!(matches!(result, Err(BinderyError::Structure(_))));
    }

    #[test]
    fn test_missing_local_image_keeps_chapter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.html"),
            r#"<html><head><title>T (c)</title></head><body><img src="gone.png"/><p>x</p></body></html>"#,
        )
        .unwrap();

        let (resolver, mut book) = setup(dir.path());
        convert_chapter(dir.path(), "a.html", "a.html", None, &resolver, &mut book).unwrap();

        assert_eq!(book.chapters().len(), 1);
        assert!(book.images().is_empty());
        assert!(book.chapters()[0].content.contains(r#"src="gone.png""#));
    }
}
