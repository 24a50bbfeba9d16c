//! Removal of site chrome from chapter bodies.
//!
//! The mirrored site wraps every article in navigation bars, search
//! widgets, "read more" teasers, and sidebar blocks. This module strips
//! all of them with a fixed selector list so that only the article
//! content survives into the EPUB.

use lol_html::errors::RewritingError;

use crate::{BinderyError, Result};

/// Chrome elements removed from every chapter body, in rule order.
///
/// Rules are independent of each other; each one deletes every match
/// together with its content.
const CHROME_SELECTORS: &[&str] = &[
    "div.nocontent",
    "div.tertiary-content-wrapper",
    "div.more-link",
    "div.view-content",
    "div.block-content.content",
    "div.region.region-content-aside",
    r#"div[role="search"]"#,
    "header",
    "div#tertiary-content-wrapper",
    "nav.clearfix",
];

/// Class-attribute substring marking the per-book navigation block.
///
/// The site suffixes this class with a book identifier, so it is matched
/// as a substring rather than as an exact class name.
const NAVIGATION_CLASS_MARKER: &str = "block-meaningness-navigation";

/// Strips site chrome from a chapter body fragment.
///
/// Removes every element matching [`CHROME_SELECTORS`] plus any `div`
/// whose class attribute contains [`NAVIGATION_CLASS_MARKER`]. The pass
/// is idempotent: running it on already-cleaned content is a no-op.
///
/// # Errors
///
/// Returns [`BinderyError::HtmlParse`] if the rewriter rejects the
/// fragment (for example on invalid UTF-8 boundaries).
pub fn strip_chrome(body_html: &str) -> Result<String> {
    let mut handlers: Vec<_> = CHROME_SELECTORS
        .iter()
        .map(|selector| {
            lol_html::element!(selector, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    handlers.push(lol_html::element!("div", |el| {
        if el
            .get_attribute("class")
            .is_some_and(|class| class.contains(NAVIGATION_CLASS_MARKER))
        {
            el.remove();
        }
        Ok(())
    }));

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    rewriter.write(body_html.as_bytes()).map_err(rewrite_error)?;
    rewriter.end().map_err(rewrite_error)?;

    Ok(output)
}

fn rewrite_error(err: RewritingError) -> BinderyError {
    BinderyError::HtmlParse(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_chrome_blocks() {
        let html = r#"
            <header>Site header</header>
            <div class="nocontent">skip</div>
            <div class="tertiary-content-wrapper">skip</div>
            <div class="more-link"><a href="next.html">Read more</a></div>
            <nav class="clearfix">breadcrumbs</nav>
            <div class="node-content"><p>The actual article.</p></div>
        "#;

        let cleaned = strip_chrome(html).unwrap();

        assert!(!cleaned.contains("Site header"));
        assert!(!cleaned.contains("skip"));
        assert!(!cleaned.contains("Read more"));
        assert!(!cleaned.contains("breadcrumbs"));
        assert!(cleaned.contains("The actual article."));
    }

    #[test]
    fn test_removes_search_and_id_blocks() {
        let html = r#"
            <div role="search"><input type="text"/></div>
            <div id="tertiary-content-wrapper">footer junk</div>
            <p>kept</p>
        "#;

        let cleaned = strip_chrome(html).unwrap();

        assert!(!cleaned.contains("input"));
        assert!(!cleaned.contains("footer junk"));
        assert!(cleaned.contains("kept"));
    }

    #[test]
    fn test_removes_navigation_block_by_class_substring() {
        let html = r#"
            <div class="block block-meaningness-navigation-23">prev / next</div>
            <p>kept</p>
        "#;

        let cleaned = strip_chrome(html).unwrap();

        assert!(!cleaned.contains("prev / next"));
        assert!(cleaned.contains("kept"));
    }

    #[test]
    fn test_compound_class_rules() {
        let html = r#"
            <div class="block-content content">teaser</div>
            <div class="region region-content-aside">aside</div>
            <div class="block-content">kept, only one class</div>
        "#;

        let cleaned = strip_chrome(html).unwrap();

        assert!(!cleaned.contains("teaser"));
        assert!(!cleaned.contains("aside"));
        assert!(cleaned.contains("kept, only one class"));
    }

    #[test]
    fn test_idempotent() {
        let html = r#"
            <header>chrome</header>
            <div class="view-content">chrome</div>
            <div class="node-content"><p>content</p></div>
        "#;

        let once = strip_chrome(html).unwrap();
        let twice = strip_chrome(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_content_untouched() {
        let html = r#"<div class="node-content"><p>one</p><p>two</p></div>"#;

        let cleaned = strip_chrome(html).unwrap();

        assert_eq!(cleaned, html);
    }
}
