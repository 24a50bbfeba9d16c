//! Image resolution and inlining.
//!
//! Every `<img>` in a chapter body is resolved to embeddable bytes:
//! local references are read from the mirror directory, remote ones are
//! fetched over HTTP and cached on disk under a content-addressed name
//! so that a URL is downloaded at most once, within a run and across
//! runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lol_html::errors::RewritingError;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use url::Url;

use crate::book::{BookBuilder, EpubImage, ImageOrigin};
use crate::{BinderyError, Result};

/// HTTP client configuration for fetching remote images.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Bindery/1.0; +https://github.com/stormlightlabs/bindery)"
                .to_string(),
        }
    }
}

/// Resolves image references to embeddable [`EpubImage`]s.
///
/// Local references resolve relative to the mirror root; remote ones
/// live in a scratch cache directory keyed by [`cache_identity`].
pub struct ImageResolver {
    html_root: PathBuf,
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl ImageResolver {
    /// Creates a resolver over the given mirror root and cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::Http`] when the HTTP client cannot be
    /// constructed.
    pub fn new(html_root: &Path, cache_dir: &Path, config: &FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { html_root: html_root.to_path_buf(), cache_dir: cache_dir.to_path_buf(), client })
    }

    /// Resolves a body-relative `src` value to an image.
    ///
    /// `http://` and `https://` references take the remote branch, with
    /// at-most-one-fetch-per-identity caching; everything else resolves
    /// against the mirror root.
    ///
    /// # Errors
    ///
    /// Returns [`BinderyError::MissingResource`] for an absent local
    /// file (the caller skips that image), [`BinderyError::InvalidUrl`]
    /// or [`BinderyError::Http`] for remote failures, and
    /// [`BinderyError::Io`] for cache and file reads.
    pub fn resolve(&self, src: &str) -> Result<EpubImage> {
        if src.starts_with("http://") || src.starts_with("https://") {
            self.resolve_remote(src)
        } else {
            self.resolve_local(src)
        }
    }

    fn resolve_remote(&self, src: &str) -> Result<EpubImage> {
        let identity = cache_identity(src);
        let cache_path = self.cache_dir.join(&identity);

        if !cache_path.exists() {
            info!(url = src, "downloading remote image");

            let url = Url::parse(src).map_err(|e| BinderyError::InvalidUrl(e.to_string()))?;
            let bytes = self.client.get(url).send()?.error_for_status()?.bytes()?;
            fs::write(&cache_path, &bytes)?;
        }

        let content = fs::read(&cache_path)?;
        let file_name = format!("{}/{}", self.cache_dir.display(), identity);
        let media_type = media_type_for(&file_name).to_string();

        info!(url = src, file = %file_name, "remote image added");

        Ok(EpubImage { file_name, content, media_type, origin: ImageOrigin::Remote })
    }

    fn resolve_local(&self, src: &str) -> Result<EpubImage> {
        let path = self.html_root.join(src);
        if !path.exists() {
            error!(path = %path.display(), "image file doesn't exist, skipping");
            return Err(BinderyError::MissingResource(path));
        }

        let content = fs::read(&path)?;
        let file_name = Path::new(src)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| BinderyError::MissingResource(path))?;

        let media_type = media_type_for(&file_name).to_string();

        info!(file = %file_name, "local image added");

        Ok(EpubImage { file_name, content, media_type, origin: ImageOrigin::Local })
    }
}

/// Computes the cache identity of a remote image URL.
///
/// Pure function of the URL string: the SHA-256 hex digest of its UTF-8
/// bytes, a dot, and the URL's final dot-segment as extension. Equal
/// URLs map to equal identities across runs; this is both the cache
/// file name and the deduplication key.
pub fn cache_identity(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let extension = url.rsplit('.').next().unwrap_or(url);
    format!("{}.{}", digest, extension)
}

/// Maps a file name to the MIME type recorded in the EPUB manifest.
fn media_type_for(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Inlines every `<img>` of a chapter fragment into the book.
///
/// Rewrites each `src` to the resolved EPUB-internal file name, strips
/// the inline `style` attribute from locally-resolved images, and
/// registers the image with the builder (deduplicated by file name).
/// A missing local image is logged and skipped: its `src` stays
/// untouched and no image is registered. Every other resolution error
/// aborts the pass.
pub fn inline_images(body_html: &str, resolver: &ImageResolver, book: &mut BookBuilder) -> Result<String> {
    let handlers = vec![lol_html::element!("img", |el| {
        let Some(src) = el.get_attribute("src") else {
            return Ok(());
        };
        let src = src.replace("../", "");

        match resolver.resolve(&src) {
            Ok(image) => {
                el.set_attribute("src", &image.file_name)?;
                if image.origin == ImageOrigin::Local {
                    el.remove_attribute("style");
                }
                book.add_image(image);
            }
            Err(BinderyError::MissingResource(path)) => {
                warn!(path = %path.display(), "leaving image un-inlined");
            }
            Err(other) => return Err(other.into()),
        }

        Ok(())
    })];

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

/// Recovers a [`BinderyError`] raised inside a rewriter handler.
fn rewrite_error(err: RewritingError) -> BinderyError {
    match err {
        RewritingError::ContentHandlerError(inner) => match inner.downcast::<BinderyError>() {
            Ok(ours) => *ours,
            Err(other) => BinderyError::HtmlParse(other.to_string()),
        },
        other => BinderyError::HtmlParse(other.to_string()),
    }
}
