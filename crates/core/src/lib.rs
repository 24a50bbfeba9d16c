pub mod book;
pub mod chapter;
pub mod clean;
pub mod convert;
pub mod error;
pub mod images;
pub mod parse;
pub mod toc;

pub use book::{BookBuilder, Chapter, EpubImage, ImageOrigin};
pub use chapter::{chapter_title, convert_chapter};
pub use clean::strip_chrome;
pub use convert::{BookConfig, CACHE_DIR, Converter, OUTPUT_FILE, convert};
pub use error::{BinderyError, Result};
pub use images::{FetchConfig, ImageResolver, cache_identity, inline_images};
pub use parse::{Document, Element};
pub use toc::{TocEntry, parse_toc};
