//! HTML parsing for page metadata.

mod html;

pub use html::{extract_favicon, extract_title, parse_page_metadata};
