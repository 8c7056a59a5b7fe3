//! Utility modules supporting the source adapters.
//!
//! - [`HttpClient`]: shared reqwest client built from the `[http]` settings
//! - [`XmlNode`]: owned XML element tree with defaulting field access
//! - [`collect_elements`]: stream a document and materialize matching
//!   elements one at a time
//!
//! # Field extraction
//!
//! ```rust
//! use litscout::utils::XmlNode;
//!
//! let root = XmlNode::parse("<a><Journal><Title>Nature</Title></Journal></a>").unwrap();
//! assert_eq!(root.text_or("Journal/Title", "Unknown journal"), "Nature");
//! assert_eq!(root.text_or("Missing", "Unknown"), "Unknown");
//! ```

mod http;
mod xml;

pub use http::HttpClient;
pub use xml::{collect_elements, Descendants, Selector, XmlError, XmlNode};
