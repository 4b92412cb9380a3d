//! Foreign-content injection for a host document.
//!
//! inlay provides:
//! - **Injection**: append markup strings or detached nodes under a
//!   lazily-resolved insertion root (a well-known anchor element)
//! - **Hidden content**: a single memoized off-screen root for content that
//!   must exist in the document without being visible or affecting layout
//! - **Iframes**: the attach/`src` ordering both engine families require,
//!   plus optional load notification through whichever event-registration
//!   mechanism the host exposes
//! - **Host document**: an arena-backed, html5ever-parsed document for
//!   headless embedding and tests
//!
//! # Example
//!
//! ```rust
//! use inlay::{Document, Injector};
//!
//! // A host page carrying the well-known anchor element.
//! let mut doc =
//!     Document::from_html(r#"<html><body><div id="inlay-root"></div></body></html>"#);
//!
//! let mut injector = Injector::new(&doc);
//! let inserted = injector.append(&mut doc, "<p>Hello!</p>", None).unwrap();
//! assert!(inserted.is_inserted());
//!
//! // Iframes take an explicit root and get the engine-correct ordering.
//! let body = doc.body().unwrap();
//! let frame = injector
//!     .iframe(&mut doc, "https://example.com/frame.html", body, None)
//!     .unwrap();
//! assert_eq!(doc.attribute(frame, "src"), Some("https://example.com/frame.html"));
//! ```

pub mod dom;
mod host;
mod inject;
mod parser;

// Re-export the host-document seam
pub use host::{Error, EventRegistration, HostDocument, LoadCallback};

// Re-export the injection surface
pub use inject::{Content, DEFAULT_ANCHOR_ID, Injector, Insertion};

// Re-export the shipped document and parsing entry point
pub use dom::Document;
pub use parser::parse;
