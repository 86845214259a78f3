//! Browser-style DOM over an arena-backed HTML tree.
//!
//! Parsing goes through `html5ever`, so malformed markup lands in the same
//! tree a browser would build. All nodes of a document live in one
//! [`indextree`] arena; handles are plain [`NodeId`]s, `Copy`, and every
//! handle to a node observes mutations made through any other.
//!
//! ```
//! use mulch::parse;
//!
//! let mut doc = parse(r#"<html><body><div id="nav"><p>old</p></div></body></html>"#);
//! let nav = doc.get_element_by_id("nav").unwrap();
//! doc.set_inner_html(nav, "<h1>hi</h1>").unwrap();
//! assert_eq!(doc.serialize(nav), r#"<div id="nav"><h1>hi</h1></div>"#);
//!
//! let h1 = doc.select_one(doc.root(), "div > h1").unwrap().unwrap();
//! doc.add_class(h1, "greeting").unwrap();
//! assert_eq!(doc.serialize(h1), r#"<h1 class="greeting">hi</h1>"#);
//! ```

mod tracing_macros;

pub mod arena;
mod attrs;
mod document;
mod dom;
pub mod error;
mod events;
mod parser;
pub mod selector;
mod serialize;

pub use arena::{Document, ElementData, Namespace, NodeData, NodeKind};
pub use dom::{Content, InsertPosition};
pub use error::{DomError, Result};
pub use events::EventCallback;
pub use parser::parse;
pub use selector::Selector;

pub use indextree::NodeId;
