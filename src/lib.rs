//! # svgsnap
//!
//! Snapshot export for rendered, styled SVG graphics: capture a live graphic
//! node out of a host document tree as a self-contained, style-inlined
//! `.svg` file and hand it to the user as a download.
//!
//! ## Features
//!
//! - Collects the host document's registered style rules (flattening
//!   `@media`/`@supports` groups) into an inlined CDATA style block
//! - Normalizes the node's SVG/xlink namespace declarations so the output
//!   is valid outside the host document
//! - Produces a doctype-prefixed standalone serialization plus rendered
//!   geometry and attribute metadata
//! - Dispatches a one-shot save through a pluggable [`HostEnvironment`],
//!   with deferred release of the object handle
//!
//! ## Quick Start
//!
//! ```
//! use svgsnap::{Document, MemoryHost, Rect, download};
//!
//! let mut doc = Document::new();
//! let svg = doc
//!     .append_markup(
//!         doc.document(),
//!         r#"<svg id="chart"><rect width="10" height="10"></rect></svg>"#,
//!     )
//!     .unwrap();
//! doc.set_rendered_bounds(svg, Rect { top: 0.0, left: 0.0, width: 640.0, height: 480.0 });
//! doc.register_css("rect { fill: steelblue }");
//!
//! let mut host = MemoryHost::new();
//! download(&mut doc, &mut host, "#chart", "report").unwrap();
//!
//! assert_eq!(host.saves()[0].filename, "report.svg");
//! ```
//!
//! ## Capturing without downloading
//!
//! [`serialize`] returns the [`Snapshot`] (markup plus geometry, class, id,
//! and child count) for callers that want the metadata without the save
//! side effect. Note that capture mutates the live node in place; see
//! [`serialize`] for the details.

pub mod dom;
pub mod error;
pub mod export;
pub mod host;
pub mod style;

pub use dom::{Attribute, Document, Node, NodeData, NodeId, NodeSource, Rect};
pub use error::{Error, Result};
pub use export::{SVG_NAMESPACE, Snapshot, XLINK_NAMESPACE, download, serialize};
pub use host::{Blob, DirectoryHost, HostEnvironment, MemoryHost, ObjectUrl, SaveEvent};
pub use style::{StyleRule, StyleSheet, collect_styles};
