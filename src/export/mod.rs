//! Export pipeline: style collection feeds snapshot capture, snapshot
//! capture feeds download dispatch.
//!
//! [`serialize`] is public on its own for callers that want the markup and
//! metadata without the download side effect; [`download`] runs the whole
//! pipeline fire-and-forget.

mod download;
mod snapshot;

pub use download::{EXPORT_MEDIA_TYPE, LINK_CLASS, REVOKE_DELAY, download};
pub use snapshot::{SVG_NAMESPACE, Snapshot, XLINK_NAMESPACE, serialize};
